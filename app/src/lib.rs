//! # vrmtex app
//!
//! Command-line front end for [`vrmtex_core`]: argument parsing, the
//! `vrmtex.toml` config file and the file I/O around a [`TextureSession`].
//!
//! ## Overview
//!
//! - [`Cli`] / [`Command`] - clap argument definitions
//! - [`AppConfig`] - configuration loaded with [`load_or_default`]
//! - [`run`] - execute a parsed command line
//!
//! [`TextureSession`]: vrmtex_core::session::TextureSession

mod args;
mod commands;
mod config;
mod error;

pub use args::{Cli, Command};
pub use commands::{
    asset_line, execute, extract_to, info_lines, output_path, run, sanitize_file_name,
};
pub use config::{
    AppConfig, DEFAULT_CONFIG_FILE, OutputConfig, RebuildConfig, ResizeConfig, load_config,
    load_or_default,
};
pub use error::AppError;

/// App crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
