use std::path::PathBuf;

use vrmtex_core::session::SessionError;

/// Errors reported by the `vrmtex` binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// An input container, image or config file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output container or extracted texture could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// File or directory that was being written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file exists but is not valid TOML for [`AppConfig`].
    ///
    /// [`AppConfig`]: crate::AppConfig
    #[error("failed to parse config {path}: {source}")]
    Config {
        /// Config file path.
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The texture session rejected the input or an edit.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The tokio runtime could not be built.
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}
