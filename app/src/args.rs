//! Command line arguments.
//!
//! Every subcommand takes the input container as its first positional
//! argument. Commands that write a container default to
//! `<stem><suffix>.<ext>` next to the input, with the suffix taken from the
//! config file.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILE;

/// vrmtex command line.
#[derive(Parser, Debug)]
#[command(
    name = "vrmtex",
    about = "Inspect, extract and replace textures embedded in VRM / GLB files",
    long_about = "Inspect, extract and replace textures embedded in VRM / GLB files.\n\n\
        Every rewritten container gets fresh bufferView offsets, so geometry,\n\
        animation and extension data survive image substitutions of any size.\n\
        \n\
        EXAMPLES:\n\
          # List textures\n\
          vrmtex info avatar.vrm\n\
        \n\
          # Swap texture 3 and write avatar_edited.vrm\n\
          vrmtex replace avatar.vrm --index 3 --image hair.png\n\
        \n\
          # Downscale every texture to at most 512px\n\
          vrmtex resize avatar.vrm --max 512",
    version
)]
pub struct Cli {
    /// Config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List the embedded textures.
    Info {
        /// Input container.
        file: PathBuf,
    },

    /// Write every embedded texture to a directory.
    Extract {
        /// Input container.
        file: PathBuf,

        /// Destination directory (created if missing).
        #[arg(long)]
        out: PathBuf,
    },

    /// Replace one texture with an image file.
    Replace {
        /// Input container.
        file: PathBuf,

        /// Image index to replace.
        #[arg(long)]
        index: usize,

        /// PNG or JPEG file with the new texture.
        #[arg(long)]
        image: PathBuf,

        /// Output path.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Downscale textures so their longer side fits a pixel limit.
    Resize {
        /// Input container.
        file: PathBuf,

        /// Image index to resize. Repeat for several; all when omitted.
        #[arg(long = "index")]
        indices: Vec<usize>,

        /// Longest side in pixels. Defaults to `resize.max_dimension` from
        /// the config file.
        #[arg(long = "max")]
        max_dimension: Option<u32>,

        /// Output path.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Rebuild the container without changes.
    Roundtrip {
        /// Input container.
        file: PathBuf,

        /// Output path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

impl Command {
    /// The input container path.
    pub fn input(&self) -> &Path {
        match self {
            Command::Info { file }
            | Command::Extract { file, .. }
            | Command::Replace { file, .. }
            | Command::Resize { file, .. }
            | Command::Roundtrip { file, .. } => file.as_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_resize_indices() {
        let cli = Cli::parse_from([
            "vrmtex", "resize", "a.vrm", "--index", "1", "--index", "4", "--max", "256",
        ]);
        assert_eq!(
            cli.command,
            Command::Resize {
                file: "a.vrm".into(),
                indices: vec![1, 4],
                max_dimension: Some(256),
                output: None,
            }
        );
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn parse_replace() {
        let cli = Cli::parse_from([
            "vrmtex",
            "--config",
            "custom.toml",
            "replace",
            "a.vrm",
            "--index",
            "2",
            "--image",
            "hair.png",
            "--output",
            "out.vrm",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.command.input(), Path::new("a.vrm"));
        assert!(matches!(
            cli.command,
            Command::Replace { index: 2, output: Some(_), .. }
        ));
    }
}
