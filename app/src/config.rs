//! `vrmtex.toml` configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::AppError;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "vrmtex.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub resize: ResizeConfig,
    pub rebuild: RebuildConfig,
    pub output: OutputConfig,
}

/// Defaults for the `resize` command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResizeConfig {
    /// Longest side in pixels when `--max` is not given.
    pub max_dimension: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1024,
        }
    }
}

/// Layout of rebuilt containers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RebuildConfig {
    /// Byte alignment of every bufferView offset. Must be a power of two.
    pub view_alignment: u32,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self { view_alignment: 1 }
    }
}

/// Output file naming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Appended to the input file stem when no `--output` is given.
    pub suffix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: "_edited".into(),
        }
    }
}

/// Load a config from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| AppError::Config {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a config, falling back to defaults when the file is missing or
/// malformed.
pub fn load_or_default(path: &Path) -> AppConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!("Loaded config: {}", path.display());
            config
        }
        Err(e @ AppError::Read { .. }) => {
            log::debug!("No config file ({e}), using defaults");
            AppConfig::default()
        }
        Err(e) => {
            log::warn!("{e}, using defaults");
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!(config.resize.max_dimension, 1024);
        assert_eq!(config.rebuild.view_alignment, 1);
        assert_eq!(config.output.suffix, "_edited");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str("[rebuild]\nview_alignment = 4\n").unwrap();
        assert_eq!(config.rebuild.view_alignment, 4);
        assert_eq!(config.resize.max_dimension, 1024);
        assert_eq!(config.output.suffix, "_edited");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[resize]\nmax_dimension = 512\n[output]\nsuffix = \"_small\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.resize.max_dimension, 512);
        assert_eq!(config.output.suffix, "_small");
    }

    #[test]
    fn missing_or_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert_eq!(load_or_default(&missing), AppConfig::default());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[resize\nmax_dimension = ").unwrap();
        assert!(matches!(load_config(&broken), Err(AppError::Config { .. })));
        assert_eq!(load_or_default(&broken), AppConfig::default());
    }
}
