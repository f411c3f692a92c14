//! Subcommand implementations.
//!
//! Each command loads the input into a [`TextureSession`], applies its edits
//! and, where it produces a container, exports and writes it.

use std::path::{Path, PathBuf};

use serde_json::Value;
use vrmtex_core::glb::{RebuildOptions, TextureInfo};
use vrmtex_core::session::{SessionOptions, TextureSession, suggested_file_name};

use crate::args::{Cli, Command};
use crate::config::{self, AppConfig};
use crate::error::AppError;

/// Run a parsed command line to completion.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let config = config::load_or_default(&cli.config);
    execute(cli.command, &config).await
}

/// Run one subcommand with an already loaded config.
pub async fn execute(command: Command, config: &AppConfig) -> Result<(), AppError> {
    let session = TextureSession::with_options(SessionOptions {
        rebuild: RebuildOptions {
            view_alignment: config.rebuild.view_alignment,
        },
    });

    let input = command.input().to_path_buf();
    let data = read_file(&input).await?;
    session.load(&data).await?;

    match command {
        Command::Info { .. } => {
            if let Some(doc) = session.document() {
                println!("{}", asset_line(&doc));
            }
            for line in info_lines(&session.textures()) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Extract { out, .. } => {
            let written = extract_to(&session.textures(), &out).await?;
            log::info!("wrote {} textures to {}", written.len(), out.display());
            Ok(())
        }
        Command::Replace {
            index,
            image,
            output,
            ..
        } => {
            let bytes = read_file(&image).await?;
            session.replace(index, bytes, None).await?;
            export_to(&session, output_path(&input, output, config)).await
        }
        Command::Resize {
            indices,
            max_dimension,
            output,
            ..
        } => {
            let max_dimension = max_dimension.unwrap_or(config.resize.max_dimension);
            let indices = if indices.is_empty() {
                (0..session.textures().len()).collect()
            } else {
                indices
            };
            for index in indices {
                session.request_resize(index, max_dimension)?;
            }
            export_to(&session, output_path(&input, output, config)).await
        }
        Command::Roundtrip { output, .. } => {
            export_to(&session, output_path(&input, output, config)).await
        }
    }
}

/// Container summary printed above the texture list.
pub fn asset_line(doc: &Value) -> String {
    let asset = &doc["asset"];
    let version = asset["version"].as_str().unwrap_or("?");
    let generator = asset["generator"].as_str().unwrap_or("unknown generator");
    let views = doc["bufferViews"].as_array().map_or(0, Vec::len);
    let extensions: Vec<&str> = doc["extensionsUsed"]
        .as_array()
        .map(|used| used.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut line = format!("glTF {version} ({generator}), {views} bufferViews");
    if !extensions.is_empty() {
        line.push_str(", extensions: ");
        line.push_str(&extensions.join(", "));
    }
    line
}

/// One summary line per texture.
pub fn info_lines(textures: &[TextureInfo]) -> Vec<String> {
    textures
        .iter()
        .map(|t| {
            format!(
                "{:>3}  {:<24} {:<11} {:>5}x{:<5} {:>9} bytes",
                t.index,
                t.name,
                t.mime_type,
                t.original_width,
                t.original_height,
                t.blob.len()
            )
        })
        .collect()
}

/// Keep file names portable: anything but ASCII alphanumerics, `-` and `_`
/// becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "texture".into()
    } else {
        sanitized
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "bin",
    }
}

/// Write every texture as `<index>_<name>.<ext>` under `dir`.
pub async fn extract_to(textures: &[TextureInfo], dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| AppError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut written = Vec::with_capacity(textures.len());
    for texture in textures {
        let path = dir.join(format!(
            "{}_{}.{}",
            texture.index,
            sanitize_file_name(&texture.name),
            extension_for(&texture.mime_type)
        ));
        write_file(&path, texture.blob.bytes()).await?;
        log::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// `--output` if given, else `<stem><suffix>.<ext>` next to the input.
pub fn output_path(input: &Path, output: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    output.unwrap_or_else(|| {
        let original = input.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        input.with_file_name(suggested_file_name(original, &config.output.suffix))
    })
}

async fn export_to(session: &TextureSession, path: PathBuf) -> Result<(), AppError> {
    let glb = session.export().await?;
    write_file(&path, &glb).await?;
    log::info!("wrote {} ({} bytes)", path.display(), glb.len());
    Ok(())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, AppError> {
    tokio::fs::read(path).await.map_err(|source| AppError::Read {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), AppError> {
    tokio::fs::write(path, data)
        .await
        .map_err(|source| AppError::Write {
            path: path.to_path_buf(),
            source,
        })
}
