use crate::config::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;

fn required_dirs(cfg: &Config) -> Vec<PathBuf> {
    let mut dirs = vec![cfg.output_dir.clone(), cfg.data_dir.clone(), cfg.token_dir()];
    if let Some(parent) = cfg.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            dirs.push(parent.to_path_buf());
        }
    }
    dirs
}

/// Create the output, data and token directories if missing.
pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in required_dirs(cfg) {
        if fs::metadata(&dir).await.is_err() {
            fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
            tracing::info!(dir = %dir.display(), "created directory");
        }
    }
    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    for tool in ["ffmpeg", "ffprobe"] {
        match tokio::process::Command::new(tool).arg("-version").output().await {
            Ok(output) if output.status.success() => {}
            _ => return false,
        }
    }
    true
}
