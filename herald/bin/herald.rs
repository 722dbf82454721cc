#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use std::path::{Path, PathBuf};

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

const CONFIG_ENV: &str = "HERALD_CONFIG";
const CONFIG_PATHS: &[&str] = &["./herald.config.ron", "/etc/herald/herald.config.ron"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = find_config_file()?;
    let contents = std::fs::read_to_string(&config_path).map_err(|err| {
        anyhow::anyhow!("Failed to read config from {}: {err}", config_path.display())
    })?;
    let herald: herald::controller::Herald = ron::from_str(&contents)?;

    herald.run().await
}

/// Locate the configuration file: the `HERALD_CONFIG` environment variable
/// wins, then the working directory, then the system-wide path.
fn find_config_file() -> anyhow::Result<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        anyhow::bail!(
            "{CONFIG_ENV} points to non-existent file: {}",
            path.display()
        );
    }

    CONFIG_PATHS
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| {
            let tried = CONFIG_PATHS
                .iter()
                .map(|path| format!("  - {path}"))
                .collect::<Vec<_>>()
                .join("\n");
            anyhow::anyhow!(
                "No configuration file found. Tried:\n  - {CONFIG_ENV} environment variable\n{tried}"
            )
        })
}
