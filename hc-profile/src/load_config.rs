/// `load_config` module: builds the runtime [`Config`] for the CLI.
///
/// Sources, lowest precedence first:
/// 1. built-in defaults,
/// 2. an optional YAML file (`--config`),
/// 3. the `HC_PROFILE_OUTPUT_DIR` environment variable (a `.env` file is loaded by `main`),
/// 4. the `--output-dir` flag.
///
/// All errors are `anyhow::Error` and surface at the CLI boundary.
use anyhow::Result;
use hc_profile_core::config::Config;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const OUTPUT_DIR_ENV: &str = "HC_PROFILE_OUTPUT_DIR";

pub fn load_config(path: Option<&Path>, output_dir_flag: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => {
            info!("No config file given, using defaults");
            Config::default()
        }
    };

    if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
        if !dir.trim().is_empty() {
            info!(env = OUTPUT_DIR_ENV, output_dir = %dir, "Output directory taken from environment");
            config.output_dir = PathBuf::from(dir);
        }
    }
    if let Some(dir) = output_dir_flag {
        config.output_dir = dir;
    }

    if let Err(e) = config.validate() {
        error!(error = %e, "Config rejected");
        return Err(e.into());
    }
    config.trace_loaded();
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path,
                e
            ));
        }
    };

    match serde_yaml::from_str(&content) {
        Ok(config) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
