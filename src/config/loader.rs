use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::AppConfig;

const CONFIG_DIR: &str = "modalframe";
const CONFIG_FILE: &str = "config.toml";

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Load the configuration from `path`, or from the default location.
///
/// A missing file means defaults; a file that does not parse is an error.
pub fn load(path: Option<&Path>) -> color_eyre::Result<AppConfig> {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_path) else {
        debug!("No config directory found, using defaults");
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        debug!(?path, "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    debug!(?path, "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("modalframe-missing-config.toml");
        let _ = fs::remove_file(&path);

        let config = load(Some(&path)).unwrap();

        assert_eq!(config.timing.poll_max_attempts, 20);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("modalframe-invalid-{}.toml", std::process::id()));
        fs::write(&path, "timing = 3").unwrap();

        let result = load(Some(&path));
        let _ = fs::remove_file(&path);

        assert!(result.is_err());
    }
}
