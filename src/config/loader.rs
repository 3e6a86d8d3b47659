//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{ForwardMode, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {0} value: {1}")]
    Env(&'static str, String),

    #[error("validation failed: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Resolve the effective configuration: an optional TOML file named by
/// `UIGATE_CONFIG`, then environment overrides, then validation.
///
/// `PORT` overrides the external listener port (the backend follows it
/// unless `backend.port` was set explicitly); `UIGATE_MODE` selects the
/// forwarding strategy (`http` or `tcp`).
pub fn resolve_config() -> Result<ProxyConfig, ConfigError> {
    let mut config = match std::env::var("UIGATE_CONFIG") {
        Ok(path) => load_config(Path::new(&path))?,
        Err(_) => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides to an already-loaded config.
pub fn apply_env_overrides(config: &mut ProxyConfig) -> Result<(), ConfigError> {
    if let Ok(port) = std::env::var("PORT") {
        config.listener.port = port
            .parse()
            .map_err(|_| ConfigError::Env("PORT", port.clone()))?;
    }

    if let Ok(mode) = std::env::var("UIGATE_MODE") {
        config.mode = match mode.to_ascii_lowercase().as_str() {
            "http" => ForwardMode::Http,
            "tcp" => ForwardMode::Tcp,
            _ => return Err(ConfigError::Env("UIGATE_MODE", mode.clone())),
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_parses_toml() {
        let dir = std::env::temp_dir();
        let path = dir.join("uigate-loader-test.toml");
        fs::write(
            &path,
            "mode = \"tcp\"\n[listener]\nport = 9001\n[timeouts]\nread_secs = 5\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.port, 9001);
        assert_eq!(config.mode, ForwardMode::Tcp);
        assert_eq!(config.timeouts.read_secs, 5);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let dir = std::env::temp_dir();
        let path = dir.join("uigate-loader-invalid.toml");
        fs::write(&path, "[listener]\nport = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        fs::remove_file(&path).ok();
    }
}
