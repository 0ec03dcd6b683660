use super::types::Config;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open config file '{}': {}", path.display(), e),
        ))
    })?;

    let config: Config = serde_yaml::from_str(&yaml)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.request_interval_hours == 0 {
        return Err(ConfigError::Validation(
            "request_interval_hours must be at least 1".to_string(),
        ));
    }
    if config.forecast_horizon == 0 {
        return Err(ConfigError::Validation(
            "forecast_horizon must be at least 1".to_string(),
        ));
    }
    if config.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be at least 1".to_string(),
        ));
    }
    if config.sim.tick_millis == 0 {
        return Err(ConfigError::Validation(
            "sim.tick_millis must be at least 1".to_string(),
        ));
    }
    if config.weather_data.is_empty() && config.server_url.is_empty() {
        return Err(ConfigError::Validation(
            "server_url must be set when weather_data is empty".to_string(),
        ));
    }
    Ok(())
}
