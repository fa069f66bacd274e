use super::{types::Config, ConfigError};

use crate::generator::SUPPORTED_RATIOS;

/// Validate configuration semantics beyond what parsing enforces.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let Some(runware) = &config.generator.runware else {
        return Err(ConfigError::ValidationError(
            "generator backend is runware but [generator.runware] is missing".to_string(),
        ));
    };

    if runware.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "generator.runware.api_key must not be empty".to_string(),
        ));
    }

    if runware.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "generator.runware.url must not be empty".to_string(),
        ));
    }

    if runware.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "generator.runware.poll_interval_ms must be greater than zero".to_string(),
        ));
    }

    if runware.poll_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "generator.runware.poll_timeout_secs must be greater than zero".to_string(),
        ));
    }

    if config.orchestrator.default_duration_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.default_duration_secs must be greater than zero".to_string(),
        ));
    }

    if !SUPPORTED_RATIOS.contains(&config.orchestrator.default_ratio.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "orchestrator.default_ratio '{}' is not supported (expected one of {})",
            config.orchestrator.default_ratio,
            SUPPORTED_RATIOS.join(", ")
        )));
    }

    if config.server.max_upload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_bytes must be greater than zero".to_string(),
        ));
    }

    Ok(())
}
