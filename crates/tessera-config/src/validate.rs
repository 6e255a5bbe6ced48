//! Post-merge configuration validation.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_server(config)?;
    validate_issuer(config)?;
    validate_monitoring(config)?;
    validate_trust(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_url(field: &str, value: &str) -> ConfigResult<()> {
    let url =
        Url::parse(value).map_err(|e| invalid(field, format!("'{value}' is not a URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field,
            format!("unsupported scheme '{}'; expected http or https", url.scheme()),
        ));
    }
    Ok(())
}

fn validate_server(config: &Config) -> ConfigResult<()> {
    validate_url("server.external_url", &config.server.external_url)
}

fn validate_issuer(config: &Config) -> ConfigResult<()> {
    let issuer = &config.issuer;

    if let Some(url) = &issuer.federation_url {
        validate_url("issuer.federation_url", url)?;
    }

    if !issuer.discovery_path.starts_with('/') {
        return Err(invalid(
            "issuer.discovery_path",
            "discovery path must start with '/'",
        ));
    }

    let cookie = &issuer.cookie_name;
    if cookie.is_empty()
        || cookie
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, ';' | '=' | ','))
    {
        return Err(invalid(
            "issuer.cookie_name",
            format!("'{cookie}' is not a valid cookie name"),
        ));
    }

    Ok(())
}

fn validate_monitoring(config: &Config) -> ConfigResult<()> {
    let m = &config.monitoring;

    if m.token_expires_in_secs == 0 {
        return Err(invalid(
            "monitoring.token_expires_in_secs",
            "token lifetime must be positive",
        ));
    }

    for (field, prefix) in [
        ("monitoring.metrics_prefix", &m.metrics_prefix),
        ("monitoring.query_prefix", &m.query_prefix),
    ] {
        if !prefix.starts_with('/') {
            return Err(invalid(field, format!("prefix '{prefix}' must start with '/'")));
        }
    }

    Ok(())
}

fn validate_trust(config: &Config) -> ConfigResult<()> {
    let t = &config.trust;

    if t.ttl_secs == 0 {
        return Err(invalid("trust.ttl_secs", "TTL must be positive"));
    }
    if t.fetch_timeout_secs == 0 {
        return Err(invalid(
            "trust.fetch_timeout_secs",
            "fetch timeout must be positive",
        ));
    }
    if i64::try_from(t.clock_skew_secs).is_err() {
        return Err(invalid("trust.clock_skew_secs", "clock skew is out of range"));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    let valid_targets = ["stderr", "stdout", "file"];
    if !valid_targets.contains(&config.logging.target.as_str()) {
        return Err(invalid(
            "logging.target",
            format!(
                "unsupported log target '{}'; expected one of: {}",
                config.logging.target,
                valid_targets.join(", ")
            ),
        ));
    }
    if config.logging.target == "file" && config.logging.directory.is_none() {
        return Err(invalid(
            "logging.directory",
            "a log directory is required when logging to files",
        ));
    }

    let valid_rotations = ["daily", "hourly", "never"];
    if !valid_rotations.contains(&config.logging.rotation.as_str()) {
        return Err(invalid(
            "logging.rotation",
            format!(
                "unsupported log rotation '{}'; expected one of: {}",
                config.logging.rotation,
                valid_rotations.join(", ")
            ),
        ));
    }
    if config.logging.file_prefix.is_empty() {
        return Err(invalid("logging.file_prefix", "file prefix must not be empty"));
    }

    Ok(())
}
