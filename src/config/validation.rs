use crate::config::types::{Config, FetchConfig, HedgedocConfig, VaultConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound for concurrent downloads against a single server
const MAX_CONCURRENT_FETCHES: usize = 16;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_hedgedoc_config(&config.hedgedoc)?;
    validate_vault_config(&config.vault)?;
    validate_fetch_config(&config.fetch)?;
    Ok(())
}

/// Validates the server section
fn validate_hedgedoc_config(config: &HedgedocConfig) -> Result<(), ConfigError> {
    if config.root.is_empty() {
        return Err(ConfigError::Validation(
            "root cannot be empty, pass it on the command line or in [hedgedoc]".to_string(),
        ));
    }

    let url = Url::parse(&config.root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root '{}': {}", config.root, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Root '{}' must use http or https",
            config.root
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Root '{}' has no host",
            config.root
        )));
    }

    // Identities are URL paths, so the server must live at the top level
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidUrl(format!(
            "Root '{}' must be a bare origin without path, query or fragment",
            config.root
        )));
    }

    if config.start.is_empty() {
        return Err(ConfigError::Validation(
            "start cannot be empty".to_string(),
        ));
    }

    if config.start.contains(&['?', '#'][..]) {
        return Err(ConfigError::Validation(format!(
            "start must be a pad identity, got '{}'",
            config.start
        )));
    }

    if matches!(&config.history, Some(history) if history.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "history path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the output directory section
fn validate_vault_config(config: &VaultConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "vault path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the fetch section
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > MAX_CONCURRENT_FETCHES
    {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and {}, got {}",
            MAX_CONCURRENT_FETCHES, config.max_concurrent_fetches
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}
