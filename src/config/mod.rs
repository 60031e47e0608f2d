mod types;

pub use types::*;

use crate::{Error, Result, server::RateSpec};
use std::{collections::HashMap, env, path::Path};
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let vars: HashMap<String, String> = env::vars().collect();
    load_from(Path::new(&config_path), &vars).await
}

/// Reads the optional YAML file at `path`, applies environment overrides from
/// `vars` and validates the result. A missing file means all defaults.
pub async fn load_from(path: &Path, vars: &HashMap<String, String>) -> Result<Config> {
    let mut config = if tokio::fs::try_exists(path).await? {
        debug!("Loading configuration from: {}", path.display());
        let config_str = tokio::fs::read_to_string(path).await?;
        serde_yaml::from_str::<Config>(&config_str)?
    } else {
        debug!("No configuration file at {}, using defaults", path.display());
        Config::default()
    };

    apply_env(&mut config, vars);
    validate(&config)?;

    Ok(config)
}

fn apply_env(config: &mut Config, vars: &HashMap<String, String>) {
    if let Some(base) = vars.get("HF_API_BASE").filter(|v| !v.is_empty()) {
        config.upstream.endpoints = EndpointTable::with_base(base);
    }
    if let Some(key) = vars.get("HF_API_KEY").filter(|v| !v.is_empty()) {
        config.upstream.api_key = key.clone();
    }
    if let Some(rate) = vars.get("RATE_LIMIT").filter(|v| !v.is_empty()) {
        config.server.rate_limit = rate.clone();
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.upstream.api_key.trim().is_empty() {
        return Err(Error::config(
            "Hugging Face API key not set; export HF_API_KEY",
        ));
    }
    if config.upstream.timeout_secs == 0 {
        return Err(Error::config("upstream.timeout_secs must be greater than zero"));
    }
    if config.server.max_body_bytes == 0 {
        return Err(Error::config("server.max_body_bytes must be greater than zero"));
    }
    config.server.rate_limit.parse::<RateSpec>()?;
    Ok(())
}
