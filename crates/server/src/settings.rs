//! Configuration loading
//!
//! Layers, lowest to highest precedence: built-in defaults, an optional
//! `ratefeed.toml` in the working directory, then `RATEFEED_*` environment
//! variables (`RATEFEED_PROVIDERS=coingecko,coinbase,kucoin`).

use config::{Config, Environment, File, FileFormat};

use ratefeed_core::ServiceConfig;

pub const ENV_PREFIX: &str = "RATEFEED";
pub const CONFIG_FILE: &str = "ratefeed";

/// Load service configuration from file and environment
pub fn load_config() -> anyhow::Result<ServiceConfig> {
    load_config_from(Some(CONFIG_FILE), None, ENV_PREFIX)
}

/// Load configuration from an optional file path, optional inline TOML, and an env prefix
pub fn load_config_from(
    file: Option<&str>,
    inline_toml: Option<&str>,
    env_prefix: &str,
) -> anyhow::Result<ServiceConfig> {
    let defaults = ServiceConfig::default();
    let default_providers: Vec<String> = defaults
        .providers
        .iter()
        .map(|p| p.name().to_ascii_lowercase())
        .collect();

    let mut builder = Config::builder()
        .set_default("host", defaults.host.clone())?
        .set_default("port", i64::from(defaults.port))?
        .set_default("providers", default_providers)?
        .set_default("http_timeout_secs", defaults.http_timeout_secs as i64)?
        .set_default("request_timeout_secs", defaults.request_timeout_secs as i64)?;

    if let Some(file) = file {
        builder = builder.add_source(File::with_name(file).required(false));
    }
    if let Some(toml) = inline_toml {
        builder = builder.add_source(File::from_str(toml, FileFormat::Toml));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("providers"),
        )
        .build()?;

    let config: ServiceConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
