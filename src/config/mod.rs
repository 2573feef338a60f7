pub mod settings;

pub use settings::*;

use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File};
use tracing::{debug, info};

/// Environment overrides look like `BTC_DASHBOARD__API__BASE_URL`.
pub const ENV_PREFIX: &str = "BTC_DASHBOARD";

/// Defaults, then the optional TOML file at `path`, then the environment
/// (after loading `.env` if one exists).
pub fn load(path: &str) -> Result<Settings> {
    match dotenvy::dotenv() {
        Ok(env_path) => debug!("Loaded environment from {}", env_path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).context("reading .env file"),
    }

    let cfg = Config::builder()
        .add_source(Config::try_from(&Settings::default()).context("encoding default settings")?)
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .context("building config")?;

    let settings: Settings = cfg.try_deserialize().context("deserializing config")?;
    settings
        .validate()
        .map_err(|errors| anyhow!("invalid configuration: {}", errors.join(", ")))?;

    info!(
        "Configuration loaded: api={}, history={}d, refresh={}s",
        settings.api.base_url, settings.dashboard.history_days, settings.dashboard.refresh_interval_secs
    );
    Ok(settings)
}
