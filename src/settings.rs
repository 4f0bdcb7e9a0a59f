use crate::catalog::snap::{CARDS_API_URL, LOCATIONS_API_URL};
use crate::download::DEFAULT_CONCURRENCY;
use crate::error::Error;
use crate::utils::http::get_user_agent;
use crate::utils::images::CanonicalFormat;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "snap-fetch.toml";
pub const DEFAULT_ROOT: &str = "marvel-snap";
const DEFAULT_TIMEOUT_SECS: i64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub root: PathBuf,
    pub concurrency: usize,
    pub format: CanonicalFormat,
    pub cards_url: String,
    pub locations_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

/// Values given on the command line. They win over every other source.
#[derive(Debug, Default)]
pub struct Overrides {
    pub root: Option<String>,
    pub concurrency: Option<usize>,
    pub format: Option<CanonicalFormat>,
}

/// Layer defaults, the optional config file, `SNAP_FETCH_*` environment
/// variables and `overrides`, in that order.
pub fn load_settings(config_path: &str, overrides: &Overrides) -> Result<Settings, Error> {
    let settings: Settings = Config::builder()
        .set_default("root", DEFAULT_ROOT)?
        .set_default("concurrency", DEFAULT_CONCURRENCY as i64)?
        .set_default("format", CanonicalFormat::default().extension())?
        .set_default("cards_url", CARDS_API_URL)?
        .set_default("locations_url", LOCATIONS_API_URL)?
        .set_default("user_agent", get_user_agent())?
        .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
        .add_source(File::with_name(config_path).required(false))
        .add_source(Environment::with_prefix("SNAP_FETCH").try_parsing(true))
        .set_override_option("root", overrides.root.clone())?
        .set_override_option("concurrency", overrides.concurrency.map(|c| c as i64))?
        .set_override_option("format", overrides.format.map(|f| f.extension()))?
        .build()?
        .try_deserialize()?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    fn validate(&self) -> Result<(), Error> {
        if self.concurrency == 0 {
            return Err(Error::InvalidSetting(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.root.as_os_str().is_empty() {
            return Err(Error::InvalidSetting("root must not be empty".to_string()));
        }
        Ok(())
    }
}
