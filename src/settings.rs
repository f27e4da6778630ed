use crate::registry::MAX_CONNECTED_PEERS;
use crate::{Error, Result};

use config::{Config, File};
use serde::Deserialize;

use std::fmt;
use std::time::Duration;

// For explanation, see issue: https://github.com/serde-rs/serde/issues/368
fn default_service_name() -> String {
    "multiuser-ar".to_string()
}
fn default_max_peers() -> usize {
    MAX_CONNECTED_PEERS
}
fn default_lifetime_ms() -> u64 {
    550
}
fn default_model() -> String {
    "Laser".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,
    #[serde(default = "default_lifetime_ms")]
    pub placed_object_lifetime_ms: u64,
    #[serde(default = "default_model")]
    pub placed_object_model: String,
    /// Probability of losing a best-effort frame on the in-memory hub
    #[serde(default)]
    pub unreliable_loss: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            service_name: default_service_name(),
            max_peers: default_max_peers(),
            placed_object_lifetime_ms: default_lifetime_ms(),
            placed_object_model: default_model(),
            unreliable_loss: 0.0,
            log_level: default_log_level(),
        }
    }
}

const CONFIG_FILE_PATH: &str = "settings/Default.json";
const CONFIG_FILE_PREFIX: &str = "settings/";

#[derive(Clone, Debug, Deserialize)]
pub enum ENV {
    Testing,
    Development,
    Production,
}

impl fmt::Display for ENV {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ENV::Testing => write!(f, "Testing"),
            ENV::Production => write!(f, "Production"),
            ENV::Development => write!(f, "Development"),
        }
    }
}

impl From<&str> for ENV {
    fn from(env: &str) -> Self {
        match env {
            "Testing" => ENV::Testing,
            "Production" => ENV::Production,
            _ => ENV::Development,
        }
    }
}

impl Settings {
    /// Loads the default file with the overlay named by `RUN_ENV` (if present) on top.
    pub fn new() -> Result<Self> {
        let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "Development".into());
        let env = ENV::from(run_env.as_str());
        let settings: Settings = Config::builder()
            .add_source(File::with_name(CONFIG_FILE_PATH))
            .add_source(File::with_name(&format!("{}{}", CONFIG_FILE_PREFIX, env)).required(false))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let settings: Settings =
            Config::builder().add_source(File::with_name(path)).build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn object_lifetime(&self) -> Duration {
        Duration::from_millis(self.placed_object_lifetime_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_peers == 0 {
            return Err(Error::InvalidSettings("max_peers must be at least 1".to_owned()));
        }
        if !(0.0..=1.0).contains(&self.unreliable_loss) {
            return Err(Error::InvalidSettings(format!(
                "unreliable_loss {} is not a probability",
                self.unreliable_loss
            )));
        }
        if self.placed_object_model.is_empty() {
            return Err(Error::InvalidSettings("placed_object_model is empty".to_owned()));
        }
        Ok(())
    }
}
