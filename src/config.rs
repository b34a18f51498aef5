use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017/sample";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub mongo_uri: String,
    pub slack_signing_secret: String,
    pub slack_bot_token: String,
}

impl Config {
    /// Loads configuration from an env file plus the process environment.
    ///
    /// The file is optional and its entries take precedence over the process
    /// environment. `${VAR}` references inside values are expanded by the
    /// parser against earlier entries.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let vars = read_env_file(path.as_ref());
        Self::from_vars(&vars)
    }

    fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let lookup = |key: &str| -> Option<String> {
            vars.get(key).cloned().or_else(|| std::env::var(key).ok())
        };

        let bind_addr = lookup("BIND_ADDR")
            .or_else(|| lookup("PORT").map(|p| format!("0.0.0.0:{p}")))
            .unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let mongo_uri = lookup("MONGO_URI").unwrap_or_else(|| DEFAULT_MONGO_URI.to_string());

        let slack_signing_secret =
            lookup("SLACK_SIGNING_SECRET").context("SLACK_SIGNING_SECRET is not set")?;
        let slack_bot_token = lookup("SLACK_BOT_TOKEN").context("SLACK_BOT_TOKEN is not set")?;

        Ok(Self {
            bind_addr,
            mongo_uri,
            slack_signing_secret,
            slack_bot_token,
        })
    }

    pub fn log_startup_info(&self) {
        info!("Listening on {}", self.bind_addr);
        info!(
            "Slack event endpoint mounted at {}",
            crate::receiver::EVENTS_PATH
        );
    }
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    match dotenv::from_path_iter(path) {
        Ok(iter) => iter
            .filter_map(|entry| match entry {
                Ok(pair) => Some(pair),
                Err(e) => {
                    debug!("Skipping unreadable env entry: {}", e);
                    None
                }
            })
            .collect(),
        Err(_) => {
            debug!(
                "No env file at {}, relying on process environment",
                path.display()
            );
            HashMap::new()
        }
    }
}
