use std::time::Duration;

use anyhow::Result;
use mongodb::Client;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use tracing::info;

use crate::config::Config;

const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(2);

/// Handle to the document store. Pooling and reconnection are owned by the
/// driver; this type only establishes and health-checks the connection.
#[derive(Clone)]
pub struct Database {
    db: mongodb::Database,
}

impl Database {
    /// Connects and round-trips a `ping` so an unreachable server surfaces
    /// here instead of on the first request.
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.mongo_uri).await?;
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options)?;
        let db = client
            .default_database()
            .unwrap_or_else(|| client.database("sample"));

        db.run_command(doc! { "ping": 1 }).await?;
        info!("Connected to database '{}'", db.name());

        Ok(Self { db })
    }

    pub async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        self.db.name()
    }
}
