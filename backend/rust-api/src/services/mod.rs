use crate::config::Config;
use mongodb::{Client as MongoClient, Database};

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
}

impl AppState {
    pub async fn new(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let mongo = mongo_client.database(&config.mongo_database);

        tracing::info!("Verifying MongoDB connectivity...");

        tokio::time::timeout(
            std::time::Duration::from_secs(10),
            mongo.run_command(mongodb::bson::doc! { "ping": 1 }),
        )
        .await
        .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 10s"))??;

        tracing::info!("MongoDB connection established");

        Ok(Self { config, mongo })
    }
}

pub mod answer_service;
pub mod progress_service;
