pub mod app_config;
pub mod database;
pub mod memory;
pub mod postgres;

use std::sync::Arc;
use carpool_core::Repositories;
use tracing::info;

pub use app_config::{Backend, Config};
pub use database::DbClient;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to connect to database: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// The storage backend chosen at startup, with its lifecycle.
pub struct Store {
    pub repositories: Repositories,
    db: Option<DbClient>,
}

impl Store {
    pub async fn open(config: &app_config::DatabaseConfig) -> Result<Self, StoreError> {
        match config.backend {
            Backend::Memory => {
                info!("Using in-memory store; data is lost on restart");
                Ok(Self::memory())
            }
            Backend::Postgres => {
                let db = DbClient::new(config).await?;
                if config.run_migrations {
                    db.migrate().await?;
                }
                let repositories = Repositories::from_store(Arc::new(PgStore::new(db.pool.clone())));
                Ok(Self { repositories, db: Some(db) })
            }
        }
    }

    pub fn memory() -> Self {
        Self {
            repositories: Repositories::from_store(Arc::new(MemoryStore::new())),
            db: None,
        }
    }

    pub async fn close(&self) {
        if let Some(db) = &self.db {
            db.close().await;
        }
    }
}
