//! Application state - shared across all handlers.

use std::sync::Arc;

use noteverse_core::PostGateway;
use noteverse_core::ports::PostRepository;
use noteverse_infra::{DatabaseConnections, InMemoryPostRepository};

use crate::config::AppConfig;

#[cfg(feature = "postgres")]
use noteverse_infra::PostgresPostRepository;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostGateway,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// An unreachable database degrades to the in-memory store; a failed
    /// migration aborts startup.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        #[cfg(feature = "postgres")]
        let (db, repo): (Option<Arc<DatabaseConnections>>, Arc<dyn PostRepository>) = {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => {
                        if config.auto_migrate {
                            use migration::{Migrator, MigratorTrait};

                            Migrator::up(&connections.main, None).await?;
                            tracing::info!("Database migrations applied");
                        }
                        let conn = Arc::new(connections);
                        let repo = Arc::new(PostgresPostRepository::new(conn.main.clone()));
                        (Some(conn), repo)
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        (None, Arc::new(InMemoryPostRepository::new()))
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, Arc::new(InMemoryPostRepository::new()))
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (db, repo): (Option<Arc<DatabaseConnections>>, Arc<dyn PostRepository>) = {
            let _ = config;
            tracing::info!("Running without postgres feature - using in-memory repository");
            (None, Arc::new(InMemoryPostRepository::new()))
        };

        tracing::info!("Application state initialized");

        Ok(Self {
            posts: PostGateway::new(repo),
            db,
        })
    }

    /// State backed by a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self {
            posts: PostGateway::new(Arc::new(InMemoryPostRepository::new())),
            db: None,
        }
    }
}
