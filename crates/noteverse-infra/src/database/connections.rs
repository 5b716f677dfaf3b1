#[cfg(feature = "postgres")]
use std::time::Duration;

#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

/// Configuration for the post store database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// The long-lived store connection, established once at startup and shared
/// by every request handler.
#[cfg(feature = "postgres")]
pub struct DatabaseConnections {
    /// Pooled connection to the post store.
    pub main: DbConn,
}

#[cfg(not(feature = "postgres"))]
pub struct DatabaseConnections;

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Open the connection pool described by `config`.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!("Database connected (pool: {})", config.max_connections);

        Ok(Self { main })
    }

    /// Verify the store is reachable.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.main.ping().await
    }
}

#[cfg(not(feature = "postgres"))]
impl DatabaseConnections {
    /// Without a database there is nothing to reach.
    pub async fn ping(&self) -> Result<(), std::convert::Infallible> {
        Ok(())
    }
}
