pub mod gateway;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repositories;
pub mod schema;

pub mod mock;

use std::{sync::Arc, time::Duration};

use eyre::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::{info, warn};

pub use gateway::{Gateway, Record, Transaction};
pub use memory::MemoryGateway;
pub use postgres::PgGateway;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Settings for [`open_gateway`].
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub statement_timeout: Duration,
}

/// Opens the configured datastore, initialising the schema when it is
/// PostgreSQL. Without a database URL the in-memory gateway is used.
pub async fn open_gateway(options: &GatewayOptions) -> Result<Arc<dyn Gateway>> {
    match &options.database_url {
        Some(url) => {
            let pool = create_pool(url, options.max_connections).await?;
            schema::initialize_database(&pool).await?;
            info!("Connected to PostgreSQL");
            Ok(Arc::new(PgGateway::new(pool, options.statement_timeout)))
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory datastore, nothing will survive a restart");
            Ok(Arc::new(MemoryGateway::with_lock_timeout(options.statement_timeout)))
        }
    }
}
