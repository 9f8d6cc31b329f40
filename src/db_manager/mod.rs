pub mod error_handling;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dotenvy;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use tracing::debug;

use crate::{actions::init::ENV_LOCATION, seed_generator::dump_exporter::ConnectionConfig};

const MAX_DB_CONNECTIONS: u32 = 5;

pub struct DbConnection {
    pool: PgPool,
    connection_config: ConnectionConfig,
    pg_bin_path: Option<PathBuf>,
}

impl DbConnection {
    pub async fn new() -> Result<Self> {
        dotenvy::from_filename(ENV_LOCATION)
            .with_context(|| format!("Could not load the connection details from {}", ENV_LOCATION))?;

        let connection_config = ConnectionConfig {
            user: dotenvy::var("DB_USER")?,
            password: dotenvy::var("DB_PASSWORD")?,
            host: dotenvy::var("DB_HOST")?,
            port: dotenvy::var("DB_PORT")?,
            database: dotenvy::var("DB_NAME")?,
        };

        // Optional, pg_dump is looked up on the PATH when it is not set
        let pg_bin_path = dotenvy::var("PG_BIN_PATH").ok().map(PathBuf::from);

        debug!(
            host = %connection_config.host,
            port = %connection_config.port,
            database = %connection_config.database,
            "connecting to postgres"
        );

        let pool = PgPoolOptions::new()
            .max_connections(MAX_DB_CONNECTIONS)
            .connect_with(get_connect_options(&connection_config)?)
            .await?;

        return Ok(Self {
            pool,
            connection_config,
            pg_bin_path,
        });
    }

    pub fn get_connection_pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn get_connection_config(&self) -> &ConnectionConfig {
        &self.connection_config
    }

    pub fn get_pg_bin_path(&self) -> Option<&Path> {
        self.pg_bin_path.as_deref()
    }
}

/// Credentials are passed as they are, so no part of them needs URL escaping.
pub fn get_connect_options(config: &ConnectionConfig) -> Result<PgConnectOptions> {
    let port = config
        .port
        .parse::<u16>()
        .with_context(|| format!("DB_PORT {} is not a valid port", config.port))?;

    Ok(PgConnectOptions::new()
        .host(&config.host)
        .port(port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.database))
}
