use std::ops::Deref;

use serde::Deserialize;
use snafu::ResultExt;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth;
use surrealdb::Surreal;

mod error;
mod macros;

/// Helper trait for executing arbitrary SurrealQL queries.
pub mod query;

pub use error::*;
pub use macros::Table;
pub use query::{Bindings, Only, Sql};

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

const SETUP: &str = include_str!("../../schema.surrealql");

/// Shared handle to the database connection. Cheap to clone; it is
/// passed through application state rather than living in a global.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Surreal<Any>,
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Database {
    /// Connect, select the namespace/database and apply the bootstrap
    /// schema. The schema statements are idempotent.
    pub async fn connect(config: &DatabaseConfig) -> Result<Database> {
        let inner = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .context(ConnectionSnafu { url: config.url.as_str() })?;

        if let Some(credentials) = &config.credentials {
            inner
                .signin(auth::Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &credentials.username,
                    password: &credentials.password,
                })
                .await
                .context(ConnectionSnafu { url: config.url.as_str() })?;
        }

        inner
            .use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .context(ConnectionSnafu { url: config.url.as_str() })?;

        inner.query(SETUP).await.context(QuerySnafu)?;

        Ok(Database { inner })
    }

    /// In-memory database, used by the test suite and local hacking.
    pub async fn memory() -> Result<Database> {
        Database::connect(&DatabaseConfig::memory()).await
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "surreal_url")]
    pub url: String,
    #[serde(rename = "surreal_ns", default = "default_namespace")]
    pub namespace: String,
    #[serde(rename = "surreal_db", default = "default_database")]
    pub database: String,

    #[serde(flatten)]
    pub credentials: Option<DatabaseCredentials>,
}

impl DatabaseConfig {
    pub fn memory() -> DatabaseConfig {
        DatabaseConfig {
            url: "mem://".to_string(),
            namespace: default_namespace(),
            database: default_database(),
            credentials: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseCredentials {
    #[serde(rename = "surreal_user")]
    pub username: String,
    #[serde(rename = "surreal_pass")]
    pub password: String,
}

fn default_namespace() -> String {
    "benshi".to_string()
}

fn default_database() -> String {
    "benshi".to_string()
}
