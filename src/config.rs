use std::net::SocketAddr;
use std::path::PathBuf;

use crate::database::DatabaseConfig;
use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::prelude::*;

pub fn load() -> Result<Config, ApplicationError> {
    envy::from_env::<Config>().context(ConfigLoadSnafu)
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address")]
    pub host: SocketAddr,

    #[serde(flatten)]
    pub surreal: DatabaseConfig,

    /// Root of the uploaded media tree, served verbatim under `/media/`.
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Secret used to sign admin session tokens.
    pub session_secret: String,

    /// Staff account seeded at startup when set.
    #[serde(flatten)]
    pub admin: Option<AdminConfig>,

    // envy hands every value to serde as a string, parse explicitly
    #[serde(
        default = "default_max_upload_bytes",
        deserialize_with = "bytes_from_env"
    )]
    pub max_upload_bytes: usize,
}

fn bytes_from_env<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<usize, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(rename = "admin_username")]
    pub username: String,
    #[serde(rename = "admin_password")]
    pub password: String,
}

fn default_media_root() -> PathBuf {
    PathBuf::from("media")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_upload_bytes() -> usize {
    1024 * 1024 * 1024
}
