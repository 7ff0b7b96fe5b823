use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

/// Secrets that must not sign sessions outside development.
const PLACEHOLDER_SECRETS: &[&str] = &["", "it's a secret", "dev-secret-change-me"];

pub struct Config {
    pub db_path: PathBuf,
    pub secret_key: String,
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let db_path = std::env::var("WARBLER_DB_PATH").unwrap_or_else(|_| "warbler.db".into());
        let secret_key =
            std::env::var("WARBLER_SECRET_KEY").unwrap_or_else(|_| "dev-secret-change-me".into());
        if PLACEHOLDER_SECRETS.contains(&secret_key.as_str()) {
            warn!("WARBLER_SECRET_KEY is unset or a placeholder; sessions can be forged");
        }
        let host = std::env::var("WARBLER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("WARBLER_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()?;
        let static_dir = std::env::var("WARBLER_STATIC_DIR").unwrap_or_else(|_| "static".into());

        Ok(Self {
            db_path: db_path.into(),
            secret_key,
            addr: format!("{}:{}", host, port).parse()?,
            static_dir: static_dir.into(),
        })
    }
}
