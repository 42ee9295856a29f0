use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

pub const DEFAULT_DETAILS_FILE: &str = "details.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub details_file: PathBuf,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());

        let port = lookup("APP_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .context("APP_PORT must be a valid u16")?;

        let details_file = lookup("DETAILS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DETAILS_FILE));

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => raw
                .parse::<u32>()
                .context("BCRYPT_COST must be a valid u32")?,
            None => bcrypt::DEFAULT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {bcrypt_cost}");
        }

        Ok(Self {
            host,
            port,
            details_file,
            bcrypt_cost,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
