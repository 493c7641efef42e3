// src/config.rs

use anyhow::{Context, Result};
use std::{env, path::PathBuf};
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8000/api/stock-picker/run";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// `PORT`
    pub port: u16,
    /// `LOG_LEVEL`, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// `STOCK_PICKER_UPSTREAM_URL`: the engine's run endpoint or its API base.
    pub upstream_url: Url,
    /// `STOCK_PICKER_TOKEN`
    pub token: Option<String>,
    /// `STOCK_PICKER_DATA_DIR`
    pub data_dir: PathBuf,
    /// `STOCK_PICKER_CURRENCY`
    pub currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or empty values take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(p) => p
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port: {p}"))?,
            None => DEFAULT_PORT,
        };

        let upstream = var("STOCK_PICKER_UPSTREAM_URL")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());
        let upstream_url = Url::parse(&upstream)
            .with_context(|| format!("STOCK_PICKER_UPSTREAM_URL is not a valid url: {upstream}"))?;

        Ok(Self {
            port,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            upstream_url,
            token: var("STOCK_PICKER_TOKEN"),
            data_dir: var("STOCK_PICKER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            currency: var("STOCK_PICKER_CURRENCY").unwrap_or_else(|| "USD".to_string()),
        })
    }
}
