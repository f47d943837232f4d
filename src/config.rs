use std::{env, path::PathBuf};

use anyhow::Context;
use url::Url;

pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:8000/graphql";
pub const DEFAULT_GRAPHQL_RETRIES: u32 = 3;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);
        Ok(Self {
            port,
            database_url,
            host,
        })
    }
}

/// Settings for the scheduled jobs that poll the GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub graphql_url: Url,
    pub retries: u32,
    pub heartbeat_log: PathBuf,
    pub low_stock_log: PathBuf,
    pub report_log: PathBuf,
    pub reminders_log: PathBuf,
}

impl JobsConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw_url = lookup("CRM_GRAPHQL_URL").unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());
        let graphql_url =
            Url::parse(&raw_url).with_context(|| format!("invalid CRM_GRAPHQL_URL: {raw_url}"))?;

        let retries = match lookup("CRM_GRAPHQL_RETRIES") {
            Some(value) => value
                .parse::<u32>()
                .with_context(|| format!("invalid CRM_GRAPHQL_RETRIES: {value}"))?,
            None => DEFAULT_GRAPHQL_RETRIES,
        };

        let path = |key: &str, default: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Ok(Self {
            graphql_url,
            retries,
            heartbeat_log: path("CRM_HEARTBEAT_LOG", "/tmp/crm_heartbeat_log.txt"),
            low_stock_log: path("CRM_LOW_STOCK_LOG", "/tmp/low_stock_updates_log.txt"),
            report_log: path("CRM_REPORT_LOG", "/tmp/crm_report_log.txt"),
            reminders_log: path("CRM_REMINDERS_LOG", "/tmp/order_reminders_log.txt"),
        })
    }
}
