use std::time::Duration;

use clap::{Parser, ValueEnum};
use switchbot_meter_database::{
    config::{
        Credentials, InfluxConfig, MongoConfig, MongoCredentials, PostgresConfig, StorageConfig,
    },
    error::ConfigurationError,
    sink::DEFAULT_TABLE,
    switchbot::DEFAULT_REQUEST_TIMEOUT,
};
use tracing::Level;

/// Largest `--interval` whose length in seconds still fits in a `u64`.
const MAX_INTERVAL_MINUTES: u64 = u64::MAX / 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Database {
    Influxdb,
    Mongodb,
    Postgres,
}

/// Store SwitchBot meter readings in InfluxDB, MongoDB or PostgreSQL
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Keep running and collect readings every `--interval` minutes
    #[arg(short, long)]
    pub daemon: bool,

    /// Minutes between runs in daemon mode
    #[arg(short = 't', long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
    pub interval: u64,

    /// Seconds before a single API or database call is abandoned
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout: u64,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,

    #[arg(long, env = "SWITCHBOT_TOKEN", hide_env_values = true)]
    pub switchbot_token: String,

    #[arg(long, env = "SWITCHBOT_SECRET", hide_env_values = true)]
    pub switchbot_secret: String,

    #[arg(long, env = "DATABASE", value_enum)]
    pub database: Database,

    #[arg(long, env = "INFLUXDB_URL")]
    pub influxdb_url: Option<String>,

    #[arg(long, env = "INFLUXDB_TOKEN", hide_env_values = true)]
    pub influxdb_token: Option<String>,

    #[arg(long, env = "INFLUXDB_ORG")]
    pub influxdb_org: Option<String>,

    #[arg(long, env = "INFLUXDB_BUCKET")]
    pub influxdb_bucket: Option<String>,

    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    #[arg(long, env = "MONGODB_DATABASE")]
    pub mongodb_database: Option<String>,

    #[arg(long, env = "MONGODB_COLLECTION")]
    pub mongodb_collection: Option<String>,

    #[arg(long, env = "MONGODB_USER")]
    pub mongodb_user: Option<String>,

    #[arg(long, env = "MONGODB_PASSWORD", hide_env_values = true)]
    pub mongodb_password: Option<String>,

    #[arg(long = "postgres-url", env = "DATABASE_URL", hide_env_values = true)]
    pub postgres_url: Option<String>,

    #[arg(long, env = "POSTGRES_TABLE", default_value = DEFAULT_TABLE)]
    pub postgres_table: String,
}

impl Args {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.interval * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            token: self.switchbot_token.clone(),
            secret: self.switchbot_secret.clone(),
        }
    }

    pub fn storage_config(&self) -> Result<StorageConfig, ConfigurationError> {
        let config = match self.database {
            Database::Influxdb => StorageConfig::Influx(InfluxConfig {
                url: required(&self.influxdb_url, "INFLUXDB_URL")?,
                token: required(&self.influxdb_token, "INFLUXDB_TOKEN")?,
                org: required(&self.influxdb_org, "INFLUXDB_ORG")?,
                bucket: required(&self.influxdb_bucket, "INFLUXDB_BUCKET")?,
            }),
            Database::Mongodb => {
                let credentials = match (&self.mongodb_user, &self.mongodb_password) {
                    (Some(username), Some(password)) => Some(MongoCredentials {
                        username: username.clone(),
                        password: password.clone(),
                    }),
                    (None, None) => None,
                    (Some(_), None) => return Err(ConfigurationError::Missing("MONGODB_PASSWORD")),
                    (None, Some(_)) => return Err(ConfigurationError::Missing("MONGODB_USER")),
                };

                StorageConfig::Mongo(MongoConfig {
                    uri: required(&self.mongodb_uri, "MONGODB_URI")?,
                    database: required(&self.mongodb_database, "MONGODB_DATABASE")?,
                    collection: required(&self.mongodb_collection, "MONGODB_COLLECTION")?,
                    credentials,
                })
            }
            Database::Postgres => StorageConfig::Postgres(PostgresConfig {
                url: required(&self.postgres_url, "DATABASE_URL")?,
                table: self.postgres_table.clone(),
            }),
        };

        Ok(config)
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigurationError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ConfigurationError::Missing(name))
}
