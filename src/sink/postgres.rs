use std::{fmt, time::Duration};

use chrono::Utc;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::debug;

use crate::{
    config::PostgresConfig,
    error::{ConfigurationError, StorageError},
    sink::StorageSink,
    switchbot::SensorReading,
};

pub const DEFAULT_TABLE: &str = "switchbot_measurements";

#[derive(Clone)]
pub struct PostgresSink {
    pool: PgPool,
    insert_query: String,
}

impl fmt::Debug for PostgresSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSink")
            .field("insert_query", &self.insert_query)
            .finish_non_exhaustive()
    }
}

impl PostgresSink {
    /// Connect and create the measurement table if it does not exist.
    pub async fn configure(config: PostgresConfig, timeout: Duration) -> Result<Self, StorageError> {
        validate_table_name(&config.table)?;

        let pool = PgPoolOptions::new()
            .acquire_timeout(timeout)
            .connect(&config.url)
            .await?;

        sqlx::query(&create_table_query(&config.table))
            .execute(&pool)
            .await?;

        Ok(Self {
            pool,
            insert_query: insert_query(&config.table),
        })
    }
}

impl StorageSink for PostgresSink {
    async fn write(&self, reading: &SensorReading) -> Result<(), StorageError> {
        debug!(device_id = %reading.device_id, "inserting row into PostgreSQL");

        sqlx::query(&self.insert_query)
            .bind(reading.device_id.as_str())
            .bind(reading.device_type.as_str())
            .bind(Utc::now())
            .bind(reading.temperature)
            .bind(reading.humidity)
            .bind(reading.light_level)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn validate_table_name(table: &str) -> Result<(), ConfigurationError> {
    let mut chars = table.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(ConfigurationError::Invalid {
            name: "postgres table",
            reason: format!("{table:?} is not a plain SQL identifier"),
        });
    }

    Ok(())
}

fn create_table_query(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            device_id TEXT NOT NULL,
            device_type TEXT NOT NULL,
            measured_at TIMESTAMPTZ NOT NULL,
            temperature_celsius DOUBLE PRECISION NOT NULL,
            humidity_percent DOUBLE PRECISION NOT NULL,
            light_level BIGINT,
            PRIMARY KEY (device_id, measured_at)
        )
        "#
    )
}

fn insert_query(table: &str) -> String {
    format!(
        r#"
        INSERT INTO {table} (device_id, device_type, measured_at, temperature_celsius, humidity_percent, light_level)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (device_id, measured_at) DO NOTHING
        "#
    )
}
