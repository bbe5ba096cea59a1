//! Storage sinks
//!
//! A sink accepts one [`SensorReading`] at a time and persists it. The
//! pipeline only sees the [`StorageSink`] trait; [`Sink`] picks the backend
//! from a [`StorageConfig`] at startup.
//!
//! # Backends
//!
//! - [`InfluxSink`] -- InfluxDB v2 line protocol over HTTP
//! - [`MongoSink`] -- MongoDB time-series collection
//! - [`PostgresSink`] -- PostgreSQL table
//!
//! Success means "accepted by the backend"; no sink reads its writes back.

mod influx;
mod mongo;
mod postgres;

use std::{future::Future, time::Duration};

use tracing::info;

pub use influx::*;
pub use mongo::*;
pub use postgres::*;

use crate::{config::StorageConfig, error::StorageError, switchbot::SensorReading};

pub trait StorageSink: Send + Sync {
    /// Persist a single reading. Failures are not retried.
    fn write(
        &self,
        reading: &SensorReading,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

#[derive(Debug)]
pub enum Sink {
    Influx(InfluxSink),
    Mongo(MongoSink),
    Postgres(PostgresSink),
}

impl Sink {
    /// Configure the backend selected by `config`.
    ///
    /// `timeout` bounds every connection attempt and request the backend makes.
    pub async fn configure(config: StorageConfig, timeout: Duration) -> Result<Self, StorageError> {
        info!(backend = config.backend_name(), "configuring storage sink");

        let sink = match config {
            StorageConfig::Influx(c) => Sink::Influx(InfluxSink::configure(c, timeout)?),
            StorageConfig::Mongo(c) => Sink::Mongo(MongoSink::configure(c, timeout).await?),
            StorageConfig::Postgres(c) => {
                Sink::Postgres(PostgresSink::configure(c, timeout).await?)
            }
        };

        Ok(sink)
    }
}

impl StorageSink for Sink {
    async fn write(&self, reading: &SensorReading) -> Result<(), StorageError> {
        match self {
            Sink::Influx(s) => s.write(reading).await,
            Sink::Mongo(s) => s.write(reading).await,
            Sink::Postgres(s) => s.write(reading).await,
        }
    }
}
