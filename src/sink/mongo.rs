use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use mongodb::{
    Client, Collection, Database,
    bson::{self, Document, doc},
    error::{Error, ErrorKind},
    options::{
        ClientOptions, CreateCollectionOptions, Credential, TimeseriesGranularity,
        TimeseriesOptions,
    },
};
use tracing::{debug, info};

use crate::{
    config::{MongoConfig, MongoCredentials},
    error::StorageError,
    sink::StorageSink,
    switchbot::SensorReading,
};

pub const TIME_FIELD: &str = "timestamp";

pub const META_FIELD: &str = "device_id";

/// Documents expire ten years after their `timestamp`.
pub const EXPIRE_AFTER: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

// Ref: https://www.mongodb.com/docs/manual/reference/error-codes/
const NAMESPACE_EXISTS: i32 = 48;

/// The part of a database the sink needs for schema setup.
pub trait TimeSeriesCatalog: Send + Sync {
    fn collection_names(&self) -> impl Future<Output = Result<Vec<String>, StorageError>> + Send;

    fn create_time_series_collection(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl TimeSeriesCatalog for Database {
    async fn collection_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.list_collection_names().await?)
    }

    async fn create_time_series_collection(&self, name: &str) -> Result<(), StorageError> {
        match self
            .create_collection(name)
            .with_options(time_series_options())
            .await
        {
            Ok(()) => Ok(()),
            // Another process created it between the listing and now.
            Err(e) if is_namespace_exists(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn time_series_options() -> CreateCollectionOptions {
    let timeseries = TimeseriesOptions::builder()
        .time_field(TIME_FIELD.to_string())
        .meta_field(META_FIELD.to_string())
        .granularity(TimeseriesGranularity::Seconds)
        .build();

    CreateCollectionOptions::builder()
        .timeseries(timeseries)
        .expire_after_seconds(EXPIRE_AFTER)
        .build()
}

fn is_namespace_exists(error: &Error) -> bool {
    matches!(*error.kind, ErrorKind::Command(ref c) if c.code == NAMESPACE_EXISTS)
}

/// Sets the user and password on the parsed options, keeping any other
/// credential settings from the URI.
///
/// The driver only keeps `authSource` when the URI itself carries a user, so
/// it is read back from the query string here.
fn apply_credentials(options: &mut ClientOptions, uri: &str, credentials: MongoCredentials) {
    let credential = options.credential.get_or_insert_with(Credential::default);
    credential.username = Some(credentials.username);
    credential.password = Some(credentials.password);
    if credential.source.is_none() {
        credential.source = auth_source(uri);
    }
}

fn auth_source(uri: &str) -> Option<String> {
    let (_, query) = uri.split_once('?')?;

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.eq_ignore_ascii_case("authSource"))
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Creates `name` as a time-series collection unless it already exists.
///
/// Returns `true` if the collection was created by this call.
pub async fn ensure_time_series_collection<C: TimeSeriesCatalog>(
    catalog: &C,
    name: &str,
) -> Result<bool, StorageError> {
    let names = catalog.collection_names().await?;
    if names.iter().any(|n| n == name) {
        debug!(collection = name, "time-series collection already exists");
        return Ok(false);
    }

    info!(collection = name, "creating time-series collection");
    catalog.create_time_series_collection(name).await?;

    Ok(true)
}

#[derive(Debug, Clone)]
pub struct MongoSink {
    collection: Collection<Document>,
}

impl MongoSink {
    /// Connect and make sure the target collection exists.
    pub async fn configure(config: MongoConfig, timeout: Duration) -> Result<Self, StorageError> {
        let mut options = ClientOptions::parse(config.uri.as_str()).await?;
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        if let Some(credentials) = config.credentials {
            apply_credentials(&mut options, &config.uri, credentials);
        }

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);

        ensure_time_series_collection(&database, &config.collection).await?;

        Ok(Self {
            collection: database.collection(&config.collection),
        })
    }
}

impl StorageSink for MongoSink {
    async fn write(&self, reading: &SensorReading) -> Result<(), StorageError> {
        let document = reading_document(reading, Utc::now());
        debug!(device_id = %reading.device_id, %document, "inserting document into MongoDB");

        self.collection.insert_one(document).await?;

        Ok(())
    }
}

pub fn reading_document(reading: &SensorReading, timestamp: DateTime<Utc>) -> Document {
    let mut document = doc! {
        "timestamp": bson::DateTime::from_millis(timestamp.timestamp_millis()),
        "metadata": { "device_id": reading.device_id.as_str() },
        "temperature": reading.temperature,
        "humidity": reading.humidity,
    };

    if let Some(light_level) = reading.light_level {
        document.insert("light_level", light_level);
    }

    document
}
