use std::{fmt, time::Duration};

use reqwest::{
    Client, Url,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tracing::debug;

use crate::{
    config::InfluxConfig,
    error::{ConfigurationError, StorageError},
    sink::StorageSink,
    switchbot::SensorReading,
};

/// Writes one line-protocol point per reading to an InfluxDB v2 bucket.
///
/// Configuring only stores connection parameters; the first network call
/// happens on the first write.
#[derive(Clone)]
pub struct InfluxSink {
    client: Client,
    write_url: Url,
    token: String,
}

impl fmt::Debug for InfluxSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfluxSink")
            .field("write_url", &self.write_url.as_str())
            .finish_non_exhaustive()
    }
}

impl InfluxSink {
    pub fn configure(config: InfluxConfig, timeout: Duration) -> Result<Self, StorageError> {
        let write_url = write_url(&config)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            write_url,
            token: config.token,
        })
    }
}

impl StorageSink for InfluxSink {
    async fn write(&self, reading: &SensorReading) -> Result<(), StorageError> {
        let point = line_protocol(reading);
        debug!(device_id = %reading.device_id, %point, "writing point to InfluxDB");

        let response = self
            .client
            .post(self.write_url.clone())
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(point)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::InfluxRejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

fn write_url(config: &InfluxConfig) -> Result<Url, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::Invalid {
        name: "influxdb url",
        reason,
    };

    let mut url = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("{} cannot be a base URL", config.url)))?
        .pop_if_empty()
        .extend(["api", "v2", "write"]);
    url.query_pairs_mut()
        .append_pair("org", &config.org)
        .append_pair("bucket", &config.bucket);

    Ok(url)
}

/// Formats a reading as a single point without a timestamp; the server
/// assigns the time of receipt.
pub fn line_protocol(reading: &SensorReading) -> String {
    let mut line = format!(
        "{},device_id={} humidity={},temperature={}",
        escape_measurement(reading.device_type.as_str()),
        escape_tag(&reading.device_id),
        reading.humidity,
        reading.temperature,
    );

    if let Some(light_level) = reading.light_level {
        line.push_str(&format!(",light_level={light_level}i"));
    }

    line
}

// Ref: https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/#special-characters
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
