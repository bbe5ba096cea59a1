//! Per-device poll, normalize and store.
//!
//! Each device's (fetch, normalize, write) triple yields its own
//! `Result<(), DeviceError>`; failures are folded into the [`RunReport`] and
//! never stop the remaining devices from being processed.

use std::{fmt, time::Duration};

use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::{
    error::{ErrorChain, FetchCause, FetchError, NormalizationError, StorageError},
    sink::StorageSink,
    switchbot::{Device, DeviceMap, SwitchBotApi, fetch_status, normalize},
};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to normalize status")]
    Normalize(#[from] NormalizationError),

    #[error("failed to write reading")]
    Write(#[from] StorageError),
}

#[derive(Debug)]
pub struct DeviceFailure {
    pub device_id: String,

    pub error: DeviceError,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub attempted: usize,

    pub succeeded: usize,

    pub fetch_failed: usize,

    pub normalize_failed: usize,

    pub write_failed: usize,

    pub failures: Vec<DeviceFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, device_id: &str, outcome: Result<(), DeviceError>) {
        self.attempted += 1;

        let error = match outcome {
            Ok(()) => {
                self.succeeded += 1;
                return;
            }
            Err(e) => e,
        };

        match error {
            DeviceError::Fetch(_) => self.fetch_failed += 1,
            DeviceError::Normalize(_) => self.normalize_failed += 1,
            DeviceError::Write(_) => self.write_failed += 1,
        }

        self.failures.push(DeviceFailure {
            device_id: device_id.to_string(),
            error,
        });
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempted={} succeeded={} fetch_failed={} normalize_failed={} write_failed={}",
            self.attempted,
            self.succeeded,
            self.fetch_failed,
            self.normalize_failed,
            self.write_failed
        )
    }
}

/// Processes devices one at a time, so writes to the sink are serialized.
#[derive(Debug, Clone, Copy)]
pub struct IngestionPipeline {
    call_timeout: Duration,
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_CALL_TIMEOUT)
    }
}

impl IngestionPipeline {
    /// `call_timeout` bounds each status fetch and each storage write.
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    pub async fn run<A, S>(&self, api: &A, sink: &S, devices: &DeviceMap) -> RunReport
    where
        A: SwitchBotApi,
        S: StorageSink,
    {
        let mut report = RunReport::default();

        for device in devices.values() {
            info!(device_id = %device.id, device_type = %device.r#type, "processing device");

            let outcome = self.ingest_device(api, sink, device).await;
            if let Err(e) = &outcome {
                warn!(device_id = %device.id, error = %ErrorChain(e), "device skipped");
            }

            report.record(&device.id, outcome);
        }

        info!(%report, "ingestion run finished");

        report
    }

    async fn ingest_device<A, S>(
        &self,
        api: &A,
        sink: &S,
        device: &Device,
    ) -> Result<(), DeviceError>
    where
        A: SwitchBotApi,
        S: StorageSink,
    {
        let status = timeout(self.call_timeout, fetch_status(api, &device.id))
            .await
            .map_err(|_| FetchError {
                device_id: device.id.clone(),
                cause: FetchCause::Timeout(self.call_timeout),
            })??;

        let reading = normalize(device.r#type, &status)?;

        timeout(self.call_timeout, sink.write(&reading))
            .await
            .map_err(|_| StorageError::Timeout(self.call_timeout))??;

        info!(device_id = %device.id, "reading saved");

        Ok(())
    }
}
