//! Drives the pipeline once, or on a fixed interval until cancelled.
//!
//! The device directory is re-enumerated at the start of every run, so
//! devices added to or removed from the account are picked up at the next
//! period without a restart.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    error::{DirectoryError, ErrorChain},
    ingest::{DEFAULT_CALL_TIMEOUT, IngestionPipeline, RunReport},
    sink::StorageSink,
    switchbot::{DeviceDirectory, SwitchBotApi},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicSummary {
    pub runs: usize,

    /// Runs aborted because the device list could not be obtained.
    pub failed_runs: usize,
}

/// Owns the API client and the sink for the lifetime of the process.
pub struct Scheduler<A, S> {
    api: A,
    sink: S,
    call_timeout: Duration,
}

impl<A: SwitchBotApi, S: StorageSink> Scheduler<A, S> {
    pub fn new(api: A, sink: S) -> Self {
        Self {
            api,
            sink,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bound for every individual network call made during a run.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub async fn run_once(&self) -> Result<RunReport, DirectoryError> {
        let directory = DeviceDirectory::new(&self.api);
        let devices = timeout(self.call_timeout, directory.list_sensor_devices())
            .await
            .map_err(|_| DirectoryError::Timeout(self.call_timeout))??;

        info!(count = devices.len(), ids = ?devices.keys().collect::<Vec<_>>(), "sensor devices listed");

        let pipeline = IngestionPipeline::new(self.call_timeout);
        Ok(pipeline.run(&self.api, &self.sink, &devices).await)
    }

    /// Runs immediately, then once per `period` until `cancel` fires.
    ///
    /// Cancellation is observed between runs; a run in progress is allowed to
    /// finish so no write is cut short. A run whose device listing fails is
    /// logged and counted, and the next period is attempted as usual.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub async fn run_periodic(&self, period: Duration, cancel: CancellationToken) -> PeriodicSummary {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut summary = PeriodicSummary::default();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            summary.runs += 1;
            if let Err(e) = self.run_once().await {
                summary.failed_runs += 1;
                error!(error = %ErrorChain(&e), "run aborted");
            }
        }

        info!(
            runs = summary.runs,
            failed_runs = summary.failed_runs,
            "periodic scheduler stopped"
        );

        summary
    }
}
