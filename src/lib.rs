//! Collects SwitchBot temperature, humidity and light-level readings from the
//! SwitchBot cloud API and stores them in InfluxDB, MongoDB or PostgreSQL.
//!
//! ```text
//! Scheduler
//! +-- DeviceDirectory     (lists devices, keeps sensor types)
//! +-- IngestionPipeline   (per device: fetch_status -> normalize -> StorageSink::write)
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod scheduler;
pub mod sink;
pub mod switchbot;
