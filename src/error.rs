use std::{error::Error as StdError, fmt, time::Duration};

use thiserror::Error;

use crate::switchbot::ApiError;

/// The device list could not be obtained. Fatal for the run.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to list SwitchBot devices")]
    Api(#[from] ApiError),

    #[error("malformed device list")]
    Malformed(#[source] serde_json::Error),

    #[error("listing devices timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
#[error("failed to fetch status of device {device_id}")]
pub struct FetchError {
    pub device_id: String,

    #[source]
    pub cause: FetchCause,
}

#[derive(Debug, Error)]
pub enum FetchCause {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("status body is not a JSON object")]
    NotAnObject,

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("InfluxDB request failed")]
    Influx(#[from] reqwest::Error),

    #[error("InfluxDB rejected the write with status {status}: {body}")]
    InfluxRejected { status: u16, body: String },

    #[error("MongoDB operation failed")]
    Mongo(#[from] mongodb::error::Error),

    #[error("PostgreSQL operation failed")]
    Postgres(#[from] sqlx::Error),

    #[error("storage write timed out after {0:?}")]
    Timeout(Duration),
}

/// Required configuration is missing or unusable. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("required configuration is not set: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Displays an error followed by each of its sources, separated by `: `.
pub struct ErrorChain<'a>(pub &'a dyn StdError);

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;

        let mut source = self.0.source();
        while let Some(e) = source {
            write!(f, ": {e}")?;
            source = e.source();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switchbot::ApiError;

    #[test]
    fn test_error_chain_includes_sources() {
        let err = FetchError {
            device_id: "B".to_string(),
            cause: FetchCause::Api(ApiError::Http { status: 503 }),
        };

        assert_eq!(
            ErrorChain(&err).to_string(),
            "failed to fetch status of device B: SwitchBot API returned HTTP 503"
        );
    }
}
