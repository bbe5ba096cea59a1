use std::{future::Future, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::{Client, header::AUTHORIZATION};
use ring::hmac;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::Credentials;

// Ref: https://github.com/OpenWonderLabs/SwitchBotAPI#request-header
pub const DEFAULT_BASE_URL: &str = "https://api.switch-bot.com/v1.1";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SUCCESS_STATUS_CODE: i64 = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to SwitchBot API failed")]
    Transport(#[from] reqwest::Error),

    #[error("SwitchBot API returned HTTP {status}")]
    Http { status: u16 },

    #[error("SwitchBot API error {status_code}: {message}")]
    Api { status_code: i64, message: String },

    #[error("malformed SwitchBot API response")]
    Malformed(#[source] serde_json::Error),
}

/// Device API capability consumed by the directory and the status fetcher.
///
/// Both operations return the response `body` with its keys converted to
/// snake_case, e.g. `{"device_id": .., "light_level": ..}`.
pub trait SwitchBotApi: Send + Sync {
    fn list_devices(&self) -> impl Future<Output = Result<Value, ApiError>> + Send;

    fn device_status(
        &self,
        device_id: &str,
    ) -> impl Future<Output = Result<Value, ApiError>> + Send;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "statusCode")]
    status_code: i64,

    #[serde(default)]
    message: String,

    #[serde(default)]
    body: Value,
}

/// HTTP client for the SwitchBot cloud API (v1.1).
#[derive(Debug, Clone)]
pub struct SwitchBotClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl SwitchBotClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let t = Utc::now().timestamp_millis().to_string();
        let nonce = Uuid::new_v4().to_string();
        let sign = sign_request(&self.credentials, &t, &nonce);

        debug!(%url, "requesting SwitchBot API");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &self.credentials.token)
            .header("sign", sign)
            .header("t", t)
            .header("nonce", nonce)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        parse_envelope(&bytes)
    }
}

impl SwitchBotApi for SwitchBotClient {
    async fn list_devices(&self) -> Result<Value, ApiError> {
        self.get("devices").await
    }

    async fn device_status(&self, device_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("devices/{device_id}/status")).await
    }
}

// Ref: https://github.com/OpenWonderLabs/SwitchBotAPI#how-to-sign
fn sign_request(credentials: &Credentials, t: &str, nonce: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, credentials.secret.as_bytes());
    let payload = format!("{}{}{}", credentials.token, t, nonce);
    let tag = hmac::sign(&key, payload.as_bytes());

    STANDARD.encode(tag.as_ref()).to_uppercase()
}

fn parse_envelope(bytes: &[u8]) -> Result<Value, ApiError> {
    let envelope: Envelope = serde_json::from_slice(bytes).map_err(ApiError::Malformed)?;

    if envelope.status_code != SUCCESS_STATUS_CODE {
        return Err(ApiError::Api {
            status_code: envelope.status_code,
            message: envelope.message,
        });
    }

    Ok(decamelize(envelope.body))
}

/// Recursively rewrites object keys from camelCase to snake_case.
pub fn decamelize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (to_snake_case(&k), decamelize(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(decamelize).collect()),
        other => other,
    }
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut boundary = false;

    for c in key.chars() {
        if c.is_ascii_uppercase() {
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            boundary = false;
        } else {
            out.push(c);
            boundary = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }

    out
}
