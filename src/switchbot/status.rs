use serde_json::{Map, Value};

use crate::{
    error::{FetchCause, FetchError},
    switchbot::SwitchBotApi,
};

/// Untyped status payload as returned by the API, keys in snake_case.
pub type RawStatus = Map<String, Value>;

/// Fetches one device's current status. A single round trip with no retry.
pub async fn fetch_status<A: SwitchBotApi>(
    api: &A,
    device_id: &str,
) -> Result<RawStatus, FetchError> {
    let fail = |cause| FetchError {
        device_id: device_id.to_string(),
        cause,
    };

    match api.device_status(device_id).await {
        Ok(Value::Object(status)) => Ok(status),
        Ok(_) => Err(fail(FetchCause::NotAnObject)),
        Err(e) => Err(fail(FetchCause::Api(e))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::switchbot::ApiError;

    struct StatusApi;

    impl SwitchBotApi for StatusApi {
        async fn list_devices(&self) -> Result<Value, ApiError> {
            unreachable!("status fetcher never lists devices")
        }

        async fn device_status(&self, device_id: &str) -> Result<Value, ApiError> {
            match device_id {
                "ok" => Ok(json!({"device_id": "ok", "temperature": 20.1, "humidity": 55})),
                "list" => Ok(json!([1, 2, 3])),
                _ => Err(ApiError::Api {
                    status_code: 161,
                    message: "device offline".to_string(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_status_returns_object() {
        let status = fetch_status(&StatusApi, "ok").await.unwrap();

        assert_eq!(status.get("device_id"), Some(&json!("ok")));
    }

    #[tokio::test]
    async fn test_fetch_status_rejects_non_object() {
        let err = fetch_status(&StatusApi, "list").await.unwrap_err();

        assert_eq!(err.device_id, "list");
        assert!(matches!(err.cause, FetchCause::NotAnObject));
    }

    #[tokio::test]
    async fn test_fetch_status_wraps_api_error() {
        let err = fetch_status(&StatusApi, "offline").await.unwrap_err();

        assert_eq!(err.device_id, "offline");
        assert!(matches!(
            err.cause,
            FetchCause::Api(ApiError::Api {
                status_code: 161,
                ..
            })
        ));
    }
}
