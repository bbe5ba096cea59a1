use serde_json::Value;

use crate::{
    error::NormalizationError,
    switchbot::{DeviceType, RawStatus, SensorReading},
};

const DEVICE_ID: &str = "device_id";
const TEMPERATURE: &str = "temperature";
const HUMIDITY: &str = "humidity";
const LIGHT_LEVEL: &str = "light_level";

/// Converts a raw status payload into a [`SensorReading`].
///
/// `light_level` is read only for light-capable device types; the type is
/// authoritative, so a value reported by any other device is dropped.
pub fn normalize(
    device_type: DeviceType,
    raw: &RawStatus,
) -> Result<SensorReading, NormalizationError> {
    let device_id = required_string(raw, DEVICE_ID)?;
    let temperature = required_f64(raw, TEMPERATURE)?;
    let humidity = required_f64(raw, HUMIDITY)?;
    let light_level = if device_type.supports_light_level() {
        Some(required_i64(raw, LIGHT_LEVEL)?)
    } else {
        None
    };

    Ok(SensorReading {
        device_id,
        device_type,
        temperature,
        humidity,
        light_level,
    })
}

fn field<'a>(raw: &'a RawStatus, name: &'static str) -> Result<&'a Value, NormalizationError> {
    match raw.get(name) {
        None | Some(Value::Null) => Err(NormalizationError::MissingField(name)),
        Some(value) => Ok(value),
    }
}

fn invalid(name: &'static str, value: &Value) -> NormalizationError {
    NormalizationError::InvalidField {
        field: name,
        value: value.to_string(),
    }
}

fn required_string(raw: &RawStatus, name: &'static str) -> Result<String, NormalizationError> {
    let value = field(raw, name)?;
    match value {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        _ => Err(invalid(name, value)),
    }
}

fn required_f64(raw: &RawStatus, name: &'static str) -> Result<f64, NormalizationError> {
    let value = field(raw, name)?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(name, value))
}

fn required_i64(raw: &RawStatus, name: &'static str) -> Result<i64, NormalizationError> {
    let value = field(raw, name)?;
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| invalid(name, value))
}
