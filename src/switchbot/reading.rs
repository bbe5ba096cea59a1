use crate::switchbot::DeviceType;

/// Canonical sensor record. Timestamps are assigned by the sink at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub device_id: String,

    pub device_type: DeviceType,

    pub temperature: f64,

    pub humidity: f64,

    /// Present iff `device_type` supports light level.
    pub light_level: Option<i64>,
}
