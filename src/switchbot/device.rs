use indexmap::IndexMap;

use crate::switchbot::DeviceType;

/// Sensor devices selected for a run, keyed by device id.
pub type DeviceMap = IndexMap<String, Device>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: String,

    pub r#type: DeviceType,
}

impl Device {
    pub fn new(id: impl Into<String>, r#type: DeviceType) -> Self {
        Self {
            id: id.into(),
            r#type,
        }
    }
}
