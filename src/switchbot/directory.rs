use serde::Deserialize;
use tracing::debug;

use crate::{
    error::DirectoryError,
    switchbot::{Device, DeviceMap, DeviceType, SwitchBotApi},
};

#[derive(Debug, Deserialize)]
struct DeviceList {
    device_list: Vec<ListedDevice>,
}

#[derive(Debug, Deserialize)]
struct ListedDevice {
    device_id: String,
    device_type: String,
}

/// Lists the account's devices and keeps only those whose type is in
/// [`SUPPORTED_DEVICE_TYPES`](crate::switchbot::SUPPORTED_DEVICE_TYPES).
pub struct DeviceDirectory<'a, A> {
    api: &'a A,
}

impl<'a, A: SwitchBotApi> DeviceDirectory<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    pub async fn list_sensor_devices(&self) -> Result<DeviceMap, DirectoryError> {
        let body = self.api.list_devices().await?;
        let list: DeviceList = serde_json::from_value(body).map_err(DirectoryError::Malformed)?;

        let devices = list
            .device_list
            .into_iter()
            .filter_map(|d| match d.device_type.parse::<DeviceType>() {
                Ok(r#type) => Some((d.device_id.clone(), Device::new(d.device_id, r#type))),
                Err(_) => {
                    debug!(device_id = %d.device_id, device_type = %d.device_type, "skipping non-sensor device");
                    None
                }
            })
            .collect();

        Ok(devices)
    }
}
