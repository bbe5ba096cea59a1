use std::{fmt, str::FromStr};

use anyhow::{Error, bail};

/// SwitchBot device types that report temperature and humidity through the
/// cloud API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Meter,
    MeterPlus,
    MeterPro,
    MeterProCO2,
    WoIOSensor,
    Humidifier,
    Hub2,
    Hub3,
}

pub const SUPPORTED_DEVICE_TYPES: &[DeviceType] = &[
    DeviceType::Meter,
    DeviceType::MeterPlus,
    DeviceType::MeterPro,
    DeviceType::MeterProCO2,
    DeviceType::WoIOSensor,
    DeviceType::Humidifier,
    DeviceType::Hub2,
    DeviceType::Hub3,
];

/// Subset of [`SUPPORTED_DEVICE_TYPES`] that additionally reports a light level.
pub const LIGHT_LEVEL_DEVICE_TYPES: &[DeviceType] = &[DeviceType::Hub2, DeviceType::Hub3];

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Meter => "Meter",
            DeviceType::MeterPlus => "MeterPlus",
            DeviceType::MeterPro => "MeterPro",
            DeviceType::MeterProCO2 => "MeterPro(CO2)",
            DeviceType::WoIOSensor => "WoIOSensor",
            DeviceType::Humidifier => "Humidifier",
            DeviceType::Hub2 => "Hub 2",
            DeviceType::Hub3 => "Hub 3",
        }
    }

    pub fn supports_light_level(&self) -> bool {
        LIGHT_LEVEL_DEVICE_TYPES.contains(self)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Meter" => Ok(DeviceType::Meter),
            "MeterPlus" => Ok(DeviceType::MeterPlus),
            "MeterPro" => Ok(DeviceType::MeterPro),
            "MeterPro(CO2)" => Ok(DeviceType::MeterProCO2),
            "WoIOSensor" => Ok(DeviceType::WoIOSensor),
            "Humidifier" => Ok(DeviceType::Humidifier),
            "Hub 2" => Ok(DeviceType::Hub2),
            "Hub 3" => Ok(DeviceType::Hub3),
            _ => bail!("unsupported device type: {}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_strings_round_trip() {
        for device_type in SUPPORTED_DEVICE_TYPES {
            let parsed: DeviceType = device_type.as_str().parse().unwrap();
            assert_eq!(parsed, *device_type);
        }
    }

    #[test]
    fn test_non_sensor_types_are_rejected() {
        for s in ["Bot", "Smart Lock", "Hub Mini", "Plug Mini (JP)", "", "hub 2"] {
            assert!(s.parse::<DeviceType>().is_err(), "{s} should be rejected");
        }
    }

    #[test]
    fn test_light_level_subset() {
        for device_type in LIGHT_LEVEL_DEVICE_TYPES {
            assert!(SUPPORTED_DEVICE_TYPES.contains(device_type));
        }
        assert!(DeviceType::Hub2.supports_light_level());
        assert!(!DeviceType::Meter.supports_light_level());
    }
}
