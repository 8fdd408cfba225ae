use crate::platform_config::PlatformConfig;
use crate::sensor_catalog::{measurement_unit, sensor_profile};
use crate::sensor_descriptor::{SensorDescriptor, SensorKind};
use crate::status_payload::StatusPayload;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    Power,
    Current,
    Voltage,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

/// Unit of measurement for `descriptor`.
///
/// A configured input range (`iconf[].extra.range`) wins over the per type
/// default, unknown ranges fall through to it. Temperatures follow the host
/// unit rather than the table.
pub fn resolve_unit(
    descriptor: &SensorDescriptor,
    payload: &StatusPayload,
    platform: &PlatformConfig,
) -> Option<&'static str> {
    if let Some(unit) = payload
        .input_config(&descriptor.did)
        .and_then(|config| config.range())
        .and_then(measurement_unit)
    {
        return Some(unit);
    }

    let measurement = sensor_profile(&descriptor.kind)?.measurement?;
    if descriptor.kind == SensorKind::Temperature {
        Some(platform.temperature_unit.symbol())
    } else {
        Some(measurement)
    }
}

pub fn resolve_device_class(descriptor: &SensorDescriptor) -> Option<DeviceClass> {
    match descriptor.kind {
        SensorKind::Temperature => Some(DeviceClass::Temperature),
        SensorKind::Power => Some(DeviceClass::Power),
        SensorKind::Current => Some(DeviceClass::Current),
        SensorKind::Voltage => Some(DeviceClass::Voltage),
        _ => None,
    }
}

pub fn resolve_state_class(descriptor: &SensorDescriptor) -> Option<StateClass> {
    sensor_profile(&descriptor.kind).map(|_| StateClass::Measurement)
}

pub fn resolve_icon(descriptor: &SensorDescriptor) -> Option<&'static str> {
    match sensor_profile(&descriptor.kind) {
        Some(profile) => Some(profile.icon),
        None => {
            tracing::debug!("Missing icon: {}", descriptor.kind);
            None
        }
    }
}
