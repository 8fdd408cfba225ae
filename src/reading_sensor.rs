use crate::coordinator::Coordinator;
use crate::metadata_resolver::{
    resolve_device_class, resolve_icon, resolve_state_class, resolve_unit, DeviceClass,
    StateClass,
};
use crate::platform_config::PlatformConfig;
use crate::sensor_descriptor::SensorDescriptor;
use crate::value_resolver::{resolve_attributes, resolve_state, SensorState};
use serde_json::{Map, Value};
use std::sync::Arc;

/// One controller quantity, read straight from the coordinator payload.
#[derive(Debug, Clone)]
pub struct ReadingSensor {
    descriptor: SensorDescriptor,
    coordinator: Coordinator,
    platform: PlatformConfig,
    options: Arc<Map<String, Value>>,
    unique_id: String,
}

impl ReadingSensor {
    pub fn new(
        coordinator: Coordinator,
        descriptor: SensorDescriptor,
        platform: PlatformConfig,
        options: Arc<Map<String, Value>>,
    ) -> Self {
        tracing::debug!("Creating sensor: {descriptor:?}");
        let unique_id = descriptor.entity_id();
        Self {
            descriptor,
            coordinator,
            platform,
            options,
            unique_id,
        }
    }

    pub fn descriptor(&self) -> &SensorDescriptor {
        &self.descriptor
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.unique_id
    }

    pub fn state(&self) -> Option<SensorState> {
        resolve_state(&self.descriptor, &self.coordinator.data())
    }

    pub fn extra_state_attributes(&self) -> Option<Value> {
        resolve_attributes(&self.descriptor, &self.coordinator.data())
    }

    pub fn unit_of_measurement(&self) -> Option<&'static str> {
        resolve_unit(&self.descriptor, &self.coordinator.data(), &self.platform)
    }

    pub fn device_class(&self) -> Option<DeviceClass> {
        resolve_device_class(&self.descriptor)
    }

    pub fn state_class(&self) -> Option<StateClass> {
        resolve_state_class(&self.descriptor)
    }

    pub fn icon(&self) -> Option<&'static str> {
        resolve_icon(&self.descriptor)
    }

    /// Coordinator driven, the host doesn't need to poll it.
    pub fn should_poll(&self) -> bool {
        false
    }
}
