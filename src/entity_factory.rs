use crate::coordinator::Coordinator;
use crate::energy_sensor::EnergySensor;
use crate::metadata_resolver::{DeviceClass, StateClass};
use crate::platform_config::PlatformConfig;
use crate::reading_sensor::ReadingSensor;
use crate::sensor_catalog::manual_sensors;
use crate::sensor_descriptor::{ConfigEntry, SensorDescriptor, SensorKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Any entity this integration exposes to the host.
#[derive(Debug, Clone)]
pub enum ApexEntity {
    Reading(ReadingSensor),
    Energy(EnergySensor),
}

/// Point in time view of an entity, as the host would render it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub unique_id: String,
    pub state: Option<String>,
    pub unit_of_measurement: Option<&'static str>,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub icon: Option<&'static str>,
    pub attributes: Option<Value>,
}

impl ApexEntity {
    pub fn unique_id(&self) -> &str {
        match self {
            ApexEntity::Reading(sensor) => sensor.unique_id(),
            ApexEntity::Energy(sensor) => sensor.unique_id(),
        }
    }

    pub fn descriptor(&self) -> &SensorDescriptor {
        match self {
            ApexEntity::Reading(sensor) => sensor.descriptor(),
            ApexEntity::Energy(sensor) => sensor.descriptor(),
        }
    }

    pub fn should_poll(&self) -> bool {
        match self {
            ApexEntity::Reading(sensor) => sensor.should_poll(),
            ApexEntity::Energy(sensor) => sensor.should_poll(),
        }
    }

    /// Refresh hook called by the scheduler once per tick.
    pub fn update(&mut self) {
        match self {
            // Readings resolve lazily from the coordinator
            ApexEntity::Reading(_) => {}
            ApexEntity::Energy(sensor) => sensor.update(),
        }
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        match self {
            ApexEntity::Reading(sensor) => EntitySnapshot {
                unique_id: sensor.unique_id().to_owned(),
                state: sensor.state().map(|state| state.to_string()),
                unit_of_measurement: sensor.unit_of_measurement(),
                device_class: sensor.device_class(),
                state_class: sensor.state_class(),
                icon: sensor.icon(),
                attributes: sensor.extra_state_attributes(),
            },
            ApexEntity::Energy(sensor) => EntitySnapshot {
                unique_id: sensor.unique_id().to_owned(),
                state: Some(sensor.state().to_string()),
                unit_of_measurement: Some(sensor.unit_of_measurement()),
                device_class: Some(sensor.device_class()),
                state_class: Some(sensor.state_class()),
                icon: Some(sensor.icon()),
                attributes: Some(sensor.extra_state_attributes()),
            },
        }
    }
}

/// Host side entity registration.
pub trait EntityRegistrar {
    fn register_entities(
        &mut self,
        entities: Vec<ApexEntity>,
        update_before_add: bool,
    ) -> anyhow::Result<()>;
}

/// Builds entities from a configuration entry.
#[derive(Debug, Clone)]
pub struct EntityFactory {
    coordinator: Coordinator,
    platform: PlatformConfig,
    options: Arc<serde_json::Map<String, Value>>,
}

impl EntityFactory {
    pub fn new(coordinator: Coordinator, platform: PlatformConfig, entry: &ConfigEntry) -> Self {
        tracing::debug!("System temperature unit: {}", platform.temperature_unit);
        Self {
            coordinator,
            platform,
            options: Arc::new(entry.options.clone()),
        }
    }

    fn reading(&self, descriptor: &SensorDescriptor) -> ApexEntity {
        ApexEntity::Reading(ReadingSensor::new(
            self.coordinator.clone(),
            descriptor.clone(),
            self.platform,
            self.options.clone(),
        ))
    }

    fn energy(&self, descriptor: &SensorDescriptor) -> ApexEntity {
        ApexEntity::Energy(EnergySensor::new(
            self.coordinator.clone(),
            descriptor.clone(),
            self.options.clone(),
        ))
    }

    /// Sensors for configured inputs and outputs.
    ///
    /// Every input gets a reading sensor, `pwr` inputs also get an energy
    /// sensor. Outputs only get one for the types with a value extractor.
    pub fn configured_entities(&self, entry: &ConfigEntry) -> Vec<ApexEntity> {
        let mut entities = Vec::new();

        for input in &entry.data.inputs {
            entities.push(self.reading(input));
            if input.kind == SensorKind::Power {
                tracing::debug!("Creating energy sensor for power input: {}", input.name);
                entities.push(self.energy(input));
            }
        }

        entities.extend(
            entry
                .data
                .outputs
                .iter()
                .filter(|output| output.kind.is_supported_output())
                .map(|output| self.reading(output)),
        );

        entities
    }

    pub fn manual_entities(&self) -> Vec<ApexEntity> {
        manual_sensors()
            .iter()
            .map(|descriptor| self.reading(descriptor))
            .collect()
    }
}

/// Sets up every entity for `entry` and hands them to the host.
///
/// Configured sensors are registered as one batch, manual sensors one at a
/// time so a rejected one doesn't take the others down. Only a failure of
/// the batch is returned.
pub fn setup_entry(
    coordinator: Coordinator,
    platform: PlatformConfig,
    entry: &ConfigEntry,
    registrar: &mut impl EntityRegistrar,
) -> anyhow::Result<()> {
    let factory = EntityFactory::new(coordinator, platform, entry);

    registrar.register_entities(factory.configured_entities(entry), true)?;

    for entity in factory.manual_entities() {
        let unique_id = entity.unique_id().to_owned();
        if let Err(e) = registrar.register_entities(vec![entity], true) {
            tracing::warn!("Failed to register {unique_id}: {e:#}");
        }
    }

    Ok(())
}
