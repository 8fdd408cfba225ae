//! Apex Sensors Library
//!
//! This library exposes the readings of an Apex aquarium controller as typed sensor
//! entities, and derives cumulative energy sensors for power drawing outputs.

pub mod coordinator;
pub mod energy_sensor;
pub mod entity_factory;
pub mod metadata_resolver;
pub mod platform_config;
pub mod program_parser;
pub mod reading_sensor;
pub mod sensor_catalog;
pub mod sensor_descriptor;
pub mod status_payload;
pub mod status_poller;
pub mod value_resolver;

// Re-export commonly used types for easier access
pub use coordinator::Coordinator;
pub use energy_sensor::{EnergyAccumulator, EnergySensor};
pub use entity_factory::{setup_entry, ApexEntity, EntityFactory, EntityRegistrar, EntitySnapshot};
pub use platform_config::{AppSettings, PlatformConfig, TemperatureUnit};
pub use reading_sensor::ReadingSensor;
pub use sensor_descriptor::{ConfigEntry, SensorDescriptor, SensorKind};
pub use status_payload::StatusPayload;
pub use status_poller::{EntityRegistry, StatusPoller};
pub use value_resolver::SensorState;
