//! Static lookup tables for the sensor types the controller reports.

use crate::sensor_descriptor::{SensorDescriptor, SensorKind, PUMP_TYPE};

/// Presentation defaults for a recognized sensor type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorProfile {
    pub icon: &'static str,
    /// Default unit. For `Temp` the host temperature unit is used instead.
    pub measurement: Option<&'static str>,
}

const fn profile(icon: &'static str, measurement: Option<&'static str>) -> SensorProfile {
    SensorProfile { icon, measurement }
}

pub const SENSORS: &[(&str, SensorProfile)] = &[
    ("Temp", profile("mdi:water-thermometer", Some("°C"))),
    ("Cond", profile("mdi:shaker-outline", Some("ppt"))),
    ("pH", profile("mdi:test-tube", Some("pH"))),
    ("ORP", profile("mdi:test-tube", Some("mV"))),
    ("alk", profile("mdi:test-tube", Some("dKH"))),
    ("ca", profile("mdi:test-tube", Some("ppm"))),
    ("mg", profile("mdi:test-tube", Some("ppm"))),
    ("Amps", profile("mdi:lightning-bolt-circle", Some("A"))),
    ("pwr", profile("mdi:power-plug", Some("W"))),
    ("volts", profile("mdi:flash-triangle", Some("V"))),
    ("digital", profile("mdi:digital-ocean", None)),
    ("feed", profile("mdi:timer", Some("mins"))),
    ("dos", profile("mdi:test-tube", Some("ml"))),
    ("variable", profile("mdi:cog-transfer", None)),
    ("virtual", profile("mdi:cog-transfer", None)),
    (PUMP_TYPE, profile("mdi:pump", Some("%"))),
    ("vortech", profile("mdi:pump", None)),
];

/// Units for inputs configured with an explicit measurement range.
pub const MEASUREMENTS: &[(&str, &str)] = &[
    ("in", "in"),
    ("cm", "cm"),
    ("ppt", "ppt"),
    ("sg", "SG"),
    ("mS", "mS"),
    ("uS", "µS"),
    ("ppm", "ppm"),
    ("pct", "%"),
    ("gph", "gph"),
    ("lpm", "L/min"),
];

pub fn sensor_profile(kind: &SensorKind) -> Option<&'static SensorProfile> {
    let name = kind.as_str();
    SENSORS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, profile)| profile)
}

pub fn measurement_unit(range: &str) -> Option<&'static str> {
    MEASUREMENTS
        .iter()
        .find(|(key, _)| *key == range)
        .map(|(_, unit)| *unit)
}

/// Sensors that don't come from the configuration entry.
pub fn manual_sensors() -> Vec<SensorDescriptor> {
    vec![SensorDescriptor::new(
        "feed_mode_remaining",
        "feed",
        SensorKind::Feed,
    )]
}
