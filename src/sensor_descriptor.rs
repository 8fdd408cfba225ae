use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const PUMP_TYPE: &str = "iotaPump|Sicce|Syncra";

/// Device output/input type as reported by the controller.
///
/// Types this module extracts values for get their own variant, everything
/// else (pH, ORP, Cond, outlets...) is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SensorKind {
    Power,
    Temperature,
    Current,
    Voltage,
    Feed,
    Dosing,
    Variable,
    Virtual,
    Vortech,
    Pump,
    Other(String),
}

impl SensorKind {
    pub fn as_str(&self) -> &str {
        match self {
            SensorKind::Power => "pwr",
            SensorKind::Temperature => "Temp",
            SensorKind::Current => "Amps",
            SensorKind::Voltage => "volts",
            SensorKind::Feed => "feed",
            SensorKind::Dosing => "dos",
            SensorKind::Variable => "variable",
            SensorKind::Virtual => "virtual",
            SensorKind::Vortech => "vortech",
            SensorKind::Pump => PUMP_TYPE,
            SensorKind::Other(name) => name,
        }
    }

    /// Output types that get a reading sensor, the rest are skipped.
    pub fn is_supported_output(&self) -> bool {
        matches!(
            self,
            SensorKind::Dosing
                | SensorKind::Variable
                | SensorKind::Virtual
                | SensorKind::Vortech
                | SensorKind::Pump
        )
    }
}

impl From<&str> for SensorKind {
    fn from(value: &str) -> Self {
        match value {
            "pwr" => SensorKind::Power,
            "Temp" => SensorKind::Temperature,
            "Amps" => SensorKind::Current,
            "volts" => SensorKind::Voltage,
            "feed" => SensorKind::Feed,
            "dos" => SensorKind::Dosing,
            "variable" => SensorKind::Variable,
            "virtual" => SensorKind::Virtual,
            "vortech" => SensorKind::Vortech,
            PUMP_TYPE => SensorKind::Pump,
            other => SensorKind::Other(other.to_owned()),
        }
    }
}

impl From<String> for SensorKind {
    fn from(value: String) -> Self {
        SensorKind::from(value.as_str())
    }
}

impl From<SensorKind> for String {
    fn from(value: SensorKind) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of one entity, taken from the configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    pub name: String,
    pub did: String,
    #[serde(rename = "type")]
    pub kind: SensorKind,
}

impl SensorDescriptor {
    pub fn new(name: &str, did: &str, kind: impl Into<SensorKind>) -> Self {
        Self {
            name: name.to_owned(),
            did: did.to_owned(),
            kind: kind.into(),
        }
    }

    /// Entity identifier, `apex_<name>`.
    pub fn entity_id(&self) -> String {
        format!("apex_{}", self.name)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryData {
    #[serde(default)]
    pub inputs: Vec<SensorDescriptor>,
    #[serde(default)]
    pub outputs: Vec<SensorDescriptor>,
}

/// Configuration entry handed over by the host at setup.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    #[serde(default)]
    pub data: EntryData,
    /// Passed through to every entity untouched.
    #[serde(default)]
    pub options: Map<String, Value>,
}
