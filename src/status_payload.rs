use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Reads an explicit `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Snapshot of the controller status as fetched by the upstream poller.
///
/// Every section is optional so a payload caught mid-refresh (or from a
/// controller that doesn't report a section at all) still deserializes.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub inputs: Vec<Input>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outputs: Vec<Output>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed: Option<FeedStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ControllerConfig>,
}

impl StatusPayload {
    /// First input matching `did`. Order matters, duplicates are ignored.
    pub fn input(&self, did: &str) -> Option<&Input> {
        self.inputs.iter().find(|input| input.did == did)
    }

    /// First output matching `did`.
    pub fn output(&self, did: &str) -> Option<&Output> {
        self.outputs.iter().find(|output| output.did == did)
    }

    /// Output configuration section, if the controller reported one.
    pub fn output_configs(&self) -> Option<&[OutputConfig]> {
        self.config.as_ref()?.oconf.as_deref()
    }

    /// Input configuration section, if the controller reported one.
    pub fn input_configs(&self) -> Option<&[InputConfig]> {
        self.config.as_ref()?.iconf.as_deref()
    }

    pub fn output_config(&self, did: &str) -> Option<&OutputConfig> {
        self.output_configs()?.iter().find(|conf| conf.did == did)
    }

    pub fn input_config(&self, did: &str) -> Option<&InputConfig> {
        self.input_configs()?.iter().find(|conf| conf.did == did)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    #[serde(default)]
    pub did: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Value>,
    /// Fields this module doesn't interpret, kept for the attribute view.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Input {
    /// The reading as a float, accepting both numbers and numeric strings.
    /// A record without a value reads as zero.
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.value {
            Value::Null => Some(0.0),
            value => as_f64(value),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    #[serde(default)]
    pub did: String,
    /// Position dependent fields, their meaning depends on the output type.
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Output {
    pub fn status_field(&self, index: usize) -> Option<&Value> {
        self.status.get(index)
    }
}

/// Firmware generation as announced by the fetcher through `apex_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApexGeneration {
    /// Apex Classic: `name` is the feed program index, 6 meaning off.
    Classic,
    /// Modern firmware: `active` counts seconds, large values mean idle.
    Modern,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedStatus {
    /// Seconds, though some firmware reports them as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apex_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeedStatus {
    pub fn active_seconds(&self) -> Option<f64> {
        self.active.as_ref().and_then(as_f64)
    }

    pub fn generation(&self) -> ApexGeneration {
        match self.apex_type.as_deref() {
            Some("old") => ApexGeneration::Classic,
            _ => ApexGeneration::Modern,
        }
    }

    /// Legacy feed program index (1-4 feeding, 6 off).
    pub fn program_index(&self) -> Option<i64> {
        let name = self.name.as_ref()?;
        match name {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iconf: Option<Vec<InputConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oconf: Option<Vec<OutputConfig>>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub did: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extra: InputConfigExtra,
}

impl InputConfig {
    /// The configured measurement range, anything but a string counts as none.
    pub fn range(&self) -> Option<&str> {
        self.extra.range.as_ref().and_then(Value::as_str)
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfigExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub did: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prog: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutputConfig {
    pub fn is_advanced(&self) -> bool {
        self.ctype.as_deref() == Some("Advanced")
    }
}

/// Lenient float conversion for loosely typed device fields.
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}
