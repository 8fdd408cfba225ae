use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_POLL_SECONDS: u64 = 30;

/// Host wide temperature unit, read once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "°F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Accepts `C`, `F`, `°C`, `°F` as well as the unit names, any case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_start_matches('°').to_ascii_lowercase().as_str() {
            "c" | "celsius" => Some(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Some(TemperatureUnit::Fahrenheit),
            _ => None,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Immutable platform settings shared by every entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformConfig {
    pub temperature_unit: TemperatureUnit,
}

impl PlatformConfig {
    pub fn new(temperature_unit: TemperatureUnit) -> Self {
        Self { temperature_unit }
    }
}

/// Runtime settings of the polling binary, taken from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub config_entry_path: PathBuf,
    pub status_path: PathBuf,
    pub platform: PlatformConfig,
    pub poll_interval: Duration,
}

impl AppSettings {
    pub fn from_env() -> anyhow::Result<Self> {
        let config_entry_path = env::var("APEX_CONFIG_ENTRY")
            .context("APEX_CONFIG_ENTRY must point at the configuration entry JSON")?;
        let status_path = env::var("APEX_STATUS_FILE")
            .context("APEX_STATUS_FILE must point at the controller status JSON")?;

        Ok(Self {
            config_entry_path: config_entry_path.into(),
            status_path: status_path.into(),
            platform: PlatformConfig::new(parse_temperature_unit(env::var("APEX_TEMP_UNIT").ok())),
            poll_interval: parse_poll_interval(env::var("APEX_POLL_SECONDS").ok()),
        })
    }
}

/// Falls back to Celsius when unset or unrecognised.
fn parse_temperature_unit(val: Option<String>) -> TemperatureUnit {
    let Some(raw) = val else {
        return TemperatureUnit::default();
    };
    TemperatureUnit::parse(&raw).unwrap_or_else(|| {
        tracing::warn!("Unknown APEX_TEMP_UNIT `{raw}`, using {}", TemperatureUnit::default());
        TemperatureUnit::default()
    })
}

/// Falls back to the default interval when unset, unparsable or zero.
fn parse_poll_interval(val: Option<String>) -> Duration {
    let seconds = match val.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_POLL_SECONDS,
        Some(raw) => match raw.parse::<u64>() {
            Ok(seconds) if seconds > 0 => seconds,
            _ => {
                tracing::warn!("Invalid APEX_POLL_SECONDS `{raw}`, using {DEFAULT_POLL_SECONDS}s");
                DEFAULT_POLL_SECONDS
            }
        },
    };
    Duration::from_secs(seconds)
}
