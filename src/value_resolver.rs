//! Maps the loosely typed status payload onto sensor states.
//!
//! Lookup order is feed, then inputs, then outputs. Outputs are interpreted
//! according to the descriptor type (see [`output_extractor`]). Nothing here
//! fails: a missing section or record yields `None`.

use crate::program_parser::{parse_program, ProgramValue};
use crate::sensor_descriptor::{SensorDescriptor, SensorKind};
use crate::status_payload::{ApexGeneration, FeedStatus, Output, StatusPayload};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Shown for variable/virtual outputs whose program isn't an advanced one.
pub const NOT_ADVANCED: &str = "Not an Advanced variable!";

/// Feed `active` values above this mean no feed cycle is running.
const FEED_IDLE_SENTINEL: f64 = 50000.0;

/// Classic firmware program index meaning the feeder is off.
const CLASSIC_FEED_OFF: i64 = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorState {
    Integer(i64),
    Float(f64),
    Text(String),
    /// Device value passed through as reported.
    Raw(Value),
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorState::Integer(value) => write!(f, "{value}"),
            // Whole floats keep their decimal so "2.0" minutes never reads as "2"
            SensorState::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            SensorState::Float(value) => write!(f, "{value}"),
            SensorState::Text(text) => f.write_str(text),
            SensorState::Raw(Value::String(text)) => f.write_str(text),
            SensorState::Raw(value) => write!(f, "{value}"),
        }
    }
}

impl From<ProgramValue> for SensorState {
    fn from(value: ProgramValue) -> Self {
        match value {
            ProgramValue::Intensity(intensity) => SensorState::Integer(intensity),
            ProgramValue::Script(script) => SensorState::Text(script),
        }
    }
}

type OutputExtractor = fn(&SensorDescriptor, &Output, &StatusPayload) -> Option<SensorState>;

/// Extraction rule per output type, `None` for types without one.
pub fn output_extractor(kind: &SensorKind) -> Option<OutputExtractor> {
    match kind {
        SensorKind::Dosing => Some(dosing_state),
        SensorKind::Pump => Some(pump_state),
        SensorKind::Vortech => Some(vortech_state),
        SensorKind::Variable | SensorKind::Virtual => Some(variable_state),
        SensorKind::Power
        | SensorKind::Temperature
        | SensorKind::Current
        | SensorKind::Voltage
        | SensorKind::Feed
        | SensorKind::Other(_) => None,
    }
}

/// Current state of `descriptor`.
pub fn resolve_state(
    descriptor: &SensorDescriptor,
    payload: &StatusPayload,
) -> Option<SensorState> {
    if descriptor.kind == SensorKind::Feed {
        return Some(feed_state(payload.feed.as_ref()));
    }

    if let Some(input) = payload.input(&descriptor.did) {
        return Some(SensorState::Raw(input.value.clone()));
    }

    let output = payload.output(&descriptor.did)?;
    let extract = output_extractor(&descriptor.kind)?;
    extract(descriptor, output, payload)
}

/// The record backing `descriptor`, exposed as extra state attributes.
pub fn resolve_attributes(
    descriptor: &SensorDescriptor,
    payload: &StatusPayload,
) -> Option<Value> {
    if descriptor.kind == SensorKind::Feed {
        return payload.feed.as_ref().and_then(to_record);
    }

    if let Some(input) = payload.input(&descriptor.did) {
        return to_record(input);
    }

    let output = payload.output(&descriptor.did)?;
    match descriptor.kind {
        SensorKind::Dosing | SensorKind::Pump | SensorKind::Vortech => to_record(output),
        SensorKind::Variable | SensorKind::Virtual => match payload.output_config(&descriptor.did) {
            Some(config) => to_record(config),
            None => to_record(output),
        },
        _ => None,
    }
}

fn to_record<T: Serialize>(record: &T) -> Option<Value> {
    match serde_json::to_value(record) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Failed to serialize attribute record: {e}");
            None
        }
    }
}

fn feed_state(feed: Option<&FeedStatus>) -> SensorState {
    let Some(feed) = feed else {
        return SensorState::Integer(0);
    };

    match feed.generation() {
        ApexGeneration::Classic => {
            tracing::debug!("Classic feed status: {feed:?}");
            if feed.program_index() == Some(CLASSIC_FEED_OFF) {
                return SensorState::Integer(0);
            }
            match feed.active_seconds() {
                Some(active) => SensorState::Text(format_elapsed(active)),
                None => SensorState::Integer(0),
            }
        }
        ApexGeneration::Modern => match feed.active_seconds() {
            Some(active) if active > FEED_IDLE_SENTINEL => SensorState::Integer(0),
            Some(active) => SensorState::Float(round_half_even(active / 60.0, 1)),
            None => SensorState::Integer(0),
        },
    }
}

/// `H:MM:SS` past the hour, `M:SS` below it. Whole seconds only.
fn format_elapsed(active: f64) -> String {
    let total_seconds = if active.is_finite() && active > 0.0 {
        active as u64
    } else {
        0
    };
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if total_seconds > 3600 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{}:{seconds:02}", total_seconds / 60)
    }
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Ties round to even, so 15 s reads as 0.2 minutes.
fn round_half_even(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

fn dosing_state(_: &SensorDescriptor, output: &Output, _: &StatusPayload) -> Option<SensorState> {
    output.status_field(4).cloned().map(SensorState::Raw)
}

fn pump_state(_: &SensorDescriptor, output: &Output, _: &StatusPayload) -> Option<SensorState> {
    output.status_field(1).cloned().map(SensorState::Raw)
}

fn vortech_state(_: &SensorDescriptor, output: &Output, _: &StatusPayload) -> Option<SensorState> {
    let fields = (0..3)
        .map(|index| output.status_field(index).map(display_field))
        .collect::<Option<Vec<_>>>()?;
    Some(SensorState::Text(fields.join(" ")))
}

fn variable_state(
    descriptor: &SensorDescriptor,
    output: &Output,
    payload: &StatusPayload,
) -> Option<SensorState> {
    let Some(configs) = payload.output_configs() else {
        // Without an oconf section only variables fall back to their intensity
        if descriptor.kind == SensorKind::Variable {
            return output.intensity.clone().map(SensorState::Raw);
        }
        return None;
    };

    let config = configs.iter().find(|config| config.did == descriptor.did)?;
    if !config.is_advanced() {
        return Some(SensorState::Text(NOT_ADVANCED.to_owned()));
    }
    parse_program(config.prog.as_deref().unwrap_or_default()).map(SensorState::from)
}

fn display_field(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> StatusPayload {
        serde_json::from_value(value).unwrap()
    }

    fn feed_sensor() -> SensorDescriptor {
        SensorDescriptor::new("feed_mode_remaining", "feed", SensorKind::Feed)
    }

    #[test]
    fn test_feed_modern_minutes() {
        let data = payload(json!({"feed": {"name": 0, "active": 120}}));
        let state = resolve_state(&feed_sensor(), &data).unwrap();
        assert_eq!(state, SensorState::Float(2.0));
        assert_eq!(state.to_string(), "2.0");

        let data = payload(json!({"feed": {"active": 95, "apex_type": "new"}}));
        assert_eq!(resolve_state(&feed_sensor(), &data), Some(SensorState::Float(1.6)));
    }

    #[test]
    fn test_feed_minutes_round_half_to_even() {
        for (active, minutes) in [(15, 0.2), (75, 1.2), (135, 2.2), (45, 0.8)] {
            let data = payload(json!({"feed": {"active": active}}));
            assert_eq!(
                resolve_state(&feed_sensor(), &data),
                Some(SensorState::Float(minutes)),
                "active = {active}"
            );
        }
    }

    #[test]
    fn test_feed_active_as_string() {
        let data = payload(json!({"feed": {"active": "120"}}));
        assert_eq!(resolve_state(&feed_sensor(), &data), Some(SensorState::Float(2.0)));

        let data = payload(json!({"feed": {"active": "soon"}}));
        assert_eq!(resolve_state(&feed_sensor(), &data), Some(SensorState::Integer(0)));
    }

    #[test]
    fn test_feed_modern_idle() {
        let data = payload(json!({"feed": {"name": 0, "active": 60000}}));
        assert_eq!(resolve_state(&feed_sensor(), &data), Some(SensorState::Integer(0)));
    }

    #[test]
    fn test_feed_missing() {
        assert_eq!(
            resolve_state(&feed_sensor(), &StatusPayload::default()),
            Some(SensorState::Integer(0))
        );
        let data = payload(json!({"feed": {"name": 3}}));
        assert_eq!(resolve_state(&feed_sensor(), &data), Some(SensorState::Integer(0)));
    }

    #[test]
    fn test_feed_classic() {
        let data = payload(json!({"feed": {"name": 6, "active": 250, "apex_type": "old"}}));
        assert_eq!(resolve_state(&feed_sensor(), &data), Some(SensorState::Integer(0)));

        let data = payload(json!({"feed": {"name": 1, "active": 90, "apex_type": "old"}}));
        let state = resolve_state(&feed_sensor(), &data).unwrap();
        assert_eq!(state.to_string(), "1:30");

        let data = payload(json!({"feed": {"name": 2, "active": 65, "apex_type": "old"}}));
        assert_eq!(resolve_state(&feed_sensor(), &data).unwrap().to_string(), "1:05");
    }

    #[test]
    fn test_feed_classic_hours() {
        let data = payload(json!({"feed": {"name": 1, "active": 3725, "apex_type": "old"}}));
        assert_eq!(resolve_state(&feed_sensor(), &data).unwrap().to_string(), "1:02:05");

        // Exactly one hour is still shown in minutes
        let data = payload(json!({"feed": {"name": 1, "active": 3600, "apex_type": "old"}}));
        assert_eq!(resolve_state(&feed_sensor(), &data).unwrap().to_string(), "60:00");
    }

    #[test]
    fn test_input_value() {
        let data = payload(json!({
            "inputs": [{"did": "base_Temp", "value": 25.4, "type": "Temp"}],
            "outputs": [{"did": "base_Temp", "status": ["ON"]}]
        }));
        let sensor = SensorDescriptor::new("Tmp", "base_Temp", "Temp");
        let state = resolve_state(&sensor, &data).unwrap();
        assert_eq!(state, SensorState::Raw(json!(25.4)));
        assert_eq!(state.to_string(), "25.4");
    }

    #[test]
    fn test_output_status_positions() {
        let data = payload(json!({
            "outputs": [
                {"did": "5_1", "status": ["AON", "", "OK", "", 12.5]},
                {"did": "6_1", "status": ["AON", 80, "OK"]},
                {"did": "7_1", "status": ["Reef Crest", 60, "10s", "OK"]}
            ]
        }));
        let dos = SensorDescriptor::new("Dos", "5_1", "dos");
        let pump = SensorDescriptor::new("Pump", "6_1", "iotaPump|Sicce|Syncra");
        let vortech = SensorDescriptor::new("Vortech", "7_1", "vortech");

        assert_eq!(resolve_state(&dos, &data), Some(SensorState::Raw(json!(12.5))));
        assert_eq!(resolve_state(&pump, &data), Some(SensorState::Raw(json!(80))));
        assert_eq!(
            resolve_state(&vortech, &data),
            Some(SensorState::Text("Reef Crest 60 10s".to_owned()))
        );
    }

    #[test]
    fn test_short_status_is_none() {
        let data = payload(json!({"outputs": [{"did": "5_1", "status": ["AON"]}]}));
        let dos = SensorDescriptor::new("Dos", "5_1", "dos");
        let vortech = SensorDescriptor::new("Vortech", "5_1", "vortech");
        assert_eq!(resolve_state(&dos, &data), None);
        assert_eq!(resolve_state(&vortech, &data), None);
    }

    #[test]
    fn test_variable_advanced_program() {
        let data = payload(json!({
            "outputs": [{"did": "Cntl_A1", "status": ["ON"]}],
            "config": {"oconf": [
                {"did": "Cntl_A1", "ctype": "Advanced", "prog": "Set Pump to 75%"}
            ]}
        }));
        let sensor = SensorDescriptor::new("Var_1", "Cntl_A1", "variable");
        assert_eq!(resolve_state(&sensor, &data), Some(SensorState::Integer(75)));
    }

    #[test]
    fn test_virtual_not_advanced() {
        let data = payload(json!({
            "outputs": [{"did": "Cntl_A2", "status": ["OFF"]}],
            "config": {"oconf": [{"did": "Cntl_A2", "ctype": "Off", "prog": ""}]}
        }));
        let sensor = SensorDescriptor::new("Virt", "Cntl_A2", "virtual");
        assert_eq!(
            resolve_state(&sensor, &data),
            Some(SensorState::Text(NOT_ADVANCED.to_owned()))
        );
    }

    #[test]
    fn test_variable_without_oconf_uses_intensity() {
        let data = payload(json!({
            "outputs": [{"did": "Cntl_A1", "status": ["ON"], "intensity": 42}],
            "config": {"iconf": []}
        }));
        let variable = SensorDescriptor::new("Var", "Cntl_A1", "variable");
        let virtual_output = SensorDescriptor::new("Virt", "Cntl_A1", "virtual");
        assert_eq!(resolve_state(&variable, &data), Some(SensorState::Raw(json!(42))));
        assert_eq!(resolve_state(&virtual_output, &data), None);
    }

    #[test]
    fn test_oconf_without_match() {
        let data = payload(json!({
            "outputs": [{"did": "Cntl_A1", "status": ["ON"], "intensity": 42}],
            "config": {"oconf": [{"did": "other", "ctype": "Advanced", "prog": "Set X 1"}]}
        }));
        let variable = SensorDescriptor::new("Var", "Cntl_A1", "variable");
        assert_eq!(resolve_state(&variable, &data), None);
    }

    #[test]
    fn test_unmatched_did() {
        let data = payload(json!({"inputs": [{"did": "a", "value": 1}]}));
        let sensor = SensorDescriptor::new("Missing", "zzz", "pH");
        assert_eq!(resolve_state(&sensor, &data), None);
        assert_eq!(resolve_attributes(&sensor, &data), None);
    }

    #[test]
    fn test_unsupported_output_type() {
        let data = payload(json!({"outputs": [{"did": "2_1", "status": ["AON", 1]}]}));
        let sensor = SensorDescriptor::new("Outlet", "2_1", "outlet");
        assert_eq!(resolve_state(&sensor, &data), None);
        assert_eq!(resolve_attributes(&sensor, &data), None);
    }

    #[test]
    fn test_attributes_prefer_oconf_record() {
        let data = payload(json!({
            "outputs": [{"did": "Cntl_A1", "status": ["ON"]}],
            "config": {"oconf": [{"did": "Cntl_A1", "ctype": "Advanced", "prog": "Set 5"}]}
        }));
        let sensor = SensorDescriptor::new("Var", "Cntl_A1", "variable");
        let attributes = resolve_attributes(&sensor, &data).unwrap();
        assert_eq!(attributes["ctype"], json!("Advanced"));

        let data = payload(json!({"outputs": [{"did": "Cntl_A1", "status": ["ON"]}]}));
        let attributes = resolve_attributes(&sensor, &data).unwrap();
        assert_eq!(attributes["status"], json!(["ON"]));
    }

    #[test]
    fn test_attributes_full_record() {
        let data = payload(json!({
            "inputs": [{"did": "base_pH", "value": 8.1, "type": "pH", "name": "pH"}],
            "outputs": [
                {"did": "5_1", "status": ["AON", "", "OK", "", 3], "name": "Dos"},
                {"did": "6_1", "status": ["AON", 80, "OK"], "name": "Return"},
                {"did": "7_1", "status": ["Pulse", 55, "2s", "OK"], "name": "MP40"}
            ]
        }));
        let ph = SensorDescriptor::new("pH", "base_pH", "pH");
        let dos = SensorDescriptor::new("Dos", "5_1", "dos");
        let pump = SensorDescriptor::new("Return", "6_1", "iotaPump|Sicce|Syncra");
        let vortech = SensorDescriptor::new("MP40", "7_1", "vortech");
        assert_eq!(
            resolve_attributes(&ph, &data),
            Some(json!({"did": "base_pH", "value": 8.1, "type": "pH", "name": "pH"}))
        );
        assert_eq!(resolve_attributes(&dos, &data).unwrap()["name"], json!("Dos"));
        assert_eq!(
            resolve_attributes(&pump, &data),
            Some(json!({"did": "6_1", "status": ["AON", 80, "OK"], "name": "Return"}))
        );
        assert_eq!(
            resolve_attributes(&vortech, &data),
            Some(json!({"did": "7_1", "status": ["Pulse", 55, "2s", "OK"], "name": "MP40"}))
        );
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SensorState::Float(1.5).to_string(), "1.5");
        assert_eq!(SensorState::Integer(0).to_string(), "0");
        assert_eq!(SensorState::Raw(json!("AON")).to_string(), "AON");
        assert_eq!(SensorState::Raw(json!(true)).to_string(), "true");
    }
}
