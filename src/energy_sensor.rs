use crate::coordinator::Coordinator;
use crate::metadata_resolver::{DeviceClass, StateClass};
use crate::sensor_descriptor::SensorDescriptor;
use crate::value_resolver::{round_to, SensorState};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::time::Instant;

pub const ENERGY_UNIT: &str = "kWh";
pub const ENERGY_ICON: &str = "mdi:lightning-bolt";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccumulatorState {
    /// No sample yet, nothing to integrate over.
    Uninitialized,
    Accumulating {
        last_power_w: f64,
        last_sample: Instant,
    },
}

/// Integrates power samples into an energy total (left Riemann sum).
///
/// The previous power reading is held constant over each elapsed interval.
/// The total only ever grows and lives as long as the process does.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyAccumulator {
    total_energy_kwh: f64,
    state: AccumulatorState,
}

impl EnergyAccumulator {
    pub fn new() -> Self {
        Self {
            total_energy_kwh: 0.0,
            state: AccumulatorState::Uninitialized,
        }
    }

    /// Records a power sample taken at `now`, returns the energy added in kWh.
    pub fn sample(&mut self, power_w: f64, now: Instant) -> f64 {
        let added_kwh = match self.state {
            AccumulatorState::Uninitialized => 0.0,
            AccumulatorState::Accumulating {
                last_power_w,
                last_sample,
            } => {
                let elapsed_hours =
                    now.saturating_duration_since(last_sample).as_secs_f64() / 3600.0;
                // Negative readings would make the total go backwards
                ((last_power_w / 1000.0) * elapsed_hours).max(0.0)
            }
        };

        self.total_energy_kwh += added_kwh;
        self.state = AccumulatorState::Accumulating {
            last_power_w: power_w,
            last_sample: now,
        };
        added_kwh
    }

    pub fn total_energy_kwh(&self) -> f64 {
        self.total_energy_kwh
    }

    /// Last observed power, 0 before the first sample.
    pub fn last_power_w(&self) -> f64 {
        match self.state {
            AccumulatorState::Uninitialized => 0.0,
            AccumulatorState::Accumulating { last_power_w, .. } => last_power_w,
        }
    }

    pub fn state(&self) -> AccumulatorState {
        self.state
    }
}

impl Default for EnergyAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Energy consumption derived from a `pwr` input.
#[derive(Debug, Clone)]
pub struct EnergySensor {
    descriptor: SensorDescriptor,
    coordinator: Coordinator,
    options: Arc<Map<String, Value>>,
    unique_id: String,
    accumulator: EnergyAccumulator,
}

impl EnergySensor {
    pub fn new(
        coordinator: Coordinator,
        descriptor: SensorDescriptor,
        options: Arc<Map<String, Value>>,
    ) -> Self {
        tracing::debug!("Creating energy sensor for: {descriptor:?}");
        let unique_id = format!("{}_energy", descriptor.entity_id());
        Self {
            descriptor,
            coordinator,
            options,
            unique_id,
            accumulator: EnergyAccumulator::new(),
        }
    }

    pub fn descriptor(&self) -> &SensorDescriptor {
        &self.descriptor
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn accumulator(&self) -> &EnergyAccumulator {
        &self.accumulator
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn name(&self) -> &str {
        &self.unique_id
    }

    /// Total energy in kWh, rounded to Wh.
    pub fn state(&self) -> SensorState {
        SensorState::Float(round_to(self.accumulator.total_energy_kwh(), 3))
    }

    pub fn unit_of_measurement(&self) -> &'static str {
        ENERGY_UNIT
    }

    pub fn device_class(&self) -> DeviceClass {
        DeviceClass::Energy
    }

    pub fn state_class(&self) -> StateClass {
        StateClass::TotalIncreasing
    }

    pub fn icon(&self) -> &'static str {
        ENERGY_ICON
    }

    pub fn extra_state_attributes(&self) -> Value {
        json!({
            "source_sensor": format!("sensor.{}", self.descriptor.entity_id()),
            "last_power_w": self.accumulator.last_power_w(),
        })
    }

    pub fn should_poll(&self) -> bool {
        true
    }

    /// Samples the paired power input now.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    /// Samples the paired power input as of `now`.
    ///
    /// A missing or non-numeric reading leaves the accumulator untouched.
    pub fn update_at(&mut self, now: Instant) {
        tracing::debug!("Update called for energy sensor: {}", self.descriptor.name);
        let payload = self.coordinator.data();
        let Some(power_w) = payload
            .input(&self.descriptor.did)
            .and_then(|input| input.numeric_value())
        else {
            tracing::warn!("Could not find power value for {}", self.descriptor.name);
            return;
        };

        let previous_power_w = self.accumulator.last_power_w();
        let added_kwh = self.accumulator.sample(power_w, now);
        tracing::debug!(
            "Energy update for {}: power={}W, added={:.6}kWh, total={:.3}kWh",
            self.descriptor.name,
            previous_power_w,
            added_kwh,
            self.accumulator.total_energy_kwh()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn power_payload(did: &str, watts: Value) -> crate::status_payload::StatusPayload {
        serde_json::from_value(json!({"inputs": [{"did": did, "value": watts}]})).unwrap()
    }

    fn power_sensor(coordinator: &Coordinator) -> EnergySensor {
        EnergySensor::new(
            coordinator.clone(),
            SensorDescriptor::new("Return_Pwr", "2_1_pwr", "pwr"),
            Arc::default(),
        )
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_first_sample_adds_nothing() {
        let mut accumulator = EnergyAccumulator::new();
        assert_eq!(accumulator.state(), AccumulatorState::Uninitialized);

        let added = accumulator.sample(100.0, Instant::now());
        assert_eq!(added, 0.0);
        assert_eq!(accumulator.total_energy_kwh(), 0.0);
        assert_eq!(accumulator.last_power_w(), 100.0);
    }

    #[test]
    fn test_left_riemann_sum() {
        let start = Instant::now();
        let mut accumulator = EnergyAccumulator::new();
        accumulator.sample(100.0, start);
        accumulator.sample(200.0, start + HOUR);
        assert!((accumulator.total_energy_kwh() - 0.1).abs() < 1e-12);
        assert_eq!(accumulator.last_power_w(), 200.0);

        // The 200W reading now covers the next half hour
        accumulator.sample(0.0, start + HOUR + HOUR / 2);
        assert!((accumulator.total_energy_kwh() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_total_never_decreases() {
        let start = Instant::now();
        let mut accumulator = EnergyAccumulator::new();
        let mut previous = 0.0;
        for (step, watts) in [50.0, -75.0, 0.0, 1200.0, 3.5, -1.0, 60.0].iter().enumerate() {
            accumulator.sample(*watts, start + Duration::from_secs(90 * step as u64));
            assert!(accumulator.total_energy_kwh() >= previous);
            previous = accumulator.total_energy_kwh();
        }
    }

    #[test]
    fn test_out_of_order_sample_adds_nothing() {
        let start = Instant::now();
        let mut accumulator = EnergyAccumulator::new();
        accumulator.sample(500.0, start + HOUR);
        let added = accumulator.sample(500.0, start);
        assert_eq!(added, 0.0);
        assert_eq!(accumulator.total_energy_kwh(), 0.0);
    }

    #[test]
    fn test_sensor_updates_from_payload() {
        let coordinator = Coordinator::new(power_payload("2_1_pwr", json!(100)));
        let mut sensor = power_sensor(&coordinator);
        let start = Instant::now();

        sensor.update_at(start);
        assert_eq!(sensor.accumulator().last_power_w(), 100.0);
        assert_eq!(sensor.state(), SensorState::Float(0.0));

        coordinator.refresh(power_payload("2_1_pwr", json!("200")));
        sensor.update_at(start + HOUR);
        assert_eq!(sensor.state(), SensorState::Float(0.1));
        assert_eq!(
            sensor.extra_state_attributes(),
            json!({"source_sensor": "sensor.apex_Return_Pwr", "last_power_w": 200.0})
        );
    }

    #[test]
    fn test_missing_reading_keeps_state() {
        let coordinator = Coordinator::new(power_payload("2_1_pwr", json!(100)));
        let mut sensor = power_sensor(&coordinator);
        let start = Instant::now();
        sensor.update_at(start);

        coordinator.refresh(power_payload("other", json!(100)));
        sensor.update_at(start + HOUR);
        assert_eq!(sensor.accumulator().total_energy_kwh(), 0.0);

        // The interval since the last good sample is integrated once data returns
        coordinator.refresh(power_payload("2_1_pwr", json!(100)));
        sensor.update_at(start + HOUR * 2);
        assert!((sensor.accumulator().total_energy_kwh() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_non_numeric_reading_is_skipped() {
        let coordinator = Coordinator::new(power_payload("2_1_pwr", json!("---")));
        let mut sensor = power_sensor(&coordinator);
        sensor.update_at(Instant::now());
        assert_eq!(sensor.accumulator().state(), AccumulatorState::Uninitialized);
    }

    #[test]
    fn test_energy_presentation() {
        let options = json!({"update_interval": 60}).as_object().cloned().unwrap();
        let sensor = EnergySensor::new(
            Coordinator::default(),
            SensorDescriptor::new("Return_Pwr", "2_1_pwr", "pwr"),
            Arc::new(options),
        );
        assert_eq!(sensor.unique_id(), "apex_Return_Pwr_energy");
        assert_eq!(sensor.options().get("update_interval"), Some(&json!(60)));
        assert_eq!(sensor.unit_of_measurement(), "kWh");
        assert_eq!(sensor.device_class(), DeviceClass::Energy);
        assert_eq!(sensor.state_class(), StateClass::TotalIncreasing);
        assert_eq!(sensor.icon(), "mdi:lightning-bolt");
        assert!(sensor.should_poll());
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_uses_runtime_clock() {
        let coordinator = Coordinator::new(power_payload("2_1_pwr", json!(2000)));
        let mut sensor = power_sensor(&coordinator);

        sensor.update();
        tokio::time::advance(Duration::from_secs(1800)).await;
        sensor.update();

        assert_eq!(sensor.state(), SensorState::Float(1.0));
    }
}
