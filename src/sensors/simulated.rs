//! Simulated board for running the skill away from a Raspberry Pi

use super::{CpuThermometer, SenseBoard};
use crate::config::{Rotation, SimulatedSettings};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    settings: SimulatedSettings,
}

impl SimulatedBoard {
    pub fn new(settings: SimulatedSettings) -> Self {
        Self { settings }
    }

    pub fn thermometer(&self) -> FixedThermometer {
        FixedThermometer(self.settings.cpu_temperature)
    }
}

impl SenseBoard for SimulatedBoard {
    fn temperature_from_pressure(&self) -> Result<f64> {
        Ok(self.settings.temperature)
    }

    fn humidity(&self) -> Result<f64> {
        Ok(self.settings.humidity)
    }

    fn pressure(&self) -> Result<f64> {
        Ok(self.settings.pressure)
    }

    fn set_rotation(&self, rotation: Rotation) -> Result<()> {
        tracing::info!("[display] rotation {}°", rotation.degrees());
        Ok(())
    }

    fn clear_display(&self) -> Result<()> {
        tracing::info!("[display] clear");
        Ok(())
    }

    fn show_message(&self, text: &str) -> Result<()> {
        tracing::info!("[display] {}", text);
        Ok(())
    }
}

/// CPU thermometer that always reports the same value
#[derive(Debug, Clone, Copy)]
pub struct FixedThermometer(pub f64);

impl CpuThermometer for FixedThermometer {
    fn cpu_temperature(&self) -> Result<f64> {
        Ok(self.0)
    }
}
