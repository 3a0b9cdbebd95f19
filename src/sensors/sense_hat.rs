//! The physical Sense HAT: IIO sensors plus the LED matrix framebuffer

use std::path::Path;
use std::time::Duration;

use super::iio::IioSensors;
use super::SenseBoard;
use crate::actuators::led_matrix::LedMatrix;
use crate::config::Rotation;
use crate::error::{hardware, Result};

#[derive(Debug)]
pub struct SenseHat {
    sensors: IioSensors,
    matrix: Option<LedMatrix>,
}

impl SenseHat {
    pub fn new(sensors: IioSensors, matrix: Option<LedMatrix>) -> Self {
        Self { sensors, matrix }
    }

    /// Probe sysfs for the sensors and the framebuffer
    ///
    /// A missing framebuffer is tolerated; display calls then fail and are
    /// dropped by the display worker.
    pub fn discover(
        iio_root: &Path,
        graphics_root: &Path,
        dev_root: &Path,
        scroll: Duration,
    ) -> Result<Self> {
        let sensors = IioSensors::discover(iio_root)?;
        let matrix = match LedMatrix::discover(graphics_root, dev_root, scroll) {
            Ok(m) => {
                tracing::info!("LED matrix at {}", m.device().display());
                Some(m)
            }
            Err(e) => {
                tracing::warn!("LED matrix unavailable: {}", e);
                None
            }
        };
        Ok(Self::new(sensors, matrix))
    }

    fn matrix(&self) -> Result<&LedMatrix> {
        self.matrix
            .as_ref()
            .ok_or_else(|| hardware("LED matrix not present"))
    }
}

impl SenseBoard for SenseHat {
    fn temperature_from_pressure(&self) -> Result<f64> {
        self.sensors.temperature()
    }

    fn humidity(&self) -> Result<f64> {
        self.sensors.humidity()
    }

    fn pressure(&self) -> Result<f64> {
        self.sensors.pressure()
    }

    fn set_rotation(&self, rotation: Rotation) -> Result<()> {
        self.matrix()?.set_rotation(rotation);
        Ok(())
    }

    fn clear_display(&self) -> Result<()> {
        self.matrix()?.clear()
    }

    fn show_message(&self, text: &str) -> Result<()> {
        self.matrix()?.show_message(text)
    }
}
