//! Sensors module - calibrated environment readings from the Sense HAT
//!
//! The board and the CPU thermometer are injected as trait objects so the
//! dispatcher never touches hardware directly.

pub mod cpu;
pub mod iio;
pub mod sense_hat;
pub mod simulated;

use std::sync::Arc;

use crate::config::Rotation;
use crate::error::Result;

/// Ambient temperature is pulled towards the CPU temperature by this factor
const CPU_HEAT_FACTOR: f64 = 1.5;

/// The sensor board: environment sensors plus the LED matrix
pub trait SenseBoard: Send + Sync {
    /// Ambient temperature (°C) from the pressure sensor
    fn temperature_from_pressure(&self) -> Result<f64>;
    /// Relative humidity (%)
    fn humidity(&self) -> Result<f64>;
    /// Pressure (hPa)
    fn pressure(&self) -> Result<f64>;
    fn set_rotation(&self, rotation: Rotation) -> Result<()>;
    fn clear_display(&self) -> Result<()>;
    /// Scroll a message across the display; blocks until it has finished
    fn show_message(&self, text: &str) -> Result<()>;
}

/// Source of the host CPU temperature (°C)
pub trait CpuThermometer: Send + Sync {
    fn cpu_temperature(&self) -> Result<f64>;
}

/// One fresh read of all three metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Correct an ambient reading for the heat of the nearby CPU
pub fn adjust_temperature(ambient: f64, cpu: f64) -> f64 {
    ambient - (cpu - ambient) / CPU_HEAT_FACTOR
}

/// Calibrated readings on top of a board and a CPU thermometer
#[derive(Clone)]
pub struct SensorReader {
    board: Arc<dyn SenseBoard>,
    cpu: Arc<dyn CpuThermometer>,
}

impl SensorReader {
    pub fn new(board: Arc<dyn SenseBoard>, cpu: Arc<dyn CpuThermometer>) -> Self {
        Self { board, cpu }
    }

    pub fn read_temperature(&self) -> Result<f64> {
        let cpu = self.cpu.cpu_temperature()?;
        let ambient = self.board.temperature_from_pressure()?;
        let adjusted = adjust_temperature(ambient, cpu);
        tracing::debug!(ambient, cpu, adjusted, "Read temperature");
        Ok(adjusted)
    }

    pub fn read_humidity(&self) -> Result<f64> {
        self.board.humidity()
    }

    pub fn read_pressure(&self) -> Result<f64> {
        self.board.pressure()
    }

    pub fn read_environment(&self) -> Result<EnvironmentReading> {
        Ok(EnvironmentReading {
            temperature: self.read_temperature()?,
            humidity: self.read_humidity()?,
            pressure: self.read_pressure()?,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted board and thermometer used across the crate's tests

    use super::*;
    use crate::error::hardware;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeBoard {
        pub ambient: f64,
        pub humidity: f64,
        pub pressure: f64,
        pub fail_reads: bool,
        pub fail_display: bool,
        pub reads: AtomicUsize,
        pub shown: Mutex<Vec<String>>,
        pub rotations: Mutex<Vec<Rotation>>,
        pub clears: AtomicUsize,
    }

    impl FakeBoard {
        pub fn new(ambient: f64, humidity: f64, pressure: f64) -> Self {
            Self {
                ambient,
                humidity,
                pressure,
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self {
                fail_reads: true,
                ..Default::default()
            }
        }

        pub fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        pub fn shown(&self) -> Vec<String> {
            self.shown.lock().unwrap().clone()
        }

        fn read(&self, value: f64) -> Result<f64> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                Err(hardware("sensor offline"))
            } else {
                Ok(value)
            }
        }
    }

    impl SenseBoard for FakeBoard {
        fn temperature_from_pressure(&self) -> Result<f64> {
            self.read(self.ambient)
        }

        fn humidity(&self) -> Result<f64> {
            self.read(self.humidity)
        }

        fn pressure(&self) -> Result<f64> {
            self.read(self.pressure)
        }

        fn set_rotation(&self, rotation: Rotation) -> Result<()> {
            self.rotations.lock().unwrap().push(rotation);
            Ok(())
        }

        fn clear_display(&self) -> Result<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn show_message(&self, text: &str) -> Result<()> {
            if self.fail_display {
                return Err(hardware("framebuffer gone"));
            }
            self.shown.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    pub struct FakeCpu {
        pub temperature: Option<f64>,
        pub reads: AtomicUsize,
    }

    impl FakeCpu {
        pub fn new(temperature: f64) -> Self {
            Self {
                temperature: Some(temperature),
                reads: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                temperature: None,
                reads: AtomicUsize::new(0),
            }
        }

        pub fn read_count(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl CpuThermometer for FakeCpu {
        fn cpu_temperature(&self) -> Result<f64> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.temperature
                .ok_or_else(|| hardware("vcgencmd not found"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{FakeBoard, FakeCpu};
    use super::*;
    use crate::error::Error;

    fn reader(board: FakeBoard, cpu: FakeCpu) -> SensorReader {
        SensorReader::new(Arc::new(board), Arc::new(cpu))
    }

    #[test]
    fn test_adjust_temperature() {
        assert_eq!(adjust_temperature(22.0, 55.0), 0.0);
        assert_eq!(adjust_temperature(30.0, 30.0), 30.0);
        assert_eq!(adjust_temperature(25.0, 40.0), 15.0);
    }

    #[test]
    fn test_read_temperature_applies_correction() {
        let reader = reader(FakeBoard::new(22.0, 47.8, 1013.26), FakeCpu::new(55.0));
        assert_eq!(reader.read_temperature().unwrap(), 0.0);
    }

    #[test]
    fn test_humidity_and_pressure_pass_through() {
        let reader = reader(FakeBoard::new(22.0, 47.8, 1013.26), FakeCpu::new(55.0));
        assert_eq!(reader.read_humidity().unwrap(), 47.8);
        assert_eq!(reader.read_pressure().unwrap(), 1013.26);
    }

    #[test]
    fn test_read_environment() {
        let reader = reader(FakeBoard::new(25.0, 40.2, 998.0), FakeCpu::new(40.0));
        let reading = reader.read_environment().unwrap();
        assert_eq!(
            reading,
            EnvironmentReading {
                temperature: 15.0,
                humidity: 40.2,
                pressure: 998.0,
            }
        );
    }

    #[test]
    fn test_cpu_failure_is_hardware_unavailable() {
        let reader = reader(FakeBoard::new(22.0, 47.8, 1013.26), FakeCpu::failing());
        assert!(matches!(
            reader.read_temperature(),
            Err(Error::HardwareUnavailable(_))
        ));
    }

    #[test]
    fn test_board_failure_is_hardware_unavailable() {
        let reader = reader(FakeBoard::failing(), FakeCpu::new(50.0));
        assert!(matches!(
            reader.read_environment(),
            Err(Error::HardwareUnavailable(_))
        ));
    }
}
