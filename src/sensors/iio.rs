//! Linux IIO sysfs access to the Sense HAT's LPS25H and HTS221 sensors

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{hardware, Result};

pub const IIO_ROOT: &str = "/sys/bus/iio/devices";

/// Pressure and temperature sensor
const PRESSURE_DEVICE: &str = "lps25h";
/// Humidity sensor
const HUMIDITY_DEVICE: &str = "hts221";

/// One IIO device directory (`iio:deviceN`)
#[derive(Debug, Clone)]
pub struct IioDevice {
    path: PathBuf,
}

impl IioDevice {
    /// Find the device whose `name` attribute matches under `root`
    pub fn find(root: &Path, name: &str) -> Result<Self> {
        let entries = fs::read_dir(root)
            .map_err(|e| hardware(format!("Cannot list {}: {}", root.display(), e)))?;

        for entry in entries.flatten() {
            let path = entry.path();
            match fs::read_to_string(path.join("name")) {
                Ok(found) if found.trim() == name => return Ok(Self { path }),
                _ => continue,
            }
        }

        Err(hardware(format!(
            "IIO device {} not found under {}",
            name,
            root.display()
        )))
    }

    fn attr(&self, attr: &str) -> Result<f64> {
        let path = self.path.join(attr);
        let raw = fs::read_to_string(&path)
            .map_err(|e| hardware(format!("Cannot read {}: {}", path.display(), e)))?;
        raw.trim()
            .parse::<f64>()
            .map_err(|e| hardware(format!("Invalid value in {}: {}", path.display(), e)))
    }

    fn attr_or(&self, attr: &str, default: f64) -> Result<f64> {
        if self.path.join(attr).exists() {
            self.attr(attr)
        } else {
            Ok(default)
        }
    }

    /// `(raw + offset) * scale` for a channel, per the IIO ABI
    pub fn processed(&self, channel: &str) -> Result<f64> {
        let raw = self.attr(&format!("in_{}_raw", channel))?;
        let offset = self.attr_or(&format!("in_{}_offset", channel), 0.0)?;
        let scale = self.attr_or(&format!("in_{}_scale", channel), 1.0)?;
        Ok((raw + offset) * scale)
    }
}

/// The two environment sensors of the board
#[derive(Debug, Clone)]
pub struct IioSensors {
    pressure: IioDevice,
    humidity: IioDevice,
}

impl IioSensors {
    pub fn discover(root: &Path) -> Result<Self> {
        Ok(Self {
            pressure: IioDevice::find(root, PRESSURE_DEVICE)?,
            humidity: IioDevice::find(root, HUMIDITY_DEVICE)?,
        })
    }

    /// Temperature (°C) from the pressure sensor; IIO reports milli-degrees
    pub fn temperature(&self) -> Result<f64> {
        Ok(self.pressure.processed("temp")? / 1000.0)
    }

    /// Relative humidity (%); IIO reports milli-percent
    pub fn humidity(&self) -> Result<f64> {
        Ok(self.humidity.processed("humidityrelative")? / 1000.0)
    }

    /// Pressure (hPa); IIO reports kilopascal
    pub fn pressure(&self) -> Result<f64> {
        Ok(self.pressure.processed("pressure")? * 10.0)
    }
}
