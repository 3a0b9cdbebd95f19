//! Configuration module, resolved once at startup
//!
//! Defaults, then ~/.config/sensehat-voice/config.toml, then the DISPLAY,
//! ROTATE and DEBUG environment variables. CLI flags are applied last by main.

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::skill::templates::Templates;

/// LED matrix orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Anything but 0/90/180/270 falls back to 0
    pub fn from_degrees(degrees: u16) -> Self {
        match degrees {
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            270 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Parse the ROTATE variable; only the exact strings "0", "90", "180"
    /// and "270" are accepted, anything else is 0
    pub fn parse(value: &str) -> Self {
        match value {
            "90" => Rotation::Deg90,
            "180" => Rotation::Deg180,
            "270" => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }
}

/// Whatever the config file holds for `rotation`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRotation {
    Degrees(i64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for Rotation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rotation = match RawRotation::deserialize(deserializer)? {
            RawRotation::Degrees(degrees) => u16::try_from(degrees)
                .map(Rotation::from_degrees)
                .unwrap_or_default(),
            RawRotation::Text(text) => Rotation::parse(&text),
            RawRotation::Other(_) => Rotation::Deg0,
        };
        Ok(rotation)
    }
}

/// Which board implementation backs the sensors and display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoardKind {
    #[default]
    SenseHat,
    Simulated,
}

/// Where the CPU temperature comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpuSensor {
    #[default]
    Vcgencmd,
    Sysinfo,
}

/// Readings reported by the simulated board
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatedSettings {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub cpu_temperature: f64,
}

impl Default for SimulatedSettings {
    fn default() -> Self {
        Self {
            temperature: 30.5,
            humidity: 41.7,
            pressure: 1013.25,
            cpu_temperature: 47.0,
        }
    }
}

/// Process-wide configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Mirror answers on the LED matrix
    pub display: bool,
    pub rotation: Rotation,
    pub debug: bool,
    pub board: BoardKind,
    pub cpu_sensor: CpuSensor,
    /// Pending display jobs kept before the oldest is dropped
    pub display_queue: usize,
    /// Milliseconds per scrolled column
    pub scroll_ms: u64,
    pub simulated: SimulatedSettings,
    pub templates: Templates,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            display: true,
            rotation: Rotation::Deg0,
            debug: false,
            board: BoardKind::SenseHat,
            cpu_sensor: CpuSensor::Vcgencmd,
            display_queue: 4,
            scroll_ms: 100,
            simulated: SimulatedSettings::default(),
            templates: Templates::default(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sensehat-voice").join("config.toml"))
    }

    /// Load the config file (explicit path or default location) and apply the environment
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.templates.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(contents)?;
        config.display_queue = config.display_queue.max(1);
        Ok(config)
    }

    /// Apply DISPLAY, ROTATE and DEBUG from an environment lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(display) = lookup("DISPLAY") {
            self.display = display == "1";
        }
        if let Some(rotate) = lookup("ROTATE") {
            self.rotation = Rotation::parse(&rotate);
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = debug == "1";
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default log level when RUST_LOG is not set
    pub fn log_level(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
