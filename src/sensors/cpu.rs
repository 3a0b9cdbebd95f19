//! CPU temperature sources - vcgencmd on Raspberry Pi OS, sysinfo elsewhere

use std::process::Command;

use super::CpuThermometer;
use crate::error::{hardware, Result};

/// Parse `vcgencmd measure_temp` output such as `temp=48.3'C`
pub fn parse_measure_temp(output: &str) -> Result<f64> {
    let value = output
        .trim()
        .strip_prefix("temp=")
        .and_then(|rest| rest.strip_suffix("'C"))
        .ok_or_else(|| hardware(format!("Unexpected vcgencmd output: {:?}", output.trim())))?;

    value
        .parse::<f64>()
        .map_err(|e| hardware(format!("Invalid CPU temperature {:?}: {}", value, e)))
}

/// Reads the SoC temperature through the VideoCore `vcgencmd` tool
#[derive(Debug, Clone)]
pub struct Vcgencmd {
    program: String,
}

impl Default for Vcgencmd {
    fn default() -> Self {
        Self {
            program: "vcgencmd".to_string(),
        }
    }
}

impl CpuThermometer for Vcgencmd {
    fn cpu_temperature(&self) -> Result<f64> {
        let output = Command::new(&self.program)
            .arg("measure_temp")
            .output()
            .map_err(|e| hardware(format!("Failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(hardware(format!(
                "{} measure_temp failed: {}",
                self.program,
                stderr.trim()
            )));
        }

        parse_measure_temp(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Reads the CPU temperature from the kernel's thermal components
#[cfg(feature = "cpu-fallback")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoThermometer;

#[cfg(feature = "cpu-fallback")]
impl CpuThermometer for SysinfoThermometer {
    fn cpu_temperature(&self) -> Result<f64> {
        let components = sysinfo::Components::new_with_refreshed_list();

        let readings: Vec<(String, f32)> = components
            .iter()
            .filter_map(|c| c.temperature().map(|t| (c.label().to_string(), t)))
            .collect();

        pick_cpu_reading(&readings)
            .map(|t| t as f64)
            .ok_or_else(|| hardware("No CPU temperature sensor found"))
    }
}

/// Prefer a component labelled like the CPU, else take the first reading
#[cfg_attr(not(feature = "cpu-fallback"), allow(dead_code))]
fn pick_cpu_reading(readings: &[(String, f32)]) -> Option<f32> {
    readings
        .iter()
        .find(|(label, _)| {
            let label = label.to_lowercase();
            ["cpu", "soc", "package"].iter().any(|k| label.contains(k))
        })
        .or_else(|| readings.first())
        .map(|(_, t)| *t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_measure_temp() {
        assert_eq!(parse_measure_temp("temp=48.3'C\n").unwrap(), 48.3);
        assert_eq!(parse_measure_temp("temp=55.0'C").unwrap(), 55.0);
    }

    #[test]
    fn test_parse_measure_temp_rejects_garbage() {
        assert!(matches!(
            parse_measure_temp("error=1 error_msg=\"Command not registered\""),
            Err(Error::HardwareUnavailable(_))
        ));
        assert!(matches!(
            parse_measure_temp("temp=hot'C"),
            Err(Error::HardwareUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_program_is_hardware_unavailable() {
        let cmd = Vcgencmd {
            program: "definitely-not-vcgencmd-on-this-host".to_string(),
        };
        assert!(matches!(
            cmd.cpu_temperature(),
            Err(Error::HardwareUnavailable(_))
        ));
    }

    #[test]
    fn test_pick_cpu_reading() {
        let readings = vec![
            ("nvme Composite".to_string(), 38.0),
            ("cpu_thermal temp1".to_string(), 51.5),
        ];
        assert_eq!(pick_cpu_reading(&readings), Some(51.5));

        let readings = vec![("acpitz temp1".to_string(), 27.8)];
        assert_eq!(pick_cpu_reading(&readings), Some(27.8));

        assert_eq!(pick_cpu_reading(&[]), None);
    }
}
