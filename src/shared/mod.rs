//! Shared utilities for sensehat-voice

/// Round to one decimal place, the precision spoken for temperature and pressure
pub fn round_tenths(value: f64) -> f64 {
    // adding 0.0 turns a rounded -0.0 into 0.0
    (value * 10.0).round() / 10.0 + 0.0
}

/// Truncate a relative humidity to whole percent
pub fn truncate_percent(value: f64) -> i64 {
    value.trunc() as i64
}

/// Format a value that was already rounded to one decimal
pub fn format_tenths(value: f64) -> String {
    format!("{:.1}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_tenths() {
        assert_eq!(round_tenths(1013.26), 1013.3);
        assert_eq!(round_tenths(21.04), 21.0);
        assert_eq!(round_tenths(-3.56), -3.6);
    }

    #[test]
    fn test_round_tenths_negative_zero() {
        assert_eq!(format_tenths(round_tenths(-0.04)), "0.0");
    }

    #[test]
    fn test_truncate_percent() {
        assert_eq!(truncate_percent(47.8), 47);
        assert_eq!(truncate_percent(47.0), 47);
        assert_eq!(truncate_percent(0.9), 0);
    }

    #[test]
    fn test_format_tenths() {
        assert_eq!(format_tenths(0.0), "0.0");
        assert_eq!(format_tenths(1013.3), "1013.3");
        assert_eq!(format_tenths(22.0), "22.0");
    }
}
