//! Math utilities for coordinate transforms and tag value output

/// Round `value` to `places` decimal places (half away from zero)
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Floor an integer timestamp to a multiple of `step`
#[must_use]
pub fn floor_to(value: i64, step: i64) -> i64 {
    value - value.rem_euclid(step)
}

/// Sine of an angle given in degrees
#[must_use]
pub fn dsin(degrees: f64) -> f64 {
    degrees.to_radians().sin()
}

/// Cosine of an angle given in degrees
#[must_use]
pub fn dcos(degrees: f64) -> f64 {
    degrees.to_radians().cos()
}

/// Two-argument arctangent returning degrees
#[must_use]
pub fn datan2(y: f64, x: f64) -> f64 {
    y.atan2(x).to_degrees()
}

/// Clamp `value` into `[min, max]`
#[must_use]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Linear interpolation
#[must_use]
pub fn lerp(from: f64, to: f64, progress: f64) -> f64 {
    from + (to - from) * progress
}

/// Format a number the way override tags carry them
///
/// Rounds to `places` decimals and trims trailing zeros, so `10.0` becomes
/// `10` and `-0.001` at two places becomes `0`.
#[must_use]
pub fn format_number(value: f64, places: u32) -> String {
    let rounded = round_to(value, places);
    if rounded == 0.0 || !rounded.is_finite() {
        return String::from("0");
    }

    let mut text = format!("{rounded:.prec$}", prec = places as usize);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding() {
        assert_eq!(round_to(1.234_56, 2), 1.23);
        assert_eq!(round_to(1.235, 0), 1.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(floor_to(1234, 10), 1230);
        assert_eq!(floor_to(-5, 10), -10);
    }

    #[test]
    fn degree_trig() {
        assert!((dsin(90.0) - 1.0).abs() < 1e-12);
        assert!((dcos(180.0) + 1.0).abs() < 1e-12);
        assert!((datan2(1.0, 1.0) - 45.0).abs() < 1e-12);
        assert!((datan2(-1.0, 0.0) + 90.0).abs() < 1e-12);
    }

    #[test]
    fn clamping() {
        assert_eq!(clamp(5, 1, 3), 3);
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(10.0, 2), "10");
        assert_eq!(format_number(10.5, 2), "10.5");
        assert_eq!(format_number(-3.14159, 3), "-3.142");
        assert_eq!(format_number(-0.001, 2), "0");
        assert_eq!(format_number(100.0, 0), "100");
        assert_eq!(format_number(f64::NAN, 2), "0");
    }
}
