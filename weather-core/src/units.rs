//! Unit conversions from the API's native units to the displayed ones.

const KELVIN_OFFSET: f64 = 273.15;
const MPS_TO_KMH: f64 = 3.6;

/// Round to one decimal place, half away from zero.
///
/// Rounds the scaled f64 product, so a value stored just below `x.x5`
/// (e.g. `0.15`) still rounds up.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    round1(kelvin - KELVIN_OFFSET)
}

pub fn mps_to_kmh(mps: f64) -> f64 {
    round1(mps * MPS_TO_KMH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_to_celsius_rounds_to_one_decimal() {
        assert_eq!(format!("{:.1}", kelvin_to_celsius(293.15)), "20.0");
        assert_eq!(kelvin_to_celsius(273.15), 0.0);
        assert_eq!(kelvin_to_celsius(280.32), 7.2);
        assert_eq!(kelvin_to_celsius(263.15), -10.0);
    }

    #[test]
    fn mps_to_kmh_rounds_to_one_decimal() {
        assert_eq!(mps_to_kmh(4.1), 14.8);
        assert_eq!(mps_to_kmh(0.0), 0.0);
        assert_eq!(mps_to_kmh(10.0), 36.0);
    }

    #[test]
    fn round1_goes_half_away_from_zero() {
        assert_eq!(round1(0.25), 0.3);
        assert_eq!(round1(-0.25), -0.3);
        assert_eq!(round1(1.04), 1.0);
    }

    #[test]
    fn round1_rounds_the_scaled_product() {
        // 0.15 is stored as 0.1499..., but 0.15 * 10.0 is exactly 1.5.
        assert_eq!(round1(0.15), 0.2);
        assert_eq!(format!("{:.1}", round1(0.15)), "0.2");
    }
}
