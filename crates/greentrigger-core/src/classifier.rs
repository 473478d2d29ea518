//! Measurement classification.

/// Green-energy share, in percent, above which a measurement is notable.
pub const GREEN_THRESHOLD_PERCENT: f64 = 30.0;

/// Classify a measurement against [`GREEN_THRESHOLD_PERCENT`].
///
/// The comparison is strict: a measurement equal to the threshold is not
/// notable. NaN is never notable.
pub fn classify(measurement: f64) -> bool {
    measurement > GREEN_THRESHOLD_PERCENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        assert!(!classify(30.0));
        assert!(classify(30.01));
    }

    #[test]
    fn extremes() {
        assert!(!classify(0.0));
        assert!(classify(100.0));
        assert!(!classify(f64::NAN));
    }
}
