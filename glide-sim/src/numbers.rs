//! Numeric conversion helpers centralizing lossy numeric casts.

use num_traits::cast::cast;

/// Convert a count to f64, accepting precision loss above 2^53 in one place.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(f64::MAX)
}

/// Floor a non-negative f64 into an index, returning 0 for NaN or negatives.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.floor()).unwrap_or(usize::MAX)
}

/// Ratio of two counts, 0.0 when the denominator is empty.
#[must_use]
pub fn fraction(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    usize_to_f64(numerator) / usize_to_f64(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_handles_nan_and_negatives() {
        assert_eq!(floor_f64_to_usize(f64::NAN), 0);
        assert_eq!(floor_f64_to_usize(-3.5), 0);
        assert_eq!(floor_f64_to_usize(2.9), 2);
    }

    #[test]
    fn fraction_of_empty_is_zero() {
        assert!(fraction(3, 0).abs() < f64::EPSILON);
        assert!((fraction(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
