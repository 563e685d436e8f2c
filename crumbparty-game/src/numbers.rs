//! Float and count conversions used by the frame-driven engines.

use num_traits::cast::cast;

/// Convert a count to f32 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f32(value: usize) -> f32 {
    cast::<usize, f32>(value).unwrap_or(0.0)
}

/// Round a f32 and clamp it to the u32 range, returning 0 for NaN or negative values.
#[must_use]
pub fn round_f32_to_u32(value: f32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    let clamped = f64::from(value).min(max).round();
    cast::<f64, u32>(clamped).unwrap_or(0)
}

/// Whole milliseconds contained in a duration expressed in seconds.
#[must_use]
pub fn secs_to_millis(seconds: f32) -> u32 {
    round_f32_to_u32(seconds * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f32_to_u32(1.6), 2);
        assert_eq!(round_f32_to_u32(f32::NAN), 0);
        assert_eq!(round_f32_to_u32(-3.0), 0);
        assert_eq!(round_f32_to_u32(f32::MAX), u32::MAX);
    }

    #[test]
    fn millis_round_to_nearest() {
        assert_eq!(secs_to_millis(1.2344), 1234);
        assert_eq!(secs_to_millis(0.0), 0);
        assert!((usize_to_f32(6) - 6.0).abs() < f32::EPSILON);
    }
}
