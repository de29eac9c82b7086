//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
///
/// Computes `(value - a) / (b - a) * (d - c) + c` where `source_range = (a, b)` and
/// `target_range = (c, d)`. The target range may be given high-to-low to invert the mapping.
/// The value is not clamped to the source range.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Clamp a value into the inclusive range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: PartialOrd
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        // Forward
        assert_eq!(lin_map((-1.0, 1.0), (230.0, 600.0), -1.0), 230.0);
        assert_eq!(lin_map((-1.0, 1.0), (230.0, 600.0), 1.0), 600.0);
        assert_eq!(lin_map((-1.0, 1.0), (230.0, 600.0), 0.0), 415.0);

        // Inverted target
        assert_eq!(lin_map((-1.0, 1.0), (540.0, 210.0), -1.0), 540.0);
        assert_eq!(lin_map((-1.0, 1.0), (540.0, 210.0), 1.0), 210.0);
        assert_eq!(lin_map((-1.0, 1.0), (540.0, 210.0), 0.0), 375.0);

        // Not clamped
        assert_eq!(lin_map((0.0f32, 1.0), (0.0, 10.0), 2.0), 20.0);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(470, 460, 510), 470);
        assert_eq!(clamp(400, 460, 510), 460);
        assert_eq!(clamp(513, 460, 510), 510);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }
}
