//! Angle helpers shared by joint followers and drivers

/// Clamp `value` into `[lower, upper]` when that is a real range.
///
/// A range with `lower >= upper` means "unlimited" and leaves the value
/// untouched, matching the articulation engine's convention.
pub fn clamp_to_limits(value: f32, lower: f32, upper: f32) -> f32 {
    if lower < upper {
        value.clamp(lower, upper)
    } else {
        value
    }
}

/// Whether `[lower, upper]` describes an actual limit
pub fn is_limited(lower: f32, upper: f32) -> bool {
    lower < upper
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside_range() {
        assert_eq!(clamp_to_limits(0.5, -1.0, 1.0), 0.5);
        assert_eq!(clamp_to_limits(2.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp_to_limits(-3.0, -1.0, 1.0), -1.0);
    }

    #[test]
    fn test_unlimited_range_passes_through() {
        assert_eq!(clamp_to_limits(7.0, 0.0, 0.0), 7.0);
        assert_eq!(clamp_to_limits(-7.0, 1.0, -1.0), -7.0);
        assert!(!is_limited(1.0, 1.0));
    }
}
