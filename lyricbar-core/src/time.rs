//! Time and duration conversion utilities.
//!
//! Conversions saturate instead of truncating so the clippy cast lints stay
//! satisfied without scattering `as` casts through the crate.

use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    fn as_millis_u64(&self) -> u64;

    /// Convert duration to seconds as u32, saturating at `u32::MAX`.
    ///
    /// `u32::MAX` seconds is approximately 136 years, far beyond any track.
    fn as_secs_u32(&self) -> u32;

    /// Share of `total` this duration represents, in whole percent (0-100).
    ///
    /// Returns 0 when `total` is zero (unknown track length).
    fn percent_of(&self, total: Duration) -> u8;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_secs_u32(&self) -> u32 {
        u32::try_from(self.as_secs()).unwrap_or(u32::MAX)
    }

    fn percent_of(&self, total: Duration) -> u8 {
        let total = total.as_millis();
        if total == 0 {
            return 0;
        }
        let percent = (self.as_millis().saturating_mul(100) / total).min(100);
        u8::try_from(percent).unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_millis_u64() {
        let duration = Duration::from_millis(1234);
        assert_eq!(duration.as_millis_u64(), 1234);
    }

    #[test]
    fn test_as_millis_u64_zero() {
        assert_eq!(Duration::ZERO.as_millis_u64(), 0);
    }

    #[test]
    fn test_as_secs_u32() {
        let duration = Duration::from_secs(300);
        assert_eq!(duration.as_secs_u32(), 300);
    }

    #[test]
    fn test_as_secs_u32_large() {
        // Duration larger than u32::MAX seconds
        let duration = Duration::from_secs(u64::from(u32::MAX) + 1);
        assert_eq!(duration.as_secs_u32(), u32::MAX);
    }

    #[test]
    fn test_percent_of() {
        let total = Duration::from_secs(200);
        assert_eq!(Duration::ZERO.percent_of(total), 0);
        assert_eq!(Duration::from_secs(50).percent_of(total), 25);
        assert_eq!(Duration::from_secs(199).percent_of(total), 99);
        assert_eq!(Duration::from_secs(200).percent_of(total), 100);
    }

    #[test]
    fn test_percent_of_clamped() {
        let total = Duration::from_secs(100);
        assert_eq!(Duration::from_secs(150).percent_of(total), 100);
        assert_eq!(Duration::from_secs(10).percent_of(Duration::ZERO), 0);
    }
}
