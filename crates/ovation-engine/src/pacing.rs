//! Randomized pacing between sequential kudos.
//!
//! A fixed inter-action interval is a detectable signature. Each delay is
//! drawn fresh from a weighted mix of bands around the configured base
//! delay, so the cadence reads as a human clicking through a feed.

use std::time::Duration;

use rand::Rng;

/// One band of the delay distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingBand {
    /// Wandered off for a moment.
    LongPause,
    /// Paused to read an activity.
    ExtendedPause,
    /// Quick tap on an obvious one.
    QuickTap,
    /// Regular variation around the base delay.
    Regular,
}

impl PacingBand {
    /// Select a band from a single roll in `0..100`.
    ///
    /// Weights: 5% long pause, 10% extended pause, 25% quick tap,
    /// 60% regular. Mutually exclusive by construction.
    pub fn from_roll(roll: u32) -> Self {
        match roll {
            0..=4 => PacingBand::LongPause,
            5..=14 => PacingBand::ExtendedPause,
            15..=39 => PacingBand::QuickTap,
            _ => PacingBand::Regular,
        }
    }

    /// Multiplier range applied to the base delay for this band.
    pub fn factor_range(&self) -> (f64, f64) {
        match self {
            PacingBand::LongPause => (2.0, 4.0),
            PacingBand::ExtendedPause => (1.5, 2.5),
            PacingBand::QuickTap => (0.7, 0.9),
            PacingBand::Regular => (0.8, 1.2),
        }
    }
}

/// Draw the delay before the next action.
///
/// Pure function of the base delay and the RNG; evaluated once per action,
/// never cached. Always returns at least one millisecond.
pub fn next_delay<R: Rng + ?Sized>(base_ms: u64, rng: &mut R) -> Duration {
    let band = PacingBand::from_roll(rng.random_range(0..100));
    let (lo, hi) = band.factor_range();
    let factor = rng.random_range(lo..hi);
    let millis = ((base_ms as f64) * factor).round() as u64;
    Duration::from_millis(millis.max(1))
}
