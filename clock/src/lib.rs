//! # Clock
//!
//! Time primitives and clock sources for Marquee.
//!
//! ## Philosophy
//!
//! - **No ambient time**: nothing reads the wall clock implicitly; every
//!   timed component takes a [`Clock`]
//! - **Determinism enables thorough testing**: [`SimClock`] only advances
//!   when explicitly told to
//! - **Explicit units**: durations and instants are distinct types, never
//!   bare integers

use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};

/// A point in time
///
/// Unlike POSIX time (seconds since epoch), this is an opaque type.
/// Under a simulated clock, time is virtual; under the system clock it
/// maps to the host's monotonic time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instant {
    /// Nanoseconds since some arbitrary epoch
    nanos: u64,
}

impl Instant {
    /// Creates an instant from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// The zero instant (epoch of whichever clock produced it)
    pub const ZERO: Instant = Instant { nanos: 0 };

    /// Returns nanoseconds since epoch
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Returns the duration since another instant
    ///
    /// Saturates to zero if `earlier` is actually later.
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, duration: Duration) -> Self::Output {
        Instant::from_nanos(self.nanos + duration.as_nanos())
    }
}

impl Sub<Duration> for Instant {
    type Output = Instant;

    fn sub(self, duration: Duration) -> Self::Output {
        Instant::from_nanos(self.nanos.saturating_sub(duration.as_nanos()))
    }
}

/// A duration of time
///
/// Explicit and type-safe. Scripts express delays in fractional seconds;
/// those are converted here and never travel as floats afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    /// Nanoseconds
    nanos: u64,
}

impl Duration {
    /// The zero duration
    pub const ZERO: Duration = Duration { nanos: 0 };

    /// Creates a duration from nanoseconds
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Creates a duration from milliseconds
    pub const fn from_millis(millis: u64) -> Self {
        Self {
            nanos: millis * 1_000_000,
        }
    }

    /// Creates a duration from whole seconds
    pub const fn from_secs(secs: u64) -> Self {
        Self {
            nanos: secs * 1_000_000_000,
        }
    }

    /// Creates a duration from fractional seconds
    ///
    /// Negative and non-finite inputs clamp to zero. Used for tag
    /// durations like `0.25`.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Self {
            nanos: (secs * 1_000_000_000.0) as u64,
        }
    }

    /// Returns the duration in nanoseconds
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Returns the duration in milliseconds
    pub const fn as_millis(&self) -> u64 {
        self.nanos / 1_000_000
    }

    /// Returns the duration in whole seconds
    pub const fn as_secs(&self) -> u64 {
        self.nanos / 1_000_000_000
    }

    /// Returns true if this duration is zero
    pub const fn is_zero(&self) -> bool {
        self.nanos == 0
    }
}

impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Self::Output {
        Duration::from_nanos(self.nanos + other.nanos)
    }
}

impl Sub for Duration {
    type Output = Duration;

    fn sub(self, other: Duration) -> Self::Output {
        Duration::from_nanos(self.nanos.saturating_sub(other.nanos))
    }
}

/// A source of the current time
///
/// Timed services take a `&dyn Clock` (or poll an `Instant` handed to
/// them) instead of reading ambient time, so the same code path runs
/// under simulation and on a live host.
pub trait Clock {
    /// Returns the current instant
    fn now(&self) -> Instant;
}

/// Simulated clock with controllable time progression
///
/// Deterministic: only advances when explicitly instructed via
/// [`SimClock::advance`]. This makes timed tests predictable and
/// reproducible.
///
/// # Examples
///
/// ```
/// use clock::{Clock, Duration, SimClock};
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.now().as_nanos(), 0);
///
/// clock.advance(Duration::from_millis(40));
/// assert_eq!(clock.now().as_nanos(), 40_000_000);
/// ```
#[derive(Debug, Clone)]
pub struct SimClock {
    now: Instant,
}

impl SimClock {
    /// Creates a new simulated clock starting at the zero instant
    pub fn new() -> Self {
        Self { now: Instant::ZERO }
    }

    /// Creates a simulated clock starting at a specific instant
    pub fn starting_at(now: Instant) -> Self {
        Self { now }
    }

    /// Advances the clock by the given duration
    ///
    /// # Panics
    ///
    /// Panics if advancing would overflow u64 nanoseconds.
    pub fn advance(&mut self, delta: Duration) {
        let nanos = self
            .now
            .as_nanos()
            .checked_add(delta.as_nanos())
            .expect("Clock overflow");
        self.now = Instant::from_nanos(nanos);
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn now(&self) -> Instant {
        self.now
    }
}

/// Wall clock backed by the host's monotonic timer
///
/// Reports time elapsed since the clock was created. Used by the demo
/// binary; tests use [`SimClock`].
#[derive(Debug)]
pub struct SystemClock {
    origin: std::time::Instant,
}

impl SystemClock {
    /// Creates a system clock whose epoch is the moment of creation
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::from_nanos(self.origin.elapsed().as_nanos() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_creation() {
        let d1 = Duration::from_secs(1);
        let d2 = Duration::from_millis(1000);
        let d3 = Duration::from_nanos(1_000_000_000);

        assert_eq!(d1, d2);
        assert_eq!(d2, d3);
    }

    #[test]
    fn test_duration_from_fractional_seconds() {
        assert_eq!(Duration::from_secs_f64(0.25), Duration::from_millis(250));
        assert_eq!(Duration::from_secs_f64(1.0), Duration::from_secs(1));
        assert_eq!(Duration::from_secs_f64(6.0), Duration::from_secs(6));
    }

    #[test]
    fn test_duration_from_fractional_seconds_clamps() {
        assert_eq!(Duration::from_secs_f64(-1.0), Duration::ZERO);
        assert_eq!(Duration::from_secs_f64(f64::NAN), Duration::ZERO);
        assert_eq!(Duration::from_secs_f64(f64::INFINITY), Duration::ZERO);
    }

    #[test]
    fn test_duration_arithmetic() {
        let d1 = Duration::from_millis(500);
        let d2 = Duration::from_millis(300);

        assert_eq!(d1 + d2, Duration::from_millis(800));
        assert_eq!(d1 - d2, Duration::from_millis(200));
        assert_eq!(d2 - d1, Duration::ZERO);
    }

    #[test]
    fn test_instant_arithmetic() {
        let i = Instant::from_nanos(1000);
        let d = Duration::from_nanos(500);

        assert_eq!(i + d, Instant::from_nanos(1500));
        assert_eq!(i - d, Instant::from_nanos(500));
    }

    #[test]
    fn test_instant_duration_since() {
        let i1 = Instant::from_nanos(1000);
        let i2 = Instant::from_nanos(2000);
        assert_eq!(i2.duration_since(i1), Duration::from_nanos(1000));
        assert_eq!(i1.duration_since(i2), Duration::ZERO);
    }

    #[test]
    fn test_sim_clock_starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), Instant::ZERO);
    }

    #[test]
    fn test_sim_clock_advances_explicitly() {
        let mut clock = SimClock::new();
        clock.advance(Duration::from_millis(100));
        assert_eq!(clock.now(), Instant::from_nanos(100_000_000));
        clock.advance(Duration::from_millis(50));
        assert_eq!(clock.now(), Instant::from_nanos(150_000_000));
    }

    #[test]
    fn test_sim_clock_monotonic() {
        let mut clock = SimClock::new();
        let t1 = clock.now();
        clock.advance(Duration::from_nanos(10));
        let t2 = clock.now();
        assert!(t2 > t1);
    }

    #[test]
    fn test_sim_clock_deterministic_sequence() {
        let mut clock1 = SimClock::new();
        let mut clock2 = SimClock::new();

        for &delta in &[10u64, 20, 5, 100, 3] {
            clock1.advance(Duration::from_nanos(delta));
            clock2.advance(Duration::from_nanos(delta));
        }

        assert_eq!(clock1.now(), clock2.now());
        assert_eq!(clock1.now().as_nanos(), 10 + 20 + 5 + 100 + 3);
    }

    #[test]
    #[should_panic(expected = "Clock overflow")]
    fn test_sim_clock_overflow_panics() {
        let mut clock = SimClock::starting_at(Instant::from_nanos(u64::MAX));
        clock.advance(Duration::from_nanos(1));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        let t2 = clock.now();
        assert!(t2 >= t1);
    }
}
