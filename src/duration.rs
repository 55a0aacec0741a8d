//! Note lengths and meter
//!
//! Durations are exact fractions of a whole note so that bar capacity checks
//! never depend on floating point tolerance. A quarter is `1/4`, a dotted
//! quarter `3/8`.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::MotionError;

/// A positive note length as a reduced fraction of a whole note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    num: u64,
    den: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration { num: 0, den: 1 };
    pub const WHOLE: Duration = Duration { num: 1, den: 1 };

    /// `num/den` of a whole note, or `None` if either part is zero.
    pub fn new(num: u64, den: u64) -> Option<Self> {
        if num == 0 || den == 0 {
            return None;
        }
        Some(Self::reduced(num, den))
    }

    /// The note value with the given denominator: `note(4)` is a quarter,
    /// `note(8)` an eighth.
    pub fn note(denominator: u64) -> Option<Self> {
        Self::new(1, denominator)
    }

    pub(crate) fn reduced(num: u64, den: u64) -> Self {
        let g = gcd(num, den).max(1);
        Self {
            num: num / g,
            den: den / g,
        }
    }

    pub fn numerator(&self) -> u64 {
        self.num
    }

    pub fn denominator(&self) -> u64 {
        self.den
    }

    /// Returns the duration as a fraction of a whole note
    pub fn as_fraction(&self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Returns duration in beats of the given meter.
    /// In 4/4 a quarter is 1 beat; in 6/8 a quarter is 2 beats.
    pub fn as_beats(&self, meter: &Meter) -> f64 {
        self.as_fraction() * meter.beat_type as f64
    }

    /// Exact sum, or `None` if the reduced result does not fit in `u64`.
    ///
    /// # Example
    /// ```
    /// use motion::Duration;
    ///
    /// let quarter = Duration::note(4).unwrap();
    /// assert_eq!(quarter.checked_add(quarter), Duration::note(2));
    /// assert!(Duration::note(4_294_967_291)
    ///     .unwrap()
    ///     .checked_add(Duration::note(4_294_967_279).unwrap())
    ///     .and_then(|d| d.checked_add(Duration::note(4_294_967_231).unwrap()))
    ///     .is_none());
    /// ```
    pub fn checked_add(self, other: Duration) -> Option<Duration> {
        let left = self.num as u128 * other.den as u128;
        let right = other.num as u128 * self.den as u128;
        let den = self.den as u128 * other.den as u128;
        reduce_wide(left.checked_add(right)?, den)
    }

    /// Exact difference, or `None` if `other` is longer or the result does
    /// not fit in `u64`.
    pub fn checked_sub(self, other: Duration) -> Option<Duration> {
        let left = self.num as u128 * other.den as u128;
        let right = other.num as u128 * self.den as u128;
        let den = self.den as u128 * other.den as u128;
        reduce_wide(left.checked_sub(right)?, den)
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.num as u128 * other.den as u128).cmp(&(other.num as u128 * self.den as u128))
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn reduce_wide(num: u128, den: u128) -> Option<Duration> {
    let (mut a, mut b) = (num, den);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    let g = a.max(1);
    Some(Duration {
        num: u64::try_from(num / g).ok()?,
        den: u64::try_from(den / g).ok()?,
    })
}

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meter {
    pub beats: u8,
    pub beat_type: u8,
}

impl Default for Meter {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl Meter {
    pub fn new(beats: u8, beat_type: u8) -> Result<Self, MotionError> {
        if beats == 0 || beat_type == 0 {
            return Err(MotionError::InvalidMeter(format!("{}/{}", beats, beat_type)));
        }
        Ok(Self { beats, beat_type })
    }

    /// Length of one beat: `1/beat_type` of a whole note
    pub fn beat_unit(&self) -> Duration {
        Duration::reduced(1, self.beat_type.max(1) as u64)
    }

    /// Total length a bar can hold: `beats/beat_type` of a whole note
    pub fn capacity(&self) -> Duration {
        Duration::reduced(self.beats as u64, self.beat_type.max(1) as u64)
    }
}

impl fmt::Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.beats, self.beat_type)
    }
}

impl FromStr for Meter {
    type Err = MotionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 2 {
            return Err(MotionError::InvalidMeter(s.to_string()));
        }

        let beats = parts[0]
            .trim()
            .parse()
            .map_err(|_| MotionError::InvalidMeter(format!("invalid beats in {}", s)))?;
        let beat_type = parts[1]
            .trim()
            .parse()
            .map_err(|_| MotionError::InvalidMeter(format!("invalid beat type in {}", s)))?;

        Meter::new(beats, beat_type)
    }
}
