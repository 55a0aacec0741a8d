//! Rhythm policies
//!
//! A rhythm maps the position of a note within a motion to its length. Every
//! variant answers for any position, so a motion can be filled to any length
//! without running out of durations.

use serde::Serialize;

use crate::duration::{Duration, Meter};
use crate::error::MotionError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rhythm {
    /// Every note is one beat of the meter.
    Even(Meter),
    /// Long-short pairs: even positions get a dotted beat, odd positions half
    /// a beat.
    Swung(Meter),
    /// Cycles through a fixed list of durations.
    Pattern(Pattern),
}

/// A non-empty list of durations, repeated for as long as a motion needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Pattern {
    durations: Vec<Duration>,
}

impl Pattern {
    pub fn new(durations: Vec<Duration>) -> Result<Self, MotionError> {
        if durations.is_empty() {
            return Err(MotionError::InvalidRhythm(
                "a rhythm pattern needs at least one duration".to_string(),
            ));
        }
        Ok(Self { durations })
    }

    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    fn at(&self, index: usize) -> Duration {
        self.durations[index % self.durations.len()]
    }
}

impl Default for Rhythm {
    fn default() -> Self {
        Rhythm::Even(Meter::default())
    }
}

impl Rhythm {
    pub fn pattern(durations: Vec<Duration>) -> Result<Self, MotionError> {
        Pattern::new(durations).map(Rhythm::Pattern)
    }

    /// Duration of the note at position `index`.
    ///
    /// # Example
    /// ```
    /// use motion::{Duration, Meter, Rhythm};
    ///
    /// let swung = Rhythm::Swung(Meter::default());
    /// assert_eq!(swung.duration(0), Duration::new(3, 8).unwrap());
    /// assert_eq!(swung.duration(1), Duration::new(1, 8).unwrap());
    /// ```
    pub fn duration(&self, index: usize) -> Duration {
        match self {
            Rhythm::Even(meter) => meter.beat_unit(),
            Rhythm::Swung(meter) => {
                let half_beats = 2 * meter.beat_type.max(1) as u64;
                let parts = if index % 2 == 0 { 3 } else { 1 };
                Duration::reduced(parts, half_beats)
            }
            Rhythm::Pattern(pattern) => pattern.at(index),
        }
    }
}
