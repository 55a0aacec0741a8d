//! # Bars and Tracks
//!
//! A [`Bar`] holds notes up to the capacity of its meter; a [`Track`] is the
//! ordered list of bars handed to a player.
//!
//! ## Packing
//! [`pack`] is strict first-fit: each note goes into the last bar if it fits,
//! otherwise into a fresh bar. Notes are never reordered or split across
//! bars, and a note longer than an empty bar is reported as
//! [`MotionError::CapacityOverflow`] instead of opening bars forever.
//!
//! ```text
//! 4/4, notes: 3/8 1/8 3/8 1/8 3/8
//!   | 3/8 1/8 3/8 1/8 | 3/8 ... |
//! ```

use serde::Serialize;
use tracing::{debug, trace};

use crate::duration::{Duration, Meter};
use crate::error::MotionError;
use crate::pitch::Pitch;

/// A single sounding note
///
/// `midi` is the sounding MIDI number when the pitch has one. Notes built by a
/// motion take it from their context, so it keeps rising across the context's
/// octave boundary even where the label's octave does not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub pitch: Pitch,
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub midi: Option<u8>,
}

impl Note {
    /// A note whose MIDI number is read straight off the label.
    pub fn new(pitch: Pitch, duration: Duration) -> Self {
        let midi = pitch.midi_note().ok();
        Self {
            pitch,
            duration,
            midi,
        }
    }

    pub fn with_midi(self, midi: Option<u8>) -> Self {
        Self { midi, ..self }
    }
}

/// A single measure under a fixed meter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    meter: Meter,
    notes: Vec<Note>,
    #[serde(skip)]
    used: Duration,
    #[serde(skip)]
    remaining: Duration,
}

impl Bar {
    pub fn new(meter: Meter) -> Self {
        Self {
            meter,
            notes: Vec::new(),
            used: Duration::ZERO,
            remaining: meter.capacity(),
        }
    }

    pub fn meter(&self) -> Meter {
        self.meter
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Total length of the notes placed so far
    pub fn used(&self) -> Duration {
        self.used
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_full(&self) -> bool {
        self.remaining == Duration::ZERO
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn fits(&self, duration: Duration) -> bool {
        duration <= self.remaining
    }

    /// Append `note` if it fits in the remaining capacity.
    ///
    /// Returns `Ok(false)`, leaving the bar untouched, when it does not fit.
    ///
    /// # Errors
    /// [`MotionError::DurationOverflow`] if the new total has no exact `u64`
    /// fraction.
    pub fn place(&mut self, note: Note) -> Result<bool, MotionError> {
        if !self.fits(note.duration) {
            return Ok(false);
        }
        self.push(note)?;
        Ok(true)
    }

    /// Append a note already known to fit.
    fn push(&mut self, note: Note) -> Result<(), MotionError> {
        let overflow = || MotionError::DurationOverflow {
            duration: note.duration.to_string(),
            total: self.used.to_string(),
        };
        let used = self.used.checked_add(note.duration).ok_or_else(overflow)?;
        let remaining = self.remaining.checked_sub(note.duration).ok_or_else(overflow)?;
        self.used = used;
        self.remaining = remaining;
        self.notes.push(note);
        Ok(())
    }
}

/// Greedily pack `notes` into bars of `meter`, in order.
pub fn pack<I>(notes: I, meter: Meter) -> Result<Vec<Bar>, MotionError>
where
    I: IntoIterator<Item = Note>,
{
    let capacity = meter.capacity();
    let mut bars: Vec<Bar> = Vec::new();

    for note in notes {
        if note.duration > capacity {
            return Err(MotionError::CapacityOverflow {
                duration: note.duration.to_string(),
                capacity: capacity.to_string(),
            });
        }
        trace!(pitch = %note.pitch, duration = %note.duration, "placing note");

        match bars.last_mut() {
            Some(bar) if bar.fits(note.duration) => bar.push(note)?,
            _ => {
                debug!(bar = bars.len() + 1, %meter, "opening bar");
                let mut bar = Bar::new(meter);
                bar.push(note)?;
                bars.push(bar);
            }
        }
    }

    Ok(bars)
}

/// An ordered list of bars, the unit handed to a player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub meter: Meter,
    pub bars: Vec<Bar>,
}

impl Track {
    pub fn new(meter: Meter, bars: Vec<Bar>) -> Self {
        Self { meter, bars }
    }

    /// Metric length of the track: every bar counts in full, even the last
    /// partly filled one.
    pub fn total_beats(&self) -> u32 {
        self.bars.iter().map(|bar| bar.meter.beats as u32).sum()
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.bars.iter().flat_map(|bar| bar.notes.iter())
    }
}
