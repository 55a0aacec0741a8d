//! Pitch labels
//!
//! A [`Pitch`] is what a context hands back for an index: a note name plus an
//! octave, written `name-octave` (`C-5`, `Bb-3`, `C--1` for octave -1).
//! Names are opaque to contexts; only playback needs them to be spelled as
//! note letters so they can become MIDI numbers.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::MotionError;

/// Natural note letters in ascending order with their semitone offset from C
const LETTERS: [(char, i32); 7] = [
    ('C', 0),
    ('D', 2),
    ('E', 4),
    ('F', 5),
    ('G', 7),
    ('A', 9),
    ('B', 11),
];

/// A concrete pitch label produced by a musical context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pitch {
    pub name: String,
    pub octave: i32,
}

impl Pitch {
    pub fn new(name: impl Into<String>, octave: i32) -> Self {
        Self {
            name: name.into(),
            octave,
        }
    }

    /// Returns the MIDI note number (C-4 = 60).
    ///
    /// Only works for names spelled as a letter `A`..`G` followed by any
    /// number of `#` or `b`.
    ///
    /// # Example
    /// ```
    /// use motion::Pitch;
    ///
    /// assert_eq!(Pitch::new("C", 4).midi_note().unwrap(), 60);
    /// assert_eq!(Pitch::new("Bb", 3).midi_note().unwrap(), 58);
    /// assert!(Pitch::new("I", 4).midi_note().is_err());
    /// ```
    pub fn midi_note(&self) -> Result<u8, MotionError> {
        let pitch_class = pitch_class(&self.name)
            .ok_or_else(|| MotionError::InvalidPitch(format!("{} has no MIDI number", self)))?;
        midi_in_range((self.octave as i64 + 1) * 12 + pitch_class as i64, self)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.octave)
    }
}

impl FromStr for Pitch {
    type Err = MotionError;

    /// Parse a `name-octave` label. The first `-` separates the two halves,
    /// so `C--1` is C in octave -1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, octave) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| MotionError::InvalidPitch(format!("missing octave in {}", s)))?;
        if name.is_empty() {
            return Err(MotionError::InvalidPitch(format!("missing name in {}", s)));
        }
        let octave = octave
            .parse()
            .map_err(|_| MotionError::InvalidPitch(format!("invalid octave in {}", s)))?;
        Ok(Pitch::new(name, octave))
    }
}

/// Split a note name into its letter (index into `LETTERS`) and accidental
/// offset in semitones.
fn parse_note_name(name: &str) -> Option<(usize, i32)> {
    let mut chars = name.chars();
    let first = chars.next()?;
    let letter = LETTERS.iter().position(|(c, _)| *c == first)?;

    let mut accidental = 0;
    for c in chars {
        match c {
            '#' => accidental += 1,
            'b' => accidental -= 1,
            _ => return None,
        }
    }
    Some((letter, accidental))
}

/// Semitones above C of a spelled note name (`Cb` is -1, `B#` is 12).
pub(crate) fn pitch_class(name: &str) -> Option<i32> {
    let (letter, accidental) = parse_note_name(name)?;
    Some(LETTERS[letter].1 + accidental)
}

/// Narrow a MIDI number to `u8`, naming `pitch` if it falls outside `0..=127`.
pub(crate) fn midi_in_range(midi: i64, pitch: &Pitch) -> Result<u8, MotionError> {
    u8::try_from(midi)
        .ok()
        .filter(|midi| *midi <= 127)
        .ok_or_else(|| MotionError::InvalidPitch(format!("{} is outside the MIDI range", pitch)))
}

/// Spell the note `steps` letters and `semitones` half steps above `root`.
///
/// The letter is fixed by `steps`, and accidentals make up the difference,
/// so a major third above `Bb` is `D` and a major third above `B` is `D#`.
pub(crate) fn spell(root: &str, steps: usize, semitones: i32) -> Result<String, MotionError> {
    let (letter, accidental) = parse_note_name(root)
        .ok_or_else(|| MotionError::InvalidPitch(format!("unknown note name {}", root)))?;
    let root_pc = LETTERS[letter].1 + accidental;

    let (target_char, natural_pc) = LETTERS[(letter + steps) % 7];
    let mut offset = (root_pc + semitones - natural_pc).rem_euclid(12);
    if offset > 6 {
        offset -= 12;
    }

    let mut spelled = target_char.to_string();
    let mark = if offset > 0 { '#' } else { 'b' };
    for _ in 0..offset.abs() {
        spelled.push(mark);
    }
    Ok(spelled)
}
