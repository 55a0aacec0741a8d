//! # Musical Contexts
//!
//! A context turns the integer indices a [`Motion`](crate::Motion) works with
//! into pitches, and back. Indices past the end of the scale or chord wrap
//! around into the next octave, so motion logic stays in plain integer space:
//!
//! ```text
//! C major, octave 4
//!   index  -1    0    1   ...   6    7    8
//!   pitch  B-3  C-4  D-4  ...  B-4  C-5  D-5
//! ```
//!
//! ## Variants
//! - [`ScaleContext`] - seven named degrees
//! - [`ChordContext`] - any number of chord tones, with inversions as relatives
//!
//! ## Round-trip law
//! For every context and every index `i`, `index_of(&at(i)) == Ok(i)`.
//!
//! ## Sounding pitch
//! A label's octave counts cycles from the context's first name, so in A
//! minor the `C` after `B-3` is still `C-3`. [`MusicalContext::midi`] gives the
//! sounding MIDI number instead, which always rises with the index:
//!
//! ```text
//! A minor, octave 3
//!   index  0     1     2     3     4
//!   label  A-3   B-3   C-3   D-3   E-3
//!   midi   57    59    60    62    64
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::MotionError;
use crate::pitch::{midi_in_range, pitch_class, spell, Pitch};

/// Mapping between integer degree indices and concrete pitches.
///
/// Contexts are read-only once built and are shared between motions through
/// `Arc`.
pub trait MusicalContext: fmt::Debug + Send + Sync {
    /// Human-readable description, used in error messages.
    fn name(&self) -> String;

    /// Pitch at `index`, wrapping into neighbouring octaves.
    fn at(&self, index: i32) -> Pitch;

    /// Index of `pitch`, failing with [`MotionError::Lookup`] if the pitch
    /// name is not part of this context.
    fn index_of(&self, pitch: &Pitch) -> Result<i32, MotionError>;

    /// MIDI number of the pitch at `index`.
    ///
    /// The default reads the label's octave as a scientific octave.
    fn midi(&self, index: i32) -> Result<u8, MotionError> {
        self.at(index).midi_note()
    }

    /// The context this one was derived from, if any.
    fn parent(&self) -> Option<Arc<dyn MusicalContext>> {
        None
    }

    /// Named alternate contexts over the same material (e.g. inversions).
    fn relatives(&self) -> Vec<(String, Arc<dyn MusicalContext>)> {
        Vec::new()
    }
}

/// An ordered set of pitch names repeating every octave.
#[derive(Debug, Clone, PartialEq)]
struct Cycle {
    names: Vec<String>,
    octave: i32,
}

impl Cycle {
    fn new(names: Vec<String>, octave: i32) -> Result<Self, MotionError> {
        if names.is_empty() {
            return Err(MotionError::InvalidContext("no pitch names given".to_string()));
        }
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() || name.contains('-') {
                return Err(MotionError::InvalidContext(format!(
                    "invalid pitch name '{}'",
                    name
                )));
            }
            if names[..i].contains(name) {
                return Err(MotionError::InvalidContext(format!(
                    "pitch name {} appears twice",
                    name
                )));
            }
        }
        Ok(Self { names, octave })
    }

    fn len(&self) -> i32 {
        self.names.len() as i32
    }

    /// Octaves past `i32` saturate instead of wrapping.
    fn at(&self, index: i32) -> Pitch {
        let name = &self.names[index.rem_euclid(self.len()) as usize];
        Pitch::new(
            name.clone(),
            self.octave.saturating_add(index.div_euclid(self.len())),
        )
    }

    fn position(&self, pitch: &Pitch) -> Option<i32> {
        let position = self.names.iter().position(|name| *name == pitch.name)? as i32;
        let cycles = pitch.octave.checked_sub(self.octave)?;
        self.len().checked_mul(cycles)?.checked_add(position)
    }

    /// Pitch class of the first name, the semitone offset of every name
    /// above it (each higher than the last), and the span of one full cycle
    /// rounded up to whole octaves.
    fn voicing(&self) -> Option<(i32, Vec<i64>, i64)> {
        let tonic = pitch_class(&self.names[0])?;
        let mut offsets = Vec::with_capacity(self.names.len());
        let mut previous = tonic;
        let mut offset = 0i64;
        for name in &self.names {
            let class = pitch_class(name)?;
            if !offsets.is_empty() {
                let step = (class - previous).rem_euclid(12);
                offset += if step == 0 { 12 } else { step as i64 };
            }
            offsets.push(offset);
            previous = class;
        }
        let span = 12 * (offset / 12 + 1);
        Some((tonic, offsets, span))
    }

    fn midi(&self, index: i32) -> Result<u8, MotionError> {
        let pitch = self.at(index);
        let (tonic, offsets, span) = self.voicing().ok_or_else(|| {
            MotionError::InvalidPitch(format!("{} has no MIDI number", pitch))
        })?;
        let cycles = index.div_euclid(self.len()) as i64;
        let midi = (self.octave as i64 + 1) * 12
            + tonic as i64
            + span * cycles
            + offsets[index.rem_euclid(self.len()) as usize];
        midi_in_range(midi, &pitch)
    }

    fn describe(&self, kind: &str) -> String {
        format!("{} {} (octave {})", kind, self.names.join(" "), self.octave)
    }
}

/// The church modes, as semitone offsets of each degree from the tonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleMode {
    #[default]
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl ScaleMode {
    pub fn intervals(self) -> [i32; 7] {
        match self {
            ScaleMode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            ScaleMode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            ScaleMode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            ScaleMode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            ScaleMode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            ScaleMode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
            ScaleMode::Locrian => [0, 1, 3, 5, 6, 8, 10],
        }
    }

    /// Parse a mode name, accepting `major` and `minor` as aliases.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ionian" | "major" => Some(ScaleMode::Ionian),
            "dorian" => Some(ScaleMode::Dorian),
            "phrygian" => Some(ScaleMode::Phrygian),
            "lydian" => Some(ScaleMode::Lydian),
            "mixolydian" => Some(ScaleMode::Mixolydian),
            "aeolian" | "minor" => Some(ScaleMode::Aeolian),
            "locrian" => Some(ScaleMode::Locrian),
            _ => None,
        }
    }
}

/// A seven-degree scale starting at a base octave.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleContext {
    cycle: Cycle,
}

impl ScaleContext {
    /// Build a scale from exactly seven distinct degree names.
    ///
    /// # Example
    /// ```
    /// use motion::{MusicalContext, ScaleContext};
    ///
    /// let c_major = ScaleContext::new(["C", "D", "E", "F", "G", "A", "B"], 4)?;
    /// assert_eq!(c_major.at(7).to_string(), "C-5");
    /// # Ok::<(), motion::MotionError>(())
    /// ```
    pub fn new<I, S>(degrees: I, octave: i32) -> Result<Self, MotionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = degrees.into_iter().map(Into::into).collect();
        if names.len() != 7 {
            return Err(MotionError::InvalidContext(format!(
                "a scale needs 7 degrees, got {}",
                names.len()
            )));
        }
        Ok(Self {
            cycle: Cycle::new(names, octave)?,
        })
    }

    /// Build the spelled scale of `mode` on `tonic` (e.g. `"Bb"`, Ionian ->
    /// Bb C D Eb F G A).
    pub fn from_key(tonic: &str, mode: ScaleMode, octave: i32) -> Result<Self, MotionError> {
        let degrees = mode
            .intervals()
            .iter()
            .enumerate()
            .map(|(step, semitones)| spell(tonic, step, *semitones))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(degrees, octave)
    }

    pub fn degrees(&self) -> &[String] {
        &self.cycle.names
    }

    pub fn octave(&self) -> i32 {
        self.cycle.octave
    }
}

impl MusicalContext for ScaleContext {
    fn name(&self) -> String {
        self.cycle.describe("scale")
    }

    fn at(&self, index: i32) -> Pitch {
        self.cycle.at(index)
    }

    fn index_of(&self, pitch: &Pitch) -> Result<i32, MotionError> {
        self.cycle.position(pitch).ok_or_else(|| MotionError::Lookup {
            pitch: pitch.to_string(),
            context: self.name(),
        })
    }

    fn midi(&self, index: i32) -> Result<u8, MotionError> {
        self.cycle.midi(index)
    }
}

/// Chord tones as (letter steps, semitones) above the root.
fn chord_quality(quality: &str) -> Option<&'static [(usize, i32)]> {
    let steps: &'static [(usize, i32)] = match quality {
        // Triads
        "" | "maj" | "M" => &[(0, 0), (2, 4), (4, 7)],
        "m" | "min" | "-" => &[(0, 0), (2, 3), (4, 7)],
        "dim" | "°" => &[(0, 0), (2, 3), (4, 6)],
        "aug" | "+" => &[(0, 0), (2, 4), (4, 8)],
        "sus4" => &[(0, 0), (3, 5), (4, 7)],
        "sus2" => &[(0, 0), (1, 2), (4, 7)],

        // Sevenths
        "7" => &[(0, 0), (2, 4), (4, 7), (6, 10)],
        "maj7" | "M7" => &[(0, 0), (2, 4), (4, 7), (6, 11)],
        "m7" | "min7" | "-7" => &[(0, 0), (2, 3), (4, 7), (6, 10)],
        "m7b5" | "ø" => &[(0, 0), (2, 3), (4, 6), (6, 10)],
        "dim7" | "°7" => &[(0, 0), (2, 3), (4, 6), (6, 9)],

        // Ninths
        "9" => &[(0, 0), (2, 4), (4, 7), (6, 10), (8, 14)],
        "maj9" | "M9" => &[(0, 0), (2, 4), (4, 7), (6, 11), (8, 14)],
        "m9" | "min9" => &[(0, 0), (2, 3), (4, 7), (6, 10), (8, 14)],

        _ => return None,
    };
    Some(steps)
}

/// Chord tones in a fixed order starting at a base octave.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordContext {
    cycle: Cycle,
    parent: Option<Arc<ChordContext>>,
}

impl ChordContext {
    /// Build a chord from a non-empty list of distinct tone names.
    pub fn new<I, S>(tones: I, octave: i32) -> Result<Self, MotionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = tones.into_iter().map(Into::into).collect();
        Ok(Self {
            cycle: Cycle::new(names, octave)?,
            parent: None,
        })
    }

    /// Build a chord from a symbol such as `C`, `Dm`, `G7`, `Cmaj7`, `F#dim`.
    ///
    /// # Example
    /// ```
    /// use motion::ChordContext;
    ///
    /// let g7 = ChordContext::from_symbol("G7", 3)?;
    /// assert_eq!(g7.tones(), ["G", "B", "D", "F"]);
    /// # Ok::<(), motion::MotionError>(())
    /// ```
    pub fn from_symbol(symbol: &str, octave: i32) -> Result<Self, MotionError> {
        let symbol = symbol.trim();
        let root_len = symbol
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c != '#' && *c != 'b')
            .map(|(i, _)| i)
            .unwrap_or(symbol.len());
        if root_len == 0 {
            return Err(MotionError::InvalidContext("empty chord symbol".to_string()));
        }
        let (root, quality) = symbol.split_at(root_len);

        let steps = chord_quality(quality).ok_or_else(|| {
            MotionError::InvalidContext(format!("unknown chord quality in {}", symbol))
        })?;
        let tones = steps
            .iter()
            .map(|(letters, semitones)| spell(root, *letters, *semitones))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(tones, octave)
    }

    pub fn tones(&self) -> &[String] {
        &self.cycle.names
    }

    pub fn octave(&self) -> i32 {
        self.cycle.octave
    }

    /// The chord rotated so that its `n`th tone is in the bass.
    pub fn inversion(&self, n: usize) -> ChordContext {
        let mut names = self.cycle.names.clone();
        let len = names.len();
        names.rotate_left(n % len);
        let root = ChordContext {
            cycle: self.cycle.clone(),
            parent: None,
        };
        ChordContext {
            cycle: Cycle {
                names,
                octave: self.cycle.octave,
            },
            parent: Some(self.parent.clone().unwrap_or_else(|| Arc::new(root))),
        }
    }
}

impl MusicalContext for ChordContext {
    fn name(&self) -> String {
        self.cycle.describe("chord")
    }

    fn at(&self, index: i32) -> Pitch {
        self.cycle.at(index)
    }

    fn index_of(&self, pitch: &Pitch) -> Result<i32, MotionError> {
        self.cycle.position(pitch).ok_or_else(|| MotionError::Lookup {
            pitch: pitch.to_string(),
            context: self.name(),
        })
    }

    fn midi(&self, index: i32) -> Result<u8, MotionError> {
        self.cycle.midi(index)
    }

    fn parent(&self) -> Option<Arc<dyn MusicalContext>> {
        self.parent
            .clone()
            .map(|parent| parent as Arc<dyn MusicalContext>)
    }

    fn relatives(&self) -> Vec<(String, Arc<dyn MusicalContext>)> {
        (1..self.cycle.names.len())
            .map(|n| {
                let inversion: Arc<dyn MusicalContext> = Arc::new(self.inversion(n));
                (format!("inversion-{}", n), inversion)
            })
            .collect()
    }
}
