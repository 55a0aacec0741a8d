//! # Motions
//!
//! A [`Motion`] is a melodic movement from one context index (`ante`) to
//! another (`cons`) with an ordered fill of intermediate indices or nested
//! motions in between.
//!
//! ## Structure
//! ```text
//! Motion
//!   ├── ante: i32
//!   ├── fill: Vec<Fill>
//!   │     ├── Fill::Index(i32)
//!   │     └── Fill::Motion(Motion)   (sub-phrase, flattened in place)
//!   ├── cons: i32
//!   ├── context: Arc<dyn MusicalContext>   (shared)
//!   └── rhythm: Arc<Rhythm>                (shared)
//! ```
//!
//! ## Immutability
//! Every transformation (`with_fill`, `split`, `fill_interval`, `skip`, ...)
//! returns a new motion. Contexts and rhythms are shared between the
//! original and the result, never copied.
//!
//! ## Rhythm positions
//! `ante` takes rhythm position 0, each plain fill index the next position,
//! and `cons` the one after the last fill index. Nested motions are played
//! with their own context and rhythm and take no position from the parent.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use motion::{Meter, Motion, ScaleContext, ScaleMode};
//!
//! let c_major = Arc::new(ScaleContext::from_key("C", ScaleMode::Ionian, 4)?);
//! let run = Motion::new(1, 7, c_major).fill_interval();
//!
//! let labels: Vec<String> = run.notes().map(|n| n.pitch.to_string()).collect();
//! assert_eq!(labels, ["D-4", "E-4", "F-4", "G-4", "A-4", "B-4", "C-5"]);
//!
//! let bars = run.bars(Meter::default())?;
//! assert_eq!(bars.len(), 2);
//! # Ok::<(), motion::MotionError>(())
//! ```

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::bar::{pack, Bar, Note, Track};
use crate::context::MusicalContext;
use crate::duration::Meter;
use crate::error::MotionError;
use crate::playback::{playback_length, Player};
use crate::rhythm::Rhythm;

/// One element of a motion's fill
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Index(i32),
    Motion(Motion),
}

impl From<i32> for Fill {
    fn from(index: i32) -> Self {
        Fill::Index(index)
    }
}

impl From<Motion> for Fill {
    fn from(motion: Motion) -> Self {
        Fill::Motion(motion)
    }
}

/// An immutable melodic movement between two context indices
#[derive(Clone)]
pub struct Motion {
    ante: i32,
    cons: i32,
    context: Arc<dyn MusicalContext>,
    rhythm: Arc<Rhythm>,
    fill: Vec<Fill>,
}

impl Motion {
    /// A motion from `ante` to `cons` with no fill and an even 4/4 rhythm.
    pub fn new(ante: i32, cons: i32, context: Arc<dyn MusicalContext>) -> Self {
        Self {
            ante,
            cons,
            context,
            rhythm: Arc::new(Rhythm::default()),
            fill: Vec::new(),
        }
    }

    pub fn ante(&self) -> i32 {
        self.ante
    }

    pub fn cons(&self) -> i32 {
        self.cons
    }

    pub fn context(&self) -> &Arc<dyn MusicalContext> {
        &self.context
    }

    pub fn rhythm(&self) -> &Arc<Rhythm> {
        &self.rhythm
    }

    pub fn fill(&self) -> &[Fill] {
        &self.fill
    }

    /// Plain fill indices, skipping nested motions
    pub fn fill_indices(&self) -> Vec<i32> {
        self.fill
            .iter()
            .filter_map(|element| match element {
                Fill::Index(i) => Some(*i),
                Fill::Motion(_) => None,
            })
            .collect()
    }

    /// Same context and rhythm, new endpoints and fill.
    fn derive(&self, ante: i32, cons: i32, fill: Vec<Fill>) -> Motion {
        Motion {
            ante,
            cons,
            context: Arc::clone(&self.context),
            rhythm: Arc::clone(&self.rhythm),
            fill,
        }
    }

    /// The flattened notes of this motion, nested motions spliced in place.
    ///
    /// The iterator is lazy and can be restarted by calling `notes()` again.
    pub fn notes(&self) -> Notes<'_> {
        Notes {
            stack: vec![Frame::new(self)],
        }
    }

    /// Number of notes `notes()` yields: two endpoints plus every plain
    /// fill index, plus the notes of every nested motion.
    pub fn note_count(&self) -> usize {
        2 + self
            .fill
            .iter()
            .map(|element| match element {
                Fill::Index(_) => 1,
                Fill::Motion(motion) => motion.note_count(),
            })
            .sum::<usize>()
    }

    /// Pack the notes into bars of `meter`, first-fit and in order.
    pub fn bars(&self, meter: Meter) -> Result<Vec<Bar>, MotionError> {
        pack(self.notes(), meter)
    }

    /// Bars wrapped up as a playable track.
    pub fn track(&self, meter: Meter) -> Result<Track, MotionError> {
        Ok(Track::new(meter, self.bars(meter)?))
    }

    /// Hand this motion's track to `player` and return how long it plays.
    ///
    /// Waiting out the returned length is up to the caller.
    pub fn play<P: Player + ?Sized>(
        &self,
        player: &mut P,
        bpm: u16,
        meter: Meter,
        channel: u8,
    ) -> Result<std::time::Duration, MotionError> {
        let track = self.track(meter)?;
        let length = playback_length(&track, bpm)?;
        debug!(
            bars = track.bars.len(),
            bpm,
            channel,
            seconds = length.as_secs_f64(),
            "handing track to player"
        );
        player.play_track(&track, channel, bpm)?;
        Ok(length)
    }

    /// Split at fill position `index` into `ante -> fill[index]` and
    /// `fill[index] -> cons`.
    ///
    /// The pivot becomes the end of the first half and the start of the
    /// second; it is not repeated inside either fill.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use motion::{Motion, ScaleContext, ScaleMode};
    ///
    /// let scale = Arc::new(ScaleContext::from_key("C", ScaleMode::Ionian, 4)?);
    /// let run = Motion::new(0, 6, scale).fill_interval();
    /// let (first, second) = run.split(2)?;
    ///
    /// assert_eq!((first.ante(), first.cons(), first.fill_indices()), (0, 3, vec![1, 2]));
    /// assert_eq!((second.ante(), second.cons(), second.fill_indices()), (3, 6, vec![4, 5]));
    /// # Ok::<(), motion::MotionError>(())
    /// ```
    ///
    /// # Errors
    /// [`MotionError::IndexOutOfRange`] if `index` is past the fill, and
    /// [`MotionError::InvalidSplit`] if it holds a nested motion.
    pub fn split(&self, index: usize) -> Result<(Motion, Motion), MotionError> {
        let pivot = match self.fill.get(index) {
            Some(Fill::Index(pivot)) => *pivot,
            Some(Fill::Motion(_)) => return Err(MotionError::InvalidSplit { index }),
            None => {
                return Err(MotionError::IndexOutOfRange {
                    index,
                    len: self.fill.len(),
                })
            }
        };

        Ok((
            self.derive(self.ante, pivot, self.fill[..index].to_vec()),
            self.derive(pivot, self.cons, self.fill[index + 1..].to_vec()),
        ))
    }

    pub fn with_fill(&self, fill: Vec<Fill>) -> Motion {
        self.derive(self.ante, self.cons, fill)
    }

    pub fn with_rhythm(&self, rhythm: impl Into<Arc<Rhythm>>) -> Motion {
        Motion {
            rhythm: rhythm.into(),
            ..self.clone()
        }
    }

    /// Same indices, read in a different context.
    pub fn with_context(&self, context: Arc<dyn MusicalContext>) -> Motion {
        Motion {
            context,
            ..self.clone()
        }
    }

    /// Same pitches, re-indexed in a different context.
    ///
    /// Every endpoint and fill index (nested motions included) is looked up
    /// by pitch in `context`, so the result sounds the same as `self`.
    ///
    /// # Errors
    /// [`MotionError::Lookup`] if any pitch is not part of `context`.
    pub fn with_equivalent_context(
        &self,
        context: Arc<dyn MusicalContext>,
    ) -> Result<Motion, MotionError> {
        let remap = |index: i32| context.index_of(&self.context.at(index));

        let ante = remap(self.ante)?;
        let cons = remap(self.cons)?;
        let fill = self
            .fill
            .iter()
            .map(|element| match element {
                Fill::Index(i) => remap(*i).map(Fill::Index),
                Fill::Motion(motion) => motion
                    .with_equivalent_context(Arc::clone(&context))
                    .map(Fill::Motion),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Motion {
            ante,
            cons,
            context,
            rhythm: Arc::clone(&self.rhythm),
            fill,
        })
    }

    /// Fill with every index strictly between `ante` and `cons`, walking
    /// from `ante` towards `cons` one step at a time.
    pub fn fill_interval(&self) -> Motion {
        let fill = if self.ante <= self.cons {
            (self.ante..self.cons).skip(1).map(Fill::Index).collect()
        } else {
            (self.cons..self.ante).skip(1).rev().map(Fill::Index).collect()
        };
        self.with_fill(fill)
    }

    /// Drop the fill elements at `positions`, keeping the rest in order.
    ///
    /// # Errors
    /// [`MotionError::IndexOutOfRange`] if any position is past the fill.
    pub fn skip(&self, positions: &[usize]) -> Result<Motion, MotionError> {
        if let Some(&index) = positions.iter().find(|&&p| p >= self.fill.len()) {
            return Err(MotionError::IndexOutOfRange {
                index,
                len: self.fill.len(),
            });
        }

        let fill = self
            .fill
            .iter()
            .enumerate()
            .filter(|(i, _)| !positions.contains(i))
            .map(|(_, element)| element.clone())
            .collect();
        Ok(self.with_fill(fill))
    }
}

impl fmt::Debug for Motion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Motion")
            .field("ante", &self.ante)
            .field("cons", &self.cons)
            .field("context", &self.context.name())
            .field("rhythm", &self.rhythm)
            .field("fill", &self.fill)
            .finish()
    }
}

/// Motions are equal when they have the same shape, rhythm and a context of
/// the same name.
impl PartialEq for Motion {
    fn eq(&self, other: &Self) -> bool {
        self.ante == other.ante
            && self.cons == other.cons
            && self.fill == other.fill
            && self.rhythm == other.rhythm
            && (Arc::ptr_eq(&self.context, &other.context)
                || self.context.name() == other.context.name())
    }
}

/// Depth-first walk over a motion's fill tree.
///
/// Uses an explicit stack, so deep nesting does not grow the call stack.
pub struct Notes<'a> {
    stack: Vec<Frame<'a>>,
}

struct Frame<'a> {
    motion: &'a Motion,
    /// 0 is ante, `1..=fill.len()` the fill, `fill.len() + 1` cons
    step: usize,
    rhythm_index: usize,
}

impl<'a> Frame<'a> {
    fn new(motion: &'a Motion) -> Self {
        Self {
            motion,
            step: 0,
            rhythm_index: 0,
        }
    }

    fn emit(&mut self, index: i32) -> Note {
        let context = &self.motion.context;
        let note = Note::new(context.at(index), self.motion.rhythm.duration(self.rhythm_index))
            .with_midi(context.midi(index).ok());
        self.rhythm_index += 1;
        note
    }
}

impl<'a> Iterator for Notes<'a> {
    type Item = Note;

    fn next(&mut self) -> Option<Note> {
        loop {
            let frame = self.stack.last_mut()?;
            let motion = frame.motion;
            let step = frame.step;
            frame.step += 1;

            if step == 0 {
                return Some(frame.emit(motion.ante));
            }
            if step <= motion.fill.len() {
                match &motion.fill[step - 1] {
                    Fill::Index(index) => return Some(frame.emit(*index)),
                    Fill::Motion(nested) => self.stack.push(Frame::new(nested)),
                }
                continue;
            }
            if step == motion.fill.len() + 1 {
                return Some(frame.emit(motion.cons));
            }
            self.stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ChordContext, ScaleContext, ScaleMode};
    use crate::duration::Duration;
    use crate::pitch::Pitch;

    fn c_major() -> Arc<dyn MusicalContext> {
        Arc::new(ScaleContext::from_key("C", ScaleMode::Ionian, 4).unwrap())
    }

    fn labels(motion: &Motion) -> Vec<String> {
        motion.notes().map(|note| note.pitch.to_string()).collect()
    }

    fn indices(values: &[i32]) -> Vec<Fill> {
        values.iter().copied().map(Fill::Index).collect()
    }

    #[test]
    fn test_empty_fill_yields_two_notes() {
        let motion = Motion::new(0, 4, c_major());
        assert_eq!(labels(&motion), ["C-4", "G-4"]);
        assert_eq!(motion.note_count(), 2);
    }

    #[test]
    fn test_flat_fill_note_count() {
        let motion = Motion::new(0, 4, c_major()).with_fill(indices(&[2, 9, -1]));
        assert_eq!(motion.notes().count(), 5);
        assert_eq!(labels(&motion), ["C-4", "E-4", "D-5", "B-3", "G-4"]);
    }

    #[test]
    fn test_notes_is_restartable() {
        let motion = Motion::new(0, 3, c_major()).fill_interval();
        let first: Vec<Note> = motion.notes().collect();
        let second: Vec<Note> = motion.notes().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rhythm_positions_follow_plain_notes() {
        let swung = Rhythm::Swung(Meter::default());
        let motion = Motion::new(0, 3, c_major())
            .fill_interval()
            .with_rhythm(swung);
        let durations: Vec<Duration> = motion.notes().map(|note| note.duration).collect();
        let long = Duration::new(3, 8).unwrap();
        let short = Duration::new(1, 8).unwrap();
        assert_eq!(durations, [long, short, long, short]);
    }

    #[test]
    fn test_nested_motion_is_spliced_with_its_own_context() {
        let chord: Arc<dyn MusicalContext> = Arc::new(ChordContext::new(["C", "E", "G"], 5).unwrap());
        let arpeggio = Motion::new(0, 2, chord).with_fill(indices(&[1]));
        let motion = Motion::new(0, 4, c_major()).with_fill(vec![
            Fill::Index(1),
            Fill::Motion(arpeggio.clone()),
            Fill::Index(3),
        ]);

        assert_eq!(
            labels(&motion),
            ["C-4", "D-4", "C-5", "E-5", "G-5", "F-4", "G-4"]
        );
        assert_eq!(motion.note_count(), 2 + 2 + arpeggio.note_count());
        assert_eq!(motion.notes().count(), motion.note_count());
    }

    #[test]
    fn test_nested_motion_takes_no_parent_rhythm_position() {
        let pattern = Rhythm::pattern(vec![
            Duration::note(2).unwrap(),
            Duration::note(4).unwrap(),
            Duration::note(8).unwrap(),
        ])
        .unwrap();
        let inner = Motion::new(0, 1, c_major()).with_rhythm(Rhythm::Even(Meter::new(4, 16).unwrap()));
        let motion = Motion::new(0, 2, c_major())
            .with_rhythm(pattern)
            .with_fill(vec![Fill::Motion(inner)]);

        let durations: Vec<String> = motion.notes().map(|n| n.duration.to_string()).collect();
        assert_eq!(durations, ["1/2", "1/16", "1/16", "1/4"]);
    }

    #[test]
    fn test_deeply_nested_fill() {
        let mut motion = Motion::new(0, 1, c_major());
        for _ in 0..500 {
            motion = Motion::new(0, 1, c_major()).with_fill(vec![Fill::Motion(motion)]);
        }
        assert_eq!(motion.notes().count(), 2 * 501);
    }

    #[test]
    fn test_fill_interval_ascending() {
        let motion = Motion::new(1, 7, c_major()).fill_interval();
        assert_eq!(motion.fill_indices(), [2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_fill_interval_descending() {
        let motion = Motion::new(7, 1, c_major()).fill_interval();
        assert_eq!(motion.fill_indices(), [6, 5, 4, 3, 2]);
    }

    #[test]
    fn test_fill_interval_degenerate() {
        assert!(Motion::new(3, 3, c_major()).fill_interval().fill().is_empty());
        assert!(Motion::new(3, 4, c_major()).fill_interval().fill().is_empty());
        assert_eq!(Motion::new(4, 2, c_major()).fill_interval().fill_indices(), [3]);
    }

    #[test]
    fn test_fill_interval_at_index_limits() {
        let (max, min) = (i32::MAX, i32::MIN);
        assert!(Motion::new(max, max, c_major()).fill_interval().fill().is_empty());
        assert!(Motion::new(min, min, c_major()).fill_interval().fill().is_empty());
        assert_eq!(
            Motion::new(max - 2, max, c_major()).fill_interval().fill_indices(),
            [max - 1]
        );
        assert_eq!(
            Motion::new(min + 2, min, c_major()).fill_interval().fill_indices(),
            [min + 1]
        );

        let notes: Vec<Note> = Motion::new(max, max, c_major()).notes().collect();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].midi, None);
    }

    #[test]
    fn test_notes_carry_sounding_midi() {
        let a_minor: Arc<dyn MusicalContext> =
            Arc::new(ScaleContext::from_key("A", ScaleMode::Aeolian, 3).unwrap());
        let run = Motion::new(0, 4, a_minor).fill_interval();
        assert_eq!(labels(&run), ["A-3", "B-3", "C-3", "D-3", "E-3"]);

        let midi: Vec<Option<u8>> = run.notes().map(|note| note.midi).collect();
        assert_eq!(midi, [Some(57), Some(59), Some(60), Some(62), Some(64)]);
    }

    #[test]
    fn test_fill_interval_replaces_existing_fill() {
        let motion = Motion::new(0, 3, c_major())
            .with_fill(indices(&[9, 9, 9, 9]))
            .fill_interval();
        assert_eq!(motion.fill_indices(), [1, 2]);
    }

    #[test]
    fn test_split_keeps_pivot_once() {
        let motion = Motion::new(0, 6, c_major()).fill_interval();
        let (first, second) = motion.split(0).unwrap();
        assert_eq!((first.ante(), first.cons()), (0, 1));
        assert!(first.fill().is_empty());
        assert_eq!((second.ante(), second.cons()), (1, 6));
        assert_eq!(second.fill_indices(), [2, 3, 4, 5]);

        // Rejoined, the halves cover the original notes with the pivot shared.
        assert_eq!(first.note_count() + second.note_count() - 1, motion.note_count());
    }

    #[test]
    fn test_split_errors() {
        let motion = Motion::new(0, 3, c_major()).fill_interval();
        assert_eq!(
            motion.split(2).unwrap_err(),
            MotionError::IndexOutOfRange { index: 2, len: 2 }
        );

        let nested = motion.with_fill(vec![Fill::Motion(Motion::new(0, 1, c_major()))]);
        assert_eq!(nested.split(0).unwrap_err(), MotionError::InvalidSplit { index: 0 });
    }

    #[test]
    fn test_transformations_leave_original_untouched() {
        let motion = Motion::new(0, 4, c_major()).fill_interval();
        let _ = motion.with_fill(indices(&[7]));
        let _ = motion.with_rhythm(Rhythm::Swung(Meter::default()));
        let _ = motion.skip(&[0]).unwrap();
        assert_eq!(motion.fill_indices(), [1, 2, 3]);
        assert_eq!(**motion.rhythm(), Rhythm::default());
    }

    #[test]
    fn test_with_context_keeps_indices() {
        let d_major: Arc<dyn MusicalContext> =
            Arc::new(ScaleContext::from_key("D", ScaleMode::Ionian, 4).unwrap());
        let motion = Motion::new(0, 2, c_major()).fill_interval().with_context(d_major);
        assert_eq!(labels(&motion), ["D-4", "E-4", "F#-4"]);
    }

    #[test]
    fn test_shared_rhythm_and_context() {
        let motion = Motion::new(0, 4, c_major());
        let filled = motion.fill_interval();
        assert!(Arc::ptr_eq(motion.context(), filled.context()));
        assert!(Arc::ptr_eq(motion.rhythm(), filled.rhythm()));
    }

    #[test]
    fn test_equivalent_context_identity() {
        let motion = Motion::new(1, 5, c_major()).fill_interval();
        let same = motion
            .with_equivalent_context(Arc::clone(motion.context()))
            .unwrap();
        assert_eq!(same.ante(), motion.ante());
        assert_eq!(same.cons(), motion.cons());
        assert_eq!(same.fill(), motion.fill());
    }

    #[test]
    fn test_equivalent_context_reindexes_pitches() {
        let g_major: Arc<dyn MusicalContext> =
            Arc::new(ScaleContext::from_key("G", ScaleMode::Ionian, 4).unwrap());
        let motion = Motion::new(0, 4, c_major()).with_fill(indices(&[2]));
        let moved = motion.with_equivalent_context(g_major).unwrap();

        // C is the fourth degree of G major, G its first.
        assert_eq!(moved.ante(), 3);
        assert_eq!(moved.cons(), 0);
        assert_eq!(moved.fill_indices(), [5]);
        assert_eq!(labels(&moved), labels(&motion));
    }

    #[test]
    fn test_equivalent_context_missing_pitch() {
        let g_major: Arc<dyn MusicalContext> =
            Arc::new(ScaleContext::from_key("G", ScaleMode::Ionian, 4).unwrap());
        // F-4 is not in G major.
        let motion = Motion::new(0, 3, c_major());
        let err = motion.with_equivalent_context(g_major).unwrap_err();
        assert_eq!(
            err,
            MotionError::Lookup {
                pitch: Pitch::new("F", 4).to_string(),
                context: "scale G A B C D E F# (octave 4)".to_string(),
            }
        );
    }

    #[test]
    fn test_skip_keeps_order() {
        let motion = Motion::new(0, 20, c_major()).with_fill(indices(&[10, 11, 12, 13]));
        let skipped = motion.skip(&[1, 3]).unwrap();
        assert_eq!(skipped.fill_indices(), [10, 12]);
        assert_eq!(motion.skip(&[]).unwrap().fill_indices(), [10, 11, 12, 13]);
        assert_eq!(motion.skip(&[2, 2]).unwrap().fill_indices(), [10, 11, 13]);
    }

    #[test]
    fn test_skip_out_of_range() {
        let motion = Motion::new(0, 3, c_major()).fill_interval();
        assert_eq!(
            motion.skip(&[0, 5]).unwrap_err(),
            MotionError::IndexOutOfRange { index: 5, len: 2 }
        );
    }

    #[test]
    fn test_bars_respect_capacity() {
        let motion = Motion::new(0, 14, c_major())
            .fill_interval()
            .with_rhythm(Rhythm::Swung(Meter::new(3, 4).unwrap()));
        let meter = Meter::new(3, 4).unwrap();
        let bars = motion.bars(meter).unwrap();

        assert_eq!(bars.iter().map(|b| b.notes().len()).sum::<usize>(), 15);
        for bar in &bars {
            assert!(bar.used() <= meter.capacity());
            assert!(!bar.is_empty());
        }
    }

    #[test]
    fn test_bars_overflow() {
        let whole = Rhythm::pattern(vec![Duration::WHOLE]).unwrap();
        let motion = Motion::new(0, 1, c_major()).with_rhythm(whole);
        assert!(matches!(
            motion.bars(Meter::new(3, 4).unwrap()),
            Err(MotionError::CapacityOverflow { .. })
        ));
        assert_eq!(motion.bars(Meter::default()).unwrap().len(), 2);
    }
}
