//! # Playback
//!
//! The boundary between generated tracks and whatever actually makes sound.
//!
//! ## Player
//! A [`Player`] receives a finished [`Track`] together with a tempo and a
//! channel. It may play in the background or block; the engine only needs
//! to know how long the track lasts, which [`playback_length`] computes.
//!
//! ## Timing
//! - Bars always count in full: a half-empty last bar still lasts a whole bar.
//! - `seconds = total_beats * 60 / bpm`
//!
//! ## Schedule
//! [`schedule()`] turns a track into timed MIDI notes ([`PlaybackData`]),
//! ready for a synthesizer or for display:
//!
//! ```rust
//! use std::sync::Arc;
//! use motion::{playback::schedule, Meter, Motion, ScaleContext, ScaleMode};
//!
//! let scale = Arc::new(ScaleContext::from_key("C", ScaleMode::Ionian, 4)?);
//! let track = Motion::new(0, 4, scale).fill_interval().track(Meter::default())?;
//! let data = schedule(&track, 120, 1)?;
//!
//! assert_eq!(data.notes.len(), 5);
//! assert_eq!(data.notes[0].midi_note, 60); // C4
//! assert_eq!(data.notes[4].bar_number, 2);
//! assert_eq!(data.seconds, 4.0);
//! # Ok::<(), motion::MotionError>(())
//! ```

use serde::Serialize;
use tracing::info;

use crate::bar::Track;
use crate::duration::Meter;
use crate::error::MotionError;

/// Something that can play a track
pub trait Player {
    fn play_track(&mut self, track: &Track, channel: u8, bpm: u16) -> Result<(), MotionError>;
}

/// Playback data for a single note
///
/// # Fields
/// - `pitch`: The pitch label the context produced (`C-4`)
/// - `midi_note`: Sounding MIDI note number (C4 = 60)
/// - `start_time`: Start in beats from the beginning of the track
/// - `duration`: Length in beats
/// - `note_index`: Sequential index (0, 1, 2, ...)
/// - `bar_number`: Which bar this note is in (1-indexed)
/// - `beat_in_bar`: Beat position within the bar
/// - `start_seconds`: Start in seconds at the track's tempo
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackNote {
    pub pitch: String,
    pub midi_note: u8,
    pub start_time: f64,
    pub duration: f64,
    pub note_index: usize,
    pub bar_number: usize,
    pub beat_in_bar: f64,
    pub start_seconds: f64,
}

/// Playback data for an entire track
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackData {
    pub tempo: u16,
    pub channel: u8,
    pub meter: Meter,
    pub total_beats: u32,
    pub seconds: f64,
    pub notes: Vec<PlaybackNote>,
}

fn check_tempo(bpm: u16) -> Result<(), MotionError> {
    if bpm == 0 {
        return Err(MotionError::InvalidTempo(bpm));
    }
    Ok(())
}

/// How long `track` plays at `bpm` beats per minute.
pub fn playback_length(track: &Track, bpm: u16) -> Result<std::time::Duration, MotionError> {
    check_tempo(bpm)?;
    let seconds = track.total_beats() as f64 * 60.0 / bpm as f64;
    Ok(std::time::Duration::from_secs_f64(seconds))
}

/// Lay out every note of `track` in time.
///
/// # Errors
/// [`MotionError::InvalidTempo`] for a zero tempo, and
/// [`MotionError::InvalidPitch`] if a note has no MIDI number (its name is not
/// a spelled note, or it lies outside the MIDI range).
pub fn schedule(track: &Track, bpm: u16, channel: u8) -> Result<PlaybackData, MotionError> {
    check_tempo(bpm)?;
    let seconds_per_beat = 60.0 / bpm as f64;

    let mut notes = Vec::new();
    let mut bar_start = 0.0;
    for (bar_index, bar) in track.bars.iter().enumerate() {
        let mut beat_in_bar = 0.0;
        for note in bar.notes() {
            let duration = note.duration.as_beats(&bar.meter());
            let start_time = bar_start + beat_in_bar;
            let midi_note = note.midi.ok_or_else(|| {
                MotionError::InvalidPitch(format!("{} has no MIDI number", note.pitch))
            })?;
            notes.push(PlaybackNote {
                pitch: note.pitch.to_string(),
                midi_note,
                start_time,
                duration,
                note_index: notes.len(),
                bar_number: bar_index + 1,
                beat_in_bar,
                start_seconds: start_time * seconds_per_beat,
            });
            beat_in_bar += duration;
        }
        bar_start += bar.meter().beats as f64;
    }

    Ok(PlaybackData {
        tempo: bpm,
        channel,
        meter: track.meter,
        total_beats: track.total_beats(),
        seconds: playback_length(track, bpm)?.as_secs_f64(),
        notes,
    })
}

/// A player that records the schedule of every track it is handed.
#[derive(Debug, Default)]
pub struct RecordingPlayer {
    pub played: Vec<PlaybackData>,
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Player for RecordingPlayer {
    fn play_track(&mut self, track: &Track, channel: u8, bpm: u16) -> Result<(), MotionError> {
        let data = schedule(track, bpm, channel)?;
        info!(
            notes = data.notes.len(),
            bars = track.bars.len(),
            seconds = data.seconds,
            "recorded track"
        );
        self.played.push(data);
        Ok(())
    }
}
