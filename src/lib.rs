//! # motion
//!
//! Generates melodic motions between two notes of a scale or chord, fills
//! the interval between them, gives every note a length from a rhythm, and
//! packs the result into bars for a player.
//!
//! ## Pipeline
//! 1. Build a [`MusicalContext`] ([`ScaleContext`] or [`ChordContext`])
//! 2. Build a [`Motion`] in it and transform it (`fill_interval`, `skip`, ...)
//! 3. Ask for its [`Track`] under a [`Meter`]
//! 4. Hand the track to a [`Player`]
//!
//! ```rust
//! use std::sync::Arc;
//! use motion::{Meter, Motion, Rhythm, ScaleContext, ScaleMode};
//!
//! let c_major = Arc::new(ScaleContext::from_key("C", ScaleMode::Ionian, 4)?);
//! let motion = Motion::new(1, 7, c_major)
//!     .fill_interval()
//!     .with_rhythm(Rhythm::Swung(Meter::default()));
//!
//! let track = motion.track(Meter::default())?;
//! assert_eq!(track.notes().count(), 7);
//! # Ok::<(), motion::MotionError>(())
//! ```

pub mod bar;
pub mod config;
pub mod context;
pub mod duration;
pub mod error;
pub mod motion;
pub mod pitch;
pub mod playback;
pub mod rhythm;

pub use bar::{Bar, Note, Track};
pub use config::{parse_config, MotionConfig};
pub use context::{ChordContext, MusicalContext, ScaleContext, ScaleMode};
pub use duration::{Duration, Meter};
pub use error::MotionError;
pub use motion::{Fill, Motion, Notes};
pub use pitch::Pitch;
pub use playback::{playback_length, PlaybackData, PlaybackNote, Player, RecordingPlayer};
pub use rhythm::{Pattern, Rhythm};

/// Build the track described by a YAML motion document.
/// This is the main entry point for the library.
pub fn generate(source: &str) -> Result<Track, MotionError> {
    let config = parse_config(source)?;
    config.motion.track(config.meter)
}

/// Build a motion document's track and lay it out in time at the
/// document's tempo and channel.
pub fn generate_playback(source: &str) -> Result<PlaybackData, MotionError> {
    let config = parse_config(source)?;
    let track = config.motion.track(config.meter)?;
    playback::schedule(&track, config.tempo, config.channel)
}
