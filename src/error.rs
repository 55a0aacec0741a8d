//! # Error Types
//!
//! Every fallible operation in the crate returns [`MotionError`]. Errors are
//! raised synchronously where the computation fails; nothing is retried.
//!
//! ## Usage
//! ```rust
//! use motion::{MotionError, MusicalContext, Pitch, ScaleContext, ScaleMode};
//!
//! let c_major = ScaleContext::from_key("C", ScaleMode::Ionian, 4)?;
//! match c_major.index_of(&Pitch::new("F#", 4)) {
//!     Ok(index) => println!("found at {}", index),
//!     Err(MotionError::Lookup { pitch, context }) => {
//!         eprintln!("{} is not in {}", pitch, context);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # Ok::<(), MotionError>(())
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// A pitch is not a member of the context it was looked up in.
    ///
    /// # Example
    /// ```
    /// # use motion::MotionError;
    /// let err = MotionError::Lookup {
    ///     pitch: "F#-4".to_string(),
    ///     context: "scale C D E F G A B (octave 4)".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Pitch F#-4 is not in scale C D E F G A B (octave 4)");
    /// ```
    #[error("Pitch {pitch} is not in {context}")]
    Lookup { pitch: String, context: String },

    /// A fill position outside the fill sequence.
    #[error("Fill position {index} is out of range for a fill of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Splitting at a nested motion, which has no single index to pivot on.
    #[error("Cannot split at fill position {index}: it holds a nested motion, not an index")]
    InvalidSplit { index: usize },

    /// A single note is longer than an empty bar.
    ///
    /// # Example
    /// ```
    /// # use motion::MotionError;
    /// let err = MotionError::CapacityOverflow {
    ///     duration: "3/2".to_string(),
    ///     capacity: "3/4".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Note of length 3/2 does not fit in a bar of capacity 3/4");
    /// ```
    #[error("Note of length {duration} does not fit in a bar of capacity {capacity}")]
    CapacityOverflow { duration: String, capacity: String },

    /// Adding note lengths gave a fraction too fine to represent exactly.
    #[error("Adding {duration} to {total} does not fit in an exact duration")]
    DurationOverflow { duration: String, total: String },

    #[error("Invalid pitch: {0}")]
    InvalidPitch(String),

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Invalid meter: {0}")]
    InvalidMeter(String),

    #[error("Invalid rhythm: {0}")]
    InvalidRhythm(String),

    #[error("Invalid tempo: {0} bpm")]
    InvalidTempo(u16),

    /// Invalid YAML motion document.
    #[error("Invalid motion document: {0}")]
    ConfigError(String),
}
