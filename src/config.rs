//! # Motion Documents
//!
//! A motion can be described in YAML and turned into a [`Motion`] plus the
//! meter, tempo and channel to play it with.
//!
//! ```yaml
//! title: Ascending C major
//! key: C
//! mode: ionian
//! octave: 4
//! ante: 1
//! cons: 7
//! fill: interval
//! rhythm: swung
//! meter: 4/4
//! tempo: 90
//! ```
//!
//! ## Contexts
//! At most one of `key` (with optional `mode`), `scale`, `chord` or `tones`.
//! With none of them the context is C Ionian.
//!
//! ## Fill
//! - `interval` - every index between `ante` and `cons`
//! - a list of indices, where any entry may itself be a nested motion
//!   document (which inherits the parent's context unless it names its own)
//!
//! `skip` drops fill positions after the fill is built.
//!
//! A nested document only describes its notes: `meter`, `tempo` and
//! `channel` belong to the top level, and `octave` needs a context of its own.
//!
//! ## Limits
//! Indices stay within `-10000..=10000` and octaves within `-100..=100`.
//!
//! ## Rhythm
//! `even` (default), `swung`, or a list of note-value denominators cycled
//! over the notes (`[2, 4, 4]` is half, quarter, quarter, half, ...).

use serde::Deserialize;
use std::sync::Arc;

use crate::context::{ChordContext, MusicalContext, ScaleContext, ScaleMode};
use crate::duration::{Duration, Meter};
use crate::error::MotionError;
use crate::motion::{Fill, Motion};
use crate::rhythm::Rhythm;

const DEFAULT_OCTAVE: i32 = 4;
const DEFAULT_TEMPO: u16 = 90;
const DEFAULT_CHANNEL: u8 = 1;
const MAX_INDEX: i32 = 10_000;
const MAX_OCTAVE: i32 = 100;

/// Raw motion document for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub title: Option<String>,
    pub key: Option<String>,
    pub mode: Option<String>,
    pub scale: Option<Vec<String>>,
    pub chord: Option<String>,
    pub tones: Option<Vec<String>>,
    pub octave: Option<i32>,
    pub ante: i32,
    pub cons: i32,
    pub fill: Option<RawFill>,
    pub skip: Option<Vec<usize>>,
    pub rhythm: Option<RawRhythm>,
    pub meter: Option<String>,
    pub tempo: Option<u16>,
    pub channel: Option<u8>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RawFill {
    Keyword(String),
    Elements(Vec<RawFillElement>),
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RawFillElement {
    Index(i32),
    Motion(Box<RawConfig>),
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum RawRhythm {
    Named(String),
    Denominators(Vec<u64>),
}

/// A motion document after validation
#[derive(Debug, Clone)]
pub struct MotionConfig {
    pub title: Option<String>,
    pub motion: Motion,
    pub meter: Meter,
    pub tempo: u16,
    pub channel: u8,
}

/// Parse and validate a YAML motion document.
///
/// # Example
/// ```
/// use motion::parse_config;
///
/// let config = parse_config("ante: 0\ncons: 4\nfill: interval\n")?;
/// assert_eq!(config.motion.note_count(), 5);
/// assert_eq!(config.tempo, 90);
/// # Ok::<(), motion::MotionError>(())
/// ```
pub fn parse_config(source: &str) -> Result<MotionConfig, MotionError> {
    let raw: RawConfig =
        serde_yaml::from_str(source).map_err(|e| MotionError::ConfigError(e.to_string()))?;
    MotionConfig::from_raw(&raw)
}

impl MotionConfig {
    pub fn from_raw(raw: &RawConfig) -> Result<Self, MotionError> {
        let meter = match &raw.meter {
            Some(meter) => meter.parse()?,
            None => Meter::default(),
        };
        let tempo = raw.tempo.unwrap_or(DEFAULT_TEMPO);
        if tempo == 0 {
            return Err(MotionError::InvalidTempo(tempo));
        }

        Ok(Self {
            title: raw.title.clone(),
            motion: build_motion(raw, None, meter)?,
            meter,
            tempo,
            channel: raw.channel.unwrap_or(DEFAULT_CHANNEL),
        })
    }
}

fn check_index(field: &str, index: i32) -> Result<i32, MotionError> {
    if !(-MAX_INDEX..=MAX_INDEX).contains(&index) {
        return Err(MotionError::ConfigError(format!(
            "{} {} is outside -{}..={}",
            field, index, MAX_INDEX, MAX_INDEX
        )));
    }
    Ok(index)
}

/// Top-level settings a nested document cannot override.
fn check_nested(raw: &RawConfig) -> Result<(), MotionError> {
    let ignored = [
        ("meter", raw.meter.is_some()),
        ("tempo", raw.tempo.is_some()),
        ("channel", raw.channel.is_some()),
    ];
    if let Some((field, _)) = ignored.iter().find(|(_, given)| *given) {
        return Err(MotionError::ConfigError(format!(
            "{} can only be set on the top-level motion",
            field
        )));
    }
    Ok(())
}

fn build_motion(
    raw: &RawConfig,
    inherited: Option<&Arc<dyn MusicalContext>>,
    meter: Meter,
) -> Result<Motion, MotionError> {
    if inherited.is_some() {
        check_nested(raw)?;
    }
    let context: Arc<dyn MusicalContext> = match (build_context(raw)?, inherited) {
        (Some(context), _) => context,
        (None, Some(_)) if raw.octave.is_some() => {
            return Err(MotionError::ConfigError(
                "a nested motion with an octave needs its own key, scale, chord or tones"
                    .to_string(),
            ))
        }
        (None, Some(parent)) => Arc::clone(parent),
        (None, None) => Arc::new(ScaleContext::from_key(
            "C",
            ScaleMode::Ionian,
            raw.octave.unwrap_or(DEFAULT_OCTAVE),
        )?),
    };

    let ante = check_index("ante", raw.ante)?;
    let cons = check_index("cons", raw.cons)?;
    let mut motion = Motion::new(ante, cons, Arc::clone(&context))
        .with_rhythm(build_rhythm(raw.rhythm.as_ref(), meter)?);

    motion = match &raw.fill {
        None => motion,
        Some(RawFill::Keyword(keyword)) if keyword == "interval" => motion.fill_interval(),
        Some(RawFill::Keyword(keyword)) => {
            return Err(MotionError::ConfigError(format!(
                "unknown fill '{}', expected 'interval' or a list",
                keyword
            )))
        }
        Some(RawFill::Elements(elements)) => {
            let fill = elements
                .iter()
                .map(|element| match element {
                    RawFillElement::Index(index) => check_index("fill index", *index).map(Fill::Index),
                    RawFillElement::Motion(nested) => {
                        build_motion(nested, Some(&context), meter).map(Fill::Motion)
                    }
                })
                .collect::<Result<Vec<_>, MotionError>>()?;
            motion.with_fill(fill)
        }
    };

    match &raw.skip {
        Some(positions) => motion.skip(positions),
        None => Ok(motion),
    }
}

/// The context named by the document, or `None` if it names none.
fn build_context(raw: &RawConfig) -> Result<Option<Arc<dyn MusicalContext>>, MotionError> {
    let sources = [
        raw.key.is_some(),
        raw.scale.is_some(),
        raw.chord.is_some(),
        raw.tones.is_some(),
    ];
    if sources.iter().filter(|given| **given).count() > 1 {
        return Err(MotionError::ConfigError(
            "only one of key, scale, chord or tones may be given".to_string(),
        ));
    }
    if raw.mode.is_some() && (raw.scale.is_some() || raw.chord.is_some() || raw.tones.is_some()) {
        return Err(MotionError::ConfigError(
            "mode can only be combined with key".to_string(),
        ));
    }

    let octave = raw.octave.unwrap_or(DEFAULT_OCTAVE);
    if !(-MAX_OCTAVE..=MAX_OCTAVE).contains(&octave) {
        return Err(MotionError::ConfigError(format!(
            "octave {} is outside -{}..={}",
            octave, MAX_OCTAVE, MAX_OCTAVE
        )));
    }
    let context: Arc<dyn MusicalContext> = if let Some(degrees) = &raw.scale {
        Arc::new(ScaleContext::new(degrees.iter().cloned(), octave)?)
    } else if let Some(symbol) = &raw.chord {
        Arc::new(ChordContext::from_symbol(symbol, octave)?)
    } else if let Some(tones) = &raw.tones {
        Arc::new(ChordContext::new(tones.iter().cloned(), octave)?)
    } else if raw.key.is_some() || raw.mode.is_some() {
        let mode = match &raw.mode {
            Some(name) => ScaleMode::from_str(name)
                .ok_or_else(|| MotionError::ConfigError(format!("unknown mode '{}'", name)))?,
            None => ScaleMode::default(),
        };
        Arc::new(ScaleContext::from_key(
            raw.key.as_deref().unwrap_or("C"),
            mode,
            octave,
        )?)
    } else {
        return Ok(None);
    };
    Ok(Some(context))
}

fn build_rhythm(raw: Option<&RawRhythm>, meter: Meter) -> Result<Rhythm, MotionError> {
    match raw {
        None => Ok(Rhythm::Even(meter)),
        Some(RawRhythm::Named(name)) => match name.trim().to_lowercase().as_str() {
            "even" => Ok(Rhythm::Even(meter)),
            "swung" | "swing" => Ok(Rhythm::Swung(meter)),
            _ => Err(MotionError::InvalidRhythm(format!("unknown rhythm '{}'", name))),
        },
        Some(RawRhythm::Denominators(denominators)) => {
            let durations = denominators
                .iter()
                .map(|den| {
                    Duration::note(*den).ok_or_else(|| {
                        MotionError::InvalidRhythm(format!("invalid note value {}", den))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Rhythm::pattern(durations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(motion: &Motion) -> Vec<String> {
        motion.notes().map(|note| note.pitch.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = parse_config("ante: 0\ncons: 2\n").unwrap();
        assert_eq!(config.meter, Meter::default());
        assert_eq!(config.tempo, 90);
        assert_eq!(config.channel, 1);
        assert!(config.title.is_none());
        assert_eq!(labels(&config.motion), ["C-4", "E-4"]);
    }

    #[test]
    fn test_full_document() {
        let source = r#"
title: Swung D major
key: D
mode: ionian
octave: 3
ante: 0
cons: 4
fill: interval
skip: [1]
rhythm: swung
meter: 3/4
tempo: 120
channel: 2
"#;
        let config = parse_config(source).unwrap();
        assert_eq!(config.title.as_deref(), Some("Swung D major"));
        assert_eq!(config.meter, Meter::new(3, 4).unwrap());
        assert_eq!(config.tempo, 120);
        assert_eq!(config.channel, 2);
        assert_eq!(config.motion.fill_indices(), [1, 3]);
        assert_eq!(labels(&config.motion), ["D-3", "E-3", "G-3", "A-3"]);
        assert_eq!(**config.motion.rhythm(), Rhythm::Swung(config.meter));
    }

    #[test]
    fn test_chord_and_tones() {
        let chord = parse_config("chord: G7\nante: 0\ncons: 4\nfill: interval\n").unwrap();
        assert_eq!(labels(&chord.motion), ["G-4", "B-4", "D-4", "F-4", "G-5"]);

        let tones = parse_config("tones: [C, E, G]\nante: 4\ncons: 0\n").unwrap();
        assert_eq!(labels(&tones.motion), ["E-5", "C-4"]);
    }

    #[test]
    fn test_custom_scale() {
        let source = "scale: [Sa, Re, Ga, Ma, Pa, Dha, Ni]\nante: 6\ncons: 7\n";
        let config = parse_config(source).unwrap();
        assert_eq!(labels(&config.motion), ["Ni-4", "Sa-5"]);
    }

    #[test]
    fn test_fill_list_with_nested_motion() {
        let source = r#"
ante: 0
cons: 4
fill:
  - 2
  - chord: C
    octave: 5
    ante: 0
    cons: 2
  - 3
"#;
        let config = parse_config(source).unwrap();
        assert_eq!(
            labels(&config.motion),
            ["C-4", "E-4", "C-5", "G-5", "F-4", "G-4"]
        );
    }

    #[test]
    fn test_nested_motion_inherits_context() {
        let source = "key: F\nante: 0\ncons: 1\nfill:\n  - ante: 3\n    cons: 4\n";
        let config = parse_config(source).unwrap();
        assert_eq!(labels(&config.motion), ["F-4", "Bb-4", "C-4", "G-4"]);
    }

    #[test]
    fn test_rhythm_pattern() {
        let config = parse_config("ante: 0\ncons: 3\nfill: interval\nrhythm: [2, 4]\n").unwrap();
        let durations: Vec<String> = config
            .motion
            .notes()
            .map(|note| note.duration.to_string())
            .collect();
        assert_eq!(durations, ["1/2", "1/4", "1/2", "1/4"]);
    }

    #[test]
    fn test_errors() {
        let cases = [
            "ante: 0\n",
            "ante: 0\ncons: 1\nbogus: true\n",
            "key: C\nchord: G\nante: 0\ncons: 1\n",
            "scale: [C, D, E, F, G, A, B]\nmode: dorian\nante: 0\ncons: 1\n",
            "mode: bluesy\nante: 0\ncons: 1\n",
            "ante: 0\ncons: 1\nfill: scattered\n",
            "ante: 0\ncons: 1\nrhythm: waltz\n",
            "ante: 0\ncons: 1\nrhythm: [4, 0]\n",
            "ante: 0\ncons: 1\nmeter: 4\n",
            "ante: 0\ncons: 1\ntempo: 0\n",
            "ante: 0\ncons: 3\nfill: interval\nskip: [4]\n",
            "chord: Cwhatever\nante: 0\ncons: 1\n",
        ];
        for source in cases {
            assert!(parse_config(source).is_err(), "should fail: {:?}", source);
        }
    }

    #[test]
    fn test_out_of_range_numbers_are_rejected() {
        let cases = [
            "ante: 2147483647\ncons: 2147483647\nfill: interval\n",
            "ante: -2147483648\ncons: 0\n",
            "ante: 0\ncons: 10001\n",
            "ante: 0\ncons: 1\nfill: [5, 20000]\n",
            "octave: 2147483647\nante: 0\ncons: 7\n",
            "key: C\noctave: -101\nante: 0\ncons: 7\n",
        ];
        for source in cases {
            assert!(
                matches!(parse_config(source), Err(MotionError::ConfigError(_))),
                "should fail: {:?}",
                source
            );
        }

        let wide = parse_config("ante: -10000\ncons: 10000\nfill: interval\n").unwrap();
        assert_eq!(wide.motion.fill().len(), 19_999);
    }

    #[test]
    fn test_nested_motion_cannot_set_top_level_fields() {
        let cases = [
            "ante: 0\ncons: 4\nfill:\n  - octave: 5\n    ante: 0\n    cons: 2\n",
            "ante: 0\ncons: 4\nfill:\n  - tempo: 60\n    ante: 0\n    cons: 2\n",
            "ante: 0\ncons: 4\nfill:\n  - meter: 3/4\n    ante: 0\n    cons: 2\n",
        ];
        for source in cases {
            assert!(
                matches!(parse_config(source), Err(MotionError::ConfigError(_))),
                "should fail: {:?}",
                source
            );
        }

        let own_key = "ante: 0\ncons: 4\nfill:\n  - key: G\n    octave: 5\n    ante: 0\n    cons: 2\n";
        let config = parse_config(own_key).unwrap();
        assert_eq!(labels(&config.motion), ["C-4", "G-5", "B-5", "G-4"]);
    }

    #[test]
    fn test_yaml_errors_are_config_errors() {
        let err = parse_config("ante: [").unwrap_err();
        assert!(matches!(err, MotionError::ConfigError(_)));
    }
}
