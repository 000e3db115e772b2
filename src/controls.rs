//! Control tables — the strings and semitone keys a touch can land on.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const STRING_PREFIX: &str = "string-";
pub const SEMITONE_PREFIX: &str = "semitone-";

/// Highest pitch a layout may produce. Stays below Nyquist at the common
/// 44.1/48 kHz sample rates.
pub const MAX_PITCH_HZ: f64 = 20_000.0;

/// What kind of control an element id names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    String,
    Semitone,
}

impl ControlKind {
    /// Classify a control id by its prefix. Returns `None` for ids that
    /// are not instrument controls at all.
    pub fn of(id: &str) -> Option<ControlKind> {
        if id.starts_with(STRING_PREFIX) {
            Some(ControlKind::String)
        } else if id.starts_with(SEMITONE_PREFIX) {
            Some(ControlKind::Semitone)
        } else {
            None
        }
    }
}

/// An instrument string with a fixed open pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringControl {
    pub id: String,
    /// Base frequency in Hz.
    pub frequency: f64,
}

/// A semitone key, raising the held string by `offset` semitones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemitoneControl {
    pub id: String,
    pub offset: u8,
}

/// The full set of touchable controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLayout {
    pub strings: Vec<StringControl>,
    pub semitones: Vec<SemitoneControl>,
}

impl Default for ControlLayout {
    fn default() -> Self {
        let strings = [
            ("string-A", 65.4), // A3
            ("string-D", 98.0), // D3
            ("string-G", 146.0), // G3
            ("string-C", 220.0), // C3
        ]
        .into_iter()
        .map(|(id, frequency)| StringControl {
            id: id.to_string(),
            frequency,
        })
        .collect();

        let semitones = (1..=6)
            .map(|offset| SemitoneControl {
                id: format!("{SEMITONE_PREFIX}{offset}"),
                offset,
            })
            .collect();

        ControlLayout { strings, semitones }
    }
}

impl ControlLayout {
    /// Base frequency of the string with this id.
    pub fn string_frequency(&self, id: &str) -> Option<f64> {
        self.strings
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.frequency)
    }

    /// Semitone offset of the key with this id.
    pub fn semitone_offset(&self, id: &str) -> Option<u8> {
        self.semitones.iter().find(|s| s.id == id).map(|s| s.offset)
    }

    /// Check ids, frequencies and offsets.
    ///
    /// Ids must carry the prefix of their kind (touches are classified by
    /// prefix), must be unique, frequencies must be finite and positive, and
    /// offsets must be non-zero (zero means "no semitone held"). No string
    /// and semitone combination may exceed `MAX_PITCH_HZ`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for s in &self.strings {
            if ControlKind::of(&s.id) != Some(ControlKind::String) {
                return Err(ConfigError::WrongPrefix {
                    id: s.id.clone(),
                    expected: STRING_PREFIX,
                });
            }
            if !s.frequency.is_finite() || s.frequency <= 0.0 || s.frequency > MAX_PITCH_HZ {
                return Err(ConfigError::InvalidFrequency {
                    id: s.id.clone(),
                    frequency: s.frequency,
                });
            }
            if !seen.insert(s.id.as_str()) {
                return Err(ConfigError::DuplicateControl { id: s.id.clone() });
            }
        }

        for s in &self.semitones {
            if ControlKind::of(&s.id) != Some(ControlKind::Semitone) {
                return Err(ConfigError::WrongPrefix {
                    id: s.id.clone(),
                    expected: SEMITONE_PREFIX,
                });
            }
            if s.offset == 0 {
                return Err(ConfigError::InvalidOffset {
                    id: s.id.clone(),
                    offset: s.offset,
                });
            }
            if !seen.insert(s.id.as_str()) {
                return Err(ConfigError::DuplicateControl { id: s.id.clone() });
            }
        }

        let highest_string = self
            .strings
            .iter()
            .max_by(|a, b| a.frequency.total_cmp(&b.frequency));
        let highest_semitone = self.semitones.iter().max_by_key(|s| s.offset);
        if let (Some(string), Some(semitone)) = (highest_string, highest_semitone) {
            let frequency = equal_tempered(string.frequency, semitone.offset);
            if frequency > MAX_PITCH_HZ {
                return Err(ConfigError::PitchOutOfRange {
                    string: string.id.clone(),
                    semitone: semitone.id.clone(),
                    frequency,
                });
            }
        }

        Ok(())
    }
}

/// Raise `base` by `semitones` equal-tempered steps: `base * 2^(n/12)`.
pub fn equal_tempered(base: f64, semitones: u8) -> f64 {
    base * (2.0_f64).powf(semitones as f64 / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_prefix() {
        assert_eq!(ControlKind::of("string-A"), Some(ControlKind::String));
        assert_eq!(ControlKind::of("semitone-3"), Some(ControlKind::Semitone));
        assert_eq!(ControlKind::of("start"), None);
        assert_eq!(ControlKind::of(""), None);
    }

    #[test]
    fn default_tables() {
        let layout = ControlLayout::default();
        assert_eq!(layout.string_frequency("string-A"), Some(65.4));
        assert_eq!(layout.string_frequency("string-D"), Some(98.0));
        assert_eq!(layout.string_frequency("string-G"), Some(146.0));
        assert_eq!(layout.string_frequency("string-C"), Some(220.0));
        assert_eq!(layout.string_frequency("string-E"), None);

        for n in 1..=6u8 {
            assert_eq!(layout.semitone_offset(&format!("semitone-{n}")), Some(n));
        }
        assert_eq!(layout.semitone_offset("semitone-7"), None);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn equal_tempered_steps() {
        assert_eq!(equal_tempered(98.0, 0), 98.0);
        assert!((equal_tempered(65.4, 1) - 69.29).abs() < 0.01);
        assert!((equal_tempered(98.0, 3) - 116.54).abs() < 0.01);
        assert!((equal_tempered(220.0, 12) - 440.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_wrong_prefix() {
        let mut layout = ControlLayout::default();
        layout.strings[0].id = "semitone-9".to_string();
        assert_eq!(
            layout.validate(),
            Err(ConfigError::WrongPrefix {
                id: "semitone-9".to_string(),
                expected: STRING_PREFIX,
            })
        );
    }

    #[test]
    fn rejects_bad_frequency_and_offset() {
        let mut layout = ControlLayout::default();
        layout.strings[1].frequency = 0.0;
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidFrequency { .. })
        ));

        let mut layout = ControlLayout::default();
        layout.semitones[0].offset = 0;
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidOffset { .. })
        ));
    }

    #[test]
    fn rejects_pitches_above_range() {
        let mut layout = ControlLayout::default();
        layout.strings.push(StringControl {
            id: "string-X".to_string(),
            frequency: 100_000.0,
        });
        assert!(matches!(
            layout.validate(),
            Err(ConfigError::InvalidFrequency { .. })
        ));

        let mut layout = ControlLayout::default();
        layout.semitones.push(SemitoneControl {
            id: "semitone-255".to_string(),
            offset: 255,
        });
        assert_eq!(
            layout.validate().map_err(|e| match e {
                ConfigError::PitchOutOfRange { string, semitone, .. } => (string, semitone),
                other => panic!("unexpected error {other:?}"),
            }),
            Err(("string-C".to_string(), "semitone-255".to_string()))
        );

        // Two octaves up from C3 is still in range.
        let mut layout = ControlLayout::default();
        layout.semitones.push(SemitoneControl {
            id: "semitone-24".to_string(),
            offset: 24,
        });
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn rejects_duplicates() {
        let mut layout = ControlLayout::default();
        layout.semitones.push(SemitoneControl {
            id: "semitone-2".to_string(),
            offset: 7,
        });
        assert_eq!(
            layout.validate(),
            Err(ConfigError::DuplicateControl {
                id: "semitone-2".to_string()
            })
        );
    }
}
