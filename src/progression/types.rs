// Progression types - Chords, sections, and their metadata
// Decodes host JSON leniently so malformed chords degrade instead of failing

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::theory::chords::ChordQuality;

/// Default per-beat MIDI velocity
pub const DEFAULT_VELOCITY: u8 = 100;

/// Default per-beat gate length in percent
pub const DEFAULT_GATE_PERCENT: f64 = 100.0;

/// A single chord in a progression
///
/// `notes` is kept in voice order as given by the host. Values are signed so
/// voicing transformations can move notes outside 0-127 before output clamps
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    /// MIDI note numbers that make up the chord
    #[serde(default, deserialize_with = "lenient_notes")]
    pub notes: Vec<i32>,

    /// Duration in beats
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: f64,

    /// Optional metadata about how the chord was built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ChordMetadata>,
}

impl Chord {
    /// Create a chord without metadata
    pub fn new(notes: Vec<i32>, duration: f64) -> Self {
        Chord {
            notes,
            duration,
            metadata: None,
        }
    }

    /// Attach metadata
    pub fn with_metadata(mut self, metadata: ChordMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Duration usable for timing, zero when the stored value is unusable
    pub fn effective_duration(&self) -> f64 {
        if self.duration.is_finite() && self.duration > 0.0 {
            self.duration
        } else {
            0.0
        }
    }

    /// Velocity of the first beat, if the chord carries one
    pub fn first_velocity(&self) -> Option<f64> {
        self.metadata
            .as_ref()
            .and_then(|m| m.velocities.as_ref())
            .and_then(|v| v.first().copied())
    }

    /// Gate percentage of the first beat, if the chord carries one
    pub fn first_gate(&self) -> Option<f64> {
        self.metadata
            .as_ref()
            .and_then(|m| m.gate.as_ref())
            .and_then(|v| v.first().copied())
    }

    /// Strum delay of the first beat, if the chord carries one
    pub fn first_strum(&self) -> Option<f64> {
        self.metadata
            .as_ref()
            .and_then(|m| m.strum.as_ref())
            .and_then(|v| v.first().copied())
    }
}

/// Metadata about how a chord was generated or voiced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordMetadata {
    /// Root note (MIDI number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<i32>,

    /// Chord quality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<ChordQuality>,

    /// Inversion number (0 = root position)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inversion: Option<u32>,

    /// Drop voicing level (0 = none, 1 = drop 2, 2 = drop 2&4, 3 = drop 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drop: Option<u32>,

    /// Per-beat MIDI velocities (index 0 = beat 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocities: Option<Vec<f64>>,

    /// Per-beat gate length in percent (<100 staccato, >100 legato)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Vec<f64>>,

    /// Per-beat strum delay in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strum: Option<Vec<f64>>,
}

/// Harmonic bridge played between sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    #[default]
    None,
    BackdoorDominant,
    Plagal,
    ModalBorrow,
}

/// Transition configuration for a section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionConfig {
    #[serde(rename = "type", default)]
    pub transition_type: TransitionType,

    /// Transition length in beats
    #[serde(default = "default_transition_length")]
    pub length: f64,
}

fn default_transition_length() -> f64 {
    2.0
}

impl Default for TransitionConfig {
    fn default() -> Self {
        TransitionConfig {
            transition_type: TransitionType::None,
            length: default_transition_length(),
        }
    }
}

/// A section of a song with its own progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,

    /// Display name (e.g., "Verse 1", "Chorus")
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub progression: Vec<Chord>,

    /// Times the section repeats on the song timeline
    #[serde(default = "default_repeats")]
    pub repeats: u32,

    #[serde(default = "default_beats_per_bar")]
    pub beats_per_bar: u32,

    /// Root currently held in live input mode
    #[serde(default)]
    pub root_held: Option<i32>,

    #[serde(default)]
    pub transitions: TransitionConfig,
}

fn default_repeats() -> u32 {
    1
}

fn default_beats_per_bar() -> u32 {
    4
}

impl Section {
    /// Create an empty section with default values
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Section {
            id: id.into(),
            name: name.into(),
            progression: Vec::new(),
            repeats: default_repeats(),
            beats_per_bar: default_beats_per_bar(),
            root_held: None,
            transitions: TransitionConfig::default(),
        }
    }

    /// Builder-style progression setter
    pub fn with_progression(mut self, progression: Vec<Chord>) -> Self {
        self.progression = progression;
        self
    }
}

/// `notes: null`, a non-array, or non-numeric elements never fail decoding
fn lenient_notes<'de, D>(deserializer: D) -> Result<Vec<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let notes = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_f64)
            .filter(|n| n.is_finite())
            .map(|n| n.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
            .collect(),
        _ => Vec::new(),
    };
    Ok(notes)
}

/// Non-numeric durations decode as zero
fn lenient_duration<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|d| d.is_finite()).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chord_decodes_host_json() {
        let chord: Chord = serde_json::from_value(json!({
            "notes": [60, 64, 67],
            "duration": 4,
            "metadata": { "root": 60, "quality": "Maj7", "velocities": [96, 90] }
        }))
        .unwrap();

        assert_eq!(chord.notes, vec![60, 64, 67]);
        assert_eq!(chord.duration, 4.0);
        assert_eq!(chord.first_velocity(), Some(96.0));
        assert_eq!(
            chord.metadata.unwrap().quality,
            Some(ChordQuality::Maj7)
        );
    }

    #[test]
    fn test_malformed_chords_degrade() {
        let chords: Vec<Chord> = serde_json::from_value(json!([
            { "notes": null, "duration": 4 },
            { "notes": [60, "x", 64], "duration": "invalid" },
            { "duration": 2 }
        ]))
        .unwrap();

        assert!(chords[0].notes.is_empty());
        assert_eq!(chords[0].duration, 4.0);
        assert_eq!(chords[1].notes, vec![60, 64]);
        assert_eq!(chords[1].duration, 0.0);
        assert!(chords[2].notes.is_empty());
    }

    #[test]
    fn test_effective_duration() {
        assert_eq!(Chord::new(vec![60], 2.5).effective_duration(), 2.5);
        assert_eq!(Chord::new(vec![60], -1.0).effective_duration(), 0.0);
        assert_eq!(Chord::new(vec![60], f64::NAN).effective_duration(), 0.0);
    }

    #[test]
    fn test_section_defaults() {
        let section: Section = serde_json::from_value(json!({
            "id": "sec-a",
            "name": "Verse",
            "progression": [{ "notes": [60], "duration": 1 }]
        }))
        .unwrap();

        assert_eq!(section.repeats, 1);
        assert_eq!(section.beats_per_bar, 4);
        assert_eq!(section.root_held, None);
        assert_eq!(section.transitions.transition_type, TransitionType::None);
    }

    #[test]
    fn test_transition_config_decodes() {
        let config: TransitionConfig =
            serde_json::from_value(json!({ "type": "backdoor_dominant", "length": 1 })).unwrap();
        assert_eq!(config.transition_type, TransitionType::BackdoorDominant);
        assert_eq!(config.length, 1.0);
    }
}
