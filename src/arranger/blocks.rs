// Arrangement Flattener - Places section progressions onto a song timeline
// Turns blocks of repeated sections into one absolute, time-ordered event list

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::midi::MidiError;
use crate::progression::{Chord, Section, DEFAULT_GATE_PERCENT, DEFAULT_VELOCITY};

/// Shortest chord length placed on the timeline, in beats
pub const MIN_CHORD_BEATS: f64 = 0.25;

/// Section name used when the host left it blank
const UNNAMED_SECTION: &str = "Section";

/// Errors that can occur while arranging sections
#[derive(Debug, Error)]
pub enum ArrangementError {
    #[error("Block {block_id} references unknown section {source_id}")]
    UnknownSection { block_id: String, source_id: String },

    #[error("MIDI encoding failed: {0}")]
    Midi(#[from] MidiError),
}

/// What a block's events drive on the device side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeId {
    #[default]
    Harmony,
    Drum,
    #[serde(other)]
    Other,
}

/// Placement of a section on the arrangement timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangementBlock {
    pub id: String,

    /// Id of the section this block plays
    pub source_id: String,

    #[serde(default)]
    pub mode: ModeId,

    /// MIDI channel 1-16
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_channel: Option<u8>,

    /// Absolute start position in beats
    pub start_beat: f64,

    /// Length of the block as drawn on the timeline
    #[serde(default)]
    pub length_beats: f64,

    #[serde(default)]
    pub label: String,

    /// Times the section plays back to back inside this block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeats: Option<u32>,
}

impl ArrangementBlock {
    /// Create a block playing `source_id` from `start_beat`
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, start_beat: f64) -> Self {
        ArrangementBlock {
            id: id.into(),
            source_id: source_id.into(),
            mode: ModeId::Harmony,
            midi_channel: None,
            start_beat,
            length_beats: 0.0,
            label: String::new(),
            repeats: None,
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.midi_channel = Some(channel);
        self
    }

    pub fn with_mode(mut self, mode: ModeId) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_repeats(mut self, repeats: u32) -> Self {
        self.repeats = Some(repeats);
        self
    }

    /// Number of passes through the section, at least one
    pub fn effective_repeats(&self) -> u32 {
        self.repeats.unwrap_or(1).max(1)
    }
}

/// One chord instance on the absolute timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangedChordEvent {
    pub block_id: String,
    pub section_id: String,
    pub section_name: String,
    pub mode: ModeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_channel: Option<u8>,

    /// Absolute start in beats
    pub start_beat: f64,

    pub duration_beats: f64,

    /// Notes clamped to 0-127
    pub notes: Vec<u8>,

    pub velocity: u8,

    /// Gate length in percent (1-200)
    pub gate_percent: f64,

    /// Strum delay in milliseconds
    pub strum_ms: f64,

    /// Position of the chord within its section's progression
    pub chord_index: usize,
}

impl ArrangedChordEvent {
    /// Beat where the event stops sounding (ignoring gate)
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration_beats
    }
}

/// Length a chord occupies on the arrangement timeline
pub fn chord_beats(chord: &Chord) -> f64 {
    if chord.duration.is_finite() {
        chord.duration.max(MIN_CHORD_BEATS)
    } else {
        MIN_CHORD_BEATS
    }
}

/// Total length of one pass through a section
pub fn section_beats(section: &Section) -> f64 {
    section.progression.iter().map(chord_beats).sum()
}

/// Flatten blocks of sections into one time-ordered event list
///
/// Blocks are visited in start order and each plays its section
/// `repeats` times back to back. Overlapping blocks each emit their own
/// events. The result is sorted by start beat; ties keep block order and
/// then chord order.
pub fn build_arranged_chord_events(
    sections: &[Section],
    blocks: &[ArrangementBlock],
) -> Result<Vec<ArrangedChordEvent>, ArrangementError> {
    let section_map: HashMap<&str, &Section> =
        sections.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut ordered: Vec<&ArrangementBlock> = blocks.iter().collect();
    ordered.sort_by(|a, b| {
        a.start_beat
            .partial_cmp(&b.start_beat)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut events = Vec::new();

    for block in ordered {
        let section = section_map.get(block.source_id.as_str()).ok_or_else(|| {
            log::warn!(
                "Block {} references missing section {}",
                block.id,
                block.source_id
            );
            ArrangementError::UnknownSection {
                block_id: block.id.clone(),
                source_id: block.source_id.clone(),
            }
        })?;

        place_block(block, section, &mut events);
    }

    events.sort_by(|a, b| {
        a.start_beat
            .partial_cmp(&b.start_beat)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::debug!(
        "Arranged {} block(s) into {} chord event(s)",
        blocks.len(),
        events.len()
    );

    Ok(events)
}

/// Emit every chord of every repeat of one block
fn place_block(block: &ArrangementBlock, section: &Section, events: &mut Vec<ArrangedChordEvent>) {
    let section_name = if section.name.is_empty() {
        UNNAMED_SECTION.to_string()
    } else {
        section.name.clone()
    };

    // Offset keeps growing across repeats
    let mut offset = 0.0;

    for _ in 0..block.effective_repeats() {
        for (chord_index, chord) in section.progression.iter().enumerate() {
            let duration_beats = chord_beats(chord);

            events.push(ArrangedChordEvent {
                block_id: block.id.clone(),
                section_id: section.id.clone(),
                section_name: section_name.clone(),
                mode: block.mode,
                midi_channel: block.midi_channel,
                start_beat: block.start_beat + offset,
                duration_beats,
                notes: chord.notes.iter().map(|&n| n.clamp(0, 127) as u8).collect(),
                velocity: chord_velocity(chord),
                gate_percent: chord_gate(chord),
                strum_ms: chord_strum(chord),
                chord_index,
            });

            offset += duration_beats;
        }
    }
}

fn chord_velocity(chord: &Chord) -> u8 {
    chord
        .first_velocity()
        .filter(|v| v.is_finite())
        .map(|v| v.round().clamp(0.0, 127.0) as u8)
        .unwrap_or(DEFAULT_VELOCITY)
}

fn chord_gate(chord: &Chord) -> f64 {
    chord
        .first_gate()
        .filter(|g| g.is_finite())
        .unwrap_or(DEFAULT_GATE_PERCENT)
        .clamp(1.0, 200.0)
}

fn chord_strum(chord: &Chord) -> f64 {
    chord
        .first_strum()
        .filter(|s| s.is_finite())
        .unwrap_or(0.0)
        .max(0.0)
}

/// Beat where the last event ends, zero for an empty list
pub fn total_beats(events: &[ArrangedChordEvent]) -> f64 {
    events
        .iter()
        .map(ArrangedChordEvent::end_beat)
        .fold(0.0, f64::max)
}
