// OSC projection - Message-ready note lists for the Live device
// Shapes only; sending is the host's job

use serde::{Deserialize, Serialize};

use super::blocks::ArrangedChordEvent;
use crate::progression::{Chord, DEFAULT_VELOCITY};

/// A chord slot in a gap-free OSC progression; empty notes mean silence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscProgressionChord {
    pub notes: Vec<u8>,

    /// Length in beats
    pub duration: f64,
}

/// A single note as the device's clip builder expects it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OscNote {
    pub pitch: u8,

    /// Start in beats from the clip start
    pub start_time: f64,

    /// Length in beats
    pub duration: f64,

    pub velocity: u8,
}

/// Project arranged events onto a contiguous, duration-additive list
///
/// Whenever the next event starts after the running cursor, the gap is
/// filled with an empty-notes entry. Overlapping events are kept as-is.
pub fn to_osc_progression(events: &[ArrangedChordEvent]) -> Vec<OscProgressionChord> {
    let mut sorted: Vec<&ArrangedChordEvent> = events.iter().collect();
    sorted.sort_by(|a, b| {
        a.start_beat
            .partial_cmp(&b.start_beat)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut progression = Vec::with_capacity(sorted.len());
    let mut cursor = 0.0;

    for event in sorted {
        if event.start_beat > cursor {
            progression.push(OscProgressionChord {
                notes: Vec::new(),
                duration: event.start_beat - cursor,
            });
            cursor = event.start_beat;
        }

        progression.push(OscProgressionChord {
            notes: event.notes.clone(),
            duration: event.duration_beats,
        });
        cursor += event.duration_beats;
    }

    progression
}

/// Flatten a progression into notes, chords played back to back from beat 0
pub fn to_osc_notes(progression: &[Chord]) -> Vec<OscNote> {
    let mut notes = Vec::new();
    let mut current_beat = 0.0;

    for chord in progression {
        let duration = chord.effective_duration();
        let velocity = chord
            .first_velocity()
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(0.0, 127.0) as u8)
            .unwrap_or(DEFAULT_VELOCITY);

        for &pitch in &chord.notes {
            notes.push(OscNote {
                pitch: pitch.clamp(0, 127) as u8,
                start_time: current_beat,
                duration,
                velocity,
            });
        }
        current_beat += duration;
    }

    notes
}

/// Flatten arranged events into notes at their absolute positions
pub fn arranged_osc_notes(events: &[ArrangedChordEvent]) -> Vec<OscNote> {
    events
        .iter()
        .flat_map(|event| {
            event.notes.iter().map(move |&pitch| OscNote {
                pitch,
                start_time: event.start_beat,
                duration: event.duration_beats,
                velocity: event.velocity,
            })
        })
        .collect()
}

/// Argument list `[pitch, start, duration, velocity, ...]` for the router
pub fn flatten_osc_notes(notes: &[OscNote]) -> Vec<f64> {
    notes
        .iter()
        .flat_map(|n| {
            [
                n.pitch as f64,
                n.start_time,
                n.duration,
                n.velocity as f64,
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arranger::blocks::ModeId;

    fn event(
        block_id: &str,
        start_beat: f64,
        duration_beats: f64,
        notes: Vec<u8>,
    ) -> ArrangedChordEvent {
        ArrangedChordEvent {
            block_id: block_id.to_string(),
            section_id: "s".to_string(),
            section_name: "A".to_string(),
            mode: ModeId::Harmony,
            midi_channel: Some(1),
            start_beat,
            duration_beats,
            notes,
            velocity: 100,
            gate_percent: 100.0,
            strum_ms: 0.0,
            chord_index: 0,
        }
    }

    fn note(pitch: u8, start_time: f64, duration: f64, velocity: u8) -> OscNote {
        OscNote {
            pitch,
            start_time,
            duration,
            velocity,
        }
    }

    #[test]
    fn test_gaps_become_empty_entries() {
        let events = vec![
            event("b1", 0.0, 1.0, vec![60, 64, 67]),
            event("b2", 3.0, 1.0, vec![65, 69, 72]),
        ];

        let progression = to_osc_progression(&events);
        assert_eq!(progression.len(), 3);
        assert!(progression[1].notes.is_empty());
        assert_eq!(progression[1].duration, 2.0);
        assert_eq!(progression[2].notes, vec![65, 69, 72]);

        // Durations add up to the end of the last event
        let total: f64 = progression.iter().map(|c| c.duration).sum();
        assert_eq!(total, 4.0);
    }

    #[test]
    fn test_leading_gap_and_unsorted_input() {
        let events = vec![
            event("late", 4.0, 2.0, vec![62]),
            event("early", 2.0, 2.0, vec![60]),
        ];

        let progression = to_osc_progression(&events);
        assert_eq!(progression.len(), 3);
        assert!(progression[0].notes.is_empty());
        assert_eq!(progression[0].duration, 2.0);
        assert_eq!(progression[1].notes, vec![60]);
        assert_eq!(progression[2].notes, vec![62]);
    }

    #[test]
    fn test_contiguous_events_have_no_gaps() {
        let events = vec![event("a", 0.0, 2.0, vec![60]), event("b", 2.0, 2.0, vec![62])];
        assert_eq!(to_osc_progression(&events).len(), 2);
        assert!(to_osc_progression(&[]).is_empty());
    }

    #[test]
    fn test_progression_to_osc_notes() {
        let progression = vec![
            Chord::new(vec![60, 64, 67], 4.0),
            Chord::new(vec![62, 65, 69], 4.0),
        ];

        let notes = to_osc_notes(&progression);
        assert_eq!(notes.len(), 6);
        assert_eq!(notes[0], note(60, 0.0, 4.0, 100));
        assert_eq!(notes[3], note(62, 4.0, 4.0, 100));
    }

    #[test]
    fn test_arranged_osc_notes_use_absolute_time() {
        let events = vec![event("b", 8.0, 2.0, vec![36, 42])];
        let notes = arranged_osc_notes(&events);

        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.start_time == 8.0 && n.duration == 2.0));
    }

    #[test]
    fn test_flatten_osc_notes() {
        let notes = vec![
            note(60, 0.0, 2.0, 100),
            note(64, 2.0, 1.5, 90),
        ];
        assert_eq!(
            flatten_osc_notes(&notes),
            vec![60.0, 0.0, 2.0, 100.0, 64.0, 2.0, 1.5, 90.0]
        );
    }

    #[test]
    fn test_osc_note_serializes_camel_case() {
        let json = serde_json::to_value(note(60, 0.0, 4.0, 100)).unwrap();
        assert_eq!(json["startTime"], 0.0);
        assert_eq!(json["pitch"], 60);
    }
}
