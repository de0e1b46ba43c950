// Arrangement Snapshot - Serializable export of a whole arrangement
// Bundles inputs, flattened events, and transport settings with a timestamp

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::blocks::{
    build_arranged_chord_events, total_beats, ArrangedChordEvent, ArrangementBlock,
    ArrangementError,
};
use crate::progression::Section;
use crate::timing::{self, TimeSignature};

/// Everything needed to restore or re-export an arrangement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangementSnapshot {
    pub exported_at: DateTime<Utc>,
    pub tempo: f64,

    /// Time signature as the host writes it (e.g., "3/4")
    pub time_signature: String,

    /// Beat where the last event ends
    pub total_beats: f64,

    pub block_count: usize,
    pub sections: Vec<Section>,
    pub blocks: Vec<ArrangementBlock>,
    pub events: Vec<ArrangedChordEvent>,
}

impl ArrangementSnapshot {
    /// Parsed time signature, falling back to 4 for unreadable parts
    pub fn signature(&self) -> TimeSignature {
        TimeSignature::parse_lenient(&self.time_signature)
    }
}

/// Flatten an arrangement and capture it with the current time
///
/// A missing or unusable tempo becomes 120 BPM and a missing time signature
/// becomes 4/4.
pub fn create_arrangement_snapshot(
    sections: &[Section],
    blocks: &[ArrangementBlock],
    tempo: Option<f64>,
    time_signature: Option<TimeSignature>,
) -> Result<ArrangementSnapshot, ArrangementError> {
    let events = build_arranged_chord_events(sections, blocks)?;

    let tempo = tempo
        .filter(|bpm| timing::is_valid_tempo(*bpm))
        .unwrap_or(timing::DEFAULT_TEMPO_BPM);
    let time_signature = time_signature.unwrap_or_default();

    Ok(ArrangementSnapshot {
        exported_at: Utc::now(),
        tempo,
        time_signature: time_signature.to_string(),
        total_beats: total_beats(&events),
        block_count: blocks.len(),
        sections: sections.to_vec(),
        blocks: blocks.to_vec(),
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::Chord;

    fn song() -> (Vec<Section>, Vec<ArrangementBlock>) {
        let sections = vec![
            Section::new("verse", "Verse").with_progression(vec![
                Chord::new(vec![60, 64, 67], 2.0),
                Chord::new(vec![65, 69, 72], 2.0),
            ]),
            Section::new("chorus", "Chorus")
                .with_progression(vec![Chord::new(vec![67, 71, 74], 4.0)]),
        ];
        let blocks = vec![
            ArrangementBlock::new("b1", "verse", 0.0).with_repeats(2),
            ArrangementBlock::new("b2", "chorus", 8.0),
        ];
        (sections, blocks)
    }

    #[test]
    fn test_snapshot_summarizes_arrangement() {
        let (sections, blocks) = song();
        let before = Utc::now();
        let snapshot = create_arrangement_snapshot(
            &sections,
            &blocks,
            Some(96.0),
            Some(TimeSignature::new(3, 4)),
        )
        .unwrap();

        assert!(snapshot.exported_at >= before);
        assert_eq!(snapshot.tempo, 96.0);
        assert_eq!(snapshot.time_signature, "3/4");
        assert_eq!(snapshot.signature(), TimeSignature::new(3, 4));
        assert_eq!(snapshot.block_count, 2);
        assert_eq!(snapshot.events.len(), 5);
        assert_eq!(snapshot.total_beats, 12.0);
        assert_eq!(snapshot.sections.len(), 2);
    }

    #[test]
    fn test_snapshot_defaults() {
        let (sections, blocks) = song();
        let snapshot = create_arrangement_snapshot(&sections, &blocks, None, None).unwrap();
        assert_eq!(snapshot.tempo, 120.0);
        assert_eq!(snapshot.time_signature, "4/4");

        let zero = create_arrangement_snapshot(&sections, &blocks, Some(0.0), None).unwrap();
        assert_eq!(zero.tempo, 120.0);

        let empty = create_arrangement_snapshot(&[], &[], None, None).unwrap();
        assert_eq!(empty.total_beats, 0.0);
        assert_eq!(empty.block_count, 0);
    }

    #[test]
    fn test_snapshot_propagates_missing_section() {
        let (sections, mut blocks) = song();
        blocks.push(ArrangementBlock::new("b3", "bridge", 12.0));
        assert!(matches!(
            create_arrangement_snapshot(&sections, &blocks, None, None),
            Err(ArrangementError::UnknownSection { .. })
        ));
    }

    #[test]
    fn test_snapshot_serializes_for_the_host() {
        let (sections, blocks) = song();
        let snapshot = create_arrangement_snapshot(&sections, &blocks, None, None).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json["exportedAt"].is_string());
        assert_eq!(json["timeSignature"], "4/4");
        assert_eq!(json["blockCount"], 2);
        assert_eq!(json["events"][0]["sectionName"], "Verse");

        let restored: ArrangementSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(restored.events.len(), snapshot.events.len());
    }
}
