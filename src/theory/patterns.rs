// Pattern Detector - Heuristic matching of known harmonic patterns
// Catalog is a read-only table; iteration order is declaration order

use serde::{Deserialize, Serialize};

use super::chords::{chord_notes, ChordQuality};
use crate::progression::Chord;

/// Semitone distance tolerated when matching a scale degree
pub const DEGREE_TOLERANCE: i32 = 1;

/// A named scale-degree sequence from the pattern catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternDefinition {
    /// Roman-numeral key (e.g., "I-IV-V-I")
    pub key: &'static str,

    /// Display name (e.g., "Perfect Cadence")
    pub name: &'static str,

    /// Scale degrees as semitones above the root
    pub sequence: &'static [i32],

    /// Chord quality built on each degree when the pattern is applied
    pub qualities: &'static [ChordQuality],
}

/// Built-in patterns, in match-priority order
pub const PATTERN_CATALOG: &[PatternDefinition] = &[
    PatternDefinition {
        key: "I-IV-V-I",
        name: "Perfect Cadence",
        sequence: &[0, 5, 7, 0],
        qualities: &[
            ChordQuality::Maj,
            ChordQuality::Maj,
            ChordQuality::Maj,
            ChordQuality::Maj,
        ],
    },
    PatternDefinition {
        key: "ii-V-I",
        name: "Jazz Cadence",
        sequence: &[2, 7, 0],
        qualities: &[ChordQuality::Min, ChordQuality::Dom7, ChordQuality::Maj],
    },
    PatternDefinition {
        key: "I-vi-IV-V",
        name: "Pop Progression",
        sequence: &[0, 9, 5, 7],
        qualities: &[
            ChordQuality::Maj,
            ChordQuality::Min,
            ChordQuality::Maj,
            ChordQuality::Maj,
        ],
    },
    PatternDefinition {
        key: "i-VI-III-VII",
        name: "Minor Pop",
        sequence: &[0, 9, 4, 11],
        qualities: &[
            ChordQuality::Min,
            ChordQuality::Maj,
            ChordQuality::Maj,
            ChordQuality::Maj,
        ],
    },
    PatternDefinition {
        key: "I-V-vi-IV",
        name: "Pop-punk",
        sequence: &[0, 7, 9, 5],
        qualities: &[
            ChordQuality::Maj,
            ChordQuality::Maj,
            ChordQuality::Min,
            ChordQuality::Maj,
        ],
    },
    PatternDefinition {
        key: "vi-IV-I-V",
        name: "Sensitive Female",
        sequence: &[9, 5, 0, 7],
        qualities: &[
            ChordQuality::Min,
            ChordQuality::Maj,
            ChordQuality::Maj,
            ChordQuality::Maj,
        ],
    },
];

/// A catalog pattern found in a progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    /// Display name of the matched pattern
    pub name: String,

    /// Catalog key of the matched pattern
    #[serde(rename = "type")]
    pub pattern_type: String,

    /// Fit of the pattern against the leading degrees [0.0, 1.0]
    pub confidence: f32,

    /// Degree index where the first matching window starts
    pub start_index: usize,
}

/// Scale degree of a note relative to `root`, always in 0..12
pub fn scale_degree(note: i32, root: i32) -> i32 {
    (note as i64 - root as i64).rem_euclid(12) as i32
}

/// Circular distance between two pitch classes
fn degree_distance(a: i32, b: i32) -> i32 {
    let diff = (a - b).rem_euclid(12);
    diff.min(12 - diff)
}

fn degrees_match(a: i32, b: i32) -> bool {
    degree_distance(a, b) <= DEGREE_TOLERANCE
}

/// Detect catalog patterns in a progression
///
/// All notes of all chords are flattened into one scale-degree sequence and
/// each catalog entry is slid over it. Results are sorted by confidence,
/// highest first; equal confidences keep catalog order.
pub fn detect_patterns(progression: &[Chord], root: i32) -> Vec<DetectedPattern> {
    if progression.len() < 2 {
        return Vec::new();
    }

    let degrees: Vec<i32> = progression
        .iter()
        .flat_map(|chord| chord.notes.iter())
        .map(|&note| scale_degree(note, root))
        .collect();

    let mut detected: Vec<DetectedPattern> = PATTERN_CATALOG
        .iter()
        .filter_map(|pattern| {
            find_window(&degrees, pattern.sequence).map(|start_index| DetectedPattern {
                name: pattern.name.to_string(),
                pattern_type: pattern.key.to_string(),
                confidence: calculate_confidence(&degrees, pattern.sequence),
                start_index,
            })
        })
        .collect();

    // Stable sort keeps catalog order among ties
    detected.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    log::debug!(
        "Detected {} pattern(s) across {} degrees",
        detected.len(),
        degrees.len()
    );

    detected
}

/// First window where every position matches within tolerance
fn find_window(degrees: &[i32], sequence: &[i32]) -> Option<usize> {
    if sequence.is_empty() || degrees.len() < sequence.len() {
        return None;
    }

    degrees.windows(sequence.len()).position(|window| {
        window
            .iter()
            .zip(sequence)
            .all(|(&d, &p)| degrees_match(d, p))
    })
}

/// Fraction of the leading positions that match the pattern
fn calculate_confidence(degrees: &[i32], sequence: &[i32]) -> f32 {
    let compared = degrees.len().min(sequence.len());
    if compared == 0 {
        return 0.0;
    }

    let matches = degrees
        .iter()
        .zip(sequence)
        .filter(|&(&d, &p)| degrees_match(d, p))
        .count();

    matches as f32 / compared as f32
}

/// Look up a catalog entry by key or display name (case-insensitive)
pub fn find_pattern(key_or_name: &str) -> Option<&'static PatternDefinition> {
    let needle = key_or_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    PATTERN_CATALOG
        .iter()
        .find(|p| p.key.to_lowercase() == needle || p.name.to_lowercase() == needle)
}

/// Build a progression from a catalog pattern
///
/// Each degree becomes a chord of the pattern's quality rooted at
/// `root + degree`. Returns `None` for unknown patterns.
pub fn apply_pattern(key_or_name: &str, root: i32, duration: f64) -> Option<Vec<Chord>> {
    let pattern = find_pattern(key_or_name)?;

    let chords = pattern
        .sequence
        .iter()
        .zip(pattern.qualities)
        .map(|(&degree, &quality)| {
            Chord::new(chord_notes(root.saturating_add(degree), quality), duration)
        })
        .collect();

    Some(chords)
}
