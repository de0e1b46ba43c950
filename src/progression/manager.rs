// Progression utilities - Duration, transposition, validation, and analysis
// Read-only helpers over host-owned progressions

use serde::{Deserialize, Serialize};

use super::types::{Chord, Section};
use crate::theory::chords::chord_name;
use crate::theory::voicing::get_voicing_description;

/// Lowest piano key (A0)
pub const PIANO_LOWEST: i32 = 21;

/// Highest piano key (C8)
pub const PIANO_HIGHEST: i32 = 108;

/// Harmonic tension level of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Energy {
    Low,
    Medium,
    High,
}

/// Total duration of a progression in beats
///
/// Unusable durations count as zero.
pub fn progression_duration(progression: &[Chord]) -> f64 {
    progression.iter().map(Chord::effective_duration).sum()
}

/// Expand sections into one progression, each played `repeats` times
///
/// A repeat count of zero plays the section once.
pub fn flatten_sections_with_repeats(sections: &[Section]) -> Vec<Chord> {
    sections
        .iter()
        .flat_map(|section| {
            let repeats = section.repeats.max(1) as usize;
            std::iter::repeat(&section.progression)
                .take(repeats)
                .flatten()
                .cloned()
        })
        .collect()
}

/// Shift every note (and recorded root) by `semitones`
pub fn transpose_progression(progression: &[Chord], semitones: i32) -> Vec<Chord> {
    progression
        .iter()
        .map(|chord| {
            let mut transposed = chord.clone();
            for note in &mut transposed.notes {
                *note = note.saturating_add(semitones);
            }
            if let Some(root) = transposed.metadata.as_mut().and_then(|m| m.root.as_mut()) {
                *root = root.saturating_add(semitones);
            }
            transposed
        })
        .collect()
}

/// Collect warnings about a progression; empty means nothing to report
pub fn validate_progression(progression: &[Chord]) -> Vec<String> {
    let mut warnings = Vec::new();

    if progression.is_empty() {
        warnings.push("Progression is empty".to_string());
        return warnings;
    }

    for (index, chord) in progression.iter().enumerate() {
        if chord.notes.is_empty() {
            warnings.push(format!("Chord {} has no notes", index + 1));
        }
        if chord.effective_duration() <= 0.0 {
            warnings.push(format!("Chord {} has invalid duration", index + 1));
        }
    }

    let all_notes = progression.iter().flat_map(|c| c.notes.iter().copied());
    let (min, max) = all_notes.fold((i32::MAX, i32::MIN), |(lo, hi), n| (lo.min(n), hi.max(n)));

    if min < PIANO_LOWEST {
        warnings.push("Contains notes below piano range (A0)".to_string());
    }
    if max > PIANO_HIGHEST {
        warnings.push("Contains notes above piano range (C8)".to_string());
    }

    warnings
}

/// Short description such as "CMaj7 - 1st Inversion", or "3 notes"
pub fn analyze_chord(chord: &Chord) -> String {
    let fallback = || format!("{} notes", chord.notes.len());

    let Some(metadata) = chord.metadata.as_ref() else {
        return fallback();
    };
    let (Some(root), Some(quality)) = (metadata.root, metadata.quality) else {
        return fallback();
    };

    format!(
        "{} - {}",
        chord_name(root, quality),
        get_voicing_description(metadata.inversion.unwrap_or(0), metadata.drop.unwrap_or(0))
    )
}

/// Estimate tension from chord size and tritones
///
/// Four-note chords add 2, five or more add 1 more, and every tritone
/// between a pair of notes adds 3. The average per chord decides the level.
pub fn analyze_section_energy(progression: &[Chord]) -> Energy {
    if progression.is_empty() {
        return Energy::Medium;
    }

    let score: u32 = progression.iter().map(chord_tension).sum();
    let average = score as f64 / progression.len() as f64;

    if average >= 3.0 {
        Energy::High
    } else if average >= 1.0 {
        Energy::Medium
    } else {
        Energy::Low
    }
}

fn chord_tension(chord: &Chord) -> u32 {
    let notes = &chord.notes;
    let mut score = 0;

    if notes.len() >= 4 {
        score += 2;
    }
    if notes.len() >= 5 {
        score += 1;
    }

    for (i, a) in notes.iter().enumerate() {
        for b in &notes[i + 1..] {
            if (*b as i64 - *a as i64).abs() % 12 == 6 {
                score += 3;
            }
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::ChordMetadata;
    use crate::theory::ChordQuality;

    #[test]
    fn test_progression_duration() {
        let progression = vec![
            Chord::new(vec![60], 2.0),
            Chord::new(vec![62], 1.5),
            Chord::new(vec![64], f64::NAN),
        ];
        assert_eq!(progression_duration(&progression), 3.5);
    }

    #[test]
    fn test_flatten_sections_with_repeats() {
        let mut verse = Section::new("verse", "Verse").with_progression(vec![
            Chord::new(vec![60, 64, 67], 2.0),
            Chord::new(vec![65, 69, 72], 2.0),
        ]);
        let mut chorus = Section::new("chorus", "Chorus")
            .with_progression(vec![Chord::new(vec![67, 71, 74], 4.0)]);

        // Default of one repeat
        let once = flatten_sections_with_repeats(&[verse.clone(), chorus.clone()]);
        let roots: Vec<i32> = once.iter().map(|c| c.notes[0]).collect();
        assert_eq!(roots, vec![60, 65, 67]);

        // Zero still plays the section once
        verse.repeats = 0;
        assert_eq!(flatten_sections_with_repeats(&[verse.clone()]).len(), 2);

        verse.repeats = 3;
        chorus.repeats = 1;
        let song = flatten_sections_with_repeats(&[verse, chorus]);
        let roots: Vec<i32> = song.iter().map(|c| c.notes[0]).collect();
        assert_eq!(roots, vec![60, 65, 60, 65, 60, 65, 67]);
        assert_eq!(progression_duration(&song), 16.0);

        assert!(flatten_sections_with_repeats(&[]).is_empty());
    }

    #[test]
    fn test_flattened_song_exports_to_midi() {
        let mut verse = Section::new("verse", "Verse")
            .with_progression(vec![Chord::new(vec![60, 64, 67], 1.0)]);
        verse.repeats = 2;

        let song = flatten_sections_with_repeats(&[verse]);
        let bytes = crate::midi::generate_midi_file(&song, 120.0, 4, 4).unwrap();
        let layout = crate::midi::read_track_layout(&bytes).unwrap();
        assert_eq!(layout.tracks[0].note_on_count, 6);
        assert_eq!(layout.tracks[0].length_ticks, 960);
    }

    #[test]
    fn test_transpose_progression() {
        let progression = vec![Chord::new(vec![60, 64, 67], 4.0).with_metadata(ChordMetadata {
            root: Some(60),
            ..Default::default()
        })];

        let up = transpose_progression(&progression, 2);
        assert_eq!(up[0].notes, vec![62, 66, 69]);
        assert_eq!(up[0].metadata.as_ref().unwrap().root, Some(62));

        // Input left untouched
        assert_eq!(progression[0].notes, vec![60, 64, 67]);
    }

    #[test]
    fn test_extreme_notes_never_panic() {
        let progression = vec![Chord::new(vec![i32::MIN, i32::MAX], 4.0)];

        let up = transpose_progression(&progression, 12);
        assert_eq!(up[0].notes, vec![i32::MIN + 12, i32::MAX]);
        let down = transpose_progression(&progression, -12);
        assert_eq!(down[0].notes, vec![i32::MIN, i32::MAX - 12]);

        assert_eq!(analyze_section_energy(&progression), Energy::Low);
        assert_eq!(validate_progression(&progression).len(), 2);
    }

    #[test]
    fn test_validate_progression() {
        assert_eq!(validate_progression(&[]), vec!["Progression is empty"]);

        let progression = vec![
            Chord::new(vec![], 4.0),
            Chord::new(vec![10, 60], 0.0),
            Chord::new(vec![110], 1.0),
        ];
        let warnings = validate_progression(&progression);
        assert!(warnings.contains(&"Chord 1 has no notes".to_string()));
        assert!(warnings.contains(&"Chord 2 has invalid duration".to_string()));
        assert!(warnings.iter().any(|w| w.contains("below piano range")));
        assert!(warnings.iter().any(|w| w.contains("above piano range")));

        let clean = vec![Chord::new(vec![60, 64, 67], 4.0)];
        assert!(validate_progression(&clean).is_empty());
    }

    #[test]
    fn test_validate_all_empty_chords() {
        let progression = vec![Chord::new(vec![], 4.0)];
        let warnings = validate_progression(&progression);
        assert_eq!(warnings, vec!["Chord 1 has no notes"]);
    }

    #[test]
    fn test_analyze_chord() {
        let plain = Chord::new(vec![60, 64, 67], 4.0);
        assert_eq!(analyze_chord(&plain), "3 notes");

        let voiced = Chord::new(vec![64, 67, 71, 72], 4.0).with_metadata(ChordMetadata {
            root: Some(60),
            quality: Some(ChordQuality::Maj7),
            inversion: Some(1),
            ..Default::default()
        });
        assert_eq!(analyze_chord(&voiced), "CMaj7 - 1st Inversion");
    }

    #[test]
    fn test_section_energy() {
        assert_eq!(analyze_section_energy(&[]), Energy::Medium);

        let triads = vec![
            Chord::new(vec![60, 64, 67], 4.0),
            Chord::new(vec![65, 69, 72], 4.0),
        ];
        assert_eq!(analyze_section_energy(&triads), Energy::Low);

        let sevenths = vec![Chord::new(vec![60, 64, 67, 71], 4.0)];
        assert_eq!(analyze_section_energy(&sevenths), Energy::Medium);

        // G7 has a tritone between B and F
        let dominant = vec![Chord::new(vec![67, 71, 74, 77], 4.0)];
        assert_eq!(analyze_section_energy(&dominant), Energy::High);
    }
}
