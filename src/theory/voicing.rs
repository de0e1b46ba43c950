// Voicing Engine - Inversions and drop voicings on MIDI note sets
// Pure functions; out-of-range parameters are clamped or ignored, never errors

use serde::{Deserialize, Serialize};

/// Drop voicing levels as the host numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropVoicing {
    /// Close voicing
    None,

    /// Second-highest voice down an octave
    Drop2,

    /// Second- and fourth-highest voices down an octave
    Drop24,

    /// Third-highest voice down an octave
    Drop3,
}

impl DropVoicing {
    /// Map a host drop level (0-3); anything else is `None`
    pub fn from_level(level: u32) -> Option<Self> {
        match level {
            0 => Some(DropVoicing::None),
            1 => Some(DropVoicing::Drop2),
            2 => Some(DropVoicing::Drop24),
            3 => Some(DropVoicing::Drop3),
            _ => None,
        }
    }

    /// Voices to lower, ranked from the top (1 = highest)
    fn ranks(&self) -> &'static [usize] {
        match self {
            DropVoicing::None => &[],
            DropVoicing::Drop2 => &[2],
            DropVoicing::Drop24 => &[2, 4],
            DropVoicing::Drop3 => &[3],
        }
    }

    /// Label suffix used in voicing descriptions
    pub fn label(&self) -> &'static str {
        match self {
            DropVoicing::None => "",
            DropVoicing::Drop2 => " Drop 2",
            DropVoicing::Drop24 => " Drop 2&4",
            DropVoicing::Drop3 => " Drop 3",
        }
    }
}

/// Raise the lowest `inversion` notes by an octave
///
/// The result keeps the untouched notes in their given order, followed by the
/// raised notes from lowest to highest. `inversion` is clamped to the note
/// count, so a single note with inversion 1 moves up an octave and any larger
/// value on an `m`-note chord behaves like inversion `m`.
pub fn apply_inversion(notes: &[i32], inversion: u32) -> Vec<i32> {
    let count = (inversion as usize).min(notes.len());
    if count == 0 {
        return notes.to_vec();
    }

    // Lowest first, ties broken by position
    let mut order: Vec<usize> = (0..notes.len()).collect();
    order.sort_by_key(|&i| (notes[i], i));

    let mut raised = vec![false; notes.len()];
    for &i in &order[..count] {
        raised[i] = true;
    }

    let mut result: Vec<i32> = notes
        .iter()
        .enumerate()
        .filter(|(i, _)| !raised[*i])
        .map(|(_, &n)| n)
        .collect();
    result.extend(order[..count].iter().map(|&i| notes[i].saturating_add(12)));
    result
}

/// Lower ranked upper voices by an octave
///
/// Chords with fewer than four notes, level 0, and unknown levels come back
/// unchanged. Otherwise the result is ordered bass to top.
pub fn apply_drop_voicing(notes: &[i32], drop_level: u32) -> Vec<i32> {
    let drop = match DropVoicing::from_level(drop_level) {
        Some(drop) if drop != DropVoicing::None => drop,
        _ => return notes.to_vec(),
    };
    if notes.len() < 4 {
        return notes.to_vec();
    }

    let mut sorted = notes.to_vec();
    sorted.sort_unstable();

    let len = sorted.len();
    for &rank in drop.ranks() {
        sorted[len - rank] = sorted[len - rank].saturating_sub(12);
    }

    sorted.sort_unstable();
    sorted
}

/// Inversion first, then drop voicing on the inverted chord
pub fn apply_voicing(notes: &[i32], inversion: u32, drop_level: u32) -> Vec<i32> {
    if notes.is_empty() {
        return Vec::new();
    }
    let inverted = apply_inversion(notes, inversion);
    apply_drop_voicing(&inverted, drop_level)
}

/// Human-readable voicing label, e.g. "2nd Inversion Drop 2"
pub fn get_voicing_description(inversion: u32, drop_level: u32) -> String {
    let mut description = if inversion == 0 {
        "Root Position".to_string()
    } else {
        format!("{} Inversion", ordinal(inversion))
    };

    if let Some(drop) = DropVoicing::from_level(drop_level) {
        description.push_str(drop.label());
    }

    description
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st
fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const C_MAJOR: [i32; 3] = [60, 64, 67];
    const C7: [i32; 4] = [60, 64, 67, 70];

    #[test]
    fn test_inversions_of_triad() {
        assert_eq!(apply_inversion(&C_MAJOR, 0), vec![60, 64, 67]);
        assert_eq!(apply_inversion(&C_MAJOR, 1), vec![64, 67, 72]);
        assert_eq!(apply_inversion(&C_MAJOR, 2), vec![67, 72, 76]);
        assert_eq!(apply_inversion(&C_MAJOR, 3), vec![72, 76, 79]);
    }

    #[test]
    fn test_inversion_of_seventh_chord() {
        assert_eq!(apply_inversion(&C7, 1), vec![64, 67, 70, 72]);
    }

    #[test]
    fn test_inversion_keeps_unsorted_voice_order() {
        // Lowest note (60) moves to the top, the rest keep their order
        assert_eq!(apply_inversion(&[67, 60, 64], 1), vec![67, 64, 72]);
    }

    #[test]
    fn test_inversion_ties_broken_by_position() {
        assert_eq!(apply_inversion(&[60, 60, 67], 1), vec![60, 67, 72]);
    }

    #[test]
    fn test_successive_inversions_raise_previous_lowest() {
        let notes = [62, 65, 69, 72];
        for k in 0..notes.len() as u32 {
            let current = apply_inversion(&notes, k);
            let next = apply_inversion(&notes, k + 1);
            // Exactly one pitch changed, and it went up an octave
            let mut a = current.clone();
            let mut b = next.clone();
            a.sort_unstable();
            b.sort_unstable();
            let lowest_remaining = current[0];
            assert_eq!(*next.last().unwrap(), lowest_remaining + 12);
            let sum_a: i32 = a.iter().sum();
            let sum_b: i32 = b.iter().sum();
            assert_eq!(sum_b - sum_a, 12);
        }
    }

    #[test]
    fn test_inversion_clamps_large_values() {
        assert_eq!(apply_inversion(&C_MAJOR, 10), vec![72, 76, 79]);
        assert_eq!(apply_inversion(&[60], 1), vec![72]);
        assert_eq!(apply_inversion(&[60], 5), vec![72]);
    }

    #[test]
    fn test_drop_voicings() {
        assert_eq!(apply_drop_voicing(&C7, 0), vec![60, 64, 67, 70]);
        assert_eq!(apply_drop_voicing(&C7, 1), vec![55, 60, 64, 70]);
        assert_eq!(apply_drop_voicing(&C7, 2), vec![48, 55, 64, 70]);
        assert_eq!(apply_drop_voicing(&C7, 3), vec![52, 60, 67, 70]);
    }

    #[test]
    fn test_drop_voicing_needs_four_notes() {
        for level in 1..=3 {
            assert_eq!(apply_drop_voicing(&C_MAJOR, level), C_MAJOR.to_vec());
        }
        // Unsorted short chords come back exactly as given
        assert_eq!(apply_drop_voicing(&[67, 60], 1), vec![67, 60]);
    }

    #[test]
    fn test_drop_voicing_ignores_unknown_levels() {
        assert_eq!(apply_drop_voicing(&C7, 4), C7.to_vec());
        assert_eq!(apply_drop_voicing(&C7, 23), C7.to_vec());
    }

    #[test]
    fn test_drop_2_and_4_on_five_notes_uses_fourth_from_top() {
        // C9: 60 64 67 70 74 -> lower 70 and 64
        assert_eq!(
            apply_drop_voicing(&[60, 64, 67, 70, 74], 2),
            vec![52, 58, 60, 67, 74]
        );
    }

    #[test]
    fn test_combined_voicing() {
        assert_eq!(apply_voicing(&C7, 1, 1), vec![58, 64, 67, 72]);
        assert_eq!(apply_voicing(&C7, 2, 0), vec![67, 70, 72, 76]);
        assert_eq!(apply_voicing(&C7, 0, 2), vec![48, 55, 64, 70]);
    }

    #[test]
    fn test_voicing_edge_cases() {
        assert_eq!(apply_voicing(&[], 1, 1), Vec::<i32>::new());
        assert_eq!(apply_voicing(&[60], 1, 1), vec![72]);
        assert_eq!(apply_voicing(&C_MAJOR, 10, 0), vec![72, 76, 79]);
        assert_eq!(apply_voicing(&C_MAJOR, 0, 10), vec![60, 64, 67]);
    }

    #[test]
    fn test_identity_voicing() {
        let inputs: [&[i32]; 4] = [&[], &[60], &[67, 60, 64], &[0, 127, 127, 5, 40]];
        for notes in inputs {
            assert_eq!(apply_voicing(notes, 0, 0), notes.to_vec());
        }
    }

    #[test]
    fn test_voicing_may_leave_midi_range() {
        // Clamping happens at output, not here
        assert_eq!(apply_inversion(&[120, 124, 127], 3), vec![132, 136, 139]);
        assert_eq!(apply_drop_voicing(&[0, 4, 7, 10], 2), vec![-12, -5, 4, 10]);
    }

    #[test]
    fn test_extreme_note_values_saturate() {
        assert_eq!(apply_voicing(&[i32::MAX], 1, 0), vec![i32::MAX]);
        assert_eq!(apply_inversion(&[i32::MAX - 5, 60], 2), vec![72, i32::MAX]);
        assert_eq!(
            apply_drop_voicing(&[i32::MIN, i32::MIN + 4, 7, 10], 2),
            vec![i32::MIN, i32::MIN + 4, -5, 10]
        );
    }

    #[test]
    fn test_voicing_description() {
        assert_eq!(get_voicing_description(0, 0), "Root Position");
        assert_eq!(get_voicing_description(1, 0), "1st Inversion");
        assert_eq!(get_voicing_description(2, 1), "2nd Inversion Drop 2");
        assert_eq!(get_voicing_description(3, 3), "3rd Inversion Drop 3");
        assert_eq!(get_voicing_description(0, 2), "Root Position Drop 2&4");
        assert_eq!(get_voicing_description(4, 0), "4th Inversion");
        assert_eq!(get_voicing_description(11, 9), "11th Inversion");
        assert_eq!(get_voicing_description(22, 0), "22nd Inversion");
    }
}
