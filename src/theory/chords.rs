// Chord construction - Qualities, modes, and diatonic chord building
// Static interval tables; every function here is pure

use serde::{Deserialize, Serialize};

use super::voicing::apply_voicing;

/// Note names indexed by pitch class
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Chord quality supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    // Triads
    Maj,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "dim")]
    Dim,
    #[serde(rename = "aug")]
    Aug,
    #[serde(rename = "sus2")]
    Sus2,
    #[serde(rename = "sus4")]
    Sus4,

    // Sevenths
    Maj7,
    #[serde(rename = "min7")]
    Min7,
    #[serde(rename = "dom7", alias = "Dom7")]
    Dom7,
    #[serde(rename = "dim7")]
    Dim7,
    #[serde(rename = "hdim7")]
    HalfDim7,
    #[serde(rename = "minMaj7")]
    MinMaj7,
    #[serde(rename = "aug7")]
    Aug7,

    // Extensions
    Maj9,
    #[serde(rename = "min9")]
    Min9,
    #[serde(rename = "dom9")]
    Dom9,
    Maj11,
    #[serde(rename = "min11")]
    Min11,
    #[serde(rename = "dom11")]
    Dom11,
    Maj13,
    #[serde(rename = "min13")]
    Min13,
    #[serde(rename = "dom13")]
    Dom13,
}

impl ChordQuality {
    /// Semitone intervals from the root
    pub fn intervals(&self) -> &'static [i32] {
        match self {
            ChordQuality::Maj => &[0, 4, 7],
            ChordQuality::Min => &[0, 3, 7],
            ChordQuality::Dim => &[0, 3, 6],
            ChordQuality::Aug => &[0, 4, 8],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Maj7 => &[0, 4, 7, 11],
            ChordQuality::Min7 => &[0, 3, 7, 10],
            ChordQuality::Dom7 => &[0, 4, 7, 10],
            ChordQuality::Dim7 => &[0, 3, 6, 9],
            ChordQuality::HalfDim7 => &[0, 3, 6, 10],
            ChordQuality::MinMaj7 => &[0, 3, 7, 11],
            ChordQuality::Aug7 => &[0, 4, 8, 10],
            ChordQuality::Maj9 => &[0, 4, 7, 11, 14],
            ChordQuality::Min9 => &[0, 3, 7, 10, 14],
            ChordQuality::Dom9 => &[0, 4, 7, 10, 14],
            ChordQuality::Maj11 => &[0, 4, 7, 11, 14, 17],
            ChordQuality::Min11 => &[0, 3, 7, 10, 14, 17],
            ChordQuality::Dom11 => &[0, 4, 7, 10, 14, 17],
            ChordQuality::Maj13 => &[0, 4, 7, 11, 14, 17, 21],
            ChordQuality::Min13 => &[0, 3, 7, 10, 14, 17, 21],
            ChordQuality::Dom13 => &[0, 4, 7, 10, 14, 17, 21],
        }
    }

    /// Symbol used by the host (and in chord names)
    pub fn symbol(&self) -> &'static str {
        match self {
            ChordQuality::Maj => "Maj",
            ChordQuality::Min => "min",
            ChordQuality::Dim => "dim",
            ChordQuality::Aug => "aug",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Maj7 => "Maj7",
            ChordQuality::Min7 => "min7",
            ChordQuality::Dom7 => "dom7",
            ChordQuality::Dim7 => "dim7",
            ChordQuality::HalfDim7 => "hdim7",
            ChordQuality::MinMaj7 => "minMaj7",
            ChordQuality::Aug7 => "aug7",
            ChordQuality::Maj9 => "Maj9",
            ChordQuality::Min9 => "min9",
            ChordQuality::Dom9 => "dom9",
            ChordQuality::Maj11 => "Maj11",
            ChordQuality::Min11 => "min11",
            ChordQuality::Dom11 => "dom11",
            ChordQuality::Maj13 => "Maj13",
            ChordQuality::Min13 => "min13",
            ChordQuality::Dom13 => "dom13",
        }
    }

    /// Parse a host symbol; unknown symbols fall back to a major triad
    pub fn from_symbol(s: &str) -> Self {
        match s {
            "min" | "m" => ChordQuality::Min,
            "dim" => ChordQuality::Dim,
            "aug" => ChordQuality::Aug,
            "sus2" => ChordQuality::Sus2,
            "sus4" => ChordQuality::Sus4,
            "Maj7" => ChordQuality::Maj7,
            "min7" | "m7" => ChordQuality::Min7,
            "dom7" | "Dom7" | "7" => ChordQuality::Dom7,
            "dim7" => ChordQuality::Dim7,
            "hdim7" | "m7b5" => ChordQuality::HalfDim7,
            "minMaj7" => ChordQuality::MinMaj7,
            "aug7" => ChordQuality::Aug7,
            "Maj9" => ChordQuality::Maj9,
            "min9" => ChordQuality::Min9,
            "dom9" => ChordQuality::Dom9,
            "Maj11" => ChordQuality::Maj11,
            "min11" => ChordQuality::Min11,
            "dom11" => ChordQuality::Dom11,
            "Maj13" => ChordQuality::Maj13,
            "min13" => ChordQuality::Min13,
            "dom13" => ChordQuality::Dom13,
            _ => ChordQuality::Maj,
        }
    }

    /// Extend a triad or seventh quality with a 7th, 9th, 11th, or 13th
    ///
    /// Qualities without an extension family are returned unchanged.
    pub fn extend(&self, extension: Extension) -> ChordQuality {
        use ChordQuality::*;
        use Extension::*;

        match (self, extension) {
            (Maj | Maj7, Seventh) => Maj7,
            (Maj | Maj7, Ninth) => Maj9,
            (Maj | Maj7, Eleventh) => Maj11,
            (Maj | Maj7, Thirteenth) => Maj13,
            (Min | Min7, Seventh) => Min7,
            (Min | Min7, Ninth) => Min9,
            (Min | Min7, Eleventh) => Min11,
            (Min | Min7, Thirteenth) => Min13,
            (Sus2 | Sus4 | Dom7, Seventh) => Dom7,
            (Sus2 | Sus4 | Dom7, Ninth) => Dom9,
            (Sus2 | Sus4 | Dom7, Eleventh) => Dom11,
            (Sus2 | Sus4 | Dom7, Thirteenth) => Dom13,
            (Dim, _) => Dim7,
            (Aug, _) => Aug7,
            (other, _) => *other,
        }
    }
}

/// Chord extension applied on top of a diatonic quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extension {
    #[serde(rename = "7")]
    Seventh,
    #[serde(rename = "9")]
    Ninth,
    #[serde(rename = "11")]
    Eleventh,
    #[serde(rename = "13")]
    Thirteenth,
}

/// Overall character of a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModeCharacter {
    Major,
    Minor,
    Diminished,
}

/// Church modes, in rotation order from Ionian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
    Locrian,
}

impl Mode {
    /// Interval steps in semitones (the last step closes the octave)
    pub fn steps(&self) -> [i32; 7] {
        match self {
            Mode::Ionian => [2, 2, 1, 2, 2, 2, 1],
            Mode::Dorian => [2, 1, 2, 2, 2, 1, 2],
            Mode::Phrygian => [1, 2, 2, 2, 1, 2, 2],
            Mode::Lydian => [2, 2, 2, 1, 2, 2, 1],
            Mode::Mixolydian => [2, 2, 1, 2, 2, 1, 2],
            Mode::Aeolian => [2, 1, 2, 2, 1, 2, 2],
            Mode::Locrian => [1, 2, 2, 1, 2, 2, 2],
        }
    }

    pub fn character(&self) -> ModeCharacter {
        match self {
            Mode::Ionian | Mode::Lydian | Mode::Mixolydian => ModeCharacter::Major,
            Mode::Dorian | Mode::Phrygian | Mode::Aeolian => ModeCharacter::Minor,
            Mode::Locrian => ModeCharacter::Diminished,
        }
    }

    /// Rotation of this mode relative to Ionian
    fn offset(&self) -> u32 {
        match self {
            Mode::Ionian => 0,
            Mode::Dorian => 1,
            Mode::Phrygian => 2,
            Mode::Lydian => 3,
            Mode::Mixolydian => 4,
            Mode::Aeolian => 5,
            Mode::Locrian => 6,
        }
    }
}

/// Inclusive MIDI note range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRange {
    pub min: i32,
    pub max: i32,
}

/// Parameters for building a voiced chord from a root and quality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicingParams {
    pub root: i32,
    pub quality: ChordQuality,
    #[serde(default)]
    pub inversion: u32,
    #[serde(default)]
    pub drop: u32,
    #[serde(default)]
    pub range: Option<NoteRange>,
}

/// Parameters for building a diatonic chord from a key and scale degree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiatonicChordParams {
    pub key_root: i32,

    /// Scale degree (1-7)
    pub degree: u32,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub extension: Option<Extension>,

    #[serde(default)]
    pub inversion: u32,

    #[serde(default)]
    pub drop: u32,

    #[serde(default)]
    pub range: Option<NoteRange>,
}

/// MIDI notes for a chord built on `root`
pub fn chord_notes(root: i32, quality: ChordQuality) -> Vec<i32> {
    quality.intervals().iter().map(|&i| root.saturating_add(i)).collect()
}

/// Diatonic quality for a scale degree (1-7) in a mode
pub fn diatonic_quality(degree: u32, mode: Mode) -> ChordQuality {
    // Qualities of the Ionian degrees; other modes are rotations
    const MAJOR_QUALITIES: [ChordQuality; 7] = [
        ChordQuality::Maj,
        ChordQuality::Min,
        ChordQuality::Min,
        ChordQuality::Maj,
        ChordQuality::Dom7,
        ChordQuality::Min,
        ChordQuality::HalfDim7,
    ];

    let index = (degree.saturating_sub(1) + mode.offset()) % 7;
    MAJOR_QUALITIES[index as usize]
}

/// The seven scale notes of a mode starting at `root`
pub fn scale_notes(root: i32, mode: Mode) -> Vec<i32> {
    let mut notes = Vec::with_capacity(7);
    let mut current = root;
    notes.push(current);

    for step in &mode.steps()[..6] {
        current = current.saturating_add(*step);
        notes.push(current);
    }

    notes
}

/// Root note of a scale degree (1-7) in a key
pub fn scale_degree_root(key_root: i32, degree: u32, mode: Mode) -> i32 {
    let notes = scale_notes(key_root, mode);
    notes[(degree.saturating_sub(1) % 7) as usize]
}

/// Fold notes into `[min, max]` by octaves
///
/// A range narrower than an octave cannot always be satisfied; notes then
/// end at or below `max`.
pub fn constrain_to_range(notes: &[i32], min: i32, max: i32) -> Vec<i32> {
    let (lo, hi) = (min as i64, max as i64);

    notes
        .iter()
        .map(|&note| {
            let mut n = note as i64;
            if n < lo {
                n += (lo - n + 11) / 12 * 12;
            }
            if n > hi {
                n -= (n - hi + 11) / 12 * 12;
            }
            n.clamp(i32::MIN as i64, i32::MAX as i64) as i32
        })
        .collect()
}

/// Build a voiced chord, optionally constrained to a range
pub fn generate_chord(params: &VoicingParams) -> Vec<i32> {
    let notes = chord_notes(params.root, params.quality);
    let notes = apply_voicing(&notes, params.inversion, params.drop);

    match params.range {
        Some(range) => constrain_to_range(&notes, range.min, range.max),
        None => notes,
    }
}

/// Build a diatonic chord from key, degree, and mode
pub fn generate_diatonic_chord(params: &DiatonicChordParams) -> Vec<i32> {
    let root = scale_degree_root(params.key_root, params.degree, params.mode);
    let mut quality = diatonic_quality(params.degree, params.mode);
    if let Some(extension) = params.extension {
        quality = quality.extend(extension);
    }

    generate_chord(&VoicingParams {
        root,
        quality,
        inversion: params.inversion,
        drop: params.drop,
        range: params.range,
    })
}

/// Chord name such as "CMaj7"
pub fn chord_name(root: i32, quality: ChordQuality) -> String {
    format!("{}{}", NOTE_NAMES[root.rem_euclid(12) as usize], quality.symbol())
}

/// Note name with octave, MIDI 60 = "C4"
pub fn note_name(midi_note: i32) -> String {
    let octave = midi_note.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[midi_note.rem_euclid(12) as usize], octave)
}

/// Semitone offset of a scale degree string such as "1", "b7", "#4"
///
/// Unknown degrees map to the root.
pub fn parse_degree(degree: &str) -> i32 {
    match degree.trim() {
        "1" => 0,
        "b2" => 1,
        "2" => 2,
        "b3" => 3,
        "3" => 4,
        "4" => 5,
        "#4" | "b5" => 6,
        "5" => 7,
        "#5" | "b6" => 8,
        "6" => 9,
        "b7" => 10,
        "7" => 11,
        _ => 0,
    }
}

/// Roman numeral for a scale degree, cased by its diatonic quality
pub fn roman_numeral(degree: u32, mode: Mode) -> String {
    const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

    let quality = diatonic_quality(degree, mode);
    let numeral = NUMERALS[(degree.saturating_sub(1) % 7) as usize];

    match quality {
        ChordQuality::HalfDim7 | ChordQuality::Dim | ChordQuality::Dim7 => {
            format!("{}°", numeral.to_lowercase())
        }
        ChordQuality::Min | ChordQuality::Min7 => numeral.to_lowercase(),
        ChordQuality::Aug | ChordQuality::Aug7 => format!("{}+", numeral),
        _ => numeral.to_string(),
    }
}
