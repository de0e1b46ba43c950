// Theory - Chord construction, voicing, and harmonic pattern detection
// Pure functions over note sets; no I/O and no shared mutable state

pub mod chords;
pub mod voicing;
pub mod patterns;

// Re-export main types
pub use chords::{
    chord_name, chord_notes, generate_chord, generate_diatonic_chord, note_name, ChordQuality,
    DiatonicChordParams, Extension, Mode, NoteRange, VoicingParams,
};
pub use voicing::{
    apply_drop_voicing, apply_inversion, apply_voicing, get_voicing_description, DropVoicing,
};
pub use patterns::{
    apply_pattern, detect_patterns, find_pattern, DetectedPattern, PatternDefinition,
    PATTERN_CATALOG,
};
