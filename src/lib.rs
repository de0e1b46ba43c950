// Chordgen - Chord voicing and arrangement output core
// Module declarations

pub mod arranger;
pub mod midi;
pub mod progression;
pub mod theory;
pub mod timing;

pub use arranger::{
    build_arranged_chord_events, create_arrangement_snapshot, to_midi_file_bytes,
    to_osc_progression, ArrangedChordEvent, ArrangementBlock, ArrangementError,
    MidiExportOptions,
};
pub use midi::{export_progression_to_midi, generate_midi_file, MidiError};
pub use progression::{Chord, ChordMetadata, Section};
pub use theory::{apply_drop_voicing, apply_inversion, apply_voicing, detect_patterns};
pub use timing::TimeSignature;
