// Arranger - Block-based song arrangement
// Flattens sections onto a timeline and lowers the result to MIDI or OSC shapes

pub mod blocks;
pub mod osc;
pub mod midi;
pub mod snapshot;

// Re-export main types
pub use blocks::{
    build_arranged_chord_events, section_beats, total_beats, ArrangedChordEvent,
    ArrangementBlock, ArrangementError, ModeId,
};
pub use osc::{
    arranged_osc_notes, flatten_osc_notes, to_osc_notes, to_osc_progression, OscNote,
    OscProgressionChord,
};
pub use midi::{to_midi_file_bytes, MidiExportOptions};
pub use snapshot::{create_arrangement_snapshot, ArrangementSnapshot};
