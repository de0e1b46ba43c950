// MIDI - Standard MIDI File encoding and inspection
// Writing is hand-rolled for an exact byte layout; reading goes through midly

pub mod codec;
pub mod layout;

// Re-export main types
pub use codec::{
    export_progression_to_midi, generate_midi_file, ChannelEvent, MidiError, NoteStatus,
    TrackWriter, TICKS_PER_QUARTER,
};
pub use layout::{read_track_layout, MidiLayout, NoteSpan, TrackLayout};
