// Progression - Host data model for chords and sections
// Plus read-only progression utilities

pub mod types;
pub mod manager;

// Re-export main types
pub use types::{
    Chord, ChordMetadata, Section, TransitionConfig, TransitionType, DEFAULT_GATE_PERCENT,
    DEFAULT_VELOCITY,
};
pub use manager::{
    analyze_chord, analyze_section_energy, flatten_sections_with_repeats, progression_duration,
    transpose_progression, validate_progression, Energy,
};
