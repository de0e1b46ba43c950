// MIDI File Codec - Standard MIDI File writer
// Format 0, one track, every channel event carries its own status byte

use thiserror::Error;

use crate::progression::{Chord, DEFAULT_VELOCITY};
use crate::timing::{self, TimeSignature};

/// Ticks per quarter note used for progression export
pub const TICKS_PER_QUARTER: u16 = 480;

/// Largest delta time a 4-byte variable-length quantity can carry
pub const MAX_DELTA_TICKS: u32 = 0x0FFF_FFFF;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const META: u8 = 0xFF;
const META_END_OF_TRACK: u8 = 0x2F;
const META_TEMPO: u8 = 0x51;
const META_TIME_SIGNATURE: u8 = 0x58;

/// MIDI clocks per metronome click (one quarter note)
const CLOCKS_PER_CLICK: u8 = 24;

/// Notated 32nd notes per MIDI quarter note
const THIRTY_SECONDS_PER_QUARTER: u8 = 8;

/// Errors that can occur while encoding or decoding MIDI files
#[derive(Debug, Error)]
pub enum MidiError {
    #[error("Tempo must be a positive, finite BPM value, got {0}")]
    InvalidTempo(f64),

    #[error("Invalid time signature {numerator}/{denominator}")]
    InvalidTimeSignature { numerator: u8, denominator: u8 },

    #[error("Division must be between 1 and 32767 ticks per quarter, got {0}")]
    InvalidDivision(u16),

    #[error("Failed to parse MIDI: {0}")]
    Parse(#[from] midly::Error),
}

/// Note-on or note-off
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoteStatus {
    // Declared first so offs sort ahead of ons at the same tick
    Off,
    On,
}

/// A note event on an absolute tick timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEvent {
    pub tick: u64,
    pub status: NoteStatus,

    /// Channel nibble (0-15)
    pub channel: u8,

    pub key: u8,
    pub velocity: u8,
}

/// Accumulates the event stream of a single track chunk
#[derive(Debug, Default)]
pub struct TrackWriter {
    data: Vec<u8>,
}

impl TrackWriter {
    pub fn new() -> Self {
        TrackWriter { data: Vec::new() }
    }

    /// Note On with an explicit status byte
    pub fn note_on(&mut self, delta: u32, channel: u8, key: u8, velocity: u8) {
        self.channel_event(delta, NOTE_ON, channel, key, velocity);
    }

    /// Note Off with release velocity 0
    pub fn note_off(&mut self, delta: u32, channel: u8, key: u8) {
        self.channel_event(delta, NOTE_OFF, channel, key, 0);
    }

    fn channel_event(&mut self, delta: u32, status: u8, channel: u8, data1: u8, data2: u8) {
        write_vlq(&mut self.data, delta);
        self.data.push(status | (channel & 0x0F));
        self.data.push(data1 & 0x7F);
        self.data.push(data2 & 0x7F);
    }

    /// Meta event with a length-prefixed payload
    pub fn meta(&mut self, delta: u32, meta_type: u8, payload: &[u8]) {
        write_vlq(&mut self.data, delta);
        self.data.push(META);
        self.data.push(meta_type);
        write_vlq(&mut self.data, payload.len() as u32);
        self.data.extend_from_slice(payload);
    }

    /// Time signature meta event (FF 58 04 nn dd cc bb)
    pub fn time_signature(&mut self, delta: u32, signature: TimeSignature) {
        self.meta(
            delta,
            META_TIME_SIGNATURE,
            &[
                signature.numerator,
                signature.denominator_power(),
                CLOCKS_PER_CLICK,
                THIRTY_SECONDS_PER_QUARTER,
            ],
        );
    }

    /// Tempo meta event (FF 51 03 tt tt tt), always three payload bytes
    pub fn tempo(&mut self, delta: u32, us_per_quarter: u32) {
        let us = us_per_quarter.min(timing::MAX_US_PER_QUARTER);
        self.meta(
            delta,
            META_TEMPO,
            &[
                ((us >> 16) & 0xFF) as u8,
                ((us >> 8) & 0xFF) as u8,
                (us & 0xFF) as u8,
            ],
        );
    }

    /// End of track meta event (FF 2F 00)
    pub fn end_of_track(&mut self, delta: u32) {
        self.meta(delta, META_END_OF_TRACK, &[]);
    }

    /// Write a sorted timeline as delta-timed note events
    ///
    /// Returns the tick of the last event written.
    pub fn write_timeline(&mut self, events: &[ChannelEvent]) -> u64 {
        let mut last_tick = 0u64;
        for event in events {
            let delta = clamp_delta(event.tick.saturating_sub(last_tick));
            match event.status {
                NoteStatus::On => self.note_on(delta, event.channel, event.key, event.velocity),
                NoteStatus::Off => self.note_off(delta, event.channel, event.key),
            }
            last_tick = event.tick.max(last_tick);
        }
        last_tick
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Append a MIDI variable-length quantity (7 bits per byte, big-endian)
pub fn write_vlq(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut remaining = value;

    loop {
        groups[count] = (remaining & 0x7F) as u8;
        count += 1;
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }

    // Most significant group first; all but the last carry the continuation bit
    for i in (0..count).rev() {
        let byte = if i == 0 { groups[i] } else { groups[i] | 0x80 };
        out.push(byte);
    }
}

/// Clamp an absolute tick gap to what a delta time can encode
pub fn clamp_delta(ticks: u64) -> u32 {
    if ticks > MAX_DELTA_TICKS as u64 {
        log::warn!("Delta of {} ticks exceeds MIDI range, clamping", ticks);
        MAX_DELTA_TICKS
    } else {
        ticks as u32
    }
}

/// Wrap a track event stream into a format 0 Standard MIDI File
pub fn write_smf(division: u16, track: &[u8]) -> Result<Vec<u8>, MidiError> {
    if division == 0 || division > 0x7FFF {
        return Err(MidiError::InvalidDivision(division));
    }

    let mut bytes = Vec::with_capacity(22 + track.len());

    // Header chunk
    bytes.extend_from_slice(b"MThd");
    bytes.extend_from_slice(&6u32.to_be_bytes());
    bytes.extend_from_slice(&0u16.to_be_bytes()); // format 0
    bytes.extend_from_slice(&1u16.to_be_bytes()); // one track
    bytes.extend_from_slice(&division.to_be_bytes());

    // Track chunk
    bytes.extend_from_slice(b"MTrk");
    bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
    bytes.extend_from_slice(track);

    Ok(bytes)
}

/// Validate tempo and time signature before anything is written
pub(crate) fn check_transport(bpm: f64, signature: TimeSignature) -> Result<(), MidiError> {
    if !timing::is_valid_tempo(bpm) {
        return Err(MidiError::InvalidTempo(bpm));
    }
    if !signature.is_valid() {
        return Err(MidiError::InvalidTimeSignature {
            numerator: signature.numerator,
            denominator: signature.denominator,
        });
    }
    Ok(())
}

/// Clamp a possibly out-of-range note number into 0-127
pub fn clamp_note(note: i32) -> u8 {
    note.clamp(0, 127) as u8
}

/// Clamp a host velocity value into 0-127
pub fn clamp_velocity(velocity: f64) -> u8 {
    if velocity.is_finite() {
        velocity.round().clamp(0.0, 127.0) as u8
    } else {
        DEFAULT_VELOCITY
    }
}

/// Encode a chord progression as a Standard MIDI File
///
/// Each chord sounds for its duration on channel 1, chords play back to
/// back. Chords with no usable notes become rests and unusable durations
/// count as zero, so malformed chords never cause an error. Only an invalid
/// tempo or time signature is rejected.
///
/// The file size depends only on the progression: the tempo and time
/// signature are written as fixed-width meta events.
pub fn generate_midi_file(
    progression: &[Chord],
    tempo: f64,
    time_sig_numerator: u8,
    time_sig_denominator: u8,
) -> Result<Vec<u8>, MidiError> {
    let signature = TimeSignature::new(time_sig_numerator, time_sig_denominator);
    check_transport(tempo, signature)?;

    let mut track = TrackWriter::new();
    track.time_signature(0, signature);
    track.tempo(0, timing::microseconds_per_quarter(tempo));

    let channel = 0;
    let mut pending: u64 = 0;

    for (index, chord) in progression.iter().enumerate() {
        let ticks = timing::beats_to_ticks(chord.effective_duration(), TICKS_PER_QUARTER) as u64;

        if chord.notes.is_empty() {
            log::debug!("Chord {} has no notes, writing a rest", index);
            pending += ticks;
            continue;
        }

        let velocity = chord
            .first_velocity()
            .map(clamp_velocity)
            .unwrap_or(DEFAULT_VELOCITY);

        for (i, &note) in chord.notes.iter().enumerate() {
            let delta = if i == 0 { clamp_delta(pending) } else { 0 };
            track.note_on(delta, channel, clamp_note(note), velocity);
        }
        for (i, &note) in chord.notes.iter().enumerate() {
            let delta = if i == 0 { clamp_delta(ticks) } else { 0 };
            track.note_off(delta, channel, clamp_note(note));
        }
        pending = 0;
    }

    track.end_of_track(clamp_delta(pending));

    let bytes = write_smf(TICKS_PER_QUARTER, &track.into_bytes())?;
    log::debug!(
        "Encoded {} chord(s) into {} MIDI bytes",
        progression.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Export a progression with optional tempo and time signature
///
/// Defaults are 120 BPM in 4/4.
pub fn export_progression_to_midi(
    progression: &[Chord],
    tempo: Option<f64>,
    time_signature: Option<TimeSignature>,
) -> Result<Vec<u8>, MidiError> {
    let signature = time_signature.unwrap_or_default();
    generate_midi_file(
        progression,
        tempo.unwrap_or(timing::DEFAULT_TEMPO_BPM),
        signature.numerator,
        signature.denominator,
    )
}
