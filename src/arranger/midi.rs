// MIDI Export - Lower arranged events to a Standard MIDI File
// One format 0 track; each event's block channel goes into the status nibble

use serde::{Deserialize, Serialize};

use super::blocks::ArrangedChordEvent;
use crate::midi::codec::{self, ChannelEvent, MidiError, NoteStatus, TrackWriter};
use crate::timing::{self, TimeSignature};

/// MIDI export options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - typically 480 or 960
    pub ppq: u16,

    /// Song tempo in BPM
    pub tempo: f64,

    pub time_signature: TimeSignature,

    /// Include tempo metadata
    pub include_tempo: bool,

    /// Include time signature metadata
    pub include_time_signature: bool,

    /// Shorten or stretch notes by each event's gate percentage
    pub apply_gate: bool,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: codec::TICKS_PER_QUARTER,
            tempo: timing::DEFAULT_TEMPO_BPM,
            time_signature: TimeSignature::COMMON,
            include_tempo: true,
            include_time_signature: true,
            apply_gate: true,
        }
    }
}

/// Export arranged events to MIDI file bytes
///
/// Events are placed at their absolute start beats, so gaps and overlaps
/// between blocks survive. At equal ticks note-offs come before note-ons
/// so back-to-back repeats of the same note retrigger cleanly, and notes
/// of the same kind are written in ascending order.
pub fn to_midi_file_bytes(
    events: &[ArrangedChordEvent],
    options: &MidiExportOptions,
) -> Result<Vec<u8>, MidiError> {
    codec::check_transport(options.tempo, options.time_signature)?;

    let timeline = build_timeline(events, options);

    let mut track = TrackWriter::new();
    if options.include_time_signature {
        track.time_signature(0, options.time_signature);
    }
    if options.include_tempo {
        track.tempo(0, timing::microseconds_per_quarter(options.tempo));
    }
    track.write_timeline(&timeline);
    track.end_of_track(0);

    let bytes = codec::write_smf(options.ppq, &track.into_bytes())?;
    log::debug!(
        "Exported {} arranged event(s) as {} MIDI event(s), {} bytes",
        events.len(),
        timeline.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Absolute note-on/off timeline, sorted by tick with offs first
fn build_timeline(
    events: &[ArrangedChordEvent],
    options: &MidiExportOptions,
) -> Vec<ChannelEvent> {
    let mut timeline = Vec::with_capacity(events.iter().map(|e| e.notes.len() * 2).sum());

    for event in events {
        let channel = channel_nibble(event.midi_channel);
        let start_tick = timing::beats_to_ticks(event.start_beat, options.ppq) as u64;
        let end_tick = start_tick + duration_ticks(event, options);

        for &key in &event.notes {
            let key = key.min(127);
            timeline.push(ChannelEvent {
                tick: start_tick,
                status: NoteStatus::On,
                channel,
                key,
                velocity: event.velocity.min(127),
            });
            timeline.push(ChannelEvent {
                tick: end_tick,
                status: NoteStatus::Off,
                channel,
                key,
                velocity: 0,
            });
        }
    }

    // Offs before ons, then ascending note within a tick
    timeline.sort_by_key(|e| (e.tick, e.status, e.key));
    timeline
}

/// Sounding length of an event in ticks, never less than one
fn duration_ticks(event: &ArrangedChordEvent, options: &MidiExportOptions) -> u64 {
    let gate_scale = if options.apply_gate && event.gate_percent.is_finite() {
        (event.gate_percent / 100.0).max(0.01)
    } else {
        1.0
    };
    let ticks = timing::beats_to_ticks(event.duration_beats * gate_scale, options.ppq);
    ticks.max(1) as u64
}

/// Map a host channel (1-16) to the status byte's low nibble
fn channel_nibble(channel: Option<u8>) -> u8 {
    match channel {
        None => 0,
        Some(c @ 1..=16) => c - 1,
        Some(c) => {
            log::warn!("MIDI channel {} out of range, clamping", c);
            c.clamp(1, 16) - 1
        }
    }
}
