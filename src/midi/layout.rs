// MIDI layout reader - Summarize an encoded Standard MIDI File
// Parses with midly and pairs note-ons with their note-offs

use std::collections::{HashMap, VecDeque};

use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};

use super::codec::MidiError;
use crate::timing::TimeSignature;

/// A sounding note recovered from a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSpan {
    /// Channel nibble (0-15)
    pub channel: u8,
    pub key: u8,
    pub velocity: u8,
    pub start_tick: u64,
    pub end_tick: u64,
}

/// Summary of one track chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackLayout {
    pub event_count: usize,
    pub note_on_count: usize,
    pub note_off_count: usize,

    /// First tempo meta event, in microseconds per quarter
    pub tempo_us: Option<u32>,

    /// First time signature meta event
    pub time_signature: Option<TimeSignature>,

    /// Notes in the order their note-on appears
    pub notes: Vec<NoteSpan>,

    /// Absolute tick of the last event
    pub length_ticks: u64,

    pub has_end_of_track: bool,
}

/// Summary of a whole file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiLayout {
    /// SMF format (0, 1 or 2)
    pub format: u16,

    /// Ticks per quarter note, `None` for timecode-based files
    pub ticks_per_quarter: Option<u16>,

    pub tracks: Vec<TrackLayout>,
}

impl MidiLayout {
    /// All notes of all tracks
    pub fn notes(&self) -> impl Iterator<Item = &NoteSpan> {
        self.tracks.iter().flat_map(|t| t.notes.iter())
    }
}

/// Parse a file and summarize its tracks
pub fn read_track_layout(bytes: &[u8]) -> Result<MidiLayout, MidiError> {
    let smf = Smf::parse(bytes)?;

    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    };
    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(ticks) => Some(ticks.as_int()),
        Timing::Timecode(..) => None,
    };

    let tracks = smf
        .tracks
        .iter()
        .map(|track| summarize_track(track))
        .collect();

    Ok(MidiLayout {
        format,
        ticks_per_quarter,
        tracks,
    })
}

fn summarize_track(track: &[midly::TrackEvent<'_>]) -> TrackLayout {
    let mut layout = TrackLayout {
        event_count: track.len(),
        ..Default::default()
    };

    // Open notes per (channel, key), matched first-in first-out
    let mut open: HashMap<(u8, u8), VecDeque<usize>> = HashMap::new();
    let mut tick: u64 = 0;

    for event in track {
        tick += event.delta.as_int() as u64;

        match event.kind {
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        layout.note_on_count += 1;
                        open.entry((channel, key.as_int()))
                            .or_default()
                            .push_back(layout.notes.len());
                        layout.notes.push(NoteSpan {
                            channel,
                            key: key.as_int(),
                            velocity: vel.as_int(),
                            start_tick: tick,
                            end_tick: tick,
                        });
                    }
                    // Note-on with velocity 0 is a note-off
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        layout.note_off_count += 1;
                        let index = open
                            .get_mut(&(channel, key.as_int()))
                            .and_then(|queue| queue.pop_front());
                        match index {
                            Some(index) => layout.notes[index].end_tick = tick,
                            None => log::warn!(
                                "Note-off without note-on: channel {} key {}",
                                channel,
                                key.as_int()
                            ),
                        }
                    }
                    _ => {}
                }
            }
            TrackEventKind::Meta(MetaMessage::Tempo(us)) => {
                layout.tempo_us.get_or_insert(us.as_int());
            }
            TrackEventKind::Meta(MetaMessage::TimeSignature(numerator, power, _, _)) => {
                let denominator = 1u8.checked_shl(power as u32).unwrap_or(0);
                layout
                    .time_signature
                    .get_or_insert(TimeSignature::new(numerator, denominator));
            }
            TrackEventKind::Meta(MetaMessage::EndOfTrack) => {
                layout.has_end_of_track = true;
            }
            _ => {}
        }
    }

    layout.length_ticks = tick;
    layout
}
