// Timing - Tempo and time signature values shared by the codec and arranger
// Keeps meta-event payloads fixed width regardless of the numeric value

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default song tempo in BPM
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Largest value the 24-bit tempo meta field can carry
pub const MAX_US_PER_QUARTER: u32 = 0x00FF_FFFF;

/// Errors from parsing timing values
#[derive(Debug, Error, PartialEq)]
pub enum TimingError {
    #[error("Time signature must look like \"N/D\", got {0:?}")]
    MalformedTimeSignature(String),
}

/// Musical time signature (numerator over a power-of-two denominator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar
    pub numerator: u8,

    /// Note value that gets one beat (4 = quarter note)
    pub denominator: u8,
}

impl TimeSignature {
    /// 4/4 time
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    pub fn new(numerator: u8, denominator: u8) -> Self {
        TimeSignature {
            numerator,
            denominator,
        }
    }

    /// Check that the signature can be written into a MIDI time signature event
    pub fn is_valid(&self) -> bool {
        self.numerator > 0 && self.denominator > 0 && self.denominator.is_power_of_two()
    }

    /// Denominator as a power of two (the `dd` byte of the meta event)
    pub fn denominator_power(&self) -> u8 {
        self.denominator.max(1).trailing_zeros() as u8
    }

    /// Lenient parse of a host string such as "3/4"
    ///
    /// Unparseable parts fall back to 4, matching how the host treats
    /// incomplete song settings.
    pub fn parse_lenient(s: &str) -> Self {
        let mut parts = s.split('/');
        let numerator = parse_part(parts.next());
        let denominator = parse_part(parts.next());
        TimeSignature {
            numerator,
            denominator,
        }
    }
}

fn parse_part(part: Option<&str>) -> u8 {
    part.and_then(|p| p.trim().parse::<u8>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(4)
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = TimingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .split_once('/')
            .ok_or_else(|| TimingError::MalformedTimeSignature(s.to_string()))?;

        let numerator = num
            .trim()
            .parse::<u8>()
            .map_err(|_| TimingError::MalformedTimeSignature(s.to_string()))?;
        let denominator = den
            .trim()
            .parse::<u8>()
            .map_err(|_| TimingError::MalformedTimeSignature(s.to_string()))?;

        let signature = TimeSignature::new(numerator, denominator);
        if !signature.is_valid() {
            return Err(TimingError::MalformedTimeSignature(s.to_string()));
        }
        Ok(signature)
    }
}

/// Check a tempo value is usable (finite and positive)
pub fn is_valid_tempo(bpm: f64) -> bool {
    bpm.is_finite() && bpm > 0.0
}

/// Microseconds per quarter note for a tempo, clamped to the 24-bit meta field
pub fn microseconds_per_quarter(bpm: f64) -> u32 {
    let us = (60_000_000.0 / bpm).round();
    if !us.is_finite() {
        return MAX_US_PER_QUARTER;
    }
    (us as u64).clamp(1, MAX_US_PER_QUARTER as u64) as u32
}

/// Convert a beat count to ticks, rounding to the nearest tick
///
/// Non-finite or negative beat counts contribute zero ticks. Results saturate
/// at `u32::MAX`.
pub fn beats_to_ticks(beats: f64, ppq: u16) -> u32 {
    if !beats.is_finite() || beats <= 0.0 {
        return 0;
    }
    let ticks = (beats * ppq as f64).round();
    if ticks >= u32::MAX as f64 {
        u32::MAX
    } else {
        ticks as u32
    }
}
