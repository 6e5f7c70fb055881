//! # Note Mapping Module
//!
//! Converts frequencies into musical terms for display and comparison.
//! Everything here is pure and stateless, based on twelve-tone equal
//! temperament with A4 = 440 Hz.
//!
//! ## Features
//! - Frequency to fractional MIDI number for distance math
//! - Frequency to nearest note name and octave (e.g. "A4", "C#3")
//! - Cent deviation between two frequencies

use std::fmt;

/// Note names of the chromatic scale, starting at C.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Label shown when a frequency has no note (silence or unvoiced).
pub const NOT_AVAILABLE: &str = "N/A";

/// Reference pitch for MIDI note 69 (A4).
const A4_HZ: f32 = 440.0;
const A4_MIDI: f32 = 69.0;

/// A note name together with its octave number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteName {
    /// Chromatic name, e.g. "A" or "C#".
    pub name: &'static str,
    /// Scientific pitch notation octave; middle C is octave 4.
    pub octave: i32,
    /// The rounded MIDI number this note was derived from.
    pub midi: i32,
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// Converts a frequency into a fractional MIDI number.
///
/// # Arguments
/// * `freq` - Frequency in Hz
///
/// # Returns
/// * `Some(midi)` - Continuous MIDI value (69.0 = 440 Hz)
/// * `None` - The frequency is zero, negative or not finite
pub fn hz_to_midi(freq: f32) -> Option<f32> {
    if !freq.is_finite() || freq <= 0.0 {
        return None;
    }
    Some(A4_MIDI + 12.0 * (freq / A4_HZ).log2())
}

/// Finds the nearest equal-tempered note for a frequency.
///
/// The note index uses a euclidean modulo and the octave a floor division,
/// so notes below MIDI 0 still map to valid names.
///
/// # Arguments
/// * `freq` - Frequency in Hz
///
/// # Returns
/// * `Some(note)` - Nearest note name and octave
/// * `None` - No note is available for `freq <= 0`
pub fn frequency_to_note(freq: f32) -> Option<NoteName> {
    let midi = hz_to_midi(freq)?.round() as i32;
    let note_index = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    Some(NoteName {
        name: NOTE_NAMES[note_index],
        octave,
        midi,
    })
}

/// Same as [`frequency_to_note`] but renders the "not available" label
/// instead of `None`.
pub fn note_label(freq: f32) -> String {
    frequency_to_note(freq)
        .map(|note| note.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Calculates the deviation from a target frequency in cents.
///
/// 100 cents = 1 semitone, positive values are sharp. Returns `None` if
/// either frequency has no pitch.
pub fn cents_between(freq: f32, target_freq: f32) -> Option<f32> {
    if !freq.is_finite() || !target_freq.is_finite() || freq <= 0.0 || target_freq <= 0.0 {
        return None;
    }
    Some(1200.0 * (freq / target_freq).log2())
}
