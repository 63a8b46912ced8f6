// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
//! Pitch names to frequencies.
//!
//! Pitch names take the form `<letter>[#|b]/<octave>`, e.g. `c/4`, `f#/5` or
//! `bb/4`. Only the fourth and fifth octaves are known; anything else resolves
//! to [`DEFAULT_FREQUENCY`].

use tracing::debug;

/// The frequency used for any pitch name that isn't in the table (A4).
pub const DEFAULT_FREQUENCY: f64 = 440.0;

/// The lowest octave in the table.
const FIRST_OCTAVE: i32 = 4;

/// Equal-tempered frequencies, indexed by octave and then by semitone above C.
const PITCH_TABLE: [[f64; 12]; 2] = [
    [
        261.63, 277.18, 293.66, 311.13, 329.63, 349.23, 369.99, 392.00, 415.30, 440.00, 466.16,
        493.88,
    ],
    [
        523.25, 554.37, 587.33, 622.25, 659.25, 698.46, 739.99, 783.99, 830.61, 880.00, 932.33,
        987.77,
    ],
];

/// Looks up the frequency in Hz for the given pitch name. Unknown names never
/// fail; they sound as A4.
pub fn frequency(key: &str) -> f64 {
    match lookup(key) {
        Some(frequency) => frequency,
        None => {
            debug!(key, "Unknown pitch, falling back to A4.");
            DEFAULT_FREQUENCY
        }
    }
}

/// Looks up the frequency for the given pitch name, returning None if it isn't known.
pub fn lookup(key: &str) -> Option<f64> {
    let (octave, semitone) = parse(key)?;
    let row = usize::try_from(octave.checked_sub(FIRST_OCTAVE)?).ok()?;
    PITCH_TABLE.get(row).map(|octave| octave[semitone])
}

/// Parses a pitch name into an octave and a semitone above C. Accidentals that
/// cross an octave boundary (b#, cb) carry into the neighbouring octave.
fn parse(key: &str) -> Option<(i32, usize)> {
    let (name, octave) = key.trim().split_once('/')?;
    let octave: i32 = octave.trim().parse().ok()?;

    let name = name.trim().to_ascii_lowercase();
    let mut chars = name.chars();
    let natural = match chars.next()? {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    };
    let accidental = match chars.as_str() {
        "" | "n" => 0,
        "#" => 1,
        "b" => -1,
        _ => return None,
    };

    let semitone: i32 = natural + accidental;
    let octave = octave.checked_add(semitone.div_euclid(12))?;
    let semitone = usize::try_from(semitone.rem_euclid(12)).ok()?;
    Some((octave, semitone))
}
