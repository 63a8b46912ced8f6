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
//! Single-use tone units.
//!
//! A tone is a sine oscillator feeding a gain stage. The gain starts at
//! [`INITIAL_GAIN`] and decays exponentially to [`FLOOR_GAIN`] at the stop
//! instant, which avoids the click of a hard cutoff. Exponential ramps can't
//! reach zero, hence the floor.

use std::f64::consts::TAU;

/// Gain at the start instant.
pub const INITIAL_GAIN: f32 = 0.3;

/// Gain reached at the stop instant.
pub const FLOOR_GAIN: f32 = 0.01;

/// A sine tone with a fixed start and stop frame on the audio timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct Tone {
    frequency: f64,
    start_frame: u64,
    stop_frame: u64,
    sample_rate: u32,
}

impl Tone {
    /// Creates a new tone.
    pub fn new(frequency: f64, start_frame: u64, stop_frame: u64, sample_rate: u32) -> Tone {
        Tone {
            frequency,
            start_frame,
            stop_frame: stop_frame.max(start_frame),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Gets the frequency of the oscillator in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Gets the frame at which the tone starts.
    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    /// Gets the frame at which the tone stops.
    pub fn stop_frame(&self) -> u64 {
        self.stop_frame
    }

    /// Gets the start instant in seconds.
    pub fn start_time(&self) -> f64 {
        self.start_frame as f64 / self.sample_rate as f64
    }

    /// Gets the stop instant in seconds.
    pub fn stop_time(&self) -> f64 {
        self.stop_frame as f64 / self.sample_rate as f64
    }

    /// Returns true once the tone has stopped at the given frame.
    pub fn is_finished(&self, frame: u64) -> bool {
        frame >= self.stop_frame
    }

    /// Gets the envelope gain at the given frame. Silent outside of [start, stop).
    pub fn gain_at(&self, frame: u64) -> f32 {
        if frame < self.start_frame || frame >= self.stop_frame {
            return 0.0;
        }
        let length = (self.stop_frame - self.start_frame) as f64;
        let progress = (frame - self.start_frame) as f64 / length;
        let ratio = (FLOOR_GAIN / INITIAL_GAIN) as f64;
        (INITIAL_GAIN as f64 * ratio.powf(progress)) as f32
    }

    /// Gets the output sample at the given frame.
    pub fn sample_at(&self, frame: u64) -> f32 {
        let gain = self.gain_at(frame);
        if gain == 0.0 {
            return 0.0;
        }
        let t = (frame - self.start_frame) as f64 / self.sample_rate as f64;
        (TAU * self.frequency * t).sin() as f32 * gain
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_envelope() {
        let tone = Tone::new(440.0, 1000, 2000, 1000);

        assert_eq!(tone.gain_at(999), 0.0);
        assert!(approx(tone.gain_at(1000), INITIAL_GAIN));
        // Halfway through an exponential ramp is the geometric mean.
        assert!(approx(tone.gain_at(1500), (INITIAL_GAIN * FLOOR_GAIN).sqrt()));
        assert!(approx(tone.gain_at(1999), 0.01003));
        assert_eq!(tone.gain_at(2000), 0.0);

        // The envelope only ever decays.
        let gains: Vec<f32> = (1000..2000).map(|frame| tone.gain_at(frame)).collect();
        assert!(gains.windows(2).all(|pair| pair[1] < pair[0]));
    }

    #[test]
    fn test_samples() {
        let tone = Tone::new(250.0, 0, 1000, 1000);
        // 250 Hz at 1 kHz is a quarter turn per frame.
        assert_eq!(tone.sample_at(0), 0.0);
        assert!(approx(tone.sample_at(1), tone.gain_at(1)));
        assert!(tone.sample_at(3) < 0.0);
        assert_eq!(tone.sample_at(1000), 0.0);
    }

    #[test]
    fn test_times() {
        let tone = Tone::new(261.63, 22050, 66150, 44100);
        assert_eq!(tone.start_time(), 0.5);
        assert_eq!(tone.stop_time(), 1.5);
        assert!(!tone.is_finished(66149));
        assert!(tone.is_finished(66150));
    }

    #[test]
    fn test_zero_length_tone() {
        let tone = Tone::new(440.0, 10, 5, 44100);
        assert_eq!(tone.stop_frame(), 10);
        assert!(tone.is_finished(10));
        assert_eq!(tone.sample_at(10), 0.0);
    }
}
