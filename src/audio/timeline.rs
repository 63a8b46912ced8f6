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
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// The audio timeline clock. Time is the number of frames the output has rendered, so it only
/// moves when the device consumes audio and is immune to timer jitter. It stands still while
/// the output is suspended.
#[derive(Clone, Debug)]
pub struct Timeline {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl Timeline {
    /// Creates a new timeline at frame zero.
    pub fn new(sample_rate: u32) -> Timeline {
        Timeline {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Gets the sample rate of the timeline.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the current frame.
    pub fn current_frame(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Gets the current time in seconds.
    pub fn current_time(&self) -> f64 {
        self.seconds_at(self.current_frame())
    }

    /// Moves the timeline forward by the given number of rendered frames.
    pub fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }

    /// Converts a length in seconds to a whole number of frames. Lengths that aren't positive
    /// are zero frames long.
    pub fn frames_for(&self, seconds: f64) -> u64 {
        if seconds.is_nan() || seconds <= 0.0 {
            return 0;
        }
        // Float to int casts saturate.
        (seconds * self.sample_rate as f64).round() as u64
    }

    /// Converts a frame to seconds on this timeline.
    pub fn seconds_at(&self, frame: u64) -> f64 {
        frame as f64 / self.sample_rate as f64
    }
}
