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
use std::{error::Error, fmt};

use super::synth::Synth;

/// The format an output renders in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channels per frame.
    pub channels: u16,
}

/// An audio output capability. Whether audio is available at all is decided by which output
/// an engine is constructed with.
pub trait Output: fmt::Display + Send + Sync {
    /// Resolves the format the output will render in. Fails if the output is unavailable.
    fn format(&self) -> Result<OutputFormat, Box<dyn Error>>;

    /// Opens a stream that pulls audio from the given synth. The stream starts suspended.
    fn open(&self, format: OutputFormat, synth: Synth) -> Result<Box<dyn Stream>, Box<dyn Error>>;
}

/// An open output stream.
pub trait Stream: Send + Sync {
    /// Starts or resumes pulling audio. Blocks until the stream has settled.
    fn resume(&self) -> Result<(), Box<dyn Error>>;

    /// Returns true if the stream is pulling audio.
    fn is_running(&self) -> bool;
}

/// An output for environments without audio. It never opens.
pub struct Unavailable;

impl Output for Unavailable {
    fn format(&self) -> Result<OutputFormat, Box<dyn Error>> {
        Err("no audio output available".into())
    }

    fn open(&self, _: OutputFormat, _: Synth) -> Result<Box<dyn Stream>, Box<dyn Error>> {
        Err("no audio output available".into())
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "none (Unavailable)")
    }
}
