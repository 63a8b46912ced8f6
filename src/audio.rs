// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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
use std::{error::Error, fmt, sync::Arc};

use tracing::error;

use crate::config;

pub mod cpal;
pub mod engine;
pub mod mock;
pub mod output;
pub mod synth;
pub mod timeline;
pub mod tone;

pub use engine::ToneEngine;

/// The device name that selects an engine without audio output.
const NO_DEVICE: &str = "none";

/// An audio engine. None of these operations fail: an engine without audio silently ignores
/// them, so the visual stream of a run carries on regardless.
pub trait Engine: fmt::Display + Send + Sync {
    /// Creates the timeline clock and output. A no-op after the first success. On failure the
    /// engine stays uninitialized.
    fn initialize(&self);

    /// Resumes a suspended output. Blocks until the output has settled, so call it before the
    /// first chord.
    fn resume(&self);

    /// Plays every key at once for the given number of seconds, starting now on the timeline.
    fn play_chord(&self, keys: &[String], duration_seconds: f64);

    /// Returns true if the engine has a live timeline.
    fn is_available(&self) -> bool;
}

/// Lists the output devices known to cpal.
pub fn list_devices() -> Result<Vec<cpal::DeviceInfo>, Box<dyn Error>> {
    cpal::list_devices()
}

/// Gets an engine for the given configuration. Device names starting with "mock" produce a
/// recording engine and "none" produces an engine without audio.
pub fn get_engine(config: &config::Audio) -> Arc<dyn Engine> {
    let device = config.device();
    if device.starts_with("mock") {
        return Arc::new(mock::Engine::get(device));
    }
    if device == NO_DEVICE {
        return Arc::new(ToneEngine::new(Arc::new(output::Unavailable)));
    }

    match cpal::Output::new(config) {
        Ok(output) => Arc::new(ToneEngine::new(Arc::new(output))),
        Err(e) => {
            error!(err = e.as_ref(), device, "Invalid audio configuration");
            Arc::new(ToneEngine::new(Arc::new(output::Unavailable)))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_engine() {
        let engine = get_engine(&config::Audio::new("mock-device"));
        assert_eq!(engine.to_string(), "mock-device (Mock)");

        let engine = get_engine(&config::Audio::new("none"));
        engine.initialize();
        assert!(!engine.is_available());
        assert_eq!(engine.to_string(), "none (Unavailable) (Tone)");
    }
}
