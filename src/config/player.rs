// Copyright (C) 2024 Michael Wilson <mike@mdwn.dev>
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
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;
use crate::notes::BeatDuration;

/// The configuration for the score player.
#[derive(Deserialize, Clone, Debug)]
pub struct Player {
    /// The audio configuration.
    audio: Audio,
    /// Seconds per beat for scores that don't declare their own tempo.
    beat_duration: Option<f64>,
}

impl Player {
    /// Creates a new player configuration.
    pub fn new(audio: Audio, beat_duration: Option<f64>) -> Player {
        Player {
            audio,
            beat_duration,
        }
    }

    /// Parse a player configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Player, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Player>()?)
    }

    /// Gets the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Replaces the audio configuration.
    pub fn set_audio(&mut self, audio: Audio) {
        self.audio = audio;
    }

    /// Gets the configured beat duration, if any.
    pub fn beat_duration(&self) -> Result<Option<BeatDuration>, ConfigError> {
        Ok(self.beat_duration.map(BeatDuration::new).transpose()?)
    }
}
