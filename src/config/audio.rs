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
use std::{error::Error, time::Duration};

use duration_string::DurationString;
use serde::Deserialize;

const DEFAULT_RESUME_TIMEOUT: Duration = Duration::from_millis(500);

/// A YAML representation of the audio configuration.
#[derive(Deserialize, Clone, Debug)]
pub struct Audio {
    /// The audio device.
    device: String,

    /// Sample rate in Hz (default: the device's default).
    sample_rate: Option<u32>,

    /// Output channels (default: the device's default).
    channels: Option<u16>,

    /// How long to wait for the output to start when resuming.
    resume_timeout: Option<String>,
}

impl Audio {
    /// New will create a new Audio configuration.
    pub fn new(device: &str) -> Audio {
        Audio {
            device: device.to_string(),
            sample_rate: None,
            channels: None,
            resume_timeout: None,
        }
    }

    /// Returns the device from the configuration.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the sample rate override, if any.
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Returns the channel count override, if any.
    pub fn channels(&self) -> Option<u16> {
        self.channels
    }

    /// Returns the resume timeout from the configuration.
    pub fn resume_timeout(&self) -> Result<Duration, Box<dyn Error>> {
        match &self.resume_timeout {
            Some(resume_timeout) => Ok(DurationString::from_string(resume_timeout.clone())?.into()),
            None => Ok(DEFAULT_RESUME_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;

    #[test]
    fn test_audio_deserialize() {
        let yaml = r#"
            device: mock-device
            sample_rate: 48000
            channels: 2
            resume_timeout: 1s
        "#;

        let audio: Audio = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(audio.device(), "mock-device");
        assert_eq!(audio.sample_rate(), Some(48000));
        assert_eq!(audio.channels(), Some(2));
        assert_eq!(audio.resume_timeout().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn test_audio_defaults() {
        let audio = Audio::new("default");
        assert_eq!(audio.sample_rate(), None);
        assert_eq!(audio.channels(), None);
        assert_eq!(audio.resume_timeout().unwrap(), DEFAULT_RESUME_TIMEOUT);
    }

    #[test]
    fn test_invalid_resume_timeout() {
        let yaml = r#"
            device: mock-device
            resume_timeout: soon
        "#;

        let audio: Audio = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(audio.resume_timeout().is_err());
    }
}
