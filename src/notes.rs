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
use std::fmt;
use std::path::Path;

use config::{Config, File};
use serde::Deserialize;

use crate::config::{ConfigError, Player};

/// The tempo used when neither the score nor the player configuration provide one.
pub const DEFAULT_BEAT_DURATION: f64 = 1.0;

/// Errors produced while constructing or loading notes and scores.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("Score load/parse error: {0}")]
    Load(#[from] config::ConfigError),
    #[error("note {index}: {source}")]
    Note {
        index: usize,
        #[source]
        source: NoteError,
    },
    #[error("beat duration must be a positive number of seconds, got {0}")]
    InvalidBeatDuration(f64),
}

/// Errors produced while validating a single note.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum NoteError {
    #[error("a note needs at least one key")]
    NoKeys,
    #[error("duration must be a positive number of beats, got {0}")]
    InvalidDuration(f64),
}

/// Seconds per beat. Always finite and greater than zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatDuration(f64);

impl BeatDuration {
    /// Creates a new beat duration from the given number of seconds.
    pub fn new(seconds: f64) -> Result<BeatDuration, ScoreError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ScoreError::InvalidBeatDuration(seconds));
        }
        Ok(BeatDuration(seconds))
    }

    /// Gets the number of seconds in a beat.
    pub fn seconds(&self) -> f64 {
        self.0
    }

    /// Converts a number of beats into seconds at this tempo.
    pub fn to_seconds(&self, beats: f64) -> f64 {
        beats * self.0
    }
}

impl Default for BeatDuration {
    fn default() -> Self {
        BeatDuration(DEFAULT_BEAT_DURATION)
    }
}

/// A playable unit: one or more simultaneous pitches held for a number of beats.
#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    keys: Vec<String>,
    duration: f64,
}

impl Note {
    /// Creates a new note. Keys are pitch names such as "c/4".
    pub fn new<S: Into<String>>(
        keys: impl IntoIterator<Item = S>,
        duration: f64,
    ) -> Result<Note, NoteError> {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(NoteError::NoKeys);
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(NoteError::InvalidDuration(duration));
        }
        Ok(Note { keys, duration })
    }

    /// Gets the pitch names of the note.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Gets the duration of the note in beats.
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] x{}", self.keys.join(" "), self.duration)
    }
}

/// A YAML representation of a note.
#[derive(Deserialize)]
struct NoteFile {
    keys: Vec<String>,
    duration: f64,
}

/// A YAML representation of a score.
#[derive(Deserialize)]
struct ScoreFile {
    name: Option<String>,
    beat_duration: Option<f64>,
    #[serde(default)]
    notes: Vec<NoteFile>,
}

/// An ordered sequence of notes, optionally with its own tempo.
#[derive(Clone, Debug)]
pub struct Score {
    name: String,
    beat_duration: Option<BeatDuration>,
    notes: Vec<Note>,
}

impl Score {
    /// Deserializes a score from the given file. The file stem names the score
    /// if the file doesn't.
    pub fn deserialize(path: &Path) -> Result<Score, ScoreError> {
        let file = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<ScoreFile>()?;
        let fallback_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("untitled");
        Score::from_file(file, fallback_name)
    }

    fn from_file(file: ScoreFile, fallback_name: &str) -> Result<Score, ScoreError> {
        let beat_duration = file.beat_duration.map(BeatDuration::new).transpose()?;
        let notes = file
            .notes
            .into_iter()
            .enumerate()
            .map(|(index, note)| {
                Note::new(note.keys, note.duration)
                    .map_err(|source| ScoreError::Note { index, source })
            })
            .collect::<Result<Vec<Note>, ScoreError>>()?;

        Ok(Score {
            name: file.name.unwrap_or_else(|| fallback_name.to_string()),
            beat_duration,
            notes,
        })
    }

    /// Gets the name of the score.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the tempo declared by the score, if any.
    pub fn beat_duration(&self) -> Option<BeatDuration> {
        self.beat_duration
    }

    /// Gets the notes of the score in playback order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Picks the tempo to play the score at. An explicit override wins, then the score's
    /// own tempo, then the player configuration's, then the default.
    pub fn tempo(
        &self,
        overridden: Option<f64>,
        player: Option<&Player>,
    ) -> Result<BeatDuration, ConfigError> {
        if let Some(seconds) = overridden {
            return Ok(BeatDuration::new(seconds)?);
        }
        if let Some(beat_duration) = self.beat_duration {
            return Ok(beat_duration);
        }
        match player {
            Some(player) => Ok(player.beat_duration()?.unwrap_or_default()),
            None => Ok(BeatDuration::default()),
        }
    }
}
