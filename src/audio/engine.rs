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
//! The timeline backed tone engine.
//!
//! Tone start and stop instants are absolute frames on the output's timeline,
//! so audible timing doesn't depend on when the scheduler's timer happens to
//! fire.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{debug, info, span, warn, Level};

use super::output::{Output, Stream};
use super::synth::Synth;
use super::timeline::Timeline;
use super::tone::Tone;
use crate::pitch;

/// The live half of an initialized engine.
struct Running {
    synth: Synth,
    stream: Box<dyn Stream>,
}

/// Synthesizes chords on an audio timeline.
pub struct ToneEngine {
    /// The output capability. Decides whether audio is available at all.
    output: Arc<dyn Output>,
    /// Set by the first successful initialize and kept for the rest of the session.
    running: Mutex<Option<Arc<Running>>>,
}

impl ToneEngine {
    /// Creates a new, uninitialized engine.
    pub fn new(output: Arc<dyn Output>) -> ToneEngine {
        ToneEngine {
            output,
            running: Mutex::new(None),
        }
    }

    fn running(&self) -> Option<Arc<Running>> {
        self.running.lock().clone()
    }

    /// Gets the timeline clock, if the engine has been initialized.
    pub fn timeline(&self) -> Option<Timeline> {
        self.running().map(|running| running.synth.timeline().clone())
    }
}

impl super::Engine for ToneEngine {
    fn initialize(&self) {
        let mut running = self.running.lock();
        if running.is_some() {
            return;
        }

        let format = match self.output.format() {
            Ok(format) => format,
            Err(e) => {
                warn!(
                    output = self.output.to_string(),
                    err = e.as_ref(),
                    "Audio unavailable, playback will be silent"
                );
                return;
            }
        };

        let synth = Synth::new(Timeline::new(format.sample_rate), format.channels);
        match self.output.open(format, synth.clone()) {
            Ok(stream) => {
                info!(
                    output = self.output.to_string(),
                    sample_rate = format.sample_rate,
                    channels = format.channels,
                    "Audio engine initialized"
                );
                *running = Some(Arc::new(Running { synth, stream }));
            }
            Err(e) => warn!(
                output = self.output.to_string(),
                err = e.as_ref(),
                "Unable to open audio output, playback will be silent"
            ),
        }
    }

    fn resume(&self) {
        let Some(running) = self.running() else {
            return;
        };
        if running.stream.is_running() {
            return;
        }

        match running.stream.resume() {
            Ok(()) => info!(output = self.output.to_string(), "Audio engine resumed"),
            Err(e) => warn!(err = e.as_ref(), "Unable to resume audio output"),
        }
    }

    fn play_chord(&self, keys: &[String], duration_seconds: f64) {
        let Some(running) = self.running() else {
            debug!(?keys, "Audio engine not initialized, ignoring chord");
            return;
        };

        let span = span!(Level::DEBUG, "play chord");
        let _enter = span.enter();

        // Every key shares a single start instant so the chord sounds in unison.
        let timeline = running.synth.timeline();
        let now = timeline.current_frame();
        let stop = now.saturating_add(timeline.frames_for(duration_seconds));

        for key in keys {
            let frequency = pitch::frequency(key);
            running
                .synth
                .add_tone(Tone::new(frequency, now, stop, timeline.sample_rate()));
        }
        debug!(
            ?keys,
            start = timeline.seconds_at(now),
            duration_seconds,
            "Chord scheduled"
        );
    }

    fn is_available(&self) -> bool {
        self.running.lock().is_some()
    }
}

impl fmt::Display for ToneEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Tone)", self.output)
    }
}

#[cfg(test)]
mod test {
    use super::super::output::manual::Manual;
    use super::super::output::Unavailable;
    use super::super::tone::{FLOOR_GAIN, INITIAL_GAIN};
    use super::super::Engine;
    use super::*;

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|key| key.to_string()).collect()
    }

    #[test]
    fn test_uninitialized_play_chord_is_silent() {
        let output = Arc::new(Manual::new(44100, 2));
        let engine = ToneEngine::new(output.clone());

        engine.play_chord(&keys(&["c/4"]), 1.0);
        engine.resume();

        assert!(!engine.is_available());
        assert!(engine.timeline().is_none());
        assert_eq!(output.opened(), 0);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let output = Arc::new(Manual::new(44100, 2));
        let engine = ToneEngine::new(output.clone());

        engine.initialize();
        let timeline = engine.timeline().unwrap();
        timeline.advance(100);
        engine.initialize();

        assert!(engine.is_available());
        assert_eq!(output.opened(), 1);
        assert_eq!(engine.timeline().unwrap().current_frame(), 100);
    }

    #[test]
    fn test_unavailable_output() {
        let engine = ToneEngine::new(Arc::new(Unavailable));

        engine.initialize();
        engine.initialize();
        engine.resume();
        engine.play_chord(&keys(&["c/4", "e/4"]), 0.5);

        assert!(!engine.is_available());
        assert_eq!(engine.to_string(), "none (Unavailable) (Tone)");
    }

    #[test]
    fn test_resume() {
        let output = Arc::new(Manual::new(44100, 2));
        let engine = ToneEngine::new(output.clone());

        engine.resume();
        assert!(!output.is_running());

        engine.initialize();
        assert!(!output.is_running());
        engine.resume();
        assert!(output.is_running());
    }

    #[test]
    fn test_chord_unison() {
        let output = Arc::new(Manual::new(44100, 2));
        let engine = ToneEngine::new(output.clone());
        engine.initialize();
        engine.resume();

        let synth = output.synth().unwrap();
        let mut buffer = vec![0.0f32; 2 * 1234];
        synth.render(&mut buffer);
        let now = synth.timeline().current_frame();

        engine.play_chord(&keys(&["c/4", "e/4", "g/4"]), 1.0);

        let tones = synth.active_tones();
        assert_eq!(tones.len(), 3);
        assert_eq!(
            tones.iter().map(Tone::frequency).collect::<Vec<f64>>(),
            vec![261.63, 329.63, 392.0]
        );
        for tone in tones.iter() {
            assert_eq!(tone.start_frame(), now);
            assert_eq!(tone.stop_frame(), now + 44100);
            assert!((tone.stop_time() - tone.start_time() - 1.0).abs() < 1e-9);
            assert_eq!(tone.gain_at(now), INITIAL_GAIN);
        }
        assert!(tones[0].gain_at(now + 44099) < FLOOR_GAIN * 1.01);
    }

    #[test]
    fn test_unknown_key_sounds_default() {
        let output = Arc::new(Manual::new(44100, 1));
        let engine = ToneEngine::new(output.clone());
        engine.initialize();

        engine.play_chord(&keys(&["h/9"]), 0.25);

        let tones = output.synth().unwrap().active_tones();
        assert_eq!(tones.len(), 1);
        assert_eq!(tones[0].frequency(), pitch::DEFAULT_FREQUENCY);
    }

    #[test]
    fn test_tones_release_after_stop() {
        let output = Arc::new(Manual::new(1000, 1));
        let engine = ToneEngine::new(output.clone());
        engine.initialize();

        engine.play_chord(&keys(&["a/4", "a/5"]), 0.1);
        let synth = output.synth().unwrap();
        assert_eq!(synth.active_tones().len(), 2);

        let mut buffer = vec![0.0f32; 100];
        synth.render(&mut buffer);
        assert!(buffer.iter().any(|sample| *sample != 0.0));
        assert!(synth.active_tones().is_empty());
    }
}
