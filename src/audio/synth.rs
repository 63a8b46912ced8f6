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
//! Tone mixing that can be driven by both CPAL and test outputs.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::timeline::Timeline;
use super::tone::Tone;

/// Mixes active tones into interleaved output buffers and advances the timeline by every frame
/// it renders.
#[derive(Clone)]
pub struct Synth {
    /// Tones currently sounding or waiting for their start frame.
    tones: Arc<Mutex<Vec<Tone>>>,
    /// Channel for adding tones without contending with the render lock.
    tone_tx: Sender<Tone>,
    /// Channel receiver drained at the start of every render.
    tone_rx: Receiver<Tone>,
    /// The timeline clock, owned by the output.
    timeline: Timeline,
    /// Number of interleaved output channels.
    channels: u16,
}

impl Synth {
    /// Creates a new synth.
    pub fn new(timeline: Timeline, channels: u16) -> Synth {
        let (tone_tx, tone_rx) = crossbeam_channel::unbounded();
        Synth {
            tones: Arc::new(Mutex::new(Vec::new())),
            tone_tx,
            tone_rx,
            timeline,
            channels: channels.max(1),
        }
    }

    /// Gets the timeline this synth drives.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Adds a tone to be rendered.
    pub fn add_tone(&self, tone: Tone) {
        // The receiver lives as long as self, so this can't fail.
        let _ = self.tone_tx.send(tone);
    }

    /// Gets the tones that haven't stopped yet, including ones still queued.
    pub fn active_tones(&self) -> Vec<Tone> {
        let mut tones = self.tones.lock();
        tones.extend(self.tone_rx.try_iter());
        tones.clone()
    }

    /// Renders into the given interleaved buffer. Every channel carries the same mono mix.
    /// Tones that have stopped by the end of the buffer are discarded.
    pub fn render(&self, output: &mut [f32]) {
        let channels = self.channels as usize;
        let frames = output.len() / channels;
        let start = self.timeline.current_frame();

        let mut tones = self.tones.lock();
        tones.extend(self.tone_rx.try_iter());

        for (i, frame) in output.chunks_mut(channels).enumerate() {
            let position = start + i as u64;
            let sample: f32 = tones.iter().map(|tone| tone.sample_at(position)).sum();
            frame.fill(sample);
        }

        let end = start + frames as u64;
        tones.retain(|tone| !tone.is_finished(end));
        drop(tones);

        self.timeline.advance(frames as u64);
    }
}
