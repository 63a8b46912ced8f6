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
//! Synchronized playback of a note sequence.
//!
//! A run computes every note's offset up front, then arms one timed action per
//! note (highlight, then sound) plus one completion action against a single
//! cancellable timer group. Only one run is armed at a time.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, span, Level, Span};

use crate::{
    audio::Engine,
    notes::{BeatDuration, Note},
    playsync::{TimedAction, TimerGroup},
    schedule::Schedule,
};

/// Schedules note highlighting and sound so both land on the same offsets.
pub struct Scheduler {
    /// Seconds per beat for every run.
    beat_duration: BeatDuration,
    /// The currently armed run, if any.
    current: Mutex<Option<TimerGroup>>,
    /// The logging span.
    span: Span,
}

impl Scheduler {
    /// Creates a new scheduler with the given tempo.
    pub fn new(beat_duration: BeatDuration) -> Scheduler {
        Scheduler {
            beat_duration,
            current: Mutex::new(None),
            span: span!(Level::INFO, "scheduler"),
        }
    }

    /// Computes the schedule a run of the given notes would use.
    pub fn schedule(&self, notes: &[Note]) -> Schedule {
        Schedule::build(notes, self.beat_duration)
    }

    /// Plays the given notes. For each note, `on_note_start(index)` is called and then the
    /// engine is asked to play the note's keys, both at the note's offset from now. Once the
    /// last note has ended `on_complete` is called. Any previous run is cancelled first.
    ///
    /// Returns immediately; must be called from within a tokio runtime.
    pub fn run<S, C>(
        &self,
        notes: &[Note],
        on_note_start: S,
        on_complete: C,
        engine: Arc<dyn Engine>,
    ) where
        S: Fn(usize) + Send + Sync + 'static,
        C: FnOnce() + Send + 'static,
    {
        let _enter = self.span.enter();

        self.stop();

        let (notes, completion) = self.schedule(notes).into_parts();
        let note_count = notes.len();
        let on_note_start = Arc::new(on_note_start);

        let mut actions: Vec<TimedAction> = notes
            .into_iter()
            .map(|note| {
                let on_note_start = on_note_start.clone();
                let engine = engine.clone();
                TimedAction::new(note.offset, move || {
                    debug!(index = note.index, offset = note.offset, "Note start");
                    on_note_start(note.index);
                    engine.play_chord(&note.keys, note.seconds);
                })
            })
            .collect();
        actions.push(TimedAction::new(completion, move || {
            info!("Run complete");
            on_complete();
        }));

        info!(
            notes = note_count,
            duration = completion,
            engine = engine.to_string(),
            "Run armed"
        );

        let group = TimerGroup::arm(actions);
        // Another run may have been armed in between; it loses.
        let replaced = self.current.lock().replace(group);
        if let Some(replaced) = replaced {
            replaced.cancel();
        }
    }

    /// Cancels the current run. No pending callback of that run fires afterwards.
    ///
    /// A callback of that run which is already executing on another thread is allowed to
    /// finish first, so this blocks for as long as that callback takes. Async callers
    /// should wrap it in `tokio::task::block_in_place`.
    pub fn stop(&self) {
        let previous = self.current.lock().take();
        if let Some(previous) = previous {
            if !previous.is_finished() {
                info!("Run cancelled");
            }
            previous.cancel();
        }
    }

    /// Returns true if a run is armed and hasn't completed.
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|group| !group.is_finished() && !group.is_cancelled())
    }
}
