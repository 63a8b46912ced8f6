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
use std::{
    fmt,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::info;

/// A chord the mock engine was asked to play.
#[derive(Clone, Debug)]
pub struct ChordCall {
    /// The pitch names of the chord.
    pub keys: Vec<String>,
    /// How long the chord was to sound.
    pub duration_seconds: f64,
    /// When the call arrived.
    pub at: Instant,
}

/// A mock engine. Doesn't actually play anything, it records what it was asked to play.
pub struct Engine {
    name: String,
    initialized: AtomicBool,
    initializations: AtomicUsize,
    resumed: AtomicBool,
    calls: Mutex<Vec<ChordCall>>,
}

impl Engine {
    /// Gets the given mock engine.
    pub fn get(name: &str) -> Engine {
        Engine {
            name: name.to_string(),
            initialized: AtomicBool::new(false),
            initializations: AtomicUsize::new(0),
            resumed: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Gets the chords played so far.
    pub fn calls(&self) -> Vec<ChordCall> {
        self.calls.lock().clone()
    }

    /// Gets the number of times the engine actually initialized.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::Relaxed)
    }

    /// Returns true if the engine has been resumed.
    pub fn is_resumed(&self) -> bool {
        self.resumed.load(Ordering::Relaxed)
    }
}

impl super::Engine for Engine {
    fn initialize(&self) {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.initializations.fetch_add(1, Ordering::Relaxed);
            info!(engine = self.name, "Mock engine initialized");
        }
    }

    fn resume(&self) {
        if self.initialized.load(Ordering::Acquire) {
            self.resumed.store(true, Ordering::Relaxed);
        }
    }

    fn play_chord(&self, keys: &[String], duration_seconds: f64) {
        if !self.initialized.load(Ordering::Acquire) {
            return;
        }
        info!(engine = self.name, ?keys, duration_seconds, "Playing chord");
        self.calls.lock().push(ChordCall {
            keys: keys.to_vec(),
            duration_seconds,
            at: Instant::now(),
        });
    }

    fn is_available(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
