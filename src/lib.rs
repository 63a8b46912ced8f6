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
//! Score playback that keeps note highlighting and synthesized sound in sync.
//!
//! A [`scheduler::Scheduler`] computes every note's start offset ahead of time
//! and fires a highlight callback and an [`audio::Engine`] chord at each one.
//! The engine places tones on its own audio timeline, so what you hear is
//! immune to timer jitter.
pub mod audio;
pub mod config;
pub mod notes;
pub mod pitch;
pub mod playsync;
pub mod schedule;
pub mod scheduler;
#[cfg(test)]
mod testutil;
