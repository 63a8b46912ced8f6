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
//! Look-ahead schedule computation.
//!
//! Every offset is computed up front by a single left-to-right fold over the
//! notes, so a late callback can never push back the notes after it.

use crate::notes::{BeatDuration, Note};

/// A note placed on the run's timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledNote {
    /// The position of the note in the sequence.
    pub index: usize,
    /// Seconds from the start of the run at which the note starts.
    pub offset: f64,
    /// The pitch names to sound.
    pub keys: Vec<String>,
    /// How long the note sounds, in seconds.
    pub seconds: f64,
}

/// The computed offsets for a sequence of notes plus the completion offset.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    notes: Vec<ScheduledNote>,
    completion: f64,
}

impl Schedule {
    /// Builds the schedule for the given notes. offset[0] is zero and every
    /// later offset is the previous one plus the previous note's length.
    pub fn build(notes: &[Note], beat_duration: BeatDuration) -> Schedule {
        let mut scheduled = Vec::with_capacity(notes.len());
        let completion = notes
            .iter()
            .enumerate()
            .fold(0.0, |offset, (index, note)| {
                let seconds = beat_duration.to_seconds(note.duration());
                scheduled.push(ScheduledNote {
                    index,
                    offset,
                    keys: note.keys().to_vec(),
                    seconds,
                });
                offset + seconds
            });

        Schedule {
            notes: scheduled,
            completion,
        }
    }

    /// Gets the scheduled notes in sequence order.
    pub fn notes(&self) -> &[ScheduledNote] {
        &self.notes
    }

    /// Gets the start offset of each note.
    pub fn offsets(&self) -> Vec<f64> {
        self.notes.iter().map(|note| note.offset).collect()
    }

    /// Gets the offset at which the run completes.
    pub fn completion(&self) -> f64 {
        self.completion
    }

    /// Returns true if there are no notes to play.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Splits the schedule into its notes and completion offset.
    pub fn into_parts(self) -> (Vec<ScheduledNote>, f64) {
        (self.notes, self.completion)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn notes(durations: &[f64]) -> Vec<Note> {
        durations
            .iter()
            .map(|duration| Note::new(["c/4"], *duration).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_schedule() {
        let schedule = Schedule::build(&[], BeatDuration::default());
        assert!(schedule.is_empty());
        assert_eq!(schedule.completion(), 0.0);
    }

    #[test]
    fn test_cumulative_offsets() {
        let beat = BeatDuration::new(2.0).unwrap();
        let schedule = Schedule::build(&notes(&[0.5, 0.25, 1.0]), beat);

        assert_eq!(schedule.offsets(), vec![0.0, 1.0, 1.5]);
        assert_eq!(schedule.completion(), 3.5);
        assert_eq!(
            schedule
                .notes()
                .iter()
                .map(|note| note.seconds)
                .collect::<Vec<f64>>(),
            vec![1.0, 0.5, 2.0]
        );
    }

    #[test]
    fn test_two_note_scenario() {
        let notes = vec![
            Note::new(["c/4"], 0.5).unwrap(),
            Note::new(["d/4"], 0.5).unwrap(),
        ];
        let schedule = Schedule::build(&notes, BeatDuration::new(1.0).unwrap());

        assert_eq!(
            schedule.notes(),
            &[
                ScheduledNote {
                    index: 0,
                    offset: 0.0,
                    keys: vec!["c/4".to_string()],
                    seconds: 0.5,
                },
                ScheduledNote {
                    index: 1,
                    offset: 0.5,
                    keys: vec!["d/4".to_string()],
                    seconds: 0.5,
                },
            ]
        );
        assert_eq!(schedule.completion(), 1.0);
    }

    #[test]
    fn test_offsets_are_monotonic() {
        let durations: Vec<f64> = (1..=64).map(|i| (i % 7 + 1) as f64 * 0.1).collect();
        let schedule = Schedule::build(&notes(&durations), BeatDuration::new(0.37).unwrap());

        let offsets = schedule.offsets();
        assert_eq!(offsets[0], 0.0);
        for pair in offsets.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(offsets[offsets.len() - 1] <= schedule.completion());

        // Each offset is the previous one plus the previous note's length.
        for pair in schedule.notes().windows(2) {
            assert_eq!(pair[1].offset, pair[0].offset + pair[0].seconds);
        }
    }
}
