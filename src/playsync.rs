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
use std::{
    cell::Cell,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use parking_lot::ReentrantMutex;
use tokio::{
    task::JoinHandle,
    time::{sleep_until, Instant},
};

/// Represents the current cancel state.
#[derive(Clone, Copy, PartialEq)]
enum CancelState {
    Untouched,
    Cancelled,
}

/// A cancel handle is shared between a timer group and whoever may cancel it. Actions fired
/// through the handle and cancellation are mutually exclusive, so once cancel returns no action
/// guarded by the handle will start. The lock is reentrant so an action may cancel its own group.
///
/// Cancelling waits for an action that is already running to return. Checking the state never
/// waits.
#[derive(Clone)]
pub struct CancelHandle {
    cancelled: Arc<ReentrantMutex<Cell<CancelState>>>,
    /// Mirrors the state behind the lock. Only written while the lock is held.
    cancelled_flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Creates a new cancel handle.
    pub fn new() -> CancelHandle {
        CancelHandle {
            cancelled: Arc::new(ReentrantMutex::new(Cell::new(CancelState::Untouched))),
            cancelled_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true if the handle has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled_flag.load(Ordering::Acquire)
    }

    /// Runs the given action unless the handle has been cancelled. Returns true if the action ran.
    pub fn fire<F: FnOnce()>(&self, action: F) -> bool {
        let state = self.cancelled.lock();
        if state.get() == CancelState::Cancelled {
            return false;
        }
        action();
        true
    }

    /// Cancels the handle.
    pub fn cancel(&self) {
        let state = self.cancelled.lock();
        state.set(CancelState::Cancelled);
        self.cancelled_flag.store(true, Ordering::Release);
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        CancelHandle::new()
    }
}

/// A one-shot action to run at a fixed offset from the start of a timer group.
pub struct TimedAction {
    offset: Duration,
    action: Box<dyn FnOnce() + Send + 'static>,
}

impl TimedAction {
    /// Creates a new timed action at the given offset in seconds. Offsets that can't be
    /// represented (negative, NaN) are treated as zero.
    pub fn new<F>(offset_seconds: f64, action: F) -> TimedAction
    where
        F: FnOnce() + Send + 'static,
    {
        let offset = Duration::try_from_secs_f64(offset_seconds).unwrap_or_else(|_| {
            if offset_seconds.is_sign_positive() && !offset_seconds.is_nan() {
                Duration::MAX
            } else {
                Duration::ZERO
            }
        });
        TimedAction {
            offset,
            action: Box::new(action),
        }
    }

    /// Gets the offset of the action from the start of its group.
    pub fn offset(&self) -> Duration {
        self.offset
    }
}

/// A group of timed actions armed together against the tokio timer. Every deadline is fixed
/// relative to the moment the group was armed, and the whole group can be voided at once.
pub struct TimerGroup {
    cancel_handle: CancelHandle,
    finished: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl TimerGroup {
    /// Arms the given actions, which must be in non-decreasing offset order. Must be called
    /// from within a tokio runtime.
    pub fn arm(actions: Vec<TimedAction>) -> TimerGroup {
        let start = Instant::now();
        let cancel_handle = CancelHandle::new();
        let finished = Arc::new(AtomicBool::new(false));

        let join = {
            let cancel_handle = cancel_handle.clone();
            let finished = finished.clone();
            tokio::spawn(async move {
                for TimedAction { offset, action } in actions {
                    match start.checked_add(offset) {
                        Some(deadline) => sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }

                    if !cancel_handle.fire(action) {
                        return;
                    }
                }
                finished.store(true, Ordering::Relaxed);
            })
        };

        TimerGroup {
            cancel_handle,
            finished,
            join,
        }
    }

    /// Voids every action that hasn't fired yet.
    pub fn cancel(&self) {
        self.cancel_handle.cancel();
        self.join.abort();
    }

    /// Returns true if the group has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_handle.is_cancelled()
    }

    /// Returns true if every action in the group has fired.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use parking_lot::Mutex;

    use super::*;
    use crate::testutil::assert_near;

    #[test]
    fn test_cancel_handle_cancelled() {
        let cancel_handle = CancelHandle::new();
        assert!(!cancel_handle.is_cancelled());

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || cancel_handle.cancel())
        };

        assert!(join.join().is_ok());
        assert!(cancel_handle.is_cancelled());
        assert!(!cancel_handle.fire(|| panic!("fired after cancel")));
    }

    #[test]
    fn test_cancel_handle_fire() {
        let cancel_handle = CancelHandle::new();
        let mut fired = false;
        assert!(cancel_handle.fire(|| fired = true));
        assert!(fired);
    }

    #[test]
    fn test_cancel_from_within_action() {
        let cancel_handle = CancelHandle::new();
        let inner = cancel_handle.clone();
        assert!(cancel_handle.fire(move || inner.cancel()));
        assert!(cancel_handle.is_cancelled());
    }

    #[test]
    fn test_is_cancelled_while_action_runs() {
        let cancel_handle = CancelHandle::new();
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || {
                cancel_handle.fire(move || {
                    let _ = entered_tx.send(());
                    let _ = release_rx.recv();
                })
            })
        };

        assert!(entered_rx.recv().is_ok());
        // The action holds the gate; reading the state must not wait for it.
        assert!(!cancel_handle.is_cancelled());
        assert!(release_tx.send(()).is_ok());
        assert!(join.join().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_group_fires_at_offsets() {
        let start = Instant::now();
        let fired: Arc<Mutex<Vec<(usize, Duration)>>> = Arc::new(Mutex::new(Vec::new()));

        let actions = [0.0, 0.25, 1.0]
            .iter()
            .enumerate()
            .map(|(i, offset)| {
                let fired = fired.clone();
                TimedAction::new(*offset, move || fired.lock().push((i, start.elapsed())))
            })
            .collect();
        let group = TimerGroup::arm(actions);

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(group.is_finished());
        let fired = fired.lock();
        assert_eq!(
            fired.iter().map(|(i, _)| *i).collect::<Vec<usize>>(),
            vec![0, 1, 2]
        );
        assert_near(fired[0].1, 0.0);
        assert_near(fired[1].1, 0.25);
        assert_near(fired[2].1, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_group_cancel() {
        let fired: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));

        let actions = (0..4)
            .map(|i| {
                let fired = fired.clone();
                TimedAction::new(i as f64 * 0.5, move || fired.lock().push(i))
            })
            .collect();
        let group = TimerGroup::arm(actions);

        tokio::time::sleep(Duration::from_millis(600)).await;
        group.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(group.is_cancelled());
        assert!(!group.is_finished());
        assert_eq!(*fired.lock(), vec![0, 1]);
    }

    #[test]
    fn test_timed_action_offsets() {
        assert_eq!(TimedAction::new(1.5, || {}).offset(), Duration::from_millis(1500));
        assert_eq!(TimedAction::new(-1.0, || {}).offset(), Duration::ZERO);
        assert_eq!(TimedAction::new(f64::NAN, || {}).offset(), Duration::ZERO);
        assert_eq!(TimedAction::new(f64::INFINITY, || {}).offset(), Duration::MAX);
    }
}
