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

use std::{
    thread,
    time::{Duration, SystemTime},
};

/// How far a virtual-clock firing may land past its deadline. The tokio timer rounds
/// deadlines up to the millisecond.
const TIMER_TOLERANCE: Duration = Duration::from_millis(2);

/// Asserts that the given elapsed time lands on the expected offset in seconds.
#[track_caller]
pub fn assert_near(actual: Duration, expected_seconds: f64) {
    let expected = Duration::from_secs_f64(expected_seconds);
    assert!(
        actual >= expected && actual <= expected + TIMER_TOLERANCE,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

/// Wait for the given predicate to return true or fail.
#[inline]
pub fn eventually<F>(predicate: F, error_msg: &str)
where
    F: Fn() -> bool,
{
    let start = SystemTime::now();
    let mut tick = Duration::from_millis(5);
    let timeout = Duration::from_secs(10);
    let max_tick = Duration::from_millis(100);

    loop {
        let elapsed = start.elapsed();
        if elapsed.is_err() {
            panic!("System time error");
        }
        let elapsed = elapsed.unwrap();

        if elapsed > timeout {
            panic!("{}", error_msg);
        }
        if predicate() {
            return;
        }

        thread::sleep(tick);
        tick = std::cmp::min(tick * 2, max_tick);
    }
}
