// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A manually advanced timer queue.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashMap;

use crate::{Scheduler, TimerId};

type Callback = Box<dyn FnOnce()>;

#[derive(Default)]
struct QueueState {
    now: u64,
    next_id: u64,
    /// Keyed by `(deadline, id)` so equal deadlines fire in scheduling order.
    timers: BTreeMap<(u64, TimerId), Callback>,
    deadlines: HashMap<TimerId, u64>,
}

/// A [`Scheduler`] whose clock only moves when told to.
///
/// Timers fire from [`advance_to`](TimerQueue::advance_to) and
/// [`advance_by`](TimerQueue::advance_by), in deadline order. Ties fire in
/// the order they were scheduled. While a timer runs the clock reads that
/// timer's deadline, and no internal borrow is held, so callbacks may
/// schedule or clear other timers. Timers scheduled by a callback fire in the
/// same advance if their deadline is still within the target time.
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use understory_timing::{Scheduler, TimerQueue};
///
/// let queue = TimerQueue::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let l = log.clone();
/// queue.set_timeout(30, Box::new(move || l.borrow_mut().push("b")));
/// let l = log.clone();
/// queue.set_timeout(10, Box::new(move || l.borrow_mut().push("a")));
///
/// assert_eq!(queue.advance_by(20), 1);
/// assert_eq!(queue.advance_by(20), 1);
/// assert_eq!(*log.borrow(), ["a", "b"]);
/// assert_eq!(queue.now(), 40);
/// ```
#[derive(Default)]
pub struct TimerQueue {
    state: RefCell<QueueState>,
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("TimerQueue")
            .field("now", &state.now)
            .field("pending", &state.timers.len())
            .finish_non_exhaustive()
    }
}

impl TimerQueue {
    /// Creates an empty queue with the clock at `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue with the clock at `now`.
    #[must_use]
    pub fn starting_at(now: u64) -> Self {
        Self {
            state: RefCell::new(QueueState {
                now,
                ..QueueState::default()
            }),
        }
    }

    /// Number of timers that have not fired or been cleared.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Deadline of the earliest pending timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.state
            .borrow()
            .timers
            .keys()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    /// Move the clock forward to `target`, firing every timer due by then.
    ///
    /// Returns the number of timers fired. A `target` in the past leaves the
    /// clock where it is.
    pub fn advance_to(&self, target: u64) -> usize {
        let mut fired = 0;
        loop {
            let callback = {
                let mut state = self.state.borrow_mut();
                match state.timers.first_key_value() {
                    Some((&(deadline, _), _)) if deadline <= target => {}
                    _ => break,
                }
                let Some(((deadline, id), callback)) = state.timers.pop_first() else {
                    break;
                };
                state.deadlines.remove(&id);
                state.now = state.now.max(deadline);
                callback
            };
            callback();
            fired += 1;
        }
        let mut state = self.state.borrow_mut();
        state.now = state.now.max(target);
        fired
    }

    /// Move the clock forward by `delta` milliseconds. See [`advance_to`](Self::advance_to).
    pub fn advance_by(&self, delta: u64) -> usize {
        let target = self.now().saturating_add(delta);
        self.advance_to(target)
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> u64 {
        self.state.borrow().now
    }

    fn set_timeout(&self, delay: u64, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id += 1;
        let deadline = state.now.saturating_add(delay);
        state.timers.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);
        id
    }

    fn clear_timeout(&self, id: TimerId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.deadlines.remove(&id) {
            Some(deadline) => state.timers.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }
}
