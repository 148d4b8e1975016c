// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debounce and throttle on top of a [`Scheduler`].

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use crate::{Scheduler, TimerId};

/// Runs only the last call of a burst, once no call arrived for `delay` ms.
///
/// Every [`call`](Debouncer::call) cancels the previously scheduled call and
/// schedules the new one. Dropping the debouncer does not cancel the pending
/// call; use [`cancel`](Debouncer::cancel) for that.
pub struct Debouncer {
    scheduler: Rc<dyn Scheduler>,
    delay: u64,
    pending: Rc<Cell<Option<TimerId>>>,
}

impl fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("pending", &self.pending.get())
            .finish_non_exhaustive()
    }
}

impl Debouncer {
    /// Creates a debouncer with a quiet window of `delay` milliseconds.
    pub fn new(scheduler: Rc<dyn Scheduler>, delay: u64) -> Self {
        Self {
            scheduler,
            delay,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// The quiet window in milliseconds.
    #[must_use]
    pub fn delay(&self) -> u64 {
        self.delay
    }

    /// Replace any pending call with `f`, restarting the quiet window.
    pub fn call(&self, f: impl FnOnce() + 'static) {
        self.cancel();
        let pending = Rc::clone(&self.pending);
        let id = self.scheduler.set_timeout(
            self.delay,
            Box::new(move || {
                pending.set(None);
                f();
            }),
        );
        self.pending.set(Some(id));
    }

    /// Cancel the pending call, if any. Returns `true` if one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.take() {
            Some(id) => self.scheduler.clear_timeout(id),
            None => false,
        }
    }

    /// Returns `true` while a call is scheduled and has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

/// Admits at most one call per window, on the leading edge.
///
/// The first call is admitted immediately; calls arriving less than `window`
/// ms after the last admitted call are rejected (not deferred).
pub struct Throttle {
    scheduler: Rc<dyn Scheduler>,
    window: u64,
    last: Cell<Option<u64>>,
}

impl fmt::Debug for Throttle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("window", &self.window)
            .field("last", &self.last.get())
            .finish_non_exhaustive()
    }
}

impl Throttle {
    /// Creates a throttle admitting one call per `window` milliseconds.
    pub fn new(scheduler: Rc<dyn Scheduler>, window: u64) -> Self {
        Self {
            scheduler,
            window,
            last: Cell::new(None),
        }
    }

    /// The window in milliseconds.
    #[must_use]
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Returns `true` and opens a new window if the current one has elapsed.
    pub fn try_acquire(&self) -> bool {
        let now = self.scheduler.now();
        let open = self
            .last
            .get()
            .is_none_or(|last| now.saturating_sub(last) >= self.window);
        if open {
            self.last.set(Some(now));
        }
        open
    }

    /// Forget the last admitted call; the next call is admitted.
    pub fn reset(&self) {
        self.last.set(None);
    }
}
