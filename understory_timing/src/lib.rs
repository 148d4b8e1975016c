// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_timing --heading-base-level=0

//! Understory Timing: host-agnostic timer queue primitives for UI runtimes.
//!
//! UI code often needs to defer work: debounce a search box, throttle a
//! pointer-move handler, or fire a tooltip after a hover delay. The host
//! decides how time actually passes (a browser `setTimeout`, an event loop
//! deadline, a test that advances a fake clock), so this crate only defines
//! the seam and a few building blocks on top of it:
//!
//! - [`Scheduler`]: the timer facility a runtime exposes.
//! - [`TimerQueue`]: a manually advanced clock + timer queue. Useful for
//!   headless runtimes and for deterministic tests.
//! - [`Debouncer`]: run only the last of a burst of calls, once the burst has
//!   been quiet for a window.
//! - [`Throttle`]: admit at most one call per window (leading edge).
//!
//! Times are plain milliseconds (`u64`) on a monotonic clock chosen by the
//! scheduler.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_timing::{Debouncer, Scheduler, TimerQueue};
//!
//! let queue = Rc::new(TimerQueue::new());
//! let debounce = Debouncer::new(queue.clone(), 100);
//! let runs = Rc::new(Cell::new(0));
//!
//! for _ in 0..5 {
//!     let runs = runs.clone();
//!     debounce.call(move || runs.set(runs.get() + 1));
//!     queue.advance_by(20);
//! }
//! assert_eq!(runs.get(), 0);
//!
//! queue.advance_by(100);
//! assert_eq!(runs.get(), 1);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod queue;
mod rate_limit;

pub use queue::TimerQueue;
pub use rate_limit::{Debouncer, Throttle};

use alloc::boxed::Box;

/// Identifies one scheduled timer.
///
/// IDs are unique per scheduler and never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Timer facility provided by the host runtime.
///
/// Implementations are single threaded and take `&self`; callbacks are run
/// by the host some time after their deadline, never synchronously from
/// inside [`set_timeout`](Scheduler::set_timeout).
pub trait Scheduler {
    /// Current time in milliseconds on the scheduler's monotonic clock.
    fn now(&self) -> u64;

    /// Schedule `callback` to run once, `delay` milliseconds from now.
    fn set_timeout(&self, delay: u64, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a pending timer.
    ///
    /// Returns `true` if the timer was still pending. Clearing a timer that
    /// already fired (or was already cleared) is a no-op.
    fn clear_timeout(&self, id: TimerId) -> bool;
}
