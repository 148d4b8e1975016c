// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Native listener options for a binding.
//!
//! Bindings use the plain capture flag, except for event types that can
//! block scrolling: those are always registered passive, so a handler can
//! never delay page scroll or touch panning with `preventDefault`.
//!
//! ```
//! use understory_dom_events::event::ListenerOptions;
//! use understory_dom_events::policy::listener_options;
//!
//! assert_eq!(listener_options("click", true), ListenerOptions::Capture(true));
//! assert_eq!(
//!     listener_options("mousemove", true),
//!     ListenerOptions::Passive { capture: true }
//! );
//! ```

use crate::event::ListenerOptions;

/// Event types forced to passive listeners.
pub const SCROLL_BLOCKING_EVENTS: &[&str] = &[
    "touchstart",
    "touchmove",
    "mousedown",
    "mouseup",
    "mousemove",
    "wheel",
    "mousewheel",
];

/// Returns `true` for event types in [`SCROLL_BLOCKING_EVENTS`].
#[must_use]
pub fn is_scroll_blocking(event_name: &str) -> bool {
    SCROLL_BLOCKING_EVENTS.contains(&event_name)
}

/// Options for attaching a listener for `event_name`.
#[must_use]
pub fn listener_options(event_name: &str, use_capture: bool) -> ListenerOptions {
    if is_scroll_blocking(event_name) {
        ListenerOptions::Passive {
            capture: use_capture,
        }
    } else {
        ListenerOptions::Capture(use_capture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scroll_blocking_event_is_passive() {
        for name in SCROLL_BLOCKING_EVENTS {
            for capture in [false, true] {
                let options = listener_options(name, capture);
                assert!(options.passive(), "{name} must be passive");
                assert_eq!(options.capture(), capture);
            }
        }
    }

    #[test]
    fn other_events_use_capture_flag() {
        assert_eq!(
            listener_options("keydown", false),
            ListenerOptions::Capture(false)
        );
        assert_eq!(
            listener_options("touchend", true),
            ListenerOptions::Capture(true)
        );
    }
}
