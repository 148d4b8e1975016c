// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Low-level event utilities: the DOM seam, listener attach/detach, pointer
//! positions, and the separator tokens of the binding-name grammar.
//!
//! ## Grammar tokens
//!
//! A binding name looks like
//!
//! ```text
//! domevent:click,touchend list li.item | enter | debounce(100)
//! ^^^^^^^^ ^^^^^^^^^^^^^^ ^^^^ ^^^^^^^   ^^^^^   ^^^^^^^^^^^^^
//! prefix   event names    ref  selector  modifier keywords
//! ```
//!
//! The tokens below are distinct and never valid inside an event name or a
//! reference name. Selectors may contain [`PATH_SEPARATOR`] (descendant
//! combinators); everything after the reference is re-joined into the
//! selector.

use alloc::rc::Rc;
use core::fmt;

use kurbo::Point;

/// Prefix every binding name starts with.
pub const DOM_EVENT_PREFIX: &str = "domevent";

/// Separates [`DOM_EVENT_PREFIX`] from the event spec. Only the first
/// occurrence counts.
pub const DOM_EVENT_SEPARATOR: &str = ":";

/// Joins several event names sharing one binding configuration.
pub const NAME_SEPARATOR: &str = ",";

/// Separates the event names, the target reference and the delegate selector.
pub const PATH_SEPARATOR: &str = " ";

/// Separates the binding path from each modifier keyword.
pub const CHECK_SEPARATOR: &str = "|";

/// Target reference naming the component's own root element.
pub const ROOT_REF: &str = "$el";

/// A native listener. Identity is pointer identity: removing a listener
/// requires the same `Rc` that was attached.
pub type Listener<Ev> = Rc<dyn Fn(&Ev)>;

/// Options passed to native listener attachment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenerOptions {
    /// Plain boolean form: `true` registers a capture-phase listener.
    Capture(bool),
    /// Object form `{ passive: true, capture }`.
    Passive {
        /// Register for the capture phase.
        capture: bool,
    },
}

impl ListenerOptions {
    /// Returns `true` for capture-phase listeners.
    #[must_use]
    pub fn capture(self) -> bool {
        match self {
            Self::Capture(capture) | Self::Passive { capture } => capture,
        }
    }

    /// Returns `true` if the listener promised not to call `preventDefault`.
    #[must_use]
    pub fn passive(self) -> bool {
        matches!(self, Self::Passive { .. })
    }
}

impl Default for ListenerOptions {
    fn default() -> Self {
        Self::Capture(false)
    }
}

/// A native event as seen by bindings.
///
/// Only `event_type` and `target` are required; the remaining accessors
/// return `None` for events that do not carry that information.
pub trait DomEvent {
    /// The element handle type this event targets.
    type Element;

    /// Event type, e.g. `"click"`.
    fn event_type(&self) -> &str;

    /// The element the event was originally dispatched to.
    fn target(&self) -> Option<Self::Element>;

    /// Physical key identifier (`KeyboardEvent.code`), e.g. `"KeyA"`.
    fn code(&self) -> Option<&str> {
        None
    }

    /// Logical key identifier (`KeyboardEvent.key`), e.g. `"Enter"`.
    fn key(&self) -> Option<&str> {
        None
    }

    /// Pointer position in page coordinates.
    fn page_point(&self) -> Option<Point> {
        None
    }

    /// Page position of the first active touch point.
    fn first_touch(&self) -> Option<Point> {
        None
    }
}

/// A handle to a native element.
///
/// Handles are cheap to clone and compare equal when they refer to the same
/// element.
pub trait DomElement: Clone + PartialEq + fmt::Debug + 'static {
    /// The event type delivered to listeners on this element.
    type Event: DomEvent<Element = Self> + Clone + 'static;

    /// Returns `true` if this element matches the selector.
    fn matches(&self, selector: &str) -> bool;

    /// The parent element, or `None` at the root or for detached elements.
    fn parent_element(&self) -> Option<Self>;

    /// Attach `listener` for `event_name`.
    fn add_event_listener(
        &self,
        event_name: &str,
        listener: &Listener<Self::Event>,
        options: ListenerOptions,
    );

    /// Detach `listener` for `event_name`.
    ///
    /// Must be a no-op when the listener is not attached, including when
    /// the element has already been removed from its document.
    fn remove_event_listener(
        &self,
        event_name: &str,
        listener: &Listener<Self::Event>,
        options: ListenerOptions,
    );
}

/// Attach a listener through the element handle.
pub fn add_event<El: DomElement>(
    el: &El,
    event_name: &str,
    listener: &Listener<El::Event>,
    options: ListenerOptions,
) {
    tracing::debug!(event = event_name, ?options, element = ?el, "add listener");
    el.add_event_listener(event_name, listener, options);
}

/// Detach a listener previously attached with [`add_event`].
pub fn remove_event<El: DomElement>(
    el: &El,
    event_name: &str,
    listener: &Listener<El::Event>,
    options: ListenerOptions,
) {
    tracing::debug!(event = event_name, element = ?el, "remove listener");
    el.remove_event_listener(event_name, listener, options);
}

/// Normalized pointer position of an event.
///
/// Touch events report their first touch point, pointer events their page
/// position. Events without a position (keyboard, focus) map to the origin.
pub fn pos_xy<Ev: DomEvent + ?Sized>(event: &Ev) -> Point {
    event
        .first_touch()
        .or_else(|| event.page_point())
        .unwrap_or(Point::ORIGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeEvent {
        page: Option<Point>,
        touch: Option<Point>,
    }

    impl DomEvent for FakeEvent {
        type Element = ();

        fn event_type(&self) -> &str {
            "fake"
        }

        fn target(&self) -> Option<()> {
            None
        }

        fn page_point(&self) -> Option<Point> {
            self.page
        }

        fn first_touch(&self) -> Option<Point> {
            self.touch
        }
    }

    #[test]
    fn pos_prefers_first_touch() {
        let ev = FakeEvent {
            page: Some(Point::new(1.0, 2.0)),
            touch: Some(Point::new(30.0, 40.0)),
        };
        assert_eq!(pos_xy(&ev), Point::new(30.0, 40.0));
    }

    #[test]
    fn pos_falls_back_to_page_then_origin() {
        let ev = FakeEvent {
            page: Some(Point::new(1.0, 2.0)),
            touch: None,
        };
        assert_eq!(pos_xy(&ev), Point::new(1.0, 2.0));

        let ev = FakeEvent {
            page: None,
            touch: None,
        };
        assert_eq!(pos_xy(&ev), Point::ORIGIN);
    }

    #[test]
    fn options_accessors() {
        assert!(ListenerOptions::Capture(true).capture());
        assert!(!ListenerOptions::Capture(true).passive());
        let passive = ListenerOptions::Passive { capture: false };
        assert!(passive.passive());
        assert!(!passive.capture());
        assert_eq!(ListenerOptions::default(), ListenerOptions::Capture(false));
    }

    #[test]
    fn separators_are_distinct() {
        let tokens = [
            DOM_EVENT_SEPARATOR,
            NAME_SEPARATOR,
            PATH_SEPARATOR,
            CHECK_SEPARATOR,
        ];
        for (i, a) in tokens.iter().enumerate() {
            for b in &tokens[i + 1..] {
                assert!(!a.contains(b) && !b.contains(a), "{a:?} overlaps {b:?}");
            }
        }
    }
}
