// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dom_events --heading-base-level=0

//! Understory DOM Events: declarative, guarded DOM event bindings.
//!
//! A component declares its event handlers by *name*. A name that starts with
//! `domevent:` is a binding: it says which events to listen for, on which
//! element, and which guards must pass before the handler runs.
//!
//! ```text
//! domevent:click,touchend list li.item | enter | isOpen | before(lock) | debounce(100)
//! ^^^^^^^^ ^^^^^^^^^^^^^^ ^^^^ ^^^^^^^   ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! prefix   event names    ref  delegate  modifiers
//! ```
//!
//! - **Event names** are comma-joined; each gets its own listener.
//! - **Target** is a named element known to the component (`$el`, or nothing,
//!   means the component's root).
//! - **Delegate selector**: the rest of the path. The handler only runs when
//!   the event target or one of its ancestors, up to the bound element,
//!   matches it.
//! - **Modifiers** are `|`-separated keywords: `before(hook param)`,
//!   `after(hook param)`, `debounce(ms)`, `throttle(ms)`, `capture`, the name
//!   of a component member used as a check, or a keycode such as `enter`.
//!
//! Every occurrence runs through the same pipeline: delegation, before hooks,
//! keycode filter, checks, the handler, then after hooks unless the handler
//! returned [`Outcome::Stop`]. A rejected occurrence is skipped silently.
//!
//! ## Modules
//!
//! - [`descriptor`]: the binding-name grammar.
//! - [`policy`]: listener options, including passive scroll-blocking events.
//! - [`component`]: what a component exposes to its bindings, and
//!   [`ComponentTable`], a ready-made implementation.
//! - [`pipeline`]: the guarded handler pipeline and delegation matching.
//! - [`registry`]: [`DomEventHandler`], which owns live bindings and tears
//!   them down.
//! - [`event`]: the [`DomElement`] / [`DomEvent`] abstraction over a DOM.
//! - [`headless`]: an in-memory DOM implementing that abstraction.
//!
//! Debounced and throttled bindings are driven by an
//! [`understory_timing::Scheduler`].
//!
//! ## Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_dom_events::headless::{HeadlessDocument, HeadlessElement, HeadlessEvent};
//! use understory_dom_events::{ComponentTable, DomEvent, DomEventHandler, EventContext};
//! use understory_timing::TimerQueue;
//!
//! let doc = HeadlessDocument::new();
//! let input = doc.create_element("input");
//! doc.body().append_child(&input);
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let mut table = ComponentTable::<HeadlessElement>::new();
//! let l = log.clone();
//! table
//!     .set_root(doc.body())
//!     .insert_ref("search", input.clone())
//!     .on(
//!         "domevent:keydown search | enter",
//!         move |ev: &HeadlessEvent, _: &EventContext<HeadlessElement>| {
//!             l.borrow_mut().push(ev.key().map(str::to_owned));
//!         },
//!     );
//!
//! let timers = Rc::new(TimerQueue::new());
//! let mut handler = DomEventHandler::new(table, timers);
//! handler.initialize()?;
//!
//! input.dispatch_event(HeadlessEvent::new("keydown").with_key("a"));
//! input.dispatch_event(HeadlessEvent::new("keydown").with_key("Enter"));
//! assert_eq!(*log.borrow(), [Some("Enter".to_string())]);
//!
//! handler.destroy();
//! # Ok::<(), understory_dom_events::InitializeError>(())
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`.
//!
//! ## Features
//!
//! - `std` (default): forwards to Kurbo's `std` feature.
//! - `libm`: forwards to Kurbo's `libm` feature for `no_std` builds.

#![no_std]

extern crate alloc;

pub mod component;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod headless;
pub mod pipeline;
pub mod policy;
pub mod registry;

pub use component::{Component, ComponentTable, ElementResolver, Member, NamedElements};
pub use descriptor::{
    BindingDescriptor, BindingSpec, RateLimit, is_binding_name, parse_binding_name,
};
pub use error::{BindingError, BindingErrorKind, InitializeError, ParseError};
pub use event::{DomElement, DomEvent, ListenerOptions};
pub use pipeline::{EventContext, Outcome};
pub use registry::{BindingRegistry, DomEventHandler, LiveBinding};
