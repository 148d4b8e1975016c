// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback synthesis: the guard/modifier pipeline around a raw handler.
//!
//! For one event occurrence, a [`Pipeline`] runs these steps in order and
//! stops at the first one that rejects the occurrence:
//!
//! 1) Delegation: find the nearest ancestor (inclusive) of the event target
//!    matching the delegate selector, without leaving the bound element.
//! 2) Before hooks, in declaration order. A `false` result aborts.
//! 3) Keycode guard: `code` or `key` must be one of the declared codes.
//! 4) Check guard: every declared member must be truthy.
//! 5) The handler, with an [`EventContext`] carrying the delegate match and
//!    the pointer position.
//! 6) After hooks, all of them, unless the handler returned [`Outcome::Stop`].
//!
//! [`Pipeline::into_listener`] wraps the whole sequence in the binding's
//! rate limit and turns it into a native [`Listener`].

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;
use understory_timing::{Debouncer, Scheduler, Throttle};

use crate::component::{Component, Handler, Hook, Member};
use crate::descriptor::{BindingDescriptor, HookCall, RateLimit};
use crate::error::BindingErrorKind;
use crate::event::{DomElement, DomEvent, Listener, pos_xy};

/// Per-occurrence context passed next to the event to hooks and handlers.
#[derive(Clone, Debug, PartialEq)]
pub struct EventContext<El> {
    /// The element matched by the delegate selector, for delegated bindings.
    pub delegate_target: Option<El>,
    /// Normalized pointer position, see [`pos_xy`].
    pub pos: Point,
}

/// What a handler reports back to its pipeline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Run the after hooks.
    #[default]
    Continue,
    /// Skip the after hooks.
    Stop,
}

impl From<()> for Outcome {
    fn from((): ()) -> Self {
        Self::Continue
    }
}

impl From<bool> for Outcome {
    fn from(value: bool) -> Self {
        if value { Self::Continue } else { Self::Stop }
    }
}

/// The guarded, possibly delegated callback of one binding.
pub struct Pipeline<El: DomElement> {
    event_name: String,
    element: El,
    delegate_selector: Option<String>,
    before: Vec<(Hook<El>, Option<String>)>,
    codes: SmallVec<[String; 2]>,
    checks: Vec<Member<El>>,
    after: Vec<(Hook<El>, Option<String>)>,
    handler: Handler<El>,
}

impl<El: DomElement> fmt::Debug for Pipeline<El> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("event_name", &self.event_name)
            .field("element", &self.element)
            .field("delegate_selector", &self.delegate_selector)
            .field("before", &self.before.len())
            .field("codes", &self.codes)
            .field("checks", &self.checks.len())
            .field("after", &self.after.len())
            .finish_non_exhaustive()
    }
}

impl<El: DomElement> Pipeline<El> {
    /// Build the pipeline for `descriptor` bound on `element`.
    ///
    /// Hooks and check members are resolved against `component` now; a hook
    /// the component does not provide is an error.
    pub fn build<C: Component<El> + ?Sized>(
        descriptor: &BindingDescriptor,
        element: El,
        handler: Handler<El>,
        component: &C,
    ) -> Result<Self, BindingErrorKind> {
        let resolve_hooks = |calls: &[HookCall]| {
            calls
                .iter()
                .map(|call| {
                    component
                        .hook(&call.name)
                        .map(|hook| (hook, call.param.clone()))
                        .ok_or_else(|| BindingErrorKind::UnresolvedHook {
                            hook: call.name.clone(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(Self {
            event_name: descriptor.event_name.clone(),
            element,
            delegate_selector: descriptor.delegate_selector.clone(),
            before: resolve_hooks(&descriptor.before_hooks)?,
            codes: descriptor.codes.clone(),
            checks: descriptor
                .check_method_names
                .iter()
                .filter_map(|name| component.member(name))
                .collect(),
            after: resolve_hooks(&descriptor.after_hooks)?,
            handler,
        })
    }

    /// Run the pipeline for one occurrence.
    ///
    /// Returns `None` when a guard rejected the occurrence, otherwise the
    /// handler's outcome.
    pub fn run(&self, event: &El::Event) -> Option<Outcome> {
        let delegate_target = match &self.delegate_selector {
            Some(selector) => {
                let Some(found) = event
                    .target()
                    .and_then(|target| match_path(target, selector, &self.element))
                else {
                    tracing::trace!(event = %self.event_name, %selector, "no delegate match");
                    return None;
                };
                Some(found)
            }
            None => None,
        };
        let cx = EventContext {
            delegate_target,
            pos: pos_xy(event),
        };

        for (hook, param) in &self.before {
            if !hook(event, &cx, param.as_deref()) {
                tracing::trace!(event = %self.event_name, "before hook vetoed");
                return None;
            }
        }

        if !self.has_code(event) {
            tracing::trace!(event = %self.event_name, codes = ?self.codes, "key mismatch");
            return None;
        }

        if !self.checks.iter().all(|check| check.check(event, &cx)) {
            tracing::trace!(event = %self.event_name, "check failed");
            return None;
        }

        let outcome = (self.handler)(event, &cx);
        if outcome != Outcome::Stop {
            for (hook, param) in &self.after {
                hook(event, &cx, param.as_deref());
            }
        }
        Some(outcome)
    }

    fn has_code(&self, event: &El::Event) -> bool {
        if self.codes.is_empty() {
            return true;
        }
        [event.code(), event.key()]
            .into_iter()
            .flatten()
            .any(|id| self.codes.contains(&id.to_lowercase()))
    }

    /// Wrap the pipeline in `rate_limit` and produce the native listener.
    ///
    /// For debounced bindings the [`Debouncer`] is returned as well, so the
    /// owner can cancel a pending run when the binding is removed.
    pub fn into_listener(
        self,
        rate_limit: Option<RateLimit>,
        scheduler: &Rc<dyn Scheduler>,
    ) -> (Listener<El::Event>, Option<Rc<Debouncer>>) {
        let pipeline = Rc::new(self);
        match rate_limit {
            None => {
                let listener: Listener<El::Event> = Rc::new(move |event: &El::Event| {
                    pipeline.run(event);
                });
                (listener, None)
            }
            Some(RateLimit::Debounce(ms)) => {
                let debouncer = Rc::new(Debouncer::new(Rc::clone(scheduler), ms));
                let pending = Rc::clone(&debouncer);
                let listener: Listener<El::Event> = Rc::new(move |event: &El::Event| {
                    let pipeline = Rc::clone(&pipeline);
                    let event = event.clone();
                    pending.call(move || {
                        pipeline.run(&event);
                    });
                });
                (listener, Some(debouncer))
            }
            Some(RateLimit::Throttle(ms)) => {
                let throttle = Throttle::new(Rc::clone(scheduler), ms);
                let listener: Listener<El::Event> = Rc::new(move |event: &El::Event| {
                    if throttle.try_acquire() {
                        pipeline.run(event);
                    }
                });
                (listener, None)
            }
        }
    }
}

/// Walk from `start` up through its ancestors and return the first element
/// matching `selector`. The walk ends at `boundary` (inclusive).
pub fn match_path<El: DomElement>(start: El, selector: &str, boundary: &El) -> Option<El> {
    let mut current = Some(start);
    while let Some(el) = current {
        if el.matches(selector) {
            return Some(el);
        }
        if el == *boundary {
            return None;
        }
        current = el.parent_element();
    }
    None
}
