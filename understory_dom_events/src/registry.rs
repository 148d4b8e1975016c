// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live bindings and the handler that owns them.
//!
//! [`DomEventHandler`] turns a component's binding names into live
//! listeners. [`BindingRegistry`] remembers every listener it attached so the
//! whole set can be torn down at once; there is no way to remove a single
//! binding.
//!
//! ## Lifecycle
//!
//! - [`DomEventHandler::initialize`] tears down whatever is live, then binds
//!   every candidate name again. Calling it repeatedly never double-attaches.
//! - [`DomEventHandler::destroy`] detaches everything and cancels pending
//!   debounced runs. It is idempotent, and also runs on drop.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_dom_events::component::ComponentTable;
//! use understory_dom_events::headless::{HeadlessDocument, HeadlessElement, HeadlessEvent};
//! use understory_dom_events::registry::DomEventHandler;
//! use understory_timing::TimerQueue;
//!
//! let doc = HeadlessDocument::new();
//! let clicks = Rc::new(Cell::new(0));
//!
//! let mut table = ComponentTable::<HeadlessElement>::new();
//! let c = clicks.clone();
//! table
//!     .set_root(doc.body())
//!     .on("domevent:click", move |_, _| c.set(c.get() + 1));
//!
//! let mut handler = DomEventHandler::new(table, Rc::new(TimerQueue::new()));
//! handler.initialize().unwrap();
//! handler.initialize().unwrap();
//! assert_eq!(handler.bindings().len(), 1);
//!
//! doc.body().dispatch_event(HeadlessEvent::new("click"));
//! assert_eq!(clicks.get(), 1);
//!
//! handler.destroy();
//! doc.body().dispatch_event(HeadlessEvent::new("click"));
//! assert_eq!(clicks.get(), 1);
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use understory_timing::{Debouncer, Scheduler};

use crate::component::{Component, ElementResolver};
use crate::descriptor::{BindingDescriptor, is_binding_name, parse_binding_name};
use crate::error::{BindingError, BindingErrorKind, InitializeError};
use crate::event::{DomElement, Listener, ListenerOptions, ROOT_REF, add_event, remove_event};
use crate::pipeline::Pipeline;
use crate::policy::listener_options;

/// One attached listener and everything needed to detach it.
pub struct LiveBinding<El: DomElement> {
    name: String,
    descriptor: BindingDescriptor,
    element: El,
    options: ListenerOptions,
    listener: Listener<El::Event>,
    debouncer: Option<Rc<Debouncer>>,
}

impl<El: DomElement> fmt::Debug for LiveBinding<El> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveBinding")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .field("element", &self.element)
            .field("options", &self.options)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl<El: DomElement> LiveBinding<El> {
    /// The handler name this binding was declared with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parsed descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &BindingDescriptor {
        &self.descriptor
    }

    /// The element the listener is attached to.
    #[must_use]
    pub fn element(&self) -> &El {
        &self.element
    }

    /// The options the listener was attached with.
    #[must_use]
    pub fn options(&self) -> ListenerOptions {
        self.options
    }

    /// Returns `true` while a debounced run is waiting for its quiet window.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.debouncer.as_ref().is_some_and(|d| d.is_pending())
    }

    fn detach(&self) {
        if let Some(debouncer) = &self.debouncer {
            debouncer.cancel();
        }
        remove_event(
            &self.element,
            &self.descriptor.event_name,
            &self.listener,
            self.options,
        );
    }
}

/// Ordered set of live bindings.
///
/// Populated by [`DomEventHandler::initialize`]; read through
/// [`DomEventHandler::bindings`]. There is no way to build or fill one
/// outside a handler:
///
/// ```compile_fail
/// use understory_dom_events::BindingRegistry;
/// use understory_dom_events::headless::HeadlessElement;
///
/// let registry = BindingRegistry::<HeadlessElement>::new();
/// ```
pub struct BindingRegistry<El: DomElement> {
    bindings: Vec<LiveBinding<El>>,
}

impl<El: DomElement> fmt::Debug for BindingRegistry<El> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.bindings).finish()
    }
}

impl<El: DomElement> BindingRegistry<El> {
    pub(crate) fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Attach `binding` and keep it. Never deduplicates.
    pub(crate) fn attach(&mut self, binding: LiveBinding<El>) {
        add_event(
            &binding.element,
            &binding.descriptor.event_name,
            &binding.listener,
            binding.options,
        );
        self.bindings.push(binding);
    }

    /// Detach every binding in registration order and forget them all.
    pub fn teardown_all(&mut self) {
        for binding in self.bindings.drain(..) {
            binding.detach();
        }
    }

    /// Number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Live bindings in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &LiveBinding<El>> {
        self.bindings.iter()
    }
}

/// Binds a component's declared handler names to DOM listeners.
pub struct DomEventHandler<El: DomElement, C> {
    component: C,
    scheduler: Rc<dyn Scheduler>,
    resolver: Option<Rc<dyn ElementResolver<El>>>,
    registry: BindingRegistry<El>,
}

impl<El: DomElement, C: fmt::Debug> fmt::Debug for DomEventHandler<El, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomEventHandler")
            .field("component", &self.component)
            .field("has_resolver", &self.resolver.is_some())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<El: DomElement, C: Component<El>> DomEventHandler<El, C> {
    /// Creates a handler with nothing bound yet.
    ///
    /// `scheduler` drives debounced and throttled bindings.
    pub fn new(component: C, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            component,
            scheduler,
            resolver: None,
            registry: BindingRegistry::new(),
        }
    }

    /// Resolve target references the component does not know through
    /// `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Rc<dyn ElementResolver<El>>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// The owning component.
    pub fn component(&self) -> &C {
        &self.component
    }

    /// The live bindings.
    pub fn bindings(&self) -> &BindingRegistry<El> {
        &self.registry
    }

    /// Tear down, then bind every binding name the component declares.
    ///
    /// A name that fails to bind does not stop the others; all failures are
    /// reported together.
    pub fn initialize(&mut self) -> Result<(), InitializeError> {
        self.destroy();

        let mut errors = Vec::new();
        for name in self
            .component
            .method_names()
            .into_iter()
            .filter(|name| is_binding_name(name))
        {
            if let Err(err) = self.register(&name) {
                tracing::warn!(%err, "skipping binding");
                errors.push(err);
            }
        }

        tracing::debug!(
            bindings = self.registry.len(),
            failed = errors.len(),
            "initialized"
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(InitializeError { errors })
        }
    }

    /// Bind one name, returning the number of listeners attached (one per
    /// event type).
    ///
    /// Everything is resolved before anything is attached, so a failing name
    /// leaves no listeners behind. Only [`initialize`](Self::initialize)
    /// creates bindings.
    pub(crate) fn register(&mut self, name: &str) -> Result<usize, BindingError> {
        let fail = |kind| BindingError::new(name, kind);

        let spec = parse_binding_name(name).map_err(|err| fail(BindingErrorKind::Parse(err)))?;
        let handler = self
            .component
            .handler(name)
            .ok_or_else(|| fail(BindingErrorKind::MissingHandler))?;
        let element = self
            .resolve_target(spec.target_ref.as_deref())
            .ok_or_else(|| {
                fail(BindingErrorKind::UnresolvedTarget {
                    target: spec.target_ref.as_deref().unwrap_or(ROOT_REF).into(),
                })
            })?;

        let component = &self.component;
        let descriptors = spec.descriptors(|keyword| component.member(keyword).is_some());
        let mut pending = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let pipeline =
                Pipeline::build(&descriptor, element.clone(), Rc::clone(&handler), component)
                    .map_err(fail)?;
            pending.push((descriptor, pipeline));
        }

        let count = pending.len();
        for (descriptor, pipeline) in pending {
            let options = listener_options(&descriptor.event_name, descriptor.use_capture);
            let (listener, debouncer) =
                pipeline.into_listener(descriptor.rate_limit(), &self.scheduler);
            self.registry.attach(LiveBinding {
                name: name.into(),
                descriptor,
                element: element.clone(),
                options,
                listener,
                debouncer,
            });
        }
        Ok(count)
    }

    /// Detach every live binding.
    pub fn destroy(&mut self) {
        self.registry.teardown_all();
    }

    fn resolve_target(&self, target_ref: Option<&str>) -> Option<El> {
        match target_ref {
            None | Some(ROOT_REF) => self.component.root(),
            Some(name) => self
                .component
                .element_ref(name)
                .or_else(|| self.component.element_member(name))
                .or_else(|| self.resolver.as_ref()?.resolve(name)),
        }
    }
}

impl<El: DomElement, C> Drop for DomEventHandler<El, C> {
    fn drop(&mut self) {
        self.registry.teardown_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentTable, NamedElements};
    use crate::headless::{HeadlessDocument, HeadlessElement};
    use understory_timing::TimerQueue;

    fn handler_for(
        table: ComponentTable<HeadlessElement>,
    ) -> DomEventHandler<HeadlessElement, ComponentTable<HeadlessElement>> {
        DomEventHandler::new(table, Rc::new(TimerQueue::new()))
    }

    #[test]
    fn register_attaches_one_listener_per_event() {
        let doc = HeadlessDocument::new();
        let mut table = ComponentTable::new();
        table
            .set_root(doc.body())
            .on("domevent:mousedown,touchstart", |_, _| {});
        let mut handler = handler_for(table);

        assert_eq!(handler.register("domevent:mousedown,touchstart"), Ok(2));
        assert_eq!(doc.body().listener_count(), 2);
        let names: Vec<_> = handler
            .bindings()
            .iter()
            .map(|b| b.descriptor().event_name.as_str())
            .collect();
        assert_eq!(names, ["mousedown", "touchstart"]);
        assert!(handler.bindings().iter().all(|b| b.options().passive()));
    }

    #[test]
    fn failing_name_attaches_nothing() {
        let doc = HeadlessDocument::new();
        let mut table = ComponentTable::new();
        table
            .set_root(doc.body())
            .on("domevent:keydown,keyup | before(missing)", |_, _| {});
        let mut handler = handler_for(table);

        let err = handler
            .register("domevent:keydown,keyup | before(missing)")
            .unwrap_err();
        assert_eq!(
            err.kind,
            BindingErrorKind::UnresolvedHook {
                hook: "missing".into()
            }
        );
        assert!(handler.bindings().is_empty());
        assert_eq!(doc.body().listener_count(), 0);
    }

    #[test]
    fn target_resolution_order() {
        let doc = HeadlessDocument::new();
        let from_ref = doc.create_element("div");
        let from_member = doc.create_element("div");
        let from_global = doc.create_element("div");
        let mut table = ComponentTable::new();
        table
            .set_root(doc.body())
            .insert_ref("panel", from_ref.clone())
            .insert_element("panel", from_member.clone())
            .insert_element("toolbar", from_member.clone());
        let mut globals = NamedElements::new();
        globals.insert("panel", from_global.clone());
        globals.insert("status", from_global.clone());
        let handler = handler_for(table).with_resolver(Rc::new(globals));

        assert_eq!(handler.resolve_target(None), Some(doc.body()));
        assert_eq!(handler.resolve_target(Some(ROOT_REF)), Some(doc.body()));
        assert_eq!(handler.resolve_target(Some("panel")), Some(from_ref));
        assert_eq!(handler.resolve_target(Some("toolbar")), Some(from_member));
        assert_eq!(handler.resolve_target(Some("status")), Some(from_global));
        assert_eq!(handler.resolve_target(Some("nowhere")), None);
    }

    #[test]
    fn missing_root_is_reported_as_el() {
        let mut table = ComponentTable::<HeadlessElement>::new();
        table.on("domevent:click", |_, _| {});
        let mut handler = handler_for(table);

        let err = handler.register("domevent:click").unwrap_err();
        assert_eq!(
            err.kind,
            BindingErrorKind::UnresolvedTarget {
                target: ROOT_REF.into()
            }
        );
    }

    #[test]
    fn unknown_handler_is_an_error() {
        let doc = HeadlessDocument::new();
        let mut table = ComponentTable::new();
        table.set_root(doc.body());
        let mut handler = handler_for(table);

        let err = handler.register("domevent:click").unwrap_err();
        assert_eq!(err.kind, BindingErrorKind::MissingHandler);
        assert_eq!(err.name, "domevent:click");
    }

    #[test]
    fn dropping_the_handler_detaches() {
        let doc = HeadlessDocument::new();
        let mut table = ComponentTable::new();
        table.set_root(doc.body()).on("domevent:click", |_, _| {});
        let mut handler = handler_for(table);
        handler.initialize().unwrap();
        assert_eq!(doc.body().listener_count(), 1);

        drop(handler);
        assert_eq!(doc.body().listener_count(), 0);
    }

    #[test]
    fn teardown_is_idempotent() {
        let doc = HeadlessDocument::new();
        let mut table = ComponentTable::new();
        table.set_root(doc.body()).on("domevent:click", |_, _| {});
        let mut handler = handler_for(table);
        handler.initialize().unwrap();

        handler.destroy();
        handler.destroy();
        assert!(handler.bindings().is_empty());
        assert_eq!(doc.body().listener_count(), 0);
    }
}
