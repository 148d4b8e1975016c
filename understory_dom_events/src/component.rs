// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capability interface a component exposes to its event bindings.
//!
//! Bindings refer to handlers, hooks, check members and elements by name.
//! Names are resolved once, when a binding is registered; the resolved
//! callables are kept by the live binding. A name the component does not
//! provide is a configuration error, not a silent pass.
//!
//! [`ComponentTable`] is a ready-made implementation backed by hash maps.
//! Components that already have their own storage implement [`Component`]
//! directly.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::event::DomElement;
use crate::pipeline::{EventContext, Outcome};

/// A raw handler: the guarded body of a binding.
pub type Handler<El> = Rc<dyn Fn(&<El as DomElement>::Event, &EventContext<El>) -> Outcome>;

/// A `before(...)` / `after(...)` hook, called with the declared parameter.
///
/// A `false` result from a before hook aborts the occurrence. The result of
/// an after hook is ignored.
pub type Hook<El> = Rc<dyn Fn(&<El as DomElement>::Event, &EventContext<El>, Option<&str>) -> bool>;

/// A check predicate evaluated against each occurrence.
pub type Predicate<El> = Rc<dyn Fn(&<El as DomElement>::Event, &EventContext<El>) -> bool>;

/// A component member usable as a check guard.
pub enum Member<El: DomElement> {
    /// A method: invoked with the event, its result is the guard.
    Method(Predicate<El>),
    /// A field: its current truthiness is the guard, read on every occurrence.
    Field(Rc<dyn Fn() -> bool>),
}

impl<El: DomElement> Member<El> {
    /// Evaluate the guard for one occurrence.
    pub fn check(&self, event: &El::Event, cx: &EventContext<El>) -> bool {
        match self {
            Self::Method(predicate) => predicate(event, cx),
            Self::Field(value) => value(),
        }
    }
}

impl<El: DomElement> Clone for Member<El> {
    fn clone(&self) -> Self {
        match self {
            Self::Method(predicate) => Self::Method(Rc::clone(predicate)),
            Self::Field(value) => Self::Field(Rc::clone(value)),
        }
    }
}

impl<El: DomElement> fmt::Debug for Member<El> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(_) => f.write_str("Member::Method(..)"),
            Self::Field(_) => f.write_str("Member::Field(..)"),
        }
    }
}

/// What a component exposes to the binding layer.
pub trait Component<El: DomElement> {
    /// The component's own root element.
    fn root(&self) -> Option<El>;

    /// Look up a named element reference (`refs`).
    fn element_ref(&self, name: &str) -> Option<El>;

    /// Look up an element held directly as a component member.
    ///
    /// Consulted after [`element_ref`](Component::element_ref).
    fn element_member(&self, name: &str) -> Option<El> {
        let _ = name;
        None
    }

    /// Every method name; binding names are picked out of this list.
    fn method_names(&self) -> Vec<String>;

    /// The handler registered under a binding name.
    fn handler(&self, name: &str) -> Option<Handler<El>>;

    /// A member usable as a check guard.
    fn member(&self, name: &str) -> Option<Member<El>>;

    /// A before/after hook.
    fn hook(&self, name: &str) -> Option<Hook<El>>;
}

impl<El: DomElement, C: Component<El> + ?Sized> Component<El> for Rc<C> {
    fn root(&self) -> Option<El> {
        (**self).root()
    }

    fn element_ref(&self, name: &str) -> Option<El> {
        (**self).element_ref(name)
    }

    fn element_member(&self, name: &str) -> Option<El> {
        (**self).element_member(name)
    }

    fn method_names(&self) -> Vec<String> {
        (**self).method_names()
    }

    fn handler(&self, name: &str) -> Option<Handler<El>> {
        (**self).handler(name)
    }

    fn member(&self, name: &str) -> Option<Member<El>> {
        (**self).member(name)
    }

    fn hook(&self, name: &str) -> Option<Hook<El>> {
        (**self).hook(name)
    }
}

/// Last-resort lookup of target elements by name, outside any component.
pub trait ElementResolver<El> {
    /// Resolve `name` to an element.
    fn resolve(&self, name: &str) -> Option<El>;
}

/// A named, process-wide set of elements.
#[derive(Clone, Debug)]
pub struct NamedElements<El> {
    elements: HashMap<String, El>,
}

impl<El> Default for NamedElements<El> {
    fn default() -> Self {
        Self {
            elements: HashMap::new(),
        }
    }
}

impl<El> NamedElements<El> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` under `name`, returning the element it replaced.
    pub fn insert(&mut self, name: impl Into<String>, element: El) -> Option<El> {
        self.elements.insert(name.into(), element)
    }

    /// Forget `name`.
    pub fn remove(&mut self, name: &str) -> Option<El> {
        self.elements.remove(name)
    }
}

impl<El: Clone> ElementResolver<El> for NamedElements<El> {
    fn resolve(&self, name: &str) -> Option<El> {
        self.elements.get(name).cloned()
    }
}

/// A table-driven [`Component`].
///
/// Handlers keep their registration order, which is the order bindings are
/// established in.
///
/// ```
/// use understory_dom_events::component::{Component, ComponentTable};
/// use understory_dom_events::headless::{HeadlessDocument, HeadlessElement};
///
/// let doc = HeadlessDocument::new();
/// let mut table = ComponentTable::<HeadlessElement>::new();
/// table
///     .set_root(doc.body())
///     .on("domevent:click | enabled", |_, _| {})
///     .field("enabled", || true);
///
/// assert_eq!(table.method_names(), ["domevent:click | enabled", "enabled"]);
/// assert!(table.member("enabled").is_some());
/// ```
pub struct ComponentTable<El: DomElement> {
    root: Option<El>,
    refs: HashMap<String, El>,
    elements: HashMap<String, El>,
    handlers: Vec<(String, Handler<El>)>,
    members: Vec<(String, Member<El>)>,
    hooks: HashMap<String, Hook<El>>,
}

impl<El: DomElement> Default for ComponentTable<El> {
    fn default() -> Self {
        Self {
            root: None,
            refs: HashMap::new(),
            elements: HashMap::new(),
            handlers: Vec::new(),
            members: Vec::new(),
            hooks: HashMap::new(),
        }
    }
}

impl<El: DomElement> fmt::Debug for ComponentTable<El> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTable")
            .field("root", &self.root)
            .field("refs", &self.refs)
            .field("elements", &self.elements)
            .field(
                "handlers",
                &self.handlers.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field(
                "members",
                &self.members.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<El: DomElement> ComponentTable<El> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root element.
    pub fn set_root(&mut self, root: El) -> &mut Self {
        self.root = Some(root);
        self
    }

    /// Add a named element reference.
    pub fn insert_ref(&mut self, name: impl Into<String>, element: El) -> &mut Self {
        self.refs.insert(name.into(), element);
        self
    }

    /// Add an element held as a member.
    pub fn insert_element(&mut self, name: impl Into<String>, element: El) -> &mut Self {
        self.elements.insert(name.into(), element);
        self
    }

    /// Add a handler under a binding name.
    ///
    /// The handler may return `()`, `bool` or [`Outcome`]; an explicit
    /// `false` suppresses after hooks.
    pub fn on<R: Into<Outcome>>(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&El::Event, &EventContext<El>) -> R + 'static,
    ) -> &mut Self {
        let handler: Handler<El> =
            Rc::new(move |ev: &El::Event, cx: &EventContext<El>| handler(ev, cx).into());
        self.handlers.push((name.into(), handler));
        self
    }

    /// Add a check method.
    pub fn method(
        &mut self,
        name: impl Into<String>,
        predicate: impl Fn(&El::Event, &EventContext<El>) -> bool + 'static,
    ) -> &mut Self {
        self.set_member(name.into(), Member::Method(Rc::new(predicate)))
    }

    /// Add a field, read through `value` on every occurrence.
    pub fn field(
        &mut self,
        name: impl Into<String>,
        value: impl Fn() -> bool + 'static,
    ) -> &mut Self {
        self.set_member(name.into(), Member::Field(Rc::new(value)))
    }

    /// Add a hook.
    pub fn insert_hook(
        &mut self,
        name: impl Into<String>,
        hook: impl Fn(&El::Event, &EventContext<El>, Option<&str>) -> bool + 'static,
    ) -> &mut Self {
        self.hooks.insert(name.into(), Rc::new(hook));
        self
    }

    fn set_member(&mut self, name: String, member: Member<El>) -> &mut Self {
        match self.members.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = member,
            None => self.members.push((name, member)),
        }
        self
    }
}

impl<El: DomElement> Component<El> for ComponentTable<El> {
    fn root(&self) -> Option<El> {
        self.root.clone()
    }

    fn element_ref(&self, name: &str) -> Option<El> {
        self.refs.get(name).cloned()
    }

    fn element_member(&self, name: &str) -> Option<El> {
        self.elements.get(name).cloned()
    }

    fn method_names(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|(name, _)| name)
            .chain(self.members.iter().map(|(name, _)| name))
            .cloned()
            .collect()
    }

    fn handler(&self, name: &str) -> Option<Handler<El>> {
        self.handlers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, handler)| Rc::clone(handler))
    }

    fn member(&self, name: &str) -> Option<Member<El>> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, member)| member.clone())
    }

    fn hook(&self, name: &str) -> Option<Hook<El>> {
        self.hooks.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessDocument, HeadlessElement, HeadlessEvent};

    #[test]
    fn builder_and_lookup_coexist_with_the_trait_in_scope() {
        let mut table = ComponentTable::<HeadlessElement>::new();
        table
            .insert_hook("lock", |_, _, param| param == Some("on"))
            .insert_hook("log", |_, _, _| true);

        let doc = HeadlessDocument::new();
        let ev = HeadlessEvent::new("click");
        let cx = EventContext {
            delegate_target: None,
            pos: kurbo::Point::ORIGIN,
        };
        let lock = table.hook("lock").unwrap();
        assert!(lock(&ev, &cx, Some("on")));
        assert!(!lock(&ev, &cx, None));
        assert!(table.hook("log").is_some());
        assert!(table.hook("missing").is_none());
        assert_eq!(table.root(), None::<HeadlessElement>);
        table.set_root(doc.body());
        assert_eq!(table.root(), Some(doc.body()));
    }

    #[test]
    fn members_keep_order_and_replace_in_place() {
        let mut table = ComponentTable::<HeadlessElement>::new();
        table
            .on("domevent:click", |_, _| {})
            .field("open", || false)
            .method("ready", |_, _| true)
            .field("open", || true);

        assert_eq!(table.method_names(), ["domevent:click", "open", "ready"]);
        let open = table.member("open").unwrap();
        let cx = EventContext {
            delegate_target: None,
            pos: kurbo::Point::ORIGIN,
        };
        assert!(open.check(&HeadlessEvent::new("click"), &cx));
    }
}
