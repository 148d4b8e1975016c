// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory DOM implementing [`DomElement`] and [`DomEvent`].
//!
//! This is the reference backend: enough of the DOM to build element trees,
//! match selectors, attach listeners and dispatch events through the
//! capture → target → bubble phases. It runs bindings without a browser,
//! which is what the tests of this crate do.
//!
//! ## Minimal example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_dom_events::event::{DomElement, Listener, ListenerOptions};
//! use understory_dom_events::headless::{HeadlessDocument, HeadlessEvent};
//!
//! let doc = HeadlessDocument::new();
//! let list = doc.create_element("ul");
//! let item = doc.create_element("li");
//! doc.body().append_child(&list);
//! list.append_child(&item);
//!
//! let hits = Rc::new(Cell::new(0));
//! let h = hits.clone();
//! let listener: Listener<HeadlessEvent> = Rc::new(move |_: &HeadlessEvent| h.set(h.get() + 1));
//! list.add_event_listener("click", &listener, ListenerOptions::default());
//!
//! // Bubbles from the item up to the list.
//! item.dispatch_event(HeadlessEvent::new("click"));
//! assert_eq!(hits.get(), 1);
//! ```
//!
//! ## Selectors
//!
//! [`DomElement::matches`] supports selector lists (`a, b`), compound
//! selectors made of a type (or `*`), `#id`, `.class`, `[attr]` and
//! `[attr=value]`, combined with descendant (whitespace) and child (`>`)
//! combinators.

mod selector;

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;

use crate::event::{DomElement, DomEvent, Listener, ListenerOptions};

const ROOT: usize = 0;

struct Registered {
    event_name: String,
    listener: Listener<HeadlessEvent>,
    options: ListenerOptions,
}

struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<usize>,
    children: Vec<usize>,
    listeners: Vec<Registered>,
}

#[derive(Default)]
struct Arena {
    nodes: Vec<NodeData>,
}

/// Owner of a tree of [`HeadlessElement`]s.
///
/// The document always has a `body` root; elements created with
/// [`create_element`](Self::create_element) are detached until appended.
#[derive(Clone)]
pub struct HeadlessDocument {
    arena: Rc<RefCell<Arena>>,
}

impl fmt::Debug for HeadlessDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.arena.try_borrow().map(|a| a.nodes.len()).ok();
        f.debug_struct("HeadlessDocument")
            .field("nodes", &nodes)
            .finish()
    }
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDocument {
    /// Creates a document containing only its `body`.
    #[must_use]
    pub fn new() -> Self {
        let doc = Self {
            arena: Rc::new(RefCell::new(Arena::default())),
        };
        doc.create_element("body");
        doc
    }

    /// The root element.
    #[must_use]
    pub fn body(&self) -> HeadlessElement {
        self.element(ROOT)
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> HeadlessElement {
        let mut arena = self.arena.borrow_mut();
        arena.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        let index = arena.nodes.len() - 1;
        drop(arena);
        self.element(index)
    }

    fn element(&self, index: usize) -> HeadlessElement {
        HeadlessElement {
            arena: Rc::clone(&self.arena),
            index,
        }
    }
}

/// A handle to one element of a [`HeadlessDocument`].
#[derive(Clone)]
pub struct HeadlessElement {
    arena: Rc<RefCell<Arena>>,
    index: usize,
}

impl PartialEq for HeadlessElement {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Rc::ptr_eq(&self.arena, &other.arena)
    }
}

impl Eq for HeadlessElement {}

impl fmt::Debug for HeadlessElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("HeadlessElement");
        s.field("index", &self.index);
        if let Ok(arena) = self.arena.try_borrow() {
            let node = &arena.nodes[self.index];
            s.field("tag", &node.tag);
            if let Some((_, id)) = node.attributes.iter().find(|(k, _)| k == "id") {
                s.field("id", id);
            }
        }
        s.finish()
    }
}

impl HeadlessElement {
    fn with_node<R>(&self, f: impl FnOnce(&NodeData) -> R) -> R {
        f(&self.arena.borrow().nodes[self.index])
    }

    fn with_node_mut<R>(&self, f: impl FnOnce(&mut NodeData) -> R) -> R {
        f(&mut self.arena.borrow_mut().nodes[self.index])
    }

    fn sibling(&self, index: usize) -> Self {
        Self {
            arena: Rc::clone(&self.arena),
            index,
        }
    }

    /// Lower-case tag name.
    #[must_use]
    pub fn tag(&self) -> String {
        self.with_node(|node| node.tag.clone())
    }

    /// Value of an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.with_node(|node| {
            node.attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&self, name: &str, value: &str) {
        self.with_node_mut(|node| match node.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        });
    }

    /// Returns `true` if the `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Add a class to the `class` attribute.
    pub fn add_class(&self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attribute("class") {
            Some(existing) if !existing.trim().is_empty() => {
                let mut classes = existing.trim().to_string();
                classes.push(' ');
                classes.push_str(class);
                classes
            }
            _ => class.to_string(),
        };
        self.set_attribute("class", &classes);
    }

    /// Append `child` as the last child, detaching it from its parent first.
    ///
    /// Appending an element into itself or its own subtree is ignored.
    pub fn append_child(&self, child: &Self) {
        debug_assert!(
            Rc::ptr_eq(&self.arena, &child.arena),
            "elements belong to different documents"
        );
        if self.is_inclusive_descendant_of(child.index) {
            tracing::warn!(parent = ?self, child = ?child, "append would create a cycle");
            return;
        }
        child.remove();
        let mut arena = self.arena.borrow_mut();
        arena.nodes[child.index].parent = Some(self.index);
        arena.nodes[self.index].children.push(child.index);
    }

    fn is_inclusive_descendant_of(&self, ancestor: usize) -> bool {
        let arena = self.arena.borrow();
        let mut current = Some(self.index);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = arena.nodes[index].parent;
        }
        false
    }

    /// Detach this element (and its subtree) from its parent.
    ///
    /// Listeners stay attached to the detached elements.
    pub fn remove(&self) {
        let mut arena = self.arena.borrow_mut();
        if let Some(parent) = arena.nodes[self.index].parent.take() {
            arena.nodes[parent].children.retain(|&c| c != self.index);
        }
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        let indices = self.with_node(|node| node.children.clone());
        indices.into_iter().map(|i| self.sibling(i)).collect()
    }

    /// Returns `true` if this element is the body or a descendant of it.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.is_inclusive_descendant_of(ROOT)
    }

    /// Event types and options of the attached listeners, in attach order.
    #[must_use]
    pub fn listeners(&self) -> Vec<(String, ListenerOptions)> {
        self.with_node(|node| {
            node.listeners
                .iter()
                .map(|r| (r.event_name.clone(), r.options))
                .collect()
        })
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.with_node(|node| node.listeners.len())
    }

    /// Dispatch `event` with this element as its target.
    ///
    /// Capture listeners run from the body down to the parent, then every
    /// listener on the target, then non-capture listeners from the parent up
    /// to the body. Listeners are collected per element before any of them
    /// runs, so they may attach, detach or dispatch freely. Returns the event
    /// so callers can inspect [`HeadlessEvent::default_prevented`].
    pub fn dispatch_event(&self, mut event: HeadlessEvent) -> HeadlessEvent {
        event.target = Some(self.clone());
        let mut ancestors = Vec::new();
        let mut current = self.parent_element();
        while let Some(el) = current {
            current = el.parent_element();
            ancestors.push(el);
        }

        for el in ancestors.iter().rev() {
            el.invoke(&event, Some(true));
        }
        self.invoke(&event, None);
        for el in &ancestors {
            el.invoke(&event, Some(false));
        }
        event
    }

    fn invoke(&self, event: &HeadlessEvent, capture: Option<bool>) {
        let listeners: SmallVec<[(Listener<HeadlessEvent>, bool); 4]> = self.with_node(|node| {
            node.listeners
                .iter()
                .filter(|r| r.event_name == event.event_type)
                .filter(|r| capture.is_none_or(|c| r.options.capture() == c))
                .map(|r| (Rc::clone(&r.listener), r.options.passive()))
                .collect()
        });
        for (listener, passive) in listeners {
            event.in_passive.set(passive);
            listener(event);
            event.in_passive.set(false);
        }
    }
}

impl DomElement for HeadlessElement {
    type Event = HeadlessEvent;

    fn matches(&self, selector: &str) -> bool {
        selector::matches(self, selector)
    }

    fn parent_element(&self) -> Option<Self> {
        self.with_node(|node| node.parent)
            .map(|index| self.sibling(index))
    }

    fn add_event_listener(
        &self,
        event_name: &str,
        listener: &Listener<HeadlessEvent>,
        options: ListenerOptions,
    ) {
        self.with_node_mut(|node| {
            let duplicate = node.listeners.iter().any(|r| {
                r.event_name == event_name
                    && Rc::ptr_eq(&r.listener, listener)
                    && r.options.capture() == options.capture()
            });
            if !duplicate {
                node.listeners.push(Registered {
                    event_name: event_name.to_string(),
                    listener: Rc::clone(listener),
                    options,
                });
            }
        });
    }

    fn remove_event_listener(
        &self,
        event_name: &str,
        listener: &Listener<HeadlessEvent>,
        options: ListenerOptions,
    ) {
        self.with_node_mut(|node| {
            if let Some(pos) = node.listeners.iter().position(|r| {
                r.event_name == event_name
                    && Rc::ptr_eq(&r.listener, listener)
                    && r.options.capture() == options.capture()
            }) {
                node.listeners.remove(pos);
            }
        });
    }
}

/// A synthetic event for [`HeadlessElement::dispatch_event`].
#[derive(Clone, Debug)]
pub struct HeadlessEvent {
    event_type: String,
    target: Option<HeadlessElement>,
    code: Option<String>,
    key: Option<String>,
    page: Option<Point>,
    touches: SmallVec<[Point; 1]>,
    default_prevented: Cell<bool>,
    in_passive: Cell<bool>,
}

impl HeadlessEvent {
    /// Creates an event of the given type.
    #[must_use]
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            target: None,
            code: None,
            key: None,
            page: None,
            touches: SmallVec::new(),
            default_prevented: Cell::new(false),
            in_passive: Cell::new(false),
        }
    }

    /// Set the logical key, e.g. `"Enter"`.
    #[must_use]
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Set the physical key code, e.g. `"KeyA"`.
    #[must_use]
    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    /// Set the pointer position in page coordinates.
    #[must_use]
    pub fn at(mut self, page: Point) -> Self {
        self.page = Some(page);
        self
    }

    /// Add a touch point.
    #[must_use]
    pub fn with_touch(mut self, touch: Point) -> Self {
        self.touches.push(touch);
        self
    }

    /// Set the target without dispatching. [`HeadlessElement::dispatch_event`]
    /// overrides it.
    #[must_use]
    pub fn with_target(mut self, target: &HeadlessElement) -> Self {
        self.target = Some(target.clone());
        self
    }

    /// Cancel the default action. Ignored inside passive listeners.
    pub fn prevent_default(&self) {
        if self.in_passive.get() {
            tracing::trace!(event = %self.event_type, "preventDefault ignored in passive listener");
            return;
        }
        self.default_prevented.set(true);
    }

    /// Returns `true` if a non-passive listener called [`prevent_default`](Self::prevent_default).
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl DomEvent for HeadlessEvent {
    type Element = HeadlessElement;

    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn target(&self) -> Option<HeadlessElement> {
        self.target.clone()
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn page_point(&self) -> Option<Point> {
        self.page
    }

    fn first_touch(&self) -> Option<Point> {
        self.touches.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn tree() -> (HeadlessDocument, HeadlessElement, HeadlessElement) {
        let doc = HeadlessDocument::new();
        let list = doc.create_element("UL");
        let item = doc.create_element("li");
        doc.body().append_child(&list);
        list.append_child(&item);
        (doc, list, item)
    }

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recording(log: &Log, tag: &'static str) -> Listener<HeadlessEvent> {
        let log = log.clone();
        Rc::new(move |_: &HeadlessEvent| log.borrow_mut().push(tag))
    }

    #[test]
    fn dispatch_runs_capture_target_bubble() {
        let (doc, list, item) = tree();
        let log = Log::default();
        let body = doc.body();
        let bubble = ListenerOptions::Capture(false);
        let capture = ListenerOptions::Capture(true);
        body.add_event_listener("click", &recording(&log, "body-bubble"), bubble);
        body.add_event_listener("click", &recording(&log, "body-capture"), capture);
        list.add_event_listener("click", &recording(&log, "list-bubble"), bubble);
        item.add_event_listener("click", &recording(&log, "item"), capture);
        item.add_event_listener("keydown", &recording(&log, "other-type"), bubble);

        item.dispatch_event(HeadlessEvent::new("click"));
        assert_eq!(
            *log.borrow(),
            vec!["body-capture", "item", "list-bubble", "body-bubble"]
        );
    }

    #[test]
    fn remove_requires_same_listener_and_capture() {
        let (_doc, list, _) = tree();
        let log = Log::default();
        let listener = recording(&log, "x");
        let capture = ListenerOptions::Capture(true);
        list.add_event_listener("click", &listener, capture);
        list.add_event_listener("click", &listener, capture);
        assert_eq!(list.listener_count(), 1);

        list.remove_event_listener("click", &listener, ListenerOptions::Capture(false));
        assert_eq!(list.listener_count(), 1);
        list.remove_event_listener("click", &recording(&log, "y"), capture);
        assert_eq!(list.listener_count(), 1);
        list.remove_event_listener(
            "click",
            &listener,
            ListenerOptions::Passive { capture: true },
        );
        assert_eq!(list.listener_count(), 0);
        // Removing again is a no-op.
        list.remove_event_listener("click", &listener, capture);
    }

    #[test]
    fn detached_elements_are_not_connected() {
        let (doc, list, item) = tree();
        assert!(item.is_connected());
        list.remove();
        assert!(!item.is_connected());
        assert!(!list.is_connected());
        assert_eq!(item.parent_element(), Some(list.clone()));
        assert!(doc.body().children().is_empty());
    }

    #[test]
    fn appending_an_ancestor_into_its_subtree_is_ignored() {
        let (doc, list, item) = tree();
        item.append_child(&list);
        item.append_child(&item);
        doc.body().append_child(&doc.body());

        assert_eq!(item.parent_element(), Some(list.clone()));
        assert_eq!(list.parent_element(), Some(doc.body()));
        assert!(item.children().is_empty());
        assert!(item.is_connected());
        item.dispatch_event(HeadlessEvent::new("click"));
    }

    #[test]
    fn prevent_default_is_ignored_when_passive() {
        let (_doc, list, item) = tree();
        let prevent: Listener<HeadlessEvent> = Rc::new(|e: &HeadlessEvent| e.prevent_default());
        let passive = ListenerOptions::Passive { capture: false };
        list.add_event_listener("wheel", &prevent, passive);
        list.add_event_listener("click", &prevent, ListenerOptions::default());

        let wheel = item.dispatch_event(HeadlessEvent::new("wheel"));
        assert!(!wheel.default_prevented());
        let click = item.dispatch_event(HeadlessEvent::new("click"));
        assert!(click.default_prevented());
    }

    #[test]
    fn class_and_attribute_helpers() {
        let (_doc, list, _) = tree();
        assert_eq!(list.tag(), "ul");
        list.add_class("menu");
        list.add_class("open");
        list.add_class("menu");
        assert_eq!(list.attribute("class").as_deref(), Some("menu open"));
        assert!(list.has_class("open"));
        list.set_attribute("id", "nav");
        list.set_attribute("id", "main");
        assert_eq!(list.attribute("id").as_deref(), Some("main"));
    }
}
