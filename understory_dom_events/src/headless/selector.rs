// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Selector matching for headless elements.
//!
//! Selectors are matched right to left straight from the source text; there
//! is no parsed selector cache. Unsupported syntax never matches.

use alloc::string::String;
use alloc::vec::Vec;

use super::HeadlessElement;
use crate::event::DomElement;

const CHILD: &str = ">";
const SIMPLE_START: [char; 3] = ['.', '#', '['];

pub(super) fn matches(el: &HeadlessElement, selector: &str) -> bool {
    selector
        .split(',')
        .map(str::trim)
        .filter(|complex| !complex.is_empty())
        .any(|complex| {
            let spaced: String = complex.replace(CHILD, " > ");
            let parts: Vec<&str> = spaced.split_whitespace().collect();
            matches_parts(el, &parts)
        })
}

/// `parts` alternates compounds and optional `>` tokens; adjacent compounds
/// are joined by the descendant combinator.
fn matches_parts(el: &HeadlessElement, parts: &[&str]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if *last == CHILD || !compound_matches(el, last) {
        return false;
    }
    match rest.split_last() {
        None => true,
        Some((&CHILD, rest)) => el
            .parent_element()
            .is_some_and(|parent| matches_parts(&parent, rest)),
        Some(_) => {
            let mut current = el.parent_element();
            while let Some(ancestor) = current {
                if matches_parts(&ancestor, rest) {
                    return true;
                }
                current = ancestor.parent_element();
            }
            false
        }
    }
}

fn compound_matches(el: &HeadlessElement, compound: &str) -> bool {
    let tag_end = compound.find(SIMPLE_START).unwrap_or(compound.len());
    let (tag, mut rest) = compound.split_at(tag_end);
    if !(tag.is_empty() || tag == "*" || el.tag().eq_ignore_ascii_case(tag)) {
        return false;
    }

    while let Some(kind) = rest.chars().next() {
        rest = &rest[kind.len_utf8()..];
        match kind {
            '.' | '#' => {
                let end = rest.find(SIMPLE_START).unwrap_or(rest.len());
                let (name, tail) = rest.split_at(end);
                rest = tail;
                let ok = if kind == '.' {
                    el.has_class(name)
                } else {
                    el.attribute("id").as_deref() == Some(name)
                };
                if name.is_empty() || !ok {
                    return false;
                }
            }
            '[' => {
                let Some(end) = rest.find(']') else {
                    return false;
                };
                let attr = &rest[..end];
                rest = &rest[end + 1..];
                let ok = match attr.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(['"', '\'']);
                        el.attribute(name.trim()).as_deref() == Some(value)
                    }
                    None => el.attribute(attr.trim()).is_some(),
                };
                if !ok {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use crate::event::DomElement;
    use crate::headless::{HeadlessDocument, HeadlessElement};

    /// body > nav#main.menu > ul > li.item[data-id=7] > a[href]
    fn fixture() -> (HeadlessElement, HeadlessElement, HeadlessElement) {
        let doc = HeadlessDocument::new();
        let nav = doc.create_element("nav");
        nav.set_attribute("id", "main");
        nav.add_class("menu");
        let ul = doc.create_element("ul");
        let li = doc.create_element("li");
        li.add_class("item");
        li.set_attribute("data-id", "7");
        let a = doc.create_element("a");
        a.set_attribute("href", "#top");
        doc.body().append_child(&nav);
        nav.append_child(&ul);
        ul.append_child(&li);
        li.append_child(&a);
        (nav, li, a)
    }

    #[test]
    fn compound_selectors() {
        let (nav, li, a) = fixture();
        assert!(nav.matches("nav"));
        assert!(nav.matches("NAV#main.menu"));
        assert!(nav.matches("*"));
        assert!(!nav.matches("nav.other"));
        assert!(li.matches(".item[data-id=7]"));
        assert!(li.matches("li[data-id='7']"));
        assert!(!li.matches("li[data-id=8]"));
        assert!(a.matches("a[href]"));
        assert!(!a.matches("a[title]"));
    }

    #[test]
    fn combinators() {
        let (_, li, a) = fixture();
        assert!(a.matches("nav a"));
        assert!(a.matches(".menu li.item > a"));
        assert!(a.matches("li>a"));
        assert!(!a.matches("ul > a"));
        assert!(li.matches("#main ul > .item"));
        assert!(!li.matches("a li"));
    }

    #[test]
    fn selector_lists_and_malformed_input() {
        let (nav, _, a) = fixture();
        assert!(a.matches("button, a"));
        assert!(nav.matches(" .nothing ,#main "));
        assert!(!a.matches(""));
        assert!(!a.matches("> a"));
        assert!(!a.matches("a >"));
        assert!(!a.matches("a[href"));
        assert!(!a.matches("a:hover"));
    }
}
