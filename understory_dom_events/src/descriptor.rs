// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding-name parser.
//!
//! Parsing happens in two steps:
//!
//! 1) [`parse_binding_name`] applies the grammar and classifies every
//!    keyword that can be classified from its text alone (hooks, rate
//!    limits, capture). It needs nothing from the component.
//! 2) [`BindingSpec::descriptors`] fans the spec out into one
//!    [`BindingDescriptor`] per event name, splitting the remaining keywords
//!    into check-method names and keycodes. This happens at bind time, when
//!    the component can say which names are its members.
//!
//! ```
//! use understory_dom_events::descriptor::{parse_binding_name, RateLimit};
//!
//! let spec = parse_binding_name("domevent:keydown,keyup input | enter | isEditable | debounce(50)")?;
//! assert_eq!(spec.event_names.as_slice(), ["keydown", "keyup"]);
//! assert_eq!(spec.target_ref.as_deref(), Some("input"));
//!
//! let descriptors = spec.descriptors(|name| name == "isEditable");
//! assert_eq!(descriptors.len(), 2);
//! assert_eq!(descriptors[0].codes.as_slice(), ["enter"]);
//! assert_eq!(descriptors[0].check_method_names, ["isEditable"]);
//! assert_eq!(descriptors[1].rate_limit(), Some(RateLimit::Debounce(50)));
//! # Ok::<(), understory_dom_events::ParseError>(())
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::error::ParseError;
use crate::event::{
    CHECK_SEPARATOR, DOM_EVENT_PREFIX, DOM_EVENT_SEPARATOR, NAME_SEPARATOR, PATH_SEPARATOR,
};

/// Window used by `debounce` / `throttle` when none is written.
pub const DEFAULT_RATE_LIMIT_MILLIS: u64 = 300;

const AFTER: &str = "after";
const BEFORE: &str = "before";
const DEBOUNCE: &str = "debounce";
const THROTTLE: &str = "throttle";
const CAPTURE: &str = "capture";

/// A `before(name param)` / `after(name param)` hook invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HookCall {
    /// Hook name, resolved against the component.
    pub name: String,
    /// Everything after the name, passed through to the hook.
    pub param: Option<String>,
}

/// Keywords classified from their text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// `before(...)` hooks in declaration order.
    pub before: Vec<HookCall>,
    /// `after(...)` hooks in declaration order.
    pub after: Vec<HookCall>,
    /// First `debounce(...)` window.
    pub debounce_millis: Option<u64>,
    /// First `throttle(...)` window.
    pub throttle_millis: Option<u64>,
    /// A `capture` keyword was present.
    pub use_capture: bool,
    /// Remaining keywords in declaration order, as written.
    pub unclassified: Vec<String>,
}

/// Rate limit applied to a binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RateLimit {
    /// Run the last call after a quiet window of this many ms.
    Debounce(u64),
    /// Run at most once per window of this many ms (leading edge).
    Throttle(u64),
}

/// One parsed binding name, before fan-out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingSpec {
    /// Event names, never empty.
    pub event_names: SmallVec<[String; 2]>,
    /// Target reference, `None` for the component root.
    pub target_ref: Option<String>,
    /// Delegate selector.
    pub delegate_selector: Option<String>,
    /// Classified keywords.
    pub modifiers: Modifiers,
}

/// The immutable description of one binding for one event type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingDescriptor {
    /// Native event type.
    pub event_name: String,
    /// Target reference, `None` for the component root.
    pub target_ref: Option<String>,
    /// Delegate selector.
    pub delegate_selector: Option<String>,
    /// Lower-cased key identifiers gating execution; empty means no gating.
    pub codes: SmallVec<[String; 2]>,
    /// Component members that must all be truthy.
    pub check_method_names: Vec<String>,
    /// Hooks run before the guards.
    pub before_hooks: Vec<HookCall>,
    /// Hooks run after the handler.
    pub after_hooks: Vec<HookCall>,
    /// Declared debounce window.
    pub debounce_millis: Option<u64>,
    /// Declared throttle window.
    pub throttle_millis: Option<u64>,
    /// Register a capture-phase listener.
    pub use_capture: bool,
}

impl BindingDescriptor {
    /// The effective rate limit. Debounce wins when both are declared.
    #[must_use]
    pub fn rate_limit(&self) -> Option<RateLimit> {
        match (self.debounce_millis, self.throttle_millis) {
            (Some(ms), throttle) => {
                if throttle.is_some() {
                    tracing::warn!(
                        event = %self.event_name,
                        "both debounce and throttle declared; throttle is ignored"
                    );
                }
                Some(RateLimit::Debounce(ms))
            }
            (None, Some(ms)) => Some(RateLimit::Throttle(ms)),
            (None, None) => None,
        }
    }
}

impl BindingSpec {
    /// Fan out into one descriptor per event name.
    ///
    /// Each unclassified keyword becomes a check-method name if `is_member`
    /// accepts it and a lower-cased keycode otherwise.
    pub fn descriptors(&self, is_member: impl Fn(&str) -> bool) -> Vec<BindingDescriptor> {
        let mut codes = SmallVec::new();
        let mut check_method_names = Vec::new();
        for keyword in &self.modifiers.unclassified {
            if is_member(keyword) {
                check_method_names.push(keyword.clone());
            } else {
                codes.push(keyword.to_lowercase());
            }
        }

        self.event_names
            .iter()
            .map(|event_name| BindingDescriptor {
                event_name: event_name.clone(),
                target_ref: self.target_ref.clone(),
                delegate_selector: self.delegate_selector.clone(),
                codes: codes.clone(),
                check_method_names: check_method_names.clone(),
                before_hooks: self.modifiers.before.clone(),
                after_hooks: self.modifiers.after.clone(),
                debounce_millis: self.modifiers.debounce_millis,
                throttle_millis: self.modifiers.throttle_millis,
                use_capture: self.modifiers.use_capture,
            })
            .collect()
    }
}

/// Returns `true` if `name` declares a DOM event binding.
///
/// The prefix must be a whole token: followed by the event separator,
/// whitespace, or nothing. Malformed declarations such as `domevent click`
/// are still picked up and reported by [`parse_binding_name`] rather than
/// silently skipped, while members that merely start with the prefix
/// (`domeventsEnabled`) are not candidates.
#[must_use]
pub fn is_binding_name(name: &str) -> bool {
    binding_path(name)
        .strip_prefix(DOM_EVENT_PREFIX)
        .is_some_and(|rest| {
            rest.is_empty()
                || rest.starts_with(DOM_EVENT_SEPARATOR)
                || rest.starts_with(char::is_whitespace)
        })
}

fn binding_path(name: &str) -> &str {
    name.split(CHECK_SEPARATOR)
        .next()
        .unwrap_or_default()
        .trim()
}

/// Parse a binding name.
pub fn parse_binding_name(name: &str) -> Result<BindingSpec, ParseError> {
    let mut pieces = name.trim().split(CHECK_SEPARATOR).map(str::trim);
    let path = pieces.next().unwrap_or_default();

    let spec = path
        .strip_prefix(DOM_EVENT_PREFIX)
        .ok_or(ParseError::MissingPrefix)?
        .strip_prefix(DOM_EVENT_SEPARATOR)
        .ok_or(ParseError::MissingEventSeparator)?;

    let mut segments = spec.split(PATH_SEPARATOR).filter(|s| !s.is_empty());
    let events = segments.next().ok_or(ParseError::EmptyEventName)?;
    let event_names = events
        .split(NAME_SEPARATOR)
        .map(str::trim)
        .map(|event| {
            if event.is_empty() {
                Err(ParseError::EmptyEventName)
            } else {
                Ok(event.to_string())
            }
        })
        .collect::<Result<SmallVec<[String; 2]>, _>>()?;

    let target_ref = segments.next().map(ToString::to_string);
    let delegate = segments.collect::<Vec<_>>().join(PATH_SEPARATOR);
    let delegate_selector = (!delegate.is_empty()).then_some(delegate);

    let modifiers = classify(pieces.filter(|kw| !kw.is_empty()))?;

    Ok(BindingSpec {
        event_names,
        target_ref,
        delegate_selector,
        modifiers,
    })
}

fn classify<'a>(keywords: impl Iterator<Item = &'a str>) -> Result<Modifiers, ParseError> {
    let mut modifiers = Modifiers::default();
    for keyword in keywords {
        if let Some(args) = keyword_args(keyword, AFTER) {
            modifiers.after.push(hook_call(keyword, args)?);
        } else if let Some(args) = keyword_args(keyword, BEFORE) {
            modifiers.before.push(hook_call(keyword, args)?);
        } else if let Some(args) = keyword_args(keyword, DEBOUNCE) {
            let ms = millis(keyword, args)?;
            modifiers.debounce_millis.get_or_insert(ms);
        } else if let Some(args) = keyword_args(keyword, THROTTLE) {
            let ms = millis(keyword, args)?;
            modifiers.throttle_millis.get_or_insert(ms);
        } else if keyword_args(keyword, CAPTURE).is_some() {
            modifiers.use_capture = true;
        } else {
            modifiers.unclassified.push(keyword.to_string());
        }
    }
    Ok(modifiers)
}

/// If `keyword` starts with `category`, the argument text after it, with
/// surrounding parentheses removed.
fn keyword_args<'a>(keyword: &'a str, category: &str) -> Option<&'a str> {
    let rest = keyword.strip_prefix(category)?.trim();
    let args = match rest.strip_prefix('(') {
        Some(inner) => inner.strip_suffix(')').unwrap_or(inner),
        None => rest,
    };
    Some(args.trim())
}

fn hook_call(keyword: &str, args: &str) -> Result<HookCall, ParseError> {
    let (name, param) = match args.split_once(char::is_whitespace) {
        Some((name, param)) => (name, param.trim()),
        None => (args, ""),
    };
    if name.is_empty() {
        return Err(ParseError::MissingHookName {
            keyword: keyword.to_string(),
        });
    }
    Ok(HookCall {
        name: name.to_string(),
        param: (!param.is_empty()).then(|| param.to_string()),
    })
}

fn millis(keyword: &str, args: &str) -> Result<u64, ParseError> {
    if args.is_empty() {
        return Ok(DEFAULT_RATE_LIMIT_MILLIS);
    }
    args.parse().map_err(|_| ParseError::InvalidRateLimit {
        keyword: keyword.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn parse(name: &str) -> BindingSpec {
        parse_binding_name(name).unwrap()
    }

    #[test]
    fn minimal_name_has_root_target() {
        let spec = parse("domevent:click");
        assert_eq!(spec.event_names.as_slice(), ["click"]);
        assert_eq!(spec.target_ref, None);
        assert_eq!(spec.delegate_selector, None);
        assert_eq!(spec.modifiers, Modifiers::default());
    }

    #[test]
    fn outer_whitespace_is_trimmed() {
        let spec = parse("   domevent:click list  |  enter  ");
        assert_eq!(spec.target_ref.as_deref(), Some("list"));
        assert_eq!(spec.modifiers.unclassified, ["enter"]);
    }

    #[test]
    fn delegate_selector_keeps_descendant_segments() {
        let spec = parse("domevent:click list ul > li.item a");
        assert_eq!(spec.target_ref.as_deref(), Some("list"));
        assert_eq!(spec.delegate_selector.as_deref(), Some("ul > li.item a"));
    }

    #[test]
    fn fan_out_shares_configuration() {
        let spec =
            parse("domevent:mousedown,touchstart $el .handle | capture | before(lock) | esc");
        let descriptors = spec.descriptors(|_| false);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].event_name, "mousedown");
        assert_eq!(descriptors[1].event_name, "touchstart");

        let strip = |d: &BindingDescriptor| BindingDescriptor {
            event_name: String::new(),
            ..d.clone()
        };
        assert_eq!(strip(&descriptors[0]), strip(&descriptors[1]));
        assert!(descriptors[0].use_capture);
        assert_eq!(descriptors[0].delegate_selector.as_deref(), Some(".handle"));
    }

    #[test]
    fn keywords_classify_into_exactly_one_bucket() {
        let spec = parse(
            "domevent:keydown | after(save now) | before(check) | debounce(120) | throttle(40) \
             | capture | isOpen | Enter | ArrowUp",
        );
        let m = &spec.modifiers;
        assert_eq!(
            m.after,
            vec![HookCall {
                name: "save".into(),
                param: Some("now".into())
            }]
        );
        assert_eq!(
            m.before,
            vec![HookCall {
                name: "check".into(),
                param: None
            }]
        );
        assert_eq!(m.debounce_millis, Some(120));
        assert_eq!(m.throttle_millis, Some(40));
        assert!(m.use_capture);
        assert_eq!(m.unclassified, ["isOpen", "Enter", "ArrowUp"]);

        let d = &spec.descriptors(|name| name == "isOpen")[0];
        assert_eq!(d.check_method_names, ["isOpen"]);
        assert_eq!(d.codes.as_slice(), ["enter", "arrowup"]);
    }

    #[test]
    fn earliest_category_claims_ambiguous_keyword() {
        // Both `after` and `before` would accept this text; `after` is checked first.
        let spec = parse("domevent:click | afterbefore(x)");
        assert_eq!(spec.modifiers.after.len(), 1);
        assert!(spec.modifiers.before.is_empty());
    }

    #[test]
    fn debounce_takes_precedence_over_throttle() {
        let spec = parse("domevent:scroll | throttle(10) | debounce(20)");
        let d = &spec.descriptors(|_| false)[0];
        assert_eq!(d.rate_limit(), Some(RateLimit::Debounce(20)));

        let spec = parse("domevent:scroll | throttle(10) | throttle(99)");
        let d = &spec.descriptors(|_| false)[0];
        assert_eq!(d.rate_limit(), Some(RateLimit::Throttle(10)));
    }

    #[test]
    fn bare_rate_limit_uses_default_window() {
        let spec = parse("domevent:input | debounce | throttle()");
        let window = Some(DEFAULT_RATE_LIMIT_MILLIS);
        assert_eq!(spec.modifiers.debounce_millis, window);
        assert_eq!(spec.modifiers.throttle_millis, window);
    }

    #[test]
    fn malformed_names_are_errors() {
        assert_eq!(parse_binding_name("click"), Err(ParseError::MissingPrefix));
        assert_eq!(
            parse_binding_name("domevent click"),
            Err(ParseError::MissingEventSeparator)
        );
        assert_eq!(
            parse_binding_name("domevent: | enter"),
            Err(ParseError::EmptyEventName)
        );
        assert_eq!(
            parse_binding_name("domevent:click,,keyup"),
            Err(ParseError::EmptyEventName)
        );
        assert_eq!(
            parse_binding_name("domevent:click | after()"),
            Err(ParseError::MissingHookName {
                keyword: "after()".into()
            })
        );
        assert_eq!(
            parse_binding_name("domevent:click | debounce(soon)"),
            Err(ParseError::InvalidRateLimit {
                keyword: "debounce(soon)".into()
            })
        );
    }

    #[test]
    fn candidate_filter_requires_a_whole_prefix_token() {
        assert!(is_binding_name("domevent:click"));
        assert!(is_binding_name("domevent click | enter"));
        assert!(!is_binding_name("render"));
        assert!(!is_binding_name("click | domevent"));
        assert!(is_binding_name("domevent"));
        assert!(!is_binding_name("domeventsEnabled"));
        assert!(!is_binding_name("domevent_count | enter"));
    }
}
