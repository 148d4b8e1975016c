// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration errors raised while parsing and binding handler names.
//!
//! Guard failures (a key that does not match, a check that is false) are not
//! errors; they only skip one event occurrence.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A binding name that does not follow the grammar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The name does not start with the `domevent` prefix.
    MissingPrefix,
    /// The prefix is not followed by `:` and an event spec.
    MissingEventSeparator,
    /// The event spec is empty or contains an empty comma-joined name.
    EmptyEventName,
    /// `before(...)` or `after(...)` without a hook name.
    MissingHookName {
        /// The offending keyword.
        keyword: String,
    },
    /// `debounce(...)` or `throttle(...)` with a non-numeric window.
    InvalidRateLimit {
        /// The offending keyword.
        keyword: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix => f.write_str("binding name does not start with `domevent`"),
            Self::MissingEventSeparator => {
                f.write_str("expected `:` followed by an event name after `domevent`")
            }
            Self::EmptyEventName => f.write_str("event spec contains an empty event name"),
            Self::MissingHookName { keyword } => {
                write!(f, "hook keyword `{keyword}` does not name a hook")
            }
            Self::InvalidRateLimit { keyword } => {
                write!(f, "`{keyword}` does not carry a window in milliseconds")
            }
        }
    }
}

impl core::error::Error for ParseError {}

/// Why a single binding could not be established.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingErrorKind {
    /// The name is malformed.
    Parse(ParseError),
    /// The component has no handler registered under the name.
    MissingHandler,
    /// No element is known under the target reference.
    UnresolvedTarget {
        /// The target reference as written, or `$el` for the root.
        target: String,
    },
    /// A `before(...)` / `after(...)` hook is not provided by the component.
    UnresolvedHook {
        /// The hook name.
        hook: String,
    },
}

impl fmt::Display for BindingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => fmt::Display::fmt(err, f),
            Self::MissingHandler => f.write_str("component provides no handler for this name"),
            Self::UnresolvedTarget { target } => {
                write!(f, "target `{target}` does not resolve to an element")
            }
            Self::UnresolvedHook { hook } => write!(f, "hook `{hook}` is not provided"),
        }
    }
}

/// A configuration error for one handler name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingError {
    /// The full handler name that failed.
    pub name: String,
    /// What went wrong.
    pub kind: BindingErrorKind,
}

impl BindingError {
    pub(crate) fn new(name: &str, kind: BindingErrorKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot bind `{}`: {}", self.name, self.kind)
    }
}

impl core::error::Error for BindingError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match &self.kind {
            BindingErrorKind::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Every binding that failed during one `initialize`.
///
/// The bindings that did not fail are live regardless.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitializeError {
    /// Failures in candidate order.
    pub errors: Vec<BindingError>,
}

impl InitializeError {
    /// Names of the failing handlers, in candidate order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|err| err.name.as_str())
    }
}

impl fmt::Display for InitializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} binding(s) failed", self.errors.len())?;
        for err in &self.errors {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

impl core::error::Error for InitializeError {}
