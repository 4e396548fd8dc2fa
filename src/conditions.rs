// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Handler predicates and their evaluation.
//!
//! Conditions are plain data. A [`Predicate`] is a list of conditions that
//! must all hold; evaluation is a pure function of the predicate and a
//! [`Snapshot`] taken once at the start of a dispatch pass, so the same
//! snapshot always yields the same answer no matter what actions did since.
//!
//! # Example
//!
//! ```rust
//! use designate_charm::conditions::{Condition, Predicate, Snapshot};
//!
//! let predicate = Predicate::new()
//!     .and(Condition::when(["shared-db.available"]))
//!     .and(Condition::when_not(["base-config.rendered"]));
//!
//! let snapshot = Snapshot::new().with_state("shared-db.available");
//! assert!(predicate.evaluate(&snapshot));
//! ```

use std::collections::BTreeSet;
use std::fmt;

/// One condition on a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Every named state is active
    When(Vec<String>),
    /// No named state is active
    WhenNot(Vec<String>),
    /// At least one named state is active
    WhenAny(Vec<String>),
    /// None of the named states is active
    WhenNone(Vec<String>),
    /// The invocation's hook has this name
    Hook(String),
    /// The file's content differs from what the previous pass observed
    FileChanged(String),
}

fn names<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl Condition {
    pub fn when<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::When(names(states))
    }

    pub fn when_not<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::WhenNot(names(states))
    }

    pub fn when_any<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::WhenAny(names(states))
    }

    pub fn when_none<I, S>(states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::WhenNone(names(states))
    }

    pub fn hook(name: impl Into<String>) -> Self {
        Self::Hook(name.into())
    }

    pub fn file_changed(path: impl Into<String>) -> Self {
        Self::FileChanged(path.into())
    }

    /// Evaluate against a snapshot.
    ///
    /// `when_any` over an empty list is false; the others follow the usual
    /// empty-quantifier rules. The registry rejects empty lists anyway.
    #[must_use]
    pub fn evaluate(&self, snapshot: &Snapshot) -> bool {
        match self {
            Self::When(states) => states.iter().all(|s| snapshot.is_active(s)),
            Self::WhenNot(states) | Self::WhenNone(states) => {
                !states.iter().any(|s| snapshot.is_active(s))
            }
            Self::WhenAny(states) => states.iter().any(|s| snapshot.is_active(s)),
            Self::Hook(name) => snapshot.hook() == Some(name.as_str()),
            Self::FileChanged(path) => snapshot.file_changed(path),
        }
    }

    /// State names this condition refers to (empty for hook/file conditions).
    #[must_use]
    pub fn state_names(&self) -> &[String] {
        match self {
            Self::When(states)
            | Self::WhenNot(states)
            | Self::WhenAny(states)
            | Self::WhenNone(states) => states,
            Self::Hook(_) | Self::FileChanged(_) => &[],
        }
    }

    /// True when this is a flag condition with no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Hook(_) | Self::FileChanged(_) => false,
            _ => self.state_names().is_empty(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::When(s) => write!(f, "when({})", s.join(", ")),
            Self::WhenNot(s) => write!(f, "when_not({})", s.join(", ")),
            Self::WhenAny(s) => write!(f, "when_any({})", s.join(", ")),
            Self::WhenNone(s) => write!(f, "when_none({})", s.join(", ")),
            Self::Hook(name) => write!(f, "hook({name})"),
            Self::FileChanged(path) => write!(f, "when_file_changed({path})"),
        }
    }
}

/// Conditions AND-ed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate(Vec<Condition>);

impl Predicate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack another condition onto the predicate.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.0.push(condition);
        self
    }

    #[must_use]
    pub fn evaluate(&self, snapshot: &Snapshot) -> bool {
        self.0.iter().all(|c| c.evaluate(snapshot))
    }

    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Paths named by `when_file_changed` conditions.
    pub fn watched_files(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|c| match c {
            Condition::FileChanged(path) => Some(path.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join(" & "))
    }
}

/// Everything a predicate can observe during one dispatch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    states: BTreeSet<String>,
    hook: Option<String>,
    changed_files: BTreeSet<String>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.states.insert(state.into());
        self
    }

    #[must_use]
    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: impl Into<String>) -> Self {
        self.hook = Some(hook.into());
        self
    }

    #[must_use]
    pub fn with_changed_file(mut self, path: impl Into<String>) -> Self {
        self.changed_files.insert(path.into());
        self
    }

    #[must_use]
    pub fn is_active(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    #[must_use]
    pub fn hook(&self) -> Option<&str> {
        self.hook.as_deref()
    }

    #[must_use]
    pub fn file_changed(&self, path: &str) -> bool {
        self.changed_files.contains(path)
    }

    #[must_use]
    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    #[must_use]
    pub fn changed_files(&self) -> &BTreeSet<String> {
        &self.changed_files
    }
}

#[cfg(test)]
#[path = "conditions_tests.rs"]
mod conditions_tests;
