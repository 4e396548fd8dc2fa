// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Handler registry.
//!
//! Handlers are registered once at startup, in order, by an explicit routine
//! (see [`crate::handlers::build_registry`]). Registration checks the
//! invariants the dispatcher relies on and fails the build otherwise:
//!
//! - Handler names are unique
//! - Every handler has at least one condition, and no flag condition is empty
//! - Relation states only name declared relations
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use designate_charm::conditions::{Condition, Predicate};
//! use designate_charm::context::HookContext;
//! use designate_charm::registry::{Action, HandlerRegistry};
//!
//! struct Noop;
//!
//! #[async_trait]
//! impl Action for Noop {
//!     async fn run(&self, _ctx: &mut HookContext) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = HandlerRegistry::builder(&["amqp"])
//!     .register(
//!         "noop",
//!         Predicate::new()
//!             .and(Condition::when(["amqp.available"]))
//!             .and(Condition::when_not(["done"])),
//!         Noop,
//!     )
//!     .build()
//!     .unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

use crate::conditions::{Condition, Predicate};
use crate::context::HookContext;
use crate::errors::RegistryError;
use crate::states::relation_of;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// The body of a handler.
#[async_trait]
pub trait Action: Send + Sync {
    /// Perform the action. Errors leave the handler's milestone flag unset.
    async fn run(&self, ctx: &mut HookContext) -> anyhow::Result<()>;
}

/// One registered handler.
#[derive(Clone)]
pub struct Handler {
    name: String,
    predicate: Predicate,
    action: Arc<dyn Action>,
}

impl Handler {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    #[must_use]
    pub fn action(&self) -> &Arc<dyn Action> {
        &self.action
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("predicate", &self.predicate.to_string())
            .finish_non_exhaustive()
    }
}

/// Ordered, validated list of handlers.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Handler>,
}

impl HandlerRegistry {
    /// Start a registry for a charm declaring `relations`.
    #[must_use]
    pub fn builder(relations: &[&str]) -> RegistryBuilder {
        RegistryBuilder {
            declared: relations.iter().map(|r| (*r).to_string()).collect(),
            handlers: Vec::new(),
            error: None,
        }
    }

    /// Handlers in registration order.
    #[must_use]
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.iter().find(|h| h.name == name)
    }

    /// Every path referenced by a `when_file_changed` condition, deduplicated.
    #[must_use]
    pub fn watched_files(&self) -> BTreeSet<String> {
        self.handlers
            .iter()
            .flat_map(|h| h.predicate.watched_files())
            .map(str::to_string)
            .collect()
    }

    /// `(name, predicate)` pairs for display.
    #[must_use]
    pub fn describe(&self) -> Vec<(String, String)> {
        self.handlers
            .iter()
            .map(|h| (h.name.clone(), h.predicate.to_string()))
            .collect()
    }
}

/// Collects registrations; the first invalid one is reported by [`RegistryBuilder::build`].
pub struct RegistryBuilder {
    declared: BTreeSet<String>,
    handlers: Vec<Handler>,
    error: Option<RegistryError>,
}

impl RegistryBuilder {
    /// Append a handler.
    #[must_use]
    pub fn register(
        mut self,
        name: impl Into<String>,
        predicate: Predicate,
        action: impl Action + 'static,
    ) -> Self {
        self.push(name.into(), predicate, Arc::new(action));
        self
    }

    /// Append a handler sharing an action with another registration.
    #[must_use]
    pub fn register_shared(
        mut self,
        name: impl Into<String>,
        predicate: Predicate,
        action: Arc<dyn Action>,
    ) -> Self {
        self.push(name.into(), predicate, action);
        self
    }

    fn push(&mut self, name: String, predicate: Predicate, action: Arc<dyn Action>) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.validate(&name, &predicate) {
            self.error = Some(e);
            return;
        }
        self.handlers.push(Handler {
            name,
            predicate,
            action,
        });
    }

    fn validate(&self, name: &str, predicate: &Predicate) -> Result<(), RegistryError> {
        if self.handlers.iter().any(|h| h.name == name) {
            return Err(RegistryError::DuplicateHandler {
                handler: name.to_string(),
            });
        }
        if predicate.is_empty() {
            return Err(RegistryError::EmptyPredicate {
                handler: name.to_string(),
            });
        }
        for condition in predicate.conditions() {
            if condition.is_empty() {
                return Err(RegistryError::EmptyCondition {
                    handler: name.to_string(),
                });
            }
            if matches!(condition, Condition::Hook(_) | Condition::FileChanged(_)) {
                continue;
            }
            for state in condition.state_names() {
                if let Some(relation) = relation_of(state) {
                    if !self.declared.contains(relation) {
                        return Err(RegistryError::UndeclaredRelation {
                            handler: name.to_string(),
                            relation: relation.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Finish the registry.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] hit during registration.
    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(HandlerRegistry {
                handlers: self.handlers,
            }),
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;
