// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # Designate Charm - Reactive Juju charm for OpenStack Designate
//!
//! The charm installs and configures Designate (DNS-as-a-Service) on a Juju
//! unit and keeps it converged with its relations: the database, the message
//! bus, Keystone, the BIND backend, peers and the hacluster subordinate.
//!
//! ## Overview
//!
//! Every hook invocation runs one pass of a reactive engine:
//!
//! 1. Persisted flags, relation states, the hook name and changed files are
//!    captured in a [`conditions::Snapshot`].
//! 2. Each handler in the [`registry::HandlerRegistry`] is evaluated against
//!    that snapshot, in registration order.
//! 3. Matching handlers run their [`registry::Action`]; milestone actions set a
//!    flag or leader marker once the external system confirms the work.
//!
//! Dependent milestones advance on later invocations. Juju keeps firing hooks
//! until the unit converges.
//!
//! ## Modules
//!
//! - [`flags`] - durable flag store and state file
//! - [`relations`] - relation snapshots and outbound relation settings
//! - [`conditions`] - predicates handlers are registered with
//! - [`registry`] - handler registration and invariants
//! - [`dispatcher`] - the single sweep per invocation
//! - [`handlers`] - install, configure, migrate, create domains, HA
//! - [`render`] - configuration files and the services they restart
//! - [`designate`] - idempotent domain and server management
//! - [`leadership`] - leader settings
//!
//! ## Example
//!
//! ```rust,no_run
//! use designate_charm::conditions::{Condition, Predicate, Snapshot};
//!
//! let predicate = Predicate::new()
//!     .and(Condition::when(["shared-db.available"]))
//!     .and(Condition::when_not(["base-config.rendered"]));
//!
//! let snapshot = Snapshot::new().with_state("shared-db.available");
//! assert!(predicate.evaluate(&snapshot));
//! ```

pub mod cli;
pub mod command;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod context;
pub mod designate;
pub mod dispatcher;
pub mod errors;
pub mod flags;
pub mod handlers;
pub mod hashing;
pub mod hookenv;
pub mod io;
pub mod leadership;
pub mod registry;
pub mod relations;
pub mod release;
pub mod render;
pub mod states;
pub mod status;
pub mod testing;
