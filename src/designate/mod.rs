// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Designate management through the `designate` command-line client.
//!
//! - [`client`] - listing and idempotent creation of domains and servers
//! - [`novarc`] - the admin credentials file the client authenticates with

pub mod client;
pub mod novarc;

pub use client::{DesignateClient, Domain, Server};
pub use novarc::Credentials;
