// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! RNDC key files.
//!
//! Designate's pool manager controls each BIND secondary with `rndc`, which
//! authenticates with a shared HMAC secret stored in a BIND key file.

use crate::constants::{RNDC_KEY_ALGORITHM, RNDC_KEY_NAME};
use anyhow::{Context, Result};

/// RNDC key data for authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RndcKeyData {
    /// Key name referenced by `rndc -y`
    pub name: String,
    /// HMAC algorithm, e.g. `hmac-md5`
    pub algorithm: String,
    /// Base64-encoded secret
    pub secret: String,
}

impl RndcKeyData {
    /// Key for an external secondary from the `dns-slaves` option.
    #[must_use]
    pub fn for_slave(secret: &str) -> Self {
        Self {
            name: RNDC_KEY_NAME.to_string(),
            algorithm: RNDC_KEY_ALGORITHM.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Render in BIND key file format.
    ///
    /// ```text
    /// key "rndc-key" {
    ///     algorithm hmac-md5;
    ///     secret "base64secret==";
    /// };
    /// ```
    #[must_use]
    pub fn to_key_file(&self) -> String {
        format!(
            "key \"{}\" {{\n    algorithm {};\n    secret \"{}\";\n}};\n",
            self.name, self.algorithm, self.secret
        )
    }
}

/// Parse a BIND key file back into its parts.
///
/// # Errors
///
/// Returns an error if the name, algorithm or secret cannot be found.
pub fn parse_key_file(content: &str) -> Result<RndcKeyData> {
    let name = content
        .lines()
        .find(|line| line.trim_start().starts_with("key"))
        .and_then(|line| line.split('"').nth(1))
        .context("Failed to parse key name from rndc key file")?
        .to_string();

    let algorithm = content
        .lines()
        .find(|line| line.contains("algorithm"))
        .and_then(|line| {
            line.split_whitespace()
                .nth(1)
                .map(|s| s.trim_end_matches(';'))
        })
        .context("Failed to parse algorithm from rndc key file")?
        .to_string();

    let secret = content
        .lines()
        .find(|line| line.contains("secret"))
        .and_then(|line| line.split('"').nth(1))
        .context("Failed to parse secret from rndc key file")?
        .to_string();

    Ok(RndcKeyData {
        name,
        algorithm,
        secret,
    })
}

#[cfg(test)]
#[path = "rndc_tests.rs"]
mod rndc_tests;
