// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Endpoint address parsing.
//!
//! Addresses use the form `scheme:[user@]host[#port][:path]`, with hops of
//! a multi-hop route joined by `|`:
//!
//! ```text
//! ssh:admin@bastion.example.com|jexec:web1:/var/log
//! ecs:my-cluster@abc123def456
//! bastille:agent-a
//! ```
//!
//! The scheme names a registered [`MethodDescriptor`]
//! (crate::method::MethodDescriptor); for ECS the cluster name rides the
//! user slot. Host and user are validated here, before any argv is built
//! from them.

use std::fmt;

use crate::error::AddressError;
use crate::utils::sanitize::{sanitize_hostname, sanitize_username};

/// A parsed endpoint address for a single hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointAddress {
    /// Connection method name; must resolve in the registry before any
    /// launch attempt.
    pub scheme: String,
    /// Optional login user (or ECS cluster name).
    pub user: Option<String>,
    /// Hostname, jail name, or container task identifier.
    pub host: String,
    /// Optional port, given as `host#port`.
    pub port: Option<u16>,
    /// Remote path component, empty when not given.
    pub path: String,
}

impl EndpointAddress {
    /// Parse a single-hop address of the form
    /// `scheme:[user@]host[#port][:path]`.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AddressError::Empty);
        }

        let (scheme, rest) = match address.split_once(':') {
            Some((scheme, rest)) if !scheme.is_empty() => (scheme, rest),
            _ => {
                return Err(AddressError::MissingScheme {
                    address: address.to_string(),
                })
            }
        };

        let (user, rest) = match rest.split_once('@') {
            Some((user, rest)) => (Some(user), rest),
            None => (None, rest),
        };

        // The path starts at the next ':'; everything before it is
        // host[#port]. IPv6 literals are bracketed, so a ':' inside
        // brackets is not a path separator.
        let (host_port, path) = split_host_path(rest);

        let (host, port) = match host_port.split_once('#') {
            Some((host, port_str)) => {
                let port = port_str.parse::<u16>().ok().filter(|p| *p != 0).ok_or_else(
                    || AddressError::InvalidPort {
                        address: address.to_string(),
                        port: port_str.to_string(),
                    },
                )?;
                (host, Some(port))
            }
            None => (host_port, None),
        };

        sanitize_hostname(host).map_err(|source| AddressError::InvalidHost {
            address: address.to_string(),
            source,
        })?;

        if let Some(user) = user {
            sanitize_username(user).map_err(|source| AddressError::InvalidUser {
                address: address.to_string(),
                source,
            })?;
        }

        Ok(Self {
            scheme: scheme.to_string(),
            user: user.map(|u| u.to_string()),
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// Parse a pipe-delimited multi-hop route into its hops, in order.
    ///
    /// A path component is only meaningful on the final hop; intermediate
    /// paths are accepted and ignored by the composer.
    pub fn parse_chain(route: &str) -> Result<Vec<Self>, AddressError> {
        if route.trim().is_empty() {
            return Err(AddressError::Empty);
        }
        route.split('|').map(Self::parse).collect()
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, "#{port}")?;
        }
        if !self.path.is_empty() {
            write!(f, ":{}", self.path)?;
        }
        Ok(())
    }
}

/// Split `host[#port][:path]` at the path separator, keeping bracketed
/// IPv6 literals intact.
fn split_host_path(rest: &str) -> (&str, &str) {
    let search_from = if rest.starts_with('[') {
        rest.find(']').map(|i| i + 1).unwrap_or(0)
    } else {
        0
    };
    match rest[search_from..].find(':') {
        Some(i) => {
            let idx = search_from + i;
            (&rest[..idx], &rest[idx + 1..])
        }
        None => (rest, ""),
    }
}
