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

//! Error types for method registration, address parsing, endpoint
//! resolution, and session establishment.
//!
//! Each layer has its own error enum; [`Error`] is the umbrella type
//! returned by the [`Client`](crate::Client) facade. Lower layers never
//! swallow errors, and the chain composer attaches positional context
//! via [`ChainError`].

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::utils::sanitize::ValidationError;

/// Errors from the method registry and descriptor validation.
#[derive(Debug, Error)]
pub enum MethodError {
    /// A method with this name is already registered.
    #[error("connection method '{name}' is already registered")]
    Duplicate { name: String },

    /// No method with this name is registered.
    #[error("unknown connection method '{name}'")]
    Unknown { name: String },

    /// The descriptor failed validation at registration time.
    #[error("invalid connection method '{name}': {reason}")]
    Invalid { name: String, reason: String },

    /// A required placeholder had no value during substitution.
    #[error("method '{method}' requires a {placeholder} value for this address")]
    MissingPlaceholder {
        method: String,
        placeholder: &'static str,
    },
}

/// Errors from parsing a caller-supplied address string.
#[derive(Debug, Error)]
pub enum AddressError {
    /// Empty address string, or an empty hop between `|` separators.
    #[error("empty address specification")]
    Empty,

    /// Address has no `scheme:` prefix.
    #[error("missing scheme in address '{address}' (expected scheme:[user@]host)")]
    MissingScheme { address: String },

    /// Hostname failed validation.
    #[error("invalid host in '{address}': {source}")]
    InvalidHost {
        address: String,
        source: ValidationError,
    },

    /// Username failed validation.
    #[error("invalid user in '{address}': {source}")]
    InvalidUser {
        address: String,
        source: ValidationError,
    },

    /// Port after `#` was not a valid non-zero number.
    #[error("invalid port '{port}' in '{address}'")]
    InvalidPort { address: String, port: String },
}

/// Errors from endpoint enumeration.
///
/// All variants are recoverable: callers building completion lists should
/// degrade to an empty list rather than abort.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The method does not define a listing command.
    #[error("method '{method}' does not support endpoint listing")]
    NotSupported { method: String },

    /// The listing subprocess could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The listing subprocess exited non-zero.
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The listing subprocess produced output, but no line yielded an
    /// endpoint identifier. Empty output is not an error; this is.
    #[error("no endpoint identifiers found in '{program}' output")]
    Unparseable { program: String },
}

/// Errors from a single connect attempt.
///
/// None of these are retried automatically; retry policy belongs to the
/// caller.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Placeholder substitution failed before anything was spawned.
    #[error(transparent)]
    Method(#[from] MethodError),

    /// The login program could not be started (not found, not executable).
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The remote side closed the stream before signalling readiness,
    /// typically a denied privilege elevation or rejected login.
    #[error("remote closed the connection before the shell became ready")]
    Authentication,

    /// No ready-signal arrived within the wait window.
    #[error("no shell prompt within {:.1}s", .timeout.as_secs_f64())]
    HandshakeTimeout { timeout: Duration },

    /// I/O failure on the session stream during establishment.
    #[error("session I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A multi-hop chain failure, wrapping the first hop that failed.
///
/// `hop` is zero-based. When this error is returned, every process
/// belonging to the chain has already been torn down.
#[derive(Debug, Error)]
#[error("chain failed at hop {hop} ({address}): {source}")]
pub struct ChainError {
    /// Zero-based index of the failing hop.
    pub hop: usize,
    /// Display form of the failing hop's address.
    pub address: String,
    #[source]
    pub source: ConnectError,
}

/// Umbrella error for the [`Client`](crate::Client) facade.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Method(#[from] MethodError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_error_display() {
        let err = MethodError::Duplicate {
            name: "jexec".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "connection method 'jexec' is already registered"
        );

        let err = MethodError::Unknown {
            name: "warp".to_string(),
        };
        assert_eq!(err.to_string(), "unknown connection method 'warp'");
    }

    #[test]
    fn test_chain_error_carries_hop_index() {
        let err = ChainError {
            hop: 2,
            address: "jexec:web1".to_string(),
            source: ConnectError::Authentication,
        };
        assert!(err.to_string().contains("hop 2"));
        assert!(err.to_string().contains("jexec:web1"));
    }

    #[test]
    fn test_handshake_timeout_display() {
        let err = ConnectError::HandshakeTimeout {
            timeout: Duration::from_secs(30),
        };
        assert!(err.to_string().contains("30.0s"));
    }
}
