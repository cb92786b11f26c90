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

//! Multi-hop route composition.
//!
//! A route like `ssh:admin@bastion|jexec:web1` establishes hop 1 as a
//! real OS process, then reaches each further hop by writing that hop's
//! login command into the already-established stream and re-running
//! ready-signal detection on the same stream. One OS process carries the
//! whole chain, so tearing it down kills every hop at once.

use tracing::{debug, info, warn};

use crate::address::EndpointAddress;
use crate::error::{ChainError, ConnectError, Error, MethodError};
use crate::method::descriptor::{MethodDescriptor, SubstitutionContext};
use crate::method::registry::MethodRegistry;
use crate::session::launcher::{await_ready, Launcher};
use crate::session::Session;

use std::sync::Arc;

/// One leg of a multi-hop route.
#[derive(Debug, Clone)]
pub struct Hop {
    pub descriptor: Arc<MethodDescriptor>,
    pub address: EndpointAddress,
}

/// An ordered multi-hop route, resolved against the registry.
///
/// Constructed by parsing a pipe-delimited address string; consumed once
/// by [`HopChain::connect`] and discarded. Every scheme is resolved
/// before construction succeeds, so an unknown method fails here, before
/// any subprocess is spawned.
#[derive(Debug)]
pub struct HopChain {
    hops: Vec<Hop>,
}

impl HopChain {
    /// Parse a route string and resolve every hop's scheme.
    pub fn parse(registry: &MethodRegistry, route: &str) -> Result<Self, Error> {
        let addresses = EndpointAddress::parse_chain(route)?;
        let hops = addresses
            .into_iter()
            .map(|address| {
                let descriptor = registry.lookup(&address.scheme)?;
                Ok(Hop {
                    descriptor,
                    address,
                })
            })
            .collect::<Result<Vec<_>, MethodError>>()?;
        Ok(Self { hops })
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn into_hops(self) -> Vec<Hop> {
        self.hops
    }

    /// Human-readable route, `scheme:host -> scheme:host`.
    pub fn route_description(&self) -> String {
        self.hops
            .iter()
            .map(|hop| format!("{}:{}", hop.descriptor.name, hop.address.host))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Establish the chain end to end, consuming it.
    pub async fn connect(
        self,
        launcher: &Launcher,
        command: Option<&str>,
    ) -> Result<Session, ChainError> {
        connect_chain(launcher, &self.hops, command).await
    }
}

/// Connect through `hops` in order, returning one session whose stream
/// reaches the final endpoint.
///
/// `command` fills the `%c` placeholder of the final hop only. On any
/// failure past hop 1 the chain's process is terminated before the
/// [`ChainError`] is returned; no dangling intermediate shells survive.
pub async fn connect_chain(
    launcher: &Launcher,
    hops: &[Hop],
    command: Option<&str>,
) -> Result<Session, ChainError> {
    let Some(first) = hops.first() else {
        return Err(ChainError {
            hop: 0,
            address: "<empty>".to_string(),
            source: ConnectError::Method(MethodError::Invalid {
                name: String::new(),
                reason: "route has no hops".to_string(),
            }),
        });
    };
    let last = hops.len() - 1;

    let first_command = if last == 0 { command } else { None };
    let mut session = launcher
        .connect(&first.descriptor, &first.address, first_command)
        .await
        .map_err(|source| ChainError {
            hop: 0,
            address: first.address.to_string(),
            source,
        })?;

    for (index, hop) in hops.iter().enumerate().skip(1) {
        let hop_command = if index == last { command } else { None };
        let ctx = SubstitutionContext::from_address(&hop.address, hop_command);

        let result = advance_hop(launcher, &mut session, hop, &ctx).await;
        if let Err(source) = result {
            warn!(
                hop = index,
                scheme = %hop.descriptor.name,
                "hop failed, tearing down chain"
            );
            if let Err(err) = session.terminate().await {
                warn!(error = %err, "chain teardown failed");
            }
            return Err(ChainError {
                hop: index,
                address: hop.address.to_string(),
                source,
            });
        }

        session.set_route(hop.descriptor.clone(), hop.address.clone());
    }

    info!(
        hops = hops.len(),
        endpoint = %session.address().host,
        "chain established"
    );
    Ok(session)
}

/// Re-execute `hop`'s login command inside the current session's shell
/// and wait for the next shell's ready-signal on the same stream.
async fn advance_hop(
    launcher: &Launcher,
    session: &mut Session,
    hop: &Hop,
    ctx: &SubstitutionContext<'_>,
) -> Result<(), ConnectError> {
    let line = hop.descriptor.login_command_line(ctx)?;
    debug!(scheme = %hop.descriptor.name, command = %line, "advancing chain");
    session.send_line(&line).await?;
    await_ready(
        session.stream_mut(),
        &hop.descriptor,
        launcher.handshake_timeout(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MethodRegistry {
        MethodRegistry::with_builtins()
    }

    #[test]
    fn test_parse_resolves_every_scheme() {
        let chain = HopChain::parse(&registry(), "ssh:admin@bastion|jexec:web1").unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.hops()[0].descriptor.name, "ssh");
        assert_eq!(chain.hops()[1].descriptor.name, "jexec");
    }

    #[test]
    fn test_parse_unknown_scheme_fails_before_spawn() {
        let err = HopChain::parse(&registry(), "ssh:bastion|warp:core").unwrap_err();
        assert!(matches!(
            err,
            Error::Method(MethodError::Unknown { name }) if name == "warp"
        ));
    }

    #[test]
    fn test_parse_bad_address_fails() {
        assert!(matches!(
            HopChain::parse(&registry(), "ssh:bastion|"),
            Err(Error::Address(_))
        ));
    }

    #[test]
    fn test_route_description() {
        let chain = HopChain::parse(&registry(), "ssh:bastion|bastille:agent-a").unwrap();
        assert_eq!(chain.route_description(), "ssh:bastion -> bastille:agent-a");
    }

    #[test]
    fn test_single_hop_chain() {
        let chain = HopChain::parse(&registry(), "bastille:agent-a").unwrap();
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_hop_command_line_rendering() {
        // What actually gets typed into the previous hop's shell.
        let reg = registry();
        let descriptor = reg.lookup("jexec").unwrap();
        let address = EndpointAddress::parse("jexec:web1").unwrap();
        let ctx = SubstitutionContext::from_address(&address, None);
        let line = descriptor.login_command_line(&ctx).unwrap();
        assert_eq!(line, "sudo jexec web1 sh");
    }

    #[test]
    fn test_chain_is_consumed_by_connect() {
        // Compile-time property: connect(self) moves the chain. Nothing
        // to assert at runtime beyond construction working.
        let chain = HopChain::parse(&registry(), "ssh:a|ssh:b").unwrap();
        let _hops: Vec<Hop> = chain.into_hops();
    }

    #[test]
    fn test_descriptor_definition_appears_once() {
        let chain = HopChain::parse(&registry(), "ssh:a|ssh:b").unwrap();
        // Both hops share the registry's descriptor.
        assert!(Arc::ptr_eq(
            &chain.hops()[0].descriptor,
            &chain.hops()[1].descriptor
        ));
    }
}
