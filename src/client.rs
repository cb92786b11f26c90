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

//! The caller-facing facade: a registry, a launcher, and a resolver
//! bundled behind `connect`/`resolve_endpoints`.

use tracing::debug;

use crate::chain::{Hop, HopChain};
use crate::error::Error;
use crate::method::registry::MethodRegistry;
use crate::resolve::EndpointResolver;
use crate::session::{Launcher, Session};

/// Connects to endpoints and resolves completion lists.
///
/// Holds the immutable method registry; sessions themselves are
/// independent of the client and of each other once returned.
#[derive(Debug)]
pub struct Client {
    registry: MethodRegistry,
    launcher: Launcher,
    resolver: EndpointResolver,
}

impl Default for Client {
    fn default() -> Self {
        Self::new(MethodRegistry::with_builtins())
    }
}

impl Client {
    /// A client over the given registry, with default launcher and
    /// resolver settings.
    pub fn new(registry: MethodRegistry) -> Self {
        Self {
            registry,
            launcher: Launcher::new(),
            resolver: EndpointResolver::default(),
        }
    }

    /// Replace the launcher (custom spawner or handshake timeout).
    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Replace the resolver (custom completion cache TTL).
    pub fn with_resolver(mut self, resolver: EndpointResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// The reachable endpoint identifiers for a scheme.
    pub async fn resolve_endpoints(&self, scheme: &str) -> Result<Vec<String>, Error> {
        let descriptor = self.registry.lookup(scheme)?;
        Ok(self.resolver.resolve(&descriptor).await?)
    }

    /// Connect to a (possibly multi-hop) address string.
    pub async fn connect(&self, route: &str) -> Result<Session, Error> {
        self.connect_with_command(route, None).await
    }

    /// Connect, supplying a one-shot command for the final hop's `%c`
    /// placeholder.
    ///
    /// Every hop's scheme is resolved against the registry before any
    /// subprocess is spawned, so an unknown method is side-effect-free.
    pub async fn connect_with_command(
        &self,
        route: &str,
        command: Option<&str>,
    ) -> Result<Session, Error> {
        let chain = HopChain::parse(&self.registry, route)?;
        debug!(route = %chain.route_description(), "connecting");

        if chain.len() == 1 {
            let Hop {
                descriptor,
                address,
            } = chain.into_hops().remove(0);
            Ok(self.launcher.connect(&descriptor, &address, command).await?)
        } else {
            Ok(chain.connect(&self.launcher, command).await?)
        }
    }
}
