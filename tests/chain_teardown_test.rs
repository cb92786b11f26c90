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

//! Multi-hop composition against scripted spawns: teardown on mid-chain
//! failure, and descriptor/address repositioning on success.

mod common;

use std::sync::Arc;
use std::time::Duration;

use hopsh::error::{ConnectError, Error};
use hopsh::method::MethodRegistry;
use hopsh::session::Launcher;
use hopsh::Client;

use common::ScriptedSpawner;

#[tokio::test]
async fn hop_two_timeout_terminates_hop_one_process() {
    // Hop 1 prompts and succeeds; the stream then stays silent, so hop
    // 2's ready-signal never arrives.
    let spawner = Arc::new(ScriptedSpawner::new(b"bastion$ "));
    let client = Client::new(MethodRegistry::with_builtins()).with_launcher(
        Launcher::with_spawner(spawner.clone())
            .with_handshake_timeout(Duration::from_millis(100)),
    );

    let err = client
        .connect("ssh:admin@bastion|jexec:web1")
        .await
        .unwrap_err();

    let Error::Chain(chain_err) = err else {
        panic!("expected chain error, got {err:?}");
    };
    assert_eq!(chain_err.hop, 1);
    assert!(chain_err.address.contains("web1"));
    assert!(matches!(
        chain_err.source,
        ConnectError::HandshakeTimeout { .. }
    ));

    // The hop-1 process must not be left dangling.
    assert!(spawner.process_terminated());
    // Exactly one OS-level spawn: later hops ride hop 1's stream.
    assert_eq!(spawner.spawns(), 1);
}

#[tokio::test]
async fn single_hop_failure_is_not_a_chain_error() {
    // Silent stream, prompt never arrives: a one-hop route must surface
    // the launcher's error without chain wrapping.
    let spawner = Arc::new(ScriptedSpawner::new(b""));
    let client = Client::new(MethodRegistry::with_builtins()).with_launcher(
        Launcher::with_spawner(spawner.clone())
            .with_handshake_timeout(Duration::from_millis(100)),
    );

    let err = client.connect("ssh:lonely").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Connect(ConnectError::HandshakeTimeout { .. })
    ));
    // A half-established process is torn down before the error returns.
    assert!(spawner.process_terminated());
}

#[tokio::test]
async fn two_hop_chain_lands_on_final_descriptor() {
    // Hop 1 prompts from the banner; the double then answers hop 2's
    // login line with the jail's prompt, the way a real shell would.
    let spawner = Arc::new(ScriptedSpawner::new(b"bastion$ ").with_reply(b"jail# "));
    let client = Client::new(MethodRegistry::with_builtins()).with_launcher(
        Launcher::with_spawner(spawner.clone())
            .with_handshake_timeout(Duration::from_millis(500)),
    );

    let session = client
        .connect("ssh:admin@bastion|bastille:agent-a")
        .await
        .unwrap();

    assert_eq!(session.descriptor().name, "bastille");
    assert_eq!(session.address().host, "agent-a");
    assert_eq!(spawner.spawns(), 1);

    session.close().await.unwrap();
    assert!(spawner.process_terminated());
}
