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

//! End-to-end piped sessions against real local subprocesses.

#![cfg(unix)]

use std::time::Duration;

use hopsh::error::{ConnectError, Error};
use hopsh::method::{ConnectionKind, LoginArg, MethodDescriptor, MethodRegistry};
use hopsh::session::Launcher;
use hopsh::Client;

/// A direct-async method whose "login program" is plain `cat`: bytes in,
/// bytes out, no prompt negotiation.
fn raw_echo_method() -> MethodDescriptor {
    let mut d = MethodDescriptor::new("raw", "cat");
    d.connection = ConnectionKind::Pipe;
    d.direct_async = true;
    d
}

/// A prompt-scraped method backed by a fake login banner plus `cat`.
fn fake_shell_method() -> MethodDescriptor {
    let mut d = MethodDescriptor::new("fakeshell", "sh");
    d.login_args = vec![
        LoginArg::Literal("-c".to_string()),
        LoginArg::Literal("printf 'login ok\\n$ '; cat".to_string()),
    ];
    d.connection = ConnectionKind::Pipe;
    d
}

fn registry() -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register(raw_echo_method()).unwrap();
    registry.register(fake_shell_method()).unwrap();
    registry
}

#[tokio::test]
async fn direct_async_session_round_trips_bytes() {
    let client = Client::new(registry());
    let mut session = client.connect("raw:localhost").await.unwrap();

    session.write(b"hello\n").await.unwrap();
    let mut buf = [0u8; 64];
    let n = session.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"hello\n");

    session.close().await.unwrap();
}

#[tokio::test]
async fn prompt_scraped_session_becomes_ready_then_echoes() {
    let client = Client::new(registry());
    let mut session = client.connect("fakeshell:localhost").await.unwrap();

    // The banner and prompt were consumed by the handshake; what's left
    // is the cat loop.
    session.send_line("ping").await.unwrap();
    let mut buf = [0u8; 64];
    let n = session.read(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"ping\n");

    session.close().await.unwrap();
}

#[tokio::test]
async fn missing_login_program_is_spawn_error() {
    let mut registry = MethodRegistry::new();
    let mut d = MethodDescriptor::new("ghost", "/nonexistent/hopsh-test-program");
    d.connection = ConnectionKind::Pipe;
    registry.register(d).unwrap();
    let client = Client::new(registry);

    let err = client.connect("ghost:anywhere").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Connect(ConnectError::Spawn { ref program, .. }) if program.contains("nonexistent")
    ));
}

#[tokio::test]
async fn closed_stream_before_prompt_is_authentication_error() {
    // The process prints a refusal and exits without ever prompting.
    let mut registry = MethodRegistry::new();
    let mut d = MethodDescriptor::new("denied", "sh");
    d.login_args = vec![
        LoginArg::Literal("-c".to_string()),
        LoginArg::Literal("printf 'permission denied\\n'".to_string()),
    ];
    d.connection = ConnectionKind::Pipe;
    registry.register(d).unwrap();
    let client = Client::new(registry)
        .with_launcher(Launcher::new().with_handshake_timeout(Duration::from_secs(5)));

    let err = client.connect("denied:anywhere").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Connect(ConnectError::Authentication)
    ));
}

#[tokio::test]
async fn silent_process_times_out() {
    let mut registry = MethodRegistry::new();
    let mut d = MethodDescriptor::new("mute", "sh");
    d.login_args = vec![
        LoginArg::Literal("-c".to_string()),
        LoginArg::Literal("sleep 30".to_string()),
    ];
    d.connection = ConnectionKind::Pipe;
    registry.register(d).unwrap();
    let client = Client::new(registry)
        .with_launcher(Launcher::new().with_handshake_timeout(Duration::from_millis(200)));

    let err = client.connect("mute:anywhere").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Connect(ConnectError::HandshakeTimeout { .. })
    ));
}

#[tokio::test]
async fn session_reports_process_exit() {
    let client = Client::new(registry());
    let mut session = client.connect("raw:localhost").await.unwrap();
    assert!(!session.has_exited());
    session.close().await.unwrap();
}
