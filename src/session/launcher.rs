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

//! Remote session launching: spawn the login process and wait for the
//! remote shell's ready-signal.
//!
//! Spawning goes through the [`Spawner`] trait so the handshake and
//! chain logic can be exercised against scripted processes; the
//! [`NativeSpawner`] is the production implementation.

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use crate::address::EndpointAddress;
use crate::error::ConnectError;
use crate::method::descriptor::{ConnectionKind, MethodDescriptor, SubstitutionContext};
use crate::session::stream::SessionStream;
use crate::session::Session;

/// Default wait window for the remote shell's ready-signal.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Matched when a method defines no prompt pattern of its own: a typical
/// shell prompt terminator at the end of the received output.
static DEFAULT_PROMPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[$#%>]\s*\z").expect("default prompt pattern is valid"));

/// Only the trailing part of the stream is scanned for a prompt; output
/// before it cannot contain the ready-signal we care about.
const PROMPT_WINDOW: usize = 2048;

/// A spawned login process: its lifecycle handle plus the duplex stream
/// attached to it.
pub struct SpawnedShell {
    pub process: Box<dyn ShellProcess>,
    pub stream: SessionStream,
}

/// Lifecycle handle for a login process.
#[async_trait]
pub trait ShellProcess: Send {
    /// OS process id, when still known.
    fn id(&self) -> Option<u32>;

    /// Whether the process has exited.
    fn has_exited(&mut self) -> bool;

    /// Terminate the process and reap it.
    async fn terminate(&mut self) -> io::Result<()>;
}

/// Spawns login processes. One implementation per process transport;
/// test doubles implement this to count and script spawns.
#[async_trait]
pub trait Spawner: Send + Sync {
    async fn spawn(
        &self,
        program: &str,
        args: &[String],
        kind: ConnectionKind,
    ) -> Result<SpawnedShell, ConnectError>;
}

/// Spawns real OS processes: piped stdio for direct-execution methods,
/// a pseudo-terminal for interactive ones.
#[derive(Debug, Default)]
pub struct NativeSpawner;

#[async_trait]
impl Spawner for NativeSpawner {
    async fn spawn(
        &self,
        program: &str,
        args: &[String],
        kind: ConnectionKind,
    ) -> Result<SpawnedShell, ConnectError> {
        match kind {
            ConnectionKind::Pipe => spawn_piped(program, args),
            ConnectionKind::Pty => spawn_pty(program, args),
        }
    }
}

fn spawn_piped(program: &str, args: &[String]) -> Result<SpawnedShell, ConnectError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ConnectError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| ConnectError::Io(io::Error::other("child stdin unavailable")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ConnectError::Io(io::Error::other("child stdout unavailable")))?;

    Ok(SpawnedShell {
        process: Box::new(PipedProcess { child }),
        stream: SessionStream::from_pipes(stdin, stdout),
    })
}

fn spawn_pty(program: &str, args: &[String]) -> Result<SpawnedShell, ConnectError> {
    let spawn_err = |e: anyhow::Error| ConnectError::Spawn {
        program: program.to_string(),
        source: io::Error::other(e.to_string()),
    };

    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(spawn_err)?;

    let mut cmd = CommandBuilder::new(program);
    cmd.args(args);
    let child = pair.slave.spawn_command(cmd).map_err(spawn_err)?;
    // The slave fd belongs to the child now.
    drop(pair.slave);

    let reader = pair.master.try_clone_reader().map_err(spawn_err)?;
    let writer = pair.master.take_writer().map_err(spawn_err)?;

    Ok(SpawnedShell {
        process: Box::new(PtyProcess {
            child,
            _master: pair.master,
        }),
        stream: SessionStream::bridge_pty(reader, writer),
    })
}

struct PipedProcess {
    child: tokio::process::Child,
}

#[async_trait]
impl ShellProcess for PipedProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    async fn terminate(&mut self) -> io::Result<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child.start_kill()?;
        self.child.wait().await?;
        Ok(())
    }
}

struct PtyProcess {
    child: Box<dyn portable_pty::Child + Send + Sync>,
    // Keeping the master open keeps the PTY alive for the session's
    // lifetime; dropping it hangs up on the child.
    _master: Box<dyn portable_pty::MasterPty + Send>,
}

#[async_trait]
impl ShellProcess for PtyProcess {
    fn id(&self) -> Option<u32> {
        self.child.process_id()
    }

    fn has_exited(&mut self) -> bool {
        !matches!(self.child.try_wait(), Ok(None))
    }

    async fn terminate(&mut self) -> io::Result<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child.kill()?;
        // portable-pty's wait blocks; poll instead of tying up a worker.
        for _ in 0..50 {
            if self.child.try_wait()?.is_some() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }
}

/// Launches sessions: substitution, spawn, ready-signal.
pub struct Launcher {
    spawner: Arc<dyn Spawner>,
    handshake_timeout: Duration,
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl Default for Launcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher {
    pub fn new() -> Self {
        Self::with_spawner(Arc::new(NativeSpawner))
    }

    pub fn with_spawner(spawner: Arc<dyn Spawner>) -> Self {
        Self {
            spawner,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    /// Establish a session to `address` using `descriptor`.
    ///
    /// `command` fills the `%c` placeholder for one-shot
    /// execute-command style methods. Either a fully ready session is
    /// returned or an error; a partially established process is
    /// terminated before the error propagates.
    pub async fn connect(
        &self,
        descriptor: &Arc<MethodDescriptor>,
        address: &EndpointAddress,
        command: Option<&str>,
    ) -> Result<Session, ConnectError> {
        let ctx = SubstitutionContext::from_address(address, command);
        let argv = descriptor.substitute(&ctx)?;

        debug!(
            scheme = %descriptor.name,
            program = %descriptor.login_program,
            ?argv,
            "spawning login process"
        );
        let spawned = self
            .spawner
            .spawn(&descriptor.login_program, &argv, descriptor.connection)
            .await?;

        let mut session = Session::new(
            descriptor.clone(),
            address.clone(),
            spawned.process,
            spawned.stream,
        );

        match await_ready(session.stream_mut(), descriptor, self.handshake_timeout).await {
            Ok(()) => {
                info!(scheme = %descriptor.name, host = %address.host, "session established");
                Ok(session)
            }
            Err(err) => {
                let _ = session.terminate().await;
                Err(err)
            }
        }
    }
}

/// Wait for the remote shell's ready-signal on `stream`.
///
/// Direct-async methods hand off immediately: no prompt negotiation, and
/// callers pipe input as raw stdin from then on. Everything else is
/// prompt-scraped: accumulate output until the prompt pattern matches the
/// stream's tail, bounded by `timeout`.
pub(crate) async fn await_ready(
    stream: &mut SessionStream,
    descriptor: &MethodDescriptor,
    timeout: Duration,
) -> Result<(), ConnectError> {
    if descriptor.direct_async {
        debug!(scheme = %descriptor.name, "direct-async method, skipping prompt negotiation");
        return Ok(());
    }

    let result = tokio::time::timeout(timeout, scan_for_prompt(stream, descriptor)).await;
    match result {
        Ok(inner) => inner,
        Err(_) => Err(ConnectError::HandshakeTimeout { timeout }),
    }
}

async fn scan_for_prompt(
    stream: &mut SessionStream,
    descriptor: &MethodDescriptor,
) -> Result<(), ConnectError> {
    let pattern = descriptor.prompt_pattern.as_ref().unwrap_or(&DEFAULT_PROMPT);
    let mut window: Vec<u8> = Vec::with_capacity(PROMPT_WINDOW);
    let mut buf = [0u8; 1024];

    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(ConnectError::Authentication);
        }
        window.extend_from_slice(&buf[..n]);
        if window.len() > PROMPT_WINDOW {
            let excess = window.len() - PROMPT_WINDOW;
            window.drain(..excess);
        }
        let tail = String::from_utf8_lossy(&window);
        if pattern.is_match(&tail) {
            debug!(scheme = %descriptor.name, "shell prompt detected");
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn prompt_method() -> MethodDescriptor {
        MethodDescriptor::new("m", "prog")
    }

    fn direct_method() -> MethodDescriptor {
        let mut d = MethodDescriptor::new("m", "prog");
        d.direct_async = true;
        d
    }

    #[tokio::test]
    async fn test_direct_async_skips_negotiation() {
        let (near, _far) = tokio::io::duplex(64);
        let mut stream = SessionStream::from_memory(near);
        // No bytes ever arrive; direct-async must not wait for any.
        await_ready(&mut stream, &direct_method(), Duration::from_millis(50))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_prompt_match_completes_handshake() {
        let (near, mut far) = tokio::io::duplex(256);
        let mut stream = SessionStream::from_memory(near);
        far.write_all(b"Last login: yesterday\nhost:~ user$ ")
            .await
            .unwrap();
        await_ready(&mut stream, &prompt_method(), Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_custom_prompt_pattern() {
        let mut method = prompt_method();
        method.prompt_pattern = Some(Regex::new(r"READY\.\s*\z").unwrap());
        let (near, mut far) = tokio::io::duplex(256);
        let mut stream = SessionStream::from_memory(near);
        far.write_all(b"booting...\nREADY.\n").await.unwrap();
        await_ready(&mut stream, &method, Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stream_closed_is_authentication_error() {
        let (near, far) = tokio::io::duplex(64);
        let mut stream = SessionStream::from_memory(near);
        drop(far);
        let err = await_ready(&mut stream, &prompt_method(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::Authentication));
    }

    #[tokio::test]
    async fn test_silent_stream_times_out() {
        let (near, _far) = tokio::io::duplex(64);
        let mut stream = SessionStream::from_memory(near);
        let err = await_ready(&mut stream, &prompt_method(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectError::HandshakeTimeout { .. }));
    }

    #[tokio::test]
    async fn test_prompt_window_scans_tail_only() {
        let (near, mut far) = tokio::io::duplex(8192);
        let mut stream = SessionStream::from_memory(near);
        // Noise larger than the window, then a prompt at the very end.
        let mut noise = vec![b'x'; PROMPT_WINDOW * 2];
        noise.extend_from_slice(b"\n$ ");
        far.write_all(&noise).await.unwrap();
        await_ready(&mut stream, &prompt_method(), Duration::from_secs(1))
            .await
            .unwrap();
    }
}
