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

//! Established sessions and their launching machinery.

pub mod launcher;
pub mod stream;

use std::io;
use std::sync::Arc;

use crate::address::EndpointAddress;
use crate::method::descriptor::MethodDescriptor;

pub use launcher::{
    Launcher, NativeSpawner, ShellProcess, SpawnedShell, Spawner, DEFAULT_HANDSHAKE_TIMEOUT,
};
pub use stream::SessionStream;

/// An established session to one endpoint.
///
/// Owned exclusively by its caller: created on connect, destroyed when
/// [`close`](Session::close) is called or the underlying process exits.
/// The descriptor is shared read-only with the registry.
pub struct Session {
    descriptor: Arc<MethodDescriptor>,
    address: EndpointAddress,
    process: Box<dyn ShellProcess>,
    stream: SessionStream,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("scheme", &self.descriptor.name)
            .field("address", &self.address)
            .field("pid", &self.process.id())
            .field("stream", &self.stream)
            .finish()
    }
}

impl Session {
    pub(crate) fn new(
        descriptor: Arc<MethodDescriptor>,
        address: EndpointAddress,
        process: Box<dyn ShellProcess>,
        stream: SessionStream,
    ) -> Self {
        Self {
            descriptor,
            address,
            process,
            stream,
        }
    }

    /// The method this session (or its final hop) was established with.
    pub fn descriptor(&self) -> &Arc<MethodDescriptor> {
        &self.descriptor
    }

    /// The address of this session's (final) endpoint.
    pub fn address(&self) -> &EndpointAddress {
        &self.address
    }

    /// OS process id of the login process, when still known.
    pub fn process_id(&self) -> Option<u32> {
        self.process.id()
    }

    /// Whether the login process has exited.
    pub fn has_exited(&mut self) -> bool {
        self.process.has_exited()
    }

    /// Read from the remote shell. `Ok(0)` means the stream closed.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    /// Write raw bytes to the remote shell.
    pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await
    }

    /// Write a line of input, newline-terminated.
    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stream.write_all(line.as_bytes()).await?;
        self.stream.write_all(b"\n").await
    }

    /// Replace the login shell with the method's configured remote
    /// shell. A no-op for direct-async methods, which have no shell to
    /// normalize.
    pub async fn normalize_shell(&mut self) -> io::Result<()> {
        if self.descriptor.direct_async {
            return Ok(());
        }
        let line = format!("exec {}", self.descriptor.remote_shell_command_line());
        self.send_line(&line).await
    }

    /// Close the session, terminating the login process. Any hops layered
    /// inside its stream die with it.
    pub async fn close(mut self) -> io::Result<()> {
        self.process.terminate().await
    }

    pub(crate) fn stream_mut(&mut self) -> &mut SessionStream {
        &mut self.stream
    }

    pub(crate) async fn terminate(&mut self) -> io::Result<()> {
        self.process.terminate().await
    }

    /// Reposition the session onto a further hop's descriptor and
    /// address after the composer has advanced the chain.
    pub(crate) fn set_route(&mut self, descriptor: Arc<MethodDescriptor>, address: EndpointAddress) {
        self.descriptor = descriptor;
        self.address = address;
    }
}
