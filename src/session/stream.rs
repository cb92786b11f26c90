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

//! The duplex byte stream attached to a session's login process.
//!
//! Three attachment shapes share one interface: plain child pipes,
//! a pseudo-terminal bridged through a pair of pump threads (the PTY
//! master is a blocking fd), and an in-memory stream for exercising the
//! handshake and chain logic without real subprocesses.

use std::io::{Read, Write};

use tokio::io::{self, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::mpsc;

/// A session's duplex byte stream.
///
/// Reads and writes may block per-session waiting on the underlying
/// process; callers needing responsiveness run each session on its own
/// task.
pub enum SessionStream {
    /// Bidirectional pipes to a child process.
    Pipe {
        stdin: ChildStdin,
        stdout: ChildStdout,
    },
    /// A pseudo-terminal, pumped by two dedicated threads.
    Pty {
        input: mpsc::Sender<Vec<u8>>,
        output: mpsc::Receiver<Vec<u8>>,
        pending: Vec<u8>,
    },
    /// An in-memory duplex stream.
    Memory(DuplexStream),
}

impl std::fmt::Debug for SessionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            SessionStream::Pipe { .. } => "Pipe",
            SessionStream::Pty { .. } => "Pty",
            SessionStream::Memory(_) => "Memory",
        };
        f.debug_tuple("SessionStream").field(&kind).finish()
    }
}

impl SessionStream {
    /// Attach to a child's piped stdio.
    pub fn from_pipes(stdin: ChildStdin, stdout: ChildStdout) -> Self {
        SessionStream::Pipe { stdin, stdout }
    }

    /// Wrap an in-memory duplex stream (the far end stays with the
    /// caller).
    pub fn from_memory(stream: DuplexStream) -> Self {
        SessionStream::Memory(stream)
    }

    /// Bridge a PTY master's blocking reader/writer pair into async
    /// channels via two pump threads. The threads exit when the PTY
    /// closes or the stream is dropped.
    pub fn bridge_pty(
        mut reader: Box<dyn Read + Send>,
        mut writer: Box<dyn Write + Send>,
    ) -> Self {
        let (output_tx, output_rx) = mpsc::channel::<Vec<u8>>(32);
        let (input_tx, mut input_rx) = mpsc::channel::<Vec<u8>>(32);

        std::thread::spawn(move || {
            let mut buffer = [0u8; 4096];
            loop {
                match reader.read(&mut buffer) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if output_tx.blocking_send(buffer[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        std::thread::spawn(move || {
            while let Some(data) = input_rx.blocking_recv() {
                if writer.write_all(&data).is_err() || writer.flush().is_err() {
                    break;
                }
            }
        });

        SessionStream::Pty {
            input: input_tx,
            output: output_rx,
            pending: Vec::new(),
        }
    }

    /// Read up to `buf.len()` bytes. `Ok(0)` means the stream closed.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SessionStream::Pipe { stdout, .. } => stdout.read(buf).await,
            SessionStream::Pty {
                output, pending, ..
            } => {
                if pending.is_empty() {
                    match output.recv().await {
                        Some(chunk) => *pending = chunk,
                        None => return Ok(0),
                    }
                }
                let n = pending.len().min(buf.len());
                buf[..n].copy_from_slice(&pending[..n]);
                pending.drain(..n);
                Ok(n)
            }
            SessionStream::Memory(stream) => stream.read(buf).await,
        }
    }

    /// Write all of `data` to the remote side.
    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            SessionStream::Pipe { stdin, .. } => {
                stdin.write_all(data).await?;
                stdin.flush().await
            }
            SessionStream::Pty { input, .. } => input
                .send(data.to_vec())
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "pty writer closed")),
            SessionStream::Memory(stream) => {
                stream.write_all(data).await?;
                stream.flush().await
            }
        }
    }
}
