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

//! Test doubles for the spawn layer: a spawner that counts invocations
//! and scripts the spawned shell's output, and a process handle whose
//! termination the tests can observe.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use hopsh::method::ConnectionKind;
use hopsh::session::{SessionStream, ShellProcess, SpawnedShell, Spawner};

/// A spawner double that never starts an OS process. Each spawn hands
/// back an in-memory stream that plays `banner`, then answers every
/// received chunk with `reply` (when set) like a shell printing its next
/// prompt, or stays silent.
pub struct ScriptedSpawner {
    pub spawn_count: Arc<AtomicUsize>,
    pub terminated: Arc<AtomicBool>,
    pub banner: Vec<u8>,
    pub reply: Option<Vec<u8>>,
}

impl ScriptedSpawner {
    pub fn new(banner: &[u8]) -> Self {
        Self {
            spawn_count: Arc::new(AtomicUsize::new(0)),
            terminated: Arc::new(AtomicBool::new(false)),
            banner: banner.to_vec(),
            reply: None,
        }
    }

    /// Answer each received chunk with `reply`.
    pub fn with_reply(mut self, reply: &[u8]) -> Self {
        self.reply = Some(reply.to_vec());
        self
    }

    pub fn spawns(&self) -> usize {
        self.spawn_count.load(Ordering::SeqCst)
    }

    pub fn process_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Spawner for ScriptedSpawner {
    async fn spawn(
        &self,
        _program: &str,
        _args: &[String],
        _kind: ConnectionKind,
    ) -> Result<SpawnedShell, hopsh::error::ConnectError> {
        self.spawn_count.fetch_add(1, Ordering::SeqCst);

        let (near, mut far) = tokio::io::duplex(4096);
        let banner = self.banner.clone();
        let reply = self.reply.clone();
        tokio::spawn(async move {
            if far.write_all(&banner).await.is_err() {
                return;
            }
            // Drain input, answering each chunk when a reply is
            // scripted; without one, later hops see a silent stream.
            let mut buf = [0u8; 1024];
            loop {
                match far.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if let Some(reply) = &reply {
                            if far.write_all(reply).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(SpawnedShell {
            process: Box::new(ObservableProcess {
                terminated: self.terminated.clone(),
            }),
            stream: SessionStream::from_memory(near),
        })
    }
}

/// A process handle that records termination for the test to assert on.
pub struct ObservableProcess {
    pub terminated: Arc<AtomicBool>,
}

#[async_trait]
impl ShellProcess for ObservableProcess {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    fn has_exited(&mut self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    async fn terminate(&mut self) -> io::Result<()> {
        self.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }
}
