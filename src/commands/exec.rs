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

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

use crate::client::Client;

/// Run a one-shot command at `address` and stream its output to stdout.
///
/// Methods whose argv consumes a `%c` placeholder (ECS execute-command)
/// carry the command in the launch itself; for prompt-scraped shells the
/// command is typed into the established session followed by `exit` so
/// the stream closes when the command finishes.
pub async fn execute_command(client: &Client, address: &str, command: &str) -> Result<()> {
    let mut session = client
        .connect_with_command(address, Some(command))
        .await
        .with_context(|| format!("Failed to connect to '{address}'"))?;

    if !session.descriptor().uses_command() {
        session
            .send_line(&format!("{command}; exit"))
            .await
            .context("Failed to send command")?;
    }

    let mut stdout = tokio::io::stdout();
    let mut buf = [0u8; 8192];
    loop {
        let n = session.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n]).await?;
        stdout.flush().await?;
    }

    session.close().await?;
    Ok(())
}
