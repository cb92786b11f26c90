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
use owo_colors::OwoColorize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::client::Client;

/// Attach the local terminal to an interactive session at `address`.
///
/// Bridges local stdin to the remote shell and remote output to local
/// stdout until either side closes.
pub async fn attach_session(client: &Client, address: &str) -> Result<()> {
    let mut session = client
        .connect(address)
        .await
        .with_context(|| format!("Failed to connect to '{address}'"))?;
    session
        .normalize_shell()
        .await
        .context("Failed to start remote shell")?;

    eprintln!(
        "{} {}",
        "●".green(),
        format!("connected to {}", session.address()).bold()
    );

    let mut stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut input = [0u8; 1024];
    let mut output = [0u8; 8192];

    loop {
        tokio::select! {
            read = session.read(&mut output) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                stdout.write_all(&output[..n]).await?;
                stdout.flush().await?;
            }
            read = stdin.read(&mut input) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                session.write(&input[..n]).await?;
            }
        }
    }

    session.close().await?;
    eprintln!("{} {}", "●".blue(), "session closed".dimmed());
    Ok(())
}
