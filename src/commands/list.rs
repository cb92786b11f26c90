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

use anyhow::Result;
use owo_colors::OwoColorize;
use tracing::warn;

use crate::client::Client;
use crate::error::Error;

/// Print the reachable endpoints for a scheme.
///
/// Resolution failures degrade to an empty listing; only an unknown
/// scheme is a hard error.
pub async fn list_endpoints(client: &Client, scheme: &str) -> Result<()> {
    let endpoints = match client.resolve_endpoints(scheme).await {
        Ok(endpoints) => endpoints,
        Err(Error::Resolve(err)) => {
            warn!(%scheme, error = %err, "endpoint resolution failed");
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };

    if endpoints.is_empty() {
        println!("{}", format!("No reachable endpoints for '{scheme}'").dimmed());
        return Ok(());
    }

    println!(
        "\n{} {} ({})\n",
        "▶".cyan(),
        format!("Endpoints for '{scheme}'").bold(),
        endpoints.len().to_string().yellow()
    );
    for endpoint in &endpoints {
        println!("  {} {}", "•".dimmed(), endpoint);
    }
    println!();
    Ok(())
}
