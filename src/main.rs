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

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use hopsh::{
    cli::{Cli, Commands},
    commands::{attach_session, execute_command, list_endpoints, list_methods},
    config::Config,
    method::MethodRegistry,
    resolve::EndpointResolver,
    session::Launcher,
    utils::init_logging,
    Client,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    let mut registry = MethodRegistry::with_builtins();
    for method in &config.methods {
        let descriptor = method
            .to_descriptor()
            .with_context(|| format!("Invalid method '{}' in configuration", method.name))?;
        registry
            .register(descriptor)
            .with_context(|| format!("Failed to register method '{}'", method.name))?;
    }

    let mut launcher = Launcher::new();
    if let Some(secs) = cli.timeout.or(config.defaults.handshake_timeout) {
        launcher = launcher.with_handshake_timeout(Duration::from_secs(secs));
    }
    let mut client = Client::new(registry).with_launcher(launcher);
    if let Some(secs) = config.defaults.cache_ttl {
        client = client.with_resolver(EndpointResolver::new(Duration::from_secs(secs)));
    }

    match cli.command {
        Commands::Methods => {
            list_methods(client.registry());
            Ok(())
        }
        Commands::List { scheme } => list_endpoints(&client, &scheme).await,
        Commands::Exec { address, command } => {
            execute_command(&client, &address, &command.join(" ")).await
        }
        Commands::Connect { address } => attach_session(&client, &address).await,
    }
}
