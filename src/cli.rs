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

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hopsh",
    version,
    about = "Reach shells inside jails, containers, and remote hosts",
    long_about = "hopsh reaches shell processes inside remote or nested execution environments by\ndriving external login programs (ssh, sudo, bastille, jexec, aws ecs execute-command).\nConnection methods are declarative; routes chain any number of hops with '|', each hop\nre-executed inside the previous hop's shell.",
    after_help = "EXAMPLES:\n  List registered methods:      hopsh methods\n  List running jails:           hopsh list bastille\n  Run a command in a jail:      hopsh exec jexec:web1 uname -a\n  Attach through a bastion:     hopsh connect \"ssh:admin@bastion|bastille:agent-a\"\n  One-shot in an ECS task:      hopsh exec ecs:my-cluster@abc123 /bin/sh\n\nAddresses use scheme:[user@]host[#port][:path]; for ECS the cluster name rides the\nuser slot. Custom methods can be declared in the configuration file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        help = "Configuration file path [default: ~/.config/hopsh/config.yaml]"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        help = "Ready-signal wait window in seconds [default: 30]"
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered connection methods
    Methods,

    /// List reachable endpoints for a scheme
    List {
        /// Scheme to enumerate, e.g. bastille or ecs
        scheme: String,
    },

    /// Run a one-shot command at an address and stream its output
    Exec {
        /// Target address, hops joined with '|'
        address: String,

        /// Command to run, passed through verbatim
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },

    /// Attach the local terminal to an interactive session
    Connect {
        /// Target address, hops joined with '|'
        address: String,
    },
}
