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

//! Logging initialization for the CLI.

use tracing_subscriber::EnvFilter;

/// Create an environment filter based on verbosity level
pub fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        // Use RUST_LOG if set (allows debugging dependencies too)
        EnvFilter::from_default_env()
    } else {
        match verbosity {
            0 => EnvFilter::new("hopsh=warn"),
            1 => EnvFilter::new("hopsh=info"),
            2 => EnvFilter::new("hopsh=debug"),
            _ => EnvFilter::new("hopsh=trace"),
        }
    }
}

/// Initialize logging to stderr.
///
/// Session output owns stdout; keeping diagnostics on stderr means
/// `hopsh exec ... | sort` never sees a log line.
pub fn init_logging(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(create_env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
