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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::error::MethodError;
use crate::method::descriptor::{
    ArgTemplate, ConnectionKind, ListingSpec, LoginArg, MethodDescriptor,
};

/// Main configuration structure.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// Additional connection methods, registered after the builtins.
    #[serde(default)]
    pub methods: Vec<MethodConfig>,
}

/// Global default settings.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Defaults {
    /// Ready-signal wait window in seconds.
    pub handshake_timeout: Option<u64>,
    /// Endpoint completion cache TTL in seconds.
    pub cache_ttl: Option<u64>,
}

/// One user-defined connection method.
///
/// Argument templates use `%h`, `%u`, `%p`, `%c` placeholders; a nested
/// sequence forms an optional group dropped when a placeholder inside it
/// has no value:
///
/// ```yaml
/// methods:
///   - name: dock
///     login_program: docker
///     login_args: ["exec", "-it", "%h", "sh"]
///     listing:
///       program: docker
///       args: ["ps", "--format", "{{.Names}}"]
/// ```
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MethodConfig {
    pub name: String,
    pub login_program: String,

    #[serde(default)]
    pub login_args: Vec<ArgTemplate>,

    #[serde(default)]
    pub remote_shell: Option<String>,

    #[serde(default)]
    pub remote_shell_args: Vec<String>,

    /// `pty` (default) or `pipe`.
    #[serde(default)]
    pub connection: Option<ConnectionKind>,

    #[serde(default)]
    pub direct_async: bool,

    /// Custom ready-signal pattern (a regular expression).
    #[serde(default)]
    pub prompt_pattern: Option<String>,

    #[serde(default)]
    pub listing: Option<ListingSpec>,

    #[serde(default)]
    pub cache_completions: bool,
}

impl MethodConfig {
    /// Compile this config entry into an immutable descriptor.
    pub fn to_descriptor(&self) -> Result<MethodDescriptor, MethodError> {
        let mut descriptor = MethodDescriptor::new(&self.name, &self.login_program);
        descriptor.login_args = self.login_args.iter().map(LoginArg::from).collect();
        if let Some(shell) = &self.remote_shell {
            descriptor.remote_shell = shell.clone();
            descriptor.remote_shell_args = self.remote_shell_args.clone();
        }
        if let Some(connection) = self.connection {
            descriptor.connection = connection;
        }
        descriptor.direct_async = self.direct_async;
        descriptor.prompt_pattern = match &self.prompt_pattern {
            Some(pattern) => {
                Some(
                    regex::Regex::new(pattern).map_err(|e| MethodError::Invalid {
                        name: self.name.clone(),
                        reason: format!("bad prompt pattern: {e}"),
                    })?,
                )
            }
            None => None,
        };
        descriptor.listing = self.listing.clone();
        descriptor.completion_cache_allowed = self.cache_completions;
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_config_to_descriptor() {
        let yaml = r#"
name: dock
login_program: docker
login_args: ["exec", "-it", "%h", "sh"]
listing:
  program: docker
  args: ["ps"]
  id_column: 0
  skip_header: true
cache_completions: true
"#;
        let config: MethodConfig = serde_yaml::from_str(yaml).unwrap();
        let descriptor = config.to_descriptor().unwrap();
        assert_eq!(descriptor.name, "dock");
        assert_eq!(descriptor.login_args.len(), 4);
        assert_eq!(descriptor.login_args[2], LoginArg::Host);
        assert!(descriptor.supports_completion());
        assert!(descriptor.completion_cache_allowed);
    }

    #[test]
    fn test_optional_group_in_yaml() {
        let yaml = r#"
name: custom
login_program: custom-login
login_args: [["-p", "%p"], "%h"]
"#;
        let config: MethodConfig = serde_yaml::from_str(yaml).unwrap();
        let descriptor = config.to_descriptor().unwrap();
        assert_eq!(
            descriptor.login_args[0],
            LoginArg::Group(vec![LoginArg::Literal("-p".to_string()), LoginArg::Port])
        );
    }

    #[test]
    fn test_bad_prompt_pattern_rejected() {
        let config = MethodConfig {
            name: "m".to_string(),
            login_program: "p".to_string(),
            login_args: vec![],
            remote_shell: None,
            remote_shell_args: vec![],
            connection: None,
            direct_async: false,
            prompt_pattern: Some("[unclosed".to_string()),
            listing: None,
            cache_completions: false,
        };
        assert!(matches!(
            config.to_descriptor(),
            Err(MethodError::Invalid { .. })
        ));
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
defaults:
  handshake_timeout: 15
  cache_ttl: 30
methods:
  - name: dock
    login_program: docker
    login_args: ["exec", "-it", "%h", "sh"]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.defaults.handshake_timeout, Some(15));
        assert_eq!(config.defaults.cache_ttl, Some(30));
        assert_eq!(config.methods.len(), 1);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert!(config.methods.is_empty());
        assert_eq!(config.defaults.handshake_timeout, None);
    }
}
