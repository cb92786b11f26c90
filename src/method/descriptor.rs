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

//! Declarative connection method descriptors.
//!
//! A [`MethodDescriptor`] captures everything needed to reach a shell for
//! one scheme: which login program to spawn, how to fill its argv from an
//! address, how to recognize the remote shell's readiness, and how to
//! enumerate reachable endpoints for completion. Descriptors are immutable
//! once registered and shared behind `Arc`.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::address::EndpointAddress;
use crate::error::MethodError;

/// Placeholder tokens recognized in login argument templates.
///
/// In template strings these are written `%h`, `%u`, `%p`, and `%c`, the
/// convention jail and container login wrappers already use in their docs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginArg {
    /// A literal argument, passed through untouched.
    Literal(String),
    /// Replaced by the target host / jail name / task id.
    Host,
    /// Replaced by the login user (or ECS cluster name).
    User,
    /// Replaced by the decimal port.
    Port,
    /// Replaced by a caller-supplied one-shot command string.
    Command,
    /// A group emitted atomically, and dropped whole when any placeholder
    /// inside it has no value. Models optional flag pairs like
    /// `["-p", "%p"]`.
    Group(Vec<LoginArg>),
}

impl LoginArg {
    /// Parse a single template token: `%h`, `%u`, `%p`, `%c`, or a literal.
    pub fn parse_template(token: &str) -> Self {
        match token {
            "%h" => LoginArg::Host,
            "%u" => LoginArg::User,
            "%p" => LoginArg::Port,
            "%c" => LoginArg::Command,
            other => LoginArg::Literal(other.to_string()),
        }
    }
}

/// One argument template in a config file: a single token or an optional
/// group of tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgTemplate {
    One(String),
    Group(Vec<String>),
}

impl From<&ArgTemplate> for LoginArg {
    fn from(template: &ArgTemplate) -> Self {
        match template {
            ArgTemplate::One(token) => LoginArg::parse_template(token),
            ArgTemplate::Group(tokens) => LoginArg::Group(
                tokens
                    .iter()
                    .map(|t| LoginArg::parse_template(t))
                    .collect(),
            ),
        }
    }
}

/// How the login program's stdio is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Allocate a pseudo-terminal; for shell-like interactive methods.
    Pty,
    /// Plain bidirectional pipes; for direct-execution methods.
    Pipe,
}

/// The fixed enumeration command for a scheme, and how to pick the
/// endpoint identifier out of its line-oriented output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSpec {
    /// Program to run, e.g. `jls` or `aws`.
    pub program: String,
    /// Fixed argument vector; no placeholders here.
    #[serde(default)]
    pub args: Vec<String>,
    /// Zero-based whitespace-delimited column holding the identifier.
    #[serde(default)]
    pub id_column: usize,
    /// Whether the first non-blank line is a header to skip.
    #[serde(default)]
    pub skip_header: bool,
    /// Identifiers equal to any of these are dropped even after header
    /// skipping; columns whose headers contain spaces shift the header
    /// row's fields, so skipping alone cannot be trusted.
    #[serde(default)]
    pub header_tokens: Vec<String>,
}

/// Values available to placeholder substitution for one launch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstitutionContext<'a> {
    pub host: Option<&'a str>,
    pub user: Option<&'a str>,
    pub port: Option<u16>,
    pub command: Option<&'a str>,
}

impl<'a> SubstitutionContext<'a> {
    /// Build a context from an address plus an optional one-shot command.
    pub fn from_address(address: &'a EndpointAddress, command: Option<&'a str>) -> Self {
        Self {
            host: Some(&address.host),
            user: address.user.as_deref(),
            port: address.port,
            command,
        }
    }
}

/// Immutable declarative record describing how to reach endpoints of one
/// scheme.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    /// Unique scheme name, e.g. `bastille`.
    pub name: String,
    /// Login/attach program spawned for hop 1 of a route.
    pub login_program: String,
    /// Argument templates for the login program.
    pub login_args: Vec<LoginArg>,
    /// Shell invoked on the remote side once attached.
    pub remote_shell: String,
    pub remote_shell_args: Vec<String>,
    /// PTY or pipe attachment.
    pub connection: ConnectionKind,
    /// When set, skip prompt negotiation entirely: the session is handed
    /// off as soon as the subprocess is up, and callers pipe raw stdin
    /// without prompt-scraping.
    pub direct_async: bool,
    /// Prompt pattern announcing shell readiness; a built-in default is
    /// used when absent. Ignored for `direct_async` methods.
    pub prompt_pattern: Option<Regex>,
    /// Endpoint enumeration command, when the scheme supports completion.
    pub listing: Option<ListingSpec>,
    /// Whether resolved endpoint lists may be served from the TTL cache.
    pub completion_cache_allowed: bool,
}

impl MethodDescriptor {
    /// A minimal descriptor: PTY attachment, prompt-scraping, `/bin/sh`
    /// remote shell, no completion.
    pub fn new(name: impl Into<String>, login_program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            login_program: login_program.into(),
            login_args: Vec::new(),
            remote_shell: "/bin/sh".to_string(),
            remote_shell_args: vec!["-i".to_string()],
            connection: ConnectionKind::Pty,
            direct_async: false,
            prompt_pattern: None,
            listing: None,
            completion_cache_allowed: false,
        }
    }

    /// Check structural invariants. Called by the registry on `register`.
    pub fn validate(&self) -> Result<(), MethodError> {
        if self.name.is_empty() {
            return Err(MethodError::Invalid {
                name: self.name.clone(),
                reason: "name cannot be empty".to_string(),
            });
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(MethodError::Invalid {
                name: self.name.clone(),
                reason: "name must be lowercase alphanumeric with '-' or '_'".to_string(),
            });
        }
        if self.login_program.is_empty() {
            return Err(MethodError::Invalid {
                name: self.name.clone(),
                reason: "login program cannot be empty".to_string(),
            });
        }
        if self.remote_shell.is_empty() {
            return Err(MethodError::Invalid {
                name: self.name.clone(),
                reason: "remote shell cannot be empty".to_string(),
            });
        }
        if let Some(listing) = &self.listing {
            if listing.program.is_empty() {
                return Err(MethodError::Invalid {
                    name: self.name.clone(),
                    reason: "listing program cannot be empty".to_string(),
                });
            }
        }
        for arg in &self.login_args {
            if let LoginArg::Group(inner) = arg {
                if inner.iter().any(|a| matches!(a, LoginArg::Group(_))) {
                    return Err(MethodError::Invalid {
                        name: self.name.clone(),
                        reason: "argument groups cannot be nested".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether this scheme can enumerate endpoints for completion.
    pub fn supports_completion(&self) -> bool {
        self.listing.is_some()
    }

    /// Whether the login argv consumes a caller-supplied command string.
    pub fn uses_command(&self) -> bool {
        fn walk(args: &[LoginArg]) -> bool {
            args.iter().any(|a| match a {
                LoginArg::Command => true,
                LoginArg::Group(inner) => walk(inner),
                _ => false,
            })
        }
        walk(&self.login_args)
    }

    /// Substitute placeholders, producing the argv for a fresh OS-level
    /// spawn. Every argument stays a discrete token; nothing is joined
    /// into a shell string.
    ///
    /// Missing host is an error. A missing user falls back to the current
    /// user. A missing port or command drops its token, and a [`Group`]
    /// containing any absent placeholder is dropped whole.
    ///
    /// [`Group`]: LoginArg::Group
    pub fn substitute(&self, ctx: &SubstitutionContext) -> Result<Vec<String>, MethodError> {
        let mut argv = Vec::with_capacity(self.login_args.len());
        for arg in &self.login_args {
            match arg {
                LoginArg::Group(inner) => {
                    if let Some(mut tokens) = self.substitute_group(inner, ctx)? {
                        argv.append(&mut tokens);
                    }
                }
                single => {
                    if let Some(token) = self.substitute_one(single, ctx)? {
                        argv.push(token);
                    }
                }
            }
        }
        Ok(argv)
    }

    /// Render the same template as a single shell-quoted command line, for
    /// re-execution inside an already-established hop's shell.
    pub fn login_command_line(&self, ctx: &SubstitutionContext) -> Result<String, MethodError> {
        let mut line = shell_quote(&self.login_program);
        for token in self.substitute(ctx)? {
            line.push(' ');
            line.push_str(&shell_quote(&token));
        }
        Ok(line)
    }

    /// The configured remote shell as a quoted command line, for
    /// normalizing an interactive session after login.
    pub fn remote_shell_command_line(&self) -> String {
        let mut line = shell_quote(&self.remote_shell);
        for arg in &self.remote_shell_args {
            line.push(' ');
            line.push_str(&shell_quote(arg));
        }
        line
    }

    fn substitute_one(
        &self,
        arg: &LoginArg,
        ctx: &SubstitutionContext,
    ) -> Result<Option<String>, MethodError> {
        match arg {
            LoginArg::Literal(s) => Ok(Some(s.clone())),
            LoginArg::Host => match ctx.host {
                Some(host) => Ok(Some(host.to_string())),
                None => Err(MethodError::MissingPlaceholder {
                    method: self.name.clone(),
                    placeholder: "host",
                }),
            },
            LoginArg::User => Ok(Some(
                ctx.user
                    .map(|u| u.to_string())
                    .unwrap_or_else(whoami::username),
            )),
            LoginArg::Port => Ok(ctx.port.map(|p| p.to_string())),
            LoginArg::Command => Ok(ctx.command.map(|c| c.to_string())),
            // Groups do not nest; validate() rejects them.
            LoginArg::Group(_) => Err(MethodError::Invalid {
                name: self.name.clone(),
                reason: "argument groups cannot be nested".to_string(),
            }),
        }
    }

    /// Substitute a group; `None` means the whole group is omitted.
    fn substitute_group(
        &self,
        inner: &[LoginArg],
        ctx: &SubstitutionContext,
    ) -> Result<Option<Vec<String>>, MethodError> {
        let mut tokens = Vec::with_capacity(inner.len());
        for arg in inner {
            let present = match arg {
                LoginArg::Port => ctx.port.is_some(),
                LoginArg::Command => ctx.command.is_some(),
                _ => true,
            };
            if !present {
                return Ok(None);
            }
            match self.substitute_one(arg, ctx)? {
                Some(token) => tokens.push(token),
                None => return Ok(None),
            }
        }
        Ok(Some(tokens))
    }
}

/// Quote a token for POSIX shell re-execution inside a hop.
pub fn shell_quote(token: &str) -> String {
    if !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':' | '@' | '=' | '%' | '+'))
    {
        return token.to_string();
    }
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('\'');
    for c in token.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    quoted
}
