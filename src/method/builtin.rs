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

//! Built-in connection methods.
//!
//! These mirror the login wrappers this tool was built around: plain
//! `ssh`, local privilege elevation with `sudo`, FreeBSD jails through
//! `bastille console` or `jexec`, and AWS ECS containers through
//! `aws ecs execute-command`.

use crate::method::descriptor::{
    ConnectionKind, ListingSpec, LoginArg, MethodDescriptor,
};

/// All built-in method descriptors, in the order they are registered.
pub fn builtin_methods() -> Vec<MethodDescriptor> {
    vec![ssh(), sudo(), bastille(), jexec(), ecs()]
}

/// `ssh [-l user] [-p port] host`
fn ssh() -> MethodDescriptor {
    let mut d = MethodDescriptor::new("ssh", "ssh");
    d.login_args = vec![
        LoginArg::Group(vec![LoginArg::Literal("-l".to_string()), LoginArg::User]),
        LoginArg::Group(vec![LoginArg::Literal("-p".to_string()), LoginArg::Port]),
        LoginArg::Host,
    ];
    d
}

/// `sudo -u user -s -H` — host is the local machine; the user slot picks
/// the target account.
fn sudo() -> MethodDescriptor {
    let mut d = MethodDescriptor::new("sudo", "sudo");
    d.login_args = vec![
        LoginArg::Literal("-u".to_string()),
        LoginArg::User,
        LoginArg::Literal("-s".to_string()),
        LoginArg::Literal("-H".to_string()),
    ];
    d
}

/// `bastille console <jail>`, with `bastille list` for completion.
///
/// `bastille list` prints a header row (`JID State IP Hostname Path`);
/// the jail's hostname sits in the fourth column.
fn bastille() -> MethodDescriptor {
    let mut d = MethodDescriptor::new("bastille", "bastille");
    d.login_args = vec![LoginArg::Literal("console".to_string()), LoginArg::Host];
    d.listing = Some(ListingSpec {
        program: "bastille".to_string(),
        args: vec!["list".to_string()],
        id_column: 3,
        skip_header: true,
        header_tokens: vec!["Hostname".to_string(), "JID".to_string()],
    });
    d.completion_cache_allowed = true;
    d
}

/// `sudo jexec <jail> sh`, with `jls` for completion.
///
/// `jls` prints `JID  IP Address  Hostname  Path`; because `IP Address`
/// is two words, the header row splits into one more field than the data
/// rows, so the header-token filter does the real work here.
fn jexec() -> MethodDescriptor {
    let mut d = MethodDescriptor::new("jexec", "sudo");
    d.login_args = vec![
        LoginArg::Literal("jexec".to_string()),
        LoginArg::Host,
        LoginArg::Literal("sh".to_string()),
    ];
    d.listing = Some(ListingSpec {
        program: "jls".to_string(),
        args: vec![],
        id_column: 2,
        skip_header: true,
        header_tokens: vec!["Hostname".to_string(), "JID".to_string()],
    });
    d.completion_cache_allowed = true;
    d
}

/// `aws ecs execute-command --cluster <user> --task <host> --interactive
/// --command <command>`, with `aws ecs list-tasks` for completion.
///
/// The cluster name rides the user slot of the address. The session is
/// handed off as soon as the subprocess is up; the SSM plugin owns its
/// own negotiation, so there is no prompt to scrape.
fn ecs() -> MethodDescriptor {
    let mut d = MethodDescriptor::new("ecs", "aws");
    d.login_args = vec![
        LoginArg::Literal("ecs".to_string()),
        LoginArg::Literal("execute-command".to_string()),
        LoginArg::Literal("--cluster".to_string()),
        LoginArg::User,
        LoginArg::Literal("--task".to_string()),
        LoginArg::Host,
        LoginArg::Literal("--interactive".to_string()),
        LoginArg::Group(vec![
            LoginArg::Literal("--command".to_string()),
            LoginArg::Command,
        ]),
    ];
    d.connection = ConnectionKind::Pipe;
    d.direct_async = true;
    d.listing = Some(ListingSpec {
        program: "aws".to_string(),
        args: vec![
            "ecs".to_string(),
            "list-tasks".to_string(),
            "--output".to_string(),
            "text".to_string(),
        ],
        id_column: 1,
        skip_header: false,
        header_tokens: vec!["TASKARNS".to_string()],
    });
    d.completion_cache_allowed = true;
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::descriptor::SubstitutionContext;

    #[test]
    fn test_all_builtins_validate() {
        for descriptor in builtin_methods() {
            descriptor.validate().unwrap();
        }
    }

    #[test]
    fn test_ssh_argv_with_and_without_port() {
        let d = ssh();
        let ctx = SubstitutionContext {
            host: Some("example.com"),
            user: Some("admin"),
            port: Some(2222),
            ..Default::default()
        };
        assert_eq!(
            d.substitute(&ctx).unwrap(),
            vec!["-l", "admin", "-p", "2222", "example.com"]
        );

        let ctx = SubstitutionContext {
            host: Some("example.com"),
            user: Some("admin"),
            ..Default::default()
        };
        assert_eq!(
            d.substitute(&ctx).unwrap(),
            vec!["-l", "admin", "example.com"]
        );
    }

    #[test]
    fn test_jexec_argv() {
        let d = jexec();
        let ctx = SubstitutionContext {
            host: Some("web1"),
            ..Default::default()
        };
        assert_eq!(d.substitute(&ctx).unwrap(), vec!["jexec", "web1", "sh"]);
        assert_eq!(d.login_program, "sudo");
    }

    #[test]
    fn test_ecs_argv_with_command() {
        let d = ecs();
        let ctx = SubstitutionContext {
            host: Some("abc123"),
            user: Some("my-cluster"),
            command: Some("/bin/sh"),
            ..Default::default()
        };
        assert_eq!(
            d.substitute(&ctx).unwrap(),
            vec![
                "ecs",
                "execute-command",
                "--cluster",
                "my-cluster",
                "--task",
                "abc123",
                "--interactive",
                "--command",
                "/bin/sh",
            ]
        );
        assert!(d.direct_async);
        assert!(d.uses_command());
    }

    #[test]
    fn test_ecs_argv_without_command_omits_flag() {
        let d = ecs();
        let ctx = SubstitutionContext {
            host: Some("abc123"),
            user: Some("my-cluster"),
            ..Default::default()
        };
        let argv = d.substitute(&ctx).unwrap();
        assert!(!argv.contains(&"--command".to_string()));
    }

    #[test]
    fn test_completion_support() {
        assert!(!ssh().supports_completion());
        assert!(!sudo().supports_completion());
        assert!(bastille().supports_completion());
        assert!(jexec().supports_completion());
        assert!(ecs().supports_completion());
    }
}
