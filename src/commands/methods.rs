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

use owo_colors::OwoColorize;

use crate::method::MethodRegistry;

pub fn list_methods(registry: &MethodRegistry) {
    if registry.is_empty() {
        println!("{}", "No connection methods registered".dimmed());
        return;
    }

    println!("\n{} {}\n", "▶".cyan(), "Registered connection methods".bold());
    for method in registry.iter() {
        let completion = if method.supports_completion() {
            "completion".green().to_string()
        } else {
            "no completion".dimmed().to_string()
        };
        println!(
            "  {} {} ({}, {})",
            "●".blue(),
            method.name.bold(),
            method.login_program.yellow(),
            completion,
        );
    }
    println!();
}
