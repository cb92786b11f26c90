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

//! The connection method registry.
//!
//! An explicit object rather than process-wide mutable state: built at
//! startup, mutated only through [`MethodRegistry::register`], then shared
//! read-only for the life of the process.

use std::sync::Arc;

use crate::error::MethodError;
use crate::method::builtin::builtin_methods;
use crate::method::descriptor::MethodDescriptor;

/// Registry mapping scheme names to immutable method descriptors.
///
/// Iteration follows insertion order. The method table is small, so
/// lookup is a linear scan.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: Vec<Arc<MethodDescriptor>>,
}

impl MethodRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in schemes
    /// (`ssh`, `sudo`, `bastille`, `jexec`, `ecs`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_methods() {
            // Builtins are statically unique and valid.
            registry
                .register(descriptor)
                .expect("built-in methods are unique");
        }
        registry
    }

    /// Register a descriptor. Fails if the name is taken or the
    /// descriptor is structurally invalid; never silently overwrites.
    pub fn register(&mut self, descriptor: MethodDescriptor) -> Result<(), MethodError> {
        descriptor.validate()?;
        if self.methods.iter().any(|m| m.name == descriptor.name) {
            return Err(MethodError::Duplicate {
                name: descriptor.name,
            });
        }
        self.methods.push(Arc::new(descriptor));
        Ok(())
    }

    /// Look up a descriptor by scheme name.
    pub fn lookup(&self, name: &str) -> Result<Arc<MethodDescriptor>, MethodError> {
        self.methods
            .iter()
            .find(|m| m.name == name)
            .cloned()
            .ok_or_else(|| MethodError::Unknown {
                name: name.to_string(),
            })
    }

    /// All registered descriptors, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.methods.iter()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}
