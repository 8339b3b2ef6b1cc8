// SPDX-License-Identifier: AGPL-3.0-or-later
// ggRMCP - gRPC to MCP Gateway
// Copyright (C) 2026 ggRMCP contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Linked descriptor registry
//!
//! Files are processed depth-first along their dependency edges so that every
//! import is registered before its importer. A dependency missing from the
//! incoming set is pulled from the ambient pool of well-known types
//! ([`DescriptorPool::global`]); if it exists nowhere the file fails with
//! [`DescriptorError::UnresolvedImport`]. Registration is idempotent per
//! fully-qualified file path, and two *different* definitions under one path
//! are rejected as a conflict.

use std::collections::{HashMap, HashSet};

use prost::Message;
use prost_reflect::{DescriptorPool, FileDescriptor, MessageDescriptor, ServiceDescriptor};
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use tracing::debug;

use crate::error::DescriptorError;

/// A set of linked file descriptors closed under the import relation.
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    pool: DescriptorPool,
}

impl Default for DescriptorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self {
            pool: DescriptorPool::new(),
        }
    }

    /// Links an entire `FileDescriptorSet` into a fresh registry.
    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> Result<Self, DescriptorError> {
        let mut registry = Self::new();
        registry.add_files(set.file)?;
        Ok(registry)
    }

    /// Links a batch of file descriptors into the registry, resolving
    /// dependencies within the batch first and falling back to the ambient
    /// well-known-type pool for anything the batch does not carry.
    pub fn add_files(&mut self, files: Vec<FileDescriptorProto>) -> Result<(), DescriptorError> {
        // Index the incoming set by path, rejecting conflicting duplicates.
        let mut by_name: HashMap<String, FileDescriptorProto> = HashMap::new();
        for file in files {
            let name = file.name().to_string();
            if let Some(existing) = by_name.get(&name) {
                if existing.encode_to_vec() != file.encode_to_vec() {
                    return Err(DescriptorError::DuplicateConflict(name));
                }
                continue;
            }
            by_name.insert(name, file);
        }

        let names: Vec<String> = by_name.keys().cloned().collect();
        let mut visiting = HashSet::new();
        for name in names {
            self.link_file(&name, &by_name, &mut visiting)?;
        }
        Ok(())
    }

    /// Depth-first registration of one file and its dependency closure.
    fn link_file(
        &mut self,
        name: &str,
        incoming: &HashMap<String, FileDescriptorProto>,
        visiting: &mut HashSet<String>,
    ) -> Result<(), DescriptorError> {
        if self.pool.get_file_by_name(name).is_some() {
            return Ok(());
        }
        if !visiting.insert(name.to_string()) {
            return Err(DescriptorError::MalformedDescriptor {
                file: name.to_string(),
                reason: "import cycle".to_string(),
            });
        }

        let file = match incoming.get(name) {
            Some(file) => file.clone(),
            // Not part of the incoming set: the only remaining place a
            // dependency can live is the ambient well-known-type pool.
            None => return self.link_well_known(name),
        };

        for dep in &file.dependency {
            if self.pool.get_file_by_name(dep).is_some() {
                continue;
            }
            if incoming.contains_key(dep.as_str()) {
                self.link_file(dep, incoming, visiting)?;
            } else {
                self.link_well_known(dep)
                    .map_err(|_| DescriptorError::UnresolvedImport {
                        file: name.to_string(),
                        import: dep.clone(),
                    })?;
            }
        }

        debug!("registering file descriptor {}", name);
        self.pool
            .add_file_descriptor_proto(file)
            .map_err(|e| DescriptorError::MalformedDescriptor {
                file: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Pulls a file (and its closure) out of the ambient well-known-type
    /// pool into this registry.
    fn link_well_known(&mut self, name: &str) -> Result<(), DescriptorError> {
        if self.pool.get_file_by_name(name).is_some() {
            return Ok(());
        }

        let ambient = DescriptorPool::global();
        let file = ambient
            .get_file_by_name(name)
            .ok_or_else(|| DescriptorError::UnresolvedImport {
                file: name.to_string(),
                import: name.to_string(),
            })?;

        let proto = file.file_descriptor_proto().clone();
        for dep in &proto.dependency {
            self.link_well_known(dep)?;
        }

        debug!("registering well-known file {}", name);
        self.pool
            .add_file_descriptor_proto(proto)
            .map_err(|e| DescriptorError::MalformedDescriptor {
                file: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Resolves a message descriptor by fully-qualified name. A leading dot
    /// (the descriptor-proto convention for absolute names) is accepted.
    pub fn message_by_name(&self, full_name: &str) -> Option<MessageDescriptor> {
        let name = full_name.trim_start_matches('.');
        self.pool
            .get_message_by_name(name)
            .or_else(|| DescriptorPool::global().get_message_by_name(name))
    }

    /// All linked files, in registration order.
    pub fn files(&self) -> impl Iterator<Item = FileDescriptor> + '_ {
        self.pool.files()
    }

    /// All services across all linked files.
    pub fn services(&self) -> impl Iterator<Item = ServiceDescriptor> + '_ {
        self.pool.services()
    }

    pub fn file_count(&self) -> usize {
        self.pool.files().count()
    }
}
