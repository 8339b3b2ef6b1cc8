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

//! FileDescriptorSet loading
//!
//! Reads a compiled `FileDescriptorSet` (the `protoc
//! --descriptor_set_out` format) from disk. The file is consumed read-only;
//! `SourceCodeInfo` must have been included (`--include_source_info`) for
//! comment extraction to produce anything.

use std::fs;
use std::path::Path;

use prost::Message;
use prost_types::FileDescriptorSet;
use tracing::info;

use crate::error::DescriptorError;

/// Reads and decodes a `FileDescriptorSet` from `path`.
pub fn load_descriptor_set(path: &Path) -> Result<FileDescriptorSet, DescriptorError> {
    let data = fs::read(path).map_err(|source| DescriptorError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let set =
        FileDescriptorSet::decode(data.as_slice()).map_err(|e| DescriptorError::MalformedDescriptor {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

    info!(
        "loaded descriptor set {} ({} files)",
        path.display(),
        set.file.len()
    );
    Ok(set)
}
