// Copyright 2025 eraflo
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

use super::{AssetId, IdentifierError};
use std::fmt;

/// An error produced while fetching or decoding an asset.
///
/// Loaders map their transport and parser failures onto these variants; the
/// cache never inspects them beyond logging and forwarding them to callers.
#[derive(Debug)]
pub enum DecodeError {
    /// The identifier is syntactically invalid for this loader.
    InvalidIdentifier(IdentifierError),
    /// No bytes exist behind the identifier.
    NotFound(AssetId),
    /// Fetching the bytes failed (I/O, network, ...).
    Transport {
        /// The asset that was being fetched.
        id: AssetId,
        /// The underlying cause.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The bytes were fetched but could not be interpreted as a 3D asset.
    Malformed {
        /// The asset that was being decoded.
        id: AssetId,
        /// A description of what was wrong.
        reason: String,
    },
    /// No decoder handles this kind of asset.
    Unsupported {
        /// The asset that was rejected.
        id: AssetId,
        /// The detected format, e.g. a file extension.
        format: String,
    },
}

impl DecodeError {
    /// Wraps a transport failure.
    pub fn transport<E>(id: &AssetId, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        DecodeError::Transport {
            id: id.clone(),
            source: source.into(),
        }
    }

    /// Builds a [`DecodeError::Malformed`] from anything printable.
    pub fn malformed(id: &AssetId, reason: impl fmt::Display) -> Self {
        DecodeError::Malformed {
            id: id.clone(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::InvalidIdentifier(e) => write!(f, "Invalid identifier: {e}"),
            DecodeError::NotFound(id) => write!(f, "Asset not found: '{id}'"),
            DecodeError::Transport { id, source } => {
                write!(f, "Failed to fetch '{id}': {source}")
            }
            DecodeError::Malformed { id, reason } => {
                write!(f, "Malformed asset '{id}': {reason}")
            }
            DecodeError::Unsupported { id, format } => {
                write!(f, "Unsupported asset format '{format}' for '{id}'")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::InvalidIdentifier(e) => Some(e),
            DecodeError::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<IdentifierError> for DecodeError {
    fn from(e: IdentifierError) -> Self {
        DecodeError::InvalidIdentifier(e)
    }
}
