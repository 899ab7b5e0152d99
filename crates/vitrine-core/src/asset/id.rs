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

use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt, sync::Arc};

/// An opaque identifier (URL or path) that uniquely names a loadable asset.
///
/// Identifiers are compared by exact string equality. No normalization is
/// applied: `"models/a.glb"` and `"./models/a.glb"` name two different assets.
///
/// The string is reference-counted, so cloning an `AssetId` into cache
/// entries, handles and log lines is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(Arc<str>);

impl AssetId {
    /// Validates `raw` and wraps it as an identifier.
    ///
    /// An identifier is rejected when it is empty, consists only of
    /// whitespace, or contains control characters (newlines, NUL, ...).
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if raw.trim().is_empty() {
            return Err(IdentifierError::Blank);
        }
        if let Some(position) = raw.chars().position(char::is_control) {
            return Err(IdentifierError::ControlCharacter { position });
        }
        Ok(Self(Arc::from(raw)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the file extension of the identifier, if any, lowercased.
    ///
    /// Query strings and fragments (`?v=2`, `#node`) are ignored.
    pub fn extension(&self) -> Option<String> {
        let path = self.0.split(['?', '#']).next().unwrap_or_default();
        let file = path.rsplit('/').next()?;
        let (stem, ext) = file.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AssetId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0.to_string()
    }
}

impl std::str::FromStr for AssetId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The reasons an identifier string can be rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier was the empty string.
    Empty,
    /// The identifier only contained whitespace.
    Blank,
    /// The identifier contains a control character at the given char index.
    ControlCharacter {
        /// Index (in chars) of the first offending character.
        position: usize,
    },
    /// The identifier exceeds a configured maximum length.
    TooLong {
        /// Length of the rejected identifier, in bytes.
        len: usize,
        /// The configured maximum, in bytes.
        max: usize,
    },
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierError::Empty => write!(f, "asset identifier is empty"),
            IdentifierError::Blank => write!(f, "asset identifier is only whitespace"),
            IdentifierError::ControlCharacter { position } => {
                write!(f, "asset identifier contains a control character at {position}")
            }
            IdentifierError::TooLong { len, max } => {
                write!(f, "asset identifier is {len} bytes long (max {max})")
            }
        }
    }
}

impl std::error::Error for IdentifierError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_malformed_ids() {
        assert_eq!(AssetId::parse(""), Err(IdentifierError::Empty));
        assert_eq!(AssetId::parse("   "), Err(IdentifierError::Blank));
        assert_eq!(
            AssetId::parse("a\nb.glb"),
            Err(IdentifierError::ControlCharacter { position: 1 })
        );
    }

    #[test]
    fn test_equality_is_exact() {
        let a = AssetId::parse("models/a.glb").unwrap();
        let b = AssetId::parse("./models/a.glb").unwrap();
        let c = AssetId::parse("models/a.glb").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_extension() {
        let id = AssetId::parse("/models/gltf/Duck/Duck.GLTF?v=3").unwrap();
        assert_eq!(id.extension().as_deref(), Some("gltf"));
        assert_eq!(AssetId::parse("/models/scene").unwrap().extension(), None);
        assert_eq!(AssetId::parse(".hidden").unwrap().extension(), None);
    }
}
