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

//! Errors surfaced by the resource cache.

use crate::{CheckoutHandle, CheckoutId};
use std::sync::Arc;
use thiserror::Error;
use vitrine_core::{asset::IdentifierError, AssetId, DecodeError};

/// Why an `acquire` did not produce a handle.
///
/// Every waiter on the same load receives a clone of the same value; the
/// decoder's error is shared behind an [`Arc`] for that reason.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// The identifier was rejected before any work started. Not retried.
    #[error("Invalid asset identifier {raw:?}: {reason}")]
    InvalidIdentifier {
        /// The identifier as given by the caller.
        raw: String,
        /// What was wrong with it.
        reason: IdentifierError,
    },

    /// The loader failed. Nothing was cached; calling `acquire` again retries.
    #[error("Failed to load '{id}': {cause}")]
    DecodeFailed {
        /// The asset that failed to load.
        id: AssetId,
        /// The loader's error, verbatim.
        #[source]
        cause: Arc<DecodeError>,
    },

    /// The decode task ended without a result, e.g. it panicked or the
    /// runtime shut down while it was running.
    #[error("Load of '{id}' was abandoned before it produced a result")]
    LoadAbandoned {
        /// The asset whose load was abandoned.
        id: AssetId,
    },
}

impl LoadError {
    /// The loader's error, when this is a decode failure.
    pub fn decode_error(&self) -> Option<&DecodeError> {
        match self {
            LoadError::DecodeFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Why a `release` was refused.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The checkout had already been released. Nothing was disposed twice.
    #[error("Checkout {checkout} of '{id}' was already released")]
    DoubleRelease {
        /// The asset the checkout was for.
        id: AssetId,
        /// The checkout released twice.
        checkout: CheckoutId,
    },

    /// The handle was issued by another cache. It is handed back untouched.
    #[error("Handle {} for '{}' was not issued by this cache", .0.checkout_id(), .0.identifier())]
    DisposeOfUnknownHandle(Box<CheckoutHandle>),
}

/// Errors reading a [`CacheConfig`](crate::CacheConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// The file that was read.
        path: std::path::PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The RON text did not describe a valid configuration.
    #[error("Invalid cache config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The configuration could not be written as RON.
    #[error("Failed to serialize cache config: {0}")]
    Serialize(#[from] ron::Error),
}
