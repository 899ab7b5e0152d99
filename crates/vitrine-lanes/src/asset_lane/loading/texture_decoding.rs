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

//! Image decoding and `data:` URI handling.

use anyhow::{bail, Context, Result};
use base64::Engine;
use vitrine_core::scene::{Texture, TextureFormat};

/// Decodes an encoded image (PNG, JPEG, ...) into an RGBA8 texture.
pub fn decode_texture(bytes: &[u8], format: TextureFormat) -> Result<Texture> {
    let img = image::load_from_memory(bytes).context("Failed to decode image from memory")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(Texture::rgba8(width, height, format, rgba.into_raw()))
}

/// Decodes a base64 `data:` URI, returning its MIME type and payload.
///
/// Returns `Ok(None)` for anything that is not a `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Option<(String, Vec<u8>)>> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Ok(None);
    };
    let Some((header, payload)) = rest.split_once(',') else {
        bail!("Malformed data URI: missing ','");
    };
    let Some(mime) = header.strip_suffix(";base64") else {
        bail!("Unsupported data URI encoding: '{header}'");
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("Invalid base64 payload in data URI")?;
    Ok(Some((mime.to_owned(), bytes)))
}
