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

/// The pixel layout of a [`Texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA, color data in sRGB space.
    #[default]
    Rgba8UnormSrgb,
    /// 8-bit RGBA, linear data (normal maps, occlusion).
    Rgba8Unorm,
}

impl TextureFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8UnormSrgb | TextureFormat::Rgba8Unorm => 4,
        }
    }
}

/// Decoded image data ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Debug name, usually the image URI.
    pub name: Option<String>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: TextureFormat,
    /// Tightly packed pixel rows.
    pub pixels: Vec<u8>,
}

impl Texture {
    /// Creates a texture from raw RGBA8 pixels.
    pub fn rgba8(width: u32, height: u32, format: TextureFormat, pixels: Vec<u8>) -> Self {
        Self {
            name: None,
            width,
            height,
            format,
            pixels,
        }
    }

    /// A 1x1 texture of the given RGBA value.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self::rgba8(1, 1, TextureFormat::Rgba8UnormSrgb, rgba.to_vec())
    }

    /// Sets the debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Size in bytes of the GPU image.
    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}
