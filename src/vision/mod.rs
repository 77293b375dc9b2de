// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image format handling shared by the transform pipeline

pub mod image_utils;

pub use image_utils::{
    decode_image_bytes, decode_image_path, detect_format, encode_png, format_to_extension,
    mime_essence, mime_to_extension, resize_square, ImageError, ImageInfo, PNG_MIME,
};
