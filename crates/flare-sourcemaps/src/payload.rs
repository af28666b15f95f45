// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Upload request body construction.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::Serialize;

/// Compresses sourcemap text with raw deflate and base64-encodes the result.
///
/// Raw deflate carries no zlib or gzip header; Flare inflates it as such.
pub fn encode_sourcemap(content: &str) -> std::io::Result<String> {
	let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
	encoder.write_all(content.as_bytes())?;
	let compressed = encoder.finish()?;
	Ok(STANDARD.encode(compressed))
}

/// JSON body of a sourcemap upload.
#[derive(Debug, Serialize)]
pub struct UploadRequest<'a> {
	pub key: &'a str,
	pub version_id: &'a str,
	pub relative_filename: &'a str,
	pub sourcemap: String,
}
