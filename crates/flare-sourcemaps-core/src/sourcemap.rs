// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sourcemap records and deployed-path reconstruction.

use std::path::{Component, Path, PathBuf};

/// File extension that marks a sourcemap next to its compiled artifact.
pub const SOURCEMAP_EXTENSION: &str = "map";

/// A sourcemap paired with the compiled artifact it describes.
///
/// Records are only built by discovery once the artifact exists and the map
/// has been read, so `content` is never empty and `sourcemap_url` points at a
/// file that existed on disk at discovery time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourcemap {
	original_file: String,
	content: String,
	sourcemap_url: PathBuf,
}

impl Sourcemap {
	pub fn new(
		original_file: impl Into<String>,
		content: impl Into<String>,
		sourcemap_url: impl Into<PathBuf>,
	) -> Self {
		Self {
			original_file: original_file.into(),
			content: content.into(),
			sourcemap_url: sourcemap_url.into(),
		}
	}

	/// Deployed location of the compiled artifact, e.g. `/static/app.js`.
	pub fn original_file(&self) -> &str {
		&self.original_file
	}

	/// Raw sourcemap text.
	pub fn content(&self) -> &str {
		&self.content
	}

	/// Absolute path of the map file on the local filesystem.
	pub fn sourcemap_url(&self) -> &Path {
		&self.sourcemap_url
	}
}

/// Normalizes a base URL so it ends with exactly one `/`.
///
/// An empty base becomes `/`.
pub fn normalize_base(base: &str) -> String {
	let mut normalized = base.trim_end_matches('/').to_string();
	normalized.push('/');
	normalized
}

/// Builds the deployed file name for a source path relative to the output
/// directory.
///
/// Path separators are always emitted as `/`, whatever the host platform uses.
pub fn original_file_for(base: &str, relative_source: &Path) -> String {
	let relative = relative_source
		.components()
		.filter_map(|component| match component {
			Component::Normal(part) => Some(part.to_string_lossy()),
			_ => None,
		})
		.collect::<Vec<_>>()
		.join("/");

	format!("{}{}", normalize_base(base), relative)
}
