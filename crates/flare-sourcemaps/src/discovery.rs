// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sourcemap discovery and pairing with compiled artifacts.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use flare_sourcemaps_core::{original_file_for, Sourcemap, SOURCEMAP_EXTENSION};
use tracing::{debug, error, warn};
use walkdir::{DirEntry, WalkDir};

/// Why a map file was left out of the upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
	/// The compiled artifact next to the map does not exist.
	MissingSource,
	/// The map could not be read as UTF-8 text.
	Unreadable(String),
	/// The map file is empty.
	Empty,
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SkipReason::MissingSource => f.write_str("no corresponding source found"),
			SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
			SkipReason::Empty => f.write_str("empty sourcemap"),
		}
	}
}

/// A map file excluded during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSourcemap {
	pub path: PathBuf,
	pub reason: SkipReason,
}

/// Result of scanning an output directory.
#[derive(Debug, Default)]
pub struct Discovery {
	/// Valid pairs, in walk order.
	pub sourcemaps: Vec<Sourcemap>,
	pub skipped: Vec<SkippedSourcemap>,
}

/// Scans `output_dir` for `*.map` files and pairs each with its artifact.
///
/// `base` is normalized before use. Per-file problems are logged once and
/// recorded in [`Discovery::skipped`]; discovery itself never fails. Hidden
/// files and directories are not visited.
pub async fn discover(output_dir: &Path, base: &str) -> Discovery {
	let root = resolve_output_dir(output_dir);
	let mut discovery = Discovery::default();

	let walker = WalkDir::new(&root)
		.follow_links(true)
		.sort_by_file_name()
		.into_iter()
		.filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

	for entry in walker {
		let entry = match entry {
			Ok(entry) => entry,
			Err(e) => {
				warn!(error = %e, "Failed to read output directory entry");
				continue;
			}
		};

		if !entry.file_type().is_file() {
			continue;
		}

		let map_path = entry.path();
		let Some(source_path) = source_path_for(map_path) else {
			continue;
		};
		let relative_map = map_path.strip_prefix(&root).unwrap_or(map_path);
		let relative_source = source_path.strip_prefix(&root).unwrap_or(&source_path);

		if !is_file(&source_path).await {
			warn!(
				file = %relative_map.display(),
				"No corresponding source found for sourcemap"
			);
			discovery.skipped.push(SkippedSourcemap {
				path: map_path.to_path_buf(),
				reason: SkipReason::MissingSource,
			});
			continue;
		}

		let content = match tokio::fs::read_to_string(map_path).await {
			Ok(content) => content,
			Err(e) => {
				error!(
					path = %map_path.display(),
					error = %e,
					"Error reading sourcemap file"
				);
				discovery.skipped.push(SkippedSourcemap {
					path: map_path.to_path_buf(),
					reason: SkipReason::Unreadable(e.to_string()),
				});
				continue;
			}
		};

		if content.is_empty() {
			warn!(file = %relative_map.display(), "Sourcemap file is empty");
			discovery.skipped.push(SkippedSourcemap {
				path: map_path.to_path_buf(),
				reason: SkipReason::Empty,
			});
			continue;
		}

		let original_file = original_file_for(base, relative_source);
		debug!(
			original_file = %original_file,
			sourcemap = %map_path.display(),
			"Paired sourcemap with source"
		);
		discovery
			.sourcemaps
			.push(Sourcemap::new(original_file, content, map_path));
	}

	discovery
}

/// Strips the sourcemap extension, returning `None` for files that are not
/// maps. File names need not be valid UTF-8.
fn source_path_for(map_path: &Path) -> Option<PathBuf> {
	if map_path.extension() != Some(OsStr::new(SOURCEMAP_EXTENSION)) {
		return None;
	}
	Some(map_path.with_extension(""))
}

fn resolve_output_dir(output_dir: &Path) -> PathBuf {
	let dir = if output_dir.as_os_str().is_empty() {
		Path::new(".")
	} else {
		output_dir
	};
	std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

fn is_hidden(entry: &DirEntry) -> bool {
	entry
		.file_name()
		.to_str()
		.is_some_and(|name| name.starts_with('.'))
}

async fn is_file(path: &Path) -> bool {
	tokio::fs::metadata(path)
		.await
		.map(|metadata| metadata.is_file())
		.unwrap_or(false)
}
