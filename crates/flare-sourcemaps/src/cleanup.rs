// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Removal of local sourcemap files after upload.

use flare_sourcemaps_core::Sourcemap;
use tracing::{error, info};

/// Counts from a cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
	pub removed: usize,
	pub failed: usize,
}

/// Deletes every sourcemap file, one at a time, in the given order.
///
/// A failed deletion is logged and counted; the remaining files are still
/// processed.
pub async fn remove_sourcemaps(sourcemaps: &[Sourcemap]) -> CleanupReport {
	let mut report = CleanupReport::default();

	for sourcemap in sourcemaps {
		let path = sourcemap.sourcemap_url();
		match tokio::fs::remove_file(path).await {
			Ok(()) => report.removed += 1,
			Err(e) => {
				error!(path = %path.display(), error = %e, "Error removing sourcemap file");
				report.failed += 1;
			}
		}
	}

	info!(
		removed = report.removed,
		failed = report.failed,
		"Removed sourcemaps"
	);
	report
}
