// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The post-build upload pass: discover, dispatch, clean up.

use std::path::Path;
use std::sync::Arc;

use flare_sourcemaps_core::{DisabledReason, UploaderConfig};
use tracing::{error, info};

use crate::cleanup::{remove_sourcemaps, CleanupReport};
use crate::client::Uploader;
use crate::discovery::discover;
use crate::dispatch::{BatchDispatcher, DispatchReport};
use crate::error::DispatchError;

/// What one upload pass did.
#[derive(Debug)]
pub enum UploadOutcome {
	/// Uploading was switched off before anything was scanned.
	Disabled(DisabledReason),
	/// No valid sourcemap pairs were found.
	NothingToUpload { skipped: usize },
	/// Sourcemaps were dispatched; see the summary for the result.
	Completed(UploadSummary),
}

impl UploadOutcome {
	/// True only when every discovered sourcemap was uploaded.
	pub fn is_success(&self) -> bool {
		matches!(self, UploadOutcome::Completed(summary) if summary.dispatch.is_ok())
	}
}

/// Details of a pass that reached the dispatch stage.
#[derive(Debug)]
pub struct UploadSummary {
	pub discovered: usize,
	pub skipped: usize,
	pub dispatch: Result<DispatchReport, DispatchError>,
	/// `None` when removal was not configured or not allowed after a failure.
	pub cleanup: Option<CleanupReport>,
}

/// Runs the upload pass against one output directory.
#[derive(Clone)]
pub struct UploadPipeline {
	config: Arc<UploaderConfig>,
	uploader: Arc<dyn Uploader>,
	dispatcher: BatchDispatcher,
}

impl UploadPipeline {
	pub fn new(config: Arc<UploaderConfig>, uploader: Arc<dyn Uploader>) -> Self {
		let dispatcher = BatchDispatcher::new(config.max_concurrency());
		Self {
			config,
			uploader,
			dispatcher,
		}
	}

	/// Discovers, uploads and optionally removes the sourcemaps under
	/// `output_dir`. Never fails: every problem is logged and reported in the
	/// outcome.
	pub async fn run(&self, output_dir: &Path, base: &str) -> UploadOutcome {
		let discovery = discover(output_dir, base).await;
		let skipped = discovery.skipped.len();

		if discovery.sourcemaps.is_empty() {
			info!(
				output_dir = %output_dir.display(),
				skipped,
				"No sourcemaps to upload"
			);
			return UploadOutcome::NothingToUpload { skipped };
		}

		let sourcemaps = discovery.sourcemaps;
		info!(count = sourcemaps.len(), "Uploading sourcemap files to Flare");

		let dispatch = self
			.dispatcher
			.dispatch_all(self.uploader.as_ref(), &sourcemaps)
			.await;

		match &dispatch {
			Ok(report) => info!(
				uploaded = report.uploaded,
				"Successfully uploaded sourcemaps to Flare"
			),
			Err(e) => error!(
				error = %e,
				group = e.group,
				failed = e.failed,
				not_attempted = e.not_attempted,
				"Something went wrong while uploading the sourcemaps to Flare"
			),
		}

		let cleanup = if self.should_remove(dispatch.is_ok()) {
			Some(remove_sourcemaps(&sourcemaps).await)
		} else {
			None
		};

		UploadOutcome::Completed(UploadSummary {
			discovered: sourcemaps.len(),
			skipped,
			dispatch,
			cleanup,
		})
	}

	fn should_remove(&self, dispatch_succeeded: bool) -> bool {
		self.config.remove_sourcemaps()
			&& (dispatch_succeeded || self.config.remove_after_failed_upload())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::UploadResponse;
	use crate::error::UploadError;
	use async_trait::async_trait;
	use flare_sourcemaps_core::Sourcemap;
	use std::fs;
	use std::sync::Mutex;
	use tempfile::TempDir;

	#[derive(Default)]
	struct FakeUploader {
		fail: bool,
		uploaded: Mutex<Vec<String>>,
	}

	#[async_trait]
	impl Uploader for FakeUploader {
		async fn upload(&self, sourcemap: &Sourcemap) -> crate::Result<UploadResponse> {
			self.uploaded
				.lock()
				.unwrap()
				.push(sourcemap.original_file().to_string());
			if self.fail {
				return Err(UploadError::ServerError {
					status: 401,
					body: "Unauthorized".to_string(),
				});
			}
			Ok(UploadResponse {
				status: 200,
				body: String::new(),
			})
		}
	}

	fn build_output() -> TempDir {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
		fs::write(dir.path().join("app.js.map"), r#"{"version":3}"#).unwrap();
		fs::write(dir.path().join("vendor.js.map"), r#"{"version":3}"#).unwrap();
		dir
	}

	fn pipeline(config: UploaderConfig, uploader: Arc<FakeUploader>) -> UploadPipeline {
		UploadPipeline::new(Arc::new(config), uploader)
	}

	#[tokio::test]
	async fn test_end_to_end_without_removal() {
		let dir = build_output();
		let uploader = Arc::new(FakeUploader::default());
		let config = UploaderConfig::builder().key("k").build().unwrap();

		let outcome = pipeline(config, uploader.clone())
			.run(dir.path(), "/static/")
			.await;

		assert!(outcome.is_success());
		let UploadOutcome::Completed(summary) = outcome else {
			panic!("expected completed outcome");
		};
		assert_eq!(summary.discovered, 1);
		assert_eq!(summary.skipped, 1);
		assert!(summary.cleanup.is_none());
		assert_eq!(*uploader.uploaded.lock().unwrap(), vec!["/static/app.js"]);
		assert!(dir.path().join("app.js.map").exists());
	}

	#[tokio::test]
	async fn test_removal_after_success() {
		let dir = build_output();
		let uploader = Arc::new(FakeUploader::default());
		let config = UploaderConfig::builder()
			.key("k")
			.remove_sourcemaps(true)
			.build()
			.unwrap();

		let outcome = pipeline(config, uploader).run(dir.path(), "/static/").await;

		let UploadOutcome::Completed(summary) = outcome else {
			panic!("expected completed outcome");
		};
		assert_eq!(summary.cleanup, Some(CleanupReport { removed: 1, failed: 0 }));
		assert!(!dir.path().join("app.js.map").exists());
		// Skipped maps are never part of the cleanup set.
		assert!(dir.path().join("vendor.js.map").exists());
	}

	#[tokio::test]
	async fn test_removal_after_failure_by_default() {
		let dir = build_output();
		let uploader = Arc::new(FakeUploader {
			fail: true,
			..Default::default()
		});
		let config = UploaderConfig::builder()
			.key("k")
			.remove_sourcemaps(true)
			.build()
			.unwrap();

		let outcome = pipeline(config, uploader).run(dir.path(), "/static/").await;

		assert!(!outcome.is_success());
		let UploadOutcome::Completed(summary) = outcome else {
			panic!("expected completed outcome");
		};
		assert_eq!(
			summary.dispatch.unwrap_err().to_string(),
			"upload of /static/app.js failed: 401: Unauthorized"
		);
		assert_eq!(summary.cleanup, Some(CleanupReport { removed: 1, failed: 0 }));
	}

	#[tokio::test]
	async fn test_failed_upload_keeps_maps_when_configured() {
		let dir = build_output();
		let uploader = Arc::new(FakeUploader {
			fail: true,
			..Default::default()
		});
		let config = UploaderConfig::builder()
			.key("k")
			.remove_sourcemaps(true)
			.remove_after_failed_upload(false)
			.build()
			.unwrap();

		let outcome = pipeline(config, uploader).run(dir.path(), "/static/").await;

		let UploadOutcome::Completed(summary) = outcome else {
			panic!("expected completed outcome");
		};
		assert!(summary.cleanup.is_none());
		assert!(dir.path().join("app.js.map").exists());
	}

	#[tokio::test]
	async fn test_nothing_to_upload() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("vendor.js.map"), "{}").unwrap();
		let uploader = Arc::new(FakeUploader::default());
		let config = UploaderConfig::builder()
			.key("k")
			.remove_sourcemaps(true)
			.build()
			.unwrap();

		let outcome = pipeline(config, uploader.clone())
			.run(dir.path(), "/")
			.await;

		assert!(matches!(
			outcome,
			UploadOutcome::NothingToUpload { skipped: 1 }
		));
		assert!(uploader.uploaded.lock().unwrap().is_empty());
		assert!(dir.path().join("vendor.js.map").exists());
	}
}
