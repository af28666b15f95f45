// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded-concurrency dispatch of sourcemap uploads.

use flare_sourcemaps_core::{Sourcemap, DEFAULT_MAX_CONCURRENCY};
use futures::future::join_all;
use tracing::{debug, info};

use crate::client::Uploader;
use crate::error::DispatchError;

/// Summary of a fully successful dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
	pub uploaded: usize,
	pub groups: usize,
}

/// Drives an [`Uploader`] over many sourcemaps in sequential groups.
///
/// Each group holds at most `max_concurrency` uploads which run concurrently.
/// The next group starts only once every upload of the current group has
/// settled, so no more than `max_concurrency` requests are ever in flight. A
/// failure anywhere in a group abandons all later groups.
#[derive(Debug, Clone, Copy)]
pub struct BatchDispatcher {
	max_concurrency: usize,
}

impl BatchDispatcher {
	/// Creates a dispatcher; a ceiling of zero is raised to one.
	pub fn new(max_concurrency: usize) -> Self {
		Self {
			max_concurrency: max_concurrency.max(1),
		}
	}

	pub fn max_concurrency(&self) -> usize {
		self.max_concurrency
	}

	/// Uploads every sourcemap, group by group.
	pub async fn dispatch_all<U>(
		&self,
		uploader: &U,
		sourcemaps: &[Sourcemap],
	) -> Result<DispatchReport, DispatchError>
	where
		U: Uploader + ?Sized,
	{
		let groups = sourcemaps.len().div_ceil(self.max_concurrency);
		let mut uploaded = 0;

		for (index, group) in sourcemaps.chunks(self.max_concurrency).enumerate() {
			debug!(
				group = index + 1,
				groups,
				size = group.len(),
				"Dispatching upload group"
			);

			let results = join_all(group.iter().map(|sourcemap| uploader.upload(sourcemap))).await;

			let mut failures = results
				.into_iter()
				.zip(group)
				.filter_map(|(result, sourcemap)| result.err().map(|e| (sourcemap, e)));

			if let Some((sourcemap, source)) = failures.next() {
				let failed = 1 + failures.count();
				let attempted = index * self.max_concurrency + group.len();
				return Err(DispatchError {
					group: index,
					original_file: sourcemap.original_file().to_string(),
					failed,
					not_attempted: sourcemaps.len() - attempted,
					source,
				});
			}

			uploaded += group.len();
		}

		info!(uploaded, groups, "All upload groups completed");
		Ok(DispatchReport { uploaded, groups })
	}
}

impl Default for BatchDispatcher {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_CONCURRENCY)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::UploadResponse;
	use crate::error::UploadError;
	use async_trait::async_trait;
	use std::collections::HashSet;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	/// Records call order and concurrency; fails for configured files.
	#[derive(Default)]
	struct RecordingUploader {
		in_flight: AtomicUsize,
		max_in_flight: AtomicUsize,
		completed: AtomicUsize,
		/// (original_file, uploads completed before this one started)
		starts: Mutex<Vec<(String, usize)>>,
		failing: HashSet<String>,
	}

	impl RecordingUploader {
		fn failing_on(files: &[&str]) -> Self {
			Self {
				failing: files.iter().map(|f| f.to_string()).collect(),
				..Default::default()
			}
		}

		fn attempted(&self) -> Vec<String> {
			self.starts
				.lock()
				.unwrap()
				.iter()
				.map(|(file, _)| file.clone())
				.collect()
		}
	}

	#[async_trait]
	impl Uploader for RecordingUploader {
		async fn upload(&self, sourcemap: &Sourcemap) -> crate::Result<UploadResponse> {
			self.starts.lock().unwrap().push((
				sourcemap.original_file().to_string(),
				self.completed.load(Ordering::SeqCst),
			));
			let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
			self.max_in_flight.fetch_max(now, Ordering::SeqCst);

			for _ in 0..3 {
				tokio::task::yield_now().await;
			}

			self.in_flight.fetch_sub(1, Ordering::SeqCst);
			self.completed.fetch_add(1, Ordering::SeqCst);

			if self.failing.contains(sourcemap.original_file()) {
				return Err(UploadError::ServerError {
					status: 500,
					body: "boom".to_string(),
				});
			}
			Ok(UploadResponse {
				status: 200,
				body: String::new(),
			})
		}
	}

	fn maps(count: usize) -> Vec<Sourcemap> {
		(0..count)
			.map(|i| {
				Sourcemap::new(
					format!("/static/chunk-{i}.js"),
					"{}",
					format!("/tmp/dist/chunk-{i}.js.map"),
				)
			})
			.collect()
	}

	#[tokio::test]
	async fn test_empty_input_dispatches_nothing() {
		let uploader = RecordingUploader::default();
		let report = BatchDispatcher::default()
			.dispatch_all(&uploader, &[])
			.await
			.unwrap();

		assert_eq!(report, DispatchReport { uploaded: 0, groups: 0 });
		assert!(uploader.attempted().is_empty());
	}

	#[tokio::test]
	async fn test_groups_are_bounded_and_sequential() {
		let uploader = RecordingUploader::default();
		let records = maps(25);

		let report = BatchDispatcher::new(10)
			.dispatch_all(&uploader, &records)
			.await
			.unwrap();

		assert_eq!(report, DispatchReport { uploaded: 25, groups: 3 });
		assert_eq!(uploader.max_in_flight.load(Ordering::SeqCst), 10);

		// Every upload in group k starts after all uploads of earlier groups finished.
		let starts = uploader.starts.lock().unwrap();
		for (position, (_, completed_before)) in starts.iter().enumerate() {
			let group = position / 10;
			assert!(*completed_before >= group * 10);
			assert!(*completed_before < (group + 1) * 10);
		}
	}

	#[tokio::test]
	async fn test_concurrency_ceiling_is_configurable() {
		let uploader = RecordingUploader::default();
		let report = BatchDispatcher::new(3)
			.dispatch_all(&uploader, &maps(7))
			.await
			.unwrap();

		assert_eq!(report.groups, 3);
		assert_eq!(uploader.max_in_flight.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn test_failure_aborts_later_groups() {
		let uploader = RecordingUploader::failing_on(&["/static/chunk-4.js"]);
		let records = maps(25);

		let error = BatchDispatcher::new(10)
			.dispatch_all(&uploader, &records)
			.await
			.unwrap_err();

		assert_eq!(error.group, 0);
		assert_eq!(error.original_file, "/static/chunk-4.js");
		assert_eq!(error.failed, 1);
		assert_eq!(error.not_attempted, 15);
		assert_eq!(
			error.to_string(),
			"upload of /static/chunk-4.js failed: 500: boom"
		);

		// The whole first group settles, nothing after it starts.
		let attempted = uploader.attempted();
		assert_eq!(attempted.len(), 10);
		assert!(!attempted.contains(&"/static/chunk-10.js".to_string()));
	}

	#[tokio::test]
	async fn test_failure_in_last_group() {
		let uploader =
			RecordingUploader::failing_on(&["/static/chunk-20.js", "/static/chunk-21.js"]);

		let error = BatchDispatcher::new(10)
			.dispatch_all(&uploader, &maps(22))
			.await
			.unwrap_err();

		assert_eq!(error.group, 2);
		assert_eq!(error.failed, 2);
		assert_eq!(error.not_attempted, 0);
		assert_eq!(uploader.attempted().len(), 22);
	}

	#[test]
	fn test_zero_ceiling_is_raised() {
		assert_eq!(BatchDispatcher::new(0).max_concurrency(), 1);
		assert_eq!(
			BatchDispatcher::default().max_concurrency(),
			DEFAULT_MAX_CONCURRENCY
		);
	}
}
