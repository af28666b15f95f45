// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for sourcemap uploads.

use thiserror::Error;

/// Result type alias for upload operations.
pub type Result<T> = std::result::Result<T, UploadError>;

/// Errors raised by a single sourcemap upload.
#[derive(Debug, Error)]
pub enum UploadError {
	/// No credential key is configured.
	#[error("no Flare API key configured")]
	MissingKey,

	/// The request never produced a response.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Flare answered with a non-success status.
	#[error("{status}: {body}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Response body as returned by the server.
		body: String,
	},

	/// Compressing the sourcemap content failed.
	#[error("failed to compress sourcemap: {0}")]
	Compression(#[from] std::io::Error),
}

/// A group of uploads failed and the remaining groups were abandoned.
#[derive(Debug, Error)]
#[error("upload of {original_file} failed: {source}")]
pub struct DispatchError {
	/// Zero-based index of the group that failed.
	pub group: usize,
	/// Deployed name of the first failing sourcemap in that group.
	pub original_file: String,
	/// Number of uploads that failed in the group.
	pub failed: usize,
	/// Number of sourcemaps never attempted because of the abort.
	pub not_attempted: usize,
	/// First failure in the group.
	pub source: UploadError,
}
