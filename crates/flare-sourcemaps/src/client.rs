// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP client that uploads one sourcemap per request.

use async_trait::async_trait;
use flare_sourcemaps_core::{Sourcemap, UploaderConfig, VersionId};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{Result, UploadError};
use crate::payload::{encode_sourcemap, UploadRequest};

/// Sends a single sourcemap to the error-tracking service.
#[async_trait]
pub trait Uploader: Send + Sync {
	/// Uploads one sourcemap. Implementations must not retry.
	async fn upload(&self, sourcemap: &Sourcemap) -> Result<UploadResponse>;
}

/// Successful response from the upload endpoint.
///
/// The body is kept as returned; nothing in it is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
	pub status: u16,
	pub body: String,
}

/// Flare sourcemap upload client.
#[derive(Debug, Clone)]
pub struct SourcemapClient {
	http_client: Client,
	endpoint: Url,
	key: String,
	version_id: VersionId,
}

impl SourcemapClient {
	/// Builds a client from validated configuration.
	///
	/// Fails with [`UploadError::MissingKey`] when no key is configured.
	pub fn new(config: &UploaderConfig) -> Result<Self> {
		let key = config.key().ok_or(UploadError::MissingKey)?.to_string();

		let mut builder = flare_common_http::builder();
		if let Some(timeout) = config.request_timeout() {
			builder = builder.timeout(timeout);
		}
		let http_client = builder.build().map_err(UploadError::RequestFailed)?;

		Ok(Self {
			http_client,
			endpoint: config.api_endpoint().clone(),
			key,
			version_id: config.version_id().clone(),
		})
	}
}

#[async_trait]
impl Uploader for SourcemapClient {
	async fn upload(&self, sourcemap: &Sourcemap) -> Result<UploadResponse> {
		let request = UploadRequest {
			key: &self.key,
			version_id: self.version_id.as_str(),
			relative_filename: sourcemap.original_file(),
			sourcemap: encode_sourcemap(sourcemap.content())?,
		};

		debug!(
			url = %self.endpoint,
			original_file = %sourcemap.original_file(),
			payload_bytes = request.sourcemap.len(),
			"Uploading sourcemap"
		);

		let response = self
			.http_client
			.post(self.endpoint.clone())
			.json(&request)
			.send()
			.await?;

		let status = response.status();
		let body = match response.text().await {
			Ok(body) => body,
			Err(e) => {
				debug!(status = %status, error = %e, "Failed to read upload response body");
				String::new()
			}
		};

		if !status.is_success() {
			return Err(UploadError::ServerError {
				status: status.as_u16(),
				body,
			});
		}

		Ok(UploadResponse {
			status: status.as_u16(),
			body,
		})
	}
}
