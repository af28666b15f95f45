// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Uploader configuration.

use std::fmt;
use std::time::Duration;

use url::Url;
use uuid::Uuid;

use crate::environment::{BuildEnvironment, DisabledReason, UploadGate};
use crate::error::{ConfigError, Result};

/// Default Flare endpoint for sourcemap uploads.
pub const DEFAULT_API_ENDPOINT: &str = "https://flareapp.io/api/sourcemaps";

/// Default ceiling on in-flight upload requests.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Identifier of one build, sent with every upload and injected into the
/// bundle so runtime error reports can be matched to their sourcemaps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionId(String);

impl VersionId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Generates a random v4 UUID identifier.
	pub fn generate() -> Self {
		Self(Uuid::new_v4().to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for VersionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Validated configuration for one build invocation.
///
/// Construct through [`UploaderConfig::builder`]. Every field is resolved at
/// build time, including the version identifier, and never changes after.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
	key: Option<String>,
	base: Option<String>,
	api_endpoint: Url,
	run_in_development: bool,
	version_id: VersionId,
	remove_sourcemaps: bool,
	remove_after_failed_upload: bool,
	max_concurrency: usize,
	request_timeout: Option<Duration>,
}

impl UploaderConfig {
	pub fn builder() -> UploaderConfigBuilder {
		UploaderConfigBuilder::new()
	}

	/// Credential key; `None` disables uploading.
	pub fn key(&self) -> Option<&str> {
		self.key.as_deref()
	}

	/// Explicit base URL, if one was configured.
	pub fn base(&self) -> Option<&str> {
		self.base.as_deref()
	}

	pub fn api_endpoint(&self) -> &Url {
		&self.api_endpoint
	}

	pub fn run_in_development(&self) -> bool {
		self.run_in_development
	}

	pub fn version_id(&self) -> &VersionId {
		&self.version_id
	}

	pub fn remove_sourcemaps(&self) -> bool {
		self.remove_sourcemaps
	}

	/// Whether local maps are still removed when the upload pass failed.
	pub fn remove_after_failed_upload(&self) -> bool {
		self.remove_after_failed_upload
	}

	pub fn max_concurrency(&self) -> usize {
		self.max_concurrency
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		self.request_timeout
	}

	/// Evaluates the key and environment gates.
	pub fn upload_gate(&self, env: &BuildEnvironment) -> UploadGate {
		if self.key.is_none() {
			return UploadGate::Disabled(DisabledReason::MissingKey);
		}
		if env.skip_sourcemaps {
			return UploadGate::Disabled(DisabledReason::SkipRequested);
		}
		if env.is_development() && !self.run_in_development {
			return UploadGate::Disabled(DisabledReason::Development);
		}
		UploadGate::Enabled
	}
}

/// Builder for [`UploaderConfig`].
#[derive(Debug, Clone)]
pub struct UploaderConfigBuilder {
	key: Option<String>,
	base: Option<String>,
	api_endpoint: Option<String>,
	run_in_development: bool,
	version_id: Option<String>,
	remove_sourcemaps: bool,
	remove_after_failed_upload: bool,
	max_concurrency: usize,
	request_timeout: Option<Duration>,
}

impl UploaderConfigBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			key: None,
			base: None,
			api_endpoint: None,
			run_in_development: false,
			version_id: None,
			remove_sourcemaps: false,
			remove_after_failed_upload: true,
			max_concurrency: DEFAULT_MAX_CONCURRENCY,
			request_timeout: None,
		}
	}

	/// Sets the Flare project key. An empty key counts as absent.
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Sets the base URL used to rebuild deployed file names.
	///
	/// Example: `/static/` or `https://cdn.example.com/assets`
	pub fn base(mut self, base: impl Into<String>) -> Self {
		self.base = Some(base.into());
		self
	}

	/// Overrides the upload endpoint.
	pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.api_endpoint = Some(endpoint.into());
		self
	}

	pub fn run_in_development(mut self, enabled: bool) -> Self {
		self.run_in_development = enabled;
		self
	}

	/// Pins the build version. When unset or empty a random one is generated.
	pub fn version_id(mut self, version_id: impl Into<String>) -> Self {
		self.version_id = Some(version_id.into());
		self
	}

	pub fn remove_sourcemaps(mut self, enabled: bool) -> Self {
		self.remove_sourcemaps = enabled;
		self
	}

	/// Controls whether removal still happens after a failed upload pass.
	pub fn remove_after_failed_upload(mut self, enabled: bool) -> Self {
		self.remove_after_failed_upload = enabled;
		self
	}

	/// Sets the maximum number of concurrent upload requests.
	pub fn max_concurrency(mut self, max: usize) -> Self {
		self.max_concurrency = max;
		self
	}

	/// Sets a per-request deadline. No deadline is applied by default.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);
		self
	}

	/// Validates the settings and resolves defaults.
	pub fn build(self) -> Result<UploaderConfig> {
		let raw_endpoint = self
			.api_endpoint
			.unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());
		let api_endpoint = Url::parse(&raw_endpoint).map_err(|e| ConfigError::InvalidEndpoint {
			value: raw_endpoint.clone(),
			message: e.to_string(),
		})?;
		if !matches!(api_endpoint.scheme(), "http" | "https") {
			return Err(ConfigError::InvalidEndpoint {
				value: raw_endpoint,
				message: format!("unsupported scheme {}", api_endpoint.scheme()),
			});
		}

		if self.max_concurrency == 0 {
			return Err(ConfigError::ZeroConcurrency);
		}

		if self.request_timeout == Some(Duration::ZERO) {
			return Err(ConfigError::invalid_value(
				"request_timeout",
				"must be greater than zero",
			));
		}

		let version_id = match self.version_id {
			Some(id) if !id.trim().is_empty() => VersionId::new(id),
			_ => VersionId::generate(),
		};

		Ok(UploaderConfig {
			key: self.key.filter(|key| !key.is_empty()),
			base: self.base,
			api_endpoint,
			run_in_development: self.run_in_development,
			version_id,
			remove_sourcemaps: self.remove_sourcemaps,
			remove_after_failed_upload: self.remove_after_failed_upload,
			max_concurrency: self.max_concurrency,
			request_timeout: self.request_timeout,
		})
	}
}

impl Default for UploaderConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}
