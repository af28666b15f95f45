// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use thiserror::Error;

/// Errors raised while validating uploader configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The upload endpoint is not a usable URL.
	#[error("invalid API endpoint {value:?}: {message}")]
	InvalidEndpoint { value: String, message: String },

	/// The concurrency ceiling must allow at least one request.
	#[error("max concurrency must be at least 1")]
	ZeroConcurrency,

	/// Invalid value for a named field.
	#[error("invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
