// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment gates that decide whether a build uploads sourcemaps.

use std::fmt;

/// Environment variable naming the build mode (`development`, `production`, ...).
pub const NODE_ENV: &str = "NODE_ENV";

/// Environment variable that skips uploading when set to `true`.
pub const SKIP_SOURCEMAPS: &str = "SKIP_SOURCEMAPS";

/// Snapshot of the environment flags relevant to uploading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
	pub node_env: Option<String>,
	pub skip_sourcemaps: bool,
}

impl BuildEnvironment {
	/// Reads the flags from the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the flags through an arbitrary lookup, used by tests and hosts
	/// that carry their own environment map.
	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		Self {
			node_env: lookup(NODE_ENV),
			skip_sourcemaps: lookup(SKIP_SOURCEMAPS).as_deref() == Some("true"),
		}
	}

	pub fn is_development(&self) -> bool {
		self.node_env.as_deref() == Some("development")
	}
}

/// Why uploading is switched off for this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisabledReason {
	/// No credential key was configured.
	MissingKey,
	/// Running in development without `run_in_development`.
	Development,
	/// `SKIP_SOURCEMAPS=true` was set.
	SkipRequested,
}

impl fmt::Display for DisabledReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let reason = match self {
			DisabledReason::MissingKey => "no Flare API key was provided",
			DisabledReason::Development => "running in development mode",
			DisabledReason::SkipRequested => "SKIP_SOURCEMAPS is set",
		};
		f.write_str(reason)
	}
}

/// Outcome of evaluating the upload gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadGate {
	Enabled,
	Disabled(DisabledReason),
}

impl UploadGate {
	pub fn is_enabled(&self) -> bool {
		matches!(self, UploadGate::Enabled)
	}
}
