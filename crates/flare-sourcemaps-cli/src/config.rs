// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration: defaults, `flare.toml`, environment, flags.
//!
//! Environment variables are read through clap, so a flag always beats its
//! variable and both beat the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use flare_sourcemaps_core::{ConfigError, UploaderConfig};
use serde::Deserialize;
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "flare.toml";

/// Errors that can occur while loading CLI configuration.
#[derive(Debug, thiserror::Error)]
pub enum CliConfigError {
	/// I/O error reading config file
	#[error("failed to read {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// The merged settings failed validation
	#[error(transparent)]
	Invalid(#[from] ConfigError),
}

/// Contents of `flare.toml`. Keys also accept the camelCase spelling used by
/// the JavaScript plugin options.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
	pub key: Option<String>,
	pub base: Option<String>,
	#[serde(alias = "apiEndpoint")]
	pub api_endpoint: Option<String>,
	#[serde(alias = "runInDevelopment")]
	pub run_in_development: Option<bool>,
	#[serde(alias = "versionId")]
	pub version_id: Option<String>,
	#[serde(alias = "removeSourcemaps")]
	pub remove_sourcemaps: Option<bool>,
	pub remove_after_failed_upload: Option<bool>,
	pub max_concurrency: Option<usize>,
	pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
	pub fn load(path: &Path) -> Result<Self, CliConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| CliConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		toml::from_str(&content).map_err(|source| CliConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Loads the explicit file, or `flare.toml` in `dir` when it exists.
	pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, CliConfigError> {
		if let Some(path) = explicit {
			return Self::load(path);
		}

		let candidate = dir.join(DEFAULT_CONFIG_FILE);
		if candidate.is_file() {
			debug!(path = %candidate.display(), "Loading config file");
			return Self::load(&candidate);
		}
		Ok(Self::default())
	}
}

/// Configuration flags shared by every command that talks to Flare.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigArgs {
	/// TOML config file (defaults to ./flare.toml when present)
	#[arg(long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Flare project key; uploading is disabled without one
	#[arg(long, env = "FLARE_KEY", hide_env_values = true)]
	pub key: Option<String>,

	/// URL prefix of the deployed assets, e.g. /static/
	#[arg(long, env = "FLARE_BASE")]
	pub base: Option<String>,

	/// Upload endpoint
	#[arg(long, env = "FLARE_API_ENDPOINT")]
	pub api_endpoint: Option<String>,

	/// Build version identifier (random when unset)
	#[arg(long, env = "FLARE_VERSION_ID")]
	pub version_id: Option<String>,

	/// Upload even when NODE_ENV=development
	#[arg(long)]
	pub run_in_development: bool,

	/// Delete local sourcemaps after the upload pass
	#[arg(long)]
	pub remove_sourcemaps: bool,

	/// Keep local sourcemaps when the upload pass failed
	#[arg(long)]
	pub keep_sourcemaps_on_failure: bool,

	/// Maximum concurrent upload requests
	#[arg(long, value_name = "N")]
	pub concurrency: Option<usize>,

	/// Per-request timeout in seconds (no timeout by default)
	#[arg(long, value_name = "SECS")]
	pub timeout_secs: Option<u64>,
}

/// Loads the config file for `args` from the working directory and merges.
pub fn load(args: &ConfigArgs) -> Result<UploaderConfig, CliConfigError> {
	let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
	let file = FileConfig::discover(args.config.as_deref(), &cwd)?;
	resolve(file, args)
}

/// Merges file settings with flags and validates the result.
pub fn resolve(file: FileConfig, args: &ConfigArgs) -> Result<UploaderConfig, CliConfigError> {
	let mut builder = UploaderConfig::builder()
		.run_in_development(args.run_in_development || file.run_in_development.unwrap_or(false))
		.remove_sourcemaps(args.remove_sourcemaps || file.remove_sourcemaps.unwrap_or(false));

	if let Some(key) = args.key.clone().or(file.key) {
		builder = builder.key(key);
	}
	if let Some(base) = args.base.clone().or(file.base) {
		builder = builder.base(base);
	}
	if let Some(endpoint) = args.api_endpoint.clone().or(file.api_endpoint) {
		builder = builder.api_endpoint(endpoint);
	}
	if let Some(version_id) = args.version_id.clone().or(file.version_id) {
		builder = builder.version_id(version_id);
	}

	let remove_after_failure = if args.keep_sourcemaps_on_failure {
		false
	} else {
		file.remove_after_failed_upload.unwrap_or(true)
	};
	builder = builder.remove_after_failed_upload(remove_after_failure);

	if let Some(max) = args.concurrency.or(file.max_concurrency) {
		builder = builder.max_concurrency(max);
	}
	if let Some(secs) = args.timeout_secs.or(file.request_timeout_secs) {
		builder = builder.request_timeout(Duration::from_secs(secs));
	}

	Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn test_file_config_parses_snake_and_camel_case() {
		let file: FileConfig = toml::from_str(
			r#"
key = "abc"
apiEndpoint = "https://example.com/api/sourcemaps"
run_in_development = true
removeSourcemaps = true
max_concurrency = 4
"#,
		)
		.unwrap();

		assert_eq!(file.key.as_deref(), Some("abc"));
		assert_eq!(
			file.api_endpoint.as_deref(),
			Some("https://example.com/api/sourcemaps")
		);
		assert_eq!(file.run_in_development, Some(true));
		assert_eq!(file.remove_sourcemaps, Some(true));
		assert_eq!(file.max_concurrency, Some(4));
	}

	#[test]
	fn test_unknown_keys_rejected() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("flare.toml");
		fs::write(&path, "kee = \"typo\"\n").unwrap();

		let result = FileConfig::load(&path);
		assert!(matches!(result, Err(CliConfigError::TomlParse { .. })));
	}

	#[test]
	fn test_discover_uses_default_file() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "base = \"/static/\"\n").unwrap();

		let file = FileConfig::discover(None, dir.path()).unwrap();
		assert_eq!(file.base.as_deref(), Some("/static/"));
	}

	#[test]
	fn test_discover_without_file_is_default() {
		let dir = TempDir::new().unwrap();
		assert_eq!(
			FileConfig::discover(None, dir.path()).unwrap(),
			FileConfig::default()
		);
	}

	#[test]
	fn test_explicit_missing_file_is_error() {
		let dir = TempDir::new().unwrap();
		let missing = dir.path().join("nope.toml");
		let result = FileConfig::discover(Some(&missing), dir.path());
		assert!(matches!(result, Err(CliConfigError::Io { .. })));
	}

	#[test]
	fn test_flags_override_file() {
		let file = FileConfig {
			key: Some("file-key".to_string()),
			base: Some("/file/".to_string()),
			version_id: Some("file-version".to_string()),
			max_concurrency: Some(2),
			..Default::default()
		};
		let args = ConfigArgs {
			key: Some("flag-key".to_string()),
			concurrency: Some(5),
			..Default::default()
		};

		let config = resolve(file, &args).unwrap();

		assert_eq!(config.key(), Some("flag-key"));
		assert_eq!(config.base(), Some("/file/"));
		assert_eq!(config.version_id().as_str(), "file-version");
		assert_eq!(config.max_concurrency(), 5);
	}

	#[test]
	fn test_cleanup_flags() {
		let file = FileConfig {
			remove_sourcemaps: Some(true),
			..Default::default()
		};
		let config = resolve(file.clone(), &ConfigArgs::default()).unwrap();
		assert!(config.remove_sourcemaps());
		assert!(config.remove_after_failed_upload());

		let args = ConfigArgs {
			keep_sourcemaps_on_failure: true,
			..Default::default()
		};
		let config = resolve(file, &args).unwrap();
		assert!(!config.remove_after_failed_upload());
	}

	#[test]
	fn test_timeout_from_file() {
		let file = FileConfig {
			request_timeout_secs: Some(15),
			..Default::default()
		};
		let config = resolve(file, &ConfigArgs::default()).unwrap();
		assert_eq!(config.request_timeout(), Some(Duration::from_secs(15)));
	}

	#[test]
	fn test_invalid_merged_config_is_reported() {
		let args = ConfigArgs {
			concurrency: Some(0),
			..Default::default()
		};
		let result = resolve(FileConfig::default(), &args);
		assert!(matches!(
			result,
			Err(CliConfigError::Invalid(ConfigError::ZeroConcurrency))
		));
	}
}
