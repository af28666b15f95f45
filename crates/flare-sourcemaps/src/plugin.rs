// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Build-tool hook surface.
//!
//! A host bundler drives a [`BuildPlugin`] through three hooks, in order:
//! [`config`](BuildPlugin::config) before the build to adjust sourcemap
//! generation and inject constants,
//! [`config_resolved`](BuildPlugin::config_resolved) once the host has
//! settled its configuration, and [`write_bundle`](BuildPlugin::write_bundle)
//! after the output has been written.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use flare_sourcemaps_core::{
	normalize_base, BuildEnvironment, DisabledReason, UploadGate, UploaderConfig,
};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::client::{SourcemapClient, Uploader};
use crate::error::Result;
use crate::pipeline::{UploadOutcome, UploadPipeline};

/// Constant holding the build version, read by the runtime error client.
pub const VERSION_DEFINE: &str = "FLARE_SOURCEMAP_VERSION";

/// Constant holding the project key, read by the runtime error client.
pub const KEY_DEFINE: &str = "FLARE_JS_KEY";

/// How the bundler should emit sourcemaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcemapMode {
	/// Separate map files referenced from the bundle.
	Enabled,
	/// Maps embedded in the bundle as data URLs.
	Inline,
	/// Separate map files without a reference comment in the bundle.
	Hidden,
	/// No sourcemaps.
	Disabled,
}

impl fmt::Display for SourcemapMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mode = match self {
			SourcemapMode::Enabled => "true",
			SourcemapMode::Inline => "inline",
			SourcemapMode::Hidden => "hidden",
			SourcemapMode::Disabled => "false",
		};
		f.write_str(mode)
	}
}

impl FromStr for SourcemapMode {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"true" => Ok(SourcemapMode::Enabled),
			"inline" => Ok(SourcemapMode::Inline),
			"hidden" => Ok(SourcemapMode::Hidden),
			"false" => Ok(SourcemapMode::Disabled),
			other => Err(format!(
				"invalid sourcemap mode {other:?}, expected true, false, inline or hidden"
			)),
		}
	}
}

// Bundlers take a boolean or a string here, so mirror that shape.
impl Serialize for SourcemapMode {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		match self {
			SourcemapMode::Enabled => serializer.serialize_bool(true),
			SourcemapMode::Disabled => serializer.serialize_bool(false),
			SourcemapMode::Inline => serializer.serialize_str("inline"),
			SourcemapMode::Hidden => serializer.serialize_str("hidden"),
		}
	}
}

/// Which host command is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildCommand {
	Build,
	Serve,
}

/// The user's own build settings, as seen by the `config` hook.
#[derive(Debug, Clone, Default)]
pub struct UserBuildConfig {
	pub sourcemap: Option<SourcemapMode>,
}

/// Settings the plugin asks the host to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOverrides {
	/// Compile-time constants, values already quoted as source literals.
	pub define: BTreeMap<String, String>,
	pub sourcemap: SourcemapMode,
}

/// Host configuration after resolution.
#[derive(Debug, Clone)]
pub struct ResolvedBuildConfig {
	pub base: String,
}

/// Output settings passed to `write_bundle`.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
	/// Output directory; `None` means the current directory.
	pub dir: Option<PathBuf>,
}

/// Hooks a host bundler calls around a build.
#[async_trait]
pub trait BuildPlugin: Send + Sync {
	fn name(&self) -> &'static str;

	/// Whether the plugin takes part in the given host command.
	fn applies_to(&self, command: BuildCommand) -> bool;

	fn config(&self, user: &UserBuildConfig, mode: &str) -> BuildOverrides;

	fn config_resolved(&mut self, resolved: &ResolvedBuildConfig);

	/// Runs after the bundle is written. Must never fail the build.
	async fn write_bundle(&self, output: &OutputOptions) -> UploadOutcome;
}

/// Uploads sourcemaps to Flare after each build.
pub struct SourcemapPlugin {
	config: Arc<UploaderConfig>,
	base: String,
	/// The upload pipeline, or why uploading is switched off.
	pipeline: std::result::Result<UploadPipeline, DisabledReason>,
}

impl SourcemapPlugin {
	pub const NAME: &'static str = "flare-vite-plugin";

	/// Creates the plugin, building the HTTP client only when uploading is
	/// enabled.
	pub fn new(config: UploaderConfig, env: &BuildEnvironment) -> Result<Self> {
		let uploader: Arc<dyn Uploader> = match config.upload_gate(env) {
			UploadGate::Enabled => Arc::new(SourcemapClient::new(&config)?),
			UploadGate::Disabled(reason) => return Ok(Self::disabled(config, reason)),
		};
		Ok(Self::enabled(config, uploader))
	}

	/// Creates the plugin with a caller-supplied uploader.
	pub fn with_uploader(
		config: UploaderConfig,
		env: &BuildEnvironment,
		uploader: Arc<dyn Uploader>,
	) -> Self {
		match config.upload_gate(env) {
			UploadGate::Enabled => Self::enabled(config, uploader),
			UploadGate::Disabled(reason) => Self::disabled(config, reason),
		}
	}

	fn enabled(config: UploaderConfig, uploader: Arc<dyn Uploader>) -> Self {
		let config = Arc::new(config);
		let pipeline = UploadPipeline::new(Arc::clone(&config), uploader);
		Self {
			base: initial_base(&config),
			config,
			pipeline: Ok(pipeline),
		}
	}

	fn disabled(config: UploaderConfig, reason: DisabledReason) -> Self {
		if reason == DisabledReason::MissingKey {
			warn!("No Flare API key was provided, not uploading sourcemaps to Flare");
		}
		let config = Arc::new(config);
		Self {
			base: initial_base(&config),
			config,
			pipeline: Err(reason),
		}
	}

	pub fn gate(&self) -> UploadGate {
		match &self.pipeline {
			Ok(_) => UploadGate::Enabled,
			Err(reason) => UploadGate::Disabled(*reason),
		}
	}

	/// Base URL used for deployed file names, always ending in `/`.
	pub fn base(&self) -> &str {
		&self.base
	}

	pub fn uploader_config(&self) -> &UploaderConfig {
		&self.config
	}
}

fn initial_base(config: &UploaderConfig) -> String {
	normalize_base(config.base().unwrap_or("/"))
}

#[async_trait]
impl BuildPlugin for SourcemapPlugin {
	fn name(&self) -> &'static str {
		Self::NAME
	}

	fn applies_to(&self, command: BuildCommand) -> bool {
		command == BuildCommand::Build
	}

	fn config(&self, user: &UserBuildConfig, mode: &str) -> BuildOverrides {
		let generate_maps = self.gate().is_enabled() && mode != "development";
		let sourcemap = user.sourcemap.unwrap_or(if generate_maps {
			SourcemapMode::Hidden
		} else {
			SourcemapMode::Disabled
		});

		let mut define = BTreeMap::new();
		define.insert(
			VERSION_DEFINE.to_string(),
			quote(self.config.version_id().as_str()),
		);
		define.insert(
			KEY_DEFINE.to_string(),
			quote(self.config.key().unwrap_or_default()),
		);

		BuildOverrides { define, sourcemap }
	}

	fn config_resolved(&mut self, resolved: &ResolvedBuildConfig) {
		let base = self.config.base().unwrap_or(&resolved.base);
		self.base = normalize_base(base);
	}

	async fn write_bundle(&self, output: &OutputOptions) -> UploadOutcome {
		let pipeline = match &self.pipeline {
			Ok(pipeline) => pipeline,
			Err(reason) => {
				info!(reason = %reason, "Skipping sourcemap upload");
				return UploadOutcome::Disabled(*reason);
			}
		};

		let output_dir = output.dir.clone().unwrap_or_default();
		pipeline.run(&output_dir, &self.base).await
	}
}

/// Quotes a value as a single-quoted JavaScript string literal.
fn quote(value: &str) -> String {
	format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
