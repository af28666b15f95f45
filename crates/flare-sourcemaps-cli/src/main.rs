// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! `flare-sourcemaps`: uploads a build's sourcemaps to Flare.
//!
//! The binary plays the part of the bundler host: it drives the plugin hooks
//! around a build and never turns an upload problem into a failing exit code.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use flare_sourcemaps::plugin::{KEY_DEFINE, VERSION_DEFINE};
use flare_sourcemaps::{
	BuildCommand, BuildPlugin, OutputOptions, ResolvedBuildConfig, SourcemapMode, SourcemapPlugin,
	UserBuildConfig,
};
use flare_sourcemaps_core::BuildEnvironment;
use tracing::{debug, error, info};

mod config;
mod logging;

use config::ConfigArgs;

/// Environment variable carrying the chosen sourcemap mode to a wrapped build.
const SOURCEMAP_MODE_ENV: &str = "FLARE_SOURCEMAP_MODE";

/// Base the host uses when none is configured.
const DEFAULT_BASE: &str = "/";

/// Upload build sourcemaps to Flare.
#[derive(Parser, Debug)]
#[command(name = "flare-sourcemaps", about = "Upload build sourcemaps to Flare", version)]
struct Args {
	/// Log level used when RUST_LOG is not set
	#[arg(long, global = true, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Upload the sourcemaps of a finished build
	Upload(UploadArgs),
	/// Print the sourcemap setting and constants the bundler should apply
	Defines(DefinesArgs),
	/// Run a build command, then upload its sourcemaps
	Run(RunArgs),
	/// Show version information
	Version,
}

#[derive(ClapArgs, Debug)]
struct UploadArgs {
	/// Build output directory
	#[arg(long, default_value = "dist")]
	out_dir: PathBuf,

	#[command(flatten)]
	config: ConfigArgs,
}

#[derive(ClapArgs, Debug)]
struct DefinesArgs {
	/// Build mode reported by the bundler
	#[arg(long, default_value = "production")]
	mode: String,

	/// Sourcemap setting already chosen by the project (true, false, inline, hidden)
	#[arg(long)]
	sourcemap: Option<SourcemapMode>,

	#[command(flatten)]
	config: ConfigArgs,
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
	/// Build output directory
	#[arg(long, default_value = "dist")]
	out_dir: PathBuf,

	/// Build mode reported by the bundler
	#[arg(long, default_value = "production")]
	mode: String,

	/// Sourcemap setting already chosen by the project (true, false, inline, hidden)
	#[arg(long)]
	sourcemap: Option<SourcemapMode>,

	/// The wrapped command is a dev server rather than a production build
	#[arg(long)]
	serve: bool,

	#[command(flatten)]
	config: ConfigArgs,

	/// Build command and its arguments
	#[arg(last = true, required = true)]
	build: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();
	logging::init(&args.log_level);

	match args.command {
		Command::Version => {
			println!("flare-sourcemaps {}", env!("CARGO_PKG_VERSION"));
		}
		Command::Upload(upload) => {
			if let Some(plugin) = build_plugin(&upload.config, BuildCommand::Build) {
				write_bundle(&plugin, upload.out_dir).await;
			}
		}
		Command::Defines(defines) => {
			let config = config::load(&defines.config).context("invalid configuration")?;
			let plugin = SourcemapPlugin::new(config, &BuildEnvironment::from_env())
				.context("failed to create upload client")?;
			let user = UserBuildConfig {
				sourcemap: defines.sourcemap,
			};
			let overrides = plugin.config(&user, &defines.mode);
			println!("{}", serde_json::to_string_pretty(&overrides)?);
		}
		Command::Run(run_args) => {
			let code = run(run_args).await?;
			if code != 0 {
				std::process::exit(code);
			}
		}
	}

	Ok(())
}

/// Builds the plugin for `command`, logging instead of failing when that is
/// impossible. Returns `None` when the plugin does not take part in `command`.
fn build_plugin(args: &ConfigArgs, command: BuildCommand) -> Option<SourcemapPlugin> {
	let config = match config::load(args) {
		Ok(config) => config,
		Err(e) => {
			error!(error = %e, "Invalid sourcemap upload configuration, not uploading");
			return None;
		}
	};

	match SourcemapPlugin::new(config, &BuildEnvironment::from_env()) {
		Ok(plugin) if !plugin.applies_to(command) => {
			debug!(plugin = plugin.name(), ?command, "Plugin does not apply to this command");
			None
		}
		Ok(mut plugin) => {
			plugin.config_resolved(&ResolvedBuildConfig {
				base: DEFAULT_BASE.to_string(),
			});
			Some(plugin)
		}
		Err(e) => {
			error!(error = %e, "Failed to create upload client, not uploading");
			None
		}
	}
}

async fn write_bundle(plugin: &SourcemapPlugin, out_dir: PathBuf) {
	let outcome = plugin
		.write_bundle(&OutputOptions { dir: Some(out_dir) })
		.await;
	debug!(success = outcome.is_success(), "Upload pass finished");
}

/// Runs the wrapped build with the plugin's constants in its environment and
/// uploads afterwards. Returns the exit code to use.
async fn run(args: RunArgs) -> anyhow::Result<i32> {
	let command_kind = if args.serve {
		BuildCommand::Serve
	} else {
		BuildCommand::Build
	};
	let plugin = build_plugin(&args.config, command_kind);

	let (program, rest) = args
		.build
		.split_first()
		.context("no build command given")?;
	let mut command = tokio::process::Command::new(program);
	command.args(rest);

	if let Some(plugin) = &plugin {
		let user = UserBuildConfig {
			sourcemap: args.sourcemap,
		};
		let overrides = plugin.config(&user, &args.mode);
		let config = plugin.uploader_config();
		command
			.env(VERSION_DEFINE, config.version_id().as_str())
			.env(KEY_DEFINE, config.key().unwrap_or_default())
			.env(SOURCEMAP_MODE_ENV, overrides.sourcemap.to_string());
		info!(
			version_id = %config.version_id(),
			sourcemap = %overrides.sourcemap,
			"Running build"
		);
	}

	let status = command
		.status()
		.await
		.with_context(|| format!("failed to start build command {program}"))?;

	if !status.success() {
		error!(status = %status, "Build command failed, not uploading sourcemaps");
		return Ok(status.code().unwrap_or(1));
	}

	if let Some(plugin) = &plugin {
		write_bundle(plugin, args.out_dir).await;
	}
	Ok(0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn test_cli_definition_is_valid() {
		Args::command().debug_assert();
	}

	#[test]
	fn test_upload_defaults() {
		let args = Args::try_parse_from(["flare-sourcemaps", "upload"]).unwrap();
		let Command::Upload(upload) = args.command else {
			panic!("expected upload command");
		};
		assert_eq!(upload.out_dir, PathBuf::from("dist"));
		assert!(!upload.config.remove_sourcemaps);
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_upload_flags() {
		let args = Args::try_parse_from([
			"flare-sourcemaps",
			"upload",
			"--out-dir",
			"build",
			"--base",
			"/static/",
			"--remove-sourcemaps",
			"--concurrency",
			"4",
		])
		.unwrap();
		let Command::Upload(upload) = args.command else {
			panic!("expected upload command");
		};
		assert_eq!(upload.out_dir, PathBuf::from("build"));
		assert_eq!(upload.config.base.as_deref(), Some("/static/"));
		assert!(upload.config.remove_sourcemaps);
		assert_eq!(upload.config.concurrency, Some(4));
	}

	#[test]
	fn test_defines_parses_sourcemap_mode() {
		let args =
			Args::try_parse_from(["flare-sourcemaps", "defines", "--sourcemap", "inline"]).unwrap();
		let Command::Defines(defines) = args.command else {
			panic!("expected defines command");
		};
		assert_eq!(defines.sourcemap, Some(SourcemapMode::Inline));
		assert_eq!(defines.mode, "production");
	}

	#[test]
	fn test_run_requires_build_command() {
		assert!(Args::try_parse_from(["flare-sourcemaps", "run"]).is_err());

		let args =
			Args::try_parse_from(["flare-sourcemaps", "run", "--", "npm", "run", "build"]).unwrap();
		let Command::Run(run) = args.command else {
			panic!("expected run command");
		};
		assert_eq!(run.build, vec!["npm", "run", "build"]);
		assert!(!run.serve);
	}

	#[test]
	fn test_run_serve_flag() {
		let args =
			Args::try_parse_from(["flare-sourcemaps", "run", "--serve", "--", "vite"]).unwrap();
		let Command::Run(run) = args.command else {
			panic!("expected run command");
		};
		assert!(run.serve);
		assert_eq!(run.build, vec!["vite"]);
	}

	#[test]
	fn test_plugin_skipped_for_dev_server() {
		let args = ConfigArgs::default();
		assert!(build_plugin(&args, BuildCommand::Serve).is_none());
		assert!(build_plugin(&args, BuildCommand::Build).is_some());
	}
}
