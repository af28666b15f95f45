// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Post-build sourcemap upload to Flare.
//!
//! After a bundler writes its output, the pipeline pairs every `*.map` file
//! with the artifact it describes, uploads the pairs to Flare and optionally
//! deletes the local maps so they never ship.
//!
//! # Pipeline
//!
//! 1. **Discover**: walk the output directory and pair maps with artifacts
//! 2. **Dispatch**: upload the pairs in groups bounded by the concurrency ceiling
//! 3. **Clean up**: remove the local map files when configured to
//!
//! Nothing in the pipeline fails the host build. Every failure ends in a log
//! line and is reported through [`UploadOutcome`].

pub mod cleanup;
pub mod client;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod payload;
pub mod pipeline;
pub mod plugin;

pub use cleanup::{remove_sourcemaps, CleanupReport};
pub use client::{SourcemapClient, UploadResponse, Uploader};
pub use discovery::{discover, Discovery, SkipReason, SkippedSourcemap};
pub use dispatch::{BatchDispatcher, DispatchReport};
pub use error::{DispatchError, Result, UploadError};
pub use payload::{encode_sourcemap, UploadRequest};
pub use pipeline::{UploadOutcome, UploadPipeline, UploadSummary};
pub use plugin::{
	BuildCommand, BuildOverrides, BuildPlugin, OutputOptions, ResolvedBuildConfig, SourcemapMode,
	SourcemapPlugin, UserBuildConfig,
};
