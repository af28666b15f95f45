// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Flare sourcemap uploader.
//!
//! This crate holds the data model shared by the upload library and the CLI:
//! - [`Sourcemap`] records produced by discovery and consumed by the uploader
//! - [`UploaderConfig`], built and validated once per build invocation
//! - [`BuildEnvironment`], the environment gates that switch uploading off
//! - Base URL normalisation used to reconstruct deployed file names

pub mod config;
pub mod environment;
pub mod error;
pub mod sourcemap;

pub use config::{
	UploaderConfig, UploaderConfigBuilder, VersionId, DEFAULT_API_ENDPOINT, DEFAULT_MAX_CONCURRENCY,
};
pub use environment::{BuildEnvironment, DisabledReason, UploadGate};
pub use error::{ConfigError, Result};
pub use sourcemap::{normalize_base, original_file_for, Sourcemap, SOURCEMAP_EXTENSION};
