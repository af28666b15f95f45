// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the Flare sourcemap uploader.
//!
//! Every outbound request goes through a client built here so the
//! User-Agent header stays consistent across crates.

mod client;

pub use client::{builder, user_agent};
