// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for configuration resolution

use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Result type for configuration resolution
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors surfaced to callers of [`crate::ConfigLoader::load`]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration was required but no candidate loaded
    #[error("Unable to find a config in {}", .root.display())]
    NotFound {
        /// Directory that was searched
        root: PathBuf,
    },

    /// The transformation service could not be created
    #[error("Failed to start the transformation service: {0}")]
    ServiceStart(#[source] ServiceError),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single candidate failed to load.
///
/// These never reach callers of the loader; they only advance resolution to
/// the next candidate.
#[derive(Debug, Error)]
pub enum ModuleLoadError {
    /// No file at the candidate path
    #[error("Cannot find module '{}'", .0.display())]
    NotFound(PathBuf),

    /// The module failed to parse, link or evaluate
    #[error("Failed to load {}: {source}", .path.display())]
    Evaluation {
        /// Module path
        path: PathBuf,
        /// Evaluator error
        source: spacey_esm::Error,
    },

    /// Reading the module failed for a reason other than absence
    #[error("Error reading {}: {source}", .path.display())]
    Io {
        /// Module path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Candidate path has no `file://` form
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Module URL is not a local file
    #[error("Unsupported module URL: {0}")]
    UnsupportedUrl(Url),

    /// Service used after `close`
    #[error("The transformation service is closed")]
    ServiceClosed,

    /// Legacy loader plugin failure
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Errors raised by the legacy loader plugin
#[derive(Debug, Error)]
pub enum PluginError {
    /// Nothing found while the caller required a configuration
    #[error("Unable to find a {name} config in {}", .cwd.display())]
    NotFound {
        /// Configuration name (`astro`)
        name: String,
        /// Directory searched
        cwd: PathBuf,
    },

    /// A configuration file was found but failed to evaluate
    #[error("Failed to load {}: {source}", .path.display())]
    Load {
        /// Configuration file
        path: PathBuf,
        /// Evaluator error
        source: spacey_esm::Error,
    },

    /// `package.json` could not be parsed
    #[error("Invalid package manifest {}: {source}", .path.display())]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Parse error
        source: serde_json::Error,
    },

    /// File system error
    #[error("Error reading {}: {source}", .path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

/// Transformation service lifecycle errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service could not start for this root
    #[error("Failed to start dev server in {}: {reason}", .root.display())]
    Start {
        /// Project root
        root: PathBuf,
        /// Reason for failure
        reason: String,
    },

    /// Shutdown failed
    #[error("Failed to close dev server: {0}")]
    Close(String),

    /// `close` was called on a service that is already closed
    #[error("The dev server is already closed")]
    Closed,
}
