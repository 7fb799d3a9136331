// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-config
//!
//! Resolves an Astro project's configuration from its root directory.
//!
//! Three strategies are tried in a fixed order, each over its own candidate
//! file names, and the first module that loads wins:
//!
//! 1. **Native**: `astro.config.mjs`, `astro.config.js` imported directly
//! 2. **Transform**: `astro.config.ts`, `.mts`, `.cts` executed by an
//!    ephemeral dev server that erases TypeScript
//! 3. **Legacy**: the same TypeScript candidates through the legacy loader
//!
//! A candidate that is missing, fails to parse or throws is skipped. When
//! nothing loads, the result is an empty configuration, or
//! [`ConfigError::NotFound`] if the caller required one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spacey_config::{LoadOptions, load_configuration};
//!
//! # async fn run() -> spacey_config::Result<()> {
//! let config = load_configuration("/path/to/site", LoadOptions { must_exist: true }).await?;
//! println!("{:?}: {}", config.file_path, serde_json::Value::Object(config.value));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidates;
pub mod dev_server;
pub mod error;
pub mod host;
pub mod legacy;
pub mod loader;
pub mod resolver;
pub mod service;
pub mod strategy;

pub use dev_server::{DevServer, DevServerFactory};
pub use error::{ConfigError, ModuleLoadError, PluginError, Result, ServiceError};
pub use host::{EsmHost, ModuleHost};
pub use legacy::{CompatLoader, LegacyLoadOptions, LegacyLoader, LegacyResolved};
pub use loader::{ConfigLoader, LoadOptions, ResolvedConfig, load_configuration};
pub use service::{ServiceFactory, ServiceOptions, ServiceScope, TransformService};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
