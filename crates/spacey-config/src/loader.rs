// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Resolution orchestrator.
//!
//! Stages run strictly in order and stop at the first success:
//!
//! ```text
//! Native → Transform → Legacy → Done
//! ```
//!
//! | Stage | Candidates | Strategy |
//! |-------|------------|----------|
//! | Native | `astro.config.{mjs,js}` | [`ModuleHost`] import |
//! | Transform | `astro.config.{ts,mts,cts}` | [`TransformService`], created for this stage only |
//! | Legacy | `astro.config.{ts,mts,cts}` | [`LegacyLoader`] |
//!
//! [`TransformService`]: crate::service::TransformService

use crate::candidates::{NATIVE_CANDIDATES, TRANSFORM_CANDIDATES};
use crate::dev_server::DevServerFactory;
use crate::error::{ConfigError, Result};
use crate::host::{EsmHost, ModuleHost};
use crate::legacy::{CompatLoader, LegacyLoader};
use crate::service::{ServiceFactory, ServiceOptions, ServiceScope};
use crate::strategy::{Strategy, try_load_with};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use spacey_esm::Namespace;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Caller options for a resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadOptions {
    /// Fail with [`ConfigError::NotFound`] instead of returning an empty config
    pub must_exist: bool,
}

/// A resolved configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    /// The configuration object; empty when nothing was found
    pub value: Namespace,
    /// File the configuration came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl ResolvedConfig {
    pub(crate) fn from_exports(exports: Namespace, path: PathBuf) -> Self {
        Self {
            value: default_export(exports),
            file_path: Some(path),
        }
    }
}

/// The `default` export as a mapping; empty when absent or not an object.
pub(crate) fn default_export(mut exports: Namespace) -> Namespace {
    match exports.remove("default") {
        Some(serde_json::Value::Object(value)) => value,
        _ => Namespace::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Native,
    Transform,
    Legacy,
    Done,
}

/// Resolves a project's configuration
#[derive(Clone)]
pub struct ConfigLoader {
    host: Arc<dyn ModuleHost>,
    services: Arc<dyn ServiceFactory>,
    legacy: Arc<dyn LegacyLoader>,
    service_options: ServiceOptions,
}

impl ConfigLoader {
    /// Create a loader with the built-in collaborators
    pub fn new() -> Self {
        Self {
            host: Arc::new(EsmHost::new()),
            services: Arc::new(DevServerFactory),
            legacy: Arc::new(CompatLoader::new()),
            service_options: ServiceOptions::default(),
        }
    }

    /// Replace the native module host
    pub fn with_host(mut self, host: Arc<dyn ModuleHost>) -> Self {
        self.host = host;
        self
    }

    /// Replace the transformation service factory
    pub fn with_service_factory(mut self, services: Arc<dyn ServiceFactory>) -> Self {
        self.services = services;
        self
    }

    /// Replace the legacy loader plugin
    pub fn with_legacy_loader(mut self, legacy: Arc<dyn LegacyLoader>) -> Self {
        self.legacy = legacy;
        self
    }

    /// Options passed to the transformation service
    pub fn with_service_options(mut self, options: ServiceOptions) -> Self {
        self.service_options = options;
        self
    }

    /// Resolve the configuration under `root`.
    ///
    /// Relative roots are taken against the current directory. The only
    /// errors are [`ConfigError::NotFound`] (with `must_exist`) and a
    /// transformation service that fails to start.
    pub async fn load(&self, root: impl AsRef<Path>, options: LoadOptions) -> Result<ResolvedConfig> {
        let root = std::path::absolute(root.as_ref())?;

        let mut stage = Stage::Native;
        let mut resolved = None;
        while stage != Stage::Done {
            debug!(?stage, root = %root.display(), "Resolving config");
            let (outcome, next) = match stage {
                Stage::Native => (
                    try_load_with(&root, NATIVE_CANDIDATES, Strategy::Native(self.host.as_ref()))
                        .await,
                    Stage::Transform,
                ),
                Stage::Transform => (self.try_transform(&root).await?, Stage::Legacy),
                Stage::Legacy => (
                    try_load_with(
                        &root,
                        TRANSFORM_CANDIDATES,
                        Strategy::Legacy {
                            loader: self.legacy.as_ref(),
                            root: &root,
                            must_exist: options.must_exist,
                        },
                    )
                    .await,
                    Stage::Done,
                ),
                Stage::Done => break,
            };
            stage = if outcome.is_some() { Stage::Done } else { next };
            resolved = outcome;
        }

        match resolved {
            Some(config) => {
                if let Some(path) = &config.file_path {
                    info!(path = %path.display(), "Resolved config");
                }
                Ok(config)
            }
            None if options.must_exist => Err(ConfigError::NotFound { root }),
            None => {
                debug!(root = %root.display(), "No config found, using defaults");
                Ok(ResolvedConfig::default())
            }
        }
    }

    /// The Transform stage: the service lives exactly as long as this call.
    async fn try_transform(&self, root: &Path) -> Result<Option<ResolvedConfig>> {
        let mut scope = ServiceScope::open(self.services.as_ref(), root, &self.service_options)
            .await
            .map_err(ConfigError::ServiceStart)?;

        let outcome = match scope.service() {
            Some(service) => {
                AssertUnwindSafe(try_load_with(
                    root,
                    TRANSFORM_CANDIDATES,
                    Strategy::Transform(service),
                ))
                .catch_unwind()
                .await
            }
            None => Ok(None),
        };

        scope.close().await;
        match outcome {
            Ok(resolved) => Ok(resolved),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve the configuration under `root` with the built-in collaborators.
pub async fn load_configuration(
    root: impl AsRef<Path>,
    options: LoadOptions,
) -> Result<ResolvedConfig> {
    ConfigLoader::new().load(root, options).await
}
