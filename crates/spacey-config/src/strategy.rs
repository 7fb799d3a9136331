// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module execution strategies.

use crate::candidates;
use crate::error::ModuleLoadError;
use crate::host::ModuleHost;
use crate::legacy::{LEGACY_CONFIG_NAME, LegacyLoadOptions, LegacyLoader};
use crate::loader::ResolvedConfig;
use crate::service::TransformService;
use spacey_esm::Namespace;
use std::path::Path;
use tracing::{debug, trace};
use url::Url;

/// One way of turning a candidate path into module exports
pub enum Strategy<'a> {
    /// Dynamic import through the native host
    Native(&'a dyn ModuleHost),
    /// Execution through the open transformation service
    Transform(&'a mut dyn TransformService),
    /// The legacy loader plugin
    Legacy {
        /// Plugin
        loader: &'a dyn LegacyLoader,
        /// Project root, passed as the plugin's `cwd`
        root: &'a Path,
        /// Caller's must-exist flag, passed through
        must_exist: bool,
    },
}

impl Strategy<'_> {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Native(_) => "native",
            Strategy::Transform(_) => "transform",
            Strategy::Legacy { .. } => "legacy",
        }
    }

    /// Load `path` and return its exports.
    pub async fn attempt(&mut self, path: &Path) -> Result<Namespace, ModuleLoadError> {
        match self {
            Strategy::Native(host) => {
                let url = Url::from_file_path(path)
                    .map_err(|()| ModuleLoadError::InvalidPath(path.to_path_buf()))?;
                host.import(&url).await
            }
            Strategy::Transform(service) => service.execute(path).await,
            Strategy::Legacy {
                loader,
                root,
                must_exist,
            } => {
                let options = LegacyLoadOptions {
                    must_exist: *must_exist,
                    cwd: root.to_path_buf(),
                    file_path: Some(path.to_path_buf()),
                };
                // a plugin that found nothing did not load this candidate
                let value = loader
                    .load(LEGACY_CONFIG_NAME, &options)
                    .await?
                    .map(|resolved| resolved.value)
                    .ok_or_else(|| ModuleLoadError::NotFound(path.to_path_buf()))?;
                // shaped like a module so default-export normalization yields `value`
                let mut exports = Namespace::new();
                exports.insert("default".to_string(), serde_json::Value::Object(value));
                Ok(exports)
            }
        }
    }
}

/// Tries `names` under `root` in order; the first candidate that loads wins.
///
/// Failures only advance to the next candidate.
pub async fn try_load_with(
    root: &Path,
    names: &[&str],
    mut strategy: Strategy<'_>,
) -> Option<ResolvedConfig> {
    for path in candidates::resolve(root, names) {
        match strategy.attempt(&path).await {
            Ok(exports) => {
                debug!(strategy = strategy.name(), path = %path.display(), "Loaded config");
                return Some(ResolvedConfig::from_exports(exports, path));
            }
            Err(error) => {
                trace!(strategy = strategy.name(), path = %path.display(), %error, "Candidate skipped");
            }
        }
    }
    None
}
