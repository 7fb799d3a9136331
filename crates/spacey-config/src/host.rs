// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native module host: dynamic `import()` of plain script modules.

use crate::error::ModuleLoadError;
use crate::resolver::ModuleResolver;
use async_trait::async_trait;
use spacey_esm::{Dialect, Evaluator, Namespace};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Loads a module by URL and returns its exports.
#[async_trait]
pub trait ModuleHost: Send + Sync {
    /// Import the module at `url`.
    async fn import(&self, url: &Url) -> Result<Namespace, ModuleLoadError>;
}

/// [`ModuleHost`] evaluating JavaScript modules from disk
#[derive(Debug, Clone)]
pub struct EsmHost {
    resolver: ModuleResolver,
}

impl EsmHost {
    /// Create a host with the native resolver
    pub fn new() -> Self {
        Self {
            resolver: ModuleResolver::native(),
        }
    }
}

impl Default for EsmHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModuleHost for EsmHost {
    async fn import(&self, url: &Url) -> Result<Namespace, ModuleLoadError> {
        let path = url
            .to_file_path()
            .map_err(|()| ModuleLoadError::UnsupportedUrl(url.clone()))?;
        let source = read_module(&path).await?;
        let (exports, loaded) = run_module(&self.resolver, &path, source, Dialect::JavaScript)
            .await
            .map_err(|source| ModuleLoadError::Evaluation {
                path: path.clone(),
                source,
            })?;
        debug!(%url, modules = loaded.len(), "Imported module");
        Ok(exports)
    }
}

/// Read a module's source, mapping absence to [`ModuleLoadError::NotFound`].
pub(crate) async fn read_module(path: &Path) -> Result<String, ModuleLoadError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ModuleLoadError::NotFound(path.to_path_buf())
        } else {
            ModuleLoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Evaluate one entry module on the blocking pool; returns its exports and
/// every module it loaded.
///
/// Nested imports are read with blocking file system calls, and the
/// evaluator's values never leave the thread it runs on.
pub(crate) async fn run_module(
    resolver: &ModuleResolver,
    path: &Path,
    source: String,
    dialect: Dialect,
) -> spacey_esm::Result<(Namespace, Vec<PathBuf>)> {
    let resolver = resolver.clone();
    let path = path.to_path_buf();
    let task = tokio::task::spawn_blocking(move || -> spacey_esm::Result<(Namespace, Vec<PathBuf>)> {
        let mut evaluator = Evaluator::new(&resolver);
        let exports = evaluator.evaluate(&path, &source, dialect)?;
        let loaded = evaluator.loaded_modules().map(Path::to_path_buf).collect();
        Ok((exports, loaded))
    });
    match task.await {
        Ok(result) => result,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        Err(error) => Err(std::io::Error::from(error).into()),
    }
}
