// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! In-process dev server used as the transformation service.
//!
//! Modules are executed with TypeScript erased at parse time. Packages are
//! never transformed: every bare import that is installed becomes an external
//! reference, so [`ServiceOptions::ssr_external`] adds nothing beyond the
//! `node_modules` lookup all packages go through.

use crate::error::{ModuleLoadError, ServiceError};
use crate::host::{read_module, run_module};
use crate::resolver::ModuleResolver;
use crate::service::{ServiceFactory, ServiceOptions, TransformService};
use async_trait::async_trait;
use spacey_esm::{Dialect, Namespace};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Starts a [`DevServer`] per resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct DevServerFactory;

#[async_trait]
impl ServiceFactory for DevServerFactory {
    async fn create(
        &self,
        root: &Path,
        options: &ServiceOptions,
    ) -> Result<Box<dyn TransformService>, ServiceError> {
        match tokio::fs::metadata(root).await {
            Ok(metadata) if !metadata.is_dir() => {
                return Err(ServiceError::Start {
                    root: root.to_path_buf(),
                    reason: "root is not a directory".to_string(),
                });
            }
            Err(error) if error.kind() != ErrorKind::NotFound => {
                return Err(ServiceError::Start {
                    root: root.to_path_buf(),
                    reason: error.to_string(),
                });
            }
            _ => {}
        }
        debug!(root = %root.display(), externals = ?options.ssr_external, "Starting dev server");
        Ok(Box::new(DevServer::new(root)))
    }
}

/// A dev server handle
pub struct DevServer {
    root: PathBuf,
    resolver: ModuleResolver,
    /// Every module executed through this handle
    graph: HashSet<PathBuf>,
    closed: bool,
}

impl DevServer {
    /// Create a server for `root`
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            resolver: ModuleResolver::transform(),
            graph: HashSet::new(),
            closed: false,
        }
    }
}

#[async_trait]
impl TransformService for DevServer {
    async fn execute(&mut self, path: &Path) -> Result<Namespace, ModuleLoadError> {
        if self.closed {
            return Err(ModuleLoadError::ServiceClosed);
        }

        let source = read_module(path).await?;
        let (exports, loaded) = run_module(&self.resolver, path, source, Dialect::TypeScript)
            .await
            .map_err(|source| ModuleLoadError::Evaluation {
                path: path.to_path_buf(),
                source,
            })?;

        self.graph.extend(loaded);
        debug!(path = %path.display(), modules = self.graph.len(), "Executed module");
        Ok(exports)
    }

    async fn close(&mut self) -> Result<(), ServiceError> {
        if self.closed {
            return Err(ServiceError::Closed);
        }
        self.closed = true;
        debug!(root = %self.root.display(), modules = self.graph.len(), "Dev server closed");
        self.graph.clear();
        Ok(())
    }
}
