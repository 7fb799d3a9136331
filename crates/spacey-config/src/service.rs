// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Transformation service seam and its lifecycle.
//!
//! The service is created right before the Transform stage and closed before
//! the loader moves on. [`ServiceScope`] owns the handle for that window.

use crate::error::{ModuleLoadError, ServiceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use spacey_esm::Namespace;
use std::path::Path;
use tracing::{debug, warn};

/// Options the transformation service is created with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceOptions {
    /// Hot module replacement; off, there is no interactive session
    pub hmr: bool,
    /// Clear the terminal on start
    pub clear_screen: bool,
    /// Run without an HTTP listener
    pub middleware_mode: bool,
    /// Dependency pre-bundling entries
    pub optimize_entries: Vec<String>,
    /// Packages resolved externally instead of transformed
    pub ssr_external: Vec<String>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            hmr: false,
            clear_screen: false,
            middleware_mode: true,
            optimize_entries: Vec::new(),
            ssr_external: vec![
                "@astrojs/tailwind".to_string(),
                "@astrojs/mdx".to_string(),
                "@astrojs/react".to_string(),
            ],
        }
    }
}

/// An ephemeral service that executes modules needing transformation.
#[async_trait]
pub trait TransformService: Send {
    /// Load, transform and execute the module at `path`.
    async fn execute(&mut self, path: &Path) -> Result<Namespace, ModuleLoadError>;

    /// Release the service. Called exactly once per handle.
    async fn close(&mut self) -> Result<(), ServiceError>;
}

/// Creates transformation services.
#[async_trait]
pub trait ServiceFactory: Send + Sync {
    /// Start a service rooted at `root`.
    async fn create(
        &self,
        root: &Path,
        options: &ServiceOptions,
    ) -> Result<Box<dyn TransformService>, ServiceError>;
}

/// Owns a transformation service until [`ServiceScope::close`].
///
/// A scope dropped without `close` (a cancelled load) hands the service to
/// the current runtime to be closed in the background.
pub struct ServiceScope {
    service: Option<Box<dyn TransformService>>,
}

impl ServiceScope {
    /// Create a service through `factory`.
    pub async fn open(
        factory: &dyn ServiceFactory,
        root: &Path,
        options: &ServiceOptions,
    ) -> Result<Self, ServiceError> {
        let service = factory.create(root, options).await?;
        debug!(root = %root.display(), "Transformation service started");
        Ok(Self {
            service: Some(service),
        })
    }

    /// The open service; `None` once closed.
    pub fn service(&mut self) -> Option<&mut (dyn TransformService + 'static)> {
        self.service.as_deref_mut()
    }

    /// Close the service. Close failures are logged, not returned.
    pub async fn close(mut self) {
        if let Some(service) = self.service.take() {
            shutdown(service).await;
        }
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        let Some(service) = self.service.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(shutdown(service));
            }
            Err(_) => warn!("Transformation service dropped outside a runtime; not closed"),
        }
    }
}

async fn shutdown(mut service: Box<dyn TransformService>) {
    match service.close().await {
        Ok(()) => debug!("Transformation service closed"),
        Err(error) => warn!(%error, "Failed to close transformation service"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl TransformService for Counting {
        async fn execute(&mut self, path: &Path) -> Result<Namespace, ModuleLoadError> {
            Err(ModuleLoadError::NotFound(path.to_path_buf()))
        }

        async fn close(&mut self) -> Result<(), ServiceError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                Err(ServiceError::Close("socket busy".into()))
            } else {
                Ok(())
            }
        }
    }

    struct Factory {
        closes: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl ServiceFactory for Factory {
        async fn create(
            &self,
            _root: &Path,
            _options: &ServiceOptions,
        ) -> Result<Box<dyn TransformService>, ServiceError> {
            Ok(Box::new(Counting {
                closes: self.closes.clone(),
                fail_close: self.fail_close,
            }))
        }
    }

    fn factory(fail_close: bool) -> (Factory, Arc<AtomicUsize>) {
        let closes = Arc::new(AtomicUsize::new(0));
        (
            Factory {
                closes: closes.clone(),
                fail_close,
            },
            closes,
        )
    }

    #[test]
    fn test_default_options() {
        let options = ServiceOptions::default();
        assert!(!options.hmr);
        assert!(!options.clear_screen);
        assert!(options.middleware_mode);
        assert!(options.optimize_entries.is_empty());
        assert_eq!(
            options.ssr_external,
            vec!["@astrojs/tailwind", "@astrojs/mdx", "@astrojs/react"]
        );
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: ServiceOptions =
            serde_json::from_str(r#"{ "clearScreen": true, "ssrExternal": [] }"#).unwrap();
        assert!(options.clear_screen);
        assert!(options.ssr_external.is_empty());
        assert!(options.middleware_mode);
    }

    #[tokio::test]
    async fn test_close_runs_once() {
        let (factory, closes) = factory(false);
        let mut scope = ServiceScope::open(&factory, Path::new("/p"), &ServiceOptions::default())
            .await
            .unwrap();
        assert!(scope.service().is_some());
        scope.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_failure_is_swallowed() {
        let (factory, closes) = factory(true);
        let scope = ServiceScope::open(&factory, Path::new("/p"), &ServiceOptions::default())
            .await
            .unwrap();
        scope.close().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_scope_closes_in_background() {
        let (factory, closes) = factory(false);
        let scope = ServiceScope::open(&factory, Path::new("/p"), &ServiceOptions::default())
            .await
            .unwrap();
        drop(scope);
        for _ in 0..10 {
            if closes.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
