// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Legacy loader plugin.
//!
//! Older projects were resolved by a generic `<name>.config.*` loader that
//! also understood a `package.json` key. It is kept as the last resort.

use crate::error::PluginError;
use crate::host::run_module;
use crate::loader::default_export;
use crate::resolver::ModuleResolver;
use async_trait::async_trait;
use spacey_esm::{Dialect, Namespace};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name the legacy loader is asked for.
pub const LEGACY_CONFIG_NAME: &str = "astro";

/// Extensions searched when no explicit file is given, in priority order.
const SEARCH_EXTENSIONS: &[&str] = &["mjs", "js", "cjs", "ts", "mts", "cts"];

/// Options for a legacy load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyLoadOptions {
    /// Fail with [`PluginError::NotFound`] instead of returning `None`
    pub must_exist: bool,
    /// Directory to search
    pub cwd: PathBuf,
    /// Explicit configuration file; skips the search
    pub file_path: Option<PathBuf>,
}

/// A configuration found by the legacy loader
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyResolved {
    /// File the value came from
    pub file_path: PathBuf,
    /// The configuration value
    pub value: Namespace,
}

/// The legacy loader plugin.
#[async_trait]
pub trait LegacyLoader: Send + Sync {
    /// Load the configuration called `name`.
    async fn load(
        &self,
        name: &str,
        options: &LegacyLoadOptions,
    ) -> Result<Option<LegacyResolved>, PluginError>;
}

/// Built-in [`LegacyLoader`]
#[derive(Debug, Clone)]
pub struct CompatLoader {
    resolver: ModuleResolver,
}

impl CompatLoader {
    /// Create a loader; packages must be installed to be imported.
    pub fn new() -> Self {
        Self {
            resolver: ModuleResolver::transform(),
        }
    }

    /// Looks for `<name>.config.*` in `cwd`, then the `<name>` key of its
    /// `package.json`.
    ///
    /// Part of the plugin's own contract for callers that pass no
    /// `file_path`. The loader in this crate always names the file, so it
    /// never gets here.
    async fn search(&self, name: &str, cwd: &Path) -> Result<Option<LegacyResolved>, PluginError> {
        for ext in SEARCH_EXTENSIONS {
            let path = cwd.join(format!("{}.config.{}", name, ext));
            if let Some(source) = read_optional(&path).await? {
                return self.evaluate(path, source).await.map(Some);
            }
        }

        let manifest = cwd.join("package.json");
        let Some(text) = read_optional(&manifest).await? else {
            return Ok(None);
        };
        let package: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| PluginError::Manifest {
                path: manifest.clone(),
                source,
            })?;
        Ok(match package.get(name) {
            Some(serde_json::Value::Object(value)) => Some(LegacyResolved {
                file_path: manifest,
                value: value.clone(),
            }),
            _ => None,
        })
    }

    async fn evaluate(&self, path: PathBuf, source: String) -> Result<LegacyResolved, PluginError> {
        match run_module(&self.resolver, &path, source, Dialect::TypeScript).await {
            Ok((exports, _)) => Ok(LegacyResolved {
                value: default_export(exports),
                file_path: path,
            }),
            Err(source) => Err(PluginError::Load { path, source }),
        }
    }
}

impl Default for CompatLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LegacyLoader for CompatLoader {
    async fn load(
        &self,
        name: &str,
        options: &LegacyLoadOptions,
    ) -> Result<Option<LegacyResolved>, PluginError> {
        let found = match &options.file_path {
            Some(path) => match read_optional(path).await? {
                Some(source) => Some(self.evaluate(path.clone(), source).await?),
                None => None,
            },
            None => self.search(name, &options.cwd).await?,
        };

        match found {
            Some(resolved) => {
                debug!(name, path = %resolved.file_path.display(), "Legacy loader resolved config");
                Ok(Some(resolved))
            }
            None if options.must_exist => Err(PluginError::NotFound {
                name: name.to_string(),
                cwd: options.cwd.clone(),
            }),
            None => Ok(None),
        }
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, PluginError> {
    match tokio::fs::read_to_string(path).await {
        Ok(source) => Ok(Some(source)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PluginError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn options(cwd: &Path, must_exist: bool) -> LegacyLoadOptions {
        LegacyLoadOptions {
            must_exist,
            cwd: cwd.to_path_buf(),
            file_path: None,
        }
    }

    #[tokio::test]
    async fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("astro.config.ts");
        fs::write(&path, "const port: number = 3000;\nexport default { server: { port } };").unwrap();

        let resolved = CompatLoader::new()
            .load(
                LEGACY_CONFIG_NAME,
                &LegacyLoadOptions {
                    file_path: Some(path.clone()),
                    ..options(dir.path(), true)
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.file_path, path);
        assert_eq!(serde_json::Value::Object(resolved.value), json!({ "server": { "port": 3000 } }));
    }

    #[tokio::test]
    async fn test_search_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("astro.config.cjs"), "export default { from: 'cjs' };").unwrap();
        fs::write(dir.path().join("astro.config.mts"), "export default { from: 'mts' };").unwrap();

        let resolved = CompatLoader::new()
            .load(LEGACY_CONFIG_NAME, &options(dir.path(), false))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value["from"], "cjs");
    }

    #[tokio::test]
    async fn test_package_json_key() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "site", "astro": { "site": "https://x" } }"#,
        )
        .unwrap();

        let resolved = CompatLoader::new()
            .load(LEGACY_CONFIG_NAME, &options(dir.path(), true))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.file_path, dir.path().join("package.json"));
        assert_eq!(resolved.value["site"], "https://x");
    }

    #[tokio::test]
    async fn test_missing_config() {
        let dir = tempfile::tempdir().unwrap();
        let loader = CompatLoader::new();

        assert!(loader
            .load(LEGACY_CONFIG_NAME, &options(dir.path(), false))
            .await
            .unwrap()
            .is_none());
        let err = loader
            .load(LEGACY_CONFIG_NAME, &options(dir.path(), true))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::NotFound { ref name, .. } if name == "astro"));
    }

    #[tokio::test]
    async fn test_module_without_default_export() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("astro.config.mjs"), "export const site = 'https://x';").unwrap();

        let resolved = CompatLoader::new()
            .load(LEGACY_CONFIG_NAME, &options(dir.path(), true))
            .await
            .unwrap()
            .unwrap();
        assert!(resolved.value.is_empty());
    }

    #[tokio::test]
    async fn test_evaluation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("astro.config.ts");
        fs::write(&path, "throw new Error('broken');").unwrap();

        let err = CompatLoader::new()
            .load(
                LEGACY_CONFIG_NAME,
                &LegacyLoadOptions {
                    file_path: Some(path),
                    ..options(dir.path(), false)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PluginError::Load { .. }));
    }
}
