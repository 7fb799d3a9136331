// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Import resolution for configuration modules (Node.js algorithm, trimmed
//! to what configuration files need).
//!
//! Relative imports resolve to files that are evaluated. Packages are never
//! evaluated: they become external references, provided they are installed.

use spacey_esm::{Dialect, Error, ImportHost, Resolution, Result};
use std::path::{Component, Path, PathBuf};

/// Node.js built-in modules; imported names stay external.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "buffer",
    "child_process",
    "crypto",
    "events",
    "fs",
    "fs/promises",
    "module",
    "os",
    "path",
    "process",
    "url",
    "util",
];

/// Resolves imports made by configuration modules
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Whether TypeScript modules may be imported
    typescript: bool,
    /// Extensions tried for extensionless relative imports
    extensions: &'static [&'static str],
}

impl ModuleResolver {
    /// Resolver for the native host: JavaScript and JSON only.
    pub fn native() -> Self {
        Self {
            typescript: false,
            extensions: &[".mjs", ".js", ".json"],
        }
    }

    /// Resolver for the transformation service.
    pub fn transform() -> Self {
        Self {
            typescript: true,
            extensions: &[".ts", ".mts", ".cts", ".mjs", ".js", ".json"],
        }
    }

    /// Check if a specifier names a Node.js built-in
    pub fn is_builtin(&self, specifier: &str) -> bool {
        specifier.starts_with("node:") || NODE_BUILTINS.contains(&specifier)
    }

    fn resolve_file(&self, specifier: &str, importer: &Path) -> Result<Resolution> {
        let parent = importer.parent().unwrap_or(Path::new("/"));
        let path = normalize(&parent.join(specifier));

        if path.is_file() {
            return self.categorize(specifier, path);
        }

        for ext in self.extensions {
            let mut with_ext = path.clone().into_os_string();
            with_ext.push(ext);
            let with_ext = PathBuf::from(with_ext);
            if with_ext.is_file() {
                return self.categorize(specifier, with_ext);
            }
        }

        if path.is_dir() {
            for ext in self.extensions {
                let index = path.join(format!("index{}", ext));
                if index.is_file() {
                    return self.categorize(specifier, index);
                }
            }
        }

        Err(Error::module_not_found(specifier, importer))
    }

    fn categorize(&self, specifier: &str, path: PathBuf) -> Result<Resolution> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Resolution::Json(path)),
            Some("mjs" | "js" | "cjs") => Ok(Resolution::Module {
                path,
                dialect: Dialect::JavaScript,
            }),
            Some("ts" | "mts" | "cts") if self.typescript => Ok(Resolution::Module {
                path,
                dialect: Dialect::TypeScript,
            }),
            Some("ts" | "mts" | "cts") => Err(Error::ModuleResolution {
                module: specifier.to_string(),
                reason: "TypeScript modules need the transformation service".to_string(),
            }),
            _ => Err(Error::ModuleResolution {
                module: specifier.to_string(),
                reason: format!("Unknown file extension for {}", path.display()),
            }),
        }
    }

    /// Finds `node_modules/<package>` walking up from the importer.
    fn find_package(&self, package: &str, importer: &Path) -> Option<PathBuf> {
        importer
            .ancestors()
            .skip(1)
            .map(|dir| dir.join("node_modules").join(package))
            .find(|dir| dir.join("package.json").is_file())
    }
}

impl ImportHost for ModuleResolver {
    fn resolve(&self, specifier: &str, importer: &Path) -> Result<Resolution> {
        if self.is_builtin(specifier) {
            return Ok(Resolution::External(specifier.to_string()));
        }

        if specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier.starts_with('/')
        {
            return self.resolve_file(specifier, importer);
        }

        let (package, _subpath) = parse_package_specifier(specifier);
        if self.find_package(package, importer).is_some() {
            return Ok(Resolution::External(specifier.to_string()));
        }

        Err(Error::module_not_found(specifier, importer))
    }
}

/// Split a package specifier into name and optional subpath
fn parse_package_specifier(specifier: &str) -> (&str, Option<&str>) {
    let name_end = if specifier.starts_with('@') {
        // @scope/name/subpath
        specifier
            .match_indices('/')
            .nth(1)
            .map(|(i, _)| i)
    } else {
        specifier.find('/')
    };
    match name_end {
        Some(end) => (&specifier[..end], Some(&specifier[end + 1..])),
        None => (specifier, None),
    }
}

/// Lexically removes `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_package_specifier() {
        assert_eq!(parse_package_specifier("lodash"), ("lodash", None));
        assert_eq!(parse_package_specifier("lodash/get"), ("lodash", Some("get")));
        assert_eq!(parse_package_specifier("@astrojs/mdx"), ("@astrojs/mdx", None));
        assert_eq!(
            parse_package_specifier("@astrojs/starlight/schema"),
            ("@astrojs/starlight", Some("schema"))
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/p/sub/../a.mjs")), PathBuf::from("/p/a.mjs"));
        assert_eq!(normalize(Path::new("/p/./a.mjs")), PathBuf::from("/p/a.mjs"));
    }

    #[test]
    fn test_builtins_are_external() {
        let resolver = ModuleResolver::native();
        let importer = Path::new("/p/astro.config.mjs");
        assert_eq!(
            resolver.resolve("node:path", importer).unwrap(),
            Resolution::External("node:path".into())
        );
        assert_eq!(
            resolver.resolve("fs", importer).unwrap(),
            Resolution::External("fs".into())
        );
    }

    #[test]
    fn test_relative_resolution_with_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shared.mjs"), "export default {}").unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/index.js"), "export default {}").unwrap();
        fs::write(dir.path().join("site.json"), "{}").unwrap();
        let importer = dir.path().join("astro.config.mjs");
        let resolver = ModuleResolver::native();

        assert_eq!(
            resolver.resolve("./shared", &importer).unwrap(),
            Resolution::Module {
                path: dir.path().join("shared.mjs"),
                dialect: Dialect::JavaScript
            }
        );
        assert_eq!(
            resolver.resolve("./lib", &importer).unwrap(),
            Resolution::Module {
                path: dir.path().join("lib/index.js"),
                dialect: Dialect::JavaScript
            }
        );
        assert_eq!(
            resolver.resolve("./site.json", &importer).unwrap(),
            Resolution::Json(dir.path().join("site.json"))
        );
        assert!(matches!(
            resolver.resolve("./missing", &importer),
            Err(Error::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_typescript_needs_transform_resolver() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shared.ts"), "export default {}").unwrap();
        let importer = dir.path().join("astro.config.mjs");

        assert!(matches!(
            ModuleResolver::native().resolve("./shared.ts", &importer),
            Err(Error::ModuleResolution { .. })
        ));
        assert_eq!(
            ModuleResolver::transform().resolve("./shared", &importer).unwrap(),
            Resolution::Module {
                path: dir.path().join("shared.ts"),
                dialect: Dialect::TypeScript
            }
        );
    }

    #[test]
    fn test_packages_need_installation() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("node_modules/@astrojs/mdx");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "name": "@astrojs/mdx" }"#).unwrap();
        fs::create_dir(dir.path().join("config")).unwrap();
        let importer = dir.path().join("config/astro.config.mjs");
        let resolver = ModuleResolver::native();

        assert_eq!(
            resolver.resolve("@astrojs/mdx", &importer).unwrap(),
            Resolution::External("@astrojs/mdx".into())
        );
        assert!(matches!(
            resolver.resolve("@astrojs/react", &importer),
            Err(Error::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_transform_packages_need_installation() {
        let dir = tempfile::tempdir().unwrap();
        let importer = dir.path().join("astro.config.ts");
        let resolver = ModuleResolver::transform();
        assert!(matches!(
            resolver.resolve("@astrojs/tailwind/base.css", &importer),
            Err(Error::ModuleNotFound { .. })
        ));

        let pkg = dir.path().join("node_modules/@astrojs/tailwind");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), r#"{ "name": "@astrojs/tailwind" }"#).unwrap();
        assert_eq!(
            resolver.resolve("@astrojs/tailwind/base.css", &importer).unwrap(),
            Resolution::External("@astrojs/tailwind/base.css".into())
        );
    }
}
