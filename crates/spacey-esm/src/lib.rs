// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-esm
//!
//! Evaluates project configuration modules (`astro.config.mjs`,
//! `astro.config.ts`, ...) into a JSON exports namespace.
//!
//! The evaluator runs the part of JavaScript configuration files are written
//! in: imports and exports, `let`/`const`/`var` with destructuring, functions
//! and arrow functions with closures, operators, `if`/`for`/`while`,
//! `try`/`catch`, regular expression literals, the common string and array
//! methods, `process.env` and `import.meta`. Imported packages are never run;
//! their exports become [`eval::External`] values that record how they were
//! called. Functions survive into the exports namespace only as absent keys,
//! so a Vite plugin object keeps its data properties (`name`, `enforce`).
//!
//! Classes, generators and function bodies using syntax outside that set are
//! kept opaque: they can be stored and passed around but not called.
//!
//! TypeScript sources are handled the Spacey way: the parser erases type
//! syntax at parse time and produces the same AST as the JavaScript dialect.
//!
//! ## Quick Start
//!
//! ```rust
//! use spacey_esm::{Dialect, Evaluator, ImportHost, Resolution, Result};
//! use std::path::Path;
//!
//! struct NoImports;
//!
//! impl ImportHost for NoImports {
//!     fn resolve(&self, specifier: &str, importer: &Path) -> Result<Resolution> {
//!         Err(spacey_esm::Error::module_not_found(specifier, importer))
//!     }
//! }
//!
//! let source = "const site: string = 'https://example.com'; export default { site };";
//! let mut evaluator = Evaluator::new(&NoImports);
//! let exports = evaluator
//!     .evaluate(Path::new("/project/astro.config.ts"), source, Dialect::TypeScript)
//!     .unwrap();
//! assert_eq!(exports["default"]["site"], "https://example.com");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use eval::{BuiltinModule, Evaluator, ImportHost, Namespace, Resolution, Value};
pub use parser::Parser;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for module evaluation.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing or evaluating a module.
#[derive(Debug, Error)]
pub enum Error {
    /// Syntax error during parsing
    #[error("SyntaxError: {message} (at offset {offset})")]
    SyntaxError {
        /// Byte offset of the offending token
        offset: usize,
        /// Description
        message: String,
    },

    /// Type error during evaluation
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Reference to an undeclared binding
    #[error("ReferenceError: {0} is not defined")]
    ReferenceError(String),

    /// A `throw` statement ran
    #[error("Uncaught {0}")]
    Thrown(String),

    /// Import specifier did not resolve
    #[error("Cannot find module '{}' imported from {}", .specifier, .importer.display())]
    ModuleNotFound {
        /// Module specifier
        specifier: String,
        /// Importing module
        importer: PathBuf,
    },

    /// Import resolved to something that can't be loaded
    #[error("Error resolving module '{module}': {reason}")]
    ModuleResolution {
        /// Module specifier
        module: String,
        /// Reason for failure
        reason: String,
    },

    /// Named import the source module does not export
    #[error("SyntaxError: The requested module '{module}' does not provide an export named '{name}'")]
    MissingExport {
        /// Module specifier
        module: String,
        /// Requested export
        name: String,
    },

    /// A binding declared twice in the same module
    #[error("SyntaxError: Identifier '{0}' has already been declared")]
    Redeclaration(String),

    /// Module imports itself, directly or transitively
    #[error("Circular import of {}", .0.display())]
    CircularImport(PathBuf),

    /// File system error
    #[error("File system error: {0}")]
    Fs(#[from] std::io::Error),

    /// JSON module parse error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Error {
    /// Create a new TypeError
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a module not found error
    pub fn module_not_found(specifier: impl Into<String>, importer: &Path) -> Self {
        Self::ModuleNotFound {
            specifier: specifier.into(),
            importer: importer.to_path_buf(),
        }
    }
}

/// Source language of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Plain ECMAScript module syntax
    #[default]
    JavaScript,
    /// TypeScript; types are erased at parse time
    TypeScript,
}

impl Dialect {
    /// Picks the dialect from a file extension.
    ///
    /// `.ts`, `.mts` and `.cts` are TypeScript; everything else is JavaScript.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts" | "mts" | "cts") => Dialect::TypeScript,
            _ => Dialect::JavaScript,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_from_path() {
        assert_eq!(Dialect::from_path(Path::new("astro.config.ts")), Dialect::TypeScript);
        assert_eq!(Dialect::from_path(Path::new("astro.config.mts")), Dialect::TypeScript);
        assert_eq!(Dialect::from_path(Path::new("astro.config.cts")), Dialect::TypeScript);
        assert_eq!(Dialect::from_path(Path::new("astro.config.mjs")), Dialect::JavaScript);
        assert_eq!(Dialect::from_path(Path::new("astro.config")), Dialect::JavaScript);
    }

    #[test]
    fn test_error_display() {
        let err = Error::module_not_found("@astrojs/mdx", Path::new("/p/astro.config.mjs"));
        assert_eq!(
            err.to_string(),
            "Cannot find module '@astrojs/mdx' imported from /p/astro.config.mjs"
        );
        assert_eq!(
            Error::ReferenceError("site".into()).to_string(),
            "ReferenceError: site is not defined"
        );
    }
}
