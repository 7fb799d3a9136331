// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Import resolution seam.

use super::value::{BuiltinFunction, Object, Value};
use crate::{Dialect, Result};
use std::path::{Path, PathBuf};

/// Decides what an import specifier refers to.
///
/// The evaluator asks the host for every specifier that is not a
/// [`BuiltinModule`]. Hosts differ in which dialects they accept and in
/// which packages they keep external.
pub trait ImportHost: Send + Sync {
    /// Resolve `specifier` as imported from `importer`.
    fn resolve(&self, specifier: &str, importer: &Path) -> Result<Resolution>;
}

/// Where an import specifier points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A source module to read and evaluate
    Module {
        /// Absolute path of the module
        path: PathBuf,
        /// Dialect to parse it with
        dialect: Dialect,
    },
    /// A JSON file, bound as the default export
    Json(PathBuf),
    /// A package that stays opaque; its exports become external references
    External(String),
}

/// Modules answered by the evaluator itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModule {
    /// `astro/config`
    AstroConfig,
}

impl BuiltinModule {
    /// Look up a built-in module by specifier.
    pub fn from_specifier(specifier: &str) -> Option<Self> {
        match specifier {
            "astro/config" => Some(BuiltinModule::AstroConfig),
            _ => None,
        }
    }

    /// The specifier this module answers to.
    pub fn specifier(&self) -> &'static str {
        match self {
            BuiltinModule::AstroConfig => "astro/config",
        }
    }

    pub(super) fn namespace(&self) -> Object {
        let mut exports = Object::new();
        match self {
            BuiltinModule::AstroConfig => {
                exports.set("defineConfig", Value::Builtin(BuiltinFunction::DefineConfig));
            }
        }
        exports
    }
}
