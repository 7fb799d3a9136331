// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Function values.

use super::environment::Environment;
use crate::ast::{Function, Pattern};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A function together with the environment it was created in.
pub struct Closure {
    pub(super) function: Rc<Function>,
    pub(super) env: Rc<Environment>,
    /// Module that defined the function; `import.meta` inside it refers here
    pub(super) module: PathBuf,
}

impl Closure {
    pub(super) fn new(function: Rc<Function>, env: Rc<Environment>, module: &Path) -> Self {
        Self {
            function,
            env,
            module: module.to_path_buf(),
        }
    }

    /// The function's `name` property.
    pub fn name(&self) -> &str {
        self.function.name.as_deref().unwrap_or("")
    }

    /// The function's `length`: parameters before the first default or rest.
    pub fn arity(&self) -> usize {
        self.function
            .params
            .iter()
            .take_while(|p| !p.rest && !matches!(p.pattern, Pattern::Default { .. }))
            .count()
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("name", &self.name())
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Functions are compared by identity.
impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}
