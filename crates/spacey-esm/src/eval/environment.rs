// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical environments for variable binding.

use super::value::Value;
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A lexical environment: one block, function body or module scope.
///
/// Closures keep their defining environment alive through the `Rc`.
#[derive(Debug, Default)]
pub(super) struct Environment {
    /// The bindings in this environment
    bindings: RefCell<FxHashMap<String, Binding>>,
    /// The outer (parent) environment
    outer: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new module environment.
    pub(super) fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Creates a new environment nested in `outer`.
    pub(super) fn with_outer(outer: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            bindings: RefCell::default(),
            outer: Some(Rc::clone(outer)),
        })
    }

    /// Declares a `let`/`const`/function/import binding in this environment.
    pub(super) fn declare(&self, name: &str, value: Value, mutable: bool) -> Result<()> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(Error::Redeclaration(name.to_string()));
        }
        bindings.insert(name.to_string(), Binding { value, mutable });
        Ok(())
    }

    /// Declares a `var` binding; redeclaring one is allowed.
    pub(super) fn declare_var(&self, name: &str, value: Value) -> Result<()> {
        let mut bindings = self.bindings.borrow_mut();
        match bindings.get_mut(name) {
            Some(binding) if binding.mutable => binding.value = value,
            Some(_) => return Err(Error::Redeclaration(name.to_string())),
            None => {
                bindings.insert(name.to_string(), Binding { value, mutable: true });
            }
        }
        Ok(())
    }

    /// Gets a variable's value.
    pub(super) fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.bindings.borrow().get(name) {
            return Some(binding.value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Whether `name` is bound here or in an outer environment.
    pub(super) fn has(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
            || self.outer.as_ref().is_some_and(|outer| outer.has(name))
    }

    /// Sets a variable's value.
    pub(super) fn set(&self, name: &str, value: Value) -> Result<()> {
        if let Some(binding) = self.bindings.borrow_mut().get_mut(name) {
            if !binding.mutable {
                return Err(Error::type_error("Assignment to constant variable."));
            }
            binding.value = value;
            return Ok(());
        }
        match &self.outer {
            Some(outer) => outer.set(name, value),
            None => Err(Error::ReferenceError(name.to_string())),
        }
    }

    /// Mutates the value bound to `name` in place. Member assignment goes
    /// through here, so properties of a `const` object stay writable.
    pub(super) fn update<R>(&self, name: &str, f: impl FnOnce(&mut Value) -> Result<R>) -> Result<R> {
        if let Some(binding) = self.bindings.borrow_mut().get_mut(name) {
            return f(&mut binding.value);
        }
        match &self.outer {
            Some(outer) => outer.update(name, f),
            None => Err(Error::ReferenceError(name.to_string())),
        }
    }
}

/// A variable binding.
#[derive(Debug)]
struct Binding {
    /// The value
    value: Value,
    /// Whether the binding is mutable (let vs const)
    mutable: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let module = Environment::new();
        module.declare("site", Value::String("a".into()), false).unwrap();
        let block = Environment::with_outer(&module);
        block.declare("base", Value::Number(1.0), true).unwrap();

        assert_eq!(block.get("site"), Some(Value::String("a".into())));
        assert!(block.has("base"));
        assert!(!module.has("base"));
        assert_eq!(block.get("missing"), None);
    }

    #[test]
    fn test_shadowing_and_redeclaration() {
        let module = Environment::new();
        module.declare("a", Value::Number(1.0), true).unwrap();
        let block = Environment::with_outer(&module);
        block.declare("a", Value::Number(2.0), true).unwrap();
        assert_eq!(block.get("a"), Some(Value::Number(2.0)));
        assert_eq!(module.get("a"), Some(Value::Number(1.0)));

        assert!(matches!(
            module.declare("a", Value::Null, false),
            Err(Error::Redeclaration(ref name)) if name == "a"
        ));
        module.declare_var("v", Value::Null).unwrap();
        module.declare_var("v", Value::Boolean(true)).unwrap();
        assert_eq!(module.get("v"), Some(Value::Boolean(true)));
    }

    #[test]
    fn test_assignment_rules() {
        let module = Environment::new();
        module.declare("port", Value::Number(1.0), true).unwrap();
        module.declare("mode", Value::String("x".into()), false).unwrap();
        let block = Environment::with_outer(&module);

        block.set("port", Value::Number(2.0)).unwrap();
        assert_eq!(module.get("port"), Some(Value::Number(2.0)));

        let err = block.set("mode", Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Assignment to constant variable.");
        assert!(matches!(block.set("nope", Value::Null), Err(Error::ReferenceError(_))));
    }

    #[test]
    fn test_update_reaches_const_contents() {
        let module = Environment::new();
        module.declare("list", Value::Array(Vec::new()), false).unwrap();
        module
            .update("list", |value| {
                if let Value::Array(items) = value {
                    items.push(Value::Number(1.0));
                }
                Ok(())
            })
            .unwrap();
        assert_eq!(module.get("list"), Some(Value::Array(vec![Value::Number(1.0)])));
    }
}
