// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tree-walking interpreter for module bodies and function calls.
//!
//! Objects and arrays are plain values: assigning one to a second binding
//! copies it. Writes through a member chain (`config.vite.plugins[0] = p`,
//! `plugins.push(p)`) are applied to the binding at the root of the chain.

use super::builtins::{self, ERROR_CONSTRUCTORS};
use super::environment::Environment;
use super::function::Closure;
use super::value::{BuiltinFunction, External, Object, RegExp, Value};
use crate::ast::*;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use url::Url;

/// Nested calls allowed before a `RangeError`.
const MAX_CALL_DEPTH: usize = 32;

/// Array methods that modify their receiver.
pub(super) const ARRAY_MUTATORS: &[&str] = &["push", "pop", "shift", "unshift", "reverse", "sort"];

/// Largest index an array assignment may grow an array to.
const MAX_ARRAY_GROWTH: usize = 1 << 16;

/// How a statement finished.
#[derive(Debug)]
pub(super) enum Completion {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Evaluation state for one module.
pub(super) struct Interpreter {
    /// Module whose code is running; swapped while a closure from another
    /// module runs
    path: PathBuf,
    depth: usize,
    /// Value of the last `throw`, so `catch` can bind it unchanged
    thrown: Option<Value>,
}

impl Interpreter {
    pub(super) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            depth: 0,
            thrown: None,
        }
    }

    pub(super) fn path(&self) -> &Path {
        &self.path
    }

    /// Raises `value` as a JavaScript exception.
    pub(super) fn throw(&mut self, value: Value) -> Error {
        let error = Error::Thrown(value.to_error_string());
        self.thrown = Some(value);
        error
    }

    /// The value a `catch` clause binds for `error`. Module loading and I/O
    /// failures are not catchable and come back as `Err`.
    fn caught(&mut self, error: Error) -> std::result::Result<Value, Error> {
        match error {
            Error::Thrown(message) => Ok(self.thrown.take().unwrap_or_else(|| {
                match message.split_once(": ") {
                    Some((name, text)) if ERROR_CONSTRUCTORS.contains(&name) => {
                        builtins::error_object(name, text)
                    }
                    _ => Value::String(message),
                }
            })),
            Error::TypeError(message) => Ok(builtins::error_object("TypeError", message)),
            Error::ReferenceError(name) => Ok(builtins::error_object(
                "ReferenceError",
                format!("{} is not defined", name),
            )),
            other => Err(other),
        }
    }

    pub(super) fn closure(&self, function: &Rc<Function>, env: &Rc<Environment>) -> Value {
        Value::Closure(Rc::new(Closure::new(
            Rc::clone(function),
            Rc::clone(env),
            &self.path,
        )))
    }

    /// Binds a function declaration; declarations are hoisted to the top of
    /// their statement list.
    pub(super) fn declare_function(&self, function: &Rc<Function>, env: &Rc<Environment>) -> Result<()> {
        match &function.name {
            Some(name) => env.declare_var(name, self.closure(function, env)),
            None => Ok(()),
        }
    }

    // Statements

    pub(super) fn execute_block(&mut self, statements: &[Statement], env: &Rc<Environment>) -> Result<Completion> {
        for statement in statements {
            if let Statement::Function(function) = statement {
                self.declare_function(function, env)?;
            }
        }
        for statement in statements {
            match self.execute(statement, env)? {
                Completion::Normal => {}
                completion => return Ok(completion),
            }
        }
        Ok(Completion::Normal)
    }

    pub(super) fn execute(&mut self, statement: &Statement, env: &Rc<Environment>) -> Result<Completion> {
        match statement {
            Statement::Declaration(declaration) => self.declare_variables(declaration, env)?,
            // hoisted
            Statement::Function(_) => {}
            Statement::Expression(expr) => {
                self.eval(expr, env)?;
            }
            Statement::Block(body) => {
                return self.execute_block(body, &Environment::with_outer(env));
            }
            Statement::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    return self.execute(consequent, env);
                }
                if let Some(alternate) = alternate {
                    return self.execute(alternate, env);
                }
            }
            Statement::While { test, body } => {
                while self.eval(test, env)?.is_truthy() {
                    match self.execute(body, env)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                }
            }
            Statement::For {
                init,
                test,
                update,
                body,
            } => {
                let scope = Environment::with_outer(env);
                if let Some(init) = init {
                    self.execute(init, &scope)?;
                }
                loop {
                    if let Some(test) = test {
                        if !self.eval(test, &scope)?.is_truthy() {
                            break;
                        }
                    }
                    match self.execute(body, &scope)? {
                        Completion::Break => break,
                        Completion::Return(value) => return Ok(Completion::Return(value)),
                        Completion::Normal | Completion::Continue => {}
                    }
                    if let Some(update) = update {
                        self.eval(update, &scope)?;
                    }
                }
            }
            Statement::ForOf(each) => {
                let iterable = self.eval(&each.right, env)?;
                let items = iterate(iterable)?;
                return self.run_for_each(each, items, env);
            }
            Statement::ForIn(each) => {
                let keys: Vec<String> = match self.eval(&each.right, env)? {
                    Value::Object(object) => object.iter().map(|(k, _)| k.to_string()).collect(),
                    Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
                    Value::String(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
                    _ => Vec::new(),
                };
                return self.run_for_each(each, keys.into_iter().map(Value::String).collect(), env);
            }
            Statement::Return(argument) => {
                let value = match argument {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Undefined,
                };
                return Ok(Completion::Return(value));
            }
            Statement::Break => return Ok(Completion::Break),
            Statement::Continue => return Ok(Completion::Continue),
            Statement::Throw(argument) => {
                let value = self.eval(argument, env)?;
                return Err(self.throw(value));
            }
            Statement::Try {
                block,
                handler,
                finalizer,
            } => return self.execute_try(block, handler.as_ref(), finalizer.as_deref(), env),
        }
        Ok(Completion::Normal)
    }

    fn run_for_each(&mut self, each: &ForEach, items: Vec<Value>, env: &Rc<Environment>) -> Result<Completion> {
        for item in items {
            let iteration = Environment::with_outer(env);
            self.bind_pattern(&each.target, item, &iteration, each.kind)?;
            match self.execute(&each.body, &iteration)? {
                Completion::Break => break,
                Completion::Return(value) => return Ok(Completion::Return(value)),
                Completion::Normal | Completion::Continue => {}
            }
        }
        Ok(Completion::Normal)
    }

    fn execute_try(
        &mut self,
        block: &[Statement],
        handler: Option<&CatchClause>,
        finalizer: Option<&[Statement]>,
        env: &Rc<Environment>,
    ) -> Result<Completion> {
        let result = self.execute_block(block, &Environment::with_outer(env));
        let result = match (result, handler) {
            (Err(error), Some(handler)) => match self.caught(error) {
                Ok(value) => self.run_handler(handler, value, env),
                Err(error) => Err(error),
            },
            (result, _) => result,
        };

        if let Some(finalizer) = finalizer {
            match self.execute_block(finalizer, &Environment::with_outer(env))? {
                Completion::Normal => {}
                completion => return Ok(completion),
            }
        }
        result
    }

    fn run_handler(&mut self, handler: &CatchClause, value: Value, env: &Rc<Environment>) -> Result<Completion> {
        let scope = Environment::with_outer(env);
        if let Some(param) = &handler.param {
            self.bind_pattern(param, value, &scope, VariableKind::Let)?;
        }
        self.execute_block(&handler.body, &scope)
    }

    pub(super) fn declare_variables(&mut self, declaration: &VariableDeclaration, env: &Rc<Environment>) -> Result<()> {
        for declarator in &declaration.declarations {
            let value = match &declarator.init {
                Some(init) => self.eval(init, env)?,
                None => Value::Undefined,
            };
            self.bind_pattern(&declarator.target, value, env, declaration.kind)?;
        }
        Ok(())
    }

    fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Rc<Environment>,
        kind: VariableKind,
    ) -> Result<()> {
        match pattern {
            Pattern::Identifier(name) => match kind {
                VariableKind::Var => env.declare_var(name, value),
                VariableKind::Let => env.declare(name, value, true),
                VariableKind::Const => env.declare(name, value, false),
            },
            Pattern::Default { target, value: fallback } => {
                let value = match value {
                    Value::Undefined => self.eval(fallback, env)?,
                    value => value,
                };
                self.bind_pattern(target, value, env, kind)
            }
            Pattern::Object { properties, rest } => {
                if value.is_nullish() {
                    return Err(Error::type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value, value
                    )));
                }
                let mut used = Vec::with_capacity(properties.len());
                for property in properties {
                    let key = self.property_key(&property.key, env)?;
                    let item = value.get_property(&key)?;
                    self.bind_pattern(&property.value, item, env, kind)?;
                    used.push(key);
                }
                if let Some(rest) = rest {
                    let mut remaining = Object::new();
                    if let Value::Object(object) = &value {
                        for (key, item) in object.iter().filter(|(k, _)| !used.iter().any(|u| u.as_str() == *k)) {
                            remaining.set(key, item.clone());
                        }
                    }
                    let rest = Pattern::Identifier(rest.clone());
                    self.bind_pattern(&rest, Value::Object(remaining), env, kind)?;
                }
                Ok(())
            }
            Pattern::Array { elements, rest } => {
                let mut items = iterate(value)?.into_iter();
                for element in elements {
                    let item = items.next().unwrap_or(Value::Undefined);
                    if let Some(element) = element {
                        self.bind_pattern(element, item, env, kind)?;
                    }
                }
                if let Some(rest) = rest {
                    self.bind_pattern(rest, Value::Array(items.collect()), env, kind)?;
                }
                Ok(())
            }
        }
    }

    // Expressions

    pub(super) fn eval(&mut self, expr: &Expression, env: &Rc<Environment>) -> Result<Value> {
        match expr {
            Expression::Null => Ok(Value::Null),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::Number(n) => Ok(Value::Number(*n)),
            Expression::String(s) => Ok(Value::String(s.clone())),
            Expression::Template { quasis, expressions } => {
                let mut out = String::new();
                for (i, quasi) in quasis.iter().enumerate() {
                    out.push_str(quasi);
                    if let Some(expr) = expressions.get(i) {
                        out.push_str(&self.eval(expr, env)?.to_string());
                    }
                }
                Ok(Value::String(out))
            }
            Expression::RegExp { pattern, flags } => {
                Ok(Value::RegExp(RegExp::new(pattern.clone(), flags.clone())))
            }
            Expression::Identifier(name) => lookup(name, env),
            Expression::This => Ok(env.get("this").unwrap_or(Value::Undefined)),
            Expression::Array(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    match element {
                        None => items.push(Value::Undefined),
                        Some(element) => self.push_element(&mut items, element, env)?,
                    }
                }
                Ok(Value::Array(items))
            }
            Expression::Object(properties) => self.eval_object(properties, env),
            Expression::Function(function) => Ok(self.closure(function, env)),
            Expression::Member {
                object,
                property,
                optional,
            } => {
                let target = self.eval(object, env)?;
                if *optional && target.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.member_key(property, env)?;
                target.get_property(&key)
            }
            Expression::Call {
                callee,
                arguments,
                optional,
            } => self.eval_call(callee, arguments, *optional, env),
            Expression::New { callee, arguments } => {
                let arguments = self.eval_arguments(arguments, env)?;
                self.construct(callee, arguments, env)
            }
            Expression::Unary { operator, argument } => self.eval_unary(*operator, argument, env),
            Expression::Update {
                operator,
                prefix,
                target,
            } => {
                let old = self.eval(target, env)?.to_number();
                let new = match operator {
                    UpdateOperator::Increment => old + 1.0,
                    UpdateOperator::Decrement => old - 1.0,
                };
                self.assign(target, Value::Number(new), env)?;
                Ok(Value::Number(if *prefix { new } else { old }))
            }
            Expression::Logical {
                operator,
                left,
                right,
            } => {
                let left = self.eval(left, env)?;
                if short_circuits(*operator, &left) {
                    Ok(left)
                } else {
                    self.eval(right, env)
                }
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.eval(left, env)?;
                let right = self.eval(right, env)?;
                binary(*operator, left, right)
            }
            Expression::Assign {
                operator,
                target,
                value,
            } => self.eval_assign(*operator, target, value, env),
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test, env)?.is_truthy() {
                    self.eval(consequent, env)
                } else {
                    self.eval(alternate, env)
                }
            }
            Expression::ImportMeta => Ok(Value::Object(self.import_meta())),
        }
    }

    fn eval_unary(&mut self, operator: UnaryOperator, argument: &Expression, env: &Rc<Environment>) -> Result<Value> {
        // typeof on an undeclared name is not an error
        if let (UnaryOperator::Typeof, Expression::Identifier(name)) = (operator, argument) {
            return match lookup(name, env) {
                Ok(value) => Ok(Value::String(value.type_of().to_string())),
                Err(Error::ReferenceError(_)) => Ok(Value::String("undefined".to_string())),
                Err(e) => Err(e),
            };
        }
        let value = self.eval(argument, env)?;
        Ok(match operator {
            UnaryOperator::Not => Value::Boolean(!value.is_truthy()),
            UnaryOperator::Minus => Value::Number(-value.to_number()),
            UnaryOperator::Plus => Value::Number(value.to_number()),
            UnaryOperator::Typeof => Value::String(value.type_of().to_string()),
            UnaryOperator::Void => Value::Undefined,
            // nothing here produces a promise
            UnaryOperator::Await => value,
        })
    }

    fn eval_assign(
        &mut self,
        operator: AssignOperator,
        target: &Expression,
        value: &Expression,
        env: &Rc<Environment>,
    ) -> Result<Value> {
        let value = if let Some(logical) = operator.logical() {
            let current = self.eval(target, env)?;
            if short_circuits(logical, &current) {
                return Ok(current);
            }
            self.eval(value, env)?
        } else if let Some(arithmetic) = operator.binary() {
            let current = self.eval(target, env)?;
            let right = self.eval(value, env)?;
            binary(arithmetic, current, right)?
        } else {
            self.eval(value, env)?
        };
        self.assign(target, value.clone(), env)?;
        Ok(value)
    }

    /// Stores `value` into an identifier, or into a member chain through the
    /// binding at its root.
    fn assign(&mut self, target: &Expression, value: Value, env: &Rc<Environment>) -> Result<()> {
        let mut keys = Vec::new();
        let mut node = target;
        while let Expression::Member {
            object, property, ..
        } = node
        {
            keys.push(self.member_key(property, env)?);
            node = &**object;
        }
        keys.reverse();

        let root = match node {
            Expression::Identifier(name) => name.as_str(),
            Expression::This => "this",
            other => {
                // the written object is a temporary
                self.eval(other, env)?;
                return Ok(());
            }
        };
        if keys.is_empty() {
            return env.set(root, value);
        }
        if !env.has(root) {
            return match root {
                "this" => Err(Error::type_error(format!(
                    "Cannot set properties of undefined (setting '{}')",
                    keys[0]
                ))),
                // writes to globals such as `process.env.X` are not kept
                _ if builtins::global(root).is_some() => Ok(()),
                _ => Err(Error::ReferenceError(root.to_string())),
            };
        }
        env.update(root, |slot| set_path(slot, &keys, value))
    }

    /// Stores a receiver changed in place back where it was read from. This
    /// is not a rebinding, so `const` bindings accept it.
    fn write_back(&mut self, target: &Expression, value: Value, env: &Rc<Environment>) -> Result<()> {
        match target {
            Expression::Identifier(name) if env.has(name) => env.update(name, |slot| {
                *slot = value;
                Ok(())
            }),
            // globals are rebuilt on every read
            Expression::Identifier(_) => Ok(()),
            _ => self.assign(target, value, env),
        }
    }

    fn eval_call(
        &mut self,
        callee: &Expression,
        arguments: &[Element],
        optional: bool,
        env: &Rc<Environment>,
    ) -> Result<Value> {
        let Expression::Member {
            object,
            property,
            optional: member_optional,
        } = callee
        else {
            let function = self.eval(callee, env)?;
            if optional && function.is_nullish() {
                return Ok(Value::Undefined);
            }
            let args = self.eval_arguments(arguments, env)?;
            if !function.is_callable() {
                return Err(not_a_function(callee, &function));
            }
            return self.call(function, Value::Undefined, args);
        };

        let mut receiver = self.eval(object, env)?;
        if *member_optional && receiver.is_nullish() {
            return Ok(Value::Undefined);
        }
        let key = self.member_key(property, env)?;
        let function = receiver.get_property(&key)?;
        let args = self.eval_arguments(arguments, env)?;

        if function.is_callable() {
            let assigns = function == Value::Builtin(BuiltinFunction::ObjectAssign);
            let result = self.call(function, receiver, args)?;
            // `Object.assign(target, ...)` updates `target`
            if assigns {
                if let Some(Element::Expression(target)) = arguments.first() {
                    if target.is_assignment_target() {
                        self.write_back(target, result.clone(), env)?;
                    }
                }
            }
            return Ok(result);
        }

        if let Some(result) = self.call_method(&mut receiver, &key, args)? {
            if matches!(receiver, Value::Array(_))
                && ARRAY_MUTATORS.contains(&key.as_str())
                && object.is_assignment_target()
            {
                self.write_back(object, receiver, env)?;
            }
            return Ok(result);
        }
        if optional && function.is_nullish() {
            return Ok(Value::Undefined);
        }
        Err(not_a_function(callee, &function))
    }

    /// Calls a function value with `this` bound to `this`.
    pub(super) fn call(&mut self, function: Value, this: Value, args: Vec<Value>) -> Result<Value> {
        match function {
            Value::Builtin(builtin) => self.call_builtin(builtin, args),
            Value::External(ext) if ext.arguments.is_none() => Ok(Value::External(External {
                arguments: Some(args),
                ..ext
            })),
            Value::Closure(closure) => self.call_closure(&closure, this, args),
            other => Err(Error::type_error(format!("{} is not a function", other))),
        }
    }

    fn call_closure(&mut self, closure: &Rc<Closure>, this: Value, args: Vec<Value>) -> Result<Value> {
        if matches!(closure.function.body, FunctionBody::Opaque) {
            let name = match closure.name() {
                "" => "anonymous",
                name => name,
            };
            return Err(Error::type_error(format!(
                "function {} cannot be called while loading configuration",
                name
            )));
        }
        if self.depth >= MAX_CALL_DEPTH {
            let error = builtins::error_object("RangeError", "Maximum call stack size exceeded");
            return Err(self.throw(error));
        }

        self.depth += 1;
        let caller = std::mem::replace(&mut self.path, closure.module.clone());
        let result = self.run_closure(closure, this, args);
        self.path = caller;
        self.depth -= 1;
        result
    }

    fn run_closure(&mut self, closure: &Closure, this: Value, args: Vec<Value>) -> Result<Value> {
        let env = Environment::with_outer(&closure.env);
        let function = &closure.function;
        if !function.arrow {
            env.declare("this", this, false)?;
        }

        let mut args = args.into_iter();
        for param in &function.params {
            let value = if param.rest {
                Value::Array(args.by_ref().collect())
            } else {
                args.next().unwrap_or(Value::Undefined)
            };
            self.bind_pattern(&param.pattern, value, &env, VariableKind::Var)?;
        }

        match &function.body {
            FunctionBody::Expression(expr) => self.eval(expr, &env),
            FunctionBody::Block(body) => match self.execute_block(body, &env)? {
                Completion::Return(value) => Ok(value),
                _ => Ok(Value::Undefined),
            },
            FunctionBody::Opaque => Ok(Value::Undefined),
        }
    }

    fn construct(&mut self, callee: &Expression, arguments: Vec<Value>, env: &Rc<Environment>) -> Result<Value> {
        if let Expression::Identifier(name) = callee {
            if !env.has(name) {
                return builtins::construct_global(name, arguments);
            }
        }
        match self.eval(callee, env)? {
            Value::External(ext) if ext.arguments.is_none() => Ok(Value::External(External {
                arguments: Some(arguments),
                ..ext
            })),
            other => Err(Error::type_error(format!(
                "{} is not a constructor",
                describe(callee, &other)
            ))),
        }
    }

    fn eval_object(&mut self, properties: &[Property], env: &Rc<Environment>) -> Result<Value> {
        let mut object = Object::new();
        for property in properties {
            match property {
                Property::KeyValue(key, value) => {
                    let key = self.property_key(key, env)?;
                    let value = self.eval(value, env)?;
                    object.set(key, value);
                }
                Property::Getter(key, function) => {
                    let key = self.property_key(key, env)?;
                    // getters whose body was skipped leave the property unset
                    if matches!(function.body, FunctionBody::Opaque) {
                        continue;
                    }
                    let getter = self.closure(function, env);
                    let value = self.call(getter, Value::Object(object.clone()), Vec::new())?;
                    object.set(key, value);
                }
                Property::Spread(expr) => match self.eval(expr, env)? {
                    Value::Object(source) => {
                        for (k, v) in source.iter() {
                            object.set(k, v.clone());
                        }
                    }
                    Value::Array(items) => {
                        for (i, v) in items.into_iter().enumerate() {
                            object.set(i.to_string(), v);
                        }
                    }
                    Value::String(s) => {
                        for (i, c) in s.chars().enumerate() {
                            object.set(i.to_string(), Value::String(c.to_string()));
                        }
                    }
                    _ => {}
                },
            }
        }
        Ok(Value::Object(object))
    }

    fn eval_arguments(&mut self, arguments: &[Element], env: &Rc<Environment>) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            self.push_element(&mut values, argument, env)?;
        }
        Ok(values)
    }

    fn push_element(&mut self, items: &mut Vec<Value>, element: &Element, env: &Rc<Environment>) -> Result<()> {
        match element {
            Element::Expression(expr) => items.push(self.eval(expr, env)?),
            Element::Spread(expr) => {
                let value = self.eval(expr, env)?;
                match value {
                    Value::Array(values) => items.extend(values),
                    Value::String(s) => items.extend(s.chars().map(|c| Value::String(c.to_string()))),
                    other => {
                        return Err(Error::type_error(format!(
                            "{} is not iterable",
                            describe(expr, &other)
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn property_key(&mut self, key: &PropertyKey, env: &Rc<Environment>) -> Result<String> {
        match key {
            PropertyKey::Static(name) => Ok(name.clone()),
            PropertyKey::Computed(expr) => Ok(self.eval(expr, env)?.to_string()),
        }
    }

    fn member_key(&mut self, property: &MemberProperty, env: &Rc<Environment>) -> Result<String> {
        match property {
            MemberProperty::Static(name) => Ok(name.clone()),
            MemberProperty::Computed(expr) => Ok(self.eval(expr, env)?.to_string()),
        }
    }

    fn import_meta(&self) -> Object {
        let url = Url::from_file_path(&self.path)
            .map(String::from)
            .unwrap_or_else(|_| format!("file://{}", self.path.display()));
        let dirname = self
            .path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        let mut meta = Object::new();
        meta.set("url", Value::String(url));
        meta.set("dirname", Value::String(dirname));
        meta.set("filename", Value::String(self.path.display().to_string()));
        meta
    }
}

fn lookup(name: &str, env: &Rc<Environment>) -> Result<Value> {
    if let Some(value) = env.get(name) {
        return Ok(value);
    }
    builtins::global(name).ok_or_else(|| Error::ReferenceError(name.to_string()))
}

fn short_circuits(operator: LogicalOperator, left: &Value) -> bool {
    match operator {
        LogicalOperator::Nullish => !left.is_nullish(),
        LogicalOperator::Or => left.is_truthy(),
        LogicalOperator::And => !left.is_truthy(),
    }
}

/// Items produced by iterating `value` (`for...of`, spread, array patterns).
pub(super) fn iterate(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        other => Err(Error::type_error(format!("{} is not iterable", other))),
    }
}

fn binary(operator: BinaryOperator, left: Value, right: Value) -> Result<Value> {
    let value = match operator {
        BinaryOperator::Equal => Value::Boolean(left.loose_equals(&right)),
        BinaryOperator::NotEqual => Value::Boolean(!left.loose_equals(&right)),
        BinaryOperator::StrictEqual => Value::Boolean(left.strict_equals(&right)),
        BinaryOperator::StrictNotEqual => Value::Boolean(!left.strict_equals(&right)),
        BinaryOperator::Less
        | BinaryOperator::LessEqual
        | BinaryOperator::Greater
        | BinaryOperator::GreaterEqual => Value::Boolean(compare(operator, &left, &right)),
        BinaryOperator::In => {
            let key = left.to_string();
            let found = match &right {
                Value::Object(object) => object.get(&key).is_some(),
                Value::Array(items) => {
                    key == "length" || key.parse::<usize>().is_ok_and(|i| i < items.len())
                }
                _ => {
                    return Err(Error::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key, right
                    )));
                }
            };
            Value::Boolean(found)
        }
        BinaryOperator::Add => {
            let (left, right) = (left.to_primitive(), right.to_primitive());
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                Value::String(format!("{}{}", left, right))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOperator::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOperator::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOperator::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOperator::Remainder => Value::Number(left.to_number() % right.to_number()),
        BinaryOperator::Exponent => Value::Number(left.to_number().powf(right.to_number())),
    };
    Ok(value)
}

/// `<`, `<=`, `>`, `>=`: strings compare by code point, anything else as
/// numbers; `NaN` compares false.
fn compare(operator: BinaryOperator, left: &Value, right: &Value) -> bool {
    let (left, right) = (left.to_primitive(), right.to_primitive());
    let ordering = match (&left, &right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    let Some(ordering) = ordering else {
        return false;
    };
    match operator {
        BinaryOperator::Less => ordering.is_lt(),
        BinaryOperator::LessEqual => ordering.is_le(),
        BinaryOperator::Greater => ordering.is_gt(),
        _ => ordering.is_ge(),
    }
}

/// Writes `value` at `keys` below `target`.
fn set_path(target: &mut Value, keys: &[String], value: Value) -> Result<()> {
    let Some((key, rest)) = keys.split_first() else {
        *target = value;
        return Ok(());
    };
    match target {
        Value::Object(object) => {
            if rest.is_empty() {
                object.set(key.clone(), value);
                return Ok(());
            }
            match object.get_mut(key) {
                Some(child) => set_path(child, rest, value),
                None => Err(cannot_set(&Value::Undefined, &rest[0])),
            }
        }
        Value::Array(items) => {
            if key == "length" && rest.is_empty() {
                let length = value.to_number();
                if length >= 0.0 && length <= items.len() as f64 && length.fract() == 0.0 {
                    items.truncate(length as usize);
                    return Ok(());
                }
                return Err(Error::Thrown("RangeError: Invalid array length".to_string()));
            }
            let Ok(index) = key.parse::<usize>() else {
                // named properties on arrays are not kept
                return Ok(());
            };
            if rest.is_empty() {
                if index >= items.len() {
                    if index > items.len() + MAX_ARRAY_GROWTH {
                        return Err(Error::Thrown("RangeError: Invalid array length".to_string()));
                    }
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                return Ok(());
            }
            match items.get_mut(index) {
                Some(child) => set_path(child, rest, value),
                None => Err(cannot_set(&Value::Undefined, &rest[0])),
            }
        }
        Value::Undefined | Value::Null => Err(cannot_set(target, key)),
        // writes to primitives and functions are dropped
        _ => Ok(()),
    }
}

fn cannot_set(target: &Value, key: &str) -> Error {
    Error::type_error(format!("Cannot set properties of {} (setting '{}')", target, key))
}

fn not_a_function(callee: &Expression, value: &Value) -> Error {
    Error::type_error(format!("{} is not a function", describe(callee, value)))
}

/// Source-ish name of an expression for error messages.
fn describe(expr: &Expression, value: &Value) -> String {
    fn path(expr: &Expression) -> Option<String> {
        match expr {
            Expression::Identifier(name) => Some(name.clone()),
            Expression::This => Some("this".to_string()),
            Expression::Member {
                object,
                property: MemberProperty::Static(name),
                ..
            } => path(object).map(|object| format!("{}.{}", object, name)),
            _ => None,
        }
    }
    path(expr).unwrap_or_else(|| value.to_string())
}
