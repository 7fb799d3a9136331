// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime values produced while evaluating a configuration module.

use super::function::Closure;
use crate::{Error, Result};
use serde_json::json;
use std::fmt;
use std::rc::Rc;

/// The JSON exports of a module, keyed by export name.
pub type Namespace = serde_json::Map<String, serde_json::Value>;

/// Largest integer an f64 represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A value during evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Boolean(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Array
    Array(Vec<Value>),
    /// Plain object
    Object(Object),
    /// Function or arrow function defined in a module
    Closure(Rc<Closure>),
    /// Regular expression literal
    RegExp(RegExp),
    /// Function provided by a built-in module or global
    Builtin(BuiltinFunction),
    /// Binding from a package that is never evaluated here
    External(External),
}

/// Native functions: `defineConfig` and the globals configuration files
/// commonly reach for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFunction {
    /// `defineConfig(config)` from `astro/config`; returns its argument
    DefineConfig,
    /// `Object.keys`
    ObjectKeys,
    /// `Object.values`
    ObjectValues,
    /// `Object.entries`
    ObjectEntries,
    /// `Object.assign`
    ObjectAssign,
    /// `Object.fromEntries`
    ObjectFromEntries,
    /// `Object.freeze`; values are never shared, so this returns its argument
    ObjectFreeze,
    /// `JSON.stringify`
    JsonStringify,
    /// `JSON.parse`
    JsonParse,
    /// `Array.isArray`
    ArrayIsArray,
    /// `Array.from`
    ArrayFrom,
    /// `String(value)`
    String,
    /// `Number(value)`
    Number,
    /// `Boolean(value)`
    Boolean,
    /// `parseInt`
    ParseInt,
    /// `parseFloat`
    ParseFloat,
    /// `Math.max`
    MathMax,
    /// `Math.min`
    MathMin,
    /// `Math.round`
    MathRound,
    /// `Math.floor`
    MathFloor,
    /// `Math.ceil`
    MathCeil,
    /// `Math.abs`
    MathAbs,
    /// `console.log`, `console.info`
    ConsoleInfo,
    /// `console.debug`
    ConsoleDebug,
    /// `console.warn`
    ConsoleWarn,
    /// `console.error`
    ConsoleError,
}

impl BuiltinFunction {
    /// The function's `name` property.
    pub fn name(self) -> &'static str {
        match self {
            BuiltinFunction::DefineConfig => "defineConfig",
            BuiltinFunction::ObjectKeys => "keys",
            BuiltinFunction::ObjectValues => "values",
            BuiltinFunction::ObjectEntries => "entries",
            BuiltinFunction::ObjectAssign => "assign",
            BuiltinFunction::ObjectFromEntries => "fromEntries",
            BuiltinFunction::ObjectFreeze => "freeze",
            BuiltinFunction::JsonStringify => "stringify",
            BuiltinFunction::JsonParse => "parse",
            BuiltinFunction::ArrayIsArray => "isArray",
            BuiltinFunction::ArrayFrom => "from",
            BuiltinFunction::String => "String",
            BuiltinFunction::Number => "Number",
            BuiltinFunction::Boolean => "Boolean",
            BuiltinFunction::ParseInt => "parseInt",
            BuiltinFunction::ParseFloat => "parseFloat",
            BuiltinFunction::MathMax => "max",
            BuiltinFunction::MathMin => "min",
            BuiltinFunction::MathRound => "round",
            BuiltinFunction::MathFloor => "floor",
            BuiltinFunction::MathCeil => "ceil",
            BuiltinFunction::MathAbs => "abs",
            BuiltinFunction::ConsoleInfo => "log",
            BuiltinFunction::ConsoleDebug => "debug",
            BuiltinFunction::ConsoleWarn => "warn",
            BuiltinFunction::ConsoleError => "error",
        }
    }
}

/// A regular expression literal, compiled when first used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExp {
    /// Pattern between the slashes
    pub source: String,
    /// Flags after the closing slash
    pub flags: String,
}

impl RegExp {
    /// Create a regular expression value.
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            flags: flags.into(),
        }
    }

    /// Whether the `g` flag is set.
    pub fn global(&self) -> bool {
        self.flags.contains('g')
    }

    /// Compile the pattern. `i`, `m` and `s` map onto the matching regex
    /// options; `g`, `u`, `y` and `d` need no translation.
    pub fn compile(&self) -> Result<regex::Regex> {
        regex::RegexBuilder::new(&self.source)
            .case_insensitive(self.flags.contains('i'))
            .multi_line(self.flags.contains('m'))
            .dot_matches_new_line(self.flags.contains('s'))
            .build()
            .map_err(|e| {
                Error::Thrown(format!(
                    "SyntaxError: Invalid regular expression: {}: {}",
                    self, e
                ))
            })
    }
}

impl fmt::Display for RegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// An opaque export of an externalized package.
///
/// Calling it records the arguments, so `tailwind({ applyBaseStyles: false })`
/// survives into the resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct External {
    /// Package specifier
    pub module: String,
    /// Export path (`default`, `remarkPlugins`, `default.preset`, or `*`)
    pub export: String,
    /// Call arguments, once called
    pub arguments: Option<Vec<Value>>,
}

impl External {
    /// The `import * as ns` view of a package.
    pub fn namespace(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            export: "*".to_string(),
            arguments: None,
        }
    }

    /// Property access on an uncalled external.
    pub fn member(&self, name: &str) -> Self {
        let export = if self.export == "*" {
            name.to_string()
        } else {
            format!("{}.{}", self.export, name)
        };
        Self {
            module: self.module.clone(),
            export,
            arguments: None,
        }
    }
}

/// Insertion-ordered object properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    properties: Vec<(String, Value)>,
}

impl Object {
    /// Create an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Mutable access to a property.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.properties
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a property; an existing key keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.properties.push((key, value)),
        }
    }

    /// Iterate over properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether there are no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// JSON view; `undefined` and function-valued properties are dropped.
    pub fn to_namespace(&self) -> Namespace {
        self.properties
            .iter()
            .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
            .collect()
    }
}

impl Value {
    /// Convert parsed JSON (JSON modules) into a value.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut object = Object::new();
                for (k, v) in map {
                    object.set(k.clone(), Value::from_json(v));
                }
                Value::Object(object)
            }
        }
    }

    /// JSON view with `JSON.stringify` semantics: `None` for values that
    /// would be omitted (`undefined`, functions).
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Undefined | Value::Builtin(_) | Value::Closure(_) => None,
            Value::Null => Some(serde_json::Value::Null),
            Value::Boolean(b) => Some(serde_json::Value::Bool(*b)),
            Value::Number(n) => Some(number_to_json(*n)),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Array(items) => Some(serde_json::Value::Array(
                items
                    .iter()
                    .map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            )),
            Value::Object(object) => Some(serde_json::Value::Object(object.to_namespace())),
            Value::RegExp(_) => Some(serde_json::Value::Object(serde_json::Map::new())),
            Value::External(ext) => {
                let mut descriptor = json!({
                    "module": ext.module,
                    "export": ext.export,
                });
                if let Some(arguments) = &ext.arguments {
                    descriptor["args"] = serde_json::Value::Array(
                        arguments
                            .iter()
                            .map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
                            .collect(),
                    );
                }
                Some(json!({ "$external": descriptor }))
            }
        }
    }

    /// `null` or `undefined`
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// ECMAScript ToBoolean
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Whether the value can be called.
    pub fn is_callable(&self) -> bool {
        match self {
            Value::Builtin(_) | Value::Closure(_) => true,
            Value::External(ext) => ext.arguments.is_none(),
            _ => false,
        }
    }

    /// ECMAScript ToPrimitive: objects, arrays and functions become their
    /// string form.
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Undefined | Value::Null | Value::Boolean(_) | Value::Number(_) | Value::String(_) => {
                self.clone()
            }
            other => Value::String(other.to_string()),
        }
    }

    /// ECMAScript ToNumber
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    u64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64)
                } else {
                    match s {
                        "Infinity" | "+Infinity" => f64::INFINITY,
                        "-Infinity" => f64::NEG_INFINITY,
                        _ => s.parse().unwrap_or(f64::NAN),
                    }
                }
            }
            _ => f64::NAN,
        }
    }

    /// Result of the `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Builtin(_) | Value::Closure(_) => "function",
            Value::External(ext) if ext.arguments.is_none() => "function",
            _ => "object",
        }
    }

    /// `===`; objects and arrays have no identity here, so they never compare
    /// equal. Functions compare by identity.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::Number(a), Value::String(_)) => *a == other.to_number(),
            (Value::String(_), Value::Number(b)) => self.to_number() == *b,
            (Value::Boolean(_), _) => Value::Number(self.to_number()).loose_equals(other),
            (_, Value::Boolean(_)) => self.loose_equals(&Value::Number(other.to_number())),
            _ => self.strict_equals(other),
        }
    }

    /// Property read (`value.key`).
    pub fn get_property(&self, key: &str) -> Result<Value> {
        let value = match self {
            Value::Undefined | Value::Null => {
                return Err(Error::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    self, key
                )));
            }
            Value::Object(object) => object.get(key).cloned().unwrap_or(Value::Undefined),
            Value::Array(items) => match key {
                "length" => Value::Number(items.len() as f64),
                _ => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| items.get(i).cloned())
                    .unwrap_or(Value::Undefined),
            },
            Value::String(s) => match key {
                "length" => Value::Number(s.encode_utf16().count() as f64),
                _ => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Undefined),
            },
            Value::External(ext) if ext.arguments.is_none() => Value::External(ext.member(key)),
            Value::Closure(closure) => match key {
                "name" => Value::String(closure.name().to_string()),
                "length" => Value::Number(closure.arity() as f64),
                _ => Value::Undefined,
            },
            Value::Builtin(builtin) => match key {
                "name" => Value::String(builtin.name().to_string()),
                _ => Value::Undefined,
            },
            Value::RegExp(regexp) => match key {
                "source" => Value::String(regexp.source.clone()),
                "flags" => Value::String(regexp.flags.clone()),
                "global" => Value::Boolean(regexp.global()),
                "ignoreCase" => Value::Boolean(regexp.flags.contains('i')),
                "multiline" => Value::Boolean(regexp.flags.contains('m')),
                _ => Value::Undefined,
            },
            _ => Value::Undefined,
        };
        Ok(value)
    }

    /// Message used when this value is thrown.
    pub fn to_error_string(&self) -> String {
        if let Value::Object(object) = self {
            if let (Some(Value::String(name)), Some(Value::String(message))) =
                (object.get("name"), object.get("message"))
            {
                return if message.is_empty() {
                    name.clone()
                } else {
                    format!("{}: {}", name, message)
                };
            }
        }
        self.to_string()
    }
}

/// ECMAScript ToString
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if !item.is_nullish() {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Object(_) => f.write_str("[object Object]"),
            Value::RegExp(regexp) => write!(f, "{}", regexp),
            Value::Closure(closure) => write!(f, "function {}() {{ ... }}", closure.name()),
            Value::Builtin(builtin) => write!(f, "function {}() {{ [native code] }}", builtin.name()),
            Value::External(ext) => write!(f, "[external {}#{}]", ext.module, ext.export),
        }
    }
}

/// Number formatting used for display and numeric object keys.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        if n == 0.0 {
            "0".to_string()
        } else {
            format!("{:.0}", n)
        }
    } else {
        format!("{}", n)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
        json!(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(42.0), "42");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_to_json_drops_undefined() {
        let mut object = Object::new();
        object.set("site", Value::String("https://x".into()));
        object.set("base", Value::Undefined);
        object.set("define", Value::Builtin(BuiltinFunction::DefineConfig));
        object.set("list", Value::Array(vec![Value::Undefined, Value::Number(1.0)]));
        assert_eq!(
            Value::Object(object).to_json(),
            Some(json!({ "site": "https://x", "list": [null, 1] }))
        );
    }

    #[test]
    fn test_numbers_to_json() {
        assert_eq!(Value::Number(4321.0).to_json(), Some(json!(4321)));
        assert_eq!(Value::Number(0.25).to_json(), Some(json!(0.25)));
        assert_eq!(Value::Number(f64::NAN).to_json(), Some(serde_json::Value::Null));
    }

    #[test]
    fn test_external_serialization() {
        let ext = External::namespace("@astrojs/tailwind").member("default");
        let called = Value::External(External {
            arguments: Some(vec![Value::Boolean(true)]),
            ..ext
        });
        assert_eq!(
            called.to_json(),
            Some(json!({
                "$external": { "module": "@astrojs/tailwind", "export": "default", "args": [true] }
            }))
        );
    }

    #[test]
    fn test_set_keeps_position() {
        let mut object = Object::new();
        object.set("a", Value::Number(1.0));
        object.set("b", Value::Number(2.0));
        object.set("a", Value::Number(3.0));
        let keys: Vec<&str> = object.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(object.get("a"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_equality() {
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.strict_equals(&Value::Undefined));
        assert!(Value::Number(1.0).loose_equals(&Value::String("1".into())));
        assert!(Value::Boolean(true).loose_equals(&Value::Number(1.0)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_property_access() {
        let list = Value::Array(vec![Value::String("a".into())]);
        assert_eq!(list.get_property("length").unwrap(), Value::Number(1.0));
        assert_eq!(list.get_property("0").unwrap(), Value::String("a".into()));
        assert!(Value::Undefined.get_property("x").is_err());
        let err = Value::Null.get_property("env").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: Cannot read properties of null (reading 'env')"
        );
    }

    #[test]
    fn test_regexp_values() {
        let regexp = Value::RegExp(RegExp::new("\\.mdx?$", "gi"));
        assert_eq!(regexp.to_string(), "/\\.mdx?$/gi");
        assert_eq!(regexp.to_json(), Some(json!({})));
        assert_eq!(regexp.type_of(), "object");
        assert_eq!(regexp.get_property("global").unwrap(), Value::Boolean(true));

        let Value::RegExp(inner) = &regexp else { unreachable!() };
        assert!(inner.compile().unwrap().is_match("Page.MDX"));
        let err = RegExp::new("(", "").compile().unwrap_err();
        assert!(err.to_string().starts_with("Uncaught SyntaxError: Invalid regular expression: /(/"));
    }

    #[test]
    fn test_builtin_display() {
        let value = Value::Builtin(BuiltinFunction::DefineConfig);
        assert_eq!(value.to_string(), "function defineConfig() { [native code] }");
        assert_eq!(value.type_of(), "function");
        assert_eq!(value.get_property("name").unwrap(), Value::String("defineConfig".into()));
    }

    #[test]
    fn test_error_string() {
        let mut error = Object::new();
        error.set("name", Value::String("Error".into()));
        error.set("message", Value::String("boom".into()));
        assert_eq!(Value::Object(error).to_error_string(), "Error: boom");
        assert_eq!(Value::String("plain".into()).to_error_string(), "plain");
    }
}
