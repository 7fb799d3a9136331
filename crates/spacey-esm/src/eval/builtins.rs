// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Global bindings available without an import.
//!
//! | Global | Provides |
//! |--------|----------|
//! | `process` | `env`, `platform` |
//! | `Object` | `keys`, `values`, `entries`, `assign`, `fromEntries`, `freeze` |
//! | `JSON` | `stringify`, `parse` |
//! | `Array` | `isArray`, `from` |
//! | `Math` | `max`, `min`, `round`, `floor`, `ceil`, `abs`, `PI`, `E` |
//! | `console` | `log`, `info`, `debug`, `warn`, `error` (forwarded to `tracing`) |
//! | `String`, `Number`, `Boolean`, `parseInt`, `parseFloat` | conversions |
//! | `new URL`, `new RegExp`, `new Error` (and subclasses) | constructors |

use super::interpreter::Interpreter;
use super::value::{BuiltinFunction, Object, RegExp, Value};
use crate::{Error, Result};
use url::Url;

/// Constructors available without an import.
pub(super) const ERROR_CONSTRUCTORS: &[&str] = &[
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "ReferenceError",
];

/// The value of a global binding, if `name` is one.
pub(super) fn global(name: &str) -> Option<Value> {
    let value = match name {
        "undefined" => Value::Undefined,
        "NaN" => Value::Number(f64::NAN),
        "Infinity" => Value::Number(f64::INFINITY),
        "process" => Value::Object(process_object()),
        "Object" => Value::Object(namespace(&[
            BuiltinFunction::ObjectKeys,
            BuiltinFunction::ObjectValues,
            BuiltinFunction::ObjectEntries,
            BuiltinFunction::ObjectAssign,
            BuiltinFunction::ObjectFromEntries,
            BuiltinFunction::ObjectFreeze,
        ])),
        "JSON" => Value::Object(namespace(&[
            BuiltinFunction::JsonStringify,
            BuiltinFunction::JsonParse,
        ])),
        "Array" => Value::Object(namespace(&[
            BuiltinFunction::ArrayIsArray,
            BuiltinFunction::ArrayFrom,
        ])),
        "Math" => {
            let mut math = namespace(&[
                BuiltinFunction::MathMax,
                BuiltinFunction::MathMin,
                BuiltinFunction::MathRound,
                BuiltinFunction::MathFloor,
                BuiltinFunction::MathCeil,
                BuiltinFunction::MathAbs,
            ]);
            math.set("PI", Value::Number(std::f64::consts::PI));
            math.set("E", Value::Number(std::f64::consts::E));
            Value::Object(math)
        }
        "console" => {
            let mut console = Object::new();
            console.set("log", Value::Builtin(BuiltinFunction::ConsoleInfo));
            console.set("info", Value::Builtin(BuiltinFunction::ConsoleInfo));
            console.set("debug", Value::Builtin(BuiltinFunction::ConsoleDebug));
            console.set("warn", Value::Builtin(BuiltinFunction::ConsoleWarn));
            console.set("error", Value::Builtin(BuiltinFunction::ConsoleError));
            Value::Object(console)
        }
        "String" => Value::Builtin(BuiltinFunction::String),
        "Number" => Value::Builtin(BuiltinFunction::Number),
        "Boolean" => Value::Builtin(BuiltinFunction::Boolean),
        "parseInt" => Value::Builtin(BuiltinFunction::ParseInt),
        "parseFloat" => Value::Builtin(BuiltinFunction::ParseFloat),
        _ => return None,
    };
    Some(value)
}

fn namespace(functions: &[BuiltinFunction]) -> Object {
    let mut object = Object::new();
    for function in functions {
        object.set(function.name(), Value::Builtin(*function));
    }
    object
}

/// `new Name(...)` for a global constructor.
pub(super) fn construct_global(name: &str, arguments: Vec<Value>) -> Result<Value> {
    let mut arguments = arguments.into_iter();
    match name {
        "URL" => {
            let input = arguments.next().unwrap_or(Value::Undefined).to_string();
            let url = match arguments.next().filter(|base| !base.is_nullish()) {
                Some(base) => Url::parse(&base.to_string()).and_then(|base| base.join(&input)),
                None => Url::parse(&input),
            }
            .map_err(|_| Error::type_error(format!("Invalid URL: {}", input)))?;
            Ok(Value::String(url.into()))
        }
        "RegExp" => {
            let (source, flags) = match arguments.next() {
                Some(Value::RegExp(regexp)) => (regexp.source, regexp.flags),
                None | Some(Value::Undefined) => ("(?:)".to_string(), String::new()),
                Some(other) => (other.to_string(), String::new()),
            };
            let flags = match arguments.next() {
                None | Some(Value::Undefined) => flags,
                Some(other) => other.to_string(),
            };
            let regexp = RegExp::new(source, flags);
            regexp.compile()?;
            Ok(Value::RegExp(regexp))
        }
        _ if ERROR_CONSTRUCTORS.contains(&name) => {
            let message = match arguments.next() {
                None | Some(Value::Undefined) => String::new(),
                Some(value) => value.to_string(),
            };
            Ok(error_object(name, message))
        }
        _ => Err(Error::ReferenceError(name.to_string())),
    }
}

/// `{ name, message }`, the shape error constructors produce.
pub(super) fn error_object(name: &str, message: impl Into<String>) -> Value {
    let mut error = Object::new();
    error.set("name", Value::String(name.to_string()));
    error.set("message", Value::String(message.into()));
    Value::Object(error)
}

fn process_object() -> Object {
    let mut env = Object::new();
    for (key, value) in std::env::vars() {
        env.set(key, Value::String(value));
    }
    let platform = match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };

    let mut process = Object::new();
    process.set("env", Value::Object(env));
    process.set("platform", Value::String(platform.to_string()));
    process
}

impl Interpreter {
    pub(super) fn call_builtin(&mut self, builtin: BuiltinFunction, args: Vec<Value>) -> Result<Value> {
        let first = args.first().cloned().unwrap_or(Value::Undefined);
        let value = match builtin {
            BuiltinFunction::DefineConfig | BuiltinFunction::ObjectFreeze => first,
            BuiltinFunction::ObjectKeys => Value::Array(
                own_entries(&first)?
                    .into_iter()
                    .map(|(key, _)| Value::String(key))
                    .collect(),
            ),
            BuiltinFunction::ObjectValues => {
                Value::Array(own_entries(&first)?.into_iter().map(|(_, v)| v).collect())
            }
            BuiltinFunction::ObjectEntries => Value::Array(
                own_entries(&first)?
                    .into_iter()
                    .map(|(key, v)| Value::Array(vec![Value::String(key), v]))
                    .collect(),
            ),
            BuiltinFunction::ObjectAssign => {
                let mut args = args.into_iter();
                let mut target = match args.next() {
                    Some(Value::Object(object)) => object,
                    Some(value) if value.is_nullish() => {
                        return Err(Error::type_error("Cannot convert undefined or null to object"));
                    }
                    _ => Object::new(),
                };
                for source in args {
                    for (key, value) in own_entries(&source)? {
                        target.set(key, value);
                    }
                }
                Value::Object(target)
            }
            BuiltinFunction::ObjectFromEntries => {
                let Value::Array(entries) = first else {
                    return Err(Error::type_error(format!("{} is not iterable", first)));
                };
                let mut object = Object::new();
                for entry in entries {
                    let key = entry.get_property("0")?.to_string();
                    object.set(key, entry.get_property("1")?);
                }
                Value::Object(object)
            }
            BuiltinFunction::JsonStringify => json_stringify(&first, args.get(2))?,
            BuiltinFunction::JsonParse => {
                let text = first.to_string();
                match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(json) => Value::from_json(&json),
                    Err(e) => {
                        return Err(self.throw(error_object("SyntaxError", e.to_string())));
                    }
                }
            }
            BuiltinFunction::ArrayIsArray => Value::Boolean(matches!(first, Value::Array(_))),
            BuiltinFunction::ArrayFrom => {
                let items = match first {
                    Value::Array(items) => items,
                    Value::String(s) => s.chars().map(|c| Value::String(c.to_string())).collect(),
                    Value::Object(object) => {
                        let length = object.get("length").map_or(0.0, Value::to_number);
                        vec![Value::Undefined; length.max(0.0) as usize]
                    }
                    _ => Vec::new(),
                };
                match args.get(1) {
                    Some(map) if !map.is_nullish() => {
                        let mut mapped = Vec::with_capacity(items.len());
                        for (i, item) in items.into_iter().enumerate() {
                            let args = vec![item, Value::Number(i as f64)];
                            mapped.push(self.call(map.clone(), Value::Undefined, args)?);
                        }
                        Value::Array(mapped)
                    }
                    _ => Value::Array(items),
                }
            }
            BuiltinFunction::String => match args.first() {
                None => Value::String(String::new()),
                Some(value) => Value::String(value.to_string()),
            },
            BuiltinFunction::Number => match args.first() {
                None => Value::Number(0.0),
                Some(value) => Value::Number(value.to_number()),
            },
            BuiltinFunction::Boolean => Value::Boolean(first.is_truthy()),
            BuiltinFunction::ParseInt => {
                let radix = args.get(1).map_or(0.0, Value::to_number) as u32;
                Value::Number(parse_int(&first.to_string(), radix))
            }
            BuiltinFunction::ParseFloat => Value::Number(parse_float(&first.to_string())),
            BuiltinFunction::MathMax => Value::Number(fold_numbers(&args, f64::NEG_INFINITY, f64::max)),
            BuiltinFunction::MathMin => Value::Number(fold_numbers(&args, f64::INFINITY, f64::min)),
            BuiltinFunction::MathRound => Value::Number((first.to_number() + 0.5).floor()),
            BuiltinFunction::MathFloor => Value::Number(first.to_number().floor()),
            BuiltinFunction::MathCeil => Value::Number(first.to_number().ceil()),
            BuiltinFunction::MathAbs => Value::Number(first.to_number().abs()),
            BuiltinFunction::ConsoleInfo
            | BuiltinFunction::ConsoleDebug
            | BuiltinFunction::ConsoleWarn
            | BuiltinFunction::ConsoleError => {
                let message = args.iter().map(console_text).collect::<Vec<_>>().join(" ");
                let module = self.path().display().to_string();
                match builtin {
                    BuiltinFunction::ConsoleDebug => tracing::debug!(%module, "{}", message),
                    BuiltinFunction::ConsoleWarn => tracing::warn!(%module, "{}", message),
                    BuiltinFunction::ConsoleError => tracing::error!(%module, "{}", message),
                    _ => tracing::info!(%module, "{}", message),
                }
                Value::Undefined
            }
        };
        Ok(value)
    }
}

/// Own enumerable `[key, value]` pairs, as `Object.entries` sees them.
fn own_entries(value: &Value) -> Result<Vec<(String, Value)>> {
    Ok(match value {
        Value::Undefined | Value::Null => {
            return Err(Error::type_error("Cannot convert undefined or null to object"));
        }
        Value::Object(object) => object.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v.clone()))
            .collect(),
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (i.to_string(), Value::String(c.to_string())))
            .collect(),
        _ => Vec::new(),
    })
}

fn json_stringify(value: &Value, indent: Option<&Value>) -> Result<Value> {
    let Some(json) = value.to_json() else {
        return Ok(Value::Undefined);
    };
    let indent = match indent {
        Some(Value::Number(n)) if *n >= 1.0 => " ".repeat(n.min(10.0) as usize),
        Some(Value::String(s)) => s.chars().take(10).collect(),
        _ => String::new(),
    };
    if indent.is_empty() {
        return Ok(Value::String(json.to_string()));
    }
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    serde::Serialize::serialize(&json, &mut serializer)?;
    Ok(Value::String(String::from_utf8_lossy(&out).into_owned()))
}

fn console_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => value
            .to_json()
            .map_or_else(|| value.to_string(), |json| json.to_string()),
        other => other.to_string(),
    }
}

fn fold_numbers(args: &[Value], init: f64, f: fn(f64, f64) -> f64) -> f64 {
    let mut result = init;
    for arg in args {
        let n = arg.to_number();
        if n.is_nan() {
            return f64::NAN;
        }
        result = f(result, n);
    }
    result
}

/// `parseInt`: leading digits in `radix` (10, or 16 after `0x`).
fn parse_int(input: &str, radix: u32) -> f64 {
    let s = input.trim_start();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (radix, s) = match (radix, s.get(..2)) {
        (0 | 16, Some("0x" | "0X")) => (16, &s[2..]),
        (0, _) => (10, s),
        (r, _) => (r, s),
    };
    if !(2..=36).contains(&radix) {
        return f64::NAN;
    }
    let digits: String = s.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    let value = digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    if negative { -value } else { value }
}

/// `parseFloat`: the longest numeric prefix.
fn parse_float(input: &str) -> f64 {
    let s = input.trim_start();
    if s.starts_with("Infinity") || s.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if s.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {}
            b'+' | b'-' if end == 0 || matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if !seen_exp && end > 0 => seen_exp = true,
            _ => break,
        }
        end += 1;
    }
    // back off an exponent or sign with no digits after it
    let mut candidate = &s[..end];
    while !candidate.is_empty() {
        if let Ok(n) = candidate.parse::<f64>() {
            return n;
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    f64::NAN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42px", 0), 42.0);
        assert_eq!(parse_int("  -0x1F", 0), -31.0);
        assert_eq!(parse_int("777", 8), 511.0);
        assert!(parse_int("px", 0).is_nan());
        assert!(parse_int("1", 40).is_nan());
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float("3.5rem"), 3.5);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("2e"), 2.0);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
        assert!(parse_float(".").is_nan());
    }

    #[test]
    fn test_json_stringify_indent() {
        let mut object = Object::new();
        object.set("a", Value::Number(1.0));
        object.set("skip", Value::Undefined);
        let value = Value::Object(object);
        assert_eq!(
            json_stringify(&value, None).unwrap(),
            Value::String(r#"{"a":1}"#.into())
        );
        assert_eq!(
            json_stringify(&value, Some(&Value::Number(2.0))).unwrap(),
            Value::String("{\n  \"a\": 1\n}".into())
        );
        assert_eq!(json_stringify(&Value::Undefined, None).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_construct_globals() {
        let url = construct_global(
            "URL",
            vec![Value::String("./src/".into()), Value::String("file:///p/a.mjs".into())],
        )
        .unwrap();
        assert_eq!(url, Value::String("file:///p/src/".into()));

        let error = construct_global("TypeError", vec![Value::String("bad".into())]).unwrap();
        assert_eq!(error.to_error_string(), "TypeError: bad");

        let regexp = construct_global("RegExp", vec![Value::String("a+".into()), Value::String("g".into())])
            .unwrap();
        assert_eq!(regexp, Value::RegExp(RegExp::new("a+", "g")));

        assert!(matches!(construct_global("Map", Vec::new()), Err(Error::ReferenceError(_))));
    }
}
