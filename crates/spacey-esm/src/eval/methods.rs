// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in methods of strings, arrays, numbers, regular expressions and
//! functions.
//!
//! Indices count `char`s rather than UTF-16 code units; the two agree for
//! the ASCII paths and URLs configuration files work with.

use super::interpreter::{Interpreter, iterate};
use super::value::{Object, RegExp, Value, number_to_string};
use crate::{Error, Result};
use regex::{Captures, Regex};
use std::cmp::Ordering;

/// Longest string `repeat` and `padStart`/`padEnd` will build.
const MAX_STRING_LENGTH: usize = 1 << 24;

impl Interpreter {
    /// Calls the built-in method `name` on `receiver`. `None` when the
    /// receiver has no such method. Array mutators change `receiver`.
    pub(super) fn call_method(&mut self, receiver: &mut Value, name: &str, args: Vec<Value>) -> Result<Option<Value>> {
        match receiver {
            Value::String(s) => {
                let s = s.clone();
                self.string_method(&s, name, args)
            }
            Value::Array(items) => self.array_method(items, name, args),
            Value::Number(n) => number_method(*n, name, &args),
            Value::Boolean(b) => Ok(match name {
                "toString" => Some(Value::String(b.to_string())),
                "valueOf" => Some(Value::Boolean(*b)),
                _ => None,
            }),
            Value::RegExp(regexp) => regexp_method(regexp, name, &args),
            Value::Object(object) => Ok(object_method(object, name, &args)),
            Value::Closure(_) | Value::Builtin(_) => self.function_method(receiver.clone(), name, args),
            Value::External(ext) if ext.arguments.is_none() => {
                let function = Value::External(ext.clone());
                self.function_method(function, name, args)
            }
            _ => Ok(None),
        }
    }

    /// `call` and `apply`.
    fn function_method(&mut self, function: Value, name: &str, args: Vec<Value>) -> Result<Option<Value>> {
        let mut args = args.into_iter();
        let this = args.next().unwrap_or(Value::Undefined);
        let args: Vec<Value> = match name {
            "call" => args.collect(),
            "apply" => match args.next() {
                None | Some(Value::Undefined | Value::Null) => Vec::new(),
                Some(list) => iterate(list)?,
            },
            _ => return Ok(None),
        };
        self.call(function, this, args).map(Some)
    }

    fn string_method(&mut self, s: &str, name: &str, args: Vec<Value>) -> Result<Option<Value>> {
        let length = s.chars().count();
        let value = match name {
            "toString" | "valueOf" => Value::String(s.to_string()),
            "startsWith" => {
                let search = string_arg(&args, 0);
                let from = index_arg(args.get(1), length, 0);
                Value::Boolean(char_slice(s, from, length).starts_with(&search))
            }
            "endsWith" => {
                let search = string_arg(&args, 0);
                let end = index_arg(args.get(1), length, length);
                Value::Boolean(char_slice(s, 0, end).ends_with(&search))
            }
            "includes" => Value::Boolean(s.contains(&string_arg(&args, 0))),
            "indexOf" => {
                let search = string_arg(&args, 0);
                let from = clamp_arg(args.get(1), length, 0);
                let found = char_slice(s, from, length)
                    .find(&search)
                    .map(|byte| from + char_count(s, from, byte));
                Value::Number(found.map_or(-1.0, |i| i as f64))
            }
            "lastIndexOf" => {
                let search = string_arg(&args, 0);
                let found = s.rfind(&search).map(|byte| s[..byte].chars().count());
                Value::Number(found.map_or(-1.0, |i| i as f64))
            }
            "slice" => {
                let start = index_arg(args.first(), length, 0);
                let end = index_arg(args.get(1), length, length);
                Value::String(char_slice(s, start, end.max(start)))
            }
            "substring" => {
                let start = clamp_arg(args.first(), length, 0);
                let end = clamp_arg(args.get(1), length, length);
                Value::String(char_slice(s, start.min(end), start.max(end)))
            }
            "trim" => Value::String(s.trim().to_string()),
            "trimStart" => Value::String(s.trim_start().to_string()),
            "trimEnd" => Value::String(s.trim_end().to_string()),
            "toLowerCase" => Value::String(s.to_lowercase()),
            "toUpperCase" => Value::String(s.to_uppercase()),
            "at" => {
                let n = args.first().map_or(0.0, Value::to_number).trunc();
                let index = if n < 0.0 { length as f64 + n } else { n };
                if index < 0.0 || index >= length as f64 {
                    Value::Undefined
                } else {
                    Value::String(char_slice(s, index as usize, index as usize + 1))
                }
            }
            "charAt" => {
                let index = clamp_arg(args.first(), length, 0);
                Value::String(char_slice(s, index, (index + 1).min(length)))
            }
            "charCodeAt" => {
                let index = clamp_arg(args.first(), length, 0);
                s.chars()
                    .nth(index)
                    .map_or(Value::Number(f64::NAN), |c| Value::Number(f64::from(u32::from(c))))
            }
            "concat" => {
                let mut out = s.to_string();
                for arg in &args {
                    out.push_str(&arg.to_string());
                }
                Value::String(out)
            }
            "repeat" => {
                let count = args.first().map_or(0.0, Value::to_number);
                if count < 0.0 || count.is_infinite() || s.len() as f64 * count > MAX_STRING_LENGTH as f64 {
                    return Err(Error::Thrown(format!("RangeError: Invalid count value: {}", number_to_string(count))));
                }
                Value::String(s.repeat(count as usize))
            }
            "padStart" | "padEnd" => {
                let target = clamp_arg(args.first(), MAX_STRING_LENGTH, 0);
                let fill = match args.get(1) {
                    None | Some(Value::Undefined) => " ".to_string(),
                    Some(fill) => fill.to_string(),
                };
                if target <= length || fill.is_empty() {
                    Value::String(s.to_string())
                } else {
                    let padding: String = fill.chars().cycle().take(target - length).collect();
                    Value::String(if name == "padStart" {
                        padding + s
                    } else {
                        s.to_string() + &padding
                    })
                }
            }
            "split" => {
                let limit = match args.get(1) {
                    None | Some(Value::Undefined) => usize::MAX,
                    Some(limit) => limit.to_number().max(0.0) as usize,
                };
                let parts: Vec<String> = match args.first() {
                    None | Some(Value::Undefined) => vec![s.to_string()],
                    Some(Value::RegExp(regexp)) => {
                        let regex = regexp.compile()?;
                        regex.split(s).map(str::to_string).collect()
                    }
                    Some(separator) => {
                        let separator = separator.to_string();
                        if separator.is_empty() {
                            s.chars().map(String::from).collect()
                        } else {
                            s.split(separator.as_str()).map(str::to_string).collect()
                        }
                    }
                };
                Value::Array(parts.into_iter().take(limit).map(Value::String).collect())
            }
            "replace" | "replaceAll" => {
                let replacement = args.get(1).cloned().unwrap_or(Value::Undefined);
                let (regex, global) = match args.first() {
                    Some(Value::RegExp(regexp)) => {
                        if name == "replaceAll" && !regexp.global() {
                            return Err(Error::type_error(
                                "replaceAll must be called with a global RegExp",
                            ));
                        }
                        (regexp.compile()?, regexp.global())
                    }
                    pattern => {
                        let pattern = pattern.map(Value::to_string).unwrap_or_else(|| "undefined".to_string());
                        (literal_regex(&pattern)?, name == "replaceAll")
                    }
                };
                Value::String(self.replace_matches(s, &regex, global, &replacement)?)
            }
            "match" => {
                let regexp = match args.first() {
                    Some(Value::RegExp(regexp)) => regexp.clone(),
                    None | Some(Value::Undefined) => RegExp::new("(?:)", ""),
                    Some(other) => RegExp::new(other.to_string(), ""),
                };
                let regex = regexp.compile()?;
                if regexp.global() {
                    let found: Vec<Value> = regex
                        .find_iter(s)
                        .map(|m| Value::String(m.as_str().to_string()))
                        .collect();
                    if found.is_empty() { Value::Null } else { Value::Array(found) }
                } else {
                    match_result(&regex, s)
                }
            }
            "search" => {
                let regex = match args.first() {
                    Some(Value::RegExp(regexp)) => regexp.compile()?,
                    other => literal_regex(&other.map(Value::to_string).unwrap_or_default())?,
                };
                let found = regex.find(s).map(|m| s[..m.start()].chars().count());
                Value::Number(found.map_or(-1.0, |i| i as f64))
            }
            "localeCompare" => {
                let other = string_arg(&args, 0);
                Value::Number(match s.cmp(other.as_str()) {
                    Ordering::Less => -1.0,
                    Ordering::Equal => 0.0,
                    Ordering::Greater => 1.0,
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// `String.prototype.replace` over the matches of `regex`.
    fn replace_matches(&mut self, s: &str, regex: &Regex, global: bool, replacement: &Value) -> Result<String> {
        let template = (!replacement.is_callable()).then(|| replacement.to_string());
        let mut out = String::with_capacity(s.len());
        let mut last = 0;
        for captures in regex.captures_iter(s) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            out.push_str(&s[last..whole.start()]);
            match &template {
                Some(template) => expand_replacement(template, &captures, s, &mut out),
                None => {
                    let mut args: Vec<Value> = captures
                        .iter()
                        .map(|m| m.map_or(Value::Undefined, |m| Value::String(m.as_str().to_string())))
                        .collect();
                    args.push(Value::Number(s[..whole.start()].chars().count() as f64));
                    args.push(Value::String(s.to_string()));
                    let result = self.call(replacement.clone(), Value::Undefined, args)?;
                    out.push_str(&result.to_string());
                }
            }
            last = whole.end();
            if !global {
                break;
            }
        }
        out.push_str(&s[last..]);
        Ok(out)
    }

    fn array_method(&mut self, items: &mut Vec<Value>, name: &str, args: Vec<Value>) -> Result<Option<Value>> {
        let length = items.len();
        let value = match name {
            "push" => {
                items.extend(args);
                Value::Number(items.len() as f64)
            }
            "pop" => items.pop().unwrap_or(Value::Undefined),
            "shift" => {
                if items.is_empty() {
                    Value::Undefined
                } else {
                    items.remove(0)
                }
            }
            "unshift" => {
                items.splice(0..0, args);
                Value::Number(items.len() as f64)
            }
            "reverse" => {
                items.reverse();
                Value::Array(items.clone())
            }
            "sort" => {
                let sorted = self.sort(std::mem::take(items), args.first())?;
                *items = sorted;
                Value::Array(items.clone())
            }
            "toString" => Value::String(Value::Array(items.clone()).to_string()),
            "join" => {
                let separator = match args.first() {
                    None | Some(Value::Undefined) => ",".to_string(),
                    Some(separator) => separator.to_string(),
                };
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| if item.is_nullish() { String::new() } else { item.to_string() })
                    .collect();
                Value::String(parts.join(&separator))
            }
            "includes" => {
                let search = args.first().cloned().unwrap_or(Value::Undefined);
                Value::Boolean(items.iter().any(|item| same_value_zero(item, &search)))
            }
            "indexOf" => {
                let search = args.first().cloned().unwrap_or(Value::Undefined);
                let found = items.iter().position(|item| item.strict_equals(&search));
                Value::Number(found.map_or(-1.0, |i| i as f64))
            }
            "at" => {
                let n = args.first().map_or(0.0, Value::to_number).trunc();
                let index = if n < 0.0 { length as f64 + n } else { n };
                if index < 0.0 {
                    Value::Undefined
                } else {
                    items.get(index as usize).cloned().unwrap_or(Value::Undefined)
                }
            }
            "slice" => {
                let start = index_arg(args.first(), length, 0);
                let end = index_arg(args.get(1), length, length).max(start);
                Value::Array(items[start..end].to_vec())
            }
            "concat" => {
                let mut out = items.clone();
                for arg in args {
                    match arg {
                        Value::Array(more) => out.extend(more),
                        other => out.push(other),
                    }
                }
                Value::Array(out)
            }
            "flat" => {
                let depth = match args.first() {
                    None | Some(Value::Undefined) => 1,
                    Some(depth) => depth.to_number().max(0.0).min(64.0) as usize,
                };
                Value::Array(flatten(items.clone(), depth))
            }
            "map" | "filter" | "find" | "findIndex" | "findLast" | "some" | "every" | "forEach"
            | "flatMap" => {
                let callback = callback_arg(&args, name)?;
                let snapshot = items.clone();
                self.iterate_with(snapshot, name, callback)?
            }
            "reduce" => {
                let callback = callback_arg(&args, name)?;
                let mut entries = items.clone().into_iter().enumerate();
                let mut accumulator = match args.get(1) {
                    Some(initial) => initial.clone(),
                    None => match entries.next() {
                        Some((_, first)) => first,
                        None => {
                            return Err(Error::type_error("Reduce of empty array with no initial value"));
                        }
                    },
                };
                for (i, item) in entries {
                    let args = vec![accumulator, item, Value::Number(i as f64)];
                    accumulator = self.call(callback.clone(), Value::Undefined, args)?;
                }
                accumulator
            }
            "keys" => Value::Array((0..length).map(|i| Value::Number(i as f64)).collect()),
            "entries" => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Value::Array(vec![Value::Number(i as f64), item.clone()]))
                    .collect(),
            ),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// The callback-driven array methods.
    fn iterate_with(&mut self, items: Vec<Value>, name: &str, callback: Value) -> Result<Value> {
        let mut mapped = Vec::new();
        let indices: Box<dyn Iterator<Item = usize>> = if name == "findLast" {
            Box::new((0..items.len()).rev())
        } else {
            Box::new(0..items.len())
        };
        for i in indices {
            let item = items[i].clone();
            let args = vec![item.clone(), Value::Number(i as f64)];
            let result = self.call(callback.clone(), Value::Undefined, args)?;
            match name {
                "map" => mapped.push(result),
                "flatMap" => match result {
                    Value::Array(inner) => mapped.extend(inner),
                    other => mapped.push(other),
                },
                "filter" if result.is_truthy() => mapped.push(item),
                "find" | "findLast" if result.is_truthy() => return Ok(item),
                "findIndex" if result.is_truthy() => return Ok(Value::Number(i as f64)),
                "some" if result.is_truthy() => return Ok(Value::Boolean(true)),
                "every" if !result.is_truthy() => return Ok(Value::Boolean(false)),
                _ => {}
            }
        }
        Ok(match name {
            "map" | "filter" | "flatMap" => Value::Array(mapped),
            "findIndex" => Value::Number(-1.0),
            "some" => Value::Boolean(false),
            "every" => Value::Boolean(true),
            _ => Value::Undefined,
        })
    }

    /// Stable insertion sort; `undefined` sorts last.
    fn sort(&mut self, items: Vec<Value>, compare: Option<&Value>) -> Result<Vec<Value>> {
        let compare = compare.filter(|c| !c.is_nullish()).cloned();
        if let Some(compare) = &compare {
            if !compare.is_callable() {
                return Err(Error::type_error(
                    "The comparison function must be either a function or undefined",
                ));
            }
        }
        let (mut defined, undefined): (Vec<Value>, Vec<Value>) =
            items.into_iter().partition(|item| !matches!(item, Value::Undefined));

        for i in 1..defined.len() {
            let mut j = i;
            while j > 0 {
                let ordering = match &compare {
                    Some(compare) => {
                        let args = vec![defined[j - 1].clone(), defined[j].clone()];
                        let result = self.call(compare.clone(), Value::Undefined, args)?.to_number();
                        result.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
                    }
                    None => defined[j - 1].to_string().cmp(&defined[j].to_string()),
                };
                if ordering != Ordering::Greater {
                    break;
                }
                defined.swap(j - 1, j);
                j -= 1;
            }
        }
        defined.extend(undefined);
        Ok(defined)
    }
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let value = match name {
        "valueOf" => Value::Number(n),
        "toFixed" => {
            let digits = args.first().map_or(0.0, Value::to_number);
            if !(0.0..=100.0).contains(&digits) {
                return Err(Error::Thrown(
                    "RangeError: toFixed() digits argument must be between 0 and 100".to_string(),
                ));
            }
            if n.is_finite() {
                Value::String(format!("{:.*}", digits as usize, n))
            } else {
                Value::String(number_to_string(n))
            }
        }
        "toString" => {
            let radix = match args.first() {
                None | Some(Value::Undefined) => 10,
                Some(radix) => radix.to_number() as u32,
            };
            if !(2..=36).contains(&radix) {
                return Err(Error::Thrown(
                    "RangeError: toString() radix must be between 2 and 36".to_string(),
                ));
            }
            if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
                Value::String(number_to_string(n))
            } else {
                Value::String(integer_to_radix(n, radix))
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn integer_to_radix(n: f64, radix: u32) -> String {
    let mut digits = Vec::new();
    let mut rest = n.abs();
    while rest >= 1.0 {
        let digit = (rest % f64::from(radix)) as u32;
        digits.push(std::char::from_digit(digit, radix).unwrap_or('0'));
        rest = (rest / f64::from(radix)).floor();
    }
    if digits.is_empty() {
        digits.push('0');
    }
    if n < 0.0 {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

fn regexp_method(regexp: &RegExp, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let input = string_arg(args, 0);
    let value = match name {
        "test" => Value::Boolean(regexp.compile()?.is_match(&input)),
        "exec" => match_result(&regexp.compile()?, &input),
        "toString" => Value::String(regexp.to_string()),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn object_method(object: &Object, name: &str, args: &[Value]) -> Option<Value> {
    match name {
        "hasOwnProperty" => Some(Value::Boolean(object.get(&string_arg(args, 0)).is_some())),
        "toString" => Some(Value::String("[object Object]".to_string())),
        _ => None,
    }
}

/// The array `exec` and non-global `match` return: the match followed by
/// its groups, with `index` and `groups` dropped.
fn match_result(regex: &Regex, input: &str) -> Value {
    match regex.captures(input) {
        Some(captures) => Value::Array(
            captures
                .iter()
                .map(|m| m.map_or(Value::Undefined, |m| Value::String(m.as_str().to_string())))
                .collect(),
        ),
        None => Value::Null,
    }
}

/// Appends `template` with `$&`, `` $` ``, `$'`, `$n` and `$<name>` expanded.
fn expand_replacement(template: &str, captures: &Captures<'_>, input: &str, out: &mut String) {
    let Some(whole) = captures.get(0) else {
        return;
    };
    let mut chars = template.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek().map(|&(_, next)| next) {
            Some('$') => {
                chars.next();
                out.push('$');
            }
            Some('&') => {
                chars.next();
                out.push_str(whole.as_str());
            }
            Some('`') => {
                chars.next();
                out.push_str(&input[..whole.start()]);
            }
            Some('\'') => {
                chars.next();
                out.push_str(&input[whole.end()..]);
            }
            Some(d) if d.is_ascii_digit() => {
                chars.next();
                let mut group = d.to_digit(10).unwrap_or(0) as usize;
                // two-digit references win when that group exists
                if let Some(&(_, second)) = chars.peek() {
                    if let Some(second) = second.to_digit(10) {
                        let wide = group * 10 + second as usize;
                        if wide > 0 && wide < captures.len() {
                            chars.next();
                            group = wide;
                        }
                    }
                }
                if group > 0 && group < captures.len() {
                    out.push_str(captures.get(group).map_or("", |m| m.as_str()));
                } else {
                    out.push('$');
                    out.push(d);
                }
            }
            Some('<') => {
                let rest: String = chars.clone().map(|(_, c)| c).collect();
                match rest[1..].find('>') {
                    Some(end) => {
                        let name = &rest[1..=end];
                        out.push_str(captures.name(name).map_or("", |m| m.as_str()));
                        for _ in 0..name.chars().count() + 2 {
                            chars.next();
                        }
                    }
                    None => out.push('$'),
                }
            }
            _ => out.push('$'),
        }
    }
}

/// A regex matching `pattern` literally.
fn literal_regex(pattern: &str) -> Result<Regex> {
    Regex::new(&regex::escape(pattern))
        .map_err(|e| Error::Thrown(format!("SyntaxError: Invalid regular expression: {}", e)))
}

fn callback_arg(args: &[Value], method: &str) -> Result<Value> {
    match args.first() {
        Some(callback) if callback.is_callable() => Ok(callback.clone()),
        other => Err(Error::type_error(format!(
            "{} is not a function (in Array.prototype.{})",
            other.cloned().unwrap_or(Value::Undefined),
            method
        ))),
    }
}

fn flatten(items: Vec<Value>, depth: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => out.extend(flatten(inner, depth - 1)),
            other => out.push(other),
        }
    }
    out
}

/// `Array.prototype.includes` equality: `NaN` matches itself.
fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
        _ => a.strict_equals(b),
    }
}

fn string_arg(args: &[Value], index: usize) -> String {
    args.get(index).map_or_else(|| "undefined".to_string(), Value::to_string)
}

/// A position argument where negative values count from the end.
fn index_arg(arg: Option<&Value>, length: usize, default: usize) -> usize {
    let Some(arg) = arg.filter(|a| !matches!(a, Value::Undefined)) else {
        return default;
    };
    let n = arg.to_number();
    if n.is_nan() {
        return 0;
    }
    let n = n.trunc();
    if n < 0.0 {
        (length as f64 + n).max(0.0) as usize
    } else {
        n.min(length as f64) as usize
    }
}

/// A position argument clamped to `0..=length`.
fn clamp_arg(arg: Option<&Value>, length: usize, default: usize) -> usize {
    match arg.filter(|a| !matches!(a, Value::Undefined)) {
        None => default,
        Some(arg) => {
            let n = arg.to_number();
            if n.is_nan() { 0 } else { n.trunc().clamp(0.0, length as f64) as usize }
        }
    }
}

fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Chars in the first `byte` bytes of `s` after skipping `skip` chars.
fn char_count(s: &str, skip: usize, byte: usize) -> usize {
    let rest: String = s.chars().skip(skip).collect();
    rest[..byte].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn call(receiver: Value, name: &str, args: Vec<Value>) -> Value {
        let mut interpreter = Interpreter::new(Path::new("/project/astro.config.mjs"));
        let mut receiver = receiver;
        interpreter
            .call_method(&mut receiver, name, args)
            .unwrap()
            .unwrap_or_else(|| panic!("no method {}", name))
    }

    fn s(text: &str) -> Value {
        Value::String(text.to_string())
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(call(s("/docs/"), "startsWith", vec![s("/")]), Value::Boolean(true));
        assert_eq!(call(s("/docs/"), "endsWith", vec![s("/")]), Value::Boolean(true));
        assert_eq!(call(s("astro.config"), "indexOf", vec![s("config")]), Value::Number(6.0));
        assert_eq!(call(s("hello"), "slice", vec![Value::Number(-3.0)]), s("llo"));
        assert_eq!(call(s("hello"), "substring", vec![Value::Number(3.0), Value::Number(1.0)]), s("el"));
        assert_eq!(call(s("7"), "padStart", vec![Value::Number(3.0), s("0")]), s("007"));
        assert_eq!(
            call(s("a,b,,c"), "split", vec![s(",")]),
            Value::Array(vec![s("a"), s("b"), s(""), s("c")])
        );
        assert_eq!(call(s("abc"), "at", vec![Value::Number(-1.0)]), s("c"));
    }

    #[test]
    fn test_replace_with_patterns() {
        let global = Value::RegExp(RegExp::new("(\\w+)@(\\w+)", "g"));
        assert_eq!(
            call(s("a@b c@d"), "replace", vec![global, s("$2 at $1")]),
            s("b at a d at c")
        );
        assert_eq!(call(s("a-b-c"), "replace", vec![s("-"), s("+")]), s("a+b-c"));
        assert_eq!(call(s("a-b-c"), "replaceAll", vec![s("-"), s("$&$&")]), s("a--b--c"));

        let mut interpreter = Interpreter::new(Path::new("/project/astro.config.mjs"));
        let err = interpreter
            .call_method(&mut s("x"), "replaceAll", vec![Value::RegExp(RegExp::new("x", "")), s("y")])
            .unwrap_err();
        assert!(matches!(err, Error::TypeError(_)));
    }

    #[test]
    fn test_array_mutators() {
        let mut interpreter = Interpreter::new(Path::new("/project/astro.config.mjs"));
        let mut list = Value::Array(vec![s("b")]);
        interpreter.call_method(&mut list, "push", vec![s("c")]).unwrap();
        interpreter.call_method(&mut list, "unshift", vec![s("a")]).unwrap();
        assert_eq!(list, Value::Array(vec![s("a"), s("b"), s("c")]));

        let popped = interpreter.call_method(&mut list, "pop", Vec::new()).unwrap();
        assert_eq!(popped, Some(s("c")));
        interpreter.call_method(&mut list, "reverse", Vec::new()).unwrap();
        assert_eq!(list, Value::Array(vec![s("b"), s("a")]));
        interpreter.call_method(&mut list, "sort", Vec::new()).unwrap();
        assert_eq!(list, Value::Array(vec![s("a"), s("b")]));
    }

    #[test]
    fn test_array_queries() {
        let list = Value::Array(vec![Value::Number(1.0), Value::Number(f64::NAN), Value::Null]);
        assert_eq!(call(list.clone(), "includes", vec![Value::Number(f64::NAN)]), Value::Boolean(true));
        assert_eq!(call(list.clone(), "indexOf", vec![Value::Number(f64::NAN)]), Value::Number(-1.0));
        assert_eq!(call(list, "join", vec![s("-")]), s("1-NaN-"));

        let nested = Value::Array(vec![Value::Number(1.0), Value::Array(vec![Value::Array(vec![Value::Number(2.0)])])]);
        assert_eq!(
            call(nested, "flat", Vec::new()),
            Value::Array(vec![Value::Number(1.0), Value::Array(vec![Value::Number(2.0)])])
        );
    }

    #[test]
    fn test_number_and_regexp_methods() {
        assert_eq!(call(Value::Number(1.005), "toFixed", vec![Value::Number(1.0)]), s("1.0"));
        assert_eq!(call(Value::Number(255.0), "toString", vec![Value::Number(16.0)]), s("ff"));
        assert_eq!(
            call(Value::RegExp(RegExp::new("^\\d+$", "")), "test", vec![s("4321")]),
            Value::Boolean(true)
        );
        assert_eq!(
            call(Value::RegExp(RegExp::new("(\\d+)px", "")), "exec", vec![s("12px")]),
            Value::Array(vec![s("12px"), s("12")])
        );
    }

    #[test]
    fn test_unknown_method() {
        let mut interpreter = Interpreter::new(Path::new("/project/astro.config.mjs"));
        assert_eq!(interpreter.call_method(&mut s("x"), "nope", Vec::new()).unwrap(), None);
    }
}
