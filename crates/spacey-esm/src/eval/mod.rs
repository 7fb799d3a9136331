// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module evaluation.
//!
//! An [`Evaluator`] links a module graph: it hoists imports and function
//! declarations, evaluates dependencies first (each at most once), then runs
//! the module body top to bottom and collects its exports.
//!
//! Values are reference counted without synchronization, so an evaluator and
//! everything it produces stay on the thread that created them. Only the
//! JSON [`Namespace`] leaves.

mod builtins;
mod environment;
mod function;
mod host;
mod interpreter;
mod methods;
mod value;

pub use function::Closure;
pub use host::{BuiltinModule, ImportHost, Resolution};
pub use value::{BuiltinFunction, External, Namespace, Object, RegExp, Value, number_to_string};

use crate::ast::{Expression, ImportDeclaration, ImportSpecifier, Item, Module, Statement};
use crate::{Dialect, Error, Parser, Result};
use environment::Environment;
use interpreter::Interpreter;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, trace};

/// Evaluates modules against an [`ImportHost`].
pub struct Evaluator<'h> {
    host: &'h dyn ImportHost,
    /// Exports of every module evaluated so far
    modules: HashMap<PathBuf, Object>,
    /// Modules currently being evaluated, outermost first
    loading: Vec<PathBuf>,
}

/// A module export, read once the body has run.
enum Export {
    /// Computed where the export appears (`export default expr`, re-exports)
    Value(Value),
    /// Local binding, read at the end so later assignments show
    Local(String),
}

impl<'h> Evaluator<'h> {
    /// Create an evaluator with an empty module cache.
    pub fn new(host: &'h dyn ImportHost) -> Self {
        Self {
            host,
            modules: HashMap::new(),
            loading: Vec::new(),
        }
    }

    /// Evaluate `source` as the module at `path` and return its exports.
    pub fn evaluate(&mut self, path: &Path, source: &str, dialect: Dialect) -> Result<Namespace> {
        let exports = self.evaluate_module(path, source, dialect)?;
        Ok(exports.to_namespace())
    }

    /// Paths of all modules evaluated by this evaluator.
    pub fn loaded_modules(&self) -> impl Iterator<Item = &Path> {
        self.modules.keys().map(PathBuf::as_path)
    }

    fn evaluate_module(&mut self, path: &Path, source: &str, dialect: Dialect) -> Result<Object> {
        if self.loading.iter().any(|p| p == path) {
            return Err(Error::CircularImport(path.to_path_buf()));
        }
        if let Some(exports) = self.modules.get(path) {
            return Ok(exports.clone());
        }

        let module = Parser::with_dialect(source, dialect).parse_module()?;

        self.loading.push(path.to_path_buf());
        let result = self.run(path, &module);
        self.loading.pop();
        let exports = result?;

        debug!(path = %path.display(), exports = exports.len(), "Evaluated module");
        self.modules.insert(path.to_path_buf(), exports.clone());
        Ok(exports)
    }

    fn run(&mut self, path: &Path, module: &Module) -> Result<Object> {
        let env = Environment::new();
        let mut interpreter = Interpreter::new(path);

        for item in &module.body {
            if let Item::Import(declaration) = item {
                self.bind_import(&env, declaration, path)?;
            }
        }
        for item in &module.body {
            match item {
                Item::Statement(Statement::Function(function)) | Item::ExportFunction(function) => {
                    interpreter.declare_function(function, &env)?;
                }
                Item::ExportDefault(Expression::Function(function)) if function.name.is_some() => {
                    interpreter.declare_function(function, &env)?;
                }
                _ => {}
            }
        }

        let mut exports = Vec::new();
        for item in &module.body {
            match item {
                Item::Import(_) => {}
                Item::Statement(statement) => {
                    // top-level `return`, `break` and `continue` do not parse
                    interpreter.execute(statement, &env)?;
                }
                Item::ExportDeclaration(declaration) => {
                    interpreter.declare_variables(declaration, &env)?;
                    for declarator in &declaration.declarations {
                        for name in declarator.target.bound_names() {
                            exports.push((name.to_string(), Export::Local(name.to_string())));
                        }
                    }
                }
                Item::ExportFunction(function) => {
                    if let Some(name) = &function.name {
                        exports.push((name.clone(), Export::Local(name.clone())));
                    }
                }
                Item::ExportDefault(Expression::Function(function)) if function.name.is_some() => {
                    let name = function.name.clone().unwrap_or_default();
                    exports.push(("default".to_string(), Export::Local(name)));
                }
                Item::ExportDefault(expr) => {
                    let value = interpreter.eval(expr, &env)?;
                    exports.push(("default".to_string(), Export::Value(value)));
                }
                Item::ExportNamed(specifiers) => {
                    for specifier in specifiers {
                        let local = Export::Local(specifier.local.clone());
                        exports.push((specifier.exported.clone(), local));
                    }
                }
                Item::ExportFrom { source, specifiers } => {
                    let namespace = self.load(source, path)?;
                    for specifier in specifiers {
                        let value = import_binding(&namespace, &specifier.local, source)?;
                        exports.push((specifier.exported.clone(), Export::Value(value)));
                    }
                }
            }
        }

        let mut object = Object::new();
        for (name, export) in exports {
            let value = match export {
                Export::Value(value) => value,
                Export::Local(local) => env.get(&local).ok_or(Error::ReferenceError(local))?,
            };
            object.set(name, value);
        }
        Ok(object)
    }

    fn bind_import(&mut self, env: &Rc<Environment>, declaration: &ImportDeclaration, importer: &Path) -> Result<()> {
        let source = &declaration.source;
        let namespace = self.load(source, importer)?;
        for specifier in &declaration.specifiers {
            match specifier {
                ImportSpecifier::Default(local) => {
                    env.declare(local, import_binding(&namespace, "default", source)?, false)?;
                }
                ImportSpecifier::Named { imported, local } => {
                    env.declare(local, import_binding(&namespace, imported, source)?, false)?;
                }
                ImportSpecifier::Namespace(local) => env.declare(local, namespace.clone(), false)?,
            }
        }
        Ok(())
    }

    /// Namespace value for `specifier`: an object of exports, or an
    /// external namespace.
    fn load(&mut self, specifier: &str, importer: &Path) -> Result<Value> {
        if let Some(builtin) = BuiltinModule::from_specifier(specifier) {
            return Ok(Value::Object(builtin.namespace()));
        }

        let resolution = self.host.resolve(specifier, importer)?;
        trace!(specifier, ?resolution, "Resolved import");

        match resolution {
            Resolution::Module { path, dialect } => {
                if self.loading.contains(&path) {
                    return Err(Error::CircularImport(path));
                }
                if let Some(exports) = self.modules.get(&path) {
                    return Ok(Value::Object(exports.clone()));
                }
                let source = std::fs::read_to_string(&path)?;
                Ok(Value::Object(self.evaluate_module(&path, &source, dialect)?))
            }
            Resolution::Json(path) => {
                if let Some(exports) = self.modules.get(&path) {
                    return Ok(Value::Object(exports.clone()));
                }
                let text = std::fs::read_to_string(&path)?;
                let json: serde_json::Value = serde_json::from_str(&text)?;
                let mut exports = Object::new();
                exports.set("default", Value::from_json(&json));
                self.modules.insert(path, exports.clone());
                Ok(Value::Object(exports))
            }
            Resolution::External(module) => Ok(Value::External(External::namespace(module))),
        }
    }
}

fn import_binding(namespace: &Value, name: &str, source: &str) -> Result<Value> {
    match namespace {
        Value::Object(exports) => exports.get(name).cloned().ok_or_else(|| Error::MissingExport {
            module: source.to_string(),
            name: name.to_string(),
        }),
        Value::External(ext) => Ok(Value::External(ext.member(name))),
        _ => Ok(Value::Undefined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    /// Resolves relative specifiers against the importer's directory and
    /// keeps every bare specifier external.
    struct TestHost;

    impl ImportHost for TestHost {
        fn resolve(&self, specifier: &str, importer: &Path) -> Result<Resolution> {
            if specifier.starts_with('.') {
                let dir = importer.parent().unwrap_or(Path::new("/"));
                let path = dir.join(specifier);
                if !path.exists() {
                    return Err(Error::module_not_found(specifier, importer));
                }
                if path.extension().is_some_and(|e| e == "json") {
                    return Ok(Resolution::Json(path));
                }
                let dialect = Dialect::from_path(&path);
                return Ok(Resolution::Module { path, dialect });
            }
            Ok(Resolution::External(specifier.to_string()))
        }
    }

    fn eval(source: &str) -> Result<Namespace> {
        Evaluator::new(&TestHost).evaluate(
            Path::new("/project/astro.config.mjs"),
            source,
            Dialect::JavaScript,
        )
    }

    #[test]
    fn test_default_export_object() {
        let exports = eval("export default { site: 'https://x', server: { port: 4321 } }").unwrap();
        assert_eq!(
            serde_json::Value::Object(exports),
            json!({ "default": { "site": "https://x", "server": { "port": 4321 } } })
        );
    }

    #[test]
    fn test_define_config_is_identity() {
        let exports = eval(
            r#"
            import { defineConfig } from 'astro/config';
            const base = '/docs';
            export default defineConfig({ base, trailingSlash: `${base}/` });
            "#,
        )
        .unwrap();
        assert_eq!(exports["default"], json!({ "base": "/docs", "trailingSlash": "/docs/" }));
    }

    #[test]
    fn test_external_integrations() {
        let exports = eval(
            r#"
            import { defineConfig } from 'astro/config';
            import tailwind from '@astrojs/tailwind';
            import * as remark from 'remark-toc';
            export default defineConfig({
                integrations: [tailwind({ applyBaseStyles: false })],
                markdown: { remarkPlugins: [remark.default] },
            });
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"]["integrations"][0],
            json!({ "$external": {
                "module": "@astrojs/tailwind",
                "export": "default",
                "args": [{ "applyBaseStyles": false }]
            }})
        );
        assert_eq!(
            exports["default"]["markdown"]["remarkPlugins"][0],
            json!({ "$external": { "module": "remark-toc", "export": "default" } })
        );
    }

    #[test]
    fn test_named_exports_and_spread() {
        let exports = eval(
            r#"
            const shared = { output: 'static', base: '/' };
            const extra = ['a', 'b'];
            export const list = [...extra, 'c'];
            export { shared as common };
            export default { ...shared, base: '/blog' };
            "#,
        )
        .unwrap();
        assert_eq!(exports["list"], json!(["a", "b", "c"]));
        assert_eq!(exports["common"], json!({ "output": "static", "base": "/" }));
        assert_eq!(exports["default"], json!({ "output": "static", "base": "/blog" }));
    }

    #[test]
    fn test_env_fallbacks_and_operators() {
        let exports = eval(
            r#"
            const mode = process.env.SPACEY_ESM_TEST_UNSET_VARIABLE ?? 'development';
            export default {
                mode,
                prod: mode === 'production' ? 'yes' : 'no',
                kind: typeof someUndeclaredName,
                fallback: '' || 'empty',
                off: !true,
            };
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"],
            json!({
                "mode": "development",
                "prod": "no",
                "kind": "undefined",
                "fallback": "empty",
                "off": false
            })
        );
    }

    #[test]
    fn test_undefined_properties_are_dropped() {
        let exports = eval("export default { a: undefined, b: null, c: [undefined] }").unwrap();
        assert_eq!(exports["default"], json!({ "b": null, "c": [null] }));
    }

    #[test]
    fn test_import_meta_and_url() {
        let exports = eval(
            r#"
            export default {
                src: new URL('./src/', import.meta.url),
                dir: import.meta.dirname,
            };
            "#,
        )
        .unwrap();
        assert_eq!(exports["default"]["src"], "file:///project/src/");
        assert_eq!(exports["default"]["dir"], "/project");
    }

    #[test]
    fn test_throw_is_reported() {
        let err = eval("throw new Error('no config here')").unwrap_err();
        assert_eq!(err.to_string(), "Uncaught Error: no config here");
    }

    #[test]
    fn test_reference_error() {
        let err = eval("export default { site }").unwrap_err();
        assert!(matches!(err, Error::ReferenceError(ref name) if name == "site"));
    }

    #[test]
    fn test_calling_plain_value_is_type_error() {
        let err = eval("const config = {}; export default config.build()").unwrap_err();
        assert!(matches!(err, Error::TypeError(ref msg) if msg == "config.build is not a function"));
    }

    #[test]
    fn test_redeclaration() {
        let err = eval("const a = 1; const a = 2;").unwrap_err();
        assert!(matches!(err, Error::Redeclaration(ref name) if name == "a"));
    }

    #[test]
    fn test_missing_builtin_export() {
        let err = eval("import { getViteConfig } from 'astro/config';").unwrap_err();
        assert!(matches!(err, Error::MissingExport { ref name, .. } if name == "getViteConfig"));
    }

    #[test]
    fn test_relative_and_json_imports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("shared.mjs"),
            "export const base = '/docs'; export default { output: 'static' };",
        )
        .unwrap();
        fs::write(dir.path().join("site.json"), r#"{ "url": "https://x" }"#).unwrap();
        let entry = dir.path().join("astro.config.mjs");

        let mut evaluator = Evaluator::new(&TestHost);
        let exports = evaluator
            .evaluate(
                &entry,
                r#"
                import shared, { base } from './shared.mjs';
                import site from './site.json';
                export { base } from './shared.mjs';
                export default { ...shared, base, site: site.url };
                "#,
                Dialect::JavaScript,
            )
            .unwrap();

        assert_eq!(
            exports["default"],
            json!({ "output": "static", "base": "/docs", "site": "https://x" })
        );
        assert_eq!(exports["base"], "/docs");
        assert_eq!(evaluator.loaded_modules().count(), 3);
    }

    #[test]
    fn test_circular_import() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mjs"), "import './b.mjs'; export default 1;").unwrap();
        fs::write(dir.path().join("b.mjs"), "import './a.mjs'; export default 2;").unwrap();
        let entry = dir.path().join("a.mjs");
        let source = fs::read_to_string(&entry).unwrap();

        let err = Evaluator::new(&TestHost)
            .evaluate(&entry, &source, Dialect::JavaScript)
            .unwrap_err();
        assert!(matches!(err, Error::CircularImport(_)));
    }

    #[test]
    fn test_missing_relative_module() {
        let err = eval("import './nope.mjs';").unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { ref specifier, .. } if specifier == "./nope.mjs"));
    }

    #[test]
    fn test_arithmetic_and_concatenation() {
        let exports = eval(
            r#"
            const host = 'x.com';
            const port = 4000 + 321;
            export default {
                site: 'https://' + host,
                port,
                half: port / 2 - 0.5,
                label: 'v' + 1 + 2,
                size: 1 + 2 + 'px',
                power: 2 ** 10 % 1000,
            };
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"],
            json!({
                "site": "https://x.com",
                "port": 4321,
                "half": 2160,
                "label": "v12",
                "size": "3px",
                "power": 24
            })
        );
    }

    #[test]
    fn test_functions_and_closures() {
        let exports = eval(
            r#"
            function withBase(path) { return base + path; }
            const base = '/docs';
            const make = (name, options = {}) => ({ name, ...options });
            const counter = () => { let n = 0; return () => ++n; };
            const next = counter();
            next();
            export default {
                page: withBase('/intro'),
                made: make('x', { y: 1 }),
                count: next(),
                doubled: [1, 2, 3].map((n) => n * 2).filter((n) => n > 2),
            };
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"],
            json!({
                "page": "/docs/intro",
                "made": { "name": "x", "y": 1 },
                "count": 2,
                "doubled": [4, 6]
            })
        );
    }

    #[test]
    fn test_plugin_objects_keep_data_properties() {
        let exports = eval(
            r#"
            import { defineConfig } from 'astro/config';
            function rename() {
                return {
                    name: 'rename',
                    enforce: 'pre',
                    transform(code) { return code.replace(/a/g, 'b'); },
                };
            }
            export default defineConfig({ vite: { plugins: [rename(), { name: 'p', load: async (id) => null }] } });
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"],
            json!({ "vite": { "plugins": [{ "name": "rename", "enforce": "pre" }, { "name": "p" }] } })
        );
    }

    #[test]
    fn test_control_flow() {
        let exports = eval(
            r#"
            let mode = 'dev';
            if (process.env.SPACEY_ESM_TEST_UNSET_VARIABLE) {
                mode = 'prod';
            } else if (1 > 0) {
                mode = 'test';
            }
            const pages = [];
            for (const name of ['a', 'b', 'skip', 'c']) {
                if (name === 'skip') continue;
                pages.push(`/${name}`);
            }
            let total = 0;
            for (let i = 0; i < 5; i++) {
                if (i === 3) break;
                total += i;
            }
            let failure;
            try {
                JSON.parse('{');
            } catch (e) {
                failure = e.name;
            } finally {
                total *= 10;
            }
            export default { mode, pages, total, failure };
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"],
            json!({ "mode": "test", "pages": ["/a", "/b", "/c"], "total": 30, "failure": "SyntaxError" })
        );
    }

    #[test]
    fn test_member_assignment() {
        let exports = eval(
            r#"
            const config = { vite: {} };
            config.vite.server = { port: 3000 };
            config.vite.server.port += 1;
            const list = [];
            list[2] = 'c';
            Object.assign(config, { base: '/' });
            export default { config, length: list.length };
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"],
            json!({ "config": { "vite": { "server": { "port": 3001 } }, "base": "/" }, "length": 3 })
        );
    }

    #[test]
    fn test_string_and_regex_methods() {
        let exports = eval(
            r#"
            const base = '/blog/'.replace(/\/$/, '');
            const slug = 'Hello World'.toLowerCase().split(' ').join('-');
            export default { base, slug, ok: /^\/\w+$/.test(base), trimmed: '  x '.trim() };
            "#,
        )
        .unwrap();
        assert_eq!(
            exports["default"],
            json!({ "base": "/blog", "slug": "hello-world", "ok": true, "trimmed": "x" })
        );
    }

    #[test]
    fn test_catch_binds_thrown_value() {
        let exports = eval(
            r#"
            let code;
            try { throw { code: 7 }; } catch ({ code: caught }) { code = caught; }
            export default code;
            "#,
        )
        .unwrap();
        assert_eq!(exports["default"], 7);
    }

    #[test]
    fn test_exported_bindings_are_live() {
        let exports = eval(
            r#"
            export let count = 1;
            export function bump() { count += 1; }
            bump();
            export default function settings() {}
            "#,
        )
        .unwrap();
        assert_eq!(exports["count"], 2);
        assert!(!exports.contains_key("bump"));
        assert!(!exports.contains_key("default"));
    }

    #[test]
    fn test_const_reassignment() {
        let err = eval("const a = 1; a = 2;").unwrap_err();
        assert_eq!(err.to_string(), "TypeError: Assignment to constant variable.");
    }

    #[test]
    fn test_runaway_recursion() {
        let err = eval("function f() { return f(); } export default f();").unwrap_err();
        assert_eq!(err.to_string(), "Uncaught RangeError: Maximum call stack size exceeded");
    }

    #[test]
    fn test_skipped_function_body_cannot_run() {
        let err = eval("function* pages() { yield 1; } export default [...pages()];").unwrap_err();
        assert!(matches!(err, Error::TypeError(ref msg) if msg.contains("pages")));
    }
}
