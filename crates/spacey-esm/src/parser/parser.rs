// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The main parser implementation: module items and token helpers.

use crate::ast::*;
use crate::lexer::{Scanner, Span, Token, TokenKind};
use crate::{Dialect, Error, Result};
use std::rc::Rc;

/// A recursive descent parser for configuration modules.
///
/// Cloning a parser snapshots its position; lookahead and the fallback for
/// function bodies restore from such snapshots.
#[derive(Clone)]
pub struct Parser<'a> {
    pub(super) scanner: Scanner<'a>,
    pub(super) current: Token,
    pub(super) previous: Token,
    pub(super) typescript: bool,
    /// Added to reported offsets (template substitutions are parsed standalone)
    pub(super) base_offset: usize,
    /// Function bodies entered; `return` needs at least one
    pub(super) function_depth: usize,
    /// Loops entered in the current function; `break` needs at least one
    pub(super) loop_depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new JavaScript-dialect parser.
    pub fn new(source: &'a str) -> Self {
        Self::with_dialect(source, Dialect::JavaScript)
    }

    /// Creates a parser that erases TypeScript syntax.
    pub fn new_typescript(source: &'a str) -> Self {
        Self::with_dialect(source, Dialect::TypeScript)
    }

    /// Creates a parser for the given dialect.
    pub fn with_dialect(source: &'a str, dialect: Dialect) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            previous: Token::new(TokenKind::Eof, Span::new(0, 0), false),
            typescript: dialect == Dialect::TypeScript,
            base_offset: 0,
            function_depth: 0,
            loop_depth: 0,
        }
    }

    pub(super) fn dialect(&self) -> Dialect {
        if self.typescript {
            Dialect::TypeScript
        } else {
            Dialect::JavaScript
        }
    }

    /// Parses the source into a [`Module`].
    pub fn parse_module(&mut self) -> Result<Module> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            if let Some(item) = self.parse_item()? {
                body.push(item);
            }
        }

        Ok(Module { body })
    }

    /// Parses a single expression spanning the whole input.
    pub fn parse_standalone_expression(&mut self) -> Result<Expression> {
        let expr = self.parse_expression()?;
        if !self.is_at_end() {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    /// Parses one top-level item; `None` for items that produce nothing
    /// (empty statements and erased TypeScript declarations).
    fn parse_item(&mut self) -> Result<Option<Item>> {
        match &self.current.kind {
            TokenKind::Import
                if !matches!(self.peek_kind(), TokenKind::Dot | TokenKind::LeftParen) =>
            {
                self.parse_import()
            }
            TokenKind::Export => self.parse_export(),
            _ => Ok(self.parse_statement()?.map(Item::Statement)),
        }
    }

    fn parse_import(&mut self) -> Result<Option<Item>> {
        self.advance(); // consume 'import'

        // `import type { A } from 'x'` but not `import type from 'x'`
        let type_only = self.typescript
            && self.check_identifier("type")
            && match self.peek_kind() {
                TokenKind::Identifier(name) => name != "from",
                TokenKind::LeftBrace | TokenKind::Star => true,
                _ => false,
            };
        if type_only {
            self.advance();
        }

        if let TokenKind::String(source) = &self.current.kind {
            let source = source.clone();
            self.advance();
            self.consume_semicolon()?;
            return Ok(Some(Item::Import(ImportDeclaration {
                source,
                specifiers: Vec::new(),
            })));
        }

        let mut specifiers = Vec::new();
        let mut erased = false;

        if matches!(self.current.kind, TokenKind::Identifier(_)) {
            specifiers.push(ImportSpecifier::Default(self.expect_identifier()?));
            if self.check(&TokenKind::Comma) {
                self.advance();
            }
        }

        if self.check(&TokenKind::Star) {
            self.advance();
            self.expect_contextual("as")?;
            specifiers.push(ImportSpecifier::Namespace(self.expect_identifier()?));
        } else if self.check(&TokenKind::LeftBrace) {
            self.advance();
            while !self.check(&TokenKind::RightBrace) {
                let type_specifier = self.at_inline_type_modifier();
                if type_specifier {
                    self.advance();
                }
                let imported = self.expect_module_export_name()?;
                let local = if self.check_identifier("as") {
                    self.advance();
                    self.expect_identifier()?
                } else {
                    imported.clone()
                };
                if type_specifier {
                    erased = true;
                } else {
                    specifiers.push(ImportSpecifier::Named { imported, local });
                }
                if !self.check(&TokenKind::RightBrace) {
                    self.expect(&TokenKind::Comma)?;
                }
            }
            self.advance(); // consume '}'
        }

        if specifiers.is_empty() && !type_only && self.previous.kind != TokenKind::RightBrace {
            return Err(self.unexpected());
        }

        self.expect_contextual("from")?;
        let source = self.expect_string()?;
        self.consume_semicolon()?;

        // `import { type A } from 'x'` leaves nothing to load
        if type_only || (erased && specifiers.is_empty()) {
            return Ok(None);
        }

        Ok(Some(Item::Import(ImportDeclaration { source, specifiers })))
    }

    fn parse_export(&mut self) -> Result<Option<Item>> {
        self.advance(); // consume 'export'

        match &self.current.kind {
            TokenKind::Default => {
                self.advance();
                if self.at_function() {
                    let function = self.parse_function(false)?.ok_or_else(|| self.unexpected())?;
                    return Ok(Some(Item::ExportDefault(Expression::Function(Rc::new(function)))));
                }
                if self.check(&TokenKind::Class) {
                    let class = self.parse_class()?;
                    return Ok(Some(Item::ExportDefault(Expression::Function(Rc::new(class)))));
                }
                let expr = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Some(Item::ExportDefault(expr)))
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                let decl = self.parse_variable_declaration()?;
                Ok(Some(Item::ExportDeclaration(decl)))
            }
            TokenKind::Function | TokenKind::Identifier(_) if self.at_function() => {
                // `None` is a TypeScript overload signature
                Ok(self.parse_function(true)?.map(|f| Item::ExportFunction(Rc::new(f))))
            }
            TokenKind::Class => {
                let class = self.parse_class()?;
                if class.name.is_none() {
                    return Err(self.error("A class declaration requires a name"));
                }
                Ok(Some(Item::ExportFunction(Rc::new(class))))
            }
            TokenKind::LeftBrace => {
                let specifiers = self.parse_export_list()?;
                if self.check_identifier("from") {
                    self.advance();
                    let source = self.expect_string()?;
                    self.consume_semicolon()?;
                    return Ok(Some(Item::ExportFrom { source, specifiers }));
                }
                self.consume_semicolon()?;
                Ok(Some(Item::ExportNamed(specifiers)))
            }
            TokenKind::Identifier(name) if self.typescript && name == "type" => {
                if matches!(self.peek_kind(), TokenKind::LeftBrace) {
                    // `export type { A } [from 'x']`
                    self.advance();
                    self.parse_export_list()?;
                    if self.check_identifier("from") {
                        self.advance();
                        self.expect_string()?;
                    }
                    self.consume_semicolon()?;
                } else {
                    self.skip_type_declaration()?;
                }
                Ok(None)
            }
            TokenKind::Identifier(_) if self.typescript && self.at_type_declaration() => {
                self.skip_type_declaration()?;
                Ok(None)
            }
            TokenKind::Star => Err(self.error("export * is not supported in configuration modules")),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_export_list(&mut self) -> Result<Vec<ExportSpecifier>> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut specifiers = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            let type_specifier = self.at_inline_type_modifier();
            if type_specifier {
                self.advance();
            }
            let local = self.expect_module_export_name()?;
            let exported = if self.check_identifier("as") {
                self.advance();
                self.expect_module_export_name()?
            } else {
                local.clone()
            };
            if !type_specifier {
                specifiers.push(ExportSpecifier { local, exported });
            }
            if !self.check(&TokenKind::RightBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance(); // consume '}'
        Ok(specifiers)
    }

    // Helper methods

    pub(super) fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.scanner.next_token());
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    pub(super) fn check_identifier(&self, name: &str) -> bool {
        matches!(&self.current.kind, TokenKind::Identifier(n) if n == name)
    }

    /// Kind of the token after `current`, without consuming anything.
    pub(super) fn peek_kind(&self) -> TokenKind {
        self.peek_token().kind
    }

    pub(super) fn peek_token(&self) -> Token {
        self.scanner.clone().next_token()
    }

    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected {}, found {}", kind, self.current.kind)))
        }
    }

    pub(super) fn expect_contextual(&mut self, word: &str) -> Result<()> {
        if self.check_identifier(word) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}', found {}", word, self.current.kind)))
        }
    }

    pub(super) fn expect_identifier(&mut self) -> Result<String> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!("Expected identifier, found {}", self.current.kind)))
        }
    }

    /// Identifier or reserved word, as allowed after `.` and as object keys.
    pub(super) fn expect_property_name(&mut self) -> Result<String> {
        if let Some(keyword) = self.current.kind.keyword_name() {
            self.advance();
            return Ok(keyword.to_string());
        }
        self.expect_identifier()
    }

    /// Name inside an import/export list: identifier, keyword or string.
    fn expect_module_export_name(&mut self) -> Result<String> {
        if let TokenKind::String(s) = &self.current.kind {
            let s = s.clone();
            self.advance();
            return Ok(s);
        }
        self.expect_property_name()
    }

    fn expect_string(&mut self) -> Result<String> {
        if let TokenKind::String(s) = &self.current.kind {
            let s = s.clone();
            self.advance();
            Ok(s)
        } else {
            Err(self.error(format!("Expected module specifier, found {}", self.current.kind)))
        }
    }

    /// Automatic semicolon insertion.
    pub(super) fn consume_semicolon(&mut self) -> Result<()> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            Ok(())
        } else if self.current.newline_before
            || self.check(&TokenKind::RightBrace)
            || self.is_at_end()
        {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    pub(super) fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    pub(super) fn error(&self, message: impl Into<String>) -> Error {
        Error::SyntaxError {
            offset: self.base_offset + self.current.span.start,
            message: message.into(),
        }
    }

    pub(super) fn unexpected(&self) -> Error {
        match &self.current.kind {
            TokenKind::Invalid(message) => self.error(message.clone()),
            kind => self.error(format!("Unexpected {}", kind)),
        }
    }

    /// Whether a `/` at `current` starts a regular expression rather than
    /// dividing the previous operand.
    pub(super) fn regex_allowed(&self) -> bool {
        !matches!(
            self.previous.kind,
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Template { .. }
                | TokenKind::RegExp { .. }
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::This
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
        )
    }

    /// Turns the `/` or `/=` at `current` into a regular expression token.
    pub(super) fn rescan_regex(&mut self) {
        let prefix = if self.check(&TokenKind::SlashEqual) { "=" } else { "" };
        self.current =
            self.scanner
                .scan_regex(self.current.span.start, prefix, self.current.newline_before);
    }

    /// Skips a bracketed group starting at `current`, counting only `()`,
    /// `[]` and `{}`.
    pub(super) fn skip_group(&mut self) -> Result<()> {
        if !matches!(
            self.current.kind,
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace
        ) {
            return Err(self.unexpected());
        }
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => depth += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.unexpected())?;
                }
                TokenKind::Slash | TokenKind::SlashEqual if self.regex_allowed() => {
                    self.rescan_regex();
                    if let TokenKind::Invalid(message) = &self.current.kind {
                        return Err(self.error(message.clone()));
                    }
                }
                TokenKind::Eof => return Err(self.error("Unexpected end of input")),
                TokenKind::Invalid(message) => return Err(self.error(message.clone())),
                _ => {}
            }
            self.advance();
            if depth == 0 {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Module {
        Parser::new(src).parse_module().unwrap()
    }

    fn parse_err(src: &str) -> String {
        Parser::new(src).parse_module().unwrap_err().to_string()
    }

    #[test]
    fn test_export_default_object() {
        let module = parse_ok("export default { site: 'https://x', base: '/docs' };");
        let Item::ExportDefault(Expression::Object(props)) = &module.body[0] else {
            panic!("expected default export, got {:?}", module.body[0]);
        };
        assert_eq!(props.len(), 2);
        assert_eq!(
            props[0],
            Property::KeyValue(
                PropertyKey::Static("site".into()),
                Expression::String("https://x".into())
            )
        );
    }

    #[test]
    fn test_imports() {
        let module = parse_ok(
            r#"
            import { defineConfig } from 'astro/config'
            import mdx, { remark as r } from '@astrojs/mdx'
            import * as path from 'node:path'
            import './side-effect.mjs'
            "#,
        );
        assert_eq!(module.body.len(), 4);
        let Item::Import(decl) = &module.body[1] else {
            panic!("expected import");
        };
        assert_eq!(decl.source, "@astrojs/mdx");
        assert_eq!(
            decl.specifiers,
            vec![
                ImportSpecifier::Default("mdx".into()),
                ImportSpecifier::Named {
                    imported: "remark".into(),
                    local: "r".into()
                },
            ]
        );
        let Item::Import(side_effect) = &module.body[3] else {
            panic!("expected import");
        };
        assert!(side_effect.specifiers.is_empty());
    }

    #[test]
    fn test_semicolon_insertion() {
        let module = parse_ok("const a = 1\nconst b = a\nexport default { a, b }");
        assert_eq!(module.body.len(), 3);
        assert!(parse_err("const a = 1 const b = 2").contains("SyntaxError"));
    }

    #[test]
    fn test_export_list_and_reexport() {
        let module = parse_ok("const a = 1; export { a, a as default }; export { b } from './b.mjs';");
        assert_eq!(
            module.body[1],
            Item::ExportNamed(vec![
                ExportSpecifier {
                    local: "a".into(),
                    exported: "a".into()
                },
                ExportSpecifier {
                    local: "a".into(),
                    exported: "default".into()
                },
            ])
        );
        assert!(matches!(&module.body[2], Item::ExportFrom { source, .. } if source == "./b.mjs"));
    }

    #[test]
    fn test_precedence() {
        let module = parse_ok("export default a ?? b ? c === d : !e;");
        let Item::ExportDefault(Expression::Conditional { test, consequent, alternate }) =
            &module.body[0]
        else {
            panic!("expected conditional");
        };
        assert!(matches!(**test, Expression::Logical { operator: LogicalOperator::Nullish, .. }));
        assert!(matches!(**consequent, Expression::Binary { operator: BinaryOperator::StrictEqual, .. }));
        assert!(matches!(**alternate, Expression::Unary { operator: UnaryOperator::Not, .. }));
    }

    #[test]
    fn test_member_and_calls() {
        let module = parse_ok("export default defineConfig({ port: process.env?.PORT, x: a['b'](1, ...c) })");
        assert!(matches!(
            &module.body[0],
            Item::ExportDefault(Expression::Call { optional: false, .. })
        ));
    }

    #[test]
    fn test_template_substitution_is_parsed() {
        let module = parse_ok("export default `${a.b}-${'c'}`");
        let Item::ExportDefault(Expression::Template { quasis, expressions }) = &module.body[0]
        else {
            panic!("expected template");
        };
        assert_eq!(quasis.len(), 3);
        assert_eq!(expressions[1], Expression::String("c".into()));
    }

    #[test]
    fn test_array_holes_and_spread() {
        let module = parse_ok("export default [1, , ...rest]");
        let Item::ExportDefault(Expression::Array(elements)) = &module.body[0] else {
            panic!("expected array");
        };
        assert_eq!(elements.len(), 3);
        assert!(elements[1].is_none());
        assert!(matches!(elements[2], Some(Element::Spread(_))));
    }

    #[test]
    fn test_new_and_import_meta() {
        let module = parse_ok("export default new URL('./public/', import.meta.url)");
        assert!(matches!(&module.body[0], Item::ExportDefault(Expression::New { .. })));
    }

    #[test]
    fn test_throw() {
        let module = parse_ok("throw new Error('boom')");
        assert!(matches!(
            &module.body[0],
            Item::Statement(Statement::Throw(Expression::New { .. }))
        ));
    }

    #[test]
    fn test_arithmetic_precedence() {
        let module = parse_ok("export default 'https://' + host + ':' + port * 2 - 1 < limit");
        let Item::ExportDefault(Expression::Binary { operator, left, .. }) = &module.body[0] else {
            panic!("expected comparison, got {:?}", module.body[0]);
        };
        assert_eq!(*operator, BinaryOperator::Less);
        let Expression::Binary { operator: BinaryOperator::Subtract, left, .. } = &**left else {
            panic!("expected subtraction");
        };
        let Expression::Binary { operator: BinaryOperator::Add, right, .. } = &**left else {
            panic!("expected concatenation");
        };
        assert!(matches!(**right, Expression::Binary { operator: BinaryOperator::Multiply, .. }));
    }

    #[test]
    fn test_exponent_is_right_associative() {
        let module = parse_ok("export default 2 ** 3 ** 2");
        let Item::ExportDefault(Expression::Binary { operator, right, .. }) = &module.body[0] else {
            panic!("expected exponent");
        };
        assert_eq!(*operator, BinaryOperator::Exponent);
        assert!(matches!(**right, Expression::Binary { operator: BinaryOperator::Exponent, .. }));
    }

    #[test]
    fn test_regex_literal_versus_division() {
        let module = parse_ok("const half = total / 2 / 1\nexport default { pattern: /\\.mdx?$/i }");
        let Item::Statement(Statement::Declaration(decl)) = &module.body[0] else {
            panic!("expected declaration");
        };
        assert!(matches!(
            decl.declarations[0].init,
            Some(Expression::Binary { operator: BinaryOperator::Divide, .. })
        ));
        let Item::ExportDefault(Expression::Object(props)) = &module.body[1] else {
            panic!("expected object");
        };
        assert_eq!(
            props[0],
            Property::KeyValue(
                PropertyKey::Static("pattern".into()),
                Expression::RegExp {
                    pattern: "\\.mdx?$".into(),
                    flags: "i".into()
                }
            )
        );
    }

    #[test]
    fn test_arrow_functions() {
        let module = parse_ok(
            "const a = x => x + 1; const b = (x, { y = 2 }, ...rest) => { return y }; const c = async () => ({})",
        );
        assert_eq!(module.body.len(), 3);
        for item in &module.body {
            let Item::Statement(Statement::Declaration(decl)) = item else {
                panic!("expected declaration");
            };
            assert!(matches!(decl.declarations[0].init, Some(Expression::Function(_))));
        }
        let Item::Statement(Statement::Declaration(decl)) = &module.body[1] else {
            unreachable!();
        };
        let Some(Expression::Function(function)) = &decl.declarations[0].init else {
            unreachable!();
        };
        assert_eq!(function.params.len(), 3);
        assert!(function.params[2].rest);
        assert!(matches!(function.body, FunctionBody::Block(ref body) if body.len() == 1));
    }

    #[test]
    fn test_parenthesized_expression_is_not_arrow() {
        let module = parse_ok("export default (a) ? (b) : c");
        assert!(matches!(&module.body[0], Item::ExportDefault(Expression::Conditional { .. })));
        let module = parse_ok("export default (site)");
        assert_eq!(module.body[0], Item::ExportDefault(Expression::Identifier("site".into())));
    }

    #[test]
    fn test_object_methods_and_accessors() {
        let module = parse_ok(
            "export default { name: 'p', transform(code, id) { return code }, async load() {}, get mode() { return 'x' }, set mode(v) {} }",
        );
        let Item::ExportDefault(Expression::Object(props)) = &module.body[0] else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 4);
        assert!(matches!(
            &props[1],
            Property::KeyValue(PropertyKey::Static(key), Expression::Function(f))
                if key == "transform" && f.params.len() == 2
        ));
        assert!(matches!(&props[3], Property::Getter(PropertyKey::Static(key), _) if key == "mode"));
    }

    #[test]
    fn test_function_declarations_and_exports() {
        let module = parse_ok(
            "function plugin(options = {}) { return { name: 'p', options } }\nexport function helper() {}\nexport default function () {}",
        );
        assert!(matches!(
            &module.body[0],
            Item::Statement(Statement::Function(f)) if f.name.as_deref() == Some("plugin")
        ));
        assert!(matches!(&module.body[1], Item::ExportFunction(f) if f.name.as_deref() == Some("helper")));
        assert!(matches!(&module.body[2], Item::ExportDefault(Expression::Function(f)) if f.name.is_none()));
    }

    #[test]
    fn test_statements() {
        let module = parse_ok(
            r#"
            let site = 'a'
            if (process.env.CI) site = 'b'
            else { site += '!' }
            for (const key of ['a', 'b']) { if (key === 'b') break }
            for (let i = 0; i < 3; i++) continue
            for (const key in object) {}
            while (false) {}
            try { risky() } catch (error) { site = 'c' } finally {}
            "#,
        );
        assert_eq!(module.body.len(), 7);
        assert!(matches!(&module.body[1], Item::Statement(Statement::If { alternate: Some(_), .. })));
        assert!(matches!(&module.body[2], Item::Statement(Statement::ForOf(_))));
        assert!(matches!(&module.body[3], Item::Statement(Statement::For { .. })));
        assert!(matches!(&module.body[4], Item::Statement(Statement::ForIn(_))));
        assert!(matches!(&module.body[6], Item::Statement(Statement::Try { handler: Some(_), .. })));
    }

    #[test]
    fn test_destructuring_declarations() {
        let module = parse_ok("const { a, b: [c, , d = 1], ...rest } = source");
        let Item::Statement(Statement::Declaration(decl)) = &module.body[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.declarations[0].target.bound_names(), vec!["a", "c", "d", "rest"]);
        assert!(parse_err("const { a } ;").contains("Missing initializer"));
    }

    #[test]
    fn test_unsupported_function_body_is_kept_opaque() {
        let module = parse_ok("export default { plugin() { switch (x) { case 1: return 2 } } }");
        let Item::ExportDefault(Expression::Object(props)) = &module.body[0] else {
            panic!("expected object");
        };
        assert!(matches!(
            &props[0],
            Property::KeyValue(_, Expression::Function(f)) if f.body == FunctionBody::Opaque
        ));
    }

    #[test]
    fn test_classes_are_opaque_values() {
        let module = parse_ok("class Cache extends Map { get(key) { return super.get(key) } }\nexport default { Cache }");
        assert!(matches!(
            &module.body[0],
            Item::Statement(Statement::Function(f))
                if f.name.as_deref() == Some("Cache") && f.body == FunctionBody::Opaque
        ));
    }

    #[test]
    fn test_unsupported_syntax_is_reported() {
        assert!(parse_err("const x = import('./a.mjs')").contains("dynamic import"));
        assert!(parse_err("export * from './a.mjs'").contains("export *"));
        assert!(parse_err("return 1").contains("Illegal return"));
        assert!(parse_err("break").contains("Illegal break"));
        assert!(parse_err("1 = 2").contains("Invalid left-hand side"));
    }

    #[test]
    fn test_typescript_syntax_rejected_in_javascript_dialect() {
        assert!(parse_err("const site: string = 'x'").contains("SyntaxError"));
        assert!(parse_err("export default {} satisfies Config").contains("SyntaxError"));
    }

    #[test]
    fn test_error_offset_points_at_token() {
        let err = Parser::new("const a = ;").parse_module().unwrap_err();
        assert!(matches!(err, Error::SyntaxError { offset: 10, .. }));
    }
}
