// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! TypeScript type erasure.
//!
//! TypeScript configuration files are parsed by skipping type syntax and
//! producing the same AST the JavaScript dialect would:
//!
//! ```text
//! .ts → Parse (strip types at parse time) → AST → Evaluate
//! ```
//!
//! | Syntax | Handling |
//! |--------|----------|
//! | `import type ...`, `export type ...` | dropped |
//! | `{ type A, b }` in import/export lists | `A` dropped |
//! | `type X = ...;` | dropped |
//! | `interface X { ... }` | dropped |
//! | `declare ...` | dropped |
//! | `const x: T = ...` | annotation skipped |
//! | `expr as T`, `expr satisfies T`, `as const` | type skipped |
//! | `expr!` | assertion skipped |
//! | `f<T>(...)`, `new C<T>(...)` | type arguments skipped |
//! | `(a: T, b?: U): R => ...`, `function f<T>(this: X): R {}` | parameter and return types skipped |
//! | `function f(a: T): R;` | overload signature dropped |
//!
//! Types are skipped by bracket balancing rather than parsed, so any type
//! expression whose brackets balance is accepted.

use super::Parser;
use crate::Result;
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Whether `current` starts a declaration that only exists at type level.
    pub(super) fn at_type_declaration(&self) -> bool {
        let TokenKind::Identifier(word) = &self.current.kind else {
            return false;
        };
        match word.as_str() {
            "type" | "interface" => matches!(self.peek_kind(), TokenKind::Identifier(_)),
            "declare" => matches!(
                self.peek_kind(),
                TokenKind::Identifier(_)
                    | TokenKind::Const
                    | TokenKind::Let
                    | TokenKind::Var
                    | TokenKind::Function
                    | TokenKind::Class
            ),
            _ => false,
        }
    }

    /// `type` modifier on a single import/export list entry.
    pub(super) fn at_inline_type_modifier(&self) -> bool {
        if !self.typescript || !self.check_identifier("type") {
            return false;
        }
        match self.peek_kind() {
            TokenKind::Identifier(name) => name != "as",
            TokenKind::String(_) => true,
            kind => kind.keyword_name().is_some(),
        }
    }

    /// Skips `type X = ...`, `interface X {...}` or `declare ...`.
    pub(super) fn skip_type_declaration(&mut self) -> Result<()> {
        let keyword = match &self.current.kind {
            TokenKind::Identifier(word) => word.clone(),
            _ => return Err(self.unexpected()),
        };
        self.advance();

        match keyword.as_str() {
            "type" => {
                self.expect_identifier()?;
                if self.check(&TokenKind::Less) {
                    self.skip_balanced()?;
                }
                self.expect(&TokenKind::Equal)?;
                self.skip_type()?;
                self.consume_semicolon()
            }
            "interface" => {
                self.expect_identifier()?;
                // type parameters and `extends A<B>, C`
                while !self.check(&TokenKind::LeftBrace) {
                    if self.is_at_end() {
                        return Err(self.error("Expected '{' in interface declaration"));
                    }
                    if self.check(&TokenKind::Less) {
                        self.skip_balanced()?;
                    } else {
                        self.advance();
                    }
                }
                self.skip_balanced()?;
                if self.check(&TokenKind::Semicolon) {
                    self.advance();
                }
                Ok(())
            }
            "declare" => self.skip_ambient_declaration(),
            _ => Err(self.unexpected()),
        }
    }

    fn skip_ambient_declaration(&mut self) -> Result<()> {
        let mut depth = 0usize;
        let mut consumed = false;
        loop {
            if depth == 0 && consumed {
                if self.check(&TokenKind::Semicolon) {
                    self.advance();
                    return Ok(());
                }
                if self.current.newline_before || self.is_at_end() {
                    return Ok(());
                }
            }
            match &self.current.kind {
                TokenKind::Eof => return Err(self.error("Unexpected end of input")),
                TokenKind::Invalid(message) => return Err(self.error(message.clone())),
                TokenKind::LeftBrace | TokenKind::LeftParen | TokenKind::LeftBracket => depth += 1,
                TokenKind::RightBrace | TokenKind::RightParen | TokenKind::RightBracket => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.unexpected())?;
                }
                _ => {}
            }
            self.advance();
            consumed = true;
        }
    }

    /// Skips one type expression, stopping before the token that ends it.
    pub(super) fn skip_type(&mut self) -> Result<()> {
        let mut depth = 0usize;
        let mut consumed = false;

        loop {
            let kind = &self.current.kind;
            if depth == 0 {
                if ends_type(kind) {
                    if !consumed {
                        return Err(self.error("Type expected"));
                    }
                    return Ok(());
                }
                if consumed
                    && self.current.newline_before
                    && !continues_type(kind)
                    && !continues_type(&self.previous.kind)
                {
                    return Ok(());
                }
            }
            match kind {
                TokenKind::Invalid(message) => return Err(self.error(message.clone())),
                TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::Less => depth += 1,
                TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::Greater => depth -= 1,
                TokenKind::Eof => return Err(self.error("Unexpected end of input in type")),
                _ => {}
            }
            self.advance();
            consumed = true;
        }
    }

    /// Skips a bracketed group starting at `current` (`<...>`, `{...}`, ...).
    pub(super) fn skip_balanced(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match &self.current.kind {
                TokenKind::Less
                | TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace => depth += 1,
                TokenKind::Greater
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.unexpected())?;
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

    /// Skips `<...>` type arguments.
    pub(super) fn skip_type_arguments(&mut self) -> Result<()> {
        self.skip_balanced()
    }

    /// Whether the `<` at `current` opens type arguments of a call
    /// (`f<T>(...)`) rather than a comparison.
    pub(super) fn at_type_arguments(&self) -> bool {
        let mut lookahead = self.clone();
        lookahead.skip_balanced().is_ok()
            && matches!(
                lookahead.current.kind,
                TokenKind::LeftParen | TokenKind::Template { .. }
            )
    }

    /// Skips a return type annotation. An arrow's type ends at `=>`; a
    /// function's at its body, a `;` or a line break.
    pub(super) fn skip_return_type(&mut self, arrow: bool) -> Result<()> {
        let mut depth = 0usize;
        let mut consumed = false;
        loop {
            if depth == 0 && consumed {
                let done = if arrow {
                    self.check(&TokenKind::Arrow)
                } else {
                    matches!(
                        self.current.kind,
                        TokenKind::LeftBrace | TokenKind::Semicolon | TokenKind::Eof
                    ) || (self.current.newline_before
                        && !continues_type(&self.current.kind)
                        && !continues_type(&self.previous.kind))
                };
                if done {
                    return Ok(());
                }
            }
            match &self.current.kind {
                TokenKind::Eof | TokenKind::Semicolon => return Err(self.error("Type expected")),
                TokenKind::Comma if depth == 0 => return Err(self.unexpected()),
                TokenKind::Invalid(message) => return Err(self.error(message.clone())),
                TokenKind::Less
                | TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace => depth += 1,
                TokenKind::Greater
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.unexpected())?;
                }
                _ => {}
            }
            self.advance();
            consumed = true;
        }
    }
}

/// Tokens that end a type at bracket depth zero.
fn ends_type(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Equal
            | TokenKind::Comma
            | TokenKind::Semicolon
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::RightBrace
            | TokenKind::Greater
            | TokenKind::Question
            | TokenKind::Colon
            | TokenKind::EqualEqual
            | TokenKind::EqualEqualEqual
            | TokenKind::BangEqual
            | TokenKind::BangEqualEqual
            | TokenKind::PipePipe
            | TokenKind::AmpAmp
            | TokenKind::QuestionQuestion
            | TokenKind::Eof
    )
}

/// Tokens that keep a type going across a line break.
fn continues_type(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Pipe
        | TokenKind::Ampersand
        | TokenKind::Arrow
        | TokenKind::Dot
        | TokenKind::Colon
        | TokenKind::Typeof => true,
        TokenKind::Identifier(word) => {
            matches!(word.as_str(), "keyof" | "readonly" | "extends" | "infer" | "unique")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::parser::Parser;

    fn parse_ts(src: &str) -> Module {
        let mut parser = Parser::new_typescript(src);
        parser.parse_module().expect("Should parse")
    }

    #[test]
    fn test_type_only_imports_are_erased() {
        let module = parse_ts(
            r#"
            import type { AstroUserConfig } from 'astro';
            import { type ViteUserConfig, defineConfig } from 'astro/config';
            "#,
        );
        assert_eq!(module.body.len(), 1);
        let Item::Import(decl) = &module.body[0] else {
            panic!("expected import");
        };
        assert_eq!(
            decl.specifiers,
            vec![ImportSpecifier::Named {
                imported: "defineConfig".into(),
                local: "defineConfig".into()
            }]
        );
    }

    #[test]
    fn test_type_declarations_are_erased() {
        let module = parse_ts(
            r#"
            type Mode = 'static' | 'server'
            interface Extra extends Base<string> {
                port: number;
                hosts?: Array<{ name: string }>;
            }
            declare const __BUILD__: boolean;
            declare global {
                interface Window { x: number }
            }
            export type { Mode }
            export interface Shape { a: string }
            export default {}
            "#,
        );
        assert_eq!(module.body.len(), 1);
        assert!(matches!(module.body[0], Item::ExportDefault(_)));
    }

    #[test]
    fn test_annotations_and_assertions() {
        let module = parse_ts(
            r#"
            const port: number = 4321;
            const mode: 'static' | 'server' = 'static';
            const handler: (req: Request) => Promise<void> = undefined as any;
            const config = { port, mode } satisfies Config;
            export default defineConfig<Config>(config as unknown as Config)!;
            "#,
        );
        assert_eq!(module.body.len(), 5);
        let Item::Statement(Statement::Declaration(decl)) = &module.body[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.declarations[0].init, Some(Expression::Number(4321.0)));
        let Item::Statement(Statement::Declaration(decl)) = &module.body[3] else {
            panic!("expected declaration");
        };
        assert!(matches!(decl.declarations[0].init, Some(Expression::Object(_))));
    }

    #[test]
    fn test_as_const_in_object() {
        let module = parse_ts("export default { output: 'server' as const, list: ['a'] as string[] }");
        let Item::ExportDefault(Expression::Object(props)) = &module.body[0] else {
            panic!("expected object");
        };
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_multiline_union_annotation() {
        let module = parse_ts("let mode:\n  | 'a'\n  | 'b' = 'a'\nexport default { mode }");
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn test_annotation_ends_at_newline() {
        let module = parse_ts("let mode: string\nexport default { mode }");
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn test_typed_functions_and_arrows() {
        let module = parse_ts(
            r#"
            function plugin(options?: Options): Plugin;
            function plugin(this: void, options: Options = {}): Plugin {
                return { name: 'p' }
            }
            const ids = <T,>(items: T[]): string[] => items.map((item): string => item.id)
            const ok = count < limit && limit > 0
            export default defineConfig<Config>({ integrations: [plugin()] })
            "#,
        );
        assert_eq!(module.body.len(), 4);
        let Item::Statement(Statement::Function(function)) = &module.body[0] else {
            panic!("expected function, got {:?}", module.body[0]);
        };
        assert_eq!(function.params.len(), 1);
        assert!(matches!(function.body, FunctionBody::Block(_)));
        let Item::Statement(Statement::Declaration(decl)) = &module.body[1] else {
            panic!("expected declaration");
        };
        assert!(matches!(decl.declarations[0].init, Some(Expression::Function(_))));
        let Item::Statement(Statement::Declaration(decl)) = &module.body[2] else {
            panic!("expected declaration");
        };
        assert!(matches!(
            decl.declarations[0].init,
            Some(Expression::Logical { operator: LogicalOperator::And, .. })
        ));
    }

    #[test]
    fn test_type_keyword_as_value_is_kept() {
        let module = parse_ts("const type = 'module'; export default { type }");
        assert_eq!(module.body.len(), 2);
    }
}
