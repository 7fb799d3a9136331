// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Statements, declarations, binding patterns and functions.

use super::Parser;
use crate::Result;
use crate::ast::*;
use crate::lexer::TokenKind;

impl Parser<'_> {
    /// Parses one statement; `None` for empty statements, erased TypeScript
    /// declarations and overload signatures.
    pub(super) fn parse_statement(&mut self) -> Result<Option<Statement>> {
        let statement = match &self.current.kind {
            TokenKind::Semicolon => {
                self.advance();
                return Ok(None);
            }
            TokenKind::Identifier(_) if self.typescript && self.at_type_declaration() => {
                self.skip_type_declaration()?;
                return Ok(None);
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                Statement::Declaration(self.parse_variable_declaration()?)
            }
            TokenKind::Function | TokenKind::Identifier(_) if self.at_function() => {
                return Ok(self.parse_function(true)?.map(|f| Statement::Function(f.into())));
            }
            TokenKind::Class => {
                let class = self.parse_class()?;
                if class.name.is_none() {
                    return Err(self.error("A class declaration requires a name"));
                }
                Statement::Function(class.into())
            }
            TokenKind::LeftBrace => Statement::Block(self.parse_block()?),
            TokenKind::If => self.parse_if()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Break | TokenKind::Continue => self.parse_jump()?,
            TokenKind::Throw => self.parse_throw()?,
            TokenKind::Try => self.parse_try()?,
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon()?;
                Statement::Expression(expr)
            }
        };
        Ok(Some(statement))
    }

    pub(super) fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RightBrace) {
            if self.is_at_end() {
                return Err(self.error("Unexpected end of input"));
            }
            if let Some(statement) = self.parse_statement()? {
                body.push(statement);
            }
        }
        self.advance(); // consume '}'
        Ok(body)
    }

    /// Body of `if`/`else` and loops.
    fn parse_substatement(&mut self) -> Result<Statement> {
        if matches!(self.current.kind, TokenKind::Const | TokenKind::Let) {
            return Err(self.error("Lexical declaration cannot appear in a single-statement context"));
        }
        Ok(self.parse_statement()?.unwrap_or(Statement::Block(Vec::new())))
    }

    fn parse_loop_body(&mut self) -> Result<Box<Statement>> {
        self.loop_depth += 1;
        let body = self.parse_substatement();
        self.loop_depth -= 1;
        body.map(Box::new)
    }

    fn parse_if(&mut self) -> Result<Statement> {
        self.advance(); // consume 'if'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let consequent = Box::new(self.parse_substatement()?);
        let alternate = if self.check(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_substatement()?))
        } else {
            None
        };
        Ok(Statement::If {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_for(&mut self) -> Result<Statement> {
        self.advance(); // consume 'for'
        if self.check_identifier("await") {
            return Err(self.error("for await is not supported in configuration modules"));
        }
        self.expect(&TokenKind::LeftParen)?;

        let init = match self.current.kind {
            TokenKind::Semicolon => None,
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                let kind = self.parse_variable_kind()?;
                let target = self.parse_binding_target()?;
                if self.check_identifier("of") || self.check(&TokenKind::In) {
                    return self.parse_for_each(kind, target);
                }
                let mut declarations = vec![self.parse_declarator(target)?];
                while self.check(&TokenKind::Comma) {
                    self.advance();
                    let target = self.parse_binding_target()?;
                    declarations.push(self.parse_declarator(target)?);
                }
                self.check_initializers(kind, &declarations)?;
                Some(Box::new(Statement::Declaration(VariableDeclaration {
                    kind,
                    declarations,
                })))
            }
            _ => Some(Box::new(Statement::Expression(self.parse_expression()?))),
        };
        self.expect(&TokenKind::Semicolon)?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RightParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RightParen)?;

        let body = self.parse_loop_body()?;
        Ok(Statement::For {
            init,
            test,
            update,
            body,
        })
    }

    fn parse_for_each(&mut self, kind: VariableKind, target: Pattern) -> Result<Statement> {
        let of = self.check_identifier("of");
        self.advance(); // consume 'of' / 'in'
        let right = if of {
            self.parse_assignment()?
        } else {
            self.parse_expression()?
        };
        self.expect(&TokenKind::RightParen)?;
        let each = ForEach {
            kind,
            target,
            right,
            body: self.parse_loop_body()?,
        };
        Ok(if of {
            Statement::ForOf(each)
        } else {
            Statement::ForIn(each)
        })
    }

    fn parse_while(&mut self) -> Result<Statement> {
        self.advance(); // consume 'while'
        self.expect(&TokenKind::LeftParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::While { test, body })
    }

    fn parse_return(&mut self) -> Result<Statement> {
        if self.function_depth == 0 {
            return Err(self.error("Illegal return statement"));
        }
        self.advance(); // consume 'return'
        let argument = if self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RightBrace)
            || self.current.newline_before
            || self.is_at_end()
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.consume_semicolon()?;
        Ok(Statement::Return(argument))
    }

    /// `break` or `continue`, without labels.
    fn parse_jump(&mut self) -> Result<Statement> {
        let statement = if self.check(&TokenKind::Break) {
            Statement::Break
        } else {
            Statement::Continue
        };
        if self.loop_depth == 0 {
            let word = if statement == Statement::Break { "break" } else { "continue" };
            return Err(self.error(format!("Illegal {} statement", word)));
        }
        self.advance();
        if matches!(self.current.kind, TokenKind::Identifier(_)) && !self.current.newline_before {
            return Err(self.error("labeled statements are not supported"));
        }
        self.consume_semicolon()?;
        Ok(statement)
    }

    fn parse_throw(&mut self) -> Result<Statement> {
        self.advance(); // consume 'throw'
        if self.current.newline_before {
            return Err(self.error("Illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.consume_semicolon()?;
        Ok(Statement::Throw(argument))
    }

    fn parse_try(&mut self) -> Result<Statement> {
        self.advance(); // consume 'try'
        let block = self.parse_block()?;

        let handler = if self.check(&TokenKind::Catch) {
            self.advance();
            let param = if self.check(&TokenKind::LeftParen) {
                self.advance();
                let param = self.parse_binding_target()?;
                if self.typescript && self.check(&TokenKind::Colon) {
                    // `catch (e: unknown)`
                    self.advance();
                    self.skip_type()?;
                }
                self.expect(&TokenKind::RightParen)?;
                Some(param)
            } else {
                None
            };
            Some(CatchClause {
                param,
                body: self.parse_block()?,
            })
        } else {
            None
        };

        let finalizer = if self.check(&TokenKind::Finally) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Statement::Try {
            block,
            handler,
            finalizer,
        })
    }

    // Declarations

    pub(super) fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration> {
        let kind = self.parse_variable_kind()?;
        let mut declarations = Vec::new();
        loop {
            let target = self.parse_binding_target()?;
            declarations.push(self.parse_declarator(target)?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.check_initializers(kind, &declarations)?;
        self.consume_semicolon()?;
        Ok(VariableDeclaration { kind, declarations })
    }

    fn parse_variable_kind(&mut self) -> Result<VariableKind> {
        let kind = match self.current.kind {
            TokenKind::Const => VariableKind::Const,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Var => VariableKind::Var,
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(kind)
    }

    /// Annotation and initializer following a declared binding.
    fn parse_declarator(&mut self, target: Pattern) -> Result<VariableDeclarator> {
        if self.typescript && self.check(&TokenKind::Bang) {
            // definite assignment `let x!: T`
            self.advance();
        }
        if self.typescript && self.check(&TokenKind::Colon) {
            self.advance();
            self.skip_type()?;
        }
        let init = if self.check(&TokenKind::Equal) {
            self.advance();
            Some(self.parse_assignment()?)
        } else {
            None
        };
        Ok(VariableDeclarator { target, init })
    }

    fn check_initializers(&self, kind: VariableKind, declarations: &[VariableDeclarator]) -> Result<()> {
        for declarator in declarations.iter().filter(|d| d.init.is_none()) {
            if kind == VariableKind::Const {
                return Err(self.error("Missing initializer in const declaration"));
            }
            if !matches!(declarator.target, Pattern::Identifier(_)) {
                return Err(self.error("Missing initializer in destructuring declaration"));
            }
        }
        Ok(())
    }

    // Patterns

    fn parse_binding_target(&mut self) -> Result<Pattern> {
        match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Pattern::Identifier(name))
            }
            TokenKind::LeftBrace => self.parse_object_pattern(),
            TokenKind::LeftBracket => self.parse_array_pattern(),
            _ => Err(self.unexpected()),
        }
    }

    /// A pattern with an optional `= default`.
    fn parse_binding_element(&mut self) -> Result<Pattern> {
        let target = self.parse_binding_target()?;
        self.with_default(target)
    }

    fn with_default(&mut self, target: Pattern) -> Result<Pattern> {
        if !self.check(&TokenKind::Equal) {
            return Ok(target);
        }
        self.advance();
        Ok(Pattern::Default {
            target: Box::new(target),
            value: Box::new(self.parse_assignment()?),
        })
    }

    fn parse_object_pattern(&mut self) -> Result<Pattern> {
        self.advance(); // consume '{'
        let mut properties = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightBrace) {
            if self.check(&TokenKind::Ellipsis) {
                self.advance();
                rest = Some(self.expect_identifier()?);
                break;
            }
            let (key, shorthand) = self.parse_property_key()?;
            let value = if self.check(&TokenKind::Colon) {
                self.advance();
                self.parse_binding_element()?
            } else {
                let name = shorthand.ok_or_else(|| self.unexpected())?;
                self.with_default(Pattern::Identifier(name))?
            };
            properties.push(PatternProperty { key, value });
            if !self.check(&TokenKind::RightBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RightBrace)?;

        Ok(Pattern::Object { properties, rest })
    }

    fn parse_array_pattern(&mut self) -> Result<Pattern> {
        self.advance(); // consume '['
        let mut elements = Vec::new();
        let mut rest = None;

        while !self.check(&TokenKind::RightBracket) {
            if self.check(&TokenKind::Comma) {
                self.advance();
                elements.push(None);
                continue;
            }
            if self.check(&TokenKind::Ellipsis) {
                self.advance();
                rest = Some(Box::new(self.parse_binding_target()?));
                break;
            }
            elements.push(Some(self.parse_binding_element()?));
            if !self.check(&TokenKind::RightBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RightBracket)?;

        Ok(Pattern::Array { elements, rest })
    }

    pub(super) fn parse_parameters(&mut self) -> Result<Vec<Parameter>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut params = Vec::new();

        while !self.check(&TokenKind::RightParen) {
            if self.typescript && self.check(&TokenKind::This) {
                // `this: Type` is erased
                self.advance();
                self.expect(&TokenKind::Colon)?;
                self.skip_type()?;
            } else {
                let rest = self.check(&TokenKind::Ellipsis);
                if rest {
                    self.advance();
                }
                let target = self.parse_binding_target()?;
                if self.typescript && self.check(&TokenKind::Question) {
                    self.advance();
                }
                if self.typescript && self.check(&TokenKind::Colon) {
                    self.advance();
                    self.skip_type()?;
                }
                let pattern = if rest {
                    target
                } else {
                    self.with_default(target)?
                };
                params.push(Parameter { pattern, rest });
            }
            if !self.check(&TokenKind::RightParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance(); // consume ')'
        Ok(params)
    }

    // Functions

    /// Whether `current` starts `function` or `async function`.
    pub(super) fn at_function(&self) -> bool {
        if self.check(&TokenKind::Function) {
            return true;
        }
        if !self.check_identifier("async") {
            return false;
        }
        let next = self.peek_token();
        next.kind == TokenKind::Function && !next.newline_before
    }

    /// `[async] function [*] [name] (...) {...}`. A declaration must be
    /// named; `None` is a TypeScript overload signature.
    pub(super) fn parse_function(&mut self, declaration: bool) -> Result<Option<Function>> {
        if self.check_identifier("async") {
            self.advance();
        }
        self.expect(&TokenKind::Function)?;
        let generator = self.check(&TokenKind::Star);
        if generator {
            self.advance();
        }
        let name = match &self.current.kind {
            TokenKind::Identifier(_) => Some(self.expect_identifier()?),
            _ if declaration => {
                return Err(self.error("Function statements require a function name"));
            }
            _ => None,
        };
        self.parse_callable(name, generator)
    }

    /// Parameters, return type and body of a function or method. Generator
    /// bodies are never run and are skipped unparsed.
    pub(super) fn parse_callable(&mut self, name: Option<String>, generator: bool) -> Result<Option<Function>> {
        if self.typescript && self.check(&TokenKind::Less) {
            self.skip_type_arguments()?;
        }
        let params = self.parse_parameters()?;
        if self.typescript && self.check(&TokenKind::Colon) {
            self.advance();
            self.skip_return_type(false)?;
        }

        if !self.check(&TokenKind::LeftBrace) {
            if self.typescript {
                self.consume_semicolon()?;
                return Ok(None);
            }
            return Err(self.unexpected());
        }

        let body = if generator {
            self.skip_group()?;
            FunctionBody::Opaque
        } else {
            self.parse_function_body_or_opaque()?
        };
        Ok(Some(Function {
            name,
            arrow: false,
            params,
            body,
        }))
    }

    /// A `{...}` function body. Bodies using syntax outside the supported
    /// statement set are skipped and kept as [`FunctionBody::Opaque`].
    pub(super) fn parse_function_body_or_opaque(&mut self) -> Result<FunctionBody> {
        let snapshot = self.clone();
        match self.parse_function_block() {
            Ok(body) => Ok(FunctionBody::Block(body)),
            Err(error) => {
                tracing::trace!(%error, "function body kept opaque");
                *self = snapshot;
                self.skip_group()?;
                Ok(FunctionBody::Opaque)
            }
        }
    }

    fn parse_function_block(&mut self) -> Result<Vec<Statement>> {
        let loops = std::mem::take(&mut self.loop_depth);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = loops;
        body
    }

    /// `class [Name] [extends ...] { ... }`, kept as an opaque value.
    pub(super) fn parse_class(&mut self) -> Result<Function> {
        self.advance(); // consume 'class'
        let name = match &self.current.kind {
            TokenKind::Identifier(name) if name != "extends" && name != "implements" => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        while !self.check(&TokenKind::LeftBrace) {
            match self.current.kind {
                TokenKind::Eof => return Err(self.error("Unexpected end of input")),
                TokenKind::LeftParen | TokenKind::LeftBracket => self.skip_group()?,
                _ => self.advance(),
            }
        }
        self.skip_group()?;
        Ok(Function {
            name,
            arrow: false,
            params: Vec::new(),
            body: FunctionBody::Opaque,
        })
    }
}
