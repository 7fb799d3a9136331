// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Expression parsing.
//!
//! ## Precedence Table (lowest to highest)
//!
//! | Operators | Method |
//! |-----------|--------|
//! | `=` `+=` `??=` etc., arrow functions | `parse_assignment` |
//! | `?:` | `parse_conditional` |
//! | `\|\|` `??` | `parse_logical_or` |
//! | `&&` | `parse_logical_and` |
//! | `==` `!=` `===` `!==` | `parse_equality` |
//! | `<` `>` `<=` `>=` `in`, TS `as` / `satisfies` | `parse_relational` |
//! | `+` `-` | `parse_additive` |
//! | `*` `/` `%` | `parse_multiplicative` |
//! | `**` (right-associative) | `parse_exponent` |
//! | `!` `-` `+` `typeof` `void` `await` `++` `--` | `parse_unary` |
//! | `.` `?.` `[]` `()`, postfix `++` `--` | `parse_postfix` |
//! | literals, `function`, `class`, `new`, `import.meta` | `parse_primary` |

use super::Parser;
use crate::Result;
use crate::ast::*;
use crate::lexer::TokenKind;
use std::rc::Rc;

impl Parser<'_> {
    /// Parses an expression (no comma operator).
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_assignment()
    }

    pub(super) fn parse_assignment(&mut self) -> Result<Expression> {
        if let Some(function) = self.try_parse_arrow()? {
            return Ok(Expression::Function(Rc::new(function)));
        }

        let target = self.parse_conditional()?;
        let operator = match self.current.kind {
            TokenKind::Equal => AssignOperator::Assign,
            TokenKind::PlusEqual => AssignOperator::Add,
            TokenKind::MinusEqual => AssignOperator::Subtract,
            TokenKind::StarEqual => AssignOperator::Multiply,
            TokenKind::SlashEqual => AssignOperator::Divide,
            TokenKind::PercentEqual => AssignOperator::Remainder,
            TokenKind::PipePipeEqual => AssignOperator::Or,
            TokenKind::AmpAmpEqual => AssignOperator::And,
            TokenKind::QuestionQuestionEqual => AssignOperator::Nullish,
            _ => return Ok(target),
        };
        if !target.is_assignment_target() {
            return Err(self.error("Invalid left-hand side in assignment"));
        }
        self.advance();
        let value = self.parse_assignment()?;
        Ok(Expression::Assign {
            operator,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expression> {
        let test = self.parse_logical_or()?;
        if !self.check(&TokenKind::Question) {
            return Ok(test);
        }
        self.advance();
        let consequent = self.parse_assignment()?;
        self.expect(&TokenKind::Colon)?;
        let alternate = self.parse_assignment()?;
        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::PipePipe => LogicalOperator::Or,
                TokenKind::QuestionQuestion => LogicalOperator::Nullish,
                _ => break,
            };
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::Logical {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;
        while self.check(&TokenKind::AmpAmp) {
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::Logical {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_relational()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::BangEqual => BinaryOperator::NotEqual,
                TokenKind::EqualEqualEqual => BinaryOperator::StrictEqual,
                TokenKind::BangEqualEqual => BinaryOperator::StrictNotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    /// Comparisons, plus `expr as T` / `expr satisfies T` whose type is dropped.
    fn parse_relational(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::Less => BinaryOperator::Less,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::Greater => BinaryOperator::Greater,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                TokenKind::In => BinaryOperator::In,
                TokenKind::Identifier(_)
                    if self.typescript
                        && !self.current.newline_before
                        && (self.check_identifier("as") || self.check_identifier("satisfies")) =>
                {
                    self.advance();
                    self.skip_type()?;
                    continue;
                }
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_exponent()?;
        loop {
            let operator = match self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::Percent => BinaryOperator::Remainder,
                _ => break,
            };
            self.advance();
            let right = self.parse_exponent()?;
            left = binary(operator, left, right);
        }
        Ok(left)
    }

    fn parse_exponent(&mut self) -> Result<Expression> {
        let base = self.parse_unary()?;
        if !self.check(&TokenKind::StarStar) {
            return Ok(base);
        }
        self.advance();
        let exponent = self.parse_exponent()?;
        Ok(binary(BinaryOperator::Exponent, base, exponent))
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match self.current.kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Minus => UnaryOperator::Minus,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Typeof => UnaryOperator::Typeof,
            TokenKind::Void => UnaryOperator::Void,
            // `await` is reserved in modules
            TokenKind::Identifier(_) if self.check_identifier("await") => UnaryOperator::Await,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let operator = if self.check(&TokenKind::PlusPlus) {
                    UpdateOperator::Increment
                } else {
                    UpdateOperator::Decrement
                };
                self.advance();
                let target = self.parse_unary()?;
                if !target.is_assignment_target() {
                    return Err(self.error("Invalid left-hand side expression in prefix operation"));
                }
                return Ok(Expression::Update {
                    operator,
                    prefix: true,
                    target: Box::new(target),
                });
            }
            _ => return self.parse_postfix(),
        };
        self.advance();
        let argument = self.parse_unary()?;
        Ok(Expression::Unary {
            operator,
            argument: Box::new(argument),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    expr = member(expr, MemberProperty::Static(name), false);
                }
                TokenKind::QuestionDot => {
                    self.advance();
                    if self.check(&TokenKind::LeftParen) {
                        let arguments = self.parse_arguments()?;
                        expr = Expression::Call {
                            callee: Box::new(expr),
                            arguments,
                            optional: true,
                        };
                    } else if self.check(&TokenKind::LeftBracket) {
                        let property = self.parse_computed_member()?;
                        expr = member(expr, property, true);
                    } else {
                        let name = self.expect_property_name()?;
                        expr = member(expr, MemberProperty::Static(name), true);
                    }
                }
                TokenKind::LeftBracket => {
                    let property = self.parse_computed_member()?;
                    expr = member(expr, property, false);
                }
                TokenKind::LeftParen => {
                    let arguments = self.parse_arguments()?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        arguments,
                        optional: false,
                    };
                }
                TokenKind::Less if self.typescript && self.at_type_arguments() => {
                    // `defineConfig<Config>(...)`
                    self.skip_type_arguments()?;
                }
                TokenKind::Bang if self.typescript && !self.current.newline_before => {
                    // non-null assertion
                    self.advance();
                }
                TokenKind::Template { .. } if !self.current.newline_before => {
                    return Err(self.error("tagged templates are not supported"));
                }
                _ => break,
            }
        }

        if matches!(self.current.kind, TokenKind::PlusPlus | TokenKind::MinusMinus)
            && !self.current.newline_before
        {
            if !expr.is_assignment_target() {
                return Err(self.error("Invalid left-hand side expression in postfix operation"));
            }
            let operator = if self.check(&TokenKind::PlusPlus) {
                UpdateOperator::Increment
            } else {
                UpdateOperator::Decrement
            };
            self.advance();
            expr = Expression::Update {
                operator,
                prefix: false,
                target: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_computed_member(&mut self) -> Result<MemberProperty> {
        self.expect(&TokenKind::LeftBracket)?;
        let property = self.parse_expression()?;
        self.expect(&TokenKind::RightBracket)?;
        Ok(MemberProperty::Computed(Box::new(property)))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Element>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut arguments = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            arguments.push(self.parse_element()?);
            if !self.check(&TokenKind::RightParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance(); // consume ')'
        Ok(arguments)
    }

    fn parse_element(&mut self) -> Result<Element> {
        if self.check(&TokenKind::Ellipsis) {
            self.advance();
            Ok(Element::Spread(self.parse_assignment()?))
        } else {
            Ok(Element::Expression(self.parse_assignment()?))
        }
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let kind = self.current.kind.clone();
        match kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression::Number(n))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::String(s))
            }
            TokenKind::Template {
                quasis,
                substitutions,
            } => {
                self.advance();
                let mut expressions = Vec::with_capacity(substitutions.len());
                for sub in &substitutions {
                    let mut parser = Parser::with_dialect(&sub.source, self.dialect());
                    parser.base_offset = self.base_offset + sub.offset;
                    expressions.push(parser.parse_standalone_expression()?);
                }
                Ok(Expression::Template {
                    quasis,
                    expressions,
                })
            }
            TokenKind::Slash | TokenKind::SlashEqual => {
                self.rescan_regex();
                match self.current.kind.clone() {
                    TokenKind::RegExp { pattern, flags } => {
                        self.advance();
                        Ok(Expression::RegExp { pattern, flags })
                    }
                    _ => Err(self.unexpected()),
                }
            }
            TokenKind::True => {
                self.advance();
                Ok(Expression::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Boolean(false))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expression::Null)
            }
            TokenKind::This => {
                self.advance();
                Ok(Expression::This)
            }
            TokenKind::Function => self.parse_function_expression(),
            TokenKind::Identifier(_) if self.at_function() => self.parse_function_expression(),
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Expression::Identifier(name))
            }
            TokenKind::Class => Ok(Expression::Function(Rc::new(self.parse_class()?))),
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => self.parse_array(),
            TokenKind::LeftBrace => self.parse_object(),
            TokenKind::New => self.parse_new(),
            TokenKind::Import => {
                self.advance();
                if self.check(&TokenKind::Dot) {
                    self.advance();
                    self.expect_contextual("meta")?;
                    Ok(Expression::ImportMeta)
                } else {
                    Err(self.error("dynamic import() is not supported in configuration modules"))
                }
            }
            TokenKind::Invalid(message) => Err(self.error(message)),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_function_expression(&mut self) -> Result<Expression> {
        let function = self.parse_function(false)?.ok_or_else(|| self.unexpected())?;
        Ok(Expression::Function(Rc::new(function)))
    }

    /// Arrow function at `current`, if there is one; nothing is consumed
    /// otherwise.
    fn try_parse_arrow(&mut self) -> Result<Option<Function>> {
        let mut lookahead = self.clone();
        let is_async = lookahead.check_identifier("async") && !lookahead.peek_token().newline_before;
        if is_async {
            lookahead.advance();
        }

        let found = match &lookahead.current.kind {
            TokenKind::Identifier(_) => {
                let next = lookahead.peek_token();
                next.kind == TokenKind::Arrow && !next.newline_before
            }
            TokenKind::LeftParen => lookahead.at_arrow_parameters(),
            TokenKind::Less if lookahead.typescript => {
                lookahead.skip_type_arguments().is_ok() && lookahead.at_arrow_parameters()
            }
            _ => false,
        };
        if !found {
            return Ok(None);
        }

        if is_async {
            self.advance();
        }
        self.parse_arrow().map(Some)
    }

    /// Whether the parenthesized group at `current` is an arrow parameter list.
    fn at_arrow_parameters(&self) -> bool {
        if !self.check(&TokenKind::LeftParen) {
            return false;
        }
        let mut lookahead = self.clone();
        if lookahead.skip_group().is_err() {
            return false;
        }
        if lookahead.check(&TokenKind::Arrow) {
            return !lookahead.current.newline_before;
        }
        if lookahead.typescript && lookahead.check(&TokenKind::Colon) {
            lookahead.advance();
            return lookahead.skip_return_type(true).is_ok() && lookahead.check(&TokenKind::Arrow);
        }
        false
    }

    fn parse_arrow(&mut self) -> Result<Function> {
        let params = if let TokenKind::Identifier(name) = &self.current.kind {
            let pattern = Pattern::Identifier(name.clone());
            self.advance();
            vec![Parameter {
                pattern,
                rest: false,
            }]
        } else {
            if self.typescript && self.check(&TokenKind::Less) {
                self.skip_type_arguments()?;
            }
            let params = self.parse_parameters()?;
            if self.typescript && self.check(&TokenKind::Colon) {
                self.advance();
                self.skip_return_type(true)?;
            }
            params
        };
        self.expect(&TokenKind::Arrow)?;

        let body = if self.check(&TokenKind::LeftBrace) {
            self.parse_function_body_or_opaque()?
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment()?))
        };
        Ok(Function {
            name: None,
            arrow: true,
            params,
            body,
        })
    }

    fn parse_new(&mut self) -> Result<Expression> {
        self.advance(); // consume 'new'

        let mut callee = match self.current.kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Expression::Identifier(name)
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                expr
            }
            _ => return Err(self.unexpected()),
        };

        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_property_name()?;
                    callee = member(callee, MemberProperty::Static(name), false);
                }
                TokenKind::LeftBracket => {
                    let property = self.parse_computed_member()?;
                    callee = member(callee, property, false);
                }
                _ => break,
            }
        }

        if self.typescript && self.check(&TokenKind::Less) {
            self.skip_type_arguments()?;
        }

        let arguments = if self.check(&TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };

        Ok(Expression::New {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn parse_array(&mut self) -> Result<Expression> {
        self.advance(); // consume '['
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RightBracket) {
            if self.check(&TokenKind::Comma) {
                self.advance();
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_element()?));
            if !self.check(&TokenKind::RightBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance(); // consume ']'

        Ok(Expression::Array(elements))
    }

    fn parse_object(&mut self) -> Result<Expression> {
        self.advance(); // consume '{'
        let mut properties = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            if self.check(&TokenKind::Ellipsis) {
                self.advance();
                properties.push(Property::Spread(self.parse_assignment()?));
            } else if let Some(property) = self.parse_object_member()? {
                properties.push(property);
            }

            if !self.check(&TokenKind::RightBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.advance(); // consume '}'

        Ok(Expression::Object(properties))
    }

    /// `key: value`, shorthand, method, getter or setter. Setters yield
    /// `None`: the object literal never runs them.
    fn parse_object_member(&mut self) -> Result<Option<Property>> {
        let modifier = self.method_modifier();
        if modifier.is_some() {
            self.advance();
        }
        let generator = self.check(&TokenKind::Star);
        if generator {
            self.advance();
        }

        let (key, shorthand) = self.parse_property_key()?;

        let is_method = modifier.is_some()
            || generator
            || self.check(&TokenKind::LeftParen)
            || (self.typescript && self.check(&TokenKind::Less));
        if is_method {
            if self.typescript && self.check(&TokenKind::Less) {
                self.skip_type_arguments()?;
            }
            let name = match &key {
                PropertyKey::Static(name) => Some(name.clone()),
                PropertyKey::Computed(_) => None,
            };
            let function = self
                .parse_callable(name, generator)?
                .ok_or_else(|| self.unexpected())?;
            return Ok(match modifier {
                Some(MethodModifier::Get) => Some(Property::Getter(key, Rc::new(function))),
                Some(MethodModifier::Set) => None,
                _ => Some(Property::KeyValue(key, Expression::Function(Rc::new(function)))),
            });
        }

        if self.check(&TokenKind::Colon) {
            self.advance();
            return Ok(Some(Property::KeyValue(key, self.parse_assignment()?)));
        }
        match shorthand {
            Some(name) => Ok(Some(Property::KeyValue(key, Expression::Identifier(name)))),
            None => Err(self.unexpected()),
        }
    }

    /// `async`, `get` or `set` in front of a method key.
    fn method_modifier(&self) -> Option<MethodModifier> {
        let modifier = match &self.current.kind {
            TokenKind::Identifier(word) => match word.as_str() {
                "async" => MethodModifier::Async,
                "get" => MethodModifier::Get,
                "set" => MethodModifier::Set,
                _ => return None,
            },
            _ => return None,
        };
        let next = self.peek_token();
        if modifier == MethodModifier::Async && next.newline_before {
            return None;
        }
        let starts_key = matches!(
            next.kind,
            TokenKind::Identifier(_)
                | TokenKind::String(_)
                | TokenKind::Number(_)
                | TokenKind::LeftBracket
                | TokenKind::Star
        ) || next.kind.keyword_name().is_some();
        starts_key.then_some(modifier)
    }

    /// An object key, with the identifier it names when shorthand is allowed.
    pub(super) fn parse_property_key(&mut self) -> Result<(PropertyKey, Option<String>)> {
        let shorthand = match &self.current.kind {
            TokenKind::Identifier(name) => Some(name.clone()),
            _ => None,
        };
        let key = match self.current.kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                PropertyKey::Static(s)
            }
            TokenKind::Number(n) => {
                self.advance();
                PropertyKey::Static(crate::eval::number_to_string(n))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let expr = self.parse_assignment()?;
                self.expect(&TokenKind::RightBracket)?;
                PropertyKey::Computed(expr)
            }
            _ => PropertyKey::Static(self.expect_property_name()?),
        };
        Ok((key, shorthand))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodModifier {
    Async,
    Get,
    Set,
}

fn member(object: Expression, property: MemberProperty, optional: bool) -> Expression {
    Expression::Member {
        object: Box::new(object),
        property,
        optional,
    }
}

fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    Expression::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}
