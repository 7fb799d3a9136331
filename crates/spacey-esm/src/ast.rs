// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract syntax tree for configuration modules.
//!
//! TypeScript-only syntax never reaches this tree; the parser erases it.

use std::rc::Rc;

/// A parsed module.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Top-level items in source order
    pub body: Vec<Item>,
}

/// A top-level module item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `import ... from 'source'` or `import 'source'`
    Import(ImportDeclaration),
    /// `export default <expr>`, including `export default function`
    ExportDefault(Expression),
    /// `export const a = ...`
    ExportDeclaration(VariableDeclaration),
    /// `export function f() {}` / `export class C {}`
    ExportFunction(Rc<Function>),
    /// `export { a, b as c }`
    ExportNamed(Vec<ExportSpecifier>),
    /// `export { a } from 'source'`
    ExportFrom {
        /// Module specifier
        source: String,
        /// Re-exported names
        specifiers: Vec<ExportSpecifier>,
    },
    /// Any other statement
    Statement(Statement),
}

/// An import declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    /// The module specifier (e.g., `astro/config`, `./base.mjs`)
    pub source: String,
    /// Bound names; empty for side-effect imports
    pub specifiers: Vec<ImportSpecifier>,
}

/// A single binding introduced by an import.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSpecifier {
    /// `import foo from 'module'`
    Default(String),
    /// `import { imported as local } from 'module'`
    Named {
        /// Export name in the source module
        imported: String,
        /// Local binding
        local: String,
    },
    /// `import * as ns from 'module'`
    Namespace(String),
}

/// `local as exported` inside an export list.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    /// Local (or re-exported) name
    pub local: String,
    /// Name visible to importers
    pub exported: String,
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `const a = 1, { b } = c`
    Declaration(VariableDeclaration),
    /// `function f() {}` or `class C {}`; always named
    Function(Rc<Function>),
    /// A bare expression statement
    Expression(Expression),
    /// `{ ... }`
    Block(Vec<Statement>),
    /// `if (test) consequent else alternate`
    If {
        /// Condition
        test: Expression,
        /// Taken when truthy
        consequent: Box<Statement>,
        /// Taken when falsy
        alternate: Option<Box<Statement>>,
    },
    /// `for (init; test; update) body`
    For {
        /// Initializer (declaration or expression statement)
        init: Option<Box<Statement>>,
        /// Loop condition; absent means `true`
        test: Option<Expression>,
        /// Runs after each iteration
        update: Option<Expression>,
        /// Loop body
        body: Box<Statement>,
    },
    /// `for (const x of xs) body`
    ForOf(ForEach),
    /// `for (const k in object) body`
    ForIn(ForEach),
    /// `while (test) body`
    While {
        /// Loop condition
        test: Expression,
        /// Loop body
        body: Box<Statement>,
    },
    /// `return [expr]`
    Return(Option<Expression>),
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `throw <expr>`
    Throw(Expression),
    /// `try {} catch (e) {} finally {}`
    Try {
        /// Protected block
        block: Vec<Statement>,
        /// `catch` clause
        handler: Option<CatchClause>,
        /// `finally` block
        finalizer: Option<Vec<Statement>>,
    },
}

/// Head and body shared by `for...of` and `for...in`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForEach {
    /// Declaration keyword of the loop binding
    pub kind: VariableKind,
    /// Loop binding
    pub target: Pattern,
    /// Iterated expression
    pub right: Expression,
    /// Loop body
    pub body: Box<Statement>,
}

/// `catch (param) { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// Bound error; absent for `catch {}`
    pub param: Option<Pattern>,
    /// Handler body
    pub body: Vec<Statement>,
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    /// `var`
    Var,
    /// `let`
    Let,
    /// `const`
    Const,
}

/// `const a = 1, b = 2`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    /// Declaration keyword
    pub kind: VariableKind,
    /// Declared bindings
    pub declarations: Vec<VariableDeclarator>,
}

/// One binding of a variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    /// Bound name or destructuring pattern
    pub target: Pattern,
    /// Initializer, if any
    pub init: Option<Expression>,
}

/// A binding target.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `a`
    Identifier(String),
    /// `{ a, b: c, ...rest }`
    Object {
        /// Destructured properties
        properties: Vec<PatternProperty>,
        /// `...rest` binding
        rest: Option<String>,
    },
    /// `[a, , b, ...rest]`; `None` is a hole
    Array {
        /// Destructured elements
        elements: Vec<Option<Pattern>>,
        /// `...rest` binding
        rest: Option<Box<Pattern>>,
    },
    /// `target = value`, used when the matched value is `undefined`
    Default {
        /// Binding target
        target: Box<Pattern>,
        /// Fallback expression
        value: Box<Expression>,
    },
}

impl Pattern {
    /// Names this pattern binds, in source order.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Pattern::Identifier(name) => names.push(name),
            Pattern::Object { properties, rest } => {
                for property in properties {
                    property.value.collect_names(names);
                }
                if let Some(rest) = rest {
                    names.push(rest);
                }
            }
            Pattern::Array { elements, rest } => {
                for element in elements.iter().flatten() {
                    element.collect_names(names);
                }
                if let Some(rest) = rest {
                    rest.collect_names(names);
                }
            }
            Pattern::Default { target, .. } => target.collect_names(names),
        }
    }
}

/// `key: pattern` inside an object pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternProperty {
    /// Property read from the matched value
    pub key: PropertyKey,
    /// Where it is bound
    pub value: Pattern,
}

/// A function, arrow function, method or class.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Declared name, or the key of a method
    pub name: Option<String>,
    /// Arrow functions take `this` from the enclosing scope
    pub arrow: bool,
    /// Parameters
    pub params: Vec<Parameter>,
    /// Body
    pub body: FunctionBody,
}

/// A function parameter; defaults are [`Pattern::Default`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Binding target
    pub pattern: Pattern,
    /// Whether this is `...rest`
    pub rest: bool,
}

/// What running a function evaluates.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    /// Arrow function with an expression body
    Expression(Box<Expression>),
    /// Statement block
    Block(Vec<Statement>),
    /// A body that was skipped rather than parsed (classes, generators, and
    /// blocks using statements the evaluator does not run). The function is
    /// still a value; calling it is a `TypeError`.
    Opaque,
}

/// Expressions supported in configuration modules.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Template literal
    Template {
        /// Text chunks, one more than `expressions`
        quasis: Vec<String>,
        /// Substituted expressions
        expressions: Vec<Expression>,
    },
    /// `/pattern/flags`
    RegExp {
        /// Source between the slashes
        pattern: String,
        /// Flags
        flags: String,
    },
    /// Identifier reference
    Identifier(String),
    /// `this`
    This,
    /// `[a, , ...b]`; `None` is a hole
    Array(Vec<Option<Element>>),
    /// `{ a: 1, b, ...c }`
    Object(Vec<Property>),
    /// Function expression, arrow function or class expression
    Function(Rc<Function>),
    /// `a.b`, `a?.b`, `a[b]`
    Member {
        /// Object expression
        object: Box<Expression>,
        /// Accessed property
        property: MemberProperty,
        /// Whether this link is `?.`
        optional: bool,
    },
    /// `f(a, ...b)`
    Call {
        /// Called expression
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Element>,
        /// Whether this link is `?.()`
        optional: bool,
    },
    /// `new C(a)`
    New {
        /// Constructor expression
        callee: Box<Expression>,
        /// Arguments
        arguments: Vec<Element>,
    },
    /// `!a`, `-a`, `typeof a`, `await a`
    Unary {
        /// Operator
        operator: UnaryOperator,
        /// Operand
        argument: Box<Expression>,
    },
    /// `a++`, `--a`
    Update {
        /// Operator
        operator: UpdateOperator,
        /// Whether the operator comes first
        prefix: bool,
        /// Updated identifier or member
        target: Box<Expression>,
    },
    /// `a ?? b`, `a || b`, `a && b`
    Logical {
        /// Operator
        operator: LogicalOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// `a + b`, `a === b`, `a < b` and friends
    Binary {
        /// Operator
        operator: BinaryOperator,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// `a = b`, `a.b += c`
    Assign {
        /// Operator
        operator: AssignOperator,
        /// Identifier or member being assigned
        target: Box<Expression>,
        /// Assigned value
        value: Box<Expression>,
    },
    /// `test ? consequent : alternate`
    Conditional {
        /// Condition
        test: Box<Expression>,
        /// Value when truthy
        consequent: Box<Expression>,
        /// Value when falsy
        alternate: Box<Expression>,
    },
    /// `import.meta`
    ImportMeta,
}

impl Expression {
    /// Whether this expression can appear left of `=`.
    pub fn is_assignment_target(&self) -> bool {
        matches!(
            self,
            Expression::Identifier(_) | Expression::Member { optional: false, .. }
        )
    }
}

/// An array element or call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Plain expression
    Expression(Expression),
    /// `...expr`
    Spread(Expression),
}

/// An object literal member.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// `key: value`; shorthand `key` and methods `key() {}` desugar to this
    KeyValue(PropertyKey, Expression),
    /// `get key() {}`; evaluated once when the object is built
    Getter(PropertyKey, Rc<Function>),
    /// `...expr`
    Spread(Expression),
}

/// Object literal key.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// Identifier, string or numeric key
    Static(String),
    /// `[expr]`
    Computed(Expression),
}

/// Member access property.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `.name`
    Static(String),
    /// `[expr]`
    Computed(Box<Expression>),
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `!`
    Not,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `typeof`
    Typeof,
    /// `void`
    Void,
    /// `await`; values are never promises here, so this yields its operand
    Await,
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    /// `??`
    Nullish,
    /// `||`
    Or,
    /// `&&`
    And,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `===`
    StrictEqual,
    /// `!==`
    StrictNotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `in`
    In,
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Remainder,
    /// `**`
    Exponent,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Subtract,
    /// `*=`
    Multiply,
    /// `/=`
    Divide,
    /// `%=`
    Remainder,
    /// `||=`
    Or,
    /// `&&=`
    And,
    /// `??=`
    Nullish,
}

impl AssignOperator {
    /// The arithmetic operator a compound assignment applies.
    pub fn binary(self) -> Option<BinaryOperator> {
        match self {
            AssignOperator::Add => Some(BinaryOperator::Add),
            AssignOperator::Subtract => Some(BinaryOperator::Subtract),
            AssignOperator::Multiply => Some(BinaryOperator::Multiply),
            AssignOperator::Divide => Some(BinaryOperator::Divide),
            AssignOperator::Remainder => Some(BinaryOperator::Remainder),
            _ => None,
        }
    }

    /// The short-circuit a logical assignment applies.
    pub fn logical(self) -> Option<LogicalOperator> {
        match self {
            AssignOperator::Or => Some(LogicalOperator::Or),
            AssignOperator::And => Some(LogicalOperator::And),
            AssignOperator::Nullish => Some(LogicalOperator::Nullish),
            _ => None,
        }
    }
}
