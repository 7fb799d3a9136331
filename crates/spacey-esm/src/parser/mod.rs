// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Parser for configuration modules.
//!
//! - `parser.rs` - module items (imports, exports) and token helpers
//! - `statements.rs` - statements, declarations, patterns and functions
//! - `expressions.rs` - expressions by precedence level
//! - `typescript.rs` - type erasure used by [`Parser::new_typescript`]

mod expressions;
#[allow(clippy::module_inception)]
mod parser;
mod statements;
mod typescript;

pub use parser::Parser;
