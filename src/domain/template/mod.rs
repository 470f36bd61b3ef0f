// Template filter pipeline
//
// This module provides the filter registry, the parser for `|`-separated
// filter chains inside template expressions, and render-time execution of
// the parsed chains.

mod ast;
mod builtins;
mod context;
mod filter_call;
mod lexer;
mod parser;
mod registry;
mod value;

pub use ast::{Evaluator, FilteredExpression, Literal, VariableRef};
pub use context::ExecutionContext;
pub use filter_call::{FilterCall, FilterChain};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::ExpressionParser;
pub use registry::{
    apply_filter, filter_exists, must_apply_filter, override_filter, register_filter,
    replace_filter, FilterFunction, FilterRegistry,
};
pub use value::{Bindings, Value};
