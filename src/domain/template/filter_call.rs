// Parsed filter applications and their render-time execution

use std::fmt;

use super::ast::Evaluator;
use super::context::ExecutionContext;
use super::lexer::Token;
use super::registry::FilterFunction;
use super::value::Value;
use crate::error::Result;

/// One `name` or `name:argument` segment of a filter chain.
///
/// The filter function is resolved when the node is parsed, so later
/// registry changes do not affect templates that were already parsed.
pub struct FilterCall {
    pub(crate) token: Token,
    pub(crate) name: String,
    pub(crate) parameter: Option<Box<dyn Evaluator>>,
    pub(crate) filter_fn: FilterFunction,
}

impl FilterCall {
    pub fn new(
        token: Token,
        filter_fn: FilterFunction,
        parameter: Option<Box<dyn Evaluator>>,
    ) -> Self {
        Self {
            name: token.val.clone(),
            token,
            parameter,
            filter_fn,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn has_parameter(&self) -> bool {
        self.parameter.is_some()
    }

    /// Apply this filter to `value`. The parameter expression, if any, is
    /// evaluated against `ctx` on every call.
    pub fn execute(&self, value: &Value, ctx: &ExecutionContext) -> Result<Value> {
        let param = match &self.parameter {
            Some(expr) => expr.evaluate(ctx)?,
            None => Value::nil(),
        };

        (self.filter_fn)(value, &param, &ctx.public)
            .map_err(|err| err.update_from_token_if_needed(ctx.template(), &self.token))
    }
}

impl fmt::Debug for FilterCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterCall")
            .field("name", &self.name)
            .field("line", &self.token.line)
            .field("col", &self.token.col)
            .field("parameter", &self.parameter)
            .finish_non_exhaustive()
    }
}

/// Filters applied left to right, each consuming the previous output
#[derive(Debug)]
pub struct FilterChain {
    calls: Vec<FilterCall>,
}

impl FilterChain {
    /// Only the parser builds chains, and never an empty one
    pub(crate) fn new(calls: Vec<FilterCall>) -> Self {
        debug_assert!(!calls.is_empty(), "filter chain must contain at least one call");
        Self { calls }
    }

    pub fn calls(&self) -> &[FilterCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Run every call in parse order. The first failure aborts the chain.
    pub fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Value> {
        self.calls
            .iter()
            .try_fold(input, |value, call| call.execute(&value, ctx))
    }
}
