// Expression nodes produced by the parser

use std::fmt;

use super::context::ExecutionContext;
use super::filter_call::FilterChain;
use super::lexer::Token;
use super::value::Value;
use crate::error::Result;

/// Anything that yields a value when evaluated against a render context.
///
/// Nodes are immutable once parsed, so one parsed expression can be
/// evaluated by many renders at once.
pub trait Evaluator: fmt::Debug + Send + Sync {
    fn evaluate(&self, ctx: &ExecutionContext) -> Result<Value>;
}

/// A string, number, boolean or nil literal
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Evaluator for Literal {
    fn evaluate(&self, _ctx: &ExecutionContext) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// A dotted variable path such as `user.name` or `items.0`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub token: Token,
    pub parts: Vec<String>,
}

impl VariableRef {
    pub fn new(token: Token, parts: Vec<String>) -> Self {
        Self { token, parts }
    }

    pub fn path(&self) -> String {
        self.parts.join(".")
    }
}

impl Evaluator for VariableRef {
    /// Unresolvable paths evaluate to nil
    fn evaluate(&self, ctx: &ExecutionContext) -> Result<Value> {
        let Some((head, rest)) = self.parts.split_first() else {
            return Ok(Value::Nil);
        };

        let mut current = match ctx.lookup(head) {
            Some(value) => value,
            None => return Ok(Value::Nil),
        };
        for part in rest {
            match current.get_attr(part) {
                Some(next) => current = next,
                None => return Ok(Value::Nil),
            }
        }

        Ok(current.clone())
    }
}

/// A base value followed by an optional filter chain: `name|upper|truncatechars:5`
#[derive(Debug)]
pub struct FilteredExpression {
    pub base: Box<dyn Evaluator>,
    pub filters: Option<FilterChain>,
}

impl Evaluator for FilteredExpression {
    fn evaluate(&self, ctx: &ExecutionContext) -> Result<Value> {
        let value = self.base.evaluate(ctx)?;
        match &self.filters {
            Some(chain) => chain.execute(value, ctx),
            None => Ok(value),
        }
    }
}
