// Expression parser using recursive descent over lexer tokens

use super::ast::{Evaluator, FilteredExpression, Literal, VariableRef};
use super::filter_call::{FilterCall, FilterChain};
use super::lexer::{Lexer, Token, TokenKind};
use super::registry::FilterRegistry;
use super::value::Value;
use crate::error::{Error, ErrorKind, Result};

const SENDER: &str = "parser";

/// Symbols that close the surrounding tag and therefore cannot start an argument
const TERMINATORS: &[&str] = &["}}", "%}"];

pub struct ExpressionParser<'r> {
    tokens: Vec<Token>,
    idx: usize,
    registry: &'r FilterRegistry,
    template: Option<String>,
}

impl ExpressionParser<'static> {
    /// Parse `source` as a complete expression, binding filters from the global registry
    pub fn parse(source: &str) -> Result<FilteredExpression> {
        Self::parse_with(source, FilterRegistry::global())
    }
}

impl<'r> ExpressionParser<'r> {
    pub fn new(tokens: Vec<Token>, registry: &'r FilterRegistry) -> Self {
        Self {
            tokens,
            idx: 0,
            registry,
            template: None,
        }
    }

    pub fn from_source(source: &str, registry: &'r FilterRegistry) -> Result<Self> {
        Ok(Self::new(Lexer::tokenize(source)?, registry))
    }

    pub fn parse_with(source: &str, registry: &'r FilterRegistry) -> Result<FilteredExpression> {
        Self::from_source(source, registry)?.parse_expression()
    }

    /// Name of the template being parsed, attached to parse errors
    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.idx)
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.idx)
    }

    pub fn consume(&mut self) {
        self.idx += 1;
    }

    /// Consume and return the current token if it has the given kind
    pub fn match_type(&mut self, kind: TokenKind) -> Option<Token> {
        let token = self.peek_type(kind)?.clone();
        self.consume();
        Some(token)
    }

    /// Consume and return the current token if it has the given kind and value
    pub fn match_token(&mut self, kind: TokenKind, val: &str) -> Option<Token> {
        let token = self.peek(kind, val)?.clone();
        self.consume();
        Some(token)
    }

    pub fn peek(&self, kind: TokenKind, val: &str) -> Option<&Token> {
        self.current().filter(|t| t.is(kind, val))
    }

    pub fn peek_type(&self, kind: TokenKind) -> Option<&Token> {
        self.current().filter(|t| t.kind == kind)
    }

    /// Build a parse error located at `token`, or at the current position
    pub fn error(&self, kind: ErrorKind, token: Option<&Token>) -> Error {
        let err = Error::new(SENDER, kind).in_template(self.template.as_deref());
        match token.or_else(|| self.current()).or_else(|| self.tokens.last()) {
            Some(token) => err.at(token),
            None => err,
        }
    }

    fn syntax_error(&self, message: &str, token: Option<&Token>) -> Error {
        self.error(ErrorKind::Syntax(message.to_string()), token)
    }

    fn at_terminator(&self) -> bool {
        self.current().is_none()
            || TERMINATORS
                .iter()
                .any(|t| self.peek(TokenKind::Symbol, t).is_some())
    }

    /// Expression = VariableOrLiteral ( "|" FilterChain )? "}}"?
    pub fn parse_expression(&mut self) -> Result<FilteredExpression> {
        let base = self.parse_variable_or_literal()?;

        let filters = if self.match_token(TokenKind::Symbol, "|").is_some() {
            Some(self.parse_filter_chain()?)
        } else {
            None
        };

        self.match_token(TokenKind::Symbol, "}}");
        if let Some(token) = self.current() {
            return Err(self.syntax_error(
                &format!("Unexpected token '{}' after expression.", token.val),
                Some(token),
            ));
        }

        Ok(FilteredExpression { base, filters })
    }

    /// FilterChain = Filter ( "|" Filter )*
    pub fn parse_filter_chain(&mut self) -> Result<FilterChain> {
        let mut calls = vec![self.parse_filter()?];

        while self.match_token(TokenKind::Symbol, "|").is_some() {
            calls.push(self.parse_filter()?);
        }

        Ok(FilterChain::new(calls))
    }

    /// Filter = IDENT ( ":" VariableOrLiteral )?
    pub fn parse_filter(&mut self) -> Result<FilterCall> {
        let Some(ident) = self.match_type(TokenKind::Identifier) else {
            return Err(self.syntax_error("Filter name must be an identifier.", None));
        };

        // Bind the function now so rendering never looks names up
        let Some(filter_fn) = self.registry.get(&ident.val) else {
            return Err(self.error(ErrorKind::UnknownFilter(ident.val.clone()), Some(&ident)));
        };
        tracing::debug!(filter = %ident.val, line = ident.line, col = ident.col, "bound filter");

        let mut parameter = None;
        if self.match_token(TokenKind::Symbol, ":").is_some() {
            // `name:|next` and `name:}}` both leave the argument out
            if self.at_terminator() || self.peek(TokenKind::Symbol, "|").is_some() {
                return Err(self.error(ErrorKind::MissingArgument, None));
            }
            parameter = Some(self.parse_variable_or_literal()?);
        }

        Ok(FilterCall::new(ident, filter_fn, parameter))
    }

    /// VariableOrLiteral = STRING | "-"? NUMBER | "true" | "false" | "nil" | IDENT ( "." (IDENT | NUMBER) )*
    pub fn parse_variable_or_literal(&mut self) -> Result<Box<dyn Evaluator>> {
        if let Some(token) = self.match_type(TokenKind::String) {
            return Ok(Box::new(Literal::new(Value::String(token.val))));
        }

        let negative = self.match_token(TokenKind::Symbol, "-").is_some();
        if let Some(token) = self.match_type(TokenKind::Number) {
            return self.number_literal(&token, negative);
        }
        if negative {
            return Err(self.syntax_error("A number must follow '-'.", None));
        }

        if let Some(token) = self.match_type(TokenKind::Identifier) {
            let keyword = match token.val.as_str() {
                "true" | "True" => Some(Value::Bool(true)),
                "false" | "False" => Some(Value::Bool(false)),
                "nil" | "None" => Some(Value::Nil),
                _ => None,
            };
            if let Some(value) = keyword {
                return Ok(Box::new(Literal::new(value)));
            }
            return self.variable_path(token);
        }

        Err(self.syntax_error(
            "Expected either a number, string, keyword or identifier.",
            None,
        ))
    }

    fn number_literal(&self, token: &Token, negative: bool) -> Result<Box<dyn Evaluator>> {
        let text = if negative {
            format!("-{}", token.val)
        } else {
            token.val.clone()
        };

        let value = if token.val.contains('.') {
            text.parse::<f64>().map(Value::Float).ok()
        } else {
            text.parse::<i64>().map(Value::Integer).ok()
        };

        match value {
            Some(value) => Ok(Box::new(Literal::new(value))),
            None => Err(self.syntax_error(&format!("Invalid number '{}'.", text), Some(token))),
        }
    }

    fn variable_path(&mut self, head: Token) -> Result<Box<dyn Evaluator>> {
        let mut parts = vec![head.val.clone()];

        while self.match_token(TokenKind::Symbol, ".").is_some() {
            let part = self
                .match_type(TokenKind::Identifier)
                .or_else(|| self.match_type(TokenKind::Number));
            match part {
                Some(token) => parts.push(token.val),
                None => {
                    return Err(self.syntax_error(
                        "Expected an identifier or number after '.'.",
                        None,
                    ))
                }
            }
        }

        Ok(Box::new(VariableRef::new(head, parts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::{Bindings, ExecutionContext};

    fn registry() -> FilterRegistry {
        let registry = FilterRegistry::with_builtins();
        registry
            .register("double", |v, _, _| {
                Ok(Value::from(v.as_integer().unwrap_or_default() * 2))
            })
            .unwrap();
        registry
            .register("neg", |v, _, _| Ok(Value::from(-v.as_integer().unwrap_or_default())))
            .unwrap();
        registry
            .register("truncate", |v, p, _| {
                let n = p.as_integer().unwrap_or_default().max(0) as usize;
                Ok(Value::from(v.to_string().chars().take(n).collect::<String>()))
            })
            .unwrap();
        registry
    }

    fn chain(source: &str, registry: &FilterRegistry) -> Result<FilterChain> {
        ExpressionParser::from_source(source, registry)?.parse_filter_chain()
    }

    #[test]
    fn test_parse_single_filter() {
        let registry = registry();
        let chain = chain("upper", &registry).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.calls()[0].name(), "upper");
        assert!(!chain.calls()[0].has_parameter());
    }

    #[test]
    fn test_parse_unknown_filter_located() {
        let registry = registry();
        let err = chain("upper|bogus", &registry).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownFilter("bogus".to_string()));
        assert_eq!(err.sender, "parser");
        let loc = err.location.unwrap();
        assert_eq!((loc.line, loc.col, loc.token.as_str()), (1, 7, "bogus"));
    }

    #[test]
    fn test_filter_name_must_be_identifier() {
        let registry = registry();
        let err = chain("upper|'x'", &registry).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax("Filter name must be an identifier.".to_string()));
        assert_eq!(err.location.unwrap().col, 7);
    }

    #[test]
    fn test_missing_argument_before_terminator() {
        let registry = registry();
        for source in ["truncate: }}", "truncate:", "truncate: %}", "upper:|lower", "truncate: | upper }}"] {
            let err = chain(source, &registry).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MissingArgument, "source: {}", source);
        }
    }

    #[test]
    fn test_argument_must_be_variable_or_literal() {
        let registry = registry();
        for source in ["truncate:)", "truncate:,5", "truncate::"] {
            let err = chain(source, &registry).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::Syntax(_)), "source: {}", source);
        }
    }

    #[test]
    fn test_missing_argument_before_pipe_is_located() {
        let registry = registry();
        let err = chain("upper:|lower", &registry).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingArgument);
        let loc = err.location.unwrap();
        assert_eq!((loc.col, loc.token.as_str()), (7, "|"));
    }

    #[test]
    fn test_chain_stops_at_terminator() {
        let registry = registry();
        let mut parser = ExpressionParser::from_source("lower|upper }}", &registry).unwrap();
        let chain = parser.parse_filter_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert!(parser.peek(TokenKind::Symbol, "}}").is_some());
        assert_eq!(parser.remaining(), 1);
    }

    #[test]
    fn test_literal_argument_ignores_context() {
        let registry = registry();
        let chain = chain("truncate:5", &registry).unwrap();

        let mut public = Bindings::new();
        public.insert("5".to_string(), Value::from(1));
        public.insert("truncate".to_string(), Value::from(1));
        let ctx = ExecutionContext::new(public);

        let out = chain.execute(Value::from("abcdefgh"), &ctx).unwrap();
        assert_eq!(out, Value::from("abcde"));
    }

    #[test]
    fn test_double_then_neg() {
        let registry = registry();
        let chain = chain("double|neg", &registry).unwrap();
        let out = chain.execute(Value::from(3), &ExecutionContext::default()).unwrap();
        assert_eq!(out, Value::Integer(-6));
    }

    #[test]
    fn test_parse_literals() {
        let registry = registry();
        let ctx = ExecutionContext::default();
        let cases = [
            ("'hi'", Value::from("hi")),
            ("42", Value::Integer(42)),
            ("-7", Value::Integer(-7)),
            ("2.5", Value::Float(2.5)),
            ("true", Value::Bool(true)),
            ("nil", Value::Nil),
        ];
        for (source, expected) in cases {
            let expr = ExpressionParser::parse_with(source, &registry).unwrap();
            assert_eq!(expr.evaluate(&ctx).unwrap(), expected, "source: {}", source);
        }
    }

    #[test]
    fn test_parse_expression_with_variable_argument() {
        let registry = registry();
        let expr = ExpressionParser::parse_with("title|truncate:limit }}", &registry).unwrap();

        let mut public = Bindings::new();
        public.insert("title".to_string(), Value::from("filters"));
        public.insert("limit".to_string(), Value::from(4));
        let ctx = ExecutionContext::new(public);

        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::from("filt"));
    }

    #[test]
    fn test_parse_expression_trailing_tokens() {
        let registry = registry();
        let err = ExpressionParser::parse_with("name upper", &registry).unwrap_err();
        assert!(err.to_string().contains("Unexpected token 'upper'"));
    }

    #[test]
    fn test_nested_list_index() {
        let registry = registry();
        let mut public = Bindings::new();
        public.insert(
            "m".to_string(),
            Value::from(vec![Value::from(vec![10, 20]), Value::from(vec![30, 40])]),
        );
        let ctx = ExecutionContext::new(public);

        let expr = ExpressionParser::parse_with("m.0.1", &registry).unwrap();
        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Integer(20));

        let expr = ExpressionParser::parse_with("m.1.0|double", &registry).unwrap();
        assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Integer(60));
    }

    #[test]
    fn test_dangling_dot_fails() {
        let registry = registry();
        let err = ExpressionParser::parse_with("user.", &registry).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Syntax(_)));
    }

    #[test]
    fn test_parse_error_carries_template() {
        let registry = registry();
        let err = ExpressionParser::from_source("x|bogus", &registry)
            .unwrap()
            .with_template("page.html")
            .parse_expression()
            .unwrap_err();
        assert_eq!(err.template.as_deref(), Some("page.html"));
    }
}
