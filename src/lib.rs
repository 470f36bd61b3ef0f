//! Filter pipeline for a text-templating engine.
//!
//! Filters are named value transformations kept in a process-wide
//! [`FilterRegistry`]. Template expressions such as `name|upper|truncatechars:5`
//! are parsed into a [`FilterChain`] whose functions are bound at parse time,
//! then executed left to right at render time.
//!
//! ```
//! use filterchain::{Bindings, Evaluator, ExecutionContext, ExpressionParser, Value};
//!
//! let expr = ExpressionParser::parse("name|upper|truncatechars:5").unwrap();
//!
//! let mut vars = Bindings::new();
//! vars.insert("name".to_string(), Value::from("filterchain"));
//! let out = expr.evaluate(&ExecutionContext::new(vars)).unwrap();
//! assert_eq!(out, Value::from("FI..."));
//! ```

pub mod config;
pub mod domain;
pub mod error;

pub use domain::template::{
    apply_filter, filter_exists, must_apply_filter, override_filter, register_filter,
    replace_filter, Bindings, Evaluator, ExecutionContext, ExpressionParser, FilterCall,
    FilterChain, FilterFunction, FilterRegistry, Value,
};
pub use error::{Error, ErrorKind, Result};
