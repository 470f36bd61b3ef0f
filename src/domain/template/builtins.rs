// Built-in filters registered with the global registry

use super::registry::FilterRegistry;
use super::value::{Bindings, Value};
use crate::error::{Error, Result};

type Builtin = fn(&Value, &Value, &Bindings) -> Result<Value>;

const BUILTINS: &[(&str, Builtin)] = &[
    ("add", add),
    ("capfirst", capfirst),
    ("cut", cut),
    ("default", default),
    ("first", first),
    ("join", join),
    ("last", last),
    ("length", length),
    ("lower", lower),
    ("title", title),
    ("trim", trim),
    ("truncatechars", truncatechars),
    ("upper", upper),
    ("urlencode", urlencode),
];

/// Register every built-in filter not already present in `registry`
pub fn register_all(registry: &FilterRegistry) {
    for (name, filter) in BUILTINS {
        if let Err(err) = registry.register(name, *filter) {
            tracing::debug!(filter = *name, error = %err, "skipping built-in filter");
        }
    }
}

fn sender(name: &str) -> String {
    format!("filter:{}", name)
}

fn upper(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(Value::from(input.to_string().to_uppercase()))
}

fn lower(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(Value::from(input.to_string().to_lowercase()))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn capfirst(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(Value::from(capitalize(&input.to_string())))
}

fn title(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    let titled: Vec<String> = input
        .to_string()
        .split(' ')
        .map(|word| capitalize(&word.to_lowercase()))
        .collect();
    Ok(Value::from(titled.join(" ")))
}

fn trim(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(Value::from(input.to_string().trim()))
}

fn urlencode(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(Value::from(urlencoding::encode(&input.to_string()).into_owned()))
}

fn length(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(Value::from(input.len().unwrap_or(0)))
}

fn default(input: &Value, param: &Value, _bind: &Bindings) -> Result<Value> {
    if input.is_true() {
        Ok(input.clone())
    } else {
        Ok(param.clone())
    }
}

fn add(input: &Value, param: &Value, _bind: &Bindings) -> Result<Value> {
    match (input, param) {
        (_, Value::Nil) => Err(Error::execution(sender("add"), "add requires a parameter")),
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(*b)
            .map(Value::Integer)
            .ok_or_else(|| Error::execution(sender("add"), "integer overflow")),
        (a, b) if a.is_number() && b.is_number() => Ok(Value::Float(
            a.as_float().unwrap_or_default() + b.as_float().unwrap_or_default(),
        )),
        (Value::List(a), Value::List(b)) => Ok(Value::List(a.iter().chain(b).cloned().collect())),
        (a, b) => Ok(Value::from(format!("{}{}", a, b))),
    }
}

fn truncatechars(input: &Value, param: &Value, _bind: &Bindings) -> Result<Value> {
    let limit = param
        .as_integer()
        .filter(|n| *n >= 0)
        .ok_or_else(|| {
            Error::execution(
                sender("truncatechars"),
                "truncatechars requires a non-negative integer parameter",
            )
        })? as usize;

    let s = input.to_string();
    if s.chars().count() <= limit {
        return Ok(Value::from(s));
    }
    if limit > 3 {
        let kept: String = s.chars().take(limit - 3).collect();
        Ok(Value::from(format!("{}...", kept)))
    } else {
        Ok(Value::from(s.chars().take(limit).collect::<String>()))
    }
}

fn join(input: &Value, param: &Value, _bind: &Bindings) -> Result<Value> {
    match input {
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
            Ok(Value::from(parts.join(&param.to_string())))
        }
        other => Ok(Value::from(other.to_string())),
    }
}

fn first(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(match input {
        Value::List(items) => items.first().cloned().unwrap_or_default(),
        Value::String(s) => s.chars().next().map(String::from).into(),
        _ => Value::Nil,
    })
}

fn last(input: &Value, _param: &Value, _bind: &Bindings) -> Result<Value> {
    Ok(match input {
        Value::List(items) => items.last().cloned().unwrap_or_default(),
        Value::String(s) => s.chars().last().map(String::from).into(),
        _ => Value::Nil,
    })
}

fn cut(input: &Value, param: &Value, _bind: &Bindings) -> Result<Value> {
    if param.is_nil() {
        return Err(Error::execution(sender("cut"), "cut requires a parameter"));
    }
    Ok(Value::from(input.to_string().replace(&param.to_string(), "")))
}
