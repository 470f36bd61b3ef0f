// Filter registry and invocation

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, LazyLock};

use super::builtins;
use super::value::{Bindings, Value};
use crate::error::{Error, ErrorKind, Result};

const SENDER: &str = "registry";

/// A filter: `(input, parameter, bound variables) -> output`.
///
/// The parameter is `Value::Nil` when the template supplied none.
pub type FilterFunction = Arc<dyn Fn(&Value, &Value, &Bindings) -> Result<Value> + Send + Sync>;

static FILTERS: LazyLock<FilterRegistry> = LazyLock::new(FilterRegistry::with_builtins);

/// Named filter functions, safe to read and write from any number of threads
pub struct FilterRegistry {
    filters: DashMap<String, FilterFunction>,
}

impl FilterRegistry {
    /// An empty registry, without the built-in filters
    pub fn new() -> Self {
        Self {
            filters: DashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::new();
        builtins::register_all(&registry);
        registry
    }

    /// The process-wide registry, seeded with the built-in filters on first use
    pub fn global() -> &'static FilterRegistry {
        &FILTERS
    }

    pub fn exists(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Resolve a filter. The returned handle stays valid even if the name is
    /// later replaced or overridden.
    pub fn get(&self, name: &str) -> Option<FilterFunction> {
        self.filters.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Register a new filter; fails if the name is taken
    pub fn register<F>(&self, name: &str, filter: F) -> Result<()>
    where
        F: Fn(&Value, &Value, &Bindings) -> Result<Value> + Send + Sync + 'static,
    {
        match self.filters.entry(name.to_string()) {
            Entry::Occupied(_) => Err(Error::new(
                SENDER,
                ErrorKind::DuplicateRegistration(name.to_string()),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(filter));
                tracing::debug!(filter = name, "registered filter");
                Ok(())
            }
        }
    }

    /// Swap the implementation of an existing filter; fails if the name is unknown
    pub fn replace<F>(&self, name: &str, filter: F) -> Result<()>
    where
        F: Fn(&Value, &Value, &Bindings) -> Result<Value> + Send + Sync + 'static,
    {
        match self.filters.get_mut(name) {
            Some(mut slot) => {
                let filter: FilterFunction = Arc::new(filter);
                *slot = filter;
                tracing::debug!(filter = name, "replaced filter");
                Ok(())
            }
            None => Err(Error::new(
                SENDER,
                ErrorKind::MissingRegistration(name.to_string()),
            )),
        }
    }

    /// Install a filter regardless of what is registered under the name.
    ///
    /// Templates parsed earlier keep the function they bound at parse time.
    pub fn override_filter<F>(&self, name: &str, filter: F) -> Result<()>
    where
        F: Fn(&Value, &Value, &Bindings) -> Result<Value> + Send + Sync + 'static,
    {
        if self.filters.insert(name.to_string(), Arc::new(filter)).is_some() {
            tracing::warn!(filter = name, "overrode existing filter");
        } else {
            tracing::debug!(filter = name, "registered filter via override");
        }
        Ok(())
    }

    /// Look up `name` and run it against `value`
    pub fn apply(
        &self,
        name: &str,
        value: &Value,
        param: Option<&Value>,
        bind: &Bindings,
    ) -> Result<Value> {
        let filter = self.get(name).ok_or_else(|| {
            Error::new("applyfilter", ErrorKind::UnknownFilter(name.to_string()))
        })?;

        let nil = Value::nil();
        let param = param.unwrap_or(&nil);

        tracing::trace!(filter = name, "applying filter");
        filter(value, param, bind)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.filters.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// True if a filter is registered globally under `name`
pub fn filter_exists(name: &str) -> bool {
    FilterRegistry::global().exists(name)
}

/// Register a filter globally. Usually called once at start-up.
pub fn register_filter<F>(name: &str, filter: F) -> Result<()>
where
    F: Fn(&Value, &Value, &Bindings) -> Result<Value> + Send + Sync + 'static,
{
    FilterRegistry::global().register(name, filter)
}

/// Replace an already registered global filter. Changes behaviour of every
/// template parsed afterwards, so use with care.
pub fn replace_filter<F>(name: &str, filter: F) -> Result<()>
where
    F: Fn(&Value, &Value, &Bindings) -> Result<Value> + Send + Sync + 'static,
{
    FilterRegistry::global().replace(name, filter)
}

pub fn override_filter<F>(name: &str, filter: F) -> Result<()>
where
    F: Fn(&Value, &Value, &Bindings) -> Result<Value> + Send + Sync + 'static,
{
    FilterRegistry::global().override_filter(name, filter)
}

/// Apply a globally registered filter to `value`.
///
/// A missing `param` is passed to the filter as `Value::Nil`.
pub fn apply_filter(name: &str, value: &Value, param: Option<&Value>, bind: &Bindings) -> Result<Value> {
    FilterRegistry::global().apply(name, value, param, bind)
}

/// Like [`apply_filter`], but panics on error
pub fn must_apply_filter(name: &str, value: &Value, param: Option<&Value>) -> Value {
    match apply_filter(name, value, param, &Bindings::new()) {
        Ok(out) => out,
        Err(err) => panic!("{}", err),
    }
}
