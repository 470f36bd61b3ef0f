// Render-time state handed to evaluators and filter calls

use super::value::{Bindings, Value};

/// Per-render execution state.
///
/// `public` is what filters get to see; `private` holds engine-internal
/// variables and shadows `public` during variable resolution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub template: Option<String>,
    pub public: Bindings,
    pub private: Bindings,
}

impl ExecutionContext {
    pub fn new(public: Bindings) -> Self {
        Self {
            template: None,
            public,
            private: Bindings::new(),
        }
    }

    pub fn with_template(mut self, name: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self
    }

    pub fn with_private(mut self, private: Bindings) -> Self {
        self.private = private;
        self
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.private.get(name).or_else(|| self.public.get(name))
    }
}
