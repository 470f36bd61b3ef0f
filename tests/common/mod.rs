// Common test utilities shared across test files

use filterchain::{Bindings, ExecutionContext, Value};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Install a test subscriber when RUST_LOG is set
#[allow(dead_code)]
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Build a render context from (name, value) pairs
#[allow(dead_code)]
pub fn context(vars: &[(&str, Value)]) -> ExecutionContext {
    let bindings: Bindings = vars
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect();
    ExecutionContext::new(bindings)
}
