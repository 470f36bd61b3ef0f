pub mod settings;

pub use settings::{FilterAlias, RenderSettings};
