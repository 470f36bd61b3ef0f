use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::domain::template::{Bindings, FilterFunction, FilterRegistry, Value};
use crate::error::{Error, ErrorKind};

/// Render configuration loaded from a YAML (or JSON) file
#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct RenderSettings {
    /// Template name used when reporting errors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Variables bound for the render and passed through to filters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<FilterAlias>,
}

/// An extra name for an existing filter
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct FilterAlias {
    pub alias: String,
    pub filter: String,
}

impl RenderSettings {
    pub fn from_yaml_str(yml: &str) -> Result<Self> {
        serde_yaml::from_str(yml).context("Invalid yaml configuration")
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid json configuration")
    }

    /// Load settings from `path`; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let settings = if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        tracing::debug!(
            path = %path.display(),
            variables = settings.variables.len(),
            aliases = settings.aliases.len(),
            "loaded render settings"
        );
        Ok(settings)
    }

    pub fn bindings(&self) -> Bindings {
        self.variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Register every alias with `registry`.
    ///
    /// The target filter is resolved now, so an alias keeps pointing at the
    /// implementation that was registered when the settings were applied.
    /// An alias may target another alias listed before it. Every alias is
    /// checked before the first one is registered, so a bad entry leaves the
    /// registry untouched.
    pub fn register_aliases(&self, registry: &FilterRegistry) -> crate::error::Result<()> {
        let mut resolved: Vec<(&str, FilterFunction)> = Vec::with_capacity(self.aliases.len());
        let mut pending: HashMap<&str, FilterFunction> = HashMap::new();

        for alias in &self.aliases {
            if registry.exists(&alias.alias) || pending.contains_key(alias.alias.as_str()) {
                return Err(Error::new(
                    "config",
                    ErrorKind::DuplicateRegistration(alias.alias.clone()),
                ));
            }
            let target = pending
                .get(alias.filter.as_str())
                .cloned()
                .or_else(|| registry.get(&alias.filter))
                .ok_or_else(|| Error::new("config", ErrorKind::UnknownFilter(alias.filter.clone())))?;
            pending.insert(alias.alias.as_str(), target.clone());
            resolved.push((alias.alias.as_str(), target));
        }

        for (name, target) in resolved {
            registry.register(name, move |value, param, bind| target(value, param, bind))?;
            tracing::debug!(alias = name, "registered filter alias");
        }
        Ok(())
    }
}
