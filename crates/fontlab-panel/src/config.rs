#![forbid(unsafe_code)]

//! Declarative panel configuration.
//!
//! A page can describe extra bindings (or override the editor's) in TOML or
//! JSON instead of code:
//!
//! ```toml
//! save_delay_ms = 250
//!
//! [[binding]]
//! name = "weight"
//! initial = 400
//! parser = "int"
//!
//! [[binding]]
//! name = "opsz"
//! parser = "float"
//! format = "fixed:1"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fontlab_bind::{BindingConfig, Bindings, ParserSpec, Value};

use crate::debounce::DEFAULT_SAVE_DELAY_MS;
use crate::error::PanelError;

/// One `[[binding]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<Value>,
    /// Parser tag. Anything other than a string is rejected when applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<Value>,
    /// Formatter tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl BindingEntry {
    fn to_config(&self) -> BindingConfig {
        let mut config = BindingConfig::new().initial_opt(self.initial.clone());
        if let Some(parser) = &self.parser {
            config = config.parser(ParserSpec::from(parser.clone()));
        }
        if let Some(format) = &self.format {
            config = config.formatter(format.as_str());
        }
        config
    }
}

/// Panel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Quiet period before settings are saved.
    pub save_delay_ms: u64,
    #[serde(rename = "binding")]
    pub bindings: Vec<BindingEntry>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            save_delay_ms: DEFAULT_SAVE_DELAY_MS,
            bindings: Vec::new(),
        }
    }
}

impl PanelConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// [`PanelError::Config`] on malformed TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, PanelError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// [`PanelError::Json`] on malformed JSON.
    pub fn from_json_str(text: &str) -> Result<Self, PanelError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a file; `.json` files are JSON, anything else TOML.
    ///
    /// # Errors
    ///
    /// I/O or parse failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PanelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    #[must_use]
    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms)
    }

    /// Configure every listed binding on `bindings`, in order.
    ///
    /// Stops at the first entry that fails; earlier entries stay applied.
    ///
    /// # Errors
    ///
    /// [`PanelError::Bind`] naming the binding whose parser or formatter tag
    /// could not be resolved.
    pub fn apply(&self, bindings: &Bindings) -> Result<(), PanelError> {
        for entry in &self.bindings {
            bindings
                .configure(&entry.name, entry.to_config())
                .map_err(|source| PanelError::Bind {
                    binding: entry.name.clone(),
                    source,
                })?;
            debug!(binding = %entry.name, "applied binding config");
        }
        Ok(())
    }
}
