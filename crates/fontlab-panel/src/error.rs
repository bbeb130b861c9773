#![forbid(unsafe_code)]

//! Errors from settings storage and panel configuration.

use fontlab_bind::BindError;

/// Errors from [`crate::storage`], [`crate::config`] and the editor.
#[derive(Debug)]
pub enum PanelError {
    /// Reading or writing a storage file failed.
    Io(std::io::Error),
    /// A stored or supplied JSON document could not be (de)serialized.
    Json(serde_json::Error),
    /// A TOML panel configuration could not be parsed.
    Config(toml::de::Error),
    /// A binding in the configuration could not be set up.
    Bind { binding: String, source: BindError },
    /// An editable sample was added twice under the same key.
    DuplicateEditable(String),
}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "settings storage I/O error: {e}"),
            Self::Json(e) => write!(f, "settings JSON error: {e}"),
            Self::Config(e) => write!(f, "panel config error: {e}"),
            Self::Bind { binding, source } => write!(f, "binding '{binding}': {source}"),
            Self::DuplicateEditable(key) => write!(f, "duplicate editable {key}"),
        }
    }
}

impl std::error::Error for PanelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Bind { source, .. } => Some(source),
            Self::DuplicateEditable(_) => None,
        }
    }
}

impl From<std::io::Error> for PanelError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<toml::de::Error> for PanelError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e)
    }
}
