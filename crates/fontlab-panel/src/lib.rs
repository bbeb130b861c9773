#![forbid(unsafe_code)]

//! Sample settings panel for the fontlab pages.
//!
//! A lab page shows editable text samples and one floating panel with size,
//! tracking, line-height and style controls. [`ContextEditor`] binds those
//! controls through [`fontlab_bind::Bindings`], follows focus between
//! samples and persists each sample's settings through a
//! [`SettingsStorage`].
//!
//! # Example
//!
//! ```
//! use fontlab_bind::{ControlKind, DeclaredElement, MemoryInput, Value};
//! use fontlab_panel::{ContextEditor, MemoryStorage, SampleValues};
//!
//! let editor = ContextEditor::new("/lab", MemoryStorage::new()).unwrap();
//! let size = MemoryInput::new(ControlKind::Range, 0.0);
//! editor.bind_controls([DeclaredElement::control("size", size.clone())]);
//! editor.add_editable("intro", SampleValues::default()).unwrap();
//!
//! editor.focus("intro").unwrap();
//! assert_eq!(size.value(), Value::Float(16.0));
//!
//! size.user_edit(24.0);
//! editor.flush().unwrap();
//! assert!(editor.storage().contains("ctxedit:/lab:intro"));
//! ```

pub mod config;
pub mod debounce;
pub mod editable;
pub mod editor;
pub mod error;
pub mod metrics;
pub mod storage;

pub use config::{BindingEntry, PanelConfig};
pub use debounce::{DEFAULT_SAVE_DELAY_MS, SaveDebouncer};
pub use editable::{Editable, Prop, SampleValues};
pub use editor::ContextEditor;
pub use error::PanelError;
pub use metrics::{dynamic_line_height, dynamic_tracking};
pub use storage::{
    FileStorage, MemoryStorage, SettingsStorage, load_object, remove_object, store_object,
};
