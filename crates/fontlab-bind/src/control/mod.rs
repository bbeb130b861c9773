#![forbid(unsafe_code)]

//! Capability traits for the controls a binding talks to.
//!
//! The binding core never sees concrete widgets. A host toolkit provides
//! adapters that implement these traits:
//!
//! - [`Readable`]: read the control's current raw value.
//! - [`Writable`]: assign a display value (without emitting a change event).
//! - [`Observable`]: subscribe to "the user changed this" notifications.
//! - [`DisplayTarget`]: a read-only text sink (labels, value tips).
//!
//! [`ControlKind`] tells the adapter which native event maps to a change
//! ([`ChangeEvent`]). Coercing native values (e.g. a slider's numeric value)
//! is the adapter's job, not the core's.
//!
//! Declarative wiring uses [`DeclaredElement`]: an element's optional
//! binding name plus whether it is a mutable control or a display target.

pub mod memory;

use std::fmt;
use std::rc::Rc;

use crate::value::Value;

pub use memory::{MemoryInput, MemoryOutput};

/// Callback an [`Observable`] control invokes when the user changes it.
pub type ChangeHandler = Rc<dyn Fn()>;

/// Which user notification signals a new value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// Fired continuously while the user edits (typing, dragging).
    Input,
    /// Fired once a selection or toggle is committed.
    Change,
}

/// The kind of mutable control, decided by the adapter at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Text,
    TextArea,
    Number,
    Range,
    Select,
    Checkbox,
}

impl ControlKind {
    /// The event a binding subscribes to for this kind of control.
    #[must_use]
    pub const fn change_event(self) -> ChangeEvent {
        match self {
            Self::Text | Self::TextArea | Self::Number | Self::Range => ChangeEvent::Input,
            Self::Select | Self::Checkbox => ChangeEvent::Change,
        }
    }
}

/// A control whose current raw value can be read.
pub trait Readable {
    /// The control's current raw value.
    fn raw_value(&self) -> Value;
}

/// A control that can be assigned a display value.
pub trait Writable {
    /// Show `value`. Implementations must not report this as a user change.
    fn set_display_value(&self, value: &Value);
}

/// A control that reports user changes.
pub trait Observable {
    /// Invoke `handler` whenever `event` fires on this control.
    fn subscribe(&self, event: ChangeEvent, handler: ChangeHandler);
}

/// A mutable control: both a source and a sink of a bound value.
pub trait InputControl: Readable + Writable + Observable {
    /// What kind of control this is.
    fn kind(&self) -> ControlKind;
}

/// A read-only sink that shows formatted text.
pub trait DisplayTarget {
    /// Show `text`.
    fn set_text(&self, text: &str);
}

/// How an element participates in a binding.
#[derive(Clone)]
pub enum ElementRole {
    /// A text / number / range / select / textarea / checkbox control.
    Control(Rc<dyn InputControl>),
    /// A plain display element.
    Display(Rc<dyn DisplayTarget>),
}

impl fmt::Debug for ElementRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control(control) => f.debug_tuple("Control").field(&control.kind()).finish(),
            Self::Display(_) => f.write_str("Display"),
        }
    }
}

/// An element with its declared binding name (e.g. a `data-binding`
/// attribute). Elements without a name are skipped by
/// [`Bindings::bind_all`](crate::Bindings::bind_all).
#[derive(Clone, Debug)]
pub struct DeclaredElement {
    /// Declared binding name, if any.
    pub binding: Option<String>,
    /// Control or display target.
    pub role: ElementRole,
}

impl DeclaredElement {
    /// A mutable control declared for `binding`.
    pub fn control(binding: impl Into<String>, control: Rc<dyn InputControl>) -> Self {
        Self {
            binding: Some(binding.into()),
            role: ElementRole::Control(control),
        }
    }

    /// A display target declared for `binding`.
    pub fn display(binding: impl Into<String>, target: Rc<dyn DisplayTarget>) -> Self {
        Self {
            binding: Some(binding.into()),
            role: ElementRole::Display(target),
        }
    }

    /// An element with no declared binding.
    #[must_use]
    pub fn unbound(role: ElementRole) -> Self {
        Self {
            binding: None,
            role,
        }
    }
}

/// Resolves a selector to declared elements (a DOM query in the browser).
pub trait ElementSource {
    /// Elements matching `selector`, in document order.
    fn query(&self, selector: &str) -> Vec<DeclaredElement>;
}
