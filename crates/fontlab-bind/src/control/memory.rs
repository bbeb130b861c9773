#![forbid(unsafe_code)]

//! Headless control adapters.
//!
//! [`MemoryInput`] and [`MemoryOutput`] keep their state in memory. They back
//! tests and non-browser hosts, and count every write the binding layer
//! performs so fan-out behavior can be asserted.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::{ChangeEvent, ChangeHandler, ControlKind, DisplayTarget, InputControl, Observable};
use super::{Readable, Writable};
use crate::value::Value;

/// An in-memory mutable control.
pub struct MemoryInput {
    kind: ControlKind,
    value: RefCell<Value>,
    handlers: RefCell<Vec<(ChangeEvent, ChangeHandler)>>,
    display_writes: Cell<usize>,
}

impl MemoryInput {
    /// Create a control of `kind` showing `initial`.
    pub fn new(kind: ControlKind, initial: impl Into<Value>) -> Rc<Self> {
        Rc::new(Self {
            kind,
            value: RefCell::new(initial.into()),
            handlers: RefCell::new(Vec::new()),
            display_writes: Cell::new(0),
        })
    }

    /// The value the control currently shows.
    #[must_use]
    pub fn value(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Simulate a user edit: store `value`, then fire the handlers for this
    /// control's change event.
    pub fn user_edit(&self, value: impl Into<Value>) {
        *self.value.borrow_mut() = value.into();
        let event = self.kind.change_event();
        // Snapshot so handlers may subscribe more handlers.
        let handlers: Vec<ChangeHandler> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in handlers {
            handler();
        }
    }

    /// Number of times the binding layer assigned a display value.
    #[must_use]
    pub fn display_writes(&self) -> usize {
        self.display_writes.get()
    }

    /// Number of subscribed change handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl Readable for MemoryInput {
    fn raw_value(&self) -> Value {
        self.value()
    }
}

impl Writable for MemoryInput {
    fn set_display_value(&self, value: &Value) {
        *self.value.borrow_mut() = value.clone();
        self.display_writes.set(self.display_writes.get() + 1);
    }
}

impl Observable for MemoryInput {
    fn subscribe(&self, event: ChangeEvent, handler: ChangeHandler) {
        self.handlers.borrow_mut().push((event, handler));
    }
}

impl InputControl for MemoryInput {
    fn kind(&self) -> ControlKind {
        self.kind
    }
}

impl fmt::Debug for MemoryInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryInput")
            .field("kind", &self.kind)
            .field("value", &*self.value.borrow())
            .field("handlers", &self.handlers.borrow().len())
            .finish()
    }
}

/// An in-memory display target.
#[derive(Debug, Default)]
pub struct MemoryOutput {
    text: RefCell<String>,
    writes: Cell<usize>,
}

impl MemoryOutput {
    /// Create an empty display target.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// The text currently shown.
    #[must_use]
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Number of writes received.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl DisplayTarget for MemoryOutput {
    fn set_text(&self, text: &str) {
        *self.text.borrow_mut() = text.to_owned();
        self.writes.set(self.writes.get() + 1);
    }
}
