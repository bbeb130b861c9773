#![forbid(unsafe_code)]

//! Named value bindings for the font lab pages.
//!
//! A lab page wires sliders, number fields and selects to shared named
//! values ("size", "tracking", "lineHeight", "style"). This crate provides
//! that wiring:
//!
//! - [`Binding`]: one named value with parser, formatter, inputs, outputs
//!   and listeners.
//! - [`Bindings`]: the store that owns one `Binding` per name, with bulk
//!   wiring, bulk get/set and [`Bindings::configure`].
//! - [`ParserRegistry`]: named parsers (`"float"`, `"int"`) and formatters
//!   (`"fixed:N"`, `"round"`).
//! - [`control`]: the capability traits a host toolkit implements, plus
//!   in-memory adapters.
//!
//! # Architecture
//!
//! Everything is single-threaded and synchronous. Bindings use
//! `Rc<RefCell<..>>`; controls hold only weak references back to the
//! binding they feed. No borrow is held across a callback, so listeners can
//! re-enter the store freely.
//!
//! # Example
//!
//! ```
//! use fontlab_bind::{BindingConfig, Bindings, ControlKind, DeclaredElement, MemoryInput, Value};
//!
//! let bindings = Bindings::new();
//! bindings
//!     .configure("size", BindingConfig::new().initial(16.0).parser("float"))
//!     .unwrap();
//!
//! let slider = MemoryInput::new(ControlKind::Range, 0.0);
//! bindings.bind_all([DeclaredElement::control("size", slider.clone())]);
//! assert_eq!(slider.value(), Value::Float(16.0));
//!
//! slider.user_edit("24");
//! assert_eq!(bindings.value("size"), Some(Value::Float(24.0)));
//! ```

pub mod binding;
pub mod control;
pub mod error;
pub mod parse;
pub mod store;
pub mod value;

pub use binding::{Binding, ControlId, Listener};
pub use control::{
    ChangeEvent, ChangeHandler, ControlKind, DeclaredElement, DisplayTarget, ElementRole,
    ElementSource, InputControl, MemoryInput, MemoryOutput, Observable, Readable, Writable,
};
pub use error::BindError;
pub use parse::{
    Formatter, FormatterSpec, Parser, ParserRegistry, ParserSpec, format_fixed, format_round,
    parse_float, parse_int,
};
pub use store::{BindingConfig, Bindings};
pub use value::Value;
