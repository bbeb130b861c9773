#![forbid(unsafe_code)]

//! A named value shared between controls, display targets and listeners.
//!
//! A [`Binding`] is the single source of truth for one logical value on a
//! page (a font size, a tracking amount, a selected style). Controls
//! registered with [`Binding::add_input`] both originate and show the value;
//! targets registered with [`Binding::add_output`] only show it; listeners
//! registered with [`Binding::add_listener`] run application logic.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use fontlab_bind::{Binding, ControlKind, MemoryInput, MemoryOutput, Value, parse_float};
//!
//! let size = Binding::new("size");
//! size.set_parser(Some(Rc::new(parse_float)));
//!
//! let slider = MemoryInput::new(ControlKind::Range, "16");
//! let field = MemoryInput::new(ControlKind::Number, "");
//! let label = MemoryOutput::new();
//! size.add_input(slider.clone());
//! size.add_input(field.clone());
//! size.add_output(label.clone());
//!
//! slider.user_edit("24");
//! assert_eq!(size.value(), Some(Value::Float(24.0)));
//! assert_eq!(field.value(), Value::Float(24.0));
//! assert_eq!(label.text(), "24");
//! ```
//!
//! # Invariants
//!
//! 1. The stored value changes only in [`Binding::set_value`] /
//!    [`Binding::set_value_from`], which parse, compare, then store.
//! 2. A parsed value strictly equal to the stored one is a no-op: no writes,
//!    no notifications.
//! 3. The new value is stored before anything is notified, so re-entrant
//!    reads see it.
//! 4. All input and output writes happen before the first listener runs;
//!    listeners run in registration order.
//! 5. The originating control is never written back.
//! 6. Re-entrant `set_value` calls from a listener complete (depth-first)
//!    before the outer notification continues.
//!
//! # Failure Modes
//!
//! - Parser or listener panic: propagates to the caller of `set_value`. No
//!   borrow is held across a callback, so the binding stays usable.
//! - Binding dropped while a control still fires: the control's handler
//!   holds only weak references and does nothing.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::control::{DisplayTarget, InputControl};
use crate::parse::{Formatter, Parser};
use crate::value::Value;

/// Change callback: `(next, previous, binding)`.
pub type Listener = Rc<dyn Fn(&Value, Option<&Value>, &Binding)>;

/// Identifies an input control within one binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ControlId(u64);

struct InputSlot {
    id: ControlId,
    control: Rc<dyn InputControl>,
}

struct BindingInner {
    value: Option<Value>,
    inputs: Vec<InputSlot>,
    outputs: Vec<Rc<dyn DisplayTarget>>,
    listeners: Vec<Listener>,
    parser: Option<Parser>,
    formatter: Option<Formatter>,
    next_control_id: u64,
}

/// A named, shared, observable value.
///
/// Cloning a `Binding` yields another handle to the same value.
#[derive(Clone)]
pub struct Binding {
    name: Rc<str>,
    inner: Rc<RefCell<BindingInner>>,
}

impl Binding {
    /// Create an unset binding named `name`.
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            inner: Rc::new(RefCell::new(BindingInner {
                value: None,
                inputs: Vec::new(),
                outputs: Vec::new(),
                listeners: Vec::new(),
                parser: None,
                formatter: None,
                next_control_id: 0,
            })),
        }
    }

    /// The binding's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current value, `None` before the first value arrives.
    #[must_use]
    pub fn value(&self) -> Option<Value> {
        self.inner.borrow().value.clone()
    }

    /// The current value passed through the formatter.
    #[must_use]
    pub fn display_value(&self) -> Option<Value> {
        let inner = self.inner.borrow();
        let value = inner.value.as_ref()?;
        Some(format_with(inner.formatter.as_ref(), value))
    }

    /// Whether both handles refer to the same binding.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register a mutable control as a source and sink of this value.
    ///
    /// If the binding is still unset it adopts the control's raw value as-is
    /// (the parser is not applied and nobody is notified). Otherwise the
    /// control immediately shows the formatted current value.
    pub fn add_input(&self, control: Rc<dyn InputControl>) -> ControlId {
        let (id, current, formatter) = {
            let mut inner = self.inner.borrow_mut();
            let id = ControlId(inner.next_control_id);
            inner.next_control_id += 1;
            inner.inputs.push(InputSlot {
                id,
                control: Rc::clone(&control),
            });
            (id, inner.value.clone(), inner.formatter.clone())
        };

        match current {
            None => {
                let raw = control.raw_value();
                self.inner.borrow_mut().value = Some(raw);
            }
            Some(value) => control.set_display_value(&format_with(formatter.as_ref(), &value)),
        }

        let name = Rc::clone(&self.name);
        let binding: Weak<RefCell<BindingInner>> = Rc::downgrade(&self.inner);
        let source: Weak<dyn InputControl> = Rc::downgrade(&control);
        control.subscribe(
            control.kind().change_event(),
            Rc::new(move || {
                let (Some(inner), Some(source)) = (binding.upgrade(), source.upgrade()) else {
                    return;
                };
                let binding = Binding {
                    name: Rc::clone(&name),
                    inner,
                };
                binding.update(source.raw_value(), Some(id));
            }),
        );
        id
    }

    /// Register a read-only display target. It is written immediately when
    /// a value exists.
    pub fn add_output(&self, target: Rc<dyn DisplayTarget>) {
        let text = {
            let mut inner = self.inner.borrow_mut();
            inner.outputs.push(Rc::clone(&target));
            inner
                .value
                .as_ref()
                .map(|v| format_with(inner.formatter.as_ref(), v).to_string())
        };
        if let Some(text) = text {
            target.set_text(&text);
        }
    }

    /// Append a listener invoked as `(next, previous, binding)` after every
    /// accepted change.
    pub fn add_listener(&self, listener: impl Fn(&Value, Option<&Value>, &Binding) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    /// Install (or clear) the parser applied to every incoming value.
    pub fn set_parser(&self, parser: Option<Parser>) {
        self.inner.borrow_mut().parser = parser;
    }

    /// Install (or clear, restoring identity) the display formatter.
    pub fn set_formatter(&self, formatter: Option<Formatter>) {
        self.inner.borrow_mut().formatter = formatter;
    }

    /// Offer a new raw value. Returns whether the stored value changed.
    pub fn set_value(&self, raw: impl Into<Value>) -> bool {
        self.update(raw.into(), None)
    }

    /// Offer a new raw value coming from the control `origin`, which is
    /// excluded from the write-back. Returns whether the stored value changed.
    pub fn set_value_from(&self, raw: impl Into<Value>, origin: ControlId) -> bool {
        self.update(raw.into(), Some(origin))
    }

    /// Number of registered input controls.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inner.borrow().inputs.len()
    }

    /// Number of registered display targets.
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.inner.borrow().outputs.len()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn update(&self, raw: Value, origin: Option<ControlId>) -> bool {
        let (parser, previous) = {
            let inner = self.inner.borrow();
            (inner.parser.clone(), inner.value.clone())
        };
        let next = match parser {
            Some(parse) => parse(&raw, previous.as_ref()),
            None => raw,
        };
        if previous.as_ref() == Some(&next) {
            return false;
        }

        // Store first, then snapshot the subscribers so callbacks may add more.
        let (inputs, outputs, listeners, formatter) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = Some(next.clone());
            let inputs: Vec<Rc<dyn InputControl>> = inner
                .inputs
                .iter()
                .filter(|slot| Some(slot.id) != origin)
                .map(|slot| Rc::clone(&slot.control))
                .collect();
            (
                inputs,
                inner.outputs.clone(),
                inner.listeners.clone(),
                inner.formatter.clone(),
            )
        };
        trace!(binding = %self.name, value = %next, "binding value changed");

        let display = format_with(formatter.as_ref(), &next);
        for control in &inputs {
            control.set_display_value(&display);
        }
        if !outputs.is_empty() {
            let text = display.to_string();
            for target in &outputs {
                target.set_text(&text);
            }
        }
        for listener in &listeners {
            listener(&next, previous.as_ref(), self);
        }
        true
    }
}

fn format_with(formatter: Option<&Formatter>, value: &Value) -> Value {
    match formatter {
        Some(format) => format(value),
        None => value.clone(),
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Binding")
            .field("name", &self.name)
            .field("value", &inner.value)
            .field("inputs", &inner.inputs.len())
            .field("outputs", &inner.outputs.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlKind, MemoryInput, MemoryOutput};
    use crate::parse::{format_fixed, parse_float, parse_int};
    use std::cell::Cell;

    fn counter(binding: &Binding) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        binding.add_listener(move |_, _, _| c.set(c.get() + 1));
        count
    }

    #[test]
    fn new_binding_is_unset() {
        let b = Binding::new("size");
        assert_eq!(b.name(), "size");
        assert!(b.value().is_none());
        assert!(b.display_value().is_none());
    }

    #[test]
    fn set_value_twice_notifies_once() {
        let b = Binding::new("size");
        let count = counter(&b);

        assert!(b.set_value(12.0));
        assert!(!b.set_value(12.0));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn nan_is_never_idempotent() {
        let b = Binding::new("x");
        let count = counter(&b);
        b.set_value(f64::NAN);
        b.set_value(f64::NAN);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn listener_sees_next_previous_and_binding() {
        let b = Binding::new("tracking");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        b.add_listener(move |next, prev, binding| {
            s.borrow_mut()
                .push((next.clone(), prev.cloned(), binding.name().to_owned()));
        });

        b.set_value(1);
        b.set_value(2);
        let seen = seen.borrow();
        assert_eq!(seen[0], (Value::Int(1), None, "tracking".to_owned()));
        assert_eq!(seen[1], (Value::Int(2), Some(Value::Int(1)), "tracking".to_owned()));
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let b = Binding::new("size");
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in ["L1", "L2", "L3"] {
            let o = Rc::clone(&order);
            b.add_listener(move |_, _, _| o.borrow_mut().push(tag));
        }

        b.set_value(1);
        b.set_value(2);
        assert_eq!(*order.borrow(), ["L1", "L2", "L3", "L1", "L2", "L3"]);
    }

    #[test]
    fn reads_inside_listener_see_new_value() {
        let b = Binding::new("size");
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        b.add_listener(move |_, _, binding| *s.borrow_mut() = binding.value());

        b.set_value("9");
        assert_eq!(*seen.borrow(), Some(Value::from("9")));
    }

    #[test]
    fn origin_control_is_not_written_back() {
        let b = Binding::new("size");
        b.set_value(10.0);
        let i1 = MemoryInput::new(ControlKind::Number, "");
        let i2 = MemoryInput::new(ControlKind::Range, "");
        let id1 = b.add_input(i1.clone());
        b.add_input(i2.clone());
        let (w1, w2) = (i1.display_writes(), i2.display_writes());

        b.set_value_from(20.0, id1);
        assert_eq!(i1.display_writes(), w1);
        assert_eq!(i2.display_writes(), w2 + 1);
        assert_eq!(i2.value(), Value::Float(20.0));
    }

    #[test]
    fn user_edit_fans_out_to_other_inputs() {
        let b = Binding::new("style");
        let select = MemoryInput::new(ControlKind::Select, "regular");
        let text = MemoryInput::new(ControlKind::Text, "");
        b.add_input(select.clone());
        b.add_input(text.clone());
        assert_eq!(text.value(), Value::from("regular"));

        select.user_edit("bold");
        assert_eq!(b.value(), Some(Value::from("bold")));
        assert_eq!(text.value(), Value::from("bold"));
        assert_eq!(select.display_writes(), 0);
    }

    #[test]
    fn first_input_bootstraps_value_without_parser() {
        let b = Binding::new("size");
        b.set_parser(Some(Rc::new(parse_int)));
        let count = counter(&b);

        let input = MemoryInput::new(ControlKind::Text, "12px");
        b.add_input(input.clone());
        assert_eq!(b.value(), Some(Value::from("12px")));
        assert_eq!(count.get(), 0);
        assert_eq!(input.display_writes(), 0);

        input.user_edit("14px");
        assert_eq!(b.value(), Some(Value::Int(14)));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn later_input_shows_formatted_value() {
        let b = Binding::new("tracking");
        b.set_formatter(Some(Rc::new(|v: &Value| format_fixed(v, 3))));
        b.set_value(0.1234);

        let input = MemoryInput::new(ControlKind::Range, 0.0);
        b.add_input(input.clone());
        assert_eq!(input.value(), Value::from("0.123"));
        assert_eq!(b.value(), Some(Value::Float(0.1234)));
        assert_eq!(b.display_value(), Some(Value::from("0.123")));
    }

    #[test]
    fn output_written_on_add_and_change() {
        let b = Binding::new("size");
        let early = MemoryOutput::new();
        b.add_output(early.clone());
        assert_eq!(early.writes(), 0);

        b.set_value(16.0);
        assert_eq!(early.text(), "16");

        let late = MemoryOutput::new();
        b.add_output(late.clone());
        assert_eq!(late.text(), "16");
        assert_eq!(b.output_count(), 2);
    }

    #[test]
    fn writes_happen_before_listeners() {
        let b = Binding::new("size");
        let out = MemoryOutput::new();
        b.add_output(out.clone());
        let seen = Rc::new(RefCell::new(String::new()));
        let (s, o) = (Rc::clone(&seen), Rc::clone(&out));
        b.add_listener(move |_, _, _| *s.borrow_mut() = o.text());

        b.set_value("42");
        assert_eq!(*seen.borrow(), "42");
    }

    #[test]
    fn parser_receives_previous_value() {
        let b = Binding::new("step");
        b.set_parser(Some(Rc::new(|raw: &Value, prev: Option<&Value>| {
            let base = prev.and_then(Value::as_f64).unwrap_or(0.0);
            Value::Float(base + raw.as_f64().unwrap_or(0.0))
        })));
        b.set_value(1.0);
        b.set_value(2.5);
        assert_eq!(b.value(), Some(Value::Float(3.5)));
    }

    #[test]
    fn reentrant_set_value_runs_depth_first() {
        let b = Binding::new("size");
        b.set_parser(Some(Rc::new(parse_float)));
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        b.add_listener(move |next, _, binding| {
            l.borrow_mut().push(format!("A{next}"));
            if next.as_f64() == Some(1.0) {
                binding.set_value(2.0);
            }
        });
        let l = Rc::clone(&log);
        b.add_listener(move |next, _, _| l.borrow_mut().push(format!("B{next}")));

        b.set_value("1");
        assert_eq!(*log.borrow(), ["A1", "A2", "B2", "B1"]);
        assert_eq!(b.value(), Some(Value::Float(2.0)));
    }

    #[test]
    fn listener_added_during_notification_waits_for_next_change() {
        let b = Binding::new("size");
        let late_hits = Rc::new(Cell::new(0));
        let added = Rc::new(Cell::new(false));
        let (h, a) = (Rc::clone(&late_hits), Rc::clone(&added));
        b.add_listener(move |_, _, binding| {
            if !a.replace(true) {
                let h = Rc::clone(&h);
                binding.add_listener(move |_, _, _| h.set(h.get() + 1));
            }
        });

        b.set_value(1);
        assert_eq!(late_hits.get(), 0);
        b.set_value(2);
        assert_eq!(late_hits.get(), 1);
        assert_eq!(b.listener_count(), 2);
    }

    #[test]
    fn dropped_binding_ignores_control_events() {
        let input = MemoryInput::new(ControlKind::Text, "a");
        {
            let b = Binding::new("gone");
            b.add_input(input.clone());
            assert_eq!(b.input_count(), 1);
        }
        input.user_edit("b");
        assert_eq!(input.value(), Value::from("b"));
    }

    #[test]
    fn clones_share_state() {
        let a = Binding::new("size");
        let b = a.clone();
        a.set_value(3);
        assert_eq!(b.value(), Some(Value::Int(3)));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Binding::new("size")));
    }

    #[test]
    fn debug_format() {
        let b = Binding::new("size");
        b.add_output(MemoryOutput::new());
        let debug = format!("{b:?}");
        assert!(debug.contains("\"size\""));
        assert!(debug.contains("outputs: 1"));
    }
}
