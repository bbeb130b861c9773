#![forbid(unsafe_code)]

//! Integration tests: observable contract of bindings as seen by a lab page.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use fontlab_bind::{
    Binding, BindingConfig, Bindings, ControlKind, DeclaredElement, MemoryInput, MemoryOutput,
    Value,
};
use proptest::prelude::*;

type Calls = Rc<RefCell<Vec<(Value, Option<Value>, String)>>>;

fn recorder() -> (Calls, impl Fn(&Value, Option<&Value>, &Binding) + 'static) {
    let calls: Calls = Rc::default();
    let c = Rc::clone(&calls);
    let listener = move |next: &Value, prev: Option<&Value>, b: &Binding| {
        c.borrow_mut()
            .push((next.clone(), prev.cloned(), b.name().to_owned()));
    };
    (calls, listener)
}

// ============================================================================
// End-to-end
// ============================================================================

#[test]
fn tracking_scenario() {
    let store = Bindings::new();
    let (calls, listener) = recorder();
    store
        .configure(
            "tracking",
            BindingConfig::new().initial(0).parser("float").listener(listener),
        )
        .unwrap();
    calls.borrow_mut().clear();

    store.set_value("tracking", "0.125");
    assert!(matches!(store.value("tracking"), Some(Value::Float(x)) if x == 0.125));
    assert_eq!(
        calls.borrow().last().cloned(),
        Some((Value::Float(0.125), Some(Value::Int(0)), "tracking".into()))
    );

    store.set_value("tracking", "abc");
    assert_eq!(store.value("tracking"), Some(Value::Float(0.0)));
    assert_eq!(
        calls.borrow().last().cloned(),
        Some((Value::Float(0.0), Some(Value::Float(0.125)), "tracking".into()))
    );
    assert_eq!(calls.borrow().len(), 2);
}

#[test]
fn slider_number_field_and_label_stay_in_sync() {
    let store = Bindings::new();
    store
        .configure(
            "tracking",
            BindingConfig::new()
                .initial(0.0)
                .parser("float")
                .formatter("fixed:3"),
        )
        .unwrap();

    let slider = MemoryInput::new(ControlKind::Range, 0.0);
    let field = MemoryInput::new(ControlKind::Number, "");
    let tip = MemoryOutput::new();
    store.bind_all([
        DeclaredElement::control("tracking", slider.clone()),
        DeclaredElement::control("tracking", field.clone()),
        DeclaredElement::display("tracking", tip.clone()),
    ]);
    assert_eq!(field.value(), Value::from("0.000"));
    assert_eq!(tip.text(), "0.000");

    let slider_writes = slider.display_writes();
    slider.user_edit(0.0456);
    assert_eq!(store.value("tracking"), Some(Value::Float(0.0456)));
    assert_eq!(field.value(), Value::from("0.046"));
    assert_eq!(tip.text(), "0.046");
    assert_eq!(slider.display_writes(), slider_writes);

    // Typing into the field parses the formatted text back.
    field.user_edit("0.02");
    assert_eq!(store.value("tracking"), Some(Value::Float(0.02)));
    assert_eq!(slider.value(), Value::from("0.020"));
}

#[test]
fn checkbox_change_propagates() {
    let store = Bindings::new();
    let a = MemoryInput::new(ControlKind::Checkbox, false);
    let b = MemoryInput::new(ControlKind::Checkbox, true);
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    store.add_listener("italic", move |_, _, _| h.set(h.get() + 1));

    store.bind_input("italic", a.clone());
    store.bind_input("italic", b.clone());
    assert_eq!(b.value(), Value::Bool(false));

    a.user_edit(true);
    assert_eq!(store.value("italic"), Some(Value::Bool(true)));
    assert_eq!(b.value(), Value::Bool(true));
    assert_eq!(hits.get(), 1);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn listener_order_is_registration_order() {
    let store = Bindings::new();
    let order = Rc::new(RefCell::new(String::new()));
    for tag in ['1', '2', '3'] {
        let o = Rc::clone(&order);
        store.add_listener("size", move |_, _, _| o.borrow_mut().push(tag));
    }
    for v in 0..4 {
        store.set_value("size", v);
    }
    assert_eq!(*order.borrow(), "123".repeat(4));
}

proptest! {
    #[test]
    fn setting_same_value_twice_notifies_once(s in "[a-z0-9.]{0,6}") {
        let store = Bindings::new();
        let b = store.configure("x", BindingConfig::new().parser("float")).unwrap();
        let hits = Rc::new(Cell::new(0usize));
        let h = Rc::clone(&hits);
        b.add_listener(move |_, _, _| h.set(h.get() + 1));

        store.set_value("x", s.as_str());
        store.set_value("x", s.as_str());
        prop_assert_eq!(hits.get(), 1);
    }

    #[test]
    fn snapshot_restore_is_silent(values in proptest::collection::btree_map("[a-d]", -50i64..50, 0..4)) {
        let store = Bindings::new();
        for (name, v) in &values {
            store.set_value(name, *v);
        }
        let hits = Rc::new(Cell::new(0usize));
        for b in store.all() {
            let h = Rc::clone(&hits);
            b.add_listener(move |_, _, _| h.set(h.get() + 1));
        }
        let skipped = store.set_values(store.values());
        prop_assert!(skipped.is_empty());
        prop_assert_eq!(hits.get(), 0);
        prop_assert_eq!(store.values().len(), values.len());
    }

    #[test]
    fn int_parser_is_deterministic(n in -10_000i64..10_000, junk in "[p-w]{0,3}") {
        let store = Bindings::new();
        store.configure("n", BindingConfig::new().parser("int")).unwrap();
        store.set_value("n", format!("{n}{junk}"));
        prop_assert!(matches!(store.value("n"), Some(Value::Int(v)) if v == n));
    }
}
