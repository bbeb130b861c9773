#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use fontlab_bind::{BindingConfig, Bindings, ControlKind, MemoryInput, MemoryOutput, Value};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Raw {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<Raw> for Value {
    fn from(raw: Raw) -> Self {
        match raw {
            Raw::Bool(b) => Value::Bool(b),
            Raw::Int(i) => Value::Int(i),
            Raw::Float(x) => Value::Float(x),
            Raw::Text(s) => Value::Text(s),
        }
    }
}

#[derive(Arbitrary, Debug)]
enum Op {
    Set(Raw),
    UserEdit(Raw),
}

fuzz_target!(|ops: Vec<Op>| {
    let store = Bindings::new();
    let binding = store
        .configure(
            "size",
            BindingConfig::new().parser("float").formatter("fixed:2"),
        )
        .unwrap();
    let slider = MemoryInput::new(ControlKind::Range, 0.0);
    let tip = MemoryOutput::new();
    store.bind_input("size", slider.clone());
    store.bind_output("size", tip.clone());

    let hits = Rc::new(Cell::new(0usize));
    let h = Rc::clone(&hits);
    binding.add_listener(move |_, _, _| h.set(h.get() + 1));

    for op in ops {
        let before = hits.get();
        let changed = match op {
            Op::Set(raw) => store.set_value("size", Value::from(raw)),
            Op::UserEdit(raw) => {
                let previous = store.value("size");
                slider.user_edit(Value::from(raw));
                previous != store.value("size")
            }
        };
        // Exactly one notification per accepted change.
        assert_eq!(hits.get() - before, usize::from(changed));
        // The float parser never stores NaN.
        assert!(store.value("size").is_none_or(|v| v.as_f64().is_some_and(|x| !x.is_nan())));
    }
});
