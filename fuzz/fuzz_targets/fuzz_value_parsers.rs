#![no_main]

use fontlab_bind::parse::{float_prefix, int_prefix};
use fontlab_bind::{ParserRegistry, Value, format_fixed, parse_float, parse_int};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (String, u8)| {
    let (text, digits) = input;
    let raw = Value::Text(text.clone());

    // Parsers never yield NaN.
    let float = parse_float(&raw, None);
    assert!(float.as_f64().is_some_and(|x| !x.is_nan()));
    let _ = parse_int(&raw, None);

    let prefix = float_prefix(&text);
    if !prefix.is_nan() {
        assert_eq!(float, Value::Float(prefix));
    }
    if let Some(n) = int_prefix(&text) {
        assert_eq!(parse_int(&raw, None), Value::Int(n));
    }

    let registry = ParserRegistry::new();
    if let Some(fixed) = registry.formatter(&format!("fixed:{digits}")) {
        let _ = fixed(&float);
    }
    let _ = format_fixed(&float, usize::from(digits % 20));
});
