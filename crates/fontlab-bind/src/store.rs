#![forbid(unsafe_code)]

//! The binding store: one [`Binding`] per name, plus wiring conveniences.
//!
//! [`Bindings`] is an explicitly constructed value owned by whatever composes
//! a page or panel; there is no global instance. Handles are cheap to clone
//! and share the same map, so listeners may capture a store handle and set
//! other bindings.
//!
//! # Invariants
//!
//! 1. Exactly one `Binding` exists per distinct name for the store's
//!    lifetime.
//! 2. No internal borrow is held while a binding notifies, so listeners may
//!    call back into the store.
//! 3. [`Bindings::configure`] validates before it mutates: a bad parser or
//!    formatter spec leaves the binding untouched.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown parser tag | typo in `configure` | `BindError::UnknownParser` |
//! | Parser of wrong type | non-text value in config | `BindError::InvalidParserType` |
//! | Unknown formatter tag | typo in `configure` | `BindError::UnknownFormatter` |
//! | Unknown key in `set_values` | stale snapshot | `warn!`, key skipped and returned |

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::binding::{Binding, ControlId, Listener};
use crate::control::{DeclaredElement, DisplayTarget, ElementRole, ElementSource, InputControl};
use crate::error::BindError;
use crate::parse::{Formatter, FormatterSpec, Parser, ParserRegistry, ParserSpec};
use crate::value::Value;

/// Setup for one binding, applied by [`Bindings::configure`].
///
/// ```
/// use fontlab_bind::{BindingConfig, Bindings, Value};
///
/// let bindings = Bindings::new();
/// bindings
///     .configure(
///         "tracking",
///         BindingConfig::new().initial(0.0).parser("float").formatter("fixed:3"),
///     )
///     .unwrap();
/// bindings.set_value("tracking", "0.125");
/// assert_eq!(bindings.value("tracking"), Some(Value::Float(0.125)));
/// ```
#[derive(Clone, Default)]
pub struct BindingConfig {
    initial: Option<Value>,
    parser: ParserSpec,
    formatter: FormatterSpec,
    listener: Option<Listener>,
}

impl BindingConfig {
    /// An empty config (changes nothing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push this value into the binding.
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    /// Push this value if present.
    #[must_use]
    pub fn initial_opt(mut self, value: Option<Value>) -> Self {
        self.initial = value;
        self
    }

    /// Install a parser (tag, function, or raw spec).
    #[must_use]
    pub fn parser(mut self, spec: impl Into<ParserSpec>) -> Self {
        self.parser = spec.into();
        self
    }

    /// Install a custom parser function.
    #[must_use]
    pub fn parse_with(mut self, f: impl Fn(&Value, Option<&Value>) -> Value + 'static) -> Self {
        self.parser = ParserSpec::custom(f);
        self
    }

    /// Install a formatter (tag or function).
    #[must_use]
    pub fn formatter(mut self, spec: impl Into<FormatterSpec>) -> Self {
        self.formatter = spec.into();
        self
    }

    /// Install a custom formatter function.
    #[must_use]
    pub fn format_with(mut self, f: impl Fn(&Value) -> Value + 'static) -> Self {
        self.formatter = FormatterSpec::custom(f);
        self
    }

    /// Register a change listener.
    #[must_use]
    pub fn listener(mut self, f: impl Fn(&Value, Option<&Value>, &Binding) + 'static) -> Self {
        self.listener = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for BindingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingConfig")
            .field("initial", &self.initial)
            .field("parser", &self.parser)
            .field("formatter", &self.formatter)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Name -> [`Binding`] store.
#[derive(Clone, Default)]
pub struct Bindings {
    bindings: Rc<RefCell<BTreeMap<String, Binding>>>,
    registry: Rc<RefCell<ParserRegistry>>,
}

impl Bindings {
    /// An empty store with the built-in parser and formatter tags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store resolving tags through `registry`.
    #[must_use]
    pub fn with_registry(registry: ParserRegistry) -> Self {
        Self {
            bindings: Rc::default(),
            registry: Rc::new(RefCell::new(registry)),
        }
    }

    /// The binding named `name`, created on first reference.
    pub fn get_or_create(&self, name: &str) -> Binding {
        if let Some(binding) = self.bindings.borrow().get(name) {
            return binding.clone();
        }
        debug!(binding = name, "creating binding");
        let binding = Binding::new(name);
        self.bindings
            .borrow_mut()
            .insert(name.to_owned(), binding.clone());
        binding
    }

    /// The binding named `name`, if it exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Binding> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Whether a binding named `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Every binding, ordered by name.
    #[must_use]
    pub fn all(&self) -> Vec<Binding> {
        self.bindings.borrow().values().cloned().collect()
    }

    /// Number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.borrow().len()
    }

    /// Whether the store has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.borrow().is_empty()
    }

    /// Bind a mutable control to `name`.
    pub fn bind_input(&self, name: &str, control: Rc<dyn InputControl>) -> ControlId {
        self.get_or_create(name).add_input(control)
    }

    /// Bind a display target to `name`.
    pub fn bind_output(&self, name: &str, target: Rc<dyn DisplayTarget>) {
        self.get_or_create(name).add_output(target);
    }

    /// Bind every element that declares a binding name: controls as inputs,
    /// everything else as outputs. Returns how many elements were bound.
    pub fn bind_all(&self, elements: impl IntoIterator<Item = DeclaredElement>) -> usize {
        let mut bound = 0;
        for element in elements {
            let Some(name) = element.binding.filter(|n| !n.is_empty()) else {
                continue;
            };
            match element.role {
                ElementRole::Control(control) => {
                    self.bind_input(&name, control);
                }
                ElementRole::Display(target) => self.bind_output(&name, target),
            }
            bound += 1;
        }
        bound
    }

    /// Resolve `selector` through `source`, then [`bind_all`](Self::bind_all).
    pub fn bind_all_matching(&self, source: &dyn ElementSource, selector: &str) -> usize {
        self.bind_all(source.query(selector))
    }

    /// Add a change listener to `name`.
    pub fn add_listener(
        &self,
        name: &str,
        listener: impl Fn(&Value, Option<&Value>, &Binding) + 'static,
    ) {
        self.get_or_create(name).add_listener(listener);
    }

    /// Set `name` directly, bypassing any control. Returns whether it changed.
    pub fn set_value(&self, name: &str, value: impl Into<Value>) -> bool {
        self.get_or_create(name).set_value(value)
    }

    /// Current value of `name`; `None` when missing or unset.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.get(name)?.value()
    }

    /// Current value of `name`, or `fallback` when missing or unset.
    #[must_use]
    pub fn value_or(&self, name: &str, fallback: impl Into<Value>) -> Value {
        self.value(name).unwrap_or_else(|| fallback.into())
    }

    /// Replace (or clear) the formatter of `name`.
    pub fn set_formatter(&self, name: &str, formatter: Option<Formatter>) {
        self.get_or_create(name).set_formatter(formatter);
    }

    /// Register a parser tag usable by [`configure`](Self::configure).
    pub fn register_parser(&self, tag: impl Into<String>, parser: Parser) {
        self.registry.borrow_mut().register_parser(tag, parser);
    }

    /// Register a formatter tag usable by [`configure`](Self::configure).
    pub fn register_formatter(&self, tag: impl Into<String>, formatter: Formatter) {
        self.registry.borrow_mut().register_formatter(tag, formatter);
    }

    /// Set up `name`: register the listener, push the initial value, then
    /// install parser and formatter.
    ///
    /// The initial value is pushed before the parser is installed, so it is
    /// stored as given.
    ///
    /// # Errors
    ///
    /// [`BindError`] when the parser or formatter spec cannot be resolved.
    /// Nothing is applied in that case.
    pub fn configure(&self, name: &str, config: BindingConfig) -> Result<Binding, BindError> {
        let (parser, formatter) = {
            let registry = self.registry.borrow();
            (
                registry.resolve_parser(&config.parser)?,
                registry.resolve_formatter(&config.formatter)?,
            )
        };

        let binding = self.get_or_create(name);
        if let Some(listener) = config.listener {
            binding.add_listener(move |next, prev, b| listener(next, prev, b));
        }
        if let Some(initial) = config.initial {
            binding.set_value(initial);
        }
        if parser.is_some() {
            binding.set_parser(parser);
        }
        if formatter.is_some() {
            binding.set_formatter(formatter);
        }
        Ok(binding)
    }

    /// Snapshot of every binding that has a value.
    #[must_use]
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.all()
            .into_iter()
            .filter_map(|b| Some((b.name().to_owned(), b.value()?)))
            .collect()
    }

    /// Set every known binding from `values`. Unknown names are skipped with
    /// a warning and returned.
    pub fn set_values<K, V>(&self, values: impl IntoIterator<Item = (K, V)>) -> Vec<String>
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut skipped = Vec::new();
        for (name, value) in values {
            let name = name.as_ref();
            match self.get(name) {
                Some(binding) => {
                    binding.set_value(value);
                }
                None => {
                    warn!(binding = name, "set_values: ignoring unknown binding");
                    skipped.push(name.to_owned());
                }
            }
        }
        skipped
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("bindings", &self.bindings.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
