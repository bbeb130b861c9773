#![forbid(unsafe_code)]

//! Context editor: one control panel shared by every editable sample on a
//! page.
//!
//! The panel's controls are bound to four bindings (`size`, `tracking`,
//! `lineHeight`, `style`). Focusing a sample pushes its values into the
//! bindings; user edits flow back into the focused sample and are saved
//! after a quiet period.
//!
//! # Internal changes
//!
//! The editor itself writes to the bindings (on focus, reset and when
//! implicit tracking follows the size). Those writes happen with the
//! *changing internally* flag raised, and the editor's listeners ignore
//! them; only user edits mark a sample dirty.
//!
//! # Tracking
//!
//! While a sample's tracking is implicit, a size edit pushes the recomputed
//! tracking into the `tracking` binding. A user edit of tracking makes it
//! explicit; [`ContextEditor::reset_tracking`] makes it implicit again.

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;
use web_time::Instant;

use fontlab_bind::{
    Binding, BindingConfig, Bindings, DeclaredElement, ElementSource, Value,
};

use crate::config::PanelConfig;
use crate::debounce::SaveDebouncer;
use crate::editable::{Editable, Prop, SampleValues};
use crate::error::PanelError;
use crate::storage::SettingsStorage;

const KEY_PREFIX: &str = "ctxedit:";

struct EditorState<S> {
    storage: S,
    editables: BTreeMap<String, Editable>,
    current: Option<String>,
    debouncer: SaveDebouncer,
    changing_internally: bool,
    tracking: Option<Binding>,
}

impl<S> EditorState<S> {
    fn current_mut(&mut self) -> Option<&mut Editable> {
        let key = self.current.as_ref()?;
        self.editables.get_mut(key)
    }

    fn current(&self) -> Option<&Editable> {
        let key = self.current.as_ref()?;
        self.editables.get(key)
    }
}

/// Run `f` with the changing-internally flag raised.
fn with_internal_changes<S, R>(state: &RefCell<EditorState<S>>, f: impl FnOnce() -> R) -> R {
    let previous = std::mem::replace(&mut state.borrow_mut().changing_internally, true);
    let out = f();
    state.borrow_mut().changing_internally = previous;
    out
}

/// Shared listener body for the editor's bindings.
fn on_binding_changed<S>(state: &Rc<RefCell<EditorState<S>>>, prop: Prop, next: &Value) {
    let follow_up = {
        let mut guard = state.borrow_mut();
        let st = &mut *guard;
        if st.changing_internally {
            return;
        }
        let Some(ed) = st.current_mut() else {
            return;
        };
        if prop == Prop::Tracking && !ed.explicit_tracking() {
            debug!(key = ed.key(), "tracking became explicit");
            ed.set_explicit_tracking(true);
        }
        ed.set_value(prop, next);
        let implicit_tracking =
            (prop == Prop::Size && !ed.explicit_tracking()).then(|| ed.values().tracking);
        st.debouncer.schedule(Instant::now());
        implicit_tracking.zip(st.tracking.clone())
    };
    if let Some((tracking, binding)) = follow_up {
        with_internal_changes(state, || binding.set_value(tracking));
    }
}

/// The sample settings panel of a lab page.
pub struct ContextEditor<S: SettingsStorage + 'static> {
    bindings: Bindings,
    key_prefix: String,
    state: Rc<RefCell<EditorState<S>>>,
}

impl<S: SettingsStorage + 'static> ContextEditor<S> {
    /// Editor for the page at `page` (its path), saving into `storage`.
    ///
    /// # Errors
    ///
    /// Never with the built-in bindings; see [`ContextEditor::with_config`].
    pub fn new(page: &str, storage: S) -> Result<Self, PanelError> {
        Self::with_config(page, storage, &PanelConfig::default())
    }

    /// Editor with a save delay and extra bindings from `config`.
    ///
    /// # Errors
    ///
    /// [`PanelError::Bind`] when a configured binding names an unknown
    /// parser or formatter.
    pub fn with_config(page: &str, storage: S, config: &PanelConfig) -> Result<Self, PanelError> {
        let state = Rc::new(RefCell::new(EditorState {
            storage,
            editables: BTreeMap::new(),
            current: None,
            debouncer: SaveDebouncer::new(config.save_delay()),
            changing_internally: true,
            tracking: None,
        }));
        let editor = Self {
            bindings: Bindings::new(),
            key_prefix: format!("{KEY_PREFIX}{page}:"),
            state,
        };
        editor.init_bindings()?;
        config.apply(&editor.bindings)?;
        editor.state.borrow_mut().changing_internally = false;
        debug!(prefix = %editor.key_prefix, "context editor ready");
        Ok(editor)
    }

    fn init_bindings(&self) -> Result<(), PanelError> {
        let specs = [
            (
                Prop::Tracking,
                BindingConfig::new()
                    .initial(0.0)
                    .parser("float")
                    .formatter("fixed:3"),
            ),
            (Prop::Size, BindingConfig::new().initial(0.0).parser("float")),
            (
                Prop::LineHeight,
                BindingConfig::new().initial(1.0).parser("float"),
            ),
            (Prop::Style, BindingConfig::new()),
        ];
        for (prop, config) in specs {
            let binding = self
                .bindings
                .configure(prop.name(), config)
                .map_err(|source| PanelError::Bind {
                    binding: prop.name().to_owned(),
                    source,
                })?;
            let weak = Rc::downgrade(&self.state);
            binding.add_listener(move |next, _, _| {
                if let Some(state) = weak.upgrade() {
                    on_binding_changed(&state, prop, next);
                }
            });
            if prop == Prop::Tracking {
                self.state.borrow_mut().tracking = Some(binding);
            }
        }
        Ok(())
    }

    /// The panel's bindings.
    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Storage key prefix, `ctxedit:<page>:`.
    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Wire the panel's declared controls. Returns how many were bound.
    pub fn bind_controls(&self, elements: impl IntoIterator<Item = DeclaredElement>) -> usize {
        self.bindings.bind_all(elements)
    }

    /// Wire every element `source` yields for `selector`.
    pub fn bind_controls_matching(&self, source: &dyn ElementSource, selector: &str) -> usize {
        self.bindings.bind_all_matching(source, selector)
    }

    /// Register a sample under `name` and restore its stored settings.
    ///
    /// # Errors
    ///
    /// [`PanelError::DuplicateEditable`] if `name` is already registered.
    pub fn add_editable(&self, name: &str, defaults: SampleValues) -> Result<(), PanelError> {
        let key = format!("{}{name}", self.key_prefix);
        let mut st = self.state.borrow_mut();
        if st.editables.contains_key(&key) {
            return Err(PanelError::DuplicateEditable(key));
        }
        let ed = Editable::new(key.clone(), defaults, &st.storage);
        st.editables.insert(key, ed);
        Ok(())
    }

    /// A snapshot of the sample registered under `name`.
    #[must_use]
    pub fn editable(&self, name: &str) -> Option<Editable> {
        let key = format!("{}{name}", self.key_prefix);
        self.state.borrow().editables.get(&key).cloned()
    }

    /// Number of registered samples.
    #[must_use]
    pub fn editable_count(&self) -> usize {
        self.state.borrow().editables.len()
    }

    /// Full key of the focused sample.
    #[must_use]
    pub fn current_key(&self) -> Option<String> {
        self.state.borrow().current.clone()
    }

    /// Whether a debounced save is waiting.
    #[must_use]
    pub fn is_save_pending(&self) -> bool {
        self.state.borrow().debouncer.is_pending()
    }

    /// The settings storage.
    #[must_use]
    pub fn storage(&self) -> Ref<'_, S> {
        Ref::map(self.state.borrow(), |st| &st.storage)
    }

    /// Focus the sample registered under `name`.
    ///
    /// A pending save of the previously focused sample is performed first.
    /// Returns `false` (and changes nothing) for an unknown name.
    ///
    /// # Errors
    ///
    /// Storage failure while saving the previous sample.
    pub fn focus(&self, name: &str) -> Result<bool, PanelError> {
        let key = format!("{}{name}", self.key_prefix);
        if !self.state.borrow().editables.contains_key(&key) {
            return Ok(false);
        }
        self.set_current(Some(key))?;
        Ok(true)
    }

    /// Stop editing: save what is pending and unfocus.
    ///
    /// # Errors
    ///
    /// Storage failure while saving.
    pub fn blur(&self) -> Result<(), PanelError> {
        self.set_current(None)
    }

    fn set_current(&self, key: Option<String>) -> Result<(), PanelError> {
        let flush = {
            let st = self.state.borrow();
            st.debouncer.is_pending() && st.current.is_some() && !st.changing_internally
        };
        if flush {
            self.flush()?;
        }
        debug!(key = key.as_deref().unwrap_or("-"), "focus changed");
        self.state.borrow_mut().current = key;
        self.refresh_bindings();
        Ok(())
    }

    fn refresh_bindings(&self) {
        let pairs = self.state.borrow().current().map(|ed| ed.values().pairs());
        if let Some(pairs) = pairs {
            with_internal_changes(&self.state, || self.bindings.set_values(pairs));
        }
    }

    /// Return the focused sample to implicit tracking and show the result.
    pub fn reset_tracking(&self) {
        let update = {
            let mut guard = self.state.borrow_mut();
            let st = &mut *guard;
            let Some(ed) = st.current_mut() else {
                return;
            };
            ed.set_explicit_tracking(false);
            let tracking = ed.values().tracking;
            st.debouncer.schedule(Instant::now());
            st.tracking.clone().map(|binding| (binding, tracking))
        };
        if let Some((binding, tracking)) = update {
            with_internal_changes(&self.state, || binding.set_value(tracking));
        }
    }

    /// Return every sample to its defaults and clear stored settings.
    ///
    /// # Errors
    ///
    /// Storage failure; samples before the failing one are already reset.
    pub fn reset(&self) -> Result<(), PanelError> {
        {
            let mut guard = self.state.borrow_mut();
            let st = &mut *guard;
            for ed in st.editables.values_mut() {
                ed.reset(&st.storage)?;
            }
            st.debouncer.cancel();
        }
        self.refresh_bindings();
        Ok(())
    }

    /// Perform the debounced save if it is due at `now`.
    ///
    /// Returns whether a save ran.
    ///
    /// # Errors
    ///
    /// Storage failure.
    pub fn tick(&self, now: Instant) -> Result<bool, PanelError> {
        let due = self.state.borrow_mut().debouncer.poll(now);
        if due {
            self.save_current()?;
        }
        Ok(due)
    }

    /// Save the focused sample now, dropping any pending request.
    ///
    /// # Errors
    ///
    /// Serialization or storage failure.
    pub fn flush(&self) -> Result<(), PanelError> {
        self.state.borrow_mut().debouncer.cancel();
        self.save_current()
    }

    fn save_current(&self) -> Result<(), PanelError> {
        let st = self.state.borrow();
        match st.current() {
            Some(ed) => ed.save(&st.storage),
            None => Ok(()),
        }
    }
}

impl<S: SettingsStorage + 'static> std::fmt::Debug for ContextEditor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.state.borrow();
        f.debug_struct("ContextEditor")
            .field("key_prefix", &self.key_prefix)
            .field("editables", &st.editables.len())
            .field("current", &st.current)
            .field("save_pending", &st.debouncer.is_pending())
            .finish()
    }
}
