#![forbid(unsafe_code)]

//! An editable text sample and its persisted settings.
//!
//! Each sample on a lab page carries four typographic properties
//! ([`Prop`]). Tracking is either *implicit* (derived from the size through
//! [`dynamic_tracking`]) or *explicit* (whatever the user last set).
//!
//! Settings are saved under the sample key as a JSON object, with the
//! explicit-tracking flag stored next to it under `<key>:etracking`. A sample
//! at its defaults stores nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use fontlab_bind::Value;

use crate::error::PanelError;
use crate::metrics::{dynamic_line_height, dynamic_tracking};
use crate::storage::{SettingsStorage, load_object, remove_object, store_object};

const EXPLICIT_TRACKING_SUFFIX: &str = ":etracking";

/// An editable property of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prop {
    /// Font size in px.
    Size,
    /// Letter spacing in em.
    Tracking,
    /// Line height as a multiple of the size.
    LineHeight,
    /// Named font style (`regular`, `bold-italic`, ...).
    Style,
}

impl Prop {
    /// All properties, in storage order.
    pub const ALL: [Self; 4] = [Self::Size, Self::Tracking, Self::LineHeight, Self::Style];

    /// Binding and storage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Tracking => "tracking",
            Self::LineHeight => "lineHeight",
            Self::Style => "style",
        }
    }

    /// Inverse of [`Prop::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Property values of one sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleValues {
    pub size: f64,
    pub tracking: f64,
    pub line_height: f64,
    pub style: String,
}

impl Default for SampleValues {
    fn default() -> Self {
        Self {
            size: 16.0,
            tracking: 0.0,
            line_height: 1.0,
            style: "regular".to_owned(),
        }
    }
}

impl SampleValues {
    /// The value of `prop`.
    #[must_use]
    pub fn get(&self, prop: Prop) -> Value {
        match prop {
            Prop::Size => Value::Float(self.size),
            Prop::Tracking => Value::Float(self.tracking),
            Prop::LineHeight => Value::Float(self.line_height),
            Prop::Style => Value::Text(self.style.clone()),
        }
    }

    /// Set `prop` from a binding value.
    ///
    /// Numeric properties take numbers only; the style takes any value's
    /// text. Returns `false` (and leaves the value alone) on a kind mismatch.
    pub fn set(&mut self, prop: Prop, value: &Value) -> bool {
        let slot = match prop {
            Prop::Size => &mut self.size,
            Prop::Tracking => &mut self.tracking,
            Prop::LineHeight => &mut self.line_height,
            Prop::Style => {
                self.style = match value {
                    Value::Text(s) => s.clone(),
                    other => other.to_string(),
                };
                return true;
            }
        };
        match value.as_f64() {
            Some(x) => {
                *slot = x;
                true
            }
            None => false,
        }
    }

    /// `(name, value)` pairs for every property, ready for
    /// [`fontlab_bind::Bindings::set_values`].
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, Value)> {
        Prop::ALL.into_iter().map(|p| (p.name(), self.get(p))).collect()
    }
}

/// An editable sample: defaults, current values and the tracking mode.
#[derive(Clone, Debug)]
pub struct Editable {
    key: String,
    explicit_tracking_key: String,
    defaults: SampleValues,
    values: SampleValues,
    default_explicit_tracking: bool,
    explicit_tracking: bool,
}

impl Editable {
    /// Create a sample and restore whatever `storage` holds for `key`.
    ///
    /// Tracking starts explicit when the defaults carry non-zero tracking, or
    /// when the stored flag says so.
    pub fn new<S>(key: impl Into<String>, mut defaults: SampleValues, storage: &S) -> Self
    where
        S: SettingsStorage + ?Sized,
    {
        let key = key.into();
        let default_explicit_tracking = defaults.tracking != 0.0;
        if !default_explicit_tracking {
            defaults.tracking = dynamic_tracking(defaults.size);
        }
        let mut ed = Self {
            explicit_tracking_key: format!("{key}{EXPLICIT_TRACKING_SUFFIX}"),
            key,
            values: defaults.clone(),
            defaults,
            default_explicit_tracking,
            explicit_tracking: default_explicit_tracking,
        };
        ed.load(storage);
        ed.update_size_dependent();
        ed
    }

    fn load<S>(&mut self, storage: &S)
    where
        S: SettingsStorage + ?Sized,
    {
        if let Some(stored) =
            load_object::<serde_json::Map<String, serde_json::Value>, _>(storage, &self.key)
        {
            for (name, raw) in stored {
                let Some(prop) = Prop::from_name(&name) else {
                    warn!(key = %self.key, name = %name, "ignoring unknown stored property");
                    continue;
                };
                let accepted = serde_json::from_value::<Value>(raw)
                    .ok()
                    .is_some_and(|value| self.values.set(prop, &value));
                if !accepted {
                    warn!(key = %self.key, name = %name, "ignoring malformed stored property");
                }
            }
            debug!(key = %self.key, "loaded sample settings");
        }
        let stored_flag = load_object::<String, _>(storage, &self.explicit_tracking_key);
        self.explicit_tracking =
            self.default_explicit_tracking || stored_flag.as_deref() == Some("1");
    }

    fn update_size_dependent(&mut self) {
        if !self.explicit_tracking {
            self.values.tracking = dynamic_tracking(self.values.size);
        }
    }

    /// Storage key of the values.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current values.
    #[must_use]
    pub fn values(&self) -> &SampleValues {
        &self.values
    }

    /// Default values.
    #[must_use]
    pub fn defaults(&self) -> &SampleValues {
        &self.defaults
    }

    /// Whether tracking is user-set rather than derived from the size.
    #[must_use]
    pub fn explicit_tracking(&self) -> bool {
        self.explicit_tracking
    }

    /// Set one property. A size change recomputes implicit tracking.
    ///
    /// Returns `false` if `value` has the wrong kind for `prop`.
    pub fn set_value(&mut self, prop: Prop, value: &Value) -> bool {
        if !self.values.set(prop, value) {
            warn!(key = %self.key, prop = prop.name(), kind = value.kind_name(), "rejected value");
            return false;
        }
        if prop == Prop::Size {
            self.update_size_dependent();
        }
        true
    }

    /// Switch the tracking mode. Going implicit recomputes tracking.
    pub fn set_explicit_tracking(&mut self, explicit: bool) {
        if self.explicit_tracking != explicit {
            self.explicit_tracking = explicit;
            self.update_size_dependent();
        }
    }

    /// Whether every value equals its default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.values == self.defaults
    }

    /// Restore defaults and forget the stored settings.
    ///
    /// # Errors
    ///
    /// Storage failure while removing the stored keys.
    pub fn reset<S>(&mut self, storage: &S) -> Result<(), PanelError>
    where
        S: SettingsStorage + ?Sized,
    {
        self.values = self.defaults.clone();
        self.explicit_tracking = self.default_explicit_tracking;
        self.update_size_dependent();
        remove_object(storage, &self.key)?;
        remove_object(storage, &self.explicit_tracking_key)
    }

    /// Persist the current values, or clear storage when at defaults.
    ///
    /// # Errors
    ///
    /// Serialization or storage failure.
    pub fn save<S>(&self, storage: &S) -> Result<(), PanelError>
    where
        S: SettingsStorage + ?Sized,
    {
        if self.is_default() {
            remove_object(storage, &self.key)?;
            remove_object(storage, &self.explicit_tracking_key)?;
        } else {
            store_object(storage, &self.key, &self.values)?;
            let flag = if self.explicit_tracking { "1" } else { "0" };
            store_object(storage, &self.explicit_tracking_key, flag)?;
        }
        debug!(key = %self.key, default = self.is_default(), "saved sample settings");
        Ok(())
    }

    /// Left indent in px that optically aligns the sample with body text.
    #[must_use]
    pub fn left_margin(&self) -> f64 {
        let margin = self.values.size / -16.0;
        if margin == 0.0 { 0.0 } else { margin }
    }

    /// Line height in px derived from the current size.
    #[must_use]
    pub fn implicit_line_height(&self) -> f64 {
        dynamic_line_height(self.values.size)
    }
}
