// StateVariable - one named, typed, observable value

use std::sync::{Arc, Mutex};

use crate::action::parameter::{Variant, VariantError, VariantKind};
use crate::messaging::signal::Signal;

/// A named, typed, observable variable held by the state engine.
///
/// The declared kind is fixed at construction; `set` coerces incoming
/// values through the canonical string form, so a `Text` value carrying
/// "0.5" can be written into a `Real` variable (this is how command-string
/// arguments reach typed state).
pub struct StateVariable {
    id: String,
    kind: VariantKind,
    value: Mutex<Variant>,
    value_changed: Signal<Variant>,
}

impl StateVariable {
    pub fn new(id: impl Into<String>, initial: Variant) -> Self {
        Self {
            id: id.into(),
            kind: initial.kind(),
            value: Mutex::new(initial),
            value_changed: Signal::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> VariantKind {
        self.kind
    }

    pub fn get(&self) -> Variant {
        self.value.lock().expect("state variable poisoned").clone()
    }

    /// Write a new value, coercing to the declared kind. Observers are
    /// notified only when the stored value actually changes.
    pub fn set(&self, value: Variant) -> Result<(), VariantError> {
        let coerced = value.coerce_to(self.kind)?;
        {
            let mut current = self.value.lock().expect("state variable poisoned");
            if *current == coerced {
                return Ok(());
            }
            *current = coerced.clone();
        }
        self.value_changed.emit(&coerced);
        Ok(())
    }

    /// Signal fired with the new value after every effective `set`.
    pub fn value_changed(&self) -> &Signal<Variant> {
        &self.value_changed
    }
}

pub type StateHandle = Arc<StateVariable>;
