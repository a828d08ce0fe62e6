// StateEngine - registry of named state variables

use std::collections::HashMap;
use std::sync::Mutex;

use crate::action::parameter::Variant;
use crate::messaging::signal::Signal;
use crate::state::variable::{StateHandle, StateVariable};

/// Prefix marking an id as an alias reference
const ALIAS_SENTINEL: char = '$';

struct EngineInner {
    states: HashMap<String, StateHandle>,
    aliases: HashMap<String, String>,
}

/// Registry of every named state variable in the application.
///
/// Actions read current values during validation and write new values
/// during run. One mutex guards the whole registry; variable values carry
/// their own locks, so holding a handle outside the registry lock is fine.
///
/// Ids are hierarchical with `:` separating segments
/// (`"layer_2:opacity"`). An id starting with `$` is an alias and resolves
/// one level of indirection to a canonical id before lookup.
///
/// Registering a duplicate id or alias is a programming error and panics;
/// it indicates a structural bug, not bad input.
pub struct StateEngine {
    inner: Mutex<EngineInner>,
    state_changed: Signal<()>,
}

impl StateEngine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                states: HashMap::new(),
                aliases: HashMap::new(),
            }),
            state_changed: Signal::new(),
        }
    }

    /// Register a new variable. The initial value fixes the variable's kind.
    ///
    /// # Panics
    /// Panics when `id` is already registered or carries the alias sentinel.
    pub fn add_state(&self, id: impl Into<String>, initial: Variant) -> StateHandle {
        let id = id.into();
        assert!(
            !id.starts_with(ALIAS_SENTINEL),
            "state id '{id}' must not carry the alias sentinel"
        );

        let handle = StateHandle::new(StateVariable::new(id.clone(), initial));
        {
            let mut inner = self.inner.lock().expect("state engine poisoned");
            if inner.states.contains_key(&id) {
                panic!("trying to add state id '{id}' that already exists");
            }
            inner.states.insert(id, handle.clone());
        }
        self.state_changed.emit(&());
        handle
    }

    /// Register `alias` so that `get_state("$alias")` resolves to
    /// `state_id`.
    ///
    /// # Panics
    /// Panics when the alias is already registered.
    pub fn add_statealias(&self, alias: impl Into<String>, state_id: impl Into<String>) {
        let alias = alias.into();
        let mut inner = self.inner.lock().expect("state engine poisoned");
        if inner.aliases.contains_key(&alias) {
            panic!("trying to add state alias '{alias}' that already exists");
        }
        inner.aliases.insert(alias, state_id.into());
    }

    /// Look up a variable by id or `$alias`. Aliases resolve one level.
    pub fn get_state(&self, id: &str) -> Option<StateHandle> {
        let inner = self.inner.lock().expect("state engine poisoned");
        let canonical = match id.strip_prefix(ALIAS_SENTINEL) {
            Some(alias) => inner.aliases.get(alias)?.as_str(),
            None => id,
        };
        inner.states.get(canonical).cloned()
    }

    /// Remove the variable with this exact id plus every descendant
    /// (`prefix:...`). Ids that merely share a textual prefix are kept:
    /// removing `layer_1` leaves `layer_10` alone.
    pub fn remove_state(&self, prefix: &str) {
        let removed = {
            let mut inner = self.inner.lock().expect("state engine poisoned");
            let before = inner.states.len();
            inner.states.retain(|id, _| {
                !(id == prefix
                    || (id.starts_with(prefix) && id[prefix.len()..].starts_with(':')))
            });
            before != inner.states.len()
        };
        if removed {
            self.state_changed.emit(&());
        }
    }

    /// Generate a fresh unique id from a base name: a trailing `_<digits>`
    /// suffix is stripped, then `base_1`, `base_2`, ... are probed for the
    /// first unused candidate.
    pub fn create_stateid(&self, base: &str) -> String {
        let base = strip_numeric_suffix(base);
        let inner = self.inner.lock().expect("state engine poisoned");
        let mut number = 1usize;
        loop {
            let candidate = format!("{base}_{number}");
            if !inner.states.contains_key(&candidate) {
                return candidate;
            }
            number += 1;
        }
    }

    /// Alias counterpart of [`create_stateid`](Self::create_stateid).
    pub fn create_statealias(&self, base: &str) -> String {
        let base = strip_numeric_suffix(base);
        let inner = self.inner.lock().expect("state engine poisoned");
        let mut number = 1usize;
        loop {
            let candidate = format!("{base}_{number}");
            if !inner.aliases.contains_key(&candidate) {
                return candidate;
            }
            number += 1;
        }
    }

    pub fn num_states(&self) -> usize {
        self.inner.lock().expect("state engine poisoned").states.len()
    }

    /// Signal fired after variables are added or removed.
    pub fn state_changed(&self) -> &Signal<()> {
        &self.state_changed
    }
}

impl Default for StateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip a trailing `_<digits>` suffix: `layer_42` becomes `layer`,
/// `layer_` and `layer` stay as they are.
fn strip_numeric_suffix(base: &str) -> &str {
    match base.rfind('_') {
        Some(position) if position + 1 < base.len() => {
            let suffix = &base[position + 1..];
            if suffix.bytes().all(|b| b.is_ascii_digit()) {
                &base[..position]
            } else {
                base
            }
        }
        _ => base,
    }
}
