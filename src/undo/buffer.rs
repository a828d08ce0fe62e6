// UndoBuffer - memory-bounded, tag-addressable history of reversible operations

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::action::context::{ActionContextHandle, ActionSource, ReplayContext};
use crate::action::trait_def::{ActionHandle, ActionHandleList};
use crate::app::context::AppContext;
use crate::messaging::signal::Signal;
use crate::undo::item::{ActionUndoItem, UndoBufferItem};

/// Errors surfaced by the undo history
#[derive(Debug, Clone, thiserror::Error)]
pub enum UndoError {
    #[error("Undo items need to be tagged with a label")]
    EmptyTag,
    #[error("Undo items need at least one undo action")]
    NoUndoActions,
    #[error("Undo list is empty")]
    NothingToUndo,
    #[error("Redo list is empty")]
    NothingToRedo,
    #[error("Replaying undo item '{0}' failed")]
    ReplayFailed(String),
}

/// Capacity limits for the history.
///
/// The byte budget and the item ceiling are independent knobs; eviction
/// honors whichever is hit first.
#[derive(Debug, Clone, Copy)]
pub struct UndoBufferConfig {
    /// Cumulative byte budget for the undo list
    pub max_bytes: usize,
    /// Optional hard ceiling on the number of items, `None` for unlimited
    pub max_items: Option<usize>,
}

impl Default for UndoBufferConfig {
    fn default() -> Self {
        Self {
            max_bytes: 512 * 1024 * 1024,
            max_items: Some(100),
        }
    }
}

impl UndoBufferConfig {
    pub fn from_preferences(preferences: &crate::config::preferences::Preferences) -> Self {
        Self {
            max_bytes: preferences.undo_memory_mb * 1024 * 1024,
            max_items: preferences.max_undo_items,
        }
    }
}

struct Lists {
    undo_list: VecDeque<Box<dyn UndoBufferItem>>,
    redo_list: VecDeque<Box<dyn UndoBufferItem>>,
}

/// Ordered, memory-bounded history of undo items.
///
/// Front of each list is the most recent entry. History is strictly linear:
/// inserting from any source other than undo-buffer replay clears the redo
/// list. The cumulative byte size of the undo list is kept under the
/// configured budget by evicting the oldest entries.
///
/// The buffer itself is thread-safe, but undo/redo playback runs actions
/// and must therefore happen on the application thread (normally by being
/// posted as `undo`/`redo` actions through the dispatcher).
pub struct UndoBuffer {
    lists: Mutex<Lists>,
    config: Mutex<UndoBufferConfig>,
    enabled: AtomicBool,
    undo_tag_changed: Signal<String>,
    redo_tag_changed: Signal<String>,
    buffer_changed: Signal<()>,
}

impl UndoBuffer {
    pub fn new(config: UndoBufferConfig) -> Self {
        Self {
            lists: Mutex::new(Lists {
                undo_list: VecDeque::new(),
                redo_list: VecDeque::new(),
            }),
            config: Mutex::new(config),
            enabled: AtomicBool::new(true),
            undo_tag_changed: Signal::new(),
            redo_tag_changed: Signal::new(),
            buffer_changed: Signal::new(),
        }
    }

    // -- insertion --

    /// Register a reversible operation: `undo_actions` reverse the effect,
    /// `redo_action` re-executes it. Rejected items (empty tag, no undo
    /// actions) never touch the history.
    pub fn add_undo_action(
        &self,
        context: &ActionContextHandle,
        tag: &str,
        undo_actions: ActionHandleList,
        redo_action: ActionHandle,
    ) -> Result<(), UndoError> {
        if tag.is_empty() {
            log::error!("undo actions need to be tagged with a label");
            return Err(UndoError::EmptyTag);
        }
        if undo_actions.is_empty() {
            log::error!("registration of an undo item without undo actions");
            return Err(UndoError::NoUndoActions);
        }

        let item = Box::new(ActionUndoItem::new(tag, undo_actions, redo_action));
        self.insert_undo_item(context, item);
        Ok(())
    }

    /// Insert a prebuilt item. The context's source decides whether the
    /// redo list survives: only undo-buffer replay preserves it.
    pub fn insert_undo_item(&self, context: &ActionContextHandle, item: Box<dyn UndoBufferItem>) {
        self.insert_item(context.source(), item);
    }

    fn insert_item(&self, source: ActionSource, item: Box<dyn UndoBufferItem>) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }

        let config = *self.config.lock().expect("undo config poisoned");
        let fresh = source != ActionSource::UndoBuffer;

        {
            let mut lists = self.lists.lock().expect("undo lists poisoned");

            // A fresh edit invalidates any forward history
            if fresh {
                lists.redo_list.clear();
            }

            // Slider-drag coalescing: the front item may absorb the new one
            let absorbed = fresh
                && lists
                    .undo_list
                    .front_mut()
                    .is_some_and(|front| front.try_absorb(item.as_ref()));

            if !absorbed {
                // Walk from the most recent entry accumulating byte sizes;
                // everything from the first entry over budget (or past the
                // item ceiling) is dropped, oldest first.
                let mut size = item.byte_size();
                let mut cut = lists.undo_list.len();
                for (index, existing) in lists.undo_list.iter().enumerate() {
                    size += existing.byte_size();
                    if size > config.max_bytes {
                        cut = index;
                        break;
                    }
                    if let Some(max_items) = config.max_items {
                        if index + 1 >= max_items {
                            cut = index;
                            break;
                        }
                    }
                }
                lists.undo_list.truncate(cut);
                lists.undo_list.push_front(item);
            }
        }

        self.undo_tag_changed.emit(&self.get_undo_tag());
        if fresh {
            self.redo_tag_changed.emit(&self.get_redo_tag());
        }
        self.buffer_changed.emit(&());
    }

    // -- replay --

    /// Undo the most recent item: move it to the redo list and play its
    /// undo actions back through the reduced protocol (no observer
    /// notification; undo is not new user activity).
    pub fn undo(
        &self,
        app: &Arc<AppContext>,
        context: &ActionContextHandle,
    ) -> Result<(), UndoError> {
        let (tag, undo_actions) = {
            let mut lists = self.lists.lock().expect("undo lists poisoned");
            let Some(item) = lists.undo_list.pop_front() else {
                return Err(UndoError::NothingToUndo);
            };
            let tag = item.tag().to_string();
            let actions = item.undo_actions().to_vec();
            lists.redo_list.push_front(item);
            (tag, actions)
        };

        self.undo_tag_changed.emit(&self.get_undo_tag());
        self.redo_tag_changed.emit(&self.get_redo_tag());
        self.buffer_changed.emit(&());

        let replay: ActionContextHandle = Arc::new(ReplayContext::new(Arc::clone(context)));
        for action in &undo_actions {
            if !app.dispatcher().run_action_no_observers(app, action, &replay) {
                return Err(UndoError::ReplayFailed(tag.clone()));
            }
        }
        Ok(())
    }

    /// Redo the most recently undone item: run its redo action through the
    /// full dispatcher pipeline (tagged as undo-buffer replay) and move the
    /// item back onto the undo list.
    pub fn redo(
        &self,
        app: &Arc<AppContext>,
        context: &ActionContextHandle,
    ) -> Result<(), UndoError> {
        let item = {
            let mut lists = self.lists.lock().expect("undo lists poisoned");
            match lists.redo_list.pop_front() {
                Some(item) => item,
                None => return Err(UndoError::NothingToRedo),
            }
        };

        let redo_action = item.redo_action().clone();
        let replay: ActionContextHandle = Arc::new(ReplayContext::new(Arc::clone(context)));
        app.dispatcher().run_action(app, &redo_action, &replay);

        // The replay source keeps the remaining redo entries alive
        self.insert_item(ActionSource::UndoBuffer, item);
        self.redo_tag_changed.emit(&self.get_redo_tag());
        Ok(())
    }

    // -- maintenance --

    /// Drop all history, both directions.
    pub fn reset(&self) {
        {
            let mut lists = self.lists.lock().expect("undo lists poisoned");
            lists.undo_list.clear();
            lists.redo_list.clear();
        }
        self.undo_tag_changed.emit(&String::new());
        self.redo_tag_changed.emit(&String::new());
        self.buffer_changed.emit(&());
    }

    /// Toggle the history. Disabling clears it immediately.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.reset();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_config(&self, config: UndoBufferConfig) {
        *self.config.lock().expect("undo config poisoned") = config;
    }

    // -- queries --

    /// Tag of the item `index` steps down the undo list; the empty string
    /// means no such entry (the defined "no history" signal, not an error).
    pub fn get_undo_tag_at(&self, index: usize) -> String {
        let lists = self.lists.lock().expect("undo lists poisoned");
        lists
            .undo_list
            .get(index)
            .map(|item| item.tag().to_string())
            .unwrap_or_default()
    }

    pub fn get_undo_tag(&self) -> String {
        self.get_undo_tag_at(0)
    }

    pub fn get_redo_tag_at(&self, index: usize) -> String {
        let lists = self.lists.lock().expect("undo lists poisoned");
        lists
            .redo_list
            .get(index)
            .map(|item| item.tag().to_string())
            .unwrap_or_default()
    }

    pub fn get_redo_tag(&self) -> String {
        self.get_redo_tag_at(0)
    }

    pub fn get_undo_byte_size_at(&self, index: usize) -> usize {
        let lists = self.lists.lock().expect("undo lists poisoned");
        lists
            .undo_list
            .get(index)
            .map(|item| item.byte_size())
            .unwrap_or_default()
    }

    /// Cumulative byte size of the undo list.
    pub fn total_byte_size(&self) -> usize {
        let lists = self.lists.lock().expect("undo lists poisoned");
        lists.undo_list.iter().map(|item| item.byte_size()).sum()
    }

    pub fn has_undo(&self) -> bool {
        !self.lists.lock().expect("undo lists poisoned").undo_list.is_empty()
    }

    pub fn has_redo(&self) -> bool {
        !self.lists.lock().expect("undo lists poisoned").redo_list.is_empty()
    }

    pub fn num_undo_items(&self) -> usize {
        self.lists.lock().expect("undo lists poisoned").undo_list.len()
    }

    pub fn num_redo_items(&self) -> usize {
        self.lists.lock().expect("undo lists poisoned").redo_list.len()
    }

    // -- observer signals --

    /// Fired with the new front-of-undo-list tag whenever it changes.
    pub fn undo_tag_changed(&self) -> &Signal<String> {
        &self.undo_tag_changed
    }

    /// Fired with the new front-of-redo-list tag whenever it changes.
    pub fn redo_tag_changed(&self) -> &Signal<String> {
        &self.redo_tag_changed
    }

    /// Fired after any structural change to either list.
    pub fn buffer_changed(&self) -> &Signal<()> {
        &self.buffer_changed
    }
}

impl Default for UndoBuffer {
    fn default() -> Self {
        Self::new(UndoBufferConfig::default())
    }
}
