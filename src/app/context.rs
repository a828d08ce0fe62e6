// AppContext - dependency-injected owner of the core services
//
// The original design kept the dispatcher, state engine and undo buffer as
// process-wide singletons. Here they are plain fields of one explicitly
// constructed context with a documented single-instance lifetime, so tests
// get isolation and teardown is deterministic.

use std::sync::Arc;

use crate::action::actions::register_core_actions;
use crate::action::context::ActionContextHandle;
use crate::action::dispatcher::ActionDispatcher;
use crate::action::factory::ActionFactory;
use crate::action::history::ActionHistory;
use crate::action::parameter::Variant;
use crate::action::trait_def::{ActionHandle, ActionHandleList};
use crate::app::thread::ApplicationThread;
use crate::config::preferences::Preferences;
use crate::state::engine::StateEngine;
use crate::undo::buffer::{UndoBuffer, UndoBufferConfig};

/// Owns the application thread and every core service, and is the sole
/// gateway through which actions reach execution.
///
/// One instance per application process; create it on the main thread and
/// keep it alive for the life of the process. Everything here is reachable
/// from any thread; only the application thread may touch committed state,
/// which it does exclusively through actions run by the dispatcher.
pub struct AppContext {
    thread: ApplicationThread,
    dispatcher: ActionDispatcher,
    state_engine: StateEngine,
    undo_buffer: Arc<UndoBuffer>,
    history: Arc<ActionHistory>,
    factory: ActionFactory,
    preferences: Preferences,
}

impl AppContext {
    /// Build a context with default preferences (no file access).
    pub fn new() -> Arc<Self> {
        Self::with_preferences(Preferences::default())
    }

    pub fn with_preferences(preferences: Preferences) -> Arc<Self> {
        let dispatcher = ActionDispatcher::new();

        let undo_buffer = Arc::new(UndoBuffer::new(UndoBufferConfig::from_preferences(
            &preferences,
        )));
        undo_buffer.set_enabled(preferences.enable_undo);

        // Provenance feed: every executed action lands in the history,
        // except undo-buffer replay (recorded the first time around).
        let history = Arc::new(ActionHistory::new(preferences.max_history_entries));
        {
            let history = Arc::clone(&history);
            dispatcher
                .post_action()
                .connect(move |outcome| history.record(outcome));
        }

        let state_engine = StateEngine::new();

        // Mirror the undo toggle into the state engine so the preference is
        // scriptable; flipping it off clears the history immediately.
        let enable_undo = state_engine.add_state(
            "preferences:enable_undo",
            Variant::Bool(preferences.enable_undo),
        );
        {
            let undo_buffer = Arc::clone(&undo_buffer);
            enable_undo.value_changed().connect(move |value| {
                if let Ok(enabled) = value.get_bool() {
                    undo_buffer.set_enabled(enabled);
                }
            });
        }

        let factory = ActionFactory::new();
        register_core_actions(&factory);

        Arc::new(Self {
            thread: ApplicationThread::start(),
            dispatcher,
            state_engine,
            undo_buffer,
            history,
            factory,
            preferences,
        })
    }

    // -- posting --

    /// Enqueue one action for execution on the application thread; returns
    /// immediately. Callable from any thread including the application
    /// thread itself.
    pub fn post_action(self: &Arc<Self>, action: ActionHandle, context: ActionContextHandle) {
        log::debug!("posting action: {}", action.export_to_string());
        self.dispatcher.note_posted();

        let app = Arc::clone(self);
        if !self.thread.post(move || {
            app.dispatcher.run_action(&app, &action, &context);
            app.dispatcher.note_completed();
        }) {
            self.dispatcher.note_dropped();
        }
    }

    /// Enqueue one action and block until it has fully executed.
    ///
    /// # Panics
    /// Panics when called from the application thread; see
    /// [`ApplicationThread::post_and_wait`].
    pub fn post_and_wait_action(
        self: &Arc<Self>,
        action: ActionHandle,
        context: ActionContextHandle,
    ) {
        if self.thread.is_application_thread() {
            panic!(
                "post_and_wait_action cannot be posted from the thread that \
                 processes the actions; this would lead to a dead lock"
            );
        }

        log::debug!("posting action (wait): {}", action.export_to_string());

        let app = Arc::clone(self);
        self.dispatcher.note_posted();
        if !self.thread.post_and_wait(move || {
            app.dispatcher.run_action(&app, &action, &context);
            app.dispatcher.note_completed();
        }) {
            self.dispatcher.note_dropped();
        }
    }

    /// Enqueue an ordered sequence; the elements execute back-to-back with
    /// no other action interleaved between them.
    pub fn post_actions(self: &Arc<Self>, actions: ActionHandleList, context: ActionContextHandle) {
        for action in &actions {
            log::debug!("posting action sequence: {}", action.export_to_string());
            self.dispatcher.note_posted();
        }

        let count = actions.len();
        let app = Arc::clone(self);
        if !self.thread.post(move || {
            for action in &actions {
                app.dispatcher.run_action(&app, action, &context);
                app.dispatcher.note_completed();
            }
        }) {
            for _ in 0..count {
                self.dispatcher.note_dropped();
            }
        }
    }

    /// Blocking variant of [`post_actions`](Self::post_actions).
    ///
    /// # Panics
    /// Panics when called from the application thread.
    pub fn post_and_wait_actions(
        self: &Arc<Self>,
        actions: ActionHandleList,
        context: ActionContextHandle,
    ) {
        if self.thread.is_application_thread() {
            panic!(
                "post_and_wait_actions cannot be posted from the thread that \
                 processes the actions; this would lead to a dead lock"
            );
        }

        for action in &actions {
            log::debug!("posting action sequence (wait): {}", action.export_to_string());
            self.dispatcher.note_posted();
        }

        let count = actions.len();
        let app = Arc::clone(self);
        if !self.thread.post_and_wait(move || {
            for action in &actions {
                app.dispatcher.run_action(&app, action, &context);
                app.dispatcher.note_completed();
            }
        }) {
            for _ in 0..count {
                self.dispatcher.note_dropped();
            }
        }
    }

    /// Resolve a textual command through the factory and post it. On parse
    /// failure the error and the action's usage string are reported through
    /// the context, nothing is queued, and false is returned.
    pub fn post_action_string(
        self: &Arc<Self>,
        command: &str,
        context: ActionContextHandle,
    ) -> bool {
        match self.factory.create(command) {
            Ok(action) => {
                self.post_action(action, context);
                true
            }
            Err(error) => {
                context.report_error(&error.to_string());
                if let Some(usage) = error.usage() {
                    context.report_usage(usage);
                }
                false
            }
        }
    }

    /// Blocking variant of [`post_action_string`](Self::post_action_string).
    pub fn post_and_wait_action_string(
        self: &Arc<Self>,
        command: &str,
        context: ActionContextHandle,
    ) -> bool {
        match self.factory.create(command) {
            Ok(action) => {
                self.post_and_wait_action(action, context);
                true
            }
            Err(error) => {
                context.report_error(&error.to_string());
                if let Some(usage) = error.usage() {
                    context.report_usage(usage);
                }
                false
            }
        }
    }

    // -- services --

    pub fn is_application_thread(&self) -> bool {
        self.thread.is_application_thread()
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    pub fn state_engine(&self) -> &StateEngine {
        &self.state_engine
    }

    pub fn undo_buffer(&self) -> &UndoBuffer {
        &self.undo_buffer
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn factory(&self) -> &ActionFactory {
        &self.factory
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Stop the application thread after draining queued work. Idempotent;
    /// also runs on drop.
    pub fn shutdown(&self) {
        self.thread.terminate();
    }
}
