// ActionDispatcher - the single-thread execution gate for actions

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};

use crate::action::context::{ActionContextHandle, ActionSource, ActionStatus};
use crate::action::trait_def::{ActionError, ActionHandle, ActionResult};
use crate::app::context::AppContext;
use crate::messaging::signal::Signal;

/// What the post-action signal carries: the executed action, where it came
/// from, and how it went. The source lets consumers such as provenance
/// recording special-case undo-buffer replay.
pub struct ActionOutcome {
    pub action: ActionHandle,
    pub source: ActionSource,
    pub success: bool,
    pub result: ActionResult,
}

/// Runs the validate -> notify -> run -> report -> notify pipeline.
///
/// The dispatcher itself holds no queue; posting lives on
/// [`AppContext`](crate::app::context::AppContext), which relays every call
/// onto the application thread so one action fully completes before the
/// next begins. `run_action` must only be called on that thread.
pub struct ActionDispatcher {
    pre_action: Signal<ActionHandle>,
    post_action: Signal<ActionOutcome>,
    pending: AtomicUsize,
    last_completed: Mutex<Option<DateTime<Utc>>>,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self {
            pre_action: Signal::new(),
            post_action: Signal::new(),
            pending: AtomicUsize::new(0),
            last_completed: Mutex::new(None),
        }
    }

    /// Execute one action, application thread only.
    ///
    /// Step 1: validate. Failures are reported through the context (usage
    /// text included) and are never shown to observers.
    /// Step 2: pre-action signal. Observers must not mutate state here.
    /// Step 3: run.
    /// Step 4: report the result, then exactly one `report_done`.
    /// Step 5: post-action signal, fired for failed runs too; a failed
    /// attempt is still observable.
    pub fn run_action(
        &self,
        app: &std::sync::Arc<AppContext>,
        action: &ActionHandle,
        context: &ActionContextHandle,
    ) {
        log::debug!("dispatching action: {}", action.export_to_string());

        if !self.validate_action(app, action, context) {
            return;
        }

        self.pre_action.emit(action);

        let (success, result) = self.run_validated(app, action, context);

        self.post_action.emit(&ActionOutcome {
            action: action.clone(),
            source: context.source(),
            success,
            result,
        });
    }

    /// Reduced protocol for undo playback: validate and run without
    /// notifying observers. Returns whether the action ran successfully.
    pub fn run_action_no_observers(
        &self,
        app: &std::sync::Arc<AppContext>,
        action: &ActionHandle,
        context: &ActionContextHandle,
    ) -> bool {
        log::debug!("replaying action: {}", action.export_to_string());

        if !self.validate_action(app, action, context) {
            return false;
        }
        let (success, _) = self.run_validated(app, action, context);
        success
    }

    fn validate_action(
        &self,
        app: &std::sync::Arc<AppContext>,
        action: &ActionHandle,
        context: &ActionContextHandle,
    ) -> bool {
        match action.validate(app, context) {
            Ok(()) => true,
            Err(error) => {
                context.report_error(&error.to_string());
                let status = match error {
                    ActionError::Unavailable(_) => ActionStatus::Unavailable,
                    _ => {
                        context.report_usage(&action.usage());
                        ActionStatus::Invalid
                    }
                };
                context.report_status(status);
                context.report_done(false);
                false
            }
        }
    }

    fn run_validated(
        &self,
        app: &std::sync::Arc<AppContext>,
        action: &ActionHandle,
        context: &ActionContextHandle,
    ) -> (bool, ActionResult) {
        match action.run(app, context) {
            Ok(result) => {
                if let Some(value) = &result {
                    context.report_result(value);
                }
                context.report_status(ActionStatus::Success);
                context.report_done(true);
                (true, result)
            }
            Err(error) => {
                context.report_error(&error.to_string());
                context.report_status(ActionStatus::Error);
                context.report_done(false);
                (false, None)
            }
        }
    }

    /// Whether posted actions are still awaiting execution.
    pub fn is_busy(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// When the most recent posted action finished, if any has.
    pub fn last_action_completed(&self) -> Option<DateTime<Utc>> {
        *self.last_completed.lock().expect("dispatcher poisoned")
    }

    pub(crate) fn note_posted(&self) {
        self.pending.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn note_dropped(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn note_completed(&self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
        *self.last_completed.lock().expect("dispatcher poisoned") = Some(Utc::now());
    }

    /// Fired with the validated action just before it runs.
    pub fn pre_action(&self) -> &Signal<ActionHandle> {
        &self.pre_action
    }

    /// Fired after the action ran (or failed to run).
    pub fn post_action(&self) -> &Signal<ActionOutcome> {
        &self.post_action
    }
}

impl Default for ActionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
