// ActionContext - provenance and result reporting for one action invocation

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::action::parameter::Variant;
use crate::messaging::channels::NotificationProducer;
use crate::messaging::notification::{Notification, NotificationCategory};

/// Outcome of performing an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionStatus {
    /// Everything went fine and the action was executed
    #[default]
    Success,
    /// The action ran but did not complete properly
    Error,
    /// The action did not pass validation
    Invalid,
    /// The action could not be executed because a resource is not available
    Unavailable,
}

/// Where an action was triggered from.
///
/// Downstream consumers special-case some sources: provenance recording
/// skips `UndoBuffer`, and scripting sources wait on notifiers instead of
/// polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionSource {
    /// Posted from an interface widget; the widget usually updated itself
    #[default]
    Interface,
    /// Posted from a mouse interaction
    Mouse,
    /// Posted from a keyboard interaction
    Keyboard,
    /// Posted from a script; completion is awaited through a notifier
    Script,
    /// Posted from the command line
    CommandLine,
    /// Replayed from the provenance record
    Provenance,
    /// Replayed from the undo buffer; must not be recorded again
    UndoBuffer,
}

/// Waitable completion handle for asynchronous actions.
///
/// An action whose effect outlives its `run()` hands one of these to the
/// context via `report_need_resource`; the worker thread calls `notify()`
/// when the effect has landed.
pub struct Notifier {
    name: String,
    triggered: Mutex<bool>,
    condvar: Condvar,
}

impl Notifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            triggered: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until `notify()` has been called.
    pub fn wait(&self) {
        let mut triggered = self.triggered.lock().expect("notifier poisoned");
        while !*triggered {
            triggered = self.condvar.wait(triggered).expect("notifier poisoned");
        }
    }

    /// Block up to `timeout`; returns whether the notifier fired.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        let mut triggered = self.triggered.lock().expect("notifier poisoned");
        while !*triggered {
            let (guard, result) = self
                .condvar
                .wait_timeout(triggered, timeout)
                .expect("notifier poisoned");
            triggered = guard;
            if result.timed_out() {
                return *triggered;
            }
        }
        true
    }

    pub fn notify(&self) {
        let mut triggered = self.triggered.lock().expect("notifier poisoned");
        *triggered = true;
        self.condvar.notify_all();
    }
}

/// Reporting surface handed to every action execution.
///
/// The context carries where the action came from (`source`) and where its
/// results must go. Each source derives its own context; the dispatcher only
/// talks to this trait. Exactly one `report_done` is expected per execution,
/// and validation failures short-circuit before it.
pub trait ActionContext: Send + Sync {
    fn source(&self) -> ActionSource;

    fn status(&self) -> ActionStatus;
    fn report_status(&self, status: ActionStatus);

    fn report_error(&self, error: &str);
    fn report_warning(&self, warning: &str);
    fn report_message(&self, message: &str);
    fn report_usage(&self, usage: &str);

    fn report_result(&self, result: &Variant);
    fn report_done(&self, success: bool);

    /// Hand over a notifier for an asynchronous effect. The default simply
    /// ignores it; contexts for waiting callers store it.
    fn report_need_resource(&self, _notifier: Arc<Notifier>) {}
}

pub type ActionContextHandle = Arc<dyn ActionContext>;

/// Context that routes reports to the log and keeps the last result around.
///
/// This is the workhorse context for tests, the command line, and internal
/// posts that have no UI surface to report to.
pub struct DefaultContext {
    source: ActionSource,
    status: Mutex<ActionStatus>,
    result: Mutex<Option<Variant>>,
    done: Mutex<Option<bool>>,
    notifier: Mutex<Option<Arc<Notifier>>>,
}

impl DefaultContext {
    pub fn new(source: ActionSource) -> Self {
        Self {
            source,
            status: Mutex::new(ActionStatus::default()),
            result: Mutex::new(None),
            done: Mutex::new(None),
            notifier: Mutex::new(None),
        }
    }

    pub fn result(&self) -> Option<Variant> {
        self.result.lock().expect("context poisoned").clone()
    }

    /// `None` until `report_done` fires, then the reported success flag.
    pub fn done(&self) -> Option<bool> {
        *self.done.lock().expect("context poisoned")
    }

    pub fn notifier(&self) -> Option<Arc<Notifier>> {
        self.notifier.lock().expect("context poisoned").clone()
    }
}

impl Default for DefaultContext {
    fn default() -> Self {
        Self::new(ActionSource::Interface)
    }
}

impl ActionContext for DefaultContext {
    fn source(&self) -> ActionSource {
        self.source
    }

    fn status(&self) -> ActionStatus {
        *self.status.lock().expect("context poisoned")
    }

    fn report_status(&self, status: ActionStatus) {
        *self.status.lock().expect("context poisoned") = status;
    }

    fn report_error(&self, error: &str) {
        log::error!("action error: {error}");
    }

    fn report_warning(&self, warning: &str) {
        log::warn!("action warning: {warning}");
    }

    fn report_message(&self, message: &str) {
        log::info!("{message}");
    }

    fn report_usage(&self, usage: &str) {
        log::info!("usage: {usage}");
    }

    fn report_result(&self, result: &Variant) {
        *self.result.lock().expect("context poisoned") = Some(result.clone());
    }

    fn report_done(&self, success: bool) {
        *self.done.lock().expect("context poisoned") = Some(success);
    }

    fn report_need_resource(&self, notifier: Arc<Notifier>) {
        *self.notifier.lock().expect("context poisoned") = Some(notifier);
    }
}

/// Context wrapper for the undo/redo replay path.
///
/// Forwards every call to the wrapped context but reports its source as
/// [`ActionSource::UndoBuffer`], so consumers such as the undo buffer's
/// redo-clearing logic and provenance recording can tell replay from fresh
/// user activity.
pub struct ReplayContext {
    inner: ActionContextHandle,
}

impl ReplayContext {
    pub fn new(inner: ActionContextHandle) -> Self {
        Self { inner }
    }
}

impl ActionContext for ReplayContext {
    fn source(&self) -> ActionSource {
        ActionSource::UndoBuffer
    }

    fn status(&self) -> ActionStatus {
        self.inner.status()
    }

    fn report_status(&self, status: ActionStatus) {
        self.inner.report_status(status);
    }

    fn report_error(&self, error: &str) {
        self.inner.report_error(error);
    }

    fn report_warning(&self, warning: &str) {
        self.inner.report_warning(warning);
    }

    fn report_message(&self, message: &str) {
        self.inner.report_message(message);
    }

    fn report_usage(&self, usage: &str) {
        self.inner.report_usage(usage);
    }

    fn report_result(&self, result: &Variant) {
        self.inner.report_result(result);
    }

    fn report_done(&self, success: bool) {
        self.inner.report_done(success);
    }

    fn report_need_resource(&self, notifier: Arc<Notifier>) {
        self.inner.report_need_resource(notifier);
    }
}

/// Context that forwards reports into the lock-free notification channel,
/// for GUI surfaces that poll rather than block.
pub struct NotificationContext {
    source: ActionSource,
    status: Mutex<ActionStatus>,
    sender: Arc<Mutex<NotificationProducer>>,
}

impl NotificationContext {
    pub fn new(source: ActionSource, sender: Arc<Mutex<NotificationProducer>>) -> Self {
        Self {
            source,
            status: Mutex::new(ActionStatus::default()),
            sender,
        }
    }

    fn push(&self, notification: Notification) {
        if let Ok(mut sender) = self.sender.lock() {
            // A full ringbuffer drops the message; the UI missed its window.
            let _ = ringbuf::traits::Producer::try_push(&mut *sender, notification);
        }
    }
}

impl ActionContext for NotificationContext {
    fn source(&self) -> ActionSource {
        self.source
    }

    fn status(&self) -> ActionStatus {
        *self.status.lock().expect("context poisoned")
    }

    fn report_status(&self, status: ActionStatus) {
        *self.status.lock().expect("context poisoned") = status;
    }

    fn report_error(&self, error: &str) {
        log::error!("action error: {error}");
        self.push(Notification::error(
            NotificationCategory::Action,
            error.to_string(),
        ));
    }

    fn report_warning(&self, warning: &str) {
        log::warn!("action warning: {warning}");
        self.push(Notification::warning(
            NotificationCategory::Action,
            warning.to_string(),
        ));
    }

    fn report_message(&self, message: &str) {
        self.push(Notification::info(
            NotificationCategory::Action,
            message.to_string(),
        ));
    }

    fn report_usage(&self, usage: &str) {
        self.push(Notification::info(
            NotificationCategory::Action,
            format!("usage: {usage}"),
        ));
    }

    fn report_result(&self, _result: &Variant) {}

    fn report_done(&self, _success: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_notification_channel;
    use crate::messaging::notification::NotificationLevel;
    use ringbuf::traits::Consumer;

    #[test]
    fn test_default_context_records_reports() {
        let context = DefaultContext::new(ActionSource::Script);

        assert_eq!(context.status(), ActionStatus::Success);
        assert_eq!(context.done(), None);

        context.report_status(ActionStatus::Error);
        context.report_result(&Variant::Int(9));
        context.report_done(false);

        assert_eq!(context.source(), ActionSource::Script);
        assert_eq!(context.status(), ActionStatus::Error);
        assert_eq!(context.result(), Some(Variant::Int(9)));
        assert_eq!(context.done(), Some(false));
    }

    #[test]
    fn test_replay_context_overrides_source_only() {
        let inner = Arc::new(DefaultContext::new(ActionSource::Interface));
        let replay = ReplayContext::new(inner.clone());

        assert_eq!(replay.source(), ActionSource::UndoBuffer);

        replay.report_status(ActionStatus::Unavailable);
        replay.report_done(true);

        assert_eq!(inner.status(), ActionStatus::Unavailable);
        assert_eq!(inner.done(), Some(true));
    }

    #[test]
    fn test_notification_context_pushes_errors() {
        let (tx, mut rx) = create_notification_channel(8);
        let context =
            NotificationContext::new(ActionSource::Interface, Arc::new(Mutex::new(tx)));

        context.report_error("brush size out of range");

        let notification = rx.try_pop().expect("notification expected");
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(notification.category, NotificationCategory::Action);
        assert!(notification.message.contains("brush size"));
    }

    #[test]
    fn test_notifier_wait_for() {
        let notifier = Arc::new(Notifier::new("filter done"));
        assert!(!notifier.wait_for(Duration::from_millis(10)));

        let remote = Arc::clone(&notifier);
        let worker = std::thread::spawn(move || remote.notify());
        notifier.wait();
        worker.join().unwrap();

        assert!(notifier.wait_for(Duration::from_millis(1)));
        assert_eq!(notifier.name(), "filter done");
    }
}
