// Action dispatch
//
// Every mutation of application state is an Action. Producers on any thread
// build one and post it; the dispatcher serializes execution onto the
// application thread and runs the validate -> notify -> run -> report ->
// notify protocol. The pieces:
// - trait_def: the Action contract and its classification flags
// - context: per-invocation provenance and result reporting
// - parameter: the Variant value container crossing the string/typed boundary
// - dispatcher: the five-step execution pipeline and its observer signals
// - factory: command-string to action resolution
// - actions: the builtin core actions
// - history: the bounded provenance feed

pub mod actions;
pub mod context;
pub mod dispatcher;
pub mod factory;
pub mod history;
pub mod parameter;
pub mod trait_def;

pub use actions::{ActionClearUndoBuffer, ActionGet, ActionRedo, ActionSet, ActionUndo};
pub use context::{
    ActionContext, ActionContextHandle, ActionSource, ActionStatus, DefaultContext,
    NotificationContext, Notifier, ReplayContext,
};
pub use dispatcher::{ActionDispatcher, ActionOutcome};
pub use factory::{ActionFactory, FactoryError};
pub use history::{ActionHistory, HistoryEntry};
pub use parameter::{Variant, VariantError, VariantKind};
pub use trait_def::{
    Action, ActionError, ActionHandle, ActionHandleList, ActionKind, ActionProperties,
    ActionResult,
};
