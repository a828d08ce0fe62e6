// Action trait definition

use std::sync::Arc;

use crate::action::context::ActionContextHandle;
use crate::action::parameter::Variant;
use crate::app::context::AppContext;

/// Errors an action can produce during validation or execution.
///
/// `Invalid` and `Unavailable` are validation outcomes; the dispatcher maps
/// them to the matching [`ActionStatus`](crate::action::context::ActionStatus)
/// and never shows the action to observers. `Failed` is a run outcome and is
/// still observable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ActionError {
    /// The action's parameters do not describe a performable operation
    #[error("{0}")]
    Invalid(String),
    /// The action is well formed but a required resource is missing
    #[error("{0}")]
    Unavailable(String),
    /// The action ran and failed
    #[error("{0}")]
    Failed(String),
}

pub type ActionResult = Option<Variant>;

bitflags::bitflags! {
    /// Classification of where an action belongs in the application.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionKind: u32 {
        /// Drives the interface layer (view changes, selections)
        const INTERFACE = 0b0001;
        /// Drives application-wide state
        const APPLICATION = 0b0010;
        /// Operates on a single layer of volume data
        const LAYER = 0b0100;
        /// Originates from an interactive tool
        const TOOL = 0b1000;
    }
}

bitflags::bitflags! {
    /// Behavioral properties of an action.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ActionProperties: u32 {
        /// An undo item is captured around this action
        const UNDOABLE = 0b001;
        /// Consecutive instances with the same merge key coalesce in the
        /// undo history (slider drags)
        const MERGEABLE = 0b010;
        /// Scripts may queue this action behind asynchronous work
        const QUEUEABLE = 0b100;
    }
}

/// One requested mutation of application state.
///
/// Concrete actions carry their own typed parameters; `kind` and
/// `properties` are fixed per type at construction. Actions are shared
/// (`Arc`) between the caller, the pending queue, and the undo history, so
/// all methods take `&self`; anything an action must stash between
/// `validate` and `run` needs interior mutability.
///
/// `validate` runs first and may reject; `run` performs the mutation on the
/// application thread and may return a result value. Both receive the owning
/// [`AppContext`], which is the only sanctioned route to the state engine
/// and undo buffer.
pub trait Action: Send + Sync {
    /// Fixed, human-readable type name; also the command-string verb.
    fn action_type(&self) -> &'static str;

    fn kind(&self) -> ActionKind;

    fn properties(&self) -> ActionProperties {
        ActionProperties::empty()
    }

    /// One-line usage text shown on validation or parse failure.
    fn usage(&self) -> String;

    fn validate(
        &self,
        _app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<(), ActionError> {
        Ok(())
    }

    fn run(
        &self,
        app: &Arc<AppContext>,
        context: &ActionContextHandle,
    ) -> Result<ActionResult, ActionError>;

    /// Key under which mergeable actions coalesce. Two mergeable actions
    /// with equal keys collapse to one undo entry.
    fn merge_key(&self) -> Option<String> {
        None
    }

    /// The command-string form of this action; re-parsing it through the
    /// factory yields an equivalent action.
    fn export_to_string(&self) -> String;

    /// Memory footprint estimate for undo accounting.
    fn byte_size(&self) -> usize {
        std::mem::size_of_val(self)
    }
}

pub type ActionHandle = Arc<dyn Action>;
pub type ActionHandleList = Vec<ActionHandle>;
