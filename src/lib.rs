// voxseg - action dispatch and undo/redo core of a volumetric editor

pub mod action;
pub mod app;
pub mod config;
pub mod messaging;
pub mod state;
pub mod undo;

// Re-export commonly used types for convenience
pub use action::{
    Action, ActionContext, ActionContextHandle, ActionDispatcher, ActionError, ActionFactory,
    ActionHandle, ActionHistory, ActionKind, ActionProperties, ActionSource, ActionStatus,
    DefaultContext, Notifier, ReplayContext, Variant, VariantKind,
};
pub use app::{AppContext, ApplicationThread};
pub use config::Preferences;
pub use messaging::{Notification, NotificationCategory, NotificationLevel, Signal};
pub use state::{StateEngine, StateHandle, StateVariable};
pub use undo::{
    ActionUndoItem, UndoBuffer, UndoBufferConfig, UndoBufferItem, UndoError, add_undo_action,
    add_undo_action2, add_undo_action3,
};
