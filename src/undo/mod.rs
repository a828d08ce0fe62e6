// Undo/redo history
//
// Reversible operations are captured as tagged items bundling one redo
// action with one-or-more undo actions. Calling code builds the item around
// the forward action (capturing pre-mutation state) and registers it here;
// the buffer keeps history linear and bounded.

pub mod buffer;
pub mod item;

use std::sync::Arc;

use crate::action::context::ActionContextHandle;
use crate::action::trait_def::ActionHandle;
use crate::app::context::AppContext;

pub use buffer::{UndoBuffer, UndoBufferConfig, UndoError};
pub use item::{ActionUndoItem, UndoBufferItem};

/// Register a single-undo-action item with the application's undo buffer.
pub fn add_undo_action(
    app: &Arc<AppContext>,
    context: &ActionContextHandle,
    tag: &str,
    undo: ActionHandle,
    redo: ActionHandle,
) -> Result<(), UndoError> {
    app.undo_buffer()
        .add_undo_action(context, tag, vec![undo], redo)
}

/// Two undo actions, played back in order.
pub fn add_undo_action2(
    app: &Arc<AppContext>,
    context: &ActionContextHandle,
    tag: &str,
    undo1: ActionHandle,
    undo2: ActionHandle,
    redo: ActionHandle,
) -> Result<(), UndoError> {
    app.undo_buffer()
        .add_undo_action(context, tag, vec![undo1, undo2], redo)
}

/// Three undo actions, played back in order.
pub fn add_undo_action3(
    app: &Arc<AppContext>,
    context: &ActionContextHandle,
    tag: &str,
    undo1: ActionHandle,
    undo2: ActionHandle,
    undo3: ActionHandle,
    redo: ActionHandle,
) -> Result<(), UndoError> {
    app.undo_buffer()
        .add_undo_action(context, tag, vec![undo1, undo2, undo3], redo)
}
