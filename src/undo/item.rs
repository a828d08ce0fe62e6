// Undo buffer items - tagged bundles of reversal actions

use crate::action::trait_def::{ActionHandle, ActionHandleList, ActionProperties};

/// One entry in the undo history.
///
/// The buffer only needs the tag for menu labels, the byte size for
/// eviction, and the two playback directions; richer items (layer
/// checkpoints with bulk volume data) implement this trait and account
/// their captured data in `byte_size`.
pub trait UndoBufferItem: Send {
    /// Label shown to the user ("Undo Paint Stroke"). Never empty.
    fn tag(&self) -> &str;

    /// Byte cost of keeping this item, computed once at insertion.
    fn byte_size(&self) -> usize;

    /// Actions that reverse the effect, in playback order.
    fn undo_actions(&self) -> &[ActionHandle];

    /// The action that re-executes the forward effect.
    fn redo_action(&self) -> &ActionHandle;

    /// Attempt to absorb a newer item instead of letting it become its own
    /// entry (slider-drag coalescing). Default: never.
    fn try_absorb(&mut self, _other: &dyn UndoBufferItem) -> bool {
        false
    }
}

/// Standard undo item: 1..N undo actions plus exactly one redo action.
pub struct ActionUndoItem {
    tag: String,
    undo_actions: ActionHandleList,
    redo_action: ActionHandle,
    size: usize,
}

impl ActionUndoItem {
    pub fn new(tag: impl Into<String>, undo_actions: ActionHandleList, redo_action: ActionHandle) -> Self {
        let tag = tag.into();
        let size = compute_size(&tag, &undo_actions, &redo_action);
        Self {
            tag,
            undo_actions,
            redo_action,
            size,
        }
    }
}

fn compute_size(tag: &str, undo_actions: &[ActionHandle], redo_action: &ActionHandle) -> usize {
    std::mem::size_of::<ActionUndoItem>()
        + tag.len()
        + undo_actions.iter().map(|a| a.byte_size()).sum::<usize>()
        + redo_action.byte_size()
}

impl UndoBufferItem for ActionUndoItem {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn byte_size(&self) -> usize {
        self.size
    }

    fn undo_actions(&self) -> &[ActionHandle] {
        &self.undo_actions
    }

    fn redo_action(&self) -> &ActionHandle {
        &self.redo_action
    }

    /// Absorb `other` when both redo actions are mergeable and target the
    /// same merge key under the same tag. The newer redo action replaces
    /// ours; the captured undo actions (the oldest pre-state) are kept.
    fn try_absorb(&mut self, other: &dyn UndoBufferItem) -> bool {
        if self.tag != other.tag() {
            return false;
        }

        let mine = &self.redo_action;
        let theirs = other.redo_action();
        if !mine.properties().contains(ActionProperties::MERGEABLE)
            || !theirs.properties().contains(ActionProperties::MERGEABLE)
        {
            return false;
        }

        match (mine.merge_key(), theirs.merge_key()) {
            (Some(a), Some(b)) if a == b => {
                self.redo_action = theirs.clone();
                self.size = compute_size(&self.tag, &self.undo_actions, &self.redo_action);
                true
            }
            _ => false,
        }
    }
}
