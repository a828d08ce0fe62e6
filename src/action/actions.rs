// Concrete core actions

use std::sync::Arc;

use crate::action::context::ActionContextHandle;
use crate::action::factory::{ActionFactory, quote_argument};
use crate::action::parameter::Variant;
use crate::action::trait_def::{
    Action, ActionError, ActionHandle, ActionKind, ActionProperties, ActionResult,
};
use crate::app::context::AppContext;

/// Write a value into a state variable.
///
/// The workhorse mutation: most interface widgets funnel through it. The
/// value is carried as whatever the producer had (typed, or text from the
/// command line) and is coerced to the variable's kind during validation.
/// Callers wanting reversibility capture the old value into an undo item
/// before posting.
pub struct ActionSet {
    state_id: String,
    value: Variant,
}

impl ActionSet {
    pub fn create(state_id: impl Into<String>, value: impl Into<Variant>) -> ActionHandle {
        Arc::new(Self {
            state_id: state_id.into(),
            value: value.into(),
        })
    }
}

impl Action for ActionSet {
    fn action_type(&self) -> &'static str {
        "set"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::APPLICATION
    }

    fn properties(&self) -> ActionProperties {
        ActionProperties::UNDOABLE | ActionProperties::MERGEABLE | ActionProperties::QUEUEABLE
    }

    fn usage(&self) -> String {
        "set <stateid> <value>".to_string()
    }

    fn validate(
        &self,
        app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<(), ActionError> {
        let Some(state) = app.state_engine().get_state(&self.state_id) else {
            return Err(ActionError::Invalid(format!(
                "Unknown state variable '{}'",
                self.state_id
            )));
        };
        self.value
            .coerce_to(state.kind())
            .map_err(|error| ActionError::Invalid(error.to_string()))?;
        Ok(())
    }

    fn run(
        &self,
        app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<ActionResult, ActionError> {
        let state = app
            .state_engine()
            .get_state(&self.state_id)
            .ok_or_else(|| {
                ActionError::Unavailable(format!(
                    "State variable '{}' is gone",
                    self.state_id
                ))
            })?;
        state
            .set(self.value.clone())
            .map_err(|error| ActionError::Failed(error.to_string()))?;
        Ok(None)
    }

    fn merge_key(&self) -> Option<String> {
        Some(format!("set:{}", self.state_id))
    }

    fn export_to_string(&self) -> String {
        format!(
            "set {} {}",
            quote_argument(&self.state_id),
            quote_argument(&self.value.to_canonical())
        )
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.state_id.capacity() + self.value.byte_size()
    }
}

/// Read a state variable; the value comes back as the action result.
pub struct ActionGet {
    state_id: String,
}

impl ActionGet {
    pub fn create(state_id: impl Into<String>) -> ActionHandle {
        Arc::new(Self {
            state_id: state_id.into(),
        })
    }
}

impl Action for ActionGet {
    fn action_type(&self) -> &'static str {
        "get"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::APPLICATION
    }

    fn properties(&self) -> ActionProperties {
        ActionProperties::QUEUEABLE
    }

    fn usage(&self) -> String {
        "get <stateid>".to_string()
    }

    fn validate(
        &self,
        app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<(), ActionError> {
        if app.state_engine().get_state(&self.state_id).is_none() {
            return Err(ActionError::Invalid(format!(
                "Unknown state variable '{}'",
                self.state_id
            )));
        }
        Ok(())
    }

    fn run(
        &self,
        app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<ActionResult, ActionError> {
        let state = app
            .state_engine()
            .get_state(&self.state_id)
            .ok_or_else(|| {
                ActionError::Unavailable(format!(
                    "State variable '{}' is gone",
                    self.state_id
                ))
            })?;
        Ok(Some(state.get()))
    }

    fn export_to_string(&self) -> String {
        format!("get {}", quote_argument(&self.state_id))
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.state_id.capacity()
    }
}

/// Step the undo history back by one item.
pub struct ActionUndo;

impl ActionUndo {
    pub fn create() -> ActionHandle {
        Arc::new(Self)
    }
}

impl Action for ActionUndo {
    fn action_type(&self) -> &'static str {
        "undo"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::APPLICATION
    }

    fn usage(&self) -> String {
        "undo".to_string()
    }

    fn validate(
        &self,
        app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<(), ActionError> {
        if !app.undo_buffer().has_undo() {
            return Err(ActionError::Unavailable("Undo list is empty".to_string()));
        }
        Ok(())
    }

    fn run(
        &self,
        app: &Arc<AppContext>,
        context: &ActionContextHandle,
    ) -> Result<ActionResult, ActionError> {
        app.undo_buffer()
            .undo(app, context)
            .map_err(|error| ActionError::Failed(error.to_string()))?;
        Ok(None)
    }

    fn export_to_string(&self) -> String {
        "undo".to_string()
    }
}

/// Step the undo history forward by one item.
pub struct ActionRedo;

impl ActionRedo {
    pub fn create() -> ActionHandle {
        Arc::new(Self)
    }
}

impl Action for ActionRedo {
    fn action_type(&self) -> &'static str {
        "redo"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::APPLICATION
    }

    fn usage(&self) -> String {
        "redo".to_string()
    }

    fn validate(
        &self,
        app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<(), ActionError> {
        if !app.undo_buffer().has_redo() {
            return Err(ActionError::Unavailable("Redo list is empty".to_string()));
        }
        Ok(())
    }

    fn run(
        &self,
        app: &Arc<AppContext>,
        context: &ActionContextHandle,
    ) -> Result<ActionResult, ActionError> {
        app.undo_buffer()
            .redo(app, context)
            .map_err(|error| ActionError::Failed(error.to_string()))?;
        Ok(None)
    }

    fn export_to_string(&self) -> String {
        "redo".to_string()
    }
}

/// Drop the entire undo history, both directions ("new project").
pub struct ActionClearUndoBuffer;

impl ActionClearUndoBuffer {
    pub fn create() -> ActionHandle {
        Arc::new(Self)
    }
}

impl Action for ActionClearUndoBuffer {
    fn action_type(&self) -> &'static str {
        "clear_undo_buffer"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::APPLICATION
    }

    fn usage(&self) -> String {
        "clear_undo_buffer".to_string()
    }

    fn run(
        &self,
        app: &Arc<AppContext>,
        _context: &ActionContextHandle,
    ) -> Result<ActionResult, ActionError> {
        app.undo_buffer().reset();
        Ok(None)
    }

    fn export_to_string(&self) -> String {
        "clear_undo_buffer".to_string()
    }
}

fn expect_arguments(arguments: &[String], count: usize) -> Result<(), String> {
    if arguments.len() == count {
        Ok(())
    } else {
        Err(format!(
            "expected {count} argument{}, got {}",
            if count == 1 { "" } else { "s" },
            arguments.len()
        ))
    }
}

/// Register the builtin actions with a factory.
pub fn register_core_actions(factory: &ActionFactory) {
    factory.register("set", "set <stateid> <value>", |arguments| {
        expect_arguments(arguments, 2)?;
        Ok(ActionSet::create(
            arguments[0].clone(),
            Variant::Text(arguments[1].clone()),
        ))
    });
    factory.register("get", "get <stateid>", |arguments| {
        expect_arguments(arguments, 1)?;
        Ok(ActionGet::create(arguments[0].clone()))
    });
    factory.register("undo", "undo", |arguments| {
        expect_arguments(arguments, 0)?;
        Ok(ActionUndo::create())
    });
    factory.register("redo", "redo", |arguments| {
        expect_arguments(arguments, 0)?;
        Ok(ActionRedo::create())
    });
    factory.register("clear_undo_buffer", "clear_undo_buffer", |arguments| {
        expect_arguments(arguments, 0)?;
        Ok(ActionClearUndoBuffer::create())
    });
}
