// End-to-end undo/redo through the dispatcher: posted actions, replay
// tagging, provenance recording, and the command-string surface.

use std::sync::{Arc, Mutex};

use voxseg::action::actions::{ActionRedo, ActionSet, ActionUndo};
use voxseg::action::context::{
    ActionContext, ActionContextHandle, ActionSource, ActionStatus, DefaultContext,
    NotificationContext,
};
use voxseg::action::parameter::Variant;
use voxseg::app::context::AppContext;
use voxseg::messaging::channels::create_notification_channel;
use voxseg::messaging::notification::NotificationLevel;
use voxseg::undo::add_undo_action;

fn context() -> ActionContextHandle {
    Arc::new(DefaultContext::default())
}

/// Post a reversible set: capture the undo item around the forward action,
/// then run the forward action through the dispatcher.
fn post_reversible_set(
    app: &Arc<AppContext>,
    tag: &str,
    state_id: &str,
    old: i64,
    new: i64,
) {
    let posting_context = context();
    add_undo_action(
        app,
        &posting_context,
        tag,
        ActionSet::create(state_id, old),
        ActionSet::create(state_id, new),
    )
    .unwrap();
    app.post_and_wait_action(ActionSet::create(state_id, new), posting_context);
}

#[test]
fn undo_and_redo_round_trip_through_dispatcher() {
    let app = AppContext::new();
    let value = app.state_engine().add_state("layer_1:opacity", Variant::Int(0));

    for step in 1..=4i64 {
        post_reversible_set(&app, &format!("Opacity {step}"), "layer_1:opacity", step - 1, step);
    }
    assert_eq!(value.get(), Variant::Int(4));
    assert_eq!(app.undo_buffer().get_undo_tag(), "Opacity 4");

    for _ in 0..4 {
        app.post_and_wait_action(ActionUndo::create(), context());
    }
    assert_eq!(value.get(), Variant::Int(0));
    assert!(!app.undo_buffer().has_undo());

    for _ in 0..4 {
        app.post_and_wait_action(ActionRedo::create(), context());
    }
    assert_eq!(value.get(), Variant::Int(4));
    assert!(!app.undo_buffer().has_redo());
    assert_eq!(app.undo_buffer().num_undo_items(), 4);
    app.shutdown();
}

#[test]
fn undo_on_empty_history_reports_unavailable() {
    let app = AppContext::new();

    let reporting = Arc::new(DefaultContext::default());
    app.post_and_wait_action(ActionUndo::create(), reporting.clone());

    assert_eq!(reporting.status(), ActionStatus::Unavailable);
    assert_eq!(reporting.done(), Some(false));
    app.shutdown();
}

#[test]
fn provenance_skips_replayed_actions() {
    let app = AppContext::new();
    app.state_engine().add_state("layer_1:opacity", Variant::Int(0));

    post_reversible_set(&app, "Opacity", "layer_1:opacity", 0, 1);
    let after_forward = app.history().len();

    app.post_and_wait_action(ActionUndo::create(), context());
    app.post_and_wait_action(ActionRedo::create(), context());

    // The undo and redo requests themselves are fresh user activity and are
    // recorded; the replayed set actions are not.
    assert_eq!(app.history().len(), after_forward + 2);
    let latest = app.history().latest().unwrap();
    assert_eq!(latest.action_string, "redo");

    // The replayed set ran under the undo-buffer source, invisible here, so
    // no entry for it carries that source.
    for index in 0..app.history().len() {
        let entry = app.history().entry(index).unwrap();
        assert_ne!(entry.source, ActionSource::UndoBuffer);
    }
    app.shutdown();
}

#[test]
fn command_strings_drive_the_same_pipeline() {
    let app = AppContext::new();
    let name = app
        .state_engine()
        .add_state("project:name", Variant::Text("untitled".to_string()));

    let reporting = Arc::new(DefaultContext::default());
    assert!(app.post_and_wait_action_string(r#"set project:name "Left Atrium""#, reporting.clone()));
    assert_eq!(name.get(), Variant::Text("Left Atrium".to_string()));
    assert_eq!(reporting.done(), Some(true));

    // Results flow back through the context
    let query = Arc::new(DefaultContext::default());
    assert!(app.post_and_wait_action_string("get project:name", query.clone()));
    assert_eq!(query.result(), Some(Variant::Text("Left Atrium".to_string())));
    app.shutdown();
}

#[test]
fn invalid_command_strings_never_dispatch() {
    let app = AppContext::new();
    let history_before = app.history().len();

    // Unknown action name
    assert!(!app.post_and_wait_action_string("levitate now", context()));
    // Known action, wrong argument count
    assert!(!app.post_and_wait_action_string("set project:name", context()));

    assert_eq!(app.history().len(), history_before);
    app.shutdown();
}

#[test]
fn typed_coercion_happens_at_validation() {
    let app = AppContext::new();
    let slice = app.state_engine().add_state("view:slice", Variant::Int(3));

    // Text argument lands in an Int variable
    assert!(app.post_and_wait_action_string("set view:slice 12", context()));
    assert_eq!(slice.get(), Variant::Int(12));

    // Unconvertible text fails validation, state untouched
    let reporting = Arc::new(DefaultContext::default());
    assert!(app.post_and_wait_action_string("set view:slice sideways", reporting.clone()));
    assert_eq!(reporting.status(), ActionStatus::Invalid);
    assert_eq!(slice.get(), Variant::Int(12));
    app.shutdown();
}

#[test]
fn disabling_undo_preference_clears_history() {
    let app = AppContext::new();
    app.state_engine().add_state("layer_1:opacity", Variant::Int(0));

    post_reversible_set(&app, "Opacity", "layer_1:opacity", 0, 1);
    assert!(app.undo_buffer().has_undo());

    // The preference is a state variable like any other
    app.post_and_wait_action(
        ActionSet::create("preferences:enable_undo", false),
        context(),
    );
    assert!(!app.undo_buffer().has_undo());
    assert!(!app.undo_buffer().is_enabled());
    app.shutdown();
}

#[test]
fn failures_surface_on_the_notification_channel() {
    let app = AppContext::new();
    let (producer, mut consumer) = create_notification_channel(16);
    let ui_context: ActionContextHandle = Arc::new(NotificationContext::new(
        ActionSource::Interface,
        Arc::new(Mutex::new(producer)),
    ));

    // Unknown state variable: validation failure reported into the channel
    app.post_and_wait_action(ActionSet::create("no:such:state", 1), ui_context);

    let notification = ringbuf::traits::Consumer::try_pop(&mut consumer)
        .expect("validation failure must surface as a notification");
    assert_eq!(notification.level, NotificationLevel::Error);
    assert!(notification.message.contains("no:such:state"));
    app.shutdown();
}
