// Headless console for the voxseg core
//
// Reads commands from stdin and posts them through the dispatcher, one per
// line. This is the same path a socket or scripting frontend would use;
// reports come back through a context that prints to stdout.

use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex};

use voxseg::action::context::{ActionContext, ActionSource, ActionStatus, Notifier};
use voxseg::action::parameter::Variant;
use voxseg::app::context::AppContext;
use voxseg::config::preferences::Preferences;

/// Context that prints reports to stdout for interactive use.
struct ConsoleContext {
    status: Mutex<ActionStatus>,
    notifier: Mutex<Option<Arc<Notifier>>>,
}

impl ConsoleContext {
    fn new() -> Self {
        Self {
            status: Mutex::new(ActionStatus::default()),
            notifier: Mutex::new(None),
        }
    }

    fn take_notifier(&self) -> Option<Arc<Notifier>> {
        self.notifier.lock().expect("console context poisoned").take()
    }
}

impl ActionContext for ConsoleContext {
    fn source(&self) -> ActionSource {
        ActionSource::CommandLine
    }

    fn status(&self) -> ActionStatus {
        *self.status.lock().expect("console context poisoned")
    }

    fn report_status(&self, status: ActionStatus) {
        *self.status.lock().expect("console context poisoned") = status;
    }

    fn report_error(&self, error: &str) {
        println!("error: {error}");
    }

    fn report_warning(&self, warning: &str) {
        println!("warning: {warning}");
    }

    fn report_message(&self, message: &str) {
        println!("{message}");
    }

    fn report_usage(&self, usage: &str) {
        println!("usage: {usage}");
    }

    fn report_result(&self, result: &Variant) {
        println!("{result}");
    }

    fn report_done(&self, _success: bool) {}

    fn report_need_resource(&self, notifier: Arc<Notifier>) {
        *self.notifier.lock().expect("console context poisoned") = Some(notifier);
    }
}

fn main() {
    env_logger::init();

    let app = AppContext::with_preferences(Preferences::load());

    // A few demo variables so set/get have something to talk to
    let engine = app.state_engine();
    engine.add_state("project:name", Variant::Text("untitled".to_string()));
    engine.add_state("tool:brush_size", Variant::Real(4.0));
    engine.add_state("view:slice", Variant::Int(0));

    println!("voxseg console; commands: {}", app.factory().action_names().join(", "));
    println!("type 'quit' to exit");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        if command == "quit" || command == "exit" {
            break;
        }

        let context = Arc::new(ConsoleContext::new());
        app.post_and_wait_action_string(command, context.clone());

        // Asynchronous actions hand back a notifier; wait for the effect
        // here on the console thread, never on the application thread.
        if let Some(notifier) = context.take_notifier() {
            println!("waiting on {}...", notifier.name());
            notifier.wait();
        }
    }

    app.shutdown();
}
