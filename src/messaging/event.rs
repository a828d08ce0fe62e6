// Serial event queue for the application thread
//
// Producers from any thread push units of work; one consumer thread drains
// them in FIFO order. An event may carry a rendezvous handle so the poster
// can block until its work has run. This is the only blocking primitive in
// the core.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

type Work = Box<dyn FnOnce() + Send + 'static>;

/// Rendezvous between a posting thread and the consuming thread.
///
/// The poster waits on the condition variable; the consumer signals after
/// the event's work has returned.
pub struct EventSync {
    completed: Mutex<bool>,
    condvar: Condvar,
}

impl EventSync {
    pub fn new() -> Self {
        Self {
            completed: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Block until `signal()` has been called. Returns immediately if it
    /// already was.
    pub fn wait(&self) {
        let mut completed = self.completed.lock().expect("event sync poisoned");
        while !*completed {
            completed = self
                .condvar
                .wait(completed)
                .expect("event sync poisoned");
        }
    }

    pub fn signal(&self) {
        let mut completed = self.completed.lock().expect("event sync poisoned");
        *completed = true;
        self.condvar.notify_all();
    }
}

impl Default for EventSync {
    fn default() -> Self {
        Self::new()
    }
}

/// One queued unit of work, optionally carrying a rendezvous handle.
pub struct Event {
    work: Work,
    sync: Option<std::sync::Arc<EventSync>>,
}

impl Event {
    pub fn new(work: impl FnOnce() + Send + 'static) -> Self {
        Self {
            work: Box::new(work),
            sync: None,
        }
    }

    pub fn with_sync(
        work: impl FnOnce() + Send + 'static,
        sync: std::sync::Arc<EventSync>,
    ) -> Self {
        Self {
            work: Box::new(work),
            sync: Some(sync),
        }
    }

    /// Run the work and release any waiting poster.
    fn handle(self) {
        (self.work)();
        if let Some(sync) = self.sync {
            sync.signal();
        }
    }
}

struct QueueInner {
    queue: VecDeque<Event>,
    done: bool,
}

/// FIFO queue drained by exactly one thread.
///
/// `post()` is non-blocking and callable from any thread, including the
/// consumer itself. Events posted after `terminate()` are dropped.
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    new_event: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                queue: VecDeque::new(),
                done: false,
            }),
            new_event: Condvar::new(),
        }
    }

    /// Returns false when the queue has been terminated and the event was
    /// dropped.
    pub fn post(&self, event: Event) -> bool {
        let mut inner = self.inner.lock().expect("event queue poisoned");
        if inner.done {
            log::warn!("event posted after queue termination; dropped");
            return false;
        }
        inner.queue.push_back(event);
        self.new_event.notify_all();
        true
    }

    /// Block until at least one event is available (or the queue has been
    /// terminated), then drain everything currently queued. Returns true
    /// once the queue has been terminated and fully drained.
    ///
    /// Must only be called from the consuming thread; the queue lock is
    /// dropped around each event so handlers can post follow-up events.
    pub fn wait_and_process(&self) -> bool {
        let mut inner = self.inner.lock().expect("event queue poisoned");
        while inner.queue.is_empty() && !inner.done {
            inner = self
                .new_event
                .wait(inner)
                .expect("event queue poisoned");
        }

        while let Some(event) = inner.queue.pop_front() {
            drop(inner);
            event.handle();
            inner = self.inner.lock().expect("event queue poisoned");
        }

        inner.done
    }

    /// Mark the queue as done and wake the consumer. Idempotent.
    pub fn terminate(&self) {
        let mut inner = self.inner.lock().expect("event queue poisoned");
        if inner.done {
            return;
        }
        inner.done = true;
        self.new_event.notify_all();
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.lock().expect("event queue poisoned").done
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_events_run_in_post_order() {
        let queue = Arc::new(EventQueue::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        for index in 0..10 {
            let order_clone = Arc::clone(&order);
            queue.post(Event::new(move || {
                order_clone.lock().unwrap().push(index);
            }));
        }
        queue.terminate();

        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || while !queue.wait_and_process() {})
        };
        consumer.join().unwrap();

        assert_eq!(*order.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_sync_releases_poster() {
        let queue = Arc::new(EventQueue::new());
        let ran = Arc::new(AtomicUsize::new(0));

        let consumer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || while !queue.wait_and_process() {})
        };

        let sync = Arc::new(EventSync::new());
        let ran_clone = Arc::clone(&ran);
        queue.post(Event::with_sync(
            move || {
                ran_clone.fetch_add(1, Ordering::SeqCst);
            },
            Arc::clone(&sync),
        ));

        sync.wait();
        assert_eq!(ran.load(Ordering::SeqCst), 1);

        queue.terminate();
        consumer.join().unwrap();
    }

    #[test]
    fn test_post_after_terminate_is_dropped() {
        let queue = EventQueue::new();
        queue.terminate();
        queue.post(Event::new(|| panic!("must not run")));
        assert!(queue.wait_and_process());
    }
}
