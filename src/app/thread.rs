// The application thread - sole executor of committed state mutations

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};

use crate::messaging::event::{Event, EventQueue, EventSync};

/// Owns the one thread allowed to mutate committed application state.
///
/// All other threads are producers: they hand work over via `post` (fire
/// and forget) or `post_and_wait` (blocking rendezvous). Work executes in
/// FIFO post order, one unit at a time.
pub struct ApplicationThread {
    queue: Arc<EventQueue>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl ApplicationThread {
    /// Spawn the application thread and start draining its queue.
    pub fn start() -> Self {
        let queue = Arc::new(EventQueue::new());
        let worker_queue = Arc::clone(&queue);
        let handle = thread::Builder::new()
            .name("application".to_string())
            .spawn(move || while !worker_queue.wait_and_process() {})
            .expect("failed to spawn the application thread");
        let thread_id = handle.thread().id();

        Self {
            queue,
            handle: Mutex::new(Some(handle)),
            thread_id,
        }
    }

    /// Whether the calling thread is the application thread.
    pub fn is_application_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Enqueue work; returns immediately. Callable from any thread,
    /// including the application thread itself. Returns false when the
    /// thread has been terminated and the work was dropped.
    pub fn post(&self, work: impl FnOnce() + Send + 'static) -> bool {
        self.queue.post(Event::new(work))
    }

    /// Enqueue work and block until it has run.
    ///
    /// # Panics
    /// Panics when called from the application thread itself: the thread
    /// cannot both wait for and service its own queue, so this is a
    /// deadlock by construction and is rejected instead of hanging.
    pub fn post_and_wait(&self, work: impl FnOnce() + Send + 'static) -> bool {
        if self.is_application_thread() {
            panic!(
                "post_and_wait cannot be called from the thread that processes \
                 the events; this would lead to a deadlock"
            );
        }

        let sync = Arc::new(EventSync::new());
        if !self.queue.post(Event::with_sync(work, Arc::clone(&sync))) {
            return false;
        }
        sync.wait();
        true
    }

    /// Stop accepting work, drain what is queued, and join the thread.
    /// Idempotent; a no-op join when called from the application thread
    /// itself.
    pub fn terminate(&self) {
        self.queue.terminate();
        if self.is_application_thread() {
            return;
        }
        if let Some(handle) = self.handle.lock().expect("thread handle poisoned").take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ApplicationThread {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_work_runs_on_application_thread() {
        let app_thread = Arc::new(ApplicationThread::start());
        assert!(!app_thread.is_application_thread());

        let witness = Arc::new(AtomicUsize::new(0));
        let witness_clone = Arc::clone(&witness);
        let remote = Arc::clone(&app_thread);
        app_thread.post_and_wait(move || {
            assert!(remote.is_application_thread());
            witness_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(witness.load(Ordering::SeqCst), 1);
        app_thread.terminate();
    }

    #[test]
    fn test_post_preserves_fifo_order() {
        let app_thread = ApplicationThread::start();
        let order = Arc::new(Mutex::new(Vec::new()));

        for index in 0..20 {
            let order_clone = Arc::clone(&order);
            app_thread.post(move || order_clone.lock().unwrap().push(index));
        }
        app_thread.terminate();

        assert_eq!(*order.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_terminate_is_idempotent() {
        let app_thread = ApplicationThread::start();
        app_thread.terminate();
        app_thread.terminate();
        assert!(!app_thread.post(|| {}));
    }
}
