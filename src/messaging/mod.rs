// Cross-thread plumbing
//
// The core runs every mutation on one application thread. Everything in this
// module exists to get work and results across that boundary safely:
// - event: the serial FIFO queue the application thread drains, plus the
//   rendezvous used by blocking posts
// - signal: observer callback lists for pre/post action, tag and state
//   change notifications
// - channels + notification: a lock-free ringbuffer carrying severity-tagged
//   messages to a polling UI thread

pub mod channels;
pub mod event;
pub mod notification;
pub mod signal;

pub use channels::{NotificationConsumer, NotificationProducer, create_notification_channel};
pub use event::{Event, EventQueue, EventSync};
pub use notification::{Notification, NotificationCategory, NotificationLevel};
pub use signal::{ConnectionId, Signal};
