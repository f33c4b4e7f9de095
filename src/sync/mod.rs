//! Sync module: Blocking MPMC Queue
//!
//! - `event`: monitor (satu mutex) + event blocking yang terikat padanya
//! - `queue`: `SyncQueue` di atas `RingBuffer`, block saat kosong atau di threshold

mod event;
mod queue;

pub use event::{BlockingEvent, Event, Monitor, MonitorGuard};
pub use queue::SyncQueue;
