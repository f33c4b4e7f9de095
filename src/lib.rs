//! Polyq - Fixed-Capacity Polymorphic MPMC Queue
//!
//! Arsitektur:
//! - Type-Erased Entries: nilai heterogen disimpan inline di arena, diakses via satu interface
//! - Wrap-Around Arena: byte ring dengan protokol terminator, tanpa alokasi per item
//! - Monitor-Based Blocking: satu lock + event `ready` dan event backpressure opsional
//!
//! ```
//! use std::sync::Arc;
//! use polyq::{impl_upcast, Event, Monitor, SyncQueue};
//!
//! trait Sample {
//!     fn value(&self) -> u64;
//! }
//!
//! struct Tick(u64);
//!
//! impl Sample for Tick {
//!     fn value(&self) -> u64 {
//!         self.0
//!     }
//! }
//!
//! impl_upcast!(dyn Sample => Tick);
//!
//! let monitor = Monitor::shared();
//! let ready = Arc::new(Event::new(&monitor));
//! let queue: SyncQueue<dyn Sample> = SyncQueue::new(ready).unwrap();
//!
//! queue.produce(Tick(7));
//!
//! let mut seen = 0;
//! assert!(queue.consume(|sample| seen = sample.value()));
//! assert_eq!(seen, 7);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use config::QueueConfig;
pub use error::QueueError;
pub use protocol::{Upcast, ENTRY_ALIGN, HEADER_SIZE};
pub use sync::{BlockingEvent, Event, Monitor, MonitorGuard, SyncQueue};
