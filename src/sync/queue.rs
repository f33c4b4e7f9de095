//! Synchronous Polymorphic Queue
//!
//! Produsen tidak pernah block. Konsumen block pada:
//! - event `ready` selama queue kosong dan masih running
//! - event tambahan (opsional) saat jumlah entry tepat di `additional_limit`
//!
//! `stop()` bersifat kooperatif: entry yang tersisa tetap bisa dikonsumsi,
//! hanya consume pada queue kosong yang langsung return `false`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::event::{BlockingEvent, Event, MonitorGuard};
use crate::config::QueueConfig;
use crate::core::{Arena, RingBuffer};
use crate::error::QueueError;
use crate::protocol::Upcast;

/// Pasangan threshold + event tambahan.
struct Threshold<E> {
    limit: usize,
    event: Arc<E>,
}

/// Queue MPMC polimorfik dengan kapasitas arena tetap.
///
/// Semua event (ready dan tambahan) berbagi satu [`Monitor`](super::Monitor);
/// monitor itu juga yang menjaga cursor ring buffer.
pub struct SyncQueue<T: ?Sized + 'static, E: BlockingEvent = Event> {
    ring: RingBuffer<T>,
    ready: Arc<E>,
    threshold: Option<Threshold<E>>,
    running: AtomicBool,
}

impl<T: ?Sized + 'static, E: BlockingEvent> SyncQueue<T, E> {
    /// Membuat queue dengan config default (arena 4KB, tanpa threshold).
    pub fn new(ready: Arc<E>) -> Result<Self, QueueError> {
        Self::with_config(QueueConfig::default(), ready, None)
    }

    /// Membuat queue dengan config eksplisit.
    ///
    /// `additional` wajib ada jika `config.additional_limit` aktif, dan harus
    /// terikat ke monitor yang sama dengan `ready`.
    pub fn with_config(
        config: QueueConfig,
        ready: Arc<E>,
        additional: Option<Arc<E>>,
    ) -> Result<Self, QueueError> {
        config.validate()?;

        let threshold = match (config.additional_limit, additional) {
            (Some(limit), Some(event)) => {
                if !Arc::ptr_eq(event.monitor(), ready.monitor()) {
                    return Err(QueueError::MonitorMismatch);
                }
                Some(Threshold { limit, event })
            }
            (Some(limit), None) => return Err(QueueError::MissingAdditionalEvent { limit }),
            (None, Some(_)) => {
                warn!("additional event supplied without an additional limit, ignoring it");
                None
            }
            (None, None) => None,
        };

        let arena = Arena::new(config.capacity)?;
        if config.lock_pages {
            arena.lock_pages()?;
        }

        debug!(
            capacity = config.capacity,
            additional_limit = ?config.additional_limit,
            "queue created"
        );

        Ok(Self {
            ring: RingBuffer::new(Arc::clone(ready.monitor()), arena),
            ready,
            threshold,
            running: AtomicBool::new(true),
        })
    }

    /// Produce nilai (move). Tidak pernah block.
    ///
    /// # Panics
    /// Panic jika entry lebih besar dari arena, atau arena penuh oleh entry
    /// yang belum dikonsumsi.
    pub fn produce<F: Upcast<T> + Send + 'static>(&self, value: F) {
        let mut guard = self.ring.monitor().lock();
        self.ring
            .produce(&mut guard, value, |_, n| self.notify_produced(n));
    }

    /// Produce tanpa panic: return `Err(value)` jika arena sedang penuh.
    pub fn try_produce<F: Upcast<T> + Send + 'static>(&self, value: F) -> Result<(), F> {
        let mut guard = self.ring.monitor().lock();
        self.ring
            .try_produce(&mut guard, value, |_, n| self.notify_produced(n))
    }

    /// Produce salinan `value`.
    pub fn produce_clone<F: Upcast<T> + Clone + Send + 'static>(&self, value: &F) {
        let mut guard = self.ring.monitor().lock();
        self.ring
            .produce_clone(&mut guard, value, |_, n| self.notify_produced(n));
    }

    #[inline]
    fn notify_produced(&self, before: usize) {
        if before == 0 {
            self.ready.signal();
        }
        if let Some(threshold) = &self.threshold {
            if before == threshold.limit {
                // Event bisa dibagi beberapa queue
                threshold.event.signal_all();
            }
        }
    }

    /// Consume entry terdepan; block selama queue kosong dan running.
    ///
    /// `callback` dipanggil sinkron dengan nilai di arena; referensi tidak
    /// boleh keluar dari callback.
    ///
    /// Returns `false` hanya jika queue kosong dan sudah di-stop.
    pub fn consume<C: FnOnce(&mut T)>(&self, callback: C) -> bool {
        let mut guard = self.ring.monitor().lock();
        let consumed = self
            .ring
            .consume(&mut guard, callback, |guard, n| self.await_turn(guard, n));

        // Oper giliran ke konsumen lain yang mungkin masih menunggu
        if consumed && !self.ring.is_empty(&mut guard) {
            self.ready.signal();
        }
        consumed
    }

    fn await_turn(&self, guard: &mut MonitorGuard<'_>, mut n: usize) -> bool {
        let mut threshold_passed = false;
        loop {
            if n == 0 {
                if !self.is_running() {
                    return false;
                }
                self.ready.wait(guard);
            } else if let Some(threshold) = self
                .threshold
                .as_ref()
                .filter(|t| !threshold_passed && n == t.limit)
            {
                let seen = threshold.event.generation();
                while threshold.event.generation() == seen && self.is_running() {
                    threshold.event.wait(guard);
                }
                threshold_passed = true;
            } else {
                return true;
            }
            n = self.ring.len(guard);
        }
    }

    /// Hentikan queue. Idempotent.
    ///
    /// Semua konsumen yang sedang block dibangunkan; entry yang tersisa tidak
    /// dibuang.
    pub fn stop(&self) {
        let _guard = self.ring.monitor().lock();
        if self.running.swap(false, Ordering::AcqRel) {
            debug!("queue stopped");
        }
        self.ready.broadcast();
        if let Some(threshold) = &self.threshold {
            threshold.event.broadcast();
        }
    }

    #[inline(always)]
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Cek apakah `stop()` sudah dipanggil
    #[inline]
    pub fn is_stopped(&self) -> bool {
        !self.is_running()
    }

    /// Jumlah entry yang belum dikonsumsi.
    pub fn len(&self) -> usize {
        let mut guard = self.ring.monitor().lock();
        self.ring.len(&mut guard)
    }

    /// Cek apakah queue kosong
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cek apakah entry bertipe `F` bisa diproduksi sekarang tanpa panic.
    pub fn has_room<F>(&self) -> bool {
        let mut guard = self.ring.monitor().lock();
        self.ring.has_room::<F>(&mut guard)
    }

    /// Kapasitas arena dalam bytes
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Threshold event tambahan, jika aktif.
    #[inline]
    pub fn additional_limit(&self) -> Option<usize> {
        self.threshold.as_ref().map(|t| t.limit)
    }
}
