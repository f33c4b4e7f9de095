//! Konfigurasi queue
//!
//! Semua nilai immutable setelah queue dibangun; arena tidak pernah di-resize.

use crate::error::QueueError;
use crate::protocol::{ENTRY_ALIGN, HEADER_SIZE};

/// Parameter konstruksi untuk [`SyncQueue`](crate::SyncQueue).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    /// Kapasitas arena dalam bytes.
    ///
    /// Default: 4096. Harus cukup untuk entry terbesar yang akan diproduksi.
    pub capacity: usize,

    /// Threshold jumlah entry untuk event tambahan. `None` = nonaktif.
    pub additional_limit: Option<usize>,

    /// Kunci halaman arena di RAM (`mlock`) agar tidak pernah di-swap.
    pub lock_pages: bool,
}

impl QueueConfig {
    /// Kapasitas default arena (4KB).
    pub const DEFAULT_CAPACITY: usize = 0x1000;

    /// Kapasitas minimum: satu header plus payload terkecil.
    pub const MIN_CAPACITY: usize = HEADER_SIZE + ENTRY_ALIGN;

    /// Membuat config dengan kapasitas tertentu, nilai lain default.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            additional_limit: None,
            lock_pages: false,
        }
    }

    /// Aktifkan threshold event tambahan pada `limit` entry.
    pub fn with_additional_limit(mut self, limit: usize) -> Self {
        self.additional_limit = Some(limit);
        self
    }

    /// Pin arena di RAM.
    pub fn with_locked_pages(mut self) -> Self {
        self.lock_pages = true;
        self
    }

    /// Validasi nilai config.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.capacity < Self::MIN_CAPACITY {
            return Err(QueueError::CapacityTooSmall {
                capacity: self.capacity,
                minimum: Self::MIN_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
