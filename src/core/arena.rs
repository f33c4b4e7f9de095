//! Mmap-Backed Byte Arena
//!
//! Region memori anonim yang di-mmap sekali saat init:
//! - Page-aligned: base memenuhi alignment entry apapun
//! - Zero-filled: setiap byte sudah terinisialisasi sejak awal
//! - Fixed: tidak pernah di-resize atau di-remap
//!
//! Semua akses memakai offset relatif arena, bukan alamat mentah.

use std::io;

use memmap2::MmapMut;
use tracing::debug;

/// Byte arena dengan kapasitas tetap `[0, len)`.
pub struct Arena {
    mmap: MmapMut,
}

impl Arena {
    /// Membuat arena baru dengan kapasitas `capacity` bytes.
    ///
    /// Alokasi hanya terjadi sekali di sini.
    pub fn new(capacity: usize) -> io::Result<Self> {
        if capacity == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "arena capacity must be non-zero",
            ));
        }

        let mmap = MmapMut::map_anon(capacity)?;
        debug!(capacity, "arena mapped");

        Ok(Self { mmap })
    }

    /// Kapasitas arena dalam bytes (posisi `end`).
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Selalu `false`: arena kosong ditolak saat konstruksi.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Kunci halaman arena di RAM supaya hot path tidak pernah page-fault.
    #[cfg(unix)]
    pub fn lock_pages(&self) -> io::Result<()> {
        // SAFETY: range [ptr, ptr + len) adalah mapping milik self
        let rc = unsafe { libc::mlock(self.mmap.as_ptr().cast::<libc::c_void>(), self.len()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(bytes = self.len(), "arena pages locked");
        Ok(())
    }

    #[cfg(not(unix))]
    pub fn lock_pages(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "page locking is only supported on unix",
        ))
    }

    /// Pointer read-only ke byte di `offset`.
    #[inline(always)]
    pub(crate) fn as_ptr(&self, offset: usize) -> *const u8 {
        debug_assert!(offset <= self.len());
        // SAFETY: offset <= len, masih di dalam (atau tepat di ujung) mapping
        unsafe { self.mmap.as_ptr().add(offset) }
    }

    /// Pointer mutable ke byte di `offset`.
    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self, offset: usize) -> *mut u8 {
        debug_assert!(offset <= self.len());
        // SAFETY: lihat as_ptr()
        unsafe { self.mmap.as_mut_ptr().add(offset) }
    }

    #[cfg(test)]
    pub(crate) fn fill(&mut self, byte: u8) {
        self.mmap.fill(byte);
    }

    #[cfg(test)]
    pub(crate) fn byte_at(&self, offset: usize) -> u8 {
        self.mmap[offset]
    }
}
