//! Wrap-Around Polymorphic Ring Buffer
//!
//! Entry variable-length ditempatkan berurutan di arena; jika entry tidak
//! muat sebelum `end`, codec menulis terminator dan wrap ke awal.
//! Tidak ada lock internal: setiap operasi meminta `MonitorGuard` dari monitor
//! yang sama dengan event-event milik queue, sehingga hook boleh `wait`.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::error;

use super::Arena;
use crate::protocol::{entry_size, Placement, PolyEntry, Upcast};
use crate::sync::{Monitor, MonitorGuard};

/// State yang dijaga lock monitor.
struct RingState<T: ?Sized + 'static> {
    arena: Arena,
    // Posisi tulis berikutnya - hanya diubah produce
    write: usize,
    // Offset entry terdepan; selalu ternormalisasi selama live > 0
    read: usize,
    // Jumlah entry yang belum dikonsumsi
    live: usize,
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized + 'static> RingState<T> {
    /// Cek apakah entry `needed` bytes bisa ditulis tanpa menimpa entry hidup.
    fn has_room(&self, needed: usize) -> bool {
        if needed > self.arena.len() {
            return false;
        }
        if self.live == 0 {
            return true;
        }

        let (write, read) = (self.write, self.read);
        match Placement::plan(self.arena.len(), write, needed) {
            // Entry hidup ada di [read, write): ruang bebas [write, end)
            Placement::Here(_) if write > read => true,
            // Writer sudah wrap: ruang bebas hanya [write, read)
            Placement::Here(_) => write < read && write + needed <= read,
            // Wrap ke awal: [0, needed) harus bebas
            Placement::Wrap | Placement::TerminateAndWrap(_) => write > read && needed <= read,
        }
    }

    /// Destroy entry terdepan lalu normalisasi read ke entry berikutnya.
    ///
    /// # Safety
    /// `live > 0`.
    unsafe fn pop_front(&mut self) {
        PolyEntry::<T>::pop(&mut self.arena, &mut self.read);
        self.live -= 1;
        if self.live > 0 {
            self.read = PolyEntry::<T>::normalize(&self.arena, self.read);
        }
    }

    /// Catat entry yang baru saja di-push.
    fn committed(&mut self, was_empty: bool) {
        if was_empty {
            // SAFETY: read == posisi write sebelum push; di sana ada entry
            // baru, terminator, atau sisa ruang < header.
            self.read = unsafe { PolyEntry::<T>::normalize(&self.arena, self.read) };
        }
        self.live += 1;
    }
}

impl<T: ?Sized + 'static> Drop for RingState<T> {
    fn drop(&mut self) {
        while self.live > 0 {
            // SAFETY: live > 0 menjamin ada entry hidup di read cursor
            unsafe { self.pop_front() };
        }
    }
}

/// Ring buffer polimorfik dengan interface bersama `T`.
///
/// Kapasitas dalam bytes, tetap sejak konstruksi.
pub struct RingBuffer<T: ?Sized + 'static> {
    monitor: Arc<Monitor>,
    state: UnsafeCell<RingState<T>>,
    capacity: usize,
}

// SAFETY: RingBuffer aman untuk Send/Sync karena:
// - State hanya disentuh lewat state_mut(), yang meminta guard monitor milik self
// - Nilai yang masuk wajib `Send` (dicek di produce)
unsafe impl<T: ?Sized + 'static> Send for RingBuffer<T> {}
unsafe impl<T: ?Sized + 'static> Sync for RingBuffer<T> {}

impl<T: ?Sized + 'static> RingBuffer<T> {
    /// Membuat ring buffer di atas `arena`, dijaga oleh `monitor`.
    pub fn new(monitor: Arc<Monitor>, arena: Arena) -> Self {
        let capacity = arena.len();
        Self {
            monitor,
            state: UnsafeCell::new(RingState {
                arena,
                write: 0,
                read: 0,
                live: 0,
                _marker: PhantomData,
            }),
            capacity,
        }
    }

    /// Monitor yang menjaga ring buffer ini.
    #[inline(always)]
    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    fn state_mut<'a>(&'a self, guard: &'a mut MonitorGuard<'_>) -> &'a mut RingState<T> {
        assert!(
            guard.is_for(&self.monitor),
            "ring buffer accessed with a guard of a different monitor"
        );
        // SAFETY: guard membuktikan lock monitor dipegang thread ini, dan
        // borrow `&mut guard` mencegah dua referensi state hidup bersamaan.
        unsafe { &mut *self.state.get() }
    }

    /// Produce nilai (move), lalu panggil `after(guard, n)` dengan jumlah
    /// entry sebelum insert. Hook masih berjalan di bawah lock.
    ///
    /// # Panics
    /// Panic jika entry lebih besar dari arena, atau arena penuh.
    pub fn produce<F, H>(&self, guard: &mut MonitorGuard<'_>, value: F, after: H)
    where
        F: Upcast<T> + Send + 'static,
        H: FnOnce(&mut MonitorGuard<'_>, usize),
    {
        let before = {
            let state = self.state_mut(guard);
            let n = state.live;
            Self::ensure_room::<F>(state);
            PolyEntry::<T>::push(&mut state.arena, &mut state.write, value);
            state.committed(n == 0);
            n
        };
        after(&mut *guard, before);
    }

    /// Seperti [`produce`](Self::produce), nilai di-clone ke arena.
    pub fn produce_clone<F, H>(&self, guard: &mut MonitorGuard<'_>, value: &F, after: H)
    where
        F: Upcast<T> + Clone + Send + 'static,
        H: FnOnce(&mut MonitorGuard<'_>, usize),
    {
        let before = {
            let state = self.state_mut(guard);
            let n = state.live;
            Self::ensure_room::<F>(state);
            PolyEntry::<T>::push_clone(&mut state.arena, &mut state.write, value);
            state.committed(n == 0);
            n
        };
        after(&mut *guard, before);
    }

    /// Seperti [`produce`](Self::produce), tapi return `Err(value)` (tanpa
    /// memanggil hook) jika entry tidak muat saat ini.
    pub fn try_produce<F, H>(
        &self,
        guard: &mut MonitorGuard<'_>,
        value: F,
        after: H,
    ) -> Result<(), F>
    where
        F: Upcast<T> + Send + 'static,
        H: FnOnce(&mut MonitorGuard<'_>, usize),
    {
        if !self.has_room::<F>(guard) {
            return Err(value);
        }
        self.produce(guard, value, after);
        Ok(())
    }

    fn ensure_room<F>(state: &mut RingState<T>) {
        let needed = entry_size::<F>();
        if state.live == 0 {
            state.read = state.write;
        }
        if !state.has_room(needed) {
            error!(
                needed,
                live = state.live,
                write = state.write,
                read = state.read,
                "arena exhausted"
            );
            panic!(
                "arena exhausted: no room for {needed} bytes with {} entries pending",
                state.live
            );
        }
    }

    /// Consume entry terdepan.
    ///
    /// `before(guard, n)` dipanggil dengan jumlah entry saat ini; hook boleh
    /// block (wait pada event monitor yang sama) dan return `false` untuk
    /// batal. Jika lanjut, `callback` dipanggil sinkron dengan nilai, lalu
    /// nilai di-destroy dan cursor maju.
    ///
    /// Returns `true` jika satu entry dikonsumsi.
    pub fn consume<C, H>(&self, guard: &mut MonitorGuard<'_>, callback: C, before: H) -> bool
    where
        C: FnOnce(&mut T),
        H: FnOnce(&mut MonitorGuard<'_>, usize) -> bool,
    {
        let n = self.state_mut(guard).live;
        if !before(&mut *guard, n) {
            return false;
        }

        let state = self.state_mut(guard);
        if state.live == 0 {
            return false;
        }

        // SAFETY: live > 0, jadi read menunjuk ke entry hidup yang di-push
        // dengan interface T. Jika callback panic, entry tetap di tempat.
        unsafe {
            callback(PolyEntry::<T>::view_mut(&mut state.arena, state.read));
            state.pop_front();
        }
        true
    }

    /// Jumlah entry yang belum dikonsumsi.
    #[inline]
    pub fn len(&self, guard: &mut MonitorGuard<'_>) -> usize {
        self.state_mut(guard).live
    }

    /// Cek apakah buffer kosong
    #[inline]
    pub fn is_empty(&self, guard: &mut MonitorGuard<'_>) -> bool {
        self.len(guard) == 0
    }

    /// Cek apakah entry bertipe `F` bisa diproduksi sekarang tanpa panic.
    #[inline]
    pub fn has_room<F>(&self, guard: &mut MonitorGuard<'_>) -> bool {
        self.state_mut(guard).has_room(entry_size::<F>())
    }

    /// Kapasitas arena dalam bytes
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
