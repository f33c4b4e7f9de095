//! Zero-Allocation Entry Codec
//!
//! Encode dan decode satu nilai type-erased langsung ke/dari arena.
//! Cursor adalah offset relatif arena: selalu di awal header, atau tepat di
//! `end` yang berarti "wrap pada pemakaian berikutnya".

use std::marker::PhantomData;
use std::ptr;

use tracing::{error, trace};

use super::descriptor::{EntryHeader, EntryVTable, Upcast, ENTRY_ALIGN, HEADER_SIZE};
use crate::core::Arena;

/// Posisi penulisan entry berikutnya menurut aturan wrap/terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Entry muat di cursor.
    Here(usize),
    /// Sisa ruang kurang dari satu header: wrap ke awal tanpa menulis apapun.
    Wrap,
    /// Header muat tapi payload tidak: terminator di offset ini, entry di awal.
    TerminateAndWrap(usize),
}

impl Placement {
    /// Offset tempat entry akan ditulis.
    #[inline(always)]
    pub fn offset(self) -> usize {
        match self {
            Self::Here(offset) => offset,
            Self::Wrap | Self::TerminateAndWrap(_) => 0,
        }
    }

    /// Hitung placement untuk entry `needed` bytes di arena `end` bytes.
    ///
    /// # Panics
    /// Panic jika entry lebih besar dari seluruh arena: wrap tidak bisa
    /// membuat ruang yang memang tidak ada.
    #[inline(always)]
    pub fn plan(end: usize, cursor: usize, needed: usize) -> Self {
        if needed > end {
            error!(needed, capacity = end, "entry does not fit in arena");
            panic!("entry of {needed} bytes exceeds arena capacity of {end} bytes");
        }
        debug_assert!(cursor <= end);
        debug_assert_eq!(cursor % ENTRY_ALIGN, 0);

        let remaining = end - cursor;
        if remaining < HEADER_SIZE {
            Self::Wrap
        } else if remaining < needed {
            Self::TerminateAndWrap(cursor)
        } else {
            Self::Here(cursor)
        }
    }
}

/// Codec untuk entry dengan interface bersama `T`.
///
/// Tidak pernah di-instantiate; hanya namespace untuk operasi push/view/pop.
pub struct PolyEntry<T: ?Sized + 'static> {
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized + 'static> PolyEntry<T> {
    /// Construct `value` di arena (move), lalu majukan `cursor` melewati entry.
    ///
    /// Tidak ada alokasi; tepat satu konstruksi nilai di tempat.
    ///
    /// # Panics
    /// Panic jika header + payload lebih besar dari arena.
    pub fn push<F: Upcast<T> + 'static>(arena: &mut Arena, cursor: &mut usize, value: F) {
        let vtable = EntryVTable::<T>::of::<F>();
        let offset = Self::prepare(arena, *cursor, vtable);

        // SAFETY: prepare() memastikan [offset, offset + total) ada di dalam
        // arena dan offset aligned ke ENTRY_ALIGN >= align_of::<F>().
        unsafe {
            ptr::write(arena.as_mut_ptr(offset + HEADER_SIZE).cast::<F>(), value);
        }
        *cursor = offset + HEADER_SIZE + vtable.size;
    }

    /// Seperti [`push`](Self::push), tapi nilai di-clone langsung ke arena.
    pub fn push_clone<F: Upcast<T> + Clone + 'static>(
        arena: &mut Arena,
        cursor: &mut usize,
        value: &F,
    ) {
        let vtable = EntryVTable::<T>::of::<F>();
        let offset = Self::prepare(arena, *cursor, vtable);

        // SAFETY: lihat push()
        unsafe {
            ptr::write(
                arena.as_mut_ptr(offset + HEADER_SIZE).cast::<F>(),
                value.clone(),
            );
        }
        *cursor = offset + HEADER_SIZE + vtable.size;
    }

    /// Terapkan placement dan tulis header; return offset entry.
    fn prepare(arena: &mut Arena, cursor: usize, vtable: &'static EntryVTable<T>) -> usize {
        let needed = HEADER_SIZE + vtable.size;
        let placement = Placement::plan(arena.len(), cursor, needed);

        match placement {
            Placement::Here(_) => {}
            Placement::Wrap => {
                trace!(cursor, "tail too small for a header, wrapping");
            }
            Placement::TerminateAndWrap(at) => {
                trace!(at, needed, "writing terminator, wrapping");
                Self::write_header(arena, at, EntryHeader::TERMINATOR);
            }
        }

        let offset = placement.offset();
        Self::write_header(arena, offset, EntryHeader::new(vtable));
        offset
    }

    #[inline(always)]
    fn write_header(arena: &mut Arena, offset: usize, header: EntryHeader<T>) {
        debug_assert!(offset + HEADER_SIZE <= arena.len());
        // SAFETY: offset aligned dan header muat sebelum end (dicek oleh plan)
        unsafe {
            ptr::write(arena.as_mut_ptr(offset).cast::<EntryHeader<T>>(), header);
        }
    }

    /// Baca `size` descriptor di `offset` (0 = terminator).
    ///
    /// # Safety
    /// `offset` harus menunjuk ke header yang pernah ditulis codec ini, dan
    /// `offset + HEADER_SIZE <= arena.len()`.
    #[inline(always)]
    pub unsafe fn peek_size(arena: &Arena, offset: usize) -> usize {
        ptr::read(arena.as_ptr(offset).cast::<usize>())
    }

    /// Normalisasi cursor ke descriptor nyata berikutnya.
    ///
    /// Redirect ke awal arena jika sisa ruang kurang dari satu header, tepat
    /// di `end`, atau cursor berada di terminator.
    ///
    /// # Safety
    /// Jika sisa ruang >= satu header, `cursor` harus menunjuk ke header
    /// (entry atau terminator) yang ditulis codec ini.
    #[inline(always)]
    pub unsafe fn normalize(arena: &Arena, cursor: usize) -> usize {
        let end = arena.len();
        if end - cursor < HEADER_SIZE || Self::peek_size(arena, cursor) == 0 {
            0
        } else {
            cursor
        }
    }

    /// View nilai di `cursor` sebagai interface `T` (setelah normalisasi).
    ///
    /// Pure dan idempotent.
    ///
    /// # Safety
    /// Setelah normalisasi, cursor harus menunjuk ke entry hidup yang
    /// di-push dengan interface `T`.
    pub unsafe fn view(arena: &Arena, cursor: usize) -> &T {
        let offset = Self::normalize(arena, cursor);
        let vtable = Self::vtable_at(arena, offset);
        &*vtable.view_payload(arena.as_ptr(offset + HEADER_SIZE))
    }

    /// Versi mutable dari [`view`](Self::view).
    ///
    /// # Safety
    /// Sama dengan [`view`](Self::view).
    pub unsafe fn view_mut(arena: &mut Arena, cursor: usize) -> &mut T {
        let offset = Self::normalize(arena, cursor);
        let vtable = Self::vtable_at(arena, offset);
        &mut *vtable.view_payload_mut(arena.as_mut_ptr(offset + HEADER_SIZE))
    }

    /// Destroy nilai di `cursor` lalu majukan cursor melewati entry.
    ///
    /// Tidak melakukan normalisasi.
    ///
    /// # Safety
    /// `cursor` harus sudah menunjuk ke entry hidup (bukan terminator) yang
    /// di-push dengan interface `T`. Entry tidak boleh di-pop dua kali.
    pub unsafe fn pop(arena: &mut Arena, cursor: &mut usize) {
        let offset = *cursor;
        let vtable = Self::vtable_at(arena, offset);
        vtable.drop_payload(arena.as_mut_ptr(offset + HEADER_SIZE));
        *cursor = offset + HEADER_SIZE + vtable.size;
    }

    #[inline(always)]
    unsafe fn vtable_at(arena: &Arena, offset: usize) -> &'static EntryVTable<T> {
        let header = ptr::read(arena.as_ptr(offset).cast::<EntryHeader<T>>());
        match header.vtable {
            Some(vtable) => vtable,
            None => unreachable!("terminator at offset {offset} read as an entry"),
        }
    }
}
