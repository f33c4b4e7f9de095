//! Entry Descriptor Format
//!
//! Layout satu entry di arena:
//! ┌─────────────────────────────────────────────────────┐
//! │ EntryHeader (16 bytes, fixed)                       │
//! │   size   : footprint payload, 0 = terminator        │
//! │   vtable : &'static EntryVTable<T> (None = term.)   │
//! ├─────────────────────────────────────────────────────┤
//! │ Payload (nilai konkret F, padded ke ENTRY_ALIGN)    │
//! └─────────────────────────────────────────────────────┘
//!
//! Vtable dibuat di call site yang tahu tipe konkret `F`, lalu di-stamp ke
//! header. Pembaca hanya tahu interface `T`.

use std::any;
use std::marker::PhantomData;
use std::mem;
use std::ptr;

/// Konversi dari tipe konkret ke interface bersama `T`.
///
/// Untuk interface non-polimorfik (`T` sized) ada blanket impl identitas.
/// Untuk trait object, gunakan [`impl_upcast!`](crate::impl_upcast) atau
/// implementasi manual. View boleh menunjuk ke alamat berbeda dari nilai
/// konkretnya (misalnya field di dalam struct).
///
/// Implementasi manual untuk `dyn Trait` wajib menulis lifetime objek
/// secara eksplisit: `fn upcast(&self) -> &(dyn Trait + 'static)`.
pub trait Upcast<T: ?Sized> {
    /// View interface bersama.
    fn upcast(&self) -> &T;

    /// View interface bersama (mutable).
    fn upcast_mut(&mut self) -> &mut T;
}

impl<T> Upcast<T> for T {
    #[inline(always)]
    fn upcast(&self) -> &T {
        self
    }

    #[inline(always)]
    fn upcast_mut(&mut self) -> &mut T {
        self
    }
}

/// Implementasi [`Upcast`] untuk satu interface dan beberapa tipe konkret.
///
/// ```
/// use polyq::impl_upcast;
///
/// trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// struct Square(f64);
///
/// impl Shape for Square {
///     fn area(&self) -> f64 {
///         self.0 * self.0
///     }
/// }
///
/// impl_upcast!(dyn Shape => Square);
/// ```
#[macro_export]
macro_rules! impl_upcast {
    ($iface:ty => $($concrete:ty),+ $(,)?) => {
        $(
            const _: () = {
                // Alias menjaga default `'static` pada trait object di return type
                type Iface = $iface;

                impl $crate::protocol::Upcast<Iface> for $concrete {
                    #[inline(always)]
                    fn upcast(&self) -> &Iface {
                        self
                    }

                    #[inline(always)]
                    fn upcast_mut(&mut self) -> &mut Iface {
                        self
                    }
                }
            };
        )+
    };
}

/// Record type-erasure untuk satu pasangan (tipe konkret, interface).
pub struct EntryVTable<T: ?Sized> {
    /// Footprint payload dalam bytes (kelipatan `ENTRY_ALIGN`, tidak pernah 0).
    pub size: usize,
    drop_in_place: unsafe fn(*mut u8),
    view: unsafe fn(*const u8) -> *const T,
    view_mut: unsafe fn(*mut u8) -> *mut T,
    type_name: fn() -> &'static str,
}

impl<T: ?Sized> EntryVTable<T> {
    /// Nama tipe konkret, untuk diagnostik.
    #[inline(always)]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Destroy payload di tempat.
    ///
    /// # Safety
    /// `payload` harus menunjuk ke nilai hidup dari tipe konkret vtable ini.
    #[inline(always)]
    pub unsafe fn drop_payload(&self, payload: *mut u8) {
        (self.drop_in_place)(payload)
    }

    /// View payload sebagai interface.
    ///
    /// # Safety
    /// Sama dengan [`drop_payload`](Self::drop_payload).
    #[inline(always)]
    pub unsafe fn view_payload(&self, payload: *const u8) -> *const T {
        (self.view)(payload)
    }

    /// View payload sebagai interface (mutable).
    ///
    /// # Safety
    /// Sama dengan [`drop_payload`](Self::drop_payload).
    #[inline(always)]
    pub unsafe fn view_payload_mut(&self, payload: *mut u8) -> *mut T {
        (self.view_mut)(payload)
    }

    /// Vtable `'static` untuk tipe konkret `F`.
    ///
    /// Gagal compile jika alignment `F` melebihi [`ENTRY_ALIGN`].
    #[inline(always)]
    pub fn of<F: Upcast<T> + 'static>() -> &'static Self
    where
        T: 'static,
    {
        let () = VTableFor::<F, T>::ALIGN_OK;
        &VTableFor::<F, T>::VTABLE
    }
}

/// Holder const per pasangan (F, T); `&VTABLE` di-promote ke `'static`.
struct VTableFor<F, T: ?Sized>(PhantomData<(fn() -> F, fn() -> *const T)>);

impl<F: Upcast<T>, T: ?Sized> VTableFor<F, T> {
    const ALIGN_OK: () = assert!(
        mem::align_of::<F>() <= ENTRY_ALIGN,
        "value alignment exceeds ENTRY_ALIGN"
    );

    const VTABLE: EntryVTable<T> = EntryVTable {
        size: payload_footprint(mem::size_of::<F>()),
        drop_in_place: drop_erased::<F>,
        view: view_erased::<F, T>,
        view_mut: view_mut_erased::<F, T>,
        type_name: any::type_name::<F>,
    };
}

unsafe fn drop_erased<F>(payload: *mut u8) {
    ptr::drop_in_place(payload.cast::<F>());
}

unsafe fn view_erased<F: Upcast<T>, T: ?Sized>(payload: *const u8) -> *const T {
    (*payload.cast::<F>()).upcast()
}

unsafe fn view_mut_erased<F: Upcast<T>, T: ?Sized>(payload: *mut u8) -> *mut T {
    (*payload.cast::<F>()).upcast_mut()
}

/// Entry Header - Fixed 16 bytes
///
/// `size == 0` berarti terminator: tidak ada entry lagi sebelum wrap.
#[repr(C, align(16))]
pub struct EntryHeader<T: ?Sized + 'static> {
    /// Footprint payload dalam bytes.
    pub size: usize,
    /// Record erasure; `None` hanya untuk terminator.
    pub vtable: Option<&'static EntryVTable<T>>,
}

pub const HEADER_SIZE: usize = mem::size_of::<EntryHeader<()>>();
pub const ENTRY_ALIGN: usize = mem::align_of::<EntryHeader<()>>();

impl<T: ?Sized + 'static> EntryHeader<T> {
    /// Header terminator.
    pub const TERMINATOR: Self = Self {
        size: 0,
        vtable: None,
    };

    /// Header untuk entry dengan vtable tertentu.
    #[inline(always)]
    pub fn new(vtable: &'static EntryVTable<T>) -> Self {
        Self {
            size: vtable.size,
            vtable: Some(vtable),
        }
    }

    /// Cek apakah header ini terminator
    #[inline(always)]
    pub fn is_terminator(&self) -> bool {
        self.size == 0
    }

    /// Total entry size (header + payload)
    #[inline(always)]
    pub fn total_size(&self) -> usize {
        HEADER_SIZE + self.size
    }
}

impl<T: ?Sized + 'static> Clone for EntryHeader<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + 'static> Copy for EntryHeader<T> {}

/// Footprint payload: ukuran dibulatkan ke atas ke `ENTRY_ALIGN`, minimal
/// `ENTRY_ALIGN` supaya tipe zero-sized tidak terbaca sebagai terminator.
#[inline(always)]
pub const fn payload_footprint(size: usize) -> usize {
    let padded = (size + ENTRY_ALIGN - 1) & !(ENTRY_ALIGN - 1);
    if padded == 0 {
        ENTRY_ALIGN
    } else {
        padded
    }
}

/// Total bytes yang dipakai satu entry bertipe `F` (header + payload).
#[inline(always)]
pub const fn entry_size<F>() -> usize {
    HEADER_SIZE + payload_footprint(mem::size_of::<F>())
}
