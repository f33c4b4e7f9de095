//! Protocol Layer: Type-Erased Entry Encoding
//!
//! Prinsip desain:
//! - Fixed-size header: descriptor berisi ukuran payload + vtable erasure
//! - Inline payload: nilai konkret di-construct langsung di arena
//! - No allocation: vtable adalah `&'static`, dibuat sekali per tipe konkret

mod descriptor;
mod entry;

pub use descriptor::{
    entry_size, payload_footprint, EntryHeader, EntryVTable, Upcast, ENTRY_ALIGN, HEADER_SIZE,
};
pub use entry::{Placement, PolyEntry};
