//! Core module: Wrap-Around Ring Buffer di atas Mmap Arena
//!
//! Prinsip desain:
//! - No-Allocation: arena di-mmap sekali saat init, entry di-construct di tempat
//! - Offset-Addressed: cursor adalah offset relatif arena, bukan pointer
//! - Monitor-Guarded: state hanya bisa disentuh sambil memegang lock monitor

mod arena;
mod ring_buffer;

pub use arena::Arena;
pub use ring_buffer::RingBuffer;
