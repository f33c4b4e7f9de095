//! Error types untuk konstruksi queue
//!
//! Hot path (produce/consume) tidak punya error channel: hasil `bool` dari
//! `consume` adalah satu-satunya sinyal "kosong" atau "berhenti". Pelanggaran
//! precondition di hot path adalah panic.

use std::io;

use thiserror::Error;

/// Error yang bisa terjadi saat membangun queue atau arena.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Kapasitas arena tidak cukup untuk satu entry terkecil.
    #[error("arena capacity {capacity} bytes is below the minimum of {minimum} bytes")]
    CapacityTooSmall {
        /// Kapasitas yang diminta.
        capacity: usize,
        /// Kapasitas minimum (header + satu payload terkecil).
        minimum: usize,
    },

    /// `additional_limit` aktif tetapi event pasangannya tidak diberikan.
    #[error("additional limit {limit} is enabled but no additional event was supplied")]
    MissingAdditionalEvent {
        /// Threshold yang dikonfigurasi.
        limit: usize,
    },

    /// Event `ready` dan event tambahan terikat ke monitor yang berbeda.
    #[error("additional event is bound to a different monitor than the ready event")]
    MonitorMismatch,

    /// Mapping atau pinning memori arena gagal.
    #[error("arena memory: {0}")]
    Arena(#[from] io::Error),
}
