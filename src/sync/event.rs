//! Monitor + Blocking Event
//!
//! Satu `Monitor` = satu mutex. Setiap event terikat ke satu monitor;
//! `wait` melepas lock monitor secara atomik lalu mengambilnya lagi sebelum
//! return. Queue yang berbagi event tambahan wajib berbagi monitor yang sama.

use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};

/// Lock bersama untuk semua state yang dijaga event-event miliknya.
#[derive(Default)]
pub struct Monitor {
    lock: Mutex<()>,
}

impl Monitor {
    /// Membuat monitor baru yang siap dibagi antar queue dan event.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Ambil lock monitor (blocking).
    #[inline]
    pub fn lock(&self) -> MonitorGuard<'_> {
        MonitorGuard {
            guard: self.lock.lock(),
            monitor: self,
        }
    }
}

/// Bukti bahwa lock sebuah monitor sedang dipegang.
pub struct MonitorGuard<'a> {
    guard: MutexGuard<'a, ()>,
    monitor: &'a Monitor,
}

impl MonitorGuard<'_> {
    /// Cek apakah guard ini milik `monitor`.
    #[inline(always)]
    pub fn is_for(&self, monitor: &Monitor) -> bool {
        ptr::eq(self.monitor, monitor)
    }
}

/// Kontrak event blocking yang dipakai [`SyncQueue`](crate::SyncQueue).
///
/// Semua method dipanggil sambil memegang lock monitor event tersebut.
pub trait BlockingEvent: Send + Sync {
    /// Monitor tempat event ini terikat.
    fn monitor(&self) -> &Arc<Monitor>;

    /// Lepas lock `guard`, block sampai dibangunkan, lalu ambil lock lagi.
    ///
    /// Boleh bangun secara spurious: pemanggil wajib cek ulang kondisinya.
    fn wait(&self, guard: &mut MonitorGuard<'_>);

    /// Catat satu sinyal dan bangunkan minimal satu waiter.
    fn signal(&self);

    /// Catat satu sinyal dan bangunkan semua waiter.
    ///
    /// Untuk event yang dibagi beberapa queue: setiap waiter cek ulang
    /// generation miliknya sendiri.
    fn signal_all(&self);

    /// Bangunkan semua waiter tanpa mencatat sinyal.
    fn broadcast(&self);

    /// Jumlah sinyal yang pernah dicatat.
    fn generation(&self) -> u64;
}

/// Event berbasis condition variable.
pub struct Event {
    monitor: Arc<Monitor>,
    cond: Condvar,
    generation: AtomicU64,
}

impl Event {
    /// Membuat event yang terikat ke `monitor`.
    pub fn new(monitor: &Arc<Monitor>) -> Self {
        Self {
            monitor: Arc::clone(monitor),
            cond: Condvar::new(),
            generation: AtomicU64::new(0),
        }
    }
}

impl BlockingEvent for Event {
    #[inline(always)]
    fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    fn wait(&self, guard: &mut MonitorGuard<'_>) {
        assert!(
            guard.is_for(&self.monitor),
            "event waited on with a guard of a different monitor"
        );
        self.cond.wait(&mut guard.guard);
    }

    #[inline]
    fn signal(&self) {
        // Relaxed cukup: generation hanya dibaca/ditulis di bawah lock monitor
        self.generation.fetch_add(1, Ordering::Relaxed);
        self.cond.notify_one();
    }

    #[inline]
    fn signal_all(&self) {
        self.generation.fetch_add(1, Ordering::Relaxed);
        self.cond.notify_all();
    }

    #[inline]
    fn broadcast(&self) {
        self.cond.notify_all();
    }

    #[inline(always)]
    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_guard_identity() {
        let a = Monitor::shared();
        let b = Monitor::shared();
        let guard = a.lock();
        assert!(guard.is_for(&a));
        assert!(!guard.is_for(&b));
    }

    #[test]
    fn test_signal_counts_generation() {
        let monitor = Monitor::shared();
        let event = Event::new(&monitor);

        let _guard = monitor.lock();
        assert_eq!(event.generation(), 0);
        event.signal();
        event.signal();
        event.broadcast();
        assert_eq!(event.generation(), 2);
    }

    #[test]
    fn test_wait_releases_lock_until_signaled() {
        let monitor = Monitor::shared();
        let event = Arc::new(Event::new(&monitor));
        let flag = Arc::new(AtomicBool::new(false));

        let waiter = {
            let monitor = Arc::clone(&monitor);
            let event = Arc::clone(&event);
            let flag = Arc::clone(&flag);
            thread::spawn(move || {
                let mut guard = monitor.lock();
                while !flag.load(Ordering::SeqCst) {
                    event.wait(&mut guard);
                }
            })
        };

        thread::sleep(Duration::from_millis(20));
        {
            // lock bisa diambil: waiter sudah melepasnya di dalam wait()
            let _guard = monitor.lock();
            flag.store(true, Ordering::SeqCst);
            event.signal();
        }

        waiter.join().unwrap();
    }

    #[test]
    fn test_signal_all_wakes_every_waiter_once() {
        let monitor = Monitor::shared();
        let event = Arc::new(Event::new(&monitor));

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let monitor = Arc::clone(&monitor);
                let event = Arc::clone(&event);
                thread::spawn(move || {
                    let mut guard = monitor.lock();
                    let seen = event.generation();
                    while event.generation() == seen {
                        event.wait(&mut guard);
                    }
                    event.generation()
                })
            })
            .collect();

        // Semua waiter harus sudah mencatat generation 0 sebelum sinyal
        thread::sleep(Duration::from_millis(50));
        {
            let _guard = monitor.lock();
            event.signal_all();
        }

        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), 1);
        }
    }

    #[test]
    #[should_panic(expected = "different monitor")]
    fn test_wait_with_foreign_guard_panics() {
        let event = Event::new(&Monitor::shared());
        let other = Monitor::shared();
        let mut guard = other.lock();
        event.wait(&mut guard);
    }
}
