//! Tipe uji bersama: interface polimorfik + penghitung instance.

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::protocol::Upcast;

/// Interface bersama untuk unit test.
pub trait Describe {
    fn kind(&self) -> String;
    fn label(&self) -> String;
    fn bump(&mut self) {}
}

#[derive(Default)]
struct CounterInner {
    live: AtomicIsize,
    constructed: AtomicUsize,
}

/// Menghitung instance hidup dan jumlah konstruksi (new + clone).
#[derive(Clone, Default)]
pub struct Counter(Arc<CounterInner>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> isize {
        self.0.live.load(Ordering::SeqCst)
    }

    pub fn constructed(&self) -> usize {
        self.0.constructed.load(Ordering::SeqCst)
    }
}

/// Token yang terdaftar di `Counter` selama hidup.
pub struct Instance(Counter);

impl Instance {
    pub fn new(counter: &Counter) -> Self {
        counter.0.live.fetch_add(1, Ordering::SeqCst);
        counter.0.constructed.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Clone for Instance {
    fn clone(&self) -> Self {
        Self::new(&self.0)
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.0 .0.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct Bar {
    pub value: String,
    _instance: Instance,
    _padding: [u8; 24],
}

impl Bar {
    pub fn new(value: &str, counter: &Counter) -> Self {
        Self {
            value: value.to_string(),
            _instance: Instance::new(counter),
            _padding: [0; 24],
        }
    }
}

impl Describe for Bar {
    fn kind(&self) -> String {
        "Bar".to_string()
    }

    fn label(&self) -> String {
        self.value.clone()
    }
}

#[derive(Clone)]
pub struct Baz {
    pub value: i32,
    _instance: Instance,
}

impl Baz {
    pub fn new(value: i32, counter: &Counter) -> Self {
        Self {
            value,
            _instance: Instance::new(counter),
        }
    }
}

impl Describe for Baz {
    fn kind(&self) -> String {
        "Baz".to_string()
    }

    fn label(&self) -> String {
        self.value.to_string()
    }

    fn bump(&mut self) {
        self.value += 1;
    }
}

/// Tidak `Clone`: hanya bisa masuk arena lewat move.
pub struct MoveOnly {
    pub value: i32,
    _instance: Instance,
}

impl MoveOnly {
    pub fn new(value: i32, counter: &Counter) -> Self {
        Self {
            value,
            _instance: Instance::new(counter),
        }
    }
}

impl Describe for MoveOnly {
    fn kind(&self) -> String {
        "MoveOnly".to_string()
    }

    fn label(&self) -> String {
        self.value.to_string()
    }
}

pub struct DisplacedInner {
    values: [String; 3],
}

impl Describe for DisplacedInner {
    fn kind(&self) -> String {
        "Displaced".to_string()
    }

    fn label(&self) -> String {
        format!("{}-{}{}", self.values[0], self.values[1], self.values[2])
    }
}

/// View interface berada di field kedua, bukan di alamat nilai itu sendiri.
#[repr(C)]
pub struct Displaced {
    _pod: [u8; 40],
    inner: DisplacedInner,
}

impl Displaced {
    pub fn new(id: u32) -> Self {
        Self {
            _pod: [0; 40],
            inner: DisplacedInner {
                values: ["derived".to_string(), id.to_string(), String::new()],
            },
        }
    }
}

impl Upcast<dyn Describe> for Displaced {
    fn upcast(&self) -> &(dyn Describe + 'static) {
        &self.inner
    }

    fn upcast_mut(&mut self) -> &mut (dyn Describe + 'static) {
        &mut self.inner
    }
}

crate::impl_upcast!(dyn Describe => Bar, Baz, MoveOnly);
