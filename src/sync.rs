#[cfg(loom)]
pub use loom::cell::Cell;
#[cfg(not(loom))]
pub use std::cell::Cell;

#[cfg(loom)]
pub use loom::sync::atomic::{AtomicBool, AtomicPtr, AtomicU64, AtomicU8, Ordering};
#[cfg(not(loom))]
pub use std::sync::atomic::{AtomicBool, AtomicPtr, AtomicU64, AtomicU8, Ordering};

#[cfg(loom)]
pub use loom::sync::Arc;
#[cfg(not(loom))]
pub use std::sync::Arc;

#[cfg(loom)]
pub use loom::thread;
#[cfg(not(loom))]
pub use std::thread;

#[cfg(not(loom))]
pub use antidote::{Condvar, Mutex};

#[cfg(loom)]
#[derive(Debug, Default)]
pub struct Mutex<T>(loom::sync::Mutex<T>);

#[cfg(loom)]
impl<T> Mutex<T> {
    pub fn new(t: T) -> Self {
        Self(loom::sync::Mutex::new(t))
    }

    pub fn lock(&self) -> loom::sync::MutexGuard<'_, T> {
        self.0.lock().unwrap()
    }
}

#[cfg(loom)]
#[derive(Debug, Default)]
pub struct Condvar(loom::sync::Condvar);

#[cfg(loom)]
impl Condvar {
    pub fn new() -> Self {
        Self(loom::sync::Condvar::new())
    }

    pub fn notify_one(&self) {
        self.0.notify_one();
    }

    pub fn wait_timeout<'a, T>(
        &self,
        guard: loom::sync::MutexGuard<'a, T>,
        timeout: std::time::Duration,
    ) -> (loom::sync::MutexGuard<'a, T>, ()) {
        let (guard, _) = self.0.wait_timeout(guard, timeout).unwrap();
        (guard, ())
    }
}
