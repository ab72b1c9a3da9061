#[cfg(not(loom))]
mod concurrent_tests;


#[cfg(not(loom))]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(not(loom))]
use std::sync::Arc;

/// Shared test payload: a port number plus a drop tally, so tests can
/// assert that every retired snapshot is destroyed exactly once.
///
/// 共享的测试载荷：一个端口号加一个 drop 计数，
/// 使测试能够断言每个退休快照恰好被销毁一次。
#[cfg(not(loom))]
pub(crate) struct Config {
    pub(crate) port: u32,
    drops: Arc<AtomicUsize>,
}

#[cfg(not(loom))]
impl Config {
    pub(crate) fn new(port: u32) -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        let config = Config {
            port,
            drops: Arc::clone(&drops),
        };
        (config, drops)
    }

    /// Successor version sharing the same drop tally.
    /// 共享同一 drop 计数的后继版本。
    pub(crate) fn with_port(&self, port: u32) -> Config {
        Config {
            port,
            drops: Arc::clone(&self.drops),
        }
    }
}

#[cfg(not(loom))]
impl Drop for Config {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
