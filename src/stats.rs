use crate::sync::{AtomicU64, Ordering};

/// Monotonic event counters maintained by the engine.
///
/// All increments are relaxed; the counters are diagnostics, not
/// synchronization.
///
/// 引擎维护的单调事件计数器。
/// 所有递增都是 relaxed 的，计数器仅用于诊断，不参与同步。
#[derive(Debug)]
pub(crate) struct Counters {
    /// Successful `read()` calls.
    /// 成功的 `read()` 调用次数。
    pub(crate) reads: AtomicU64,
    /// Updates applied and published by the reclaimer.
    /// 回收器已应用并发布的更新次数。
    pub(crate) updates: AtomicU64,
    /// Retired values whose destructor has run.
    /// 已执行析构的退休值数量。
    pub(crate) reclamations: AtomicU64,
    /// Successful global epoch advances.
    /// 全局纪元成功推进的次数。
    pub(crate) epoch_advances: AtomicU64,
}

impl Counters {
    pub(crate) fn new() -> Self {
        Self {
            reads: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            reclamations: AtomicU64::new(0),
            epoch_advances: AtomicU64::new(0),
        }
    }

    pub(crate) fn snapshot(&self) -> Diagnostics {
        Diagnostics {
            reads: self.reads.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            reclamations: self.reclamations.load(Ordering::Relaxed),
            epoch_advances: self.epoch_advances.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of the engine counters, taken with
/// [`Rcu::diagnostics`](crate::Rcu::diagnostics).
///
/// 通过 [`Rcu::diagnostics`](crate::Rcu::diagnostics) 获取的
/// 引擎计数器的时间点快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostics {
    /// Successful `read()` calls.
    /// 成功的 `read()` 调用次数。
    pub reads: u64,
    /// Updates applied and published by the reclaimer.
    /// 回收器已应用并发布的更新次数。
    pub updates: u64,
    /// Retired values whose destructor has run.
    /// 已执行析构的退休值数量。
    pub reclamations: u64,
    /// Successful global epoch advances.
    /// 全局纪元成功推进的次数。
    pub epoch_advances: u64,
}
