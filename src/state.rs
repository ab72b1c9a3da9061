use std::time::Duration;

use thread_local::ThreadLocal;

use crate::garbage::RetireBags;
use crate::queue::UpdateQueue;
use crate::reader::LocalParticipant;
use crate::reclaim::Wakeup;
use crate::stats::Counters;
use crate::sync::{Arc, AtomicBool, AtomicPtr, AtomicU64, AtomicU8, Mutex, Ordering};

/// Default capacity of the update queue (including the reserved slack slot).
/// 更新队列的默认容量（含保留的空槽）。
pub(crate) const DEFAULT_MAX_PENDING_UPDATES: usize = 64;

/// Default upper bound on the reclaimer's idle time between scans.
/// 回收器两次扫描之间空闲时间的默认上限。
pub(crate) const DEFAULT_RECLAIM_INTERVAL: Duration = Duration::from_millis(1);

/// Default initial reservation for each retirement bag.
/// 每个退休袋的默认初始容量。
pub(crate) const DEFAULT_RETIRED_CAPACITY: usize = 64;

/// Number of rotating retirement bags.
/// 轮换退休袋的数量。
pub(crate) const BAG_COUNT: u64 = 3;

/// Reclamation passes performed after the reclaimer leaves its main loop.
/// 回收器退出主循环后执行的回收轮数。
pub(crate) const SHUTDOWN_PASSES: usize = 3;

/// Phases of an instance's life, stored in a single atomic byte.
///
/// 实例生命周期的各个阶段，存储在一个原子字节中。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Lifecycle {
    Initializing = 0,
    Active = 1,
    ShuttingDown = 2,
    Terminated = 3,
}

impl Lifecycle {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Lifecycle::Initializing,
            1 => Lifecycle::Active,
            2 => Lifecycle::ShuttingDown,
            _ => Lifecycle::Terminated,
        }
    }
}

/// Per-thread reader record, discoverable by the reclaimer's scan.
///
/// The owning thread writes `active` and `local_epoch`; the reclaimer only
/// reads them. Cache-aligned to prevent false sharing between readers.
///
/// 每个读者线程的记录，可被回收器的扫描发现。
/// 拥有线程写入 `active` 和 `local_epoch`，回收器只读取它们。
/// 缓存对齐以防止读者之间的伪共享。
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct Participant {
    /// True while the thread holds at least one read guard.
    /// 线程至少持有一个读守卫时为 true。
    pub(crate) active: AtomicBool,
    /// The global epoch observed at guard acquisition.
    /// 获取守卫时观察到的全局纪元。
    pub(crate) local_epoch: AtomicU64,
    /// Informational only, captured at registration.
    /// 仅供参考，在注册时捕获。
    pub(crate) thread: String,
}

impl Participant {
    pub(crate) fn new(thread: String) -> Self {
        Self {
            active: AtomicBool::new(false),
            local_epoch: AtomicU64::new(0),
            thread,
        }
    }
}

/// State shared between clients and the reclaimer thread.
///
/// 客户端与回收器线程共享的状态。
#[repr(align(64))]
pub(crate) struct SharedState<T> {
    /// The currently published snapshot. Non-null for the whole Active phase.
    /// 当前发布的快照。在整个 Active 阶段非空。
    pub(crate) ptr: AtomicPtr<T>,
    /// The global monotonic epoch counter. Only the reclaimer advances it.
    /// 全局单调纪元计数器。只有回收器推进它。
    pub(crate) global_epoch: AtomicU64,
    /// Current [`Lifecycle`] phase.
    /// 当前的 [`Lifecycle`] 阶段。
    pub(crate) lifecycle: AtomicU8,
    /// Registry of all participant records. The short mutex serialises
    /// insertions and the reclaimer's scan.
    /// 所有参与者记录的注册表。短互斥锁串行化插入与回收器的扫描。
    pub(crate) participants: Mutex<Vec<Arc<Participant>>>,
    /// Per-thread fast-path slot into the registry.
    /// 进入注册表的线程本地快速路径槽。
    pub(crate) locals: ThreadLocal<LocalParticipant>,
    /// Pending update closures, drained only by the reclaimer.
    /// 待处理的更新闭包，只由回收器消费。
    pub(crate) queue: UpdateQueue<T>,
    /// Epoch-indexed bags of retired snapshots.
    /// 按纪元索引的退休快照袋。
    pub(crate) bags: Mutex<RetireBags<T>>,
    /// Wakes the reclaimer out of its timed wait.
    /// 将回收器从定时等待中唤醒。
    pub(crate) wakeup: Wakeup,
    pub(crate) stats: Counters,
}

impl<T> SharedState<T> {
    #[inline]
    pub(crate) fn lifecycle(&self) -> Lifecycle {
        Lifecycle::from_u8(self.lifecycle.load(Ordering::Acquire))
    }
}

impl<T> Drop for SharedState<T> {
    /// By teardown no reader or reclaimer references remain, so the final
    /// published snapshot can be taken back and dropped.
    ///
    /// 到析构时已没有任何读者或回收器的引用，
    /// 因此可以安全地收回并释放最后发布的快照。
    fn drop(&mut self) {
        let ptr = self.ptr.load(Ordering::Relaxed);
        if !ptr.is_null() {
            unsafe {
                drop(Box::from_raw(ptr));
            }
        }
    }
}
