use std::time::Duration;

use tracing::debug;

use thread_local::ThreadLocal;

use crate::error::{RcuError, UpdateError};
use crate::garbage::RetireBags;
use crate::queue::UpdateQueue;
use crate::reader::{self, ReadGuard};
use crate::reclaim::{Reclaimer, Wakeup};
use crate::state::{
    Lifecycle, SharedState, DEFAULT_MAX_PENDING_UPDATES, DEFAULT_RECLAIM_INTERVAL,
    DEFAULT_RETIRED_CAPACITY,
};
use crate::stats::Counters;
use crate::sync::{thread, Arc, AtomicPtr, AtomicU64, AtomicU8, Mutex, Ordering};

#[cfg(debug_assertions)]
use crate::stats::Diagnostics;

/// Builder for configuring an [`Rcu`] instance.
///
/// Use this builder to customize the update pipeline:
/// - `max_pending_updates`: capacity of the update queue
/// - `reclaim_interval`: the reclaimer's idle scan period
/// - `retired_capacity`: initial reservation of the retirement bags
///
/// # Example
/// ```
/// use std::time::Duration;
/// use rcu_epoch::Rcu;
///
/// let rcu = Rcu::<u64>::builder()
///     .max_pending_updates(128)
///     .reclaim_interval(Duration::from_millis(5))
///     .retired_capacity(256)
///     .build(0u64);
/// # rcu.shutdown();
/// ```
///
/// 用于配置 [`Rcu`] 实例的构建器。
pub struct RcuBuilder {
    max_pending_updates: usize,
    reclaim_interval: Duration,
    retired_capacity: usize,
}

impl RcuBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            max_pending_updates: DEFAULT_MAX_PENDING_UPDATES,
            reclaim_interval: DEFAULT_RECLAIM_INTERVAL,
            retired_capacity: DEFAULT_RETIRED_CAPACITY,
        }
    }

    /// Set the capacity of the update queue.
    ///
    /// One slot is always kept free to distinguish full from empty, so
    /// producers see [`RcuError::QueueFull`] at `capacity - 1` pending
    /// updates. Values below 2 are rounded up.
    ///
    /// Default: `64`
    ///
    /// 设置更新队列的容量。
    /// 始终保留一个空槽以区分满与空，因此生产者在积压
    /// `capacity - 1` 个更新时会得到 [`RcuError::QueueFull`]。
    /// 小于 2 的值会被向上取整。
    #[inline]
    pub fn max_pending_updates(mut self, capacity: usize) -> Self {
        self.max_pending_updates = capacity;
        self
    }

    /// Set the upper bound on the reclaimer's idle time between scans.
    ///
    /// The reclaimer is woken eagerly by every `update()`; the interval only
    /// bounds how stale a periodic grace-period scan can get.
    ///
    /// Default: `1ms`
    ///
    /// 设置回收器两次扫描之间空闲时间的上限。
    /// 每次 `update()` 都会立即唤醒回收器，
    /// 该间隔只限定周期性宽限期扫描的最大延迟。
    #[inline]
    pub fn reclaim_interval(mut self, interval: Duration) -> Self {
        self.reclaim_interval = interval;
        self
    }

    /// Set the initial reservation of each retirement bag. Bags may grow.
    ///
    /// Default: `64`
    ///
    /// 设置每个退休袋的初始容量。袋仍可增长。
    #[inline]
    pub fn retired_capacity(mut self, capacity: usize) -> Self {
        self.retired_capacity = capacity;
        self
    }

    /// Build the instance, publish `initial` as the first snapshot and start
    /// the reclaimer thread.
    ///
    /// 构建实例，将 `initial` 作为第一个快照发布，并启动回收器线程。
    pub fn build<T: Send + Sync + 'static>(self, initial: T) -> Rcu<T> {
        let shared = Arc::new(SharedState {
            ptr: AtomicPtr::new(Box::into_raw(Box::new(initial))),
            global_epoch: AtomicU64::new(0),
            lifecycle: AtomicU8::new(Lifecycle::Initializing as u8),
            participants: Mutex::new(Vec::new()),
            locals: ThreadLocal::new(),
            queue: UpdateQueue::with_capacity(self.max_pending_updates),
            bags: Mutex::new(RetireBags::with_capacity(self.retired_capacity)),
            wakeup: Wakeup::new(),
            stats: Counters::new(),
        });

        // Activate before the reclaimer starts so its loop condition holds
        // from the first iteration.
        // 在回收器启动之前进入 Active，使其循环条件从第一轮起成立。
        shared
            .lifecycle
            .store(Lifecycle::Active as u8, Ordering::Release);
        let handle = Reclaimer::spawn(Arc::clone(&shared), self.reclaim_interval);
        debug!(
            target: "rcu_epoch",
            queue_capacity = shared.queue.capacity(),
            "activated"
        );

        Rcu {
            shared,
            reclaimer: Mutex::new(Some(handle)),
        }
    }
}

impl Default for RcuBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A read-copy-update cell publishing one immutable snapshot of `T`.
///
/// Readers obtain a [`ReadGuard`] and dereference it to the latest published
/// snapshot with wait-free progress after their first call. Writers submit
/// closures through [`Rcu::update`]; a single background reclaimer thread
/// applies them in queue order, swaps the new snapshot in, and destroys
/// displaced snapshots only after a grace period in which no reader can
/// still hold them.
///
/// **Typical Usage**:
/// ```
/// use rcu_epoch::Rcu;
///
/// let rcu = Rcu::new(8080u32);
///
/// // Reader threads:
/// let guard = rcu.read().unwrap();
/// assert_eq!(*guard.get(), 8080);
/// drop(guard);
///
/// // Writer threads: applied asynchronously by the reclaimer.
/// rcu.update(|port| Ok(port + 1)).unwrap();
///
/// rcu.shutdown();
/// ```
///
/// Shutting down while guards are still alive is not defended against;
/// release every guard before calling [`Rcu::shutdown`] or dropping the
/// instance.
///
/// 一个发布 `T` 的单一不可变快照的读-复制-更新单元。
/// 读者获取 [`ReadGuard`] 并解引用到最新发布的快照，
/// 首次调用之后的读取是无等待的。
/// 写者通过 [`Rcu::update`] 提交闭包，唯一的后台回收器线程按队列顺序
/// 应用它们、换入新快照，并只在宽限期之后销毁被换下的快照。
/// 在守卫仍然存活时关闭实例不受保护：
/// 调用 [`Rcu::shutdown`] 或 drop 实例之前请释放所有守卫。
pub struct Rcu<T: Send + Sync + 'static> {
    shared: Arc<SharedState<T>>,
    reclaimer: Mutex<Option<thread::JoinHandle<()>>>,
}

impl<T: Send + Sync + 'static> Rcu<T> {
    /// Create an instance with default configuration, publishing `initial`.
    /// 使用默认配置创建实例并发布 `initial`。
    #[inline]
    pub fn new(initial: T) -> Self {
        Self::builder().build(initial)
    }

    /// Create a builder for configuring the instance.
    /// 创建用于配置实例的构建器。
    #[inline]
    pub fn builder() -> RcuBuilder {
        RcuBuilder::new()
    }

    /// Begin a read critical section.
    ///
    /// The first call on a thread registers a participant record under a
    /// short mutex; every later call on that thread is lock-free. Fails with
    /// [`RcuError::NotActive`] outside the Active phase.
    ///
    /// 开始一个读临界区。
    /// 线程上的首次调用会在短互斥锁下注册参与者记录，
    /// 之后该线程的每次调用都是无锁的。
    /// 在非 Active 阶段返回 [`RcuError::NotActive`]。
    pub fn read(&self) -> Result<ReadGuard<'_, T>, RcuError> {
        if self.shared.lifecycle() != Lifecycle::Active {
            return Err(RcuError::NotActive);
        }
        let guard = reader::acquire(&self.shared);
        self.shared.stats.reads.fetch_add(1, Ordering::Relaxed);
        Ok(guard)
    }

    /// Submit an update closure for asynchronous application.
    ///
    /// The closure receives the snapshot current at application time and
    /// returns the successor value. Returning `Err` skips the publication;
    /// the error is logged by the reclaimer and later updates still run.
    ///
    /// Success means *pending*, not *published*: a subsequent [`Rcu::read`]
    /// observes the new value only once the reclaimer has applied it.
    /// Never blocks; fails with [`RcuError::QueueFull`] when only the
    /// reserved slot remains, and the caller decides whether to retry.
    ///
    /// 提交一个异步应用的更新闭包。
    /// 闭包接收应用时刻的当前快照并返回后继值。
    /// 返回 `Err` 会跳过发布，错误由回收器记录，后续更新仍会执行。
    /// 成功只意味着"待处理"而非"已发布"：只有在回收器应用之后，
    /// 随后的 [`Rcu::read`] 才能观察到新值。
    /// 本方法从不阻塞；当只剩保留空槽时返回 [`RcuError::QueueFull`]，
    /// 由调用者决定是否重试。
    pub fn update<F>(&self, update: F) -> Result<(), RcuError>
    where
        F: FnOnce(&T) -> Result<T, UpdateError> + Send + 'static,
    {
        if self.shared.lifecycle() != Lifecycle::Active {
            return Err(RcuError::NotActive);
        }
        self.shared
            .queue
            .push(Box::new(update))
            .map_err(|_| RcuError::QueueFull)?;
        self.shared.wakeup.notify();
        Ok(())
    }

    /// Shut the instance down, blocking until the reclaimer has drained the
    /// queue and joined. Idempotent; concurrent and repeated calls are
    /// no-ops. Also performed by `Drop`.
    ///
    /// 关闭实例，阻塞直到回收器排空队列并汇合。幂等；
    /// 并发或重复调用是空操作。`Drop` 也会执行同样的关闭。
    pub fn shutdown(&self) {
        if self
            .shared
            .lifecycle
            .compare_exchange(
                Lifecycle::Active as u8,
                Lifecycle::ShuttingDown as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return;
        }
        debug!(target: "rcu_epoch", "shutting_down");
        self.shared.wakeup.notify();
        if let Some(handle) = self.reclaimer.lock().take() {
            let _ = handle.join();
        }
        self.shared
            .lifecycle
            .store(Lifecycle::Terminated as u8, Ordering::Release);
        debug!(target: "rcu_epoch", "terminated");
    }

    /// Snapshot the engine counters. Available in debug builds only.
    /// 获取引擎计数器的快照。仅在 debug 构建中可用。
    #[cfg(debug_assertions)]
    pub fn diagnostics(&self) -> Diagnostics {
        self.shared.stats.snapshot()
    }
}

impl<T: Send + Sync + 'static> Drop for Rcu<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Rcu<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rcu")
            .field("lifecycle", &self.shared.lifecycle())
            .field(
                "global_epoch",
                &self.shared.global_epoch.load(Ordering::Relaxed),
            )
            .field("pending_updates", &self.shared.queue.len())
            .finish_non_exhaustive()
    }
}
