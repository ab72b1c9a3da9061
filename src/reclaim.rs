use std::time::Duration;

use tracing::{debug, warn};

use crate::state::{Lifecycle, SharedState, SHUTDOWN_PASSES};
use crate::sync::{thread, Arc, Condvar, Mutex, Ordering};

/// The reclaimer's wakeup primitive: a flag under a short mutex plus a
/// condition variable. A spurious wake only costs one extra scan.
///
/// 回收器的唤醒原语：短互斥锁保护的标志加一个条件变量。
/// 虚假唤醒只多付出一次扫描的代价。
pub(crate) struct Wakeup {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Wakeup {
    pub(crate) fn new() -> Self {
        Self {
            flag: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    /// Set the flag and wake the reclaimer if it is waiting.
    /// 置位标志，并在回收器正在等待时将其唤醒。
    pub(crate) fn notify(&self) {
        let mut flag = self.flag.lock();
        *flag = true;
        self.cond.notify_one();
    }

    /// Block until notified or until `timeout` elapses, then clear the flag.
    /// 阻塞直到被通知或 `timeout` 到期，然后清除标志。
    pub(crate) fn wait(&self, timeout: Duration) {
        let mut flag = self.flag.lock();
        if !*flag {
            let (woken, _) = self.cond.wait_timeout(flag, timeout);
            flag = woken;
        }
        *flag = false;
    }
}

/// The single background thread owning update application, epoch advance and
/// snapshot destruction.
///
/// 唯一的后台线程，负责应用更新、推进纪元和销毁快照。
pub(crate) struct Reclaimer<T> {
    shared: Arc<SharedState<T>>,
    interval: Duration,
}

impl<T: Send + Sync + 'static> Reclaimer<T> {
    pub(crate) fn new(shared: Arc<SharedState<T>>, interval: Duration) -> Self {
        Self { shared, interval }
    }

    #[cfg(not(loom))]
    pub(crate) fn spawn(
        shared: Arc<SharedState<T>>,
        interval: Duration,
    ) -> thread::JoinHandle<()> {
        thread::Builder::new()
            .name("rcu-reclaimer".into())
            .spawn(move || Reclaimer::new(shared, interval).run())
            .expect("failed to spawn the rcu reclaimer thread")
    }

    #[cfg(loom)]
    pub(crate) fn spawn(
        shared: Arc<SharedState<T>>,
        interval: Duration,
    ) -> thread::JoinHandle<()> {
        thread::spawn(move || Reclaimer::new(shared, interval).run())
    }

    /// Main loop: runs while the instance is Active, then performs the final
    /// shutdown drain.
    ///
    /// 主循环：在实例处于 Active 期间运行，随后执行最终的关闭排空。
    pub(crate) fn run(self) {
        debug!(target: "rcu_epoch", "reclaimer_started");
        while self.shared.lifecycle() == Lifecycle::Active {
            self.apply_pending();
            self.try_advance_and_reclaim();
            self.shared.wakeup.wait(self.interval);
        }

        // Shutdown drain: apply whatever is still queued, then run the
        // advance phase three times. With no readers left, two advances
        // free every bag; the third absorbs the pass that merely catches
        // the epoch up.
        // 关闭排空：应用仍在排队的更新，然后执行三轮推进。
        // 没有读者时两次推进即可清空所有袋，第三轮吸收仅用于
        // 追平纪元的那一轮。
        self.apply_pending();
        for _ in 0..SHUTDOWN_PASSES {
            self.try_advance_and_reclaim();
        }
        let remaining = self.shared.bags.lock().total();
        debug!(target: "rcu_epoch", remaining, "reclaimer_stopped");
    }

    /// Phase 1: drain the update queue in FIFO order.
    ///
    /// Each closure observes the snapshot published by its predecessor in
    /// the same drain. A failing closure is logged and skipped; the shared
    /// pointer is left untouched for it.
    ///
    /// 阶段 1：按 FIFO 顺序排空更新队列。
    /// 每个闭包都能观察到同一轮排空中其前驱发布的快照。
    /// 失败的闭包记录日志后跳过，共享指针保持不变。
    pub(crate) fn apply_pending(&self) {
        let mut applied = 0u64;
        while let Some(update) = self.shared.queue.pop() {
            let current_ptr = self.shared.ptr.load(Ordering::Acquire);
            // SAFETY: the cell is non-null, and only this thread swaps it,
            // so the snapshot stays alive across the closure call.
            // SAFETY: 该单元非空，并且只有本线程执行交换，
            // 因此快照在闭包调用期间保持存活。
            let current = unsafe { &*current_ptr };
            match update(current) {
                Ok(next) => {
                    let next_ptr = Box::into_raw(Box::new(next));
                    let displaced = self.shared.ptr.swap(next_ptr, Ordering::AcqRel);
                    let epoch = self.shared.global_epoch.load(Ordering::Acquire);
                    // SAFETY: displaced came out of the cell and is owned by
                    // nobody else once unpublished.
                    // SAFETY: displaced 来自该单元，撤下发布后不再被任何
                    // 其他所有者持有。
                    let displaced = unsafe { Box::from_raw(displaced) };
                    self.shared.bags.lock().retire(displaced, epoch);
                    self.shared.stats.updates.fetch_add(1, Ordering::Relaxed);
                    applied += 1;
                }
                Err(err) => {
                    warn!(target: "rcu_epoch", error = %err, "update_failed");
                }
            }
        }
        if applied > 0 {
            debug!(target: "rcu_epoch", applied, "updates_published");
        }
    }

    /// Phase 2: advance the global epoch if every active participant has
    /// caught up, and on success destroy the bag two epochs behind.
    ///
    /// 阶段 2：当所有活跃参与者都已跟上时推进全局纪元，
    /// 成功后销毁落后两个纪元的袋。
    pub(crate) fn try_advance_and_reclaim(&self) {
        let epoch = self.shared.global_epoch.load(Ordering::Acquire);

        {
            let participants = self.shared.participants.lock();
            for participant in participants.iter() {
                // The acquire load of the flag makes the epoch stored before
                // the flag's release visible.
                // 对标志的 acquire 加载使标志 release 之前存入的纪元可见。
                if participant.active.load(Ordering::Acquire)
                    && participant.local_epoch.load(Ordering::Acquire) < epoch
                {
                    return;
                }
            }
        }

        // Only this thread advances the epoch; the CAS still guards against
        // a torn read of a stale value.
        // 只有本线程推进纪元；CAS 仍可防止对过期值的误用。
        if self
            .shared
            .global_epoch
            .compare_exchange(epoch, epoch + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.shared
                .stats
                .epoch_advances
                .fetch_add(1, Ordering::Relaxed);
            let new_epoch = epoch + 1;
            if new_epoch >= 2 {
                let freed = self.shared.bags.lock().reclaim(new_epoch);
                if freed > 0 {
                    self.shared
                        .stats
                        .reclamations
                        .fetch_add(freed as u64, Ordering::Relaxed);
                    debug!(target: "rcu_epoch", new_epoch, freed, "snapshots_reclaimed");
                }
            }
        }
    }
}
