use tracing::debug;

use crate::state::{Participant, SharedState};
use crate::sync::{Arc, Cell, Ordering};

/// The value held in each thread's local slot: the registered participant
/// record plus the reentrant pin count for that thread.
///
/// 每个线程本地槽中持有的值：已注册的参与者记录，
/// 以及该线程的可重入 pin 计数。
pub(crate) struct LocalParticipant {
    /// This thread's record in the registry.
    /// 此线程在注册表中的记录。
    pub(crate) record: Arc<Participant>,
    /// Live guards on this thread.
    /// 此线程上存活的守卫数量。
    pub(crate) pin_count: Cell<usize>,
}

/// Begin a read critical section on the calling thread.
///
/// Fast path: the thread-local slot already holds this thread's participant.
/// Slow path: allocate a record, insert it into the registry under the short
/// mutex, and cache it in the slot. Only the first guard on a thread
/// publishes the epoch and the active flag; nested acquisitions just bump the
/// pin count.
///
/// 在调用线程上开始一个读临界区。
/// 快速路径：线程本地槽已持有此线程的参与者。
/// 慢速路径：分配一条记录，在短互斥锁下插入注册表，并缓存到槽中。
/// 只有线程上的第一个守卫会发布纪元和活跃标志，
/// 嵌套获取只递增 pin 计数。
pub(crate) fn acquire<'a, T>(shared: &'a SharedState<T>) -> ReadGuard<'a, T> {
    let local = shared.locals.get_or(|| {
        let thread = std::thread::current()
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{:?}", std::thread::current().id()));
        let record = Arc::new(Participant::new(thread));
        shared.participants.lock().push(Arc::clone(&record));
        debug!(target: "rcu_epoch", thread = %record.thread, "participant_registered");
        LocalParticipant {
            record,
            pin_count: Cell::new(0),
        }
    });

    let pin_count = local.pin_count.get();
    if pin_count == 0 {
        // Acquire pairs with the advancing CAS; the epoch written here is
        // published to the reclaimer by the release store of the flag.
        // Acquire 与推进纪元的 CAS 配对；此处写入的纪元
        // 通过活跃标志的 release 存储发布给回收器。
        let epoch = shared.global_epoch.load(Ordering::Acquire);
        local.record.local_epoch.store(epoch, Ordering::Relaxed);
        local.record.active.store(true, Ordering::Release);
    }
    local.pin_count.set(pin_count + 1);

    ReadGuard {
        shared,
        local: local as *const LocalParticipant,
    }
}

/// A live read critical section.
///
/// While any guard on a thread is alive, that thread's participant record
/// stays active at its pinned epoch and the reclaimer will not destroy any
/// snapshot the guard can still reach. Dropping the last guard on the thread
/// releases the critical section.
///
/// The guard is `!Send` and `!Sync`: it points into the creating thread's
/// local slot.
///
/// 一个存活的读临界区。
/// 只要线程上还有守卫存活，该线程的参与者记录就保持在其固定纪元上活跃，
/// 回收器不会销毁该守卫仍可触及的任何快照。
/// 线程上最后一个守卫被 drop 时释放临界区。
/// 守卫是 `!Send` 和 `!Sync` 的：它指向创建线程的本地槽。
#[must_use]
pub struct ReadGuard<'a, T> {
    shared: &'a SharedState<T>,
    local: *const LocalParticipant,
}

impl<'a, T> ReadGuard<'a, T> {
    /// Read the currently published snapshot.
    ///
    /// The returned reference is bound to the guard; the compiler rejects
    /// any use after the guard is dropped.
    ///
    /// 读取当前发布的快照。
    /// 返回的引用绑定到守卫上，编译器会拒绝守卫 drop 之后的任何使用。
    #[inline]
    pub fn get(&self) -> &T {
        let ptr = self.shared.ptr.load(Ordering::Acquire);
        // SAFETY: the cell is non-null for the whole Active phase, and the
        // active participant record keeps the reclaimer from destroying any
        // snapshot loaded through this guard.
        // SAFETY: 在整个 Active 阶段该单元非空，且活跃的参与者记录
        // 阻止回收器销毁通过此守卫加载的任何快照。
        unsafe { &*ptr }
    }
}

impl<'a, T> std::ops::Deref for ReadGuard<'a, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.get()
    }
}

impl<'a, T> Clone for ReadGuard<'a, T> {
    /// Cloning re-enters the critical section by bumping the pin count.
    /// 克隆通过递增 pin 计数重入临界区。
    fn clone(&self) -> Self {
        // SAFETY: local points into this thread's slot, which lives as long
        // as the instance.
        // SAFETY: local 指向此线程的槽，其生命周期与实例相同。
        let local = unsafe { &*self.local };
        let pin_count = local.pin_count.get();
        assert!(pin_count > 0, "cloning a ReadGuard in an unpinned state");
        local.pin_count.set(pin_count + 1);
        ReadGuard {
            shared: self.shared,
            local: self.local,
        }
    }
}

impl<'a, T> Drop for ReadGuard<'a, T> {
    fn drop(&mut self) {
        // SAFETY: local points into this thread's slot, which lives as long
        // as the instance.
        // SAFETY: local 指向此线程的槽，其生命周期与实例相同。
        let local = unsafe { &*self.local };
        let pin_count = local.pin_count.get();
        assert!(pin_count > 0, "dropping a ReadGuard in an unpinned state");
        if pin_count == 1 {
            // Release pairs with the acquire loads in the grace-period scan.
            // Release 与宽限期扫描中的 acquire 加载配对。
            local.record.active.store(false, Ordering::Release);
        }
        local.pin_count.set(pin_count - 1);
    }
}
