use std::cell::UnsafeCell;

use crate::error::UpdateError;
use crate::sync::{AtomicU64, Ordering};

/// A queued update: consumes the current snapshot by reference, produces the
/// successor value or an error.
///
/// 排队的更新：以引用方式读取当前快照，产出后继值或一个错误。
pub(crate) type UpdateFn<T> = Box<dyn FnOnce(&T) -> Result<T, UpdateError> + Send>;

/// One ring slot. `seq` carries the Vyukov-style publication token:
/// `index` means free for the producer claiming `index`, `index + 1` means
/// the payload is readable, `index + capacity` means consumed and free for
/// the next lap.
///
/// 一个环形槽。`seq` 携带 Vyukov 风格的发布令牌：
/// `index` 表示可供认领 `index` 的生产者写入，`index + 1` 表示载荷可读，
/// `index + capacity` 表示已消费并可供下一圈使用。
struct Slot<T> {
    seq: AtomicU64,
    value: UnsafeCell<Option<UpdateFn<T>>>,
}

/// Bounded multi-producer single-consumer ring of pending updates.
///
/// Producers claim a slot by CAS on the write index after checking that more
/// than one free slot remains; the reserved slack slot is what distinguishes
/// the full state from the empty state. The reclaimer is the only consumer,
/// architecturally: nothing else ever calls [`UpdateQueue::pop`].
///
/// 有界的多生产者单消费者更新环。
/// 生产者在确认剩余空槽多于一个后通过对写索引的 CAS 认领槽位；
/// 保留的空槽用于区分满与空两种状态。
/// 回收器是结构上唯一的消费者：没有其他代码调用 [`UpdateQueue::pop`]。
pub(crate) struct UpdateQueue<T> {
    slots: Box<[Slot<T>]>,
    /// Write index, claimed by producers.
    /// 写索引，由生产者认领。
    tail: AtomicU64,
    /// Read index, owned by the sole consumer.
    /// 读索引，由唯一消费者持有。
    head: AtomicU64,
}

// The value cells are published through the per-slot `seq` protocol: a cell
// is written by exactly one claiming producer and read by the sole consumer
// only after the release store of `seq`.
unsafe impl<T> Send for UpdateQueue<T> {}
unsafe impl<T> Sync for UpdateQueue<T> {}

impl<T> UpdateQueue<T> {
    /// `capacity` includes the reserved slack slot, so the ring holds at most
    /// `capacity - 1` pending updates. Capacities below 2 are meaningless and
    /// rounded up.
    ///
    /// `capacity` 包含保留的空槽，因此环中最多容纳 `capacity - 1` 个
    /// 待处理更新。小于 2 的容量没有意义，会被向上取整。
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let slots = (0..capacity as u64)
            .map(|i| Slot {
                seq: AtomicU64::new(i),
                value: UnsafeCell::new(None),
            })
            .collect();
        Self {
            slots,
            tail: AtomicU64::new(0),
            head: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of claimed-but-unconsumed entries. Approximate under
    /// concurrency; exact when producers are quiescent.
    ///
    /// 已认领但未消费的条目数。并发时为近似值，生产者静止时精确。
    #[inline]
    pub(crate) fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (tail - head) as usize
    }

    /// Enqueue an update. Fails by handing the closure back once only the
    /// slack slot remains free.
    ///
    /// 将更新入队。当只剩保留空槽时失败，并将闭包交还给调用者。
    pub(crate) fn push(&self, update: UpdateFn<T>) -> Result<(), UpdateFn<T>> {
        let capacity = self.slots.len() as u64;
        let mut tail = self.tail.load(Ordering::Relaxed);
        loop {
            let head = self.head.load(Ordering::Acquire);
            if capacity - (tail - head) <= 1 {
                return Err(update);
            }
            match self.tail.compare_exchange_weak(
                tail,
                tail + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => tail = observed,
            }
        }

        let slot = &self.slots[(tail % capacity) as usize];
        // The slack check guarantees the consumer already cycled this slot.
        debug_assert_eq!(slot.seq.load(Ordering::Acquire), tail);
        unsafe {
            *slot.value.get() = Some(update);
        }
        slot.seq.store(tail + 1, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest published update.
    ///
    /// Returns `None` when the ring is empty or the entry at the read index
    /// has been claimed but not yet published; the consumer simply retries on
    /// its next cycle.
    ///
    /// 取出最早发布的更新。
    /// 当环为空，或读索引处的条目已被认领但尚未发布时返回 `None`，
    /// 消费者会在下一个周期重试。
    pub(crate) fn pop(&self) -> Option<UpdateFn<T>> {
        let capacity = self.slots.len() as u64;
        let head = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[(head % capacity) as usize];
        if slot.seq.load(Ordering::Acquire) != head + 1 {
            return None;
        }
        let update = unsafe { (*slot.value.get()).take() };
        debug_assert!(update.is_some());
        slot.seq.store(head + capacity, Ordering::Release);
        self.head.store(head + 1, Ordering::Release);
        update
    }
}
