use tracing::warn;

use crate::state::BAG_COUNT;

/// A snapshot that has been unpublished but not yet destroyed. The epoch tag
/// is kept for the reclamation assertions.
///
/// 一个已被撤下但尚未销毁的快照。纪元标签保留用于回收断言。
#[derive(Debug)]
pub(crate) struct Retired<T> {
    value: Box<T>,
    retire_epoch: u64,
}

/// Three rotating bags of retired snapshots, indexed by `retire_epoch % 3`.
///
/// A value retired at epoch `E` stays in its bag until the global epoch has
/// reached `E + 2`; the bag two epochs behind is therefore always safe to
/// empty after a successful advance. Entries left over at teardown are
/// destroyed by the normal `Drop` of the bags.
///
/// 三个轮换的退休快照袋，按 `retire_epoch % 3` 索引。
/// 在纪元 `E` 退休的值会留在袋中，直到全局纪元达到 `E + 2`；
/// 因此每次成功推进后，落后两个纪元的袋总是可以安全清空。
/// 析构时袋中残留的条目由袋自身的 `Drop` 销毁。
#[derive(Debug)]
pub(crate) struct RetireBags<T> {
    bags: [Vec<Retired<T>>; BAG_COUNT as usize],
}

impl<T> RetireBags<T> {
    /// Reserve `capacity` entries per bag up front; bags may still grow.
    /// 预先为每个袋保留 `capacity` 个条目；袋仍可增长。
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            bags: [
                Vec::with_capacity(capacity),
                Vec::with_capacity(capacity),
                Vec::with_capacity(capacity),
            ],
        }
    }

    /// Total number of values awaiting reclamation.
    /// 等待回收的值的总数。
    pub(crate) fn total(&self) -> usize {
        self.bags.iter().map(Vec::len).sum()
    }

    /// Defer destruction of `value`, displaced from the shared cell at
    /// `retire_epoch`.
    ///
    /// If growing the bag fails, the value is destroyed on the spot instead.
    /// That is safe here and only here: the value was unpublished by the swap
    /// that displaced it, so no guard acquired after the swap can reach it,
    /// and guards acquired before it hold the still-published predecessor.
    ///
    /// 推迟销毁在 `retire_epoch` 时从共享单元中被换下的 `value`。
    /// 如果袋扩容失败，则当场销毁该值。这只在此处是安全的：
    /// 该值已被换出而撤下发布，换出之后获取的守卫无法再引用它，
    /// 而换出之前获取的守卫持有的是仍在发布中的前驱值。
    pub(crate) fn retire(&mut self, value: Box<T>, retire_epoch: u64) {
        let bag = &mut self.bags[(retire_epoch % BAG_COUNT) as usize];
        if let Err(err) = bag.try_reserve(1) {
            warn!(
                target: "rcu_epoch",
                retire_epoch,
                error = %err,
                "bag_reserve_failed_immediate_drop"
            );
            drop(value);
            return;
        }
        bag.push(Retired {
            value,
            retire_epoch,
        });
    }

    /// Destroy every entry in the bag two epochs behind `new_epoch` and
    /// return how many were freed. Callable only after a successful advance
    /// to `new_epoch >= 2`.
    ///
    /// 销毁落后 `new_epoch` 两个纪元的袋中的全部条目，并返回释放的数量。
    /// 仅在成功推进到 `new_epoch >= 2` 之后调用。
    pub(crate) fn reclaim(&mut self, new_epoch: u64) -> usize {
        debug_assert!(new_epoch >= 2);
        let reclaim_epoch = new_epoch - 2;
        let index = (reclaim_epoch % BAG_COUNT) as usize;
        let bag = &mut self.bags[index];
        for entry in bag.iter() {
            debug_assert_eq!((entry.retire_epoch % BAG_COUNT) as usize, index);
            debug_assert!(entry.retire_epoch + 2 <= new_epoch);
        }
        let freed = bag.len();
        // clear() drops every retired value and keeps the allocation.
        bag.clear();
        freed
    }
}
