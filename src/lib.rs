//! An epoch-reclaimed read-copy-update cell.
//!
//! [`Rcu<T>`] publishes a single immutable snapshot of `T`. Any number of
//! threads read it through a [`ReadGuard`] with wait-free progress after
//! their first call; writers propose replacements asynchronously through a
//! bounded queue of update closures. A single background reclaimer thread
//! applies the closures in order, swaps the new snapshot into an atomic
//! pointer cell, and destroys displaced snapshots only after a grace
//! period: the global epoch must advance two steps past the epoch at which
//! a snapshot was retired, and an advance is only possible once every
//! active reader has caught up to the current epoch.
//!
//! Updates are applied asynchronously and carry no ordering guarantee
//! relative to concurrent readers: `update()` returning `Ok` means the
//! closure is queued, and a later `read()` observes its effect only once
//! the reclaimer has published it.
//!
//! # Example
//!
//! ```
//! use rcu_epoch::Rcu;
//!
//! let rcu = Rcu::new(8080u32);
//!
//! {
//!     let guard = rcu.read().unwrap();
//!     assert_eq!(*guard.get(), 8080);
//! }
//!
//! rcu.update(|port| Ok(port + 10)).unwrap();
//! # std::thread::sleep(std::time::Duration::from_millis(200));
//! # assert_eq!(*rcu.read().unwrap().get(), 8090);
//!
//! rcu.shutdown();
//! ```
//!
//! 一个基于纪元回收的读-复制-更新单元。
//! [`Rcu<T>`] 发布 `T` 的单一不可变快照。任意数量的线程通过
//! [`ReadGuard`] 读取它；写者通过有界的更新闭包队列异步提交替换。
//! 唯一的后台回收器线程按序应用闭包、将新快照换入原子指针单元，
//! 并只在宽限期之后销毁被换下的快照：全局纪元必须越过快照退休
//! 纪元两步，而只有当所有活跃读者都已跟上当前纪元时才能推进。

mod error;
mod garbage;
mod queue;
mod rcu;
mod reader;
mod reclaim;
mod state;
mod stats;
mod sync;

pub use error::{RcuError, UpdateError};
pub use rcu::{Rcu, RcuBuilder};
pub use reader::ReadGuard;
pub use stats::Diagnostics;

#[cfg(test)]
mod tests;
