use thiserror::Error;

/// Boxed error returned by a failing update closure.
///
/// The reclaimer logs the error and skips the publication; subsequent
/// queued updates still run.
///
/// 更新闭包失败时返回的装箱错误。
/// 回收器会记录该错误并跳过本次发布，后续排队的更新仍会执行。
pub type UpdateError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by [`Rcu::read`](crate::Rcu::read) and
/// [`Rcu::update`](crate::Rcu::update).
///
/// [`Rcu::read`](crate::Rcu::read) 和 [`Rcu::update`](crate::Rcu::update)
/// 向调用者暴露的错误。
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RcuError {
    /// The instance is not in the `Active` phase (construction has not
    /// finished, or shutdown has begun).
    ///
    /// 实例不处于 `Active` 阶段（构造尚未完成，或关闭已经开始）。
    #[error("rcu instance is not active")]
    NotActive,

    /// The update queue is at capacity. The caller decides whether to retry.
    ///
    /// 更新队列已满。由调用者决定是否重试。
    #[error("update queue is full")]
    QueueFull,
}
