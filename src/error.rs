//! Out-of-band diagnostics layered over the scheduler's sentinel returns.
//!
//! Every fallible operation in this crate still returns the exact
//! `bool`/`Option` sentinel its contract promises; nothing here replaces that.
//! [`SchedulerError`] exists only so the handler-exception hook and the `log`
//! call sites can say *why* a sentinel came back empty.

use core::fmt;

/// Reason a scheduler or task-handler operation returned its "nothing
/// happened" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedulerError {
    /// `Kernel::add_handler` was called with `handler_count == max_handler_count`.
    HandlerCapacityExceeded,
    /// `TaskHandler::create_task` was called with every slot occupied.
    TaskCapacityExceeded,
    /// `remove_handler`/`delete_task` refused because `is_del_ready()` was false.
    NotDeletionReady,
    /// `this_task`/`this_task_id` was called outside of a running task body,
    /// or a `TaskId` named a slot outside `[1, task_count]`.
    IllegalReentrancy,
    /// A `TaskId`/handler reference did not match any live slot.
    TaskNotFound,
    /// `MemPool32::allocate` found every slot of the pool occupied.
    PoolExhausted,
    /// `MemPool32::allocate` was called while the task already held a block.
    AlreadyAllocated,
    /// `MemPool32::release` was called while the task held no block.
    NotAllocated,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            SchedulerError::HandlerCapacityExceeded => "handler capacity exceeded",
            SchedulerError::TaskCapacityExceeded => "task capacity exceeded",
            SchedulerError::NotDeletionReady => "not deletion-ready",
            SchedulerError::IllegalReentrancy => "illegal call outside a running task body",
            SchedulerError::TaskNotFound => "no matching slot",
            SchedulerError::PoolExhausted => "memory pool exhausted",
            SchedulerError::AlreadyAllocated => "task already holds a pool block",
            SchedulerError::NotAllocated => "task holds no pool block",
        };
        f.write_str(message)
    }
}
