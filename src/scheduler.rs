//! The scheduler contract shared by every [`crate::kernel::Kernel`] handler.

/// Anything the [`crate::kernel::Kernel`] can round-robin.
///
/// [`crate::task_handler::TaskHandler`] is the main implementor, but the
/// contract is deliberately narrow — a nested `Kernel` satisfies it too — so
/// the top-level `Kernel` stays agnostic to what a handler actually contains.
pub trait Schedule {
    /// Runs one sweep of this handler's work.
    ///
    /// Returns `true` iff at least one unit of work ran during the sweep.
    fn schedule(&self) -> bool;
}
