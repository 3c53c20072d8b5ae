//! Cooperative, re-entrant waiting.

use core::cell::Cell;

use crate::bundle::Capability;
use crate::context::{self, TickType};

/// Lets a task body suspend itself mid-execution by re-entering the driving
/// [`crate::kernel::Kernel`]'s sweep, advancing peer tasks until `duration`
/// ticks have elapsed.
///
/// `is_exe_ready` must refuse to re-select a task that is already running,
/// or `wait_for` could recursively re-enter its own task body. The original
/// gets this by reinterpreting its `Status` sibling; `Capability::is_exe_ready`
/// has a fixed signature with no room for an extra sibling parameter (unlike
/// `Signal::receive`/`LinkedList::link_on_first_execution`, which are
/// capability-specific methods outside the `Capability` trait and can take
/// one), so `Coroutine` instead tracks its own `running` flag in step with
/// `pre_exe`/`post_exe` — every bundle member observes the same two
/// lifecycle calls each sweep, so no cross-module lookup is needed here.
///
/// Be careful where `wait_for` is called from: it must not be called from
/// an infinite loop within the same task body, and it invalidates whatever
/// `TaskId` the caller cached before the call, since the kernel re-sweep may
/// create or delete unrelated tasks.
pub struct Coroutine {
    running: Cell<bool>,
}

impl Default for Coroutine {
    fn default() -> Self {
        Coroutine {
            running: Cell::new(false),
        }
    }
}

impl Coroutine {
    /// Re-enters the driving kernel's schedule loop for at least `duration`
    /// ticks, running peer tasks in the meantime.
    ///
    /// Returns `false` with no effect if no kernel is currently driving a
    /// `schedule` call on the stack (e.g. called outside a task body).
    pub fn wait_for(&self, duration: TickType) -> bool {
        context::wait_via_master(duration)
    }
}

impl Capability for Coroutine {
    fn init(&mut self) {
        self.running.set(false);
    }

    fn is_exe_ready(&self) -> bool {
        !self.running.get()
    }

    fn is_del_ready(&self) -> bool {
        true
    }

    fn pre_exe(&mut self) {
        self.running.set(true);
    }

    fn post_exe(&mut self) {
        self.running.set(false);
    }

    fn pre_del(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_exe_ready_false_only_while_running() {
        let mut cr = Coroutine::default();
        cr.init();
        assert!(cr.is_exe_ready());
        cr.pre_exe();
        assert!(!cr.is_exe_ready());
        cr.post_exe();
        assert!(cr.is_exe_ready());
    }

    #[test]
    fn wait_for_without_a_driving_kernel_is_a_no_op() {
        let cr = Coroutine::default();
        assert!(!cr.wait_for(10));
    }
}
