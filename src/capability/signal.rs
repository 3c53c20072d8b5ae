//! Fixed-capacity inter-task messaging.

use crate::bundle::Capability;
use crate::capability::status::StatusPort;
use crate::fifo::Fifo;

/// A per-task inbox of depth `N`. Any task may `send` into it; only the
/// owning task may `receive` from it, and only while it is actually
/// running.
///
/// Requires a `Status`/`StatusNotify` sibling in the same bundle — `receive`
/// takes it as an explicit `&S` parameter (see the `capability` module's
/// sibling-lookup note) rather than searching for it.
pub struct Signal<T, const N: usize> {
    inbox: Fifo<T, N>,
}

impl<T: Copy, const N: usize> Default for Signal<T, N> {
    fn default() -> Self {
        Signal {
            inbox: Fifo::new(),
        }
    }
}

impl<T: Copy, const N: usize> Signal<T, N> {
    /// Pushes `value` into `receiver`'s inbox. `self` is the sender and is
    /// not otherwise consulted — only `receiver`'s inbox is touched.
    ///
    /// Returns `false` without effect if the receiver's inbox is full.
    pub fn send(&self, receiver: &mut Signal<T, N>, value: T) -> bool {
        receiver.inbox.push(value)
    }

    /// Pops the oldest queued value, or returns `default` unless `status`
    /// reports the owning task is currently running — calling `receive`
    /// from outside the owner's own task body always yields `default`,
    /// never a queued value meant for the owner.
    pub fn receive<S: StatusPort>(&mut self, status: &S, default: T) -> T {
        if !status.is_running() {
            return default;
        }
        self.inbox.pop().unwrap_or(default)
    }

    /// Whether at least one value is queued.
    pub fn has_data(&self) -> bool {
        !self.inbox.is_empty()
    }
}

impl<T: Copy, const N: usize> Capability for Signal<T, N> {
    fn init(&mut self) {
        self.inbox = Fifo::new();
    }

    fn is_exe_ready(&self) -> bool {
        true
    }

    fn is_del_ready(&self) -> bool {
        self.inbox.is_empty()
    }

    fn pre_exe(&mut self) {}
    fn post_exe(&mut self) {}
    fn pre_del(&mut self) {}
}
