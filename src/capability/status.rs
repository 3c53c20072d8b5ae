//! Task lifecycle status: `Running`/`Started`/`Suspended`/`Locked`, plus a
//! notify-on-change variant.

use core::cell::Cell;

use bitflags::bitflags;

use crate::bundle::Capability;

bitflags! {
    /// The four status bits every Status-bearing capability tracks.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct StatusFlags: u8 {
        /// Set for the duration of the task's body (between `pre_exe` and
        /// `post_exe`).
        const RUNNING   = 0b0000_0001;
        /// Set once the task has completed at least one full execution.
        const STARTED   = 0b0000_0010;
        /// While set, `is_exe_ready` is false — the task is skipped.
        const SUSPENDED = 0b0000_0100;
        /// While set, `is_del_ready` is false and only `LOCKED` itself may
        /// be cleared by `set_status`.
        const LOCKED    = 0b0000_1000;
    }
}

/// The read-only subset of [`Status`]/[`StatusNotify`] that sibling
/// capabilities (`Signal`, `LinkedList`, `Coroutine`) depend on.
///
/// Replaces the original's `reinterpret_cast<Status *>(this)` sibling
/// lookup: a dependent module takes its sibling as an explicit `S:
/// StatusPort` type parameter instead of reinterpreting its own bundle's
/// bytes.
pub trait StatusPort {
    /// Whether the task is currently executing its body.
    fn is_running(&self) -> bool;
    /// Whether the task has completed at least one execution.
    fn is_started(&self) -> bool;
}

/// Plain task status: no change notifications.
#[derive(Default)]
pub struct Status {
    flags: StatusFlags,
}

impl Status {
    /// Whether every bit in `mask` is set.
    pub fn is_status(&self, mask: StatusFlags) -> bool {
        self.flags.contains(mask)
    }

    /// Sets or clears the bits in `mask`.
    ///
    /// While `LOCKED` is set, the only mutation accepted is clearing
    /// `LOCKED` itself — a locked task cannot have any other bit touched
    /// until it is unlocked.
    pub fn set_status(&mut self, mask: StatusFlags, state: bool) {
        if self.flags.contains(StatusFlags::LOCKED) && mask != StatusFlags::LOCKED {
            return;
        }
        self.flags.set(mask, state);
    }
}

impl StatusPort for Status {
    fn is_running(&self) -> bool {
        self.flags.contains(StatusFlags::RUNNING)
    }

    fn is_started(&self) -> bool {
        self.flags.contains(StatusFlags::STARTED)
    }
}

impl Capability for Status {
    fn init(&mut self) {
        self.flags = StatusFlags::empty();
    }

    fn is_exe_ready(&self) -> bool {
        !self.flags.contains(StatusFlags::SUSPENDED)
    }

    fn is_del_ready(&self) -> bool {
        !self.flags.contains(StatusFlags::LOCKED)
    }

    fn pre_exe(&mut self) {
        self.flags.insert(StatusFlags::RUNNING);
    }

    fn post_exe(&mut self) {
        self.flags.remove(StatusFlags::RUNNING);
        self.flags.insert(StatusFlags::STARTED);
    }

    fn pre_del(&mut self) {}
}

bitflags! {
    /// Which status transitions [`StatusNotify`] reports through its hook.
    ///
    /// Kept as a separate field from [`StatusFlags`] rather than packed into
    /// the high nibble of the same byte the way the original's `mStatus`
    /// does double duty — the packed encoding saved one byte in exchange
    /// for a notify call site that has to shift and mask the same field
    /// twice; splitting the two concerns into separate fields costs a byte
    /// and reads far more directly.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct NotifyFlags: u8 {
        const STARTED   = 0b0001;
        const SUSPENDED = 0b0010;
        const LOCKED    = 0b0100;
        const DELETED   = 0b1000;
    }
}

fn status_to_notify(mask: StatusFlags) -> NotifyFlags {
    let mut notify = NotifyFlags::empty();
    notify.set(NotifyFlags::STARTED, mask.contains(StatusFlags::STARTED));
    notify.set(NotifyFlags::SUSPENDED, mask.contains(StatusFlags::SUSPENDED));
    notify.set(NotifyFlags::LOCKED, mask.contains(StatusFlags::LOCKED));
    notify
}

/// [`Status`] plus a per-flag notify-on-change hook.
///
/// `set_status` fires the hook whenever it touches a bit armed via
/// `set_notify_armed`, passing the status immediately before and after the
/// call — not only when the value actually flips, matching the original's
/// call-triggered (not edge-triggered) notification.
pub struct StatusNotify {
    status: StatusFlags,
    notify_armed: NotifyFlags,
    hook: Cell<Option<fn(StatusFlags, StatusFlags)>>,
}

impl Default for StatusNotify {
    fn default() -> Self {
        StatusNotify {
            status: StatusFlags::empty(),
            notify_armed: NotifyFlags::empty(),
            hook: Cell::new(None),
        }
    }
}

impl StatusNotify {
    /// Whether every bit in `mask` is set.
    pub fn is_status(&self, mask: StatusFlags) -> bool {
        self.status.contains(mask)
    }

    /// Arms or disarms notification for the transitions in `mask`.
    pub fn set_notify_armed(&mut self, mask: NotifyFlags, armed: bool) {
        self.notify_armed.set(mask, armed);
    }

    /// Installs the callback invoked on an armed status transition.
    pub fn set_notify_hook(&self, hook: fn(StatusFlags, StatusFlags)) {
        self.hook.set(Some(hook));
    }

    /// Sets or clears the bits in `mask`, honoring the same lock rule as
    /// [`Status::set_status`] and firing the notify hook if any touched bit
    /// is armed.
    pub fn set_status(&mut self, mask: StatusFlags, state: bool) {
        if self.status.contains(StatusFlags::LOCKED) && mask != StatusFlags::LOCKED {
            return;
        }
        let prev = self.status;
        self.status.set(mask, state);
        if !(status_to_notify(mask) & self.notify_armed).is_empty() {
            if let Some(hook) = self.hook.get() {
                hook(prev, self.status);
            }
        }
    }
}

impl StatusPort for StatusNotify {
    fn is_running(&self) -> bool {
        self.status.contains(StatusFlags::RUNNING)
    }

    fn is_started(&self) -> bool {
        self.status.contains(StatusFlags::STARTED)
    }
}

impl Capability for StatusNotify {
    fn init(&mut self) {
        self.status = StatusFlags::empty();
    }

    fn is_exe_ready(&self) -> bool {
        !self.status.contains(StatusFlags::SUSPENDED)
    }

    fn is_del_ready(&self) -> bool {
        !self.status.contains(StatusFlags::LOCKED)
    }

    fn pre_exe(&mut self) {
        self.set_status(StatusFlags::RUNNING, true);
    }

    fn post_exe(&mut self) {
        self.set_status(StatusFlags::RUNNING, false);
        self.set_status(StatusFlags::STARTED, true);
    }

    fn pre_del(&mut self) {
        if self.notify_armed.contains(NotifyFlags::DELETED) {
            if let Some(hook) = self.hook.get() {
                hook(self.status, StatusFlags::empty());
            }
        }
        self.status = StatusFlags::empty();
    }
}
