//! Cycle-counter-gated execution frequency.

use crate::bundle::Capability;
use crate::context;

/// Runs its owning task once every `priority` scheduler cycles.
///
/// `priority = 1` runs every cycle; `priority = 255` runs once every 255.
/// Priority reads the process-wide cycle counter ([`context::cycle`]), not a
/// per-task counter, so tasks of equal priority stay in lockstep with each
/// other.
pub struct Priority {
    priority: u8,
}

impl Default for Priority {
    fn default() -> Self {
        Priority { priority: 1 }
    }
}

impl Priority {
    /// Sets the priority. `0` is clamped up to `1` — a priority of zero
    /// would divide by zero in `is_exe_ready`.
    pub fn set_priority(&mut self, priority: u8) {
        self.priority = if priority == 0 { 1 } else { priority };
    }

    /// The current priority value.
    pub fn priority(&self) -> u8 {
        self.priority
    }
}

impl Capability for Priority {
    fn init(&mut self) {
        self.priority = 1;
    }

    fn is_exe_ready(&self) -> bool {
        let cycle = context::cycle();
        // On the zeroth cycle, treat `cycle` as `1` rather than firing every
        // priority unconditionally on `cycle % p == 0`.
        let effective = if cycle == 0 { 1 } else { cycle };
        effective % self.priority as u32 == 0
    }

    fn is_del_ready(&self) -> bool {
        true
    }

    fn pre_exe(&mut self) {}
    fn post_exe(&mut self) {}
    fn pre_del(&mut self) {}
}
