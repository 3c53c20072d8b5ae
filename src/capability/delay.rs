//! One-shot delayed execution.

use crate::bundle::Capability;
use crate::context::{self, TickType};

/// Runs its owning task once `tick() >= deadline`.
///
/// `init` sets the deadline to "now", so a freshly created task with no
/// `set_delay` call is immediately exe-ready.
pub struct Delay {
    deadline: TickType,
}

impl Default for Delay {
    fn default() -> Self {
        Delay { deadline: 0 }
    }
}

impl Delay {
    /// Pushes the deadline to `now + delay`.
    pub fn set_delay(&mut self, delay: TickType) {
        self.deadline = context::tick().wrapping_add(delay);
    }

    /// Ticks remaining until the deadline, saturating at `0` once it has
    /// passed.
    pub fn get_delay(&self) -> TickType {
        let now = context::tick();
        if self.deadline > now {
            self.deadline - now
        } else {
            0
        }
    }
}

impl Capability for Delay {
    fn init(&mut self) {
        self.deadline = context::tick();
    }

    fn is_exe_ready(&self) -> bool {
        context::tick() >= self.deadline
    }

    fn is_del_ready(&self) -> bool {
        true
    }

    fn pre_exe(&mut self) {}
    fn post_exe(&mut self) {}
    fn pre_del(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_delay_saturates_at_zero_once_past_deadline() {
        let mut delay = Delay::default();
        delay.init();
        assert_eq!(delay.get_delay(), 0);
    }

    #[test]
    fn is_exe_ready_false_immediately_after_set_delay() {
        let mut delay = Delay::default();
        delay.init();
        delay.set_delay(1000);
        assert!(!delay.is_exe_ready());
    }
}
