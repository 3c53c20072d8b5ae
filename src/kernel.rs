//! [`Kernel`]: the top-level round-robin driver over a fixed set of
//! [`Schedule`] handlers, each paired with its own capability bundle.

use core::cell::{Cell, UnsafeCell};

use crate::bundle::Capability;
use crate::context::{self, TickType};
use crate::scheduler::Schedule;

#[cfg(feature = "log")]
use log::{debug, trace};

struct HandlerSlot<'a, H> {
    handler: &'a dyn Schedule,
    bundle: H,
}

/// Round-robins up to `N` `(handler, bundle)` pairs — typically
/// [`crate::task_handler::TaskHandler`] instances, but a nested `Kernel`
/// satisfies [`Schedule`] too — for at least `min_duration` ticks per
/// [`Kernel::schedule`] call.
///
/// A handler's bundle gates and brackets its `schedule()` call exactly like
/// a task's bundle gates and brackets its task function in
/// [`crate::task_handler::TaskHandler`] — the Kernel is just one more layer
/// of the same five-hook contract, one level up.
///
/// Handlers are borrowed, not owned — `'a` ties the `Kernel` to the
/// lifetime of whatever owns its handlers, which in a typical embedded
/// `main` is `'static` because everything lives in a top-level `static` or
/// the entry function's stack frame that never returns.
pub struct Kernel<'a, H, const N: usize> {
    slots: [UnsafeCell<Option<HandlerSlot<'a, H>>>; N],
    idle_task: Cell<Option<fn()>>,
}

impl<'a, H, const N: usize> Kernel<'a, H, N>
where
    H: Capability + Default,
{
    /// Builds a `Kernel` with no handlers and no idle task registered.
    pub fn new() -> Self {
        Kernel {
            slots: core::array::from_fn(|_| UnsafeCell::new(None)),
            idle_task: Cell::new(None),
        }
    }

    /// Registers `handler` in the first free slot and initializes its
    /// bundle.
    ///
    /// Returns `false` if every slot is already occupied.
    pub fn add_handler(&self, handler: &'a dyn Schedule) -> bool {
        for slot in &self.slots {
            // SAFETY: no other reference to this slot is held concurrently;
            // the crate is single-threaded and this call does not re-enter
            // `Kernel::schedule`.
            let slot = unsafe { &mut *slot.get() };
            if slot.is_some() {
                continue;
            }
            let mut bundle = H::default();
            bundle.init();
            *slot = Some(HandlerSlot { handler, bundle });
            return true;
        }
        #[cfg(feature = "log")]
        debug!("add_handler: no free slot among {N}");
        false
    }

    /// Removes `handler`, identified by reference equality, if its bundle
    /// reports `is_del_ready`.
    ///
    /// Returns `false` if it was never registered or is not yet
    /// deletion-ready.
    pub fn remove_handler(&self, handler: &'a dyn Schedule) -> bool {
        for cell in &self.slots {
            // SAFETY: see `add_handler`.
            let slot = unsafe { &mut *cell.get() };
            let Some(occupied) = slot else { continue };
            if !core::ptr::eq(
                occupied.handler as *const dyn Schedule,
                handler as *const dyn Schedule,
            ) {
                continue;
            }
            if !occupied.bundle.is_del_ready() {
                #[cfg(feature = "log")]
                trace!("remove_handler: refused, not deletion-ready");
                return false;
            }
            occupied.bundle.pre_del();
            *slot = None;
            #[cfg(feature = "log")]
            debug!("handler removed");
            return true;
        }
        false
    }

    /// Returns the bundle paired with `handler`, if registered.
    pub fn get_handle(&self, handler: &'a dyn Schedule) -> Option<&mut H> {
        for cell in &self.slots {
            // SAFETY: see `add_handler`.
            let slot = unsafe { &mut *cell.get() };
            if let Some(occupied) = slot {
                if core::ptr::eq(
                    occupied.handler as *const dyn Schedule,
                    handler as *const dyn Schedule,
                ) {
                    return Some(&mut occupied.bundle);
                }
            }
        }
        None
    }

    /// Installs the function called once per inner sweep in which no
    /// handler reported doing work — the cooperative equivalent of
    /// entering a low-power wait.
    pub fn set_idle_task(&self, idle_task: fn()) {
        self.idle_task.set(Some(idle_task));
    }

    /// Round-robins every registered handler, advancing the global cycle
    /// counter once per inner iteration, until at least `min_duration`
    /// ticks have elapsed.
    ///
    /// While this call is on the stack, this `Kernel` is installed as the
    /// process-wide master scheduler (unless an outer, still-running
    /// `schedule` call already claimed that role), so that
    /// `Coroutine::wait_for` can re-enter it from inside a task body.
    ///
    /// Returns `true` iff any handler ever reported doing work.
    pub fn schedule(&self, min_duration: TickType) -> bool {
        let start = context::tick();
        // SAFETY: `self` outlives this call, which is the entire window
        // during which the master handle may be dereferenced.
        let installed_master = unsafe { context::try_set_master(self, Self::master_call) };
        let mut any_cycle_did_work = false;
        loop {
            context::advance_cycle();
            let mut sweep_did_work = false;
            for (i, cell) in self.slots.iter().enumerate() {
                // SAFETY: see `add_handler` — reentrant calls (via
                // `Coroutine::wait_for`) only ever touch a *different*
                // slot's handler, never this one, because a handler whose
                // own task is `Running` is not re-selected.
                let slot = unsafe { &mut *cell.get() };
                let Some(occupied) = slot else { continue };
                if !occupied.bundle.is_exe_ready() {
                    continue;
                }
                occupied.bundle.pre_exe();
                let did_work = occupied.handler.schedule();
                occupied.bundle.post_exe();
                if did_work {
                    #[cfg(feature = "log")]
                    trace!("handler {i} did work");
                    sweep_did_work = true;
                }
            }
            if !sweep_did_work {
                if let Some(idle) = self.idle_task.get() {
                    #[cfg(feature = "log")]
                    trace!("idle");
                    idle();
                }
            } else {
                any_cycle_did_work = true;
            }
            if context::ticks_since(start) >= min_duration {
                break;
            }
        }
        if installed_master {
            context::clear_master();
        }
        any_cycle_did_work
    }

    /// # Safety
    ///
    /// `target` must actually point to a live `Kernel<'a, H, N>` —
    /// guaranteed because this function pointer is only ever installed,
    /// paired with `self`, by [`Kernel::schedule`].
    unsafe fn master_call(target: *const (), min_duration: TickType) -> bool {
        let kernel = unsafe { &*target.cast::<Self>() };
        kernel.schedule(min_duration)
    }
}

impl<H, const N: usize> Default for Kernel<'_, H, N>
where
    H: Capability + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H, const N: usize> Schedule for Kernel<'_, H, N>
where
    H: Capability + Default,
{
    fn schedule(&self) -> bool {
        Kernel::schedule(self, 0)
    }
}
