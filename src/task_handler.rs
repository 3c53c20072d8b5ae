//! [`TaskHandler`]: a fixed-capacity table of `(function, capability bundle)`
//! pairs, and the most common kind of [`crate::scheduler::Schedule`] handler a
//! [`crate::kernel::Kernel`] round-robins.

use core::cell::{Cell, UnsafeCell};

use crate::bundle::Capability;
use crate::error::SchedulerError;
use crate::scheduler::Schedule;

#[cfg(feature = "log")]
use log::{debug, trace, warn};

/// One-based task identifier. `0` is reserved for "no task" / "illegal".
pub type TaskId = u8;

/// A task's loop-body function, called once per eligible sweep with exclusive
/// access to the owning context `C`.
pub type TaskFn<C> = fn(&mut C);

/// A fixed-capacity pool of `N` tasks, each a [`TaskFn`] paired with a
/// compile-time capability bundle `B`, all bound to one shared owning context
/// `C`.
///
/// This is the composition analogue of the original's
/// `TaskHandler<caller_t, task_module, task_count>`: rather than the task
/// function being a pointer-to-member of a `caller_t` the handler itself
/// multiply-inherits from, `C` is owned directly by the `TaskHandler` and
/// passed to every task function by `&mut` reference.
///
/// Every public method takes `&self`: task bodies are free to call
/// `create_task`/`delete_task` on their own handler (as `Coroutine2`'s
/// self-deleting `cr_end!` does), and `Coroutine::wait_for` can re-enter
/// `Kernel::schedule`, which sweeps this handler again, all from inside an
/// already-running `schedule` call. Interior mutability
/// (`Cell`/`UnsafeCell`) makes that legal Rust; the single-threaded,
/// non-preemptive scheduling model is what makes it *sound* — no two `&mut`
/// references to the same slot are ever formed at once, because a slot whose
/// task is `Running` is never selected again until it returns.
pub struct TaskHandler<C, B, const N: usize> {
    context: UnsafeCell<C>,
    functions: [Cell<Option<TaskFn<C>>>; N],
    bundles: [UnsafeCell<B>; N],
    out_ids: [Cell<Option<*mut TaskId>>; N],
    current_id: Cell<TaskId>,
    exception_hook: Cell<fn(SchedulerError)>,
}

fn default_exception_hook(error: SchedulerError) {
    #[cfg(feature = "log")]
    warn!("task handler exception: {error}");
    #[cfg(not(feature = "log"))]
    let _ = error;
}

impl<C, B, const N: usize> TaskHandler<C, B, N>
where
    B: Capability + Default,
{
    /// Builds an empty task pool bound to `context`.
    pub fn new(context: C) -> Self {
        debug_assert!(N < 254, "task count too high: TaskId would overflow u8");
        TaskHandler {
            context: UnsafeCell::new(context),
            functions: core::array::from_fn(|_| Cell::new(None)),
            bundles: core::array::from_fn(|_| UnsafeCell::new(B::default())),
            out_ids: core::array::from_fn(|_| Cell::new(None)),
            current_id: Cell::new(0),
            exception_hook: Cell::new(default_exception_hook),
        }
    }

    /// Overrides the default (log-and-ignore) handler-exception hook.
    pub fn set_exception_hook(&self, hook: fn(SchedulerError)) {
        self.exception_hook.set(hook);
    }

    fn handler_exception(&self, error: SchedulerError) {
        (self.exception_hook.get())(error);
    }

    /// Creates a task running `function`, writing its assigned [`TaskId`] to
    /// `*out_id` if given.
    ///
    /// Finds the first empty slot, stores `function`, and calls the new
    /// slot's bundle `init`. Returns `false` without side effects if every
    /// slot is occupied.
    pub fn create_task(&self, function: TaskFn<C>, out_id: Option<&mut TaskId>) -> bool {
        for i in 0..N {
            if self.functions[i].get().is_some() {
                continue;
            }
            let id = (i + 1) as TaskId;
            self.functions[i].set(Some(function));
            match out_id {
                Some(out) => {
                    *out = id;
                    self.out_ids[i].set(Some(out as *mut TaskId));
                }
                None => self.out_ids[i].set(None),
            }
            // SAFETY: slot `i` was just claimed by this call; no other
            // reference to `bundles[i]` is live.
            unsafe { (*self.bundles[i].get()).init() };
            #[cfg(feature = "log")]
            debug!("task {id} created");
            return true;
        }
        self.handler_exception(SchedulerError::TaskCapacityExceeded);
        #[cfg(feature = "log")]
        warn!("create_task: no free slot among {N}");
        false
    }

    /// Deletes the task with the given id if its bundle reports
    /// `is_del_ready`; otherwise a silent no-op.
    ///
    /// Returns `true` iff the task was actually deleted.
    pub fn delete_task(&self, id: TaskId) -> bool {
        if id == 0 || (id as usize) > N {
            self.handler_exception(SchedulerError::TaskNotFound);
            return false;
        }
        let i = (id - 1) as usize;
        if self.functions[i].get().is_none() {
            self.handler_exception(SchedulerError::TaskNotFound);
            return false;
        }
        // SAFETY: see struct-level safety note.
        let bundle = unsafe { &mut *self.bundles[i].get() };
        if !bundle.is_del_ready() {
            #[cfg(feature = "log")]
            trace!("delete_task({id}): refused, not deletion-ready");
            return false;
        }
        bundle.pre_del();
        self.functions[i].set(None);
        if let Some(out) = self.out_ids[i].get() {
            // SAFETY: `out` was supplied by the caller of `create_task` and
            // is guaranteed live for at least the task's lifetime.
            unsafe {
                if *out == id {
                    *out = 0;
                }
            }
        }
        self.out_ids[i].set(None);
        #[cfg(feature = "log")]
        debug!("task {id} deleted");
        true
    }

    /// Bounds-checked access to a task's bundle, regardless of whether it is
    /// currently executing.
    pub fn get_task(&self, id: TaskId) -> Option<&mut B> {
        if id == 0 || (id as usize) > N {
            self.handler_exception(SchedulerError::TaskNotFound);
            return None;
        }
        let i = (id - 1) as usize;
        // SAFETY: see struct-level safety note.
        Some(unsafe { &mut *self.bundles[i].get() })
    }

    /// The bundle of the task currently executing, or `None` (after routing
    /// through the handler-exception hook) if called outside a task body.
    pub fn this_task(&self) -> Option<&mut B> {
        let id = self.current_id.get();
        if id == 0 {
            self.handler_exception(SchedulerError::IllegalReentrancy);
            return None;
        }
        self.get_task(id)
    }

    /// The id of the task currently executing, or `0` (after routing through
    /// the handler-exception hook) if called outside a task body.
    pub fn this_task_id(&self) -> TaskId {
        let id = self.current_id.get();
        if id == 0 {
            self.handler_exception(SchedulerError::IllegalReentrancy);
        }
        id
    }
}

impl<C, B, const N: usize> Schedule for TaskHandler<C, B, N>
where
    B: Capability,
{
    fn schedule(&self) -> bool {
        let mut did_work = false;
        for i in 0..N {
            let Some(function) = self.functions[i].get() else {
                continue;
            };
            // SAFETY: see struct-level safety note — a slot whose task is
            // `Running` never has `is_exe_ready` re-checked, so this `&mut`
            // never overlaps with another live reference to the same slot.
            let bundle = unsafe { &mut *self.bundles[i].get() };
            if !bundle.is_exe_ready() {
                continue;
            }
            self.current_id.set((i + 1) as TaskId);
            bundle.pre_exe();
            // SAFETY: `context` has no other live borrow during a sweep;
            // task bodies reach it only through this call.
            let context = unsafe { &mut *self.context.get() };
            function(context);
            bundle.post_exe();
            self.current_id.set(0);
            did_work = true;
        }
        did_work
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct NoopBundle;

    impl Capability for NoopBundle {
        fn init(&mut self) {}
        fn is_exe_ready(&self) -> bool {
            true
        }
        fn is_del_ready(&self) -> bool {
            true
        }
        fn pre_exe(&mut self) {}
        fn post_exe(&mut self) {}
        fn pre_del(&mut self) {}
    }

    #[test]
    fn create_task_assigns_one_based_ids() {
        let handler: TaskHandler<u32, NoopBundle, 4> = TaskHandler::new(0);
        let mut id = 0;
        assert!(handler.create_task(|_| {}, Some(&mut id)));
        assert_eq!(id, 1);
    }

    #[test]
    fn create_task_fails_when_full() {
        let handler: TaskHandler<u32, NoopBundle, 1> = TaskHandler::new(0);
        assert!(handler.create_task(|_| {}, None));
        assert!(!handler.create_task(|_| {}, None));
    }

    #[test]
    fn schedule_invokes_every_ready_task_once() {
        let handler: TaskHandler<u32, NoopBundle, 3> = TaskHandler::new(0);
        handler.create_task(|ctx| *ctx += 1, None);
        handler.create_task(|ctx| *ctx += 10, None);
        let did_work = handler.schedule();
        assert!(did_work);
        assert_eq!(unsafe { *handler.context.get() }, 11);
    }

    #[test]
    fn delete_task_zeroes_outbound_id_cell() {
        let handler: TaskHandler<u32, NoopBundle, 2> = TaskHandler::new(0);
        let mut id = 0;
        handler.create_task(|_| {}, Some(&mut id));
        assert!(handler.delete_task(id));
        assert_eq!(id, 0);
    }

    #[test]
    fn delete_task_rejects_unknown_id() {
        let handler: TaskHandler<u32, NoopBundle, 2> = TaskHandler::new(0);
        assert!(!handler.delete_task(1));
    }

    #[test]
    fn this_task_id_is_only_valid_during_execution() {
        let handler: TaskHandler<u32, NoopBundle, 1> = TaskHandler::new(0);
        assert_eq!(handler.this_task_id(), 0);
    }
}
