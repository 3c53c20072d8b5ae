//! Stackless protothreads: a resume marker plus an in-place context buffer,
//! in place of the original's `switch(line)`-based `CR_*` macros.
//!
//! C's `switch`/`case` gives the original free fallthrough: `switch(line)
//! {case 0: ...; case N: ...}` resumes execution at whichever `case` label
//! matches without re-running the statements above it. Rust's `match` has no
//! fallthrough, so the same effect is built here from a sequence of `if
//! resume_point() <= checkpoint` guards generated by [`cr_task!`], a
//! statement-munching declarative macro: every checkpoint after the matching
//! one executes normally, every one before it is skipped, which is
//! behaviourally equivalent to the original's computed jump for the
//! straight-line task bodies this capability is meant for. As the original
//! itself warns, this is not safe to use inside an unbounded loop.

use core::cell::Cell;
use core::mem::MaybeUninit;

use crate::bundle::Capability;
use crate::context;

/// A protothread's resume marker and in-place context buffer, sized to hold
/// up to `CTX_SIZE` bytes of task-local state across yields.
pub struct Coroutine2<const CTX_SIZE: usize> {
    resume_point: Cell<u16>,
    context: Cell<MaybeUninit<[u8; CTX_SIZE]>>,
}

impl<const CTX_SIZE: usize> Default for Coroutine2<CTX_SIZE> {
    fn default() -> Self {
        Coroutine2 {
            resume_point: Cell::new(0),
            context: Cell::new(MaybeUninit::uninit()),
        }
    }
}

impl<const CTX_SIZE: usize> Coroutine2<CTX_SIZE> {
    /// The checkpoint index [`cr_task!`]'s generated guards will resume at.
    /// `0` means "not yet started".
    pub fn resume_point(&self) -> u16 {
        self.resume_point.get()
    }

    /// Sets the checkpoint the next call resumes at. Exposed for
    /// [`cr_task!`]'s expansion; task bodies should not call this directly.
    pub fn set_resume_point(&self, point: u16) {
        self.resume_point.set(point);
    }

    /// Restarts the protothread from its first checkpoint on the next call.
    pub fn reset(&self) {
        self.resume_point.set(0);
    }

    /// Constructs `T` inside the context buffer on first entry (`resume_point
    /// == 0`) and returns a reference to it, valid across yields until the
    /// protothread is reset or the task is deleted.
    ///
    /// The original's `static_assert(sizeof(T) <= sizeof(mContext))` has no
    /// direct equivalent for a caller-chosen `T` against a `const
    /// CTX_SIZE: usize` without unstable const-generic expressions; this
    /// checks the same property at runtime instead.
    pub fn get_context<T>(&self, init: impl FnOnce() -> T) -> &mut T {
        assert!(
            core::mem::size_of::<T>() <= CTX_SIZE,
            "coroutine context buffer too small for this type"
        );
        let ptr = self.context.as_ptr() as *mut MaybeUninit<[u8; CTX_SIZE]>;
        // SAFETY: `ptr` is valid for the lifetime of `self`; only one task
        // body executes at a time, so no aliasing `&mut T` is ever formed
        // concurrently with this one.
        let bytes: &mut MaybeUninit<[u8; CTX_SIZE]> = unsafe { &mut *ptr };
        let slot = bytes.as_mut_ptr().cast::<T>();
        if self.resume_point.get() == 0 {
            // SAFETY: `slot` is within the `CTX_SIZE`-byte buffer checked
            // above, and nothing has read it as `T` yet on this entry.
            unsafe { slot.write(init()) };
        }
        // SAFETY: written by the branch above on first entry; on later
        // entries, a prior call already initialized it the same way.
        unsafe { &mut *slot }
    }

    /// Reads the current tick, for use by `wait_for` checkpoints.
    pub fn tick() -> context::TickType {
        context::tick()
    }
}

impl<const CTX_SIZE: usize> Capability for Coroutine2<CTX_SIZE> {
    fn init(&mut self) {
        self.resume_point.set(0);
    }

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

/// Expands a protothread task body into a sequence of resume-guarded steps.
///
/// Recognizes three special statements in addition to plain Rust statements:
/// - `yield;` — suspends, resuming here on the next call.
/// - `wait_until(cond);` — re-checks `cond` on every call until true, then
///   falls through.
/// - `wait_for(deadline);` — re-checks `Coroutine2::tick() >= deadline` on
///   every call until true, then falls through.
///
/// `$handle` must be a `&Coroutine2<N>` expression.
#[macro_export]
macro_rules! cr_task {
    ($handle:expr => { $($body:tt)* }) => {
        $crate::__cr_step!($handle, 0u16; $($body)*)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __cr_step {
    ($handle:expr, $n:expr;) => {};

    ($handle:expr, $n:expr; yield; $($rest:tt)*) => {
        if $handle.resume_point() <= $n {
            $handle.set_resume_point($n + 1);
            return;
        }
        $crate::__cr_step!($handle, $n + 1u16; $($rest)*)
    };

    ($handle:expr, $n:expr; wait_until($cond:expr); $($rest:tt)*) => {
        if $handle.resume_point() <= $n {
            if !($cond) {
                $handle.set_resume_point($n);
                return;
            }
            $handle.set_resume_point($n + 1);
        }
        $crate::__cr_step!($handle, $n + 1u16; $($rest)*)
    };

    ($handle:expr, $n:expr; wait_for($deadline:expr); $($rest:tt)*) => {
        if $handle.resume_point() <= $n {
            if $crate::capability::coroutine2::Coroutine2::<0>::tick() < $deadline {
                $handle.set_resume_point($n);
                return;
            }
            $handle.set_resume_point($n + 1);
        }
        $crate::__cr_step!($handle, $n + 1u16; $($rest)*)
    };

    ($handle:expr, $n:expr; $stmt:stmt; $($rest:tt)*) => {
        if $handle.resume_point() <= $n {
            $stmt;
        }
        $crate::__cr_step!($handle, $n; $($rest)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_context_constructs_once_and_persists_across_entries() {
        let cr: Coroutine2<8> = Coroutine2::default();
        *cr.get_context(|| 0u32) += 1;
        cr.set_resume_point(1);
        *cr.get_context(|| 99u32) += 1;
        assert_eq!(*cr.get_context(|| 0u32), 2);
    }

    #[test]
    fn cr_task_resumes_past_completed_yields() {
        let cr: Coroutine2<4> = Coroutine2::default();
        let mut trace: u32 = 0;
        let run = |cr: &Coroutine2<4>, trace: &mut u32| {
            cr_task!(cr => {
                *trace += 1;
                yield;
                *trace += 10;
                yield;
                *trace += 100;
            });
        };
        run(&cr, &mut trace);
        assert_eq!(trace, 1);
        run(&cr, &mut trace);
        assert_eq!(trace, 11);
        run(&cr, &mut trace);
        assert_eq!(trace, 111);
    }

    #[test]
    fn wait_until_blocks_resumption_until_condition_holds() {
        let cr: Coroutine2<4> = Coroutine2::default();
        let mut ready = false;
        let mut trace: u32 = 0;
        macro_rules! run {
            () => {
                cr_task!(&cr => {
                    wait_until(ready);
                    trace += 1;
                });
            };
        }
        run!();
        assert_eq!(trace, 0);
        ready = true;
        run!();
        assert_eq!(trace, 1);
    }
}
