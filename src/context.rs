//! Process-wide scheduler state.
//!
//! A handful of facts in µCosm are genuinely global rather than owned by one
//! [`crate::kernel::Kernel`] or [`crate::task_handler::TaskHandler`] instance: the
//! monotonic cycle counter `Priority` reads, the tick source every `Delay`-family
//! capability reads, and the weak reference to whichever `Kernel` is currently
//! driving the program (used by `Coroutine::wait_for` to re-enter scheduling).
//!
//! Rather than Martos's `static mut TASK_MANAGER` singleton — sound only because
//! the whole crate agrees never to form two live references to it — these cells
//! are held behind [`critical_section::Mutex`], the same pattern `taskette` uses
//! for its `SCHEDULER_STATE`/`SCHEDULER_CONFIG` statics. On a real target a
//! `critical_section` implementation disables interrupts for the cell access;
//! under `cargo test` the crate's `std` feature backs it with a regular mutex.

use core::cell::Cell;

use critical_section::Mutex;

/// Monotonic tick type. Only differences are ever compared, so wraparound is
/// handled with wrapping subtraction — see [`ticks_since`].
pub type TickType = u32;

static TICK_SOURCE: Mutex<Cell<Option<fn() -> TickType>>> = Mutex::new(Cell::new(None));
static CYCLE_COUNTER: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static MASTER: Mutex<Cell<Option<MasterHandle>>> = Mutex::new(Cell::new(None));

/// Installs the platform's monotonic tick reader.
///
/// Must be called once before the first [`crate::kernel::Kernel::schedule`]
/// call. Every `Delay`/`Periodic`/`Kernel::schedule` timing computation reads
/// through this function pointer, matching the original's single
/// `SysKernelData::sGetTick()` free function.
pub fn set_tick_source(source: fn() -> TickType) {
    critical_section::with(|cs| TICK_SOURCE.borrow(cs).set(Some(source)));
}

/// Reads the current tick value.
///
/// Returns `0` if [`set_tick_source`] has not been called yet, which keeps
/// this function infallible at the (frequent) cost of an unconfigured source
/// silently reading as "time has not moved" rather than panicking.
pub fn tick() -> TickType {
    critical_section::with(|cs| TICK_SOURCE.borrow(cs).get()).map_or(0, |read| read())
}

/// `now - start`, correct across exactly one wraparound of [`TickType`].
pub fn ticks_since(start: TickType) -> TickType {
    tick().wrapping_sub(start)
}

/// The current value of `sCnt`, the cycle counter `Priority` divides against.
pub fn cycle() -> u32 {
    critical_section::with(|cs| CYCLE_COUNTER.borrow(cs).get())
}

/// Advances `sCnt` by one. Called exactly once per `Kernel` inner iteration,
/// including re-entrant iterations driven by `Coroutine::wait_for`.
pub fn advance_cycle() {
    critical_section::with(|cs| {
        let cell = CYCLE_COUNTER.borrow(cs);
        cell.set(cell.get().wrapping_add(1));
    });
}

/// Type-erased handle to the `Kernel` currently driving the program.
///
/// Stored as a thin pointer plus a manually-built vtable entry instead of
/// `NonNull<dyn Trait>` so it does not need a `'static` bound on the pointee —
/// the pointee only needs to outlive the reentrant window, which it always
/// does because the pointer is installed for exactly the duration of the
/// `Kernel::schedule` stack frame that owns it.
#[derive(Clone, Copy)]
struct MasterHandle {
    target: *const (),
    call: unsafe fn(*const (), TickType) -> bool,
}

/// Installs `target` as the master scheduler for the duration of the calling
/// `Kernel::schedule` invocation, unless a master is already installed (an
/// outer, still-running `schedule` call further up the stack).
///
/// Returns `true` if this call installed the master and is therefore
/// responsible for clearing it again via [`clear_master`].
///
/// # Safety
///
/// `target` must remain valid and must not be mutably aliased for as long as
/// it may be reached through [`with_master`] — guaranteed by only ever being
/// called from `Kernel::schedule` with `self`, whose borrow covers the entire
/// window during which the master handle is installed.
pub unsafe fn try_set_master<T>(target: &T, call: unsafe fn(*const (), TickType) -> bool) -> bool {
    critical_section::with(|cs| {
        let cell = MASTER.borrow(cs);
        if cell.get().is_some() {
            return false;
        }
        cell.set(Some(MasterHandle {
            target: (target as *const T).cast::<()>(),
            call,
        }));
        true
    })
}

/// Clears the master handle. Must only be called by whichever
/// [`try_set_master`] call returned `true`.
pub fn clear_master() {
    critical_section::with(|cs| MASTER.borrow(cs).set(None));
}

/// Re-enters the master scheduler's `schedule(min_duration)`, if one is
/// installed. Used by `Coroutine::wait_for` to advance peer tasks while the
/// calling task is suspended. A no-op (returns `false`) if no `Kernel` has
/// ever called [`try_set_master`] — e.g. if `wait_for` is invoked from
/// outside any `Kernel::schedule` call.
pub fn wait_via_master(min_duration: TickType) -> bool {
    let handle = critical_section::with(|cs| MASTER.borrow(cs).get());
    match handle {
        // SAFETY: see `try_set_master`: the target outlives every window
        // during which it can be observed here.
        Some(handle) => unsafe { (handle.call)(handle.target, min_duration) },
        None => false,
    }
}
