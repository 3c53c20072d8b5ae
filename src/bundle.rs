//! Capability bundles: the compile-time composition of N capability modules
//! into one module satisfying the same five-hook contract.
//!
//! A bundle is an ordinary Rust tuple `(M1, ..., Mn)` of types implementing
//! [`Capability`]. [`Capability`] is implemented for the unit tuple `()` (the
//! identity bundle — `is_exe_ready`/`is_del_ready` both trivially `true`) and,
//! via [`impl_capability_tuple`], for tuples of up to eight elements. This is
//! the Rust analogue of the original's variadic `Modules<ModuleCollection...>`
//! base-class fold (`modules.h`) and of `ModuleHub_M`'s `std::tuple`-of-modules
//! container: Rust has no variadic generics, so the bundle type is generated
//! from a fixed-arity manifest instead of written once for arbitrary N.
//!
//! Eight capabilities in one bundle covers every composition this crate's
//! tests exercise. A task that genuinely needs more wraps a smaller tuple in
//! a named struct and implements [`Capability`] for it by hand, folding the
//! inner tuple's hooks alongside whatever extra state the wrapper adds.

/// A capability module's five-hook lifecycle contract.
///
/// `init` runs once when the owning task or handler slot is created.
/// `is_exe_ready`/`is_del_ready` are pure queries — `is_exe_ready` may be
/// evaluated many times per sweep, `is_del_ready` gates destruction.
/// `pre_exe`/`post_exe` bracket the task body; `pre_del` runs once on
/// destruction and must leave the module in a state future `init` calls (on
/// slot reuse) can rebuild from cleanly.
pub trait Capability {
    /// Initializes the module's state. Called once on task/handler creation.
    fn init(&mut self);

    /// Whether this module currently permits the owning task/handler to run.
    fn is_exe_ready(&self) -> bool;

    /// Whether this module currently permits the owning task/handler to be
    /// deleted.
    fn is_del_ready(&self) -> bool;

    /// Runs immediately before the task body / handler sweep.
    fn pre_exe(&mut self);

    /// Runs immediately after a successful task body / handler sweep.
    fn post_exe(&mut self);

    /// Runs once on destruction. Must leave the module releasable.
    fn pre_del(&mut self);
}

impl Capability for () {
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

macro_rules! impl_capability_tuple {
    ($($module:ident: $index:tt),+) => {
        impl<$($module),+> Capability for ($($module,)+)
        where
            $($module: Capability),+
        {
            fn init(&mut self) {
                $(self.$index.init();)+
            }

            fn is_exe_ready(&self) -> bool {
                // Every module is evaluated; no short-circuit is assumed, in
                // case a capability's readiness check has a side effect.
                let mut ready = true;
                $(ready &= self.$index.is_exe_ready();)+
                ready
            }

            fn is_del_ready(&self) -> bool {
                let mut ready = true;
                $(ready &= self.$index.is_del_ready();)+
                ready
            }

            fn pre_exe(&mut self) {
                $(self.$index.pre_exe();)+
            }

            fn post_exe(&mut self) {
                $(self.$index.post_exe();)+
            }

            fn pre_del(&mut self) {
                $(self.$index.pre_del();)+
            }
        }
    };
}

impl_capability_tuple!(M0: 0);
impl_capability_tuple!(M0: 0, M1: 1);
impl_capability_tuple!(M0: 0, M1: 1, M2: 2);
impl_capability_tuple!(M0: 0, M1: 1, M2: 2, M3: 3);
impl_capability_tuple!(M0: 0, M1: 1, M2: 2, M3: 3, M4: 4);
impl_capability_tuple!(M0: 0, M1: 1, M2: 2, M3: 3, M4: 4, M5: 5);
impl_capability_tuple!(M0: 0, M1: 1, M2: 2, M3: 3, M4: 4, M5: 5, M6: 6);
impl_capability_tuple!(M0: 0, M1: 1, M2: 2, M3: 3, M4: 4, M5: 5, M6: 6, M7: 7);
