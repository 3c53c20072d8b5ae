//! Fixed-block memory pools: a shared, bitmap-arbitrated allocator of depth
//! `N`, with each task holding at most one block at a time.
//!
//! The original templates `MemPool32<elem_t, elem_count>` so the compiler
//! generates one `static mElems`/`mMemoryMap` pair per distinct
//! instantiation. Rust `static` items cannot themselves be generic, so that
//! per-instantiation sharing is realized instead through
//! [`define_mem_pool!`] — a manifest macro in the same spirit as `bundle`'s
//! `impl_capability_tuple!`: it expands to one concrete, non-generic static
//! pool plus a zero-sized marker type naming it, in place of a template the
//! compiler would otherwise instantiate on demand.

use core::cell::{Cell, UnsafeCell};
use core::marker::PhantomData;
use core::mem::MaybeUninit;

use critical_section::Mutex;

use crate::bundle::Capability;

/// The shared backing storage for one pool: a bitmap plus `N` element slots.
/// Built and owned by [`define_mem_pool!`]; application code never
/// constructs one directly.
pub struct PoolStorage<Elem, const N: usize> {
    map: Mutex<Cell<u32>>,
    slots: [UnsafeCell<MaybeUninit<Elem>>; N],
}

impl<Elem, const N: usize> PoolStorage<Elem, N> {
    /// Builds an empty pool. `N` must not exceed 32 — the bitmap is a
    /// single `u32`, matching the original's hard `elem_count <= 32` cap.
    pub const fn new() -> Self {
        assert!(N <= 32, "mem pool size must not exceed 32 slots");
        PoolStorage {
            map: Mutex::new(Cell::new(0)),
            slots: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
        }
    }

    fn allocate_slot(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let cell = self.map.borrow(cs);
            let mut bitmap = cell.get();
            for i in 0..N {
                // Slot `i` is free iff bit `i` of the bitmap is zero — the
                // original's `!mMemoryMap&(1<<i)` parses (by C++ precedence)
                // as `(!mMemoryMap) & (1<<i)`, which is not that.
                if bitmap & (1 << i) == 0 {
                    bitmap |= 1 << i;
                    cell.set(bitmap);
                    return Some(i as u8);
                }
            }
            None
        })
    }

    fn release_slot(&self, index: u8) {
        critical_section::with(|cs| {
            let cell = self.map.borrow(cs);
            cell.set(cell.get() & !(1 << index));
        });
    }

    /// # Safety
    /// `index` must be a slot this caller currently, exclusively holds (set
    /// by a prior `allocate_slot` and not yet passed to `release_slot`).
    unsafe fn slot_ptr(&self, index: u8) -> *mut Elem {
        self.slots[index as usize].get().cast::<Elem>()
    }
}

/// Names one shared [`PoolStorage`], generated by [`define_mem_pool!`].
///
/// A trait rather than a direct `&'static PoolStorage` field lets
/// [`PoolMember`] implement `Default` — required of every bundle member —
/// without storing a reference a `Default::default()` call has no way to
/// produce.
pub trait Pool<const N: usize> {
    type Elem: 'static;

    fn storage() -> &'static PoolStorage<Self::Elem, N>;
}

/// Declares one concrete, shared memory pool and the marker type used to
/// name it in a [`PoolMember`].
///
/// ```ignore
/// define_mem_pool!(pub SensorBlocks: [u8; 16], 4);
/// ```
#[macro_export]
macro_rules! define_mem_pool {
    ($vis:vis $name:ident : $elem:ty, $n:expr) => {
        $vis struct $name;

        impl $crate::capability::mem_pool::Pool<$n> for $name {
            type Elem = $elem;

            fn storage() -> &'static $crate::capability::mem_pool::PoolStorage<$elem, $n> {
                static STORAGE: $crate::capability::mem_pool::PoolStorage<$elem, $n> =
                    $crate::capability::mem_pool::PoolStorage::new();
                &STORAGE
            }
        }
    };
}

/// A task's claim on at most one block of the pool named by `P`.
///
/// Forbids deletion while a block is held, matching the original's
/// `isDelReady = (allocIndex == 0)`.
pub struct PoolMember<P, const N: usize> {
    alloc_index: Cell<Option<u8>>,
    _pool: PhantomData<P>,
}

impl<P: Pool<N>, const N: usize> Default for PoolMember<P, N> {
    fn default() -> Self {
        PoolMember {
            alloc_index: Cell::new(None),
            _pool: PhantomData,
        }
    }
}

impl<P: Pool<N>, const N: usize> PoolMember<P, N> {
    /// Claims one block. Fails if the pool is full, or if this task already
    /// holds a block — a task may hold at most one at a time.
    pub fn allocate(&self) -> bool {
        if self.alloc_index.get().is_some() {
            return false;
        }
        match P::storage().allocate_slot() {
            Some(i) => {
                self.alloc_index.set(Some(i));
                true
            }
            None => false,
        }
    }

    /// Releases the held block, if any.
    pub fn release(&self) -> bool {
        match self.alloc_index.take() {
            Some(i) => {
                P::storage().release_slot(i);
                true
            }
            None => false,
        }
    }

    /// The held block, if any.
    pub fn get_memory(&self) -> Option<&mut P::Elem> {
        let i = self.alloc_index.get()?;
        // SAFETY: `alloc_index` holds `Some(i)` only between a matching
        // `allocate`/`release` pair, during which this task exclusively
        // owns slot `i` — no other task can observe the same index until
        // `release` clears the bitmap bit.
        Some(unsafe { &mut *P::storage().slot_ptr(i) })
    }
}

impl<P: Pool<N>, const N: usize> Capability for PoolMember<P, N> {
    fn init(&mut self) {
        self.alloc_index.set(None);
    }

    fn is_exe_ready(&self) -> bool {
        true
    }

    fn is_del_ready(&self) -> bool {
        self.alloc_index.get().is_none()
    }

    fn pre_exe(&mut self) {}
    fn post_exe(&mut self) {}
    fn pre_del(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    define_mem_pool!(TestPool: u32, 2);

    #[test]
    fn allocate_fails_once_pool_is_full() {
        let a: PoolMember<TestPool, 2> = PoolMember::default();
        let b: PoolMember<TestPool, 2> = PoolMember::default();
        let c: PoolMember<TestPool, 2> = PoolMember::default();
        assert!(a.allocate());
        assert!(b.allocate());
        assert!(!c.allocate());
        a.release();
        assert!(c.allocate());
    }

    #[test]
    fn a_task_may_hold_only_one_block_at_a_time() {
        let a: PoolMember<TestPool, 2> = PoolMember::default();
        assert!(a.allocate());
        assert!(!a.allocate());
    }

    #[test]
    fn is_del_ready_only_once_block_is_released() {
        let a: PoolMember<TestPool, 2> = PoolMember::default();
        a.allocate();
        assert!(!a.is_del_ready());
        a.release();
        assert!(a.is_del_ready());
    }

    #[test]
    fn get_memory_round_trips_a_value() {
        let a: PoolMember<TestPool, 2> = PoolMember::default();
        a.allocate();
        *a.get_memory().unwrap() = 42;
        assert_eq!(*a.get_memory().unwrap(), 42);
    }
}
