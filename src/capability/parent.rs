//! Lifetime-linked task pairs: a parent cannot be deleted while its child is
//! alive.

use core::cell::Cell;

use crate::bundle::Capability;

/// Ties two tasks' lifetimes together: the parent becomes deletable again
/// only once its child has been deleted.
///
/// The original packs `mChild`/`mParent` into one `union` field disambiguated
/// by `mIsParent`, which blurs which pointer is live at any moment. This
/// keeps the two relationships as two separate, always-valid-or-`None`
/// fields — a parent's `child` and a child's `parent` — at the cost of one
/// extra pointer-sized field per instance.
pub struct Parent {
    child: Cell<Option<*const Parent>>,
    parent: Cell<Option<*const Parent>>,
    is_parent: Cell<bool>,
}

impl Default for Parent {
    fn default() -> Self {
        Parent {
            child: Cell::new(None),
            parent: Cell::new(None),
            is_parent: Cell::new(false),
        }
    }
}

impl Parent {
    /// Marks `self` as `child`'s parent.
    ///
    /// # Safety
    /// Both `self` and `child` must remain at their current addresses and
    /// remain live (not deleted / their task slot not reused) for as long
    /// as the relationship exists — it is cleared by `child`'s `pre_del`,
    /// called when `child`'s owning task is deleted, but nothing stops a
    /// caller from deleting `self`'s task first, which would leave `child`
    /// pointing at a reused slot. Callers are responsible for deleting the
    /// child before (or without ever) deleting the parent.
    pub fn set_child(&self, child: &Parent) {
        child.parent.set(Some(self as *const Parent));
        self.child.set(Some(child as *const Parent));
        self.is_parent.set(true);
    }
}

impl Capability for Parent {
    fn init(&mut self) {
        self.child.set(None);
        self.parent.set(None);
        self.is_parent.set(false);
    }

    fn is_exe_ready(&self) -> bool {
        true
    }

    fn is_del_ready(&self) -> bool {
        if !self.is_parent.get() {
            return true;
        }
        self.child.get().is_none()
    }

    fn pre_exe(&mut self) {}

    fn pre_del(&mut self) {
        if !self.is_parent.get() {
            if let Some(parent) = self.parent.get() {
                // SAFETY: see `set_child`'s safety note — the parent is
                // assumed live as long as this relationship is.
                unsafe { (*parent).child.set(None) };
            }
        }
    }

    fn post_exe(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_is_not_deletable_while_child_is_alive() {
        let mut parent = Parent::default();
        let mut child = Parent::default();
        parent.init();
        child.init();
        parent.set_child(&child);
        assert!(!parent.is_del_ready());
    }

    #[test]
    fn deleting_the_child_frees_the_parent() {
        let mut parent = Parent::default();
        let mut child = Parent::default();
        parent.init();
        child.init();
        parent.set_child(&child);
        child.pre_del();
        assert!(parent.is_del_ready());
    }

    #[test]
    fn a_task_with_no_child_is_always_deletable() {
        let mut parent = Parent::default();
        parent.init();
        assert!(parent.is_del_ready());
    }
}
