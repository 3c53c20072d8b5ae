//! Index-based chronological task chain.

use core::cell::Cell;

use critical_section::Mutex;

use crate::bundle::Capability;
use crate::capability::status::StatusPort;
use crate::task_handler::TaskId;

/// How many distinct `LinkedList<K>` chains this crate supports
/// simultaneously. `K` is a runtime index into this array rather than a
/// compile-time parameter specializing a Rust `static`, since `static`
/// items cannot themselves be generic the way a C++ function-template
/// `static` member can.
pub const MAX_LISTS: usize = 8;

static LIST_HEADS: Mutex<[Cell<Option<TaskId>>; MAX_LISTS]> =
    Mutex::new([const { Cell::new(None) }; MAX_LISTS]);

/// Appends a task to a shared, per-`list_index` doubly-linked chain the
/// first time it executes, in first-execution order.
///
/// Unlike the original's pointer-chasing `ListItem*` links, `getNext`/
/// `getPrev` return a [`TaskId`]: task slots are a fixed-capacity array
/// that recycles memory on deletion, so an intrusive raw-pointer link
/// would dangle across that reuse. An index into the same `TaskHandler`
/// survives it.
///
/// Requires a `Status`/`StatusNotify` sibling — `pre_exe`/`pre_del` need it
/// passed in as `&S` to know whether this is the task's first execution
/// (see the `capability` module's sibling-lookup note).
pub struct LinkedList {
    list_index: usize,
    this_id: Cell<TaskId>,
    prev: Cell<Option<TaskId>>,
    next: Cell<Option<TaskId>>,
}

impl Default for LinkedList {
    fn default() -> Self {
        LinkedList {
            list_index: 0,
            this_id: Cell::new(0),
            prev: Cell::new(None),
            next: Cell::new(None),
        }
    }
}

impl LinkedList {
    /// Selects which of the [`MAX_LISTS`] shared chains this task joins.
    /// Must be called before the task's first execution.
    pub fn set_list_index(&mut self, list_index: usize) {
        debug_assert!(list_index < MAX_LISTS);
        self.list_index = list_index;
    }

    /// Records this task's own id, so `pre_exe`/`pre_del` can link it into
    /// the chain by index. Must be called once, typically right after
    /// `create_task`.
    pub fn set_this_id(&self, id: TaskId) {
        self.this_id.set(id);
    }

    /// The next task in chronological order, if any.
    pub fn get_next(&self) -> Option<TaskId> {
        self.next.get()
    }

    /// The previous task in chronological order, if any.
    pub fn get_prev(&self) -> Option<TaskId> {
        self.prev.get()
    }

    /// Links this task onto the tail of its chain, unless `status` reports
    /// the task has already started (it would already be linked).
    ///
    /// `prev_top`, if given, must be the current top-of-chain instance
    /// (i.e. whatever [`LinkedList`] owns the `TaskId` this method is about
    /// to displace as head) — needed to set *its* `next` pointer to this
    /// task, which this instance cannot do on its own with only a `TaskId`
    /// in hand. Omitting it (or passing the wrong instance) leaves that
    /// neighbor's `next` stale, matching the same caller-resolves-neighbors
    /// contract as [`LinkedList::unlink`].
    pub fn link_on_first_execution<S: StatusPort>(&self, status: &S, prev_top: Option<&LinkedList>) {
        if status.is_started() {
            return;
        }
        critical_section::with(|cs| {
            let head = &LIST_HEADS.borrow(cs)[self.list_index];
            if let Some(top) = head.get() {
                self.prev.set(Some(top));
            }
            head.set(Some(self.this_id.get()));
        });
        if let Some(prev_top) = prev_top {
            prev_top.next.set(Some(self.this_id.get()));
        }
    }

    /// Unlinks this task from its chain, splicing `prev`/`next` directly
    /// together where both exist.
    ///
    /// `prev`/`next` are this instance's own neighbors resolved by the
    /// caller (typically `TaskHandler::delete_task`'s caller, which has a
    /// `TaskId` -> bundle lookup via `get_task`) — `LinkedList` only stores
    /// `TaskId`s (see the module-level doc comment), so it cannot resolve
    /// its own neighbors' instances to splice them without that help.
    /// Passing the wrong neighbors corrupts the chain; passing `None` for a
    /// neighbor that in fact exists leaves a dangling reference to `self`.
    pub fn unlink(&self, prev: Option<&LinkedList>, next: Option<&LinkedList>) {
        critical_section::with(|cs| {
            let head = &LIST_HEADS.borrow(cs)[self.list_index];
            if head.get() == Some(self.this_id.get()) {
                head.set(self.prev.get());
            }
        });
        match (prev, next) {
            (Some(prev), Some(next)) => {
                prev.next.set(self.next.get());
                next.prev.set(self.prev.get());
            }
            (Some(prev), None) => prev.next.set(None),
            (None, Some(next)) => next.prev.set(None),
            (None, None) => {}
        }
    }
}

impl Capability for LinkedList {
    fn init(&mut self) {
        self.prev.set(None);
        self.next.set(None);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::status::Status;

    #[test]
    fn link_on_first_execution_sets_head_once() {
        let mut list = LinkedList::default();
        list.set_list_index(0);
        list.set_this_id(1);
        let mut status = Status::default();
        status.init();
        list.link_on_first_execution(&status, None);
        assert_eq!(
            critical_section::with(|cs| LIST_HEADS.borrow(cs)[0].get()),
            Some(1)
        );
    }

    #[test]
    fn already_started_task_is_not_relinked() {
        let mut list = LinkedList::default();
        list.set_list_index(1);
        list.set_this_id(2);
        let mut status = Status::default();
        status.init();
        status.pre_exe();
        status.post_exe();
        list.link_on_first_execution(&status, None);
        assert_ne!(
            critical_section::with(|cs| LIST_HEADS.borrow(cs)[1].get()),
            Some(2)
        );
    }

    #[test]
    fn unlink_splices_prev_and_next_together() {
        let mut a = LinkedList::default();
        let mut b = LinkedList::default();
        let mut c = LinkedList::default();
        for (list, id) in [(&mut a, 10), (&mut b, 11), (&mut c, 12)] {
            list.set_list_index(3);
            list.set_this_id(id);
        }
        let mut status = Status::default();
        status.init();
        a.link_on_first_execution(&status, None);
        b.link_on_first_execution(&status, Some(&a));
        c.link_on_first_execution(&status, Some(&b));

        b.unlink(Some(&a), Some(&c));
        assert_eq!(a.get_next(), Some(12));
        assert_eq!(c.get_prev(), Some(10));
    }
}
