//! A task holding a locked status and an allocated pool block refuses
//! deletion; once both are released, deletion succeeds.

use ucosm::capability::mem_pool::PoolMember;
use ucosm::capability::status::{Status, StatusFlags};
use ucosm::define_mem_pool;
use ucosm::TaskHandler;

define_mem_pool!(GatingPool: u32, 2);

type Bundle = (Status, PoolMember<GatingPool, 2>);

fn run_task(_ctx: &mut ()) {}

#[test]
fn deletion_waits_on_both_lock_and_pool_release() {
    let handler: TaskHandler<(), Bundle, 1> = TaskHandler::new(());
    let mut id = 0;
    handler.create_task(run_task, Some(&mut id));

    let bundle = handler.get_task(id).unwrap();
    assert!(bundle.1.allocate());
    bundle.0.set_status(StatusFlags::LOCKED, true);

    assert!(!handler.delete_task(id));

    let bundle = handler.get_task(id).unwrap();
    bundle.0.set_status(StatusFlags::LOCKED, false);
    assert!(bundle.1.release());

    assert!(handler.delete_task(id));
}
