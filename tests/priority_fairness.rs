//! Three tasks of priority 1, 2, 3 in one handler, run for six kernel
//! sweeps, should execute 6, 3, and 2 times respectively.

use core::cell::Cell;

use critical_section::Mutex;
use ucosm::capability::priority::Priority;
use ucosm::{Kernel, TaskHandler};

type Bundle = (Priority,);

static P1_COUNT: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static P2_COUNT: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static P3_COUNT: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

fn bump(counter: &Mutex<Cell<u32>>) {
    critical_section::with(|cs| {
        let cell = counter.borrow(cs);
        cell.set(cell.get() + 1);
    });
}

fn read(counter: &Mutex<Cell<u32>>) -> u32 {
    critical_section::with(|cs| counter.borrow(cs).get())
}

fn run_p1(_ctx: &mut ()) {
    bump(&P1_COUNT);
}

fn run_p2(_ctx: &mut ()) {
    bump(&P2_COUNT);
}

fn run_p3(_ctx: &mut ()) {
    bump(&P3_COUNT);
}

#[test]
fn each_task_runs_on_exactly_its_own_priority_cycles() {
    let handler: TaskHandler<(), Bundle, 3> = TaskHandler::new(());

    let mut id1 = 0;
    let mut id2 = 0;
    let mut id3 = 0;
    handler.create_task(run_p1, Some(&mut id1));
    handler.create_task(run_p2, Some(&mut id2));
    handler.create_task(run_p3, Some(&mut id3));

    handler.get_task(id2).unwrap().0.set_priority(2);
    handler.get_task(id3).unwrap().0.set_priority(3);

    let kernel: Kernel<'_, (), 1> = Kernel::new();
    kernel.add_handler(&handler);

    for _ in 0..6 {
        kernel.schedule(0);
    }

    assert_eq!((read(&P1_COUNT), read(&P2_COUNT), read(&P3_COUNT)), (6, 3, 2));
}
