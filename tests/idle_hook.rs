//! A handler whose only task is suspended never does work, so the kernel's
//! idle hook fires every sweep instead — and `schedule` reports `false`.

use core::cell::Cell;

use critical_section::Mutex;
use ucosm::capability::status::{Status, StatusFlags};
use ucosm::context;
use ucosm::{Kernel, TaskHandler};

type Bundle = (Status,);

static CLOCK: Mutex<Cell<context::TickType>> = Mutex::new(Cell::new(0));
static IDLE_CALLS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

fn read_clock() -> context::TickType {
    critical_section::with(|cs| CLOCK.borrow(cs).get())
}

fn on_idle() {
    critical_section::with(|cs| {
        let cell = CLOCK.borrow(cs);
        cell.set(cell.get() + 1);
        let calls = IDLE_CALLS.borrow(cs);
        calls.set(calls.get() + 1);
    });
}

fn run_task(_ctx: &mut ()) {}

#[test]
fn idle_hook_fires_instead_of_a_suspended_task() {
    context::set_tick_source(read_clock);

    let handler: TaskHandler<(), Bundle, 1> = TaskHandler::new(());
    let mut id = 0;
    handler.create_task(run_task, Some(&mut id));
    handler.get_task(id).unwrap().0.set_status(StatusFlags::SUSPENDED, true);

    let kernel: Kernel<'_, (), 1> = Kernel::new();
    kernel.add_handler(&handler);
    kernel.set_idle_task(on_idle);

    let did_work = kernel.schedule(10);

    assert!(!did_work);
    assert!(critical_section::with(|cs| IDLE_CALLS.borrow(cs).get()) >= 10);
}
