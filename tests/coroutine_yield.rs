//! A handler that suspends itself mid-sweep via `Coroutine::wait_for` lets
//! its peer handler keep running in the meantime, rather than blocking the
//! whole kernel.

use core::cell::Cell;

use critical_section::Mutex;
use ucosm::capability::coroutine::Coroutine;
use ucosm::context;
use ucosm::scheduler::Schedule;
use ucosm::Kernel;

const TICK_PER_SWEEP: context::TickType = 5;
const WAIT_TICKS: context::TickType = 50;

static CLOCK: Mutex<Cell<context::TickType>> = Mutex::new(Cell::new(0));
static PEER_RUNS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

fn read_clock() -> context::TickType {
    critical_section::with(|cs| CLOCK.borrow(cs).get())
}

fn advance_clock() {
    critical_section::with(|cs| {
        let cell = CLOCK.borrow(cs);
        cell.set(cell.get() + TICK_PER_SWEEP);
    });
}

fn peer_runs() -> u32 {
    critical_section::with(|cs| PEER_RUNS.borrow(cs).get())
}

struct WaitingHandler;

impl Schedule for WaitingHandler {
    fn schedule(&self) -> bool {
        context::wait_via_master(WAIT_TICKS)
    }
}

struct PeerHandler;

impl Schedule for PeerHandler {
    fn schedule(&self) -> bool {
        advance_clock();
        critical_section::with(|cs| {
            let cell = PEER_RUNS.borrow(cs);
            cell.set(cell.get() + 1);
        });
        true
    }
}

#[test]
fn peer_handler_keeps_running_while_sibling_waits() {
    context::set_tick_source(read_clock);

    let kernel: Kernel<'_, Coroutine, 2> = Kernel::new();
    let waiting = WaitingHandler;
    let peer = PeerHandler;
    kernel.add_handler(&waiting);
    kernel.add_handler(&peer);

    kernel.schedule(0);

    assert!(peer_runs() as context::TickType >= WAIT_TICKS / TICK_PER_SWEEP);
}
