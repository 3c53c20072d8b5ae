#![no_std]
//! µCosm — a cooperative, non-preemptive task scheduler for resource-constrained
//! embedded targets.
//!
//! The scheduling engine is a strict two-tier composition:
//!
//! - a [`kernel::Kernel`] round-robins a fixed set of [`scheduler::Schedule`] handlers
//!   and calls an optional idle hook whenever a full sweep produced no work;
//! - a [`task_handler::TaskHandler`] is the most common kind of handler: it owns a
//!   fixed pool of tasks, each task being a function pointer plus a
//!   compile-time-composed **capability bundle**.
//!
//! Capability bundles are built from orthogonal [`bundle::Capability`] modules
//! (see the [`capability`] module) folded together by [`bundle`]'s tuple impls.
//! Application code mixes in exactly the capabilities a task needs — priority,
//! delay/period, status, inter-task signalling, pool allocation, parent/child
//! lifetime, coroutine waits — and gets back one type that satisfies the same
//! five-hook contract a single capability would.

pub mod bundle;
pub mod capability;
pub mod context;
pub mod error;
pub mod fifo;
pub mod kernel;
pub mod scheduler;
pub mod task_handler;

pub use bundle::Capability;
pub use context::TickType;
pub use error::SchedulerError;
pub use kernel::Kernel;
pub use scheduler::Schedule;
pub use task_handler::{TaskHandler, TaskId};
