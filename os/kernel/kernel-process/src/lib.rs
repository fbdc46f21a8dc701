//! # Process Table and Cooperative Scheduler
//!
//! Processes here are bookkeeping records: nothing is executed, and a
//! "context switch" only moves the `Running` mark from one record to
//! another. The table feeds the diagnostic views and models how CPU time is
//! shared between the kernel's own services and user programs.
//!
//! ## Scheduling
//!
//! * **Round robin by slot**: [`ProcessTable::yield_cpu`] picks the first
//!   `Ready` process after the current one's slot, wrapping around.
//! * **Time slices**: [`ProcessTable::tick`] charges one unit to the running
//!   process and preempts user processes every
//!   [`SCHEDULER_TIME_SLICE`](kernel_info::sched::SCHEDULER_TIME_SLICE) units.
//!   Kernel and system processes keep the CPU until they yield.
//! * **Hand-off**: suspending or terminating the running process passes the
//!   CPU on immediately. The kernel process (pid 0) can be neither, so there
//!   is always someone to pass it to.
//!
//! ## Usage
//!
//! ```rust
//! use kernel_process::{ProcessKind, ProcessState, ProcessTable};
//!
//! let mut table = ProcessTable::new();
//! table.initialize().unwrap();
//! let worker = table.create("worker", ProcessKind::User, 0).unwrap();
//! assert_eq!(table.info(worker).unwrap().state, ProcessState::Ready);
//! assert_eq!(table.yield_cpu(), Some(table.current_pid()));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

extern crate alloc;

mod error;
pub mod process;
mod table;

pub use error::ProcessError;
pub use process::{Pid, Process, ProcessKind, ProcessState};
pub use table::{ProcessStats, ProcessTable};
