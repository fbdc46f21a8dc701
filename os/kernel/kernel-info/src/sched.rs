//! # Scheduler Limits

/// Number of slots in the process table.
pub const MAX_PROCESSES: usize = 64;

/// Number of ticks a user process runs before `tick` hands the CPU on.
pub const SCHEDULER_TIME_SLICE: u32 = 10;

/// Longest process name, in bytes. Longer names are truncated.
pub const MAX_PROCESS_NAME_LENGTH: usize = 64;

/// Memory footprint recorded for newly created processes.
pub const DEFAULT_PROCESS_MEMORY: u32 = 64 * 1024; // 64 KiB

/// Memory footprint recorded for the kernel process.
pub const KERNEL_PROCESS_MEMORY: u32 = 2 * 1024 * 1024; // 2 MiB

/// Priority of the kernel process (pid 0); above every created process.
pub const KERNEL_PROCESS_PRIORITY: u32 = 255;

const _: () = {
    assert!(MAX_PROCESSES >= 1);
    assert!(SCHEDULER_TIME_SLICE > 0);
};
