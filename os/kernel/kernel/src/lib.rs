//! # Kernel Core
//!
//! Ties the subsystems together: one heap, one filesystem allocating from it,
//! and one process table. [`Kernel::boot`] brings them up in dependency
//! order; the periodic activity driver charges the standard system services
//! for their work and advances the scheduler.
//!
//! ```text
//! Kernel::boot(config)
//!   ├─ Heap::new(config.heap_size)
//!   ├─ Filesystem::initialize(&mut heap)   standard tree + starter files
//!   └─ ProcessTable::initialize()          kernel + standard services
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use kernel::Kernel;
//! use kernel_info::KernelConfig;
//!
//! let mut kernel = Kernel::boot(KernelConfig::new().with_heap_size(1024 * 1024)).unwrap();
//! kernel.simulate_activity(false);
//! let report = kernel.report();
//! assert_eq!(report.uptime, 10);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

use core::fmt;
use kernel_alloc::{Heap, HeapStats};
use kernel_fs::{Filesystem, FsError, FsStats};
use kernel_info::KernelConfig;
use kernel_process::{Pid, ProcessError, ProcessStats, ProcessTable};
use log::{debug, info};

/// A subsystem failed to come up.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error("filesystem initialization failed: {0}")]
    Filesystem(#[from] FsError),
    #[error("process table initialization failed: {0}")]
    Process(#[from] ProcessError),
}

/// Well-known pids of the standard services, in boot order.
pub mod services {
    use kernel_process::Pid;

    pub const MEMORY_MANAGER: Pid = Pid::new(1);
    pub const VGA_DRIVER: Pid = Pid::new(2);
    pub const KEYBOARD_DRIVER: Pid = Pid::new(3);
    pub const FILESYSTEM: Pid = Pid::new(4);
    pub const SHELL: Pid = Pid::new(5);
    pub const TEXT_EDITOR: Pid = Pid::new(6);
    pub const RTC_DRIVER: Pid = Pid::new(7);
    pub const SCHEDULER: Pid = Pid::new(8);
}

pub struct Kernel {
    pub heap: Heap,
    pub fs: Filesystem,
    pub processes: ProcessTable,
}

impl Kernel {
    /// Build and initialize every subsystem.
    ///
    /// # Errors
    /// [`BootError::Filesystem`] if the heap is too small for the starter
    /// files; [`BootError::Process`] if the standard processes do not fit.
    pub fn boot(config: KernelConfig) -> Result<Self, BootError> {
        info!("booting with a {} KiB heap", config.heap_size / 1024);
        let mut heap = Heap::new(config.heap_size);

        let mut fs = Filesystem::new();
        fs.initialize(&mut heap)?;

        let mut processes = ProcessTable::new();
        processes.initialize()?;

        info!("boot complete");
        Ok(Self {
            heap,
            fs,
            processes,
        })
    }

    /// One round of the periodic activity driver.
    ///
    /// The memory manager's footprint tracks a quarter of the heap in use.
    /// The drivers and the shell are charged their fixed per-round cost, the
    /// keyboard driver only when input is waiting. The round ends with a
    /// scheduler tick.
    pub fn simulate_activity(&mut self, input_pending: bool) {
        let footprint = u32::try_from(self.heap.used_bytes() / 4).unwrap_or(u32::MAX);
        if let Err(e) = self
            .processes
            .update_memory_usage(services::MEMORY_MANAGER, footprint)
        {
            debug!("memory accounting skipped: {e}");
        }

        self.charge(services::VGA_DRIVER, 1);
        if input_pending {
            self.charge(services::KEYBOARD_DRIVER, 2);
        }
        self.charge(services::FILESYSTEM, 1);
        self.charge(services::SHELL, 3);
        self.charge(services::SCHEDULER, 1);

        self.processes.tick();
    }

    fn charge(&mut self, pid: Pid, slice: u32) {
        if let Err(e) = self.processes.update_cpu_time(pid, slice) {
            debug!("cpu accounting skipped: {e}");
        }
    }

    /// A snapshot of every subsystem's counters.
    #[must_use]
    pub fn report(&self) -> Report {
        Report {
            heap: self.heap.stats(),
            fs: self.fs.stats(),
            processes: self.processes.stats(),
            uptime: self.processes.uptime(),
            current: self.processes.current_pid(),
        }
    }
}

/// Combined `meminfo`, `df` and `ps` summary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Report {
    pub heap: HeapStats,
    pub fs: FsStats,
    pub processes: ProcessStats,
    pub uptime: u32,
    pub current: Pid,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "memory: {} used, {} free, {} total bytes in {} blocks",
            self.heap.used_bytes,
            self.heap.free_bytes,
            self.heap.total_bytes,
            self.heap.block_count
        )?;
        writeln!(
            f,
            "storage: {} files, {} directories, {} of {} bytes used",
            self.fs.total_files, self.fs.total_directories, self.fs.used_space, self.fs.total_space
        )?;
        write!(
            f,
            "processes: {} total, {} running, {} ready, {} blocked, {} switches, pid {} current, uptime {}",
            self.processes.total,
            self.processes.running,
            self.processes.ready,
            self.processes.blocked,
            self.processes.context_switches,
            self.current,
            self.uptime
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> KernelConfig {
        KernelConfig::new().with_heap_size(512 * 1024)
    }

    #[test]
    fn service_pids_match_boot_order() {
        let kernel = Kernel::boot(small()).unwrap();
        assert_eq!(kernel.processes.name(services::MEMORY_MANAGER), Some("memory_manager"));
        assert_eq!(kernel.processes.name(services::KEYBOARD_DRIVER), Some("keyboard_driver"));
        assert_eq!(kernel.processes.name(services::SHELL), Some("shell"));
        assert_eq!(kernel.processes.name(services::TEXT_EDITOR), Some("text_editor"));
        assert_eq!(kernel.processes.name(services::SCHEDULER), Some("scheduler"));
    }

    #[test]
    fn report_renders_three_lines() {
        let kernel = Kernel::boot(small()).unwrap();
        let text = kernel.report().to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("6 files, 10 directories"));
        assert!(text.contains("9 total, 1 running, 7 ready, 1 blocked"));
    }
}
