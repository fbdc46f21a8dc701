//! # Process Table
//!
//! A fixed array of slots scanned linearly. Exactly one live process is
//! `Running` at a time once the table is initialized; the scheduler is
//! cooperative and only switches inside [`ProcessTable::yield_cpu`], which
//! [`ProcessTable::tick`] calls when a user process uses up its time slice.

use crate::ProcessError;
use crate::process::{Pid, Process, ProcessKind, ProcessState, truncate_name};
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use kernel_info::sched::{
    DEFAULT_PROCESS_MEMORY, KERNEL_PROCESS_MEMORY, KERNEL_PROCESS_PRIORITY, MAX_PROCESSES,
    SCHEDULER_TIME_SLICE,
};
use log::{debug, info, trace};

/// Processes started by [`ProcessTable::initialize`], in creation order.
const STANDARD_PROCESSES: &[(&str, ProcessKind, usize)] = &[
    ("memory_manager", ProcessKind::System, 0x10_0000),
    ("vga_driver", ProcessKind::System, 0x10_0100),
    ("keyboard_driver", ProcessKind::System, 0x10_0200),
    ("filesystem", ProcessKind::System, 0x10_0300),
    ("shell", ProcessKind::System, 0x10_0400),
    ("text_editor", ProcessKind::User, 0x10_0500),
    ("rtc_driver", ProcessKind::System, 0x10_0600),
    ("scheduler", ProcessKind::Kernel, 0x10_0700),
];

/// Started suspended until the user opens it.
const SUSPENDED_AT_BOOT: &str = "text_editor";

/// Aggregate view, as shown by `ps`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ProcessStats {
    pub total: usize,
    pub running: usize,
    pub ready: usize,
    pub blocked: usize,
    pub total_cpu_time: u64,
    pub context_switches: u32,
}

pub struct ProcessTable {
    slots: Box<[Option<Process>]>,
    next_pid: u32,
    current: Pid,
    context_switches: u32,
    uptime: u32,
    initialized: bool,
}

impl ProcessTable {
    /// An empty table. Pid 0 does not exist until [`initialize`](Self::initialize).
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: vec![None; MAX_PROCESSES].into_boxed_slice(),
            next_pid: 1,
            current: Pid::KERNEL,
            context_switches: 0,
            uptime: 0,
            initialized: false,
        }
    }

    /// Install the kernel process and the standard system processes. Only the
    /// first call has any effect.
    ///
    /// # Errors
    /// Propagates a failure to create one of the standard processes, which
    /// only happens if the table is configured with too few slots.
    pub fn initialize(&mut self) -> Result<(), ProcessError> {
        if self.initialized {
            return Ok(());
        }
        *self = Self::new();

        let start_time = self.clock();
        self.slots[0] = Some(Process {
            pid: Pid::KERNEL,
            name: String::from("kernel"),
            state: ProcessState::Running,
            kind: ProcessKind::Kernel,
            priority: KERNEL_PROCESS_PRIORITY,
            cpu_time: 0,
            memory_usage: KERNEL_PROCESS_MEMORY,
            parent: Pid::KERNEL,
            start_time,
            entry_point: 0,
        });

        for &(name, kind, entry_point) in STANDARD_PROCESSES {
            let pid = self.create(name, kind, entry_point)?;
            if name == SUSPENDED_AT_BOOT {
                self.suspend(pid)?;
            }
        }
        self.current = Pid::KERNEL;
        self.initialized = true;
        info!("process table initialized with {} processes", self.stats().total);
        Ok(())
    }

    /// Advance the uptime counter and return the new value.
    const fn clock(&mut self) -> u32 {
        self.uptime = self.uptime.wrapping_add(1);
        self.uptime
    }

    fn slot_of(&self, pid: Pid) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|p| p.pid == pid))
    }

    fn get_mut(&mut self, pid: Pid) -> Result<&mut Process, ProcessError> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|p| p.pid == pid)
            .ok_or(ProcessError::NotFound(pid))
    }

    /// Create a `Ready` process in the lowest free slot.
    ///
    /// The name is cut to the length limit. The new process's parent is the
    /// one currently running.
    ///
    /// # Errors
    /// - [`ProcessError::EmptyName`] for an empty name.
    /// - [`ProcessError::TableFull`] if no slot is free.
    /// - [`ProcessError::PidsExhausted`] once every pid has been issued.
    pub fn create(
        &mut self,
        name: &str,
        kind: ProcessKind,
        entry_point: usize,
    ) -> Result<Pid, ProcessError> {
        if name.is_empty() {
            debug!("refusing to create a process without a name");
            return Err(ProcessError::EmptyName);
        }
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            debug!("cannot create {name}: process table is full");
            return Err(ProcessError::TableFull);
        };

        let Some(next_pid) = self.next_pid.checked_add(1) else {
            debug!("cannot create {name}: pids are exhausted");
            return Err(ProcessError::PidsExhausted);
        };
        let pid = Pid::new(self.next_pid);
        self.next_pid = next_pid;
        let start_time = self.clock();
        self.slots[slot] = Some(Process {
            pid,
            name: String::from(truncate_name(name)),
            state: ProcessState::Ready,
            kind,
            priority: kind.priority_for(pid),
            cpu_time: 0,
            memory_usage: DEFAULT_PROCESS_MEMORY,
            parent: self.current,
            start_time,
            entry_point,
        });
        info!("created {kind} process {name} (pid {pid}) in slot {slot}");
        Ok(pid)
    }

    /// Remove a process from the table and return its final record.
    ///
    /// The slot becomes free for a new process; the pid is never reissued.
    /// Terminating the running process hands the CPU to the next ready one.
    ///
    /// # Errors
    /// - [`ProcessError::ProtectedProcess`] for pid 0.
    /// - [`ProcessError::NotFound`] if `pid` is not live.
    pub fn terminate(&mut self, pid: Pid) -> Result<Process, ProcessError> {
        if pid == Pid::KERNEL {
            debug!("refusing to terminate the kernel process");
            return Err(ProcessError::ProtectedProcess(pid));
        }
        let slot = self.slot_of(pid).ok_or(ProcessError::NotFound(pid))?;
        let mut process = self.slots[slot]
            .take()
            .ok_or(ProcessError::NotFound(pid))?;
        let was_running = process.state == ProcessState::Running;
        process.state = ProcessState::Terminated;
        info!("terminated process {} (pid {pid})", process.name);

        // The slot is gone, so the scan cannot find it through the current pid.
        if was_running {
            self.yield_from(slot + 1);
        }
        Ok(process)
    }

    /// Move a `Ready` or `Running` process to `Blocked`.
    ///
    /// Suspending the running process hands the CPU to the next ready one.
    ///
    /// # Errors
    /// - [`ProcessError::ProtectedProcess`] for pid 0.
    /// - [`ProcessError::NotFound`] if `pid` is not live.
    /// - [`ProcessError::InvalidTransition`] if it is already blocked.
    pub fn suspend(&mut self, pid: Pid) -> Result<(), ProcessError> {
        if pid == Pid::KERNEL {
            debug!("refusing to suspend the kernel process");
            return Err(ProcessError::ProtectedProcess(pid));
        }
        let process = self.get_mut(pid)?;
        let from = process.state;
        if !matches!(from, ProcessState::Ready | ProcessState::Running) {
            debug!("cannot suspend pid {pid}: {from}");
            return Err(ProcessError::InvalidTransition { from, op: "suspend" });
        }
        process.state = ProcessState::Blocked;
        trace!("suspended pid {pid}");

        if from == ProcessState::Running {
            self.yield_cpu();
        }
        Ok(())
    }

    /// Move a `Blocked` process back to `Ready`.
    ///
    /// # Errors
    /// - [`ProcessError::NotFound`] if `pid` is not live.
    /// - [`ProcessError::InvalidTransition`] if it is not blocked.
    pub fn resume(&mut self, pid: Pid) -> Result<(), ProcessError> {
        let process = self.get_mut(pid)?;
        let from = process.state;
        if from != ProcessState::Blocked {
            debug!("cannot resume pid {pid}: {from}");
            return Err(ProcessError::InvalidTransition { from, op: "resume" });
        }
        process.state = ProcessState::Ready;
        trace!("resumed pid {pid}");
        Ok(())
    }

    /// Hand the CPU to the next `Ready` process in slot order, starting just
    /// after the current process's slot and wrapping around.
    ///
    /// The previous process goes back to `Ready` if it was running. Returns
    /// the pid switched to, or `None` if nothing else is ready, in which case
    /// nothing changes.
    pub fn yield_cpu(&mut self) -> Option<Pid> {
        let start = self.slot_of(self.current).map_or(0, |s| s + 1);
        self.yield_from(start)
    }

    /// Switch to the first `Ready` process at or after slot `start`, wrapping.
    fn yield_from(&mut self, start: usize) -> Option<Pid> {
        let len = self.slots.len();
        let start = start % len;
        let next = (0..len).map(|i| (start + i) % len).find(|&i| {
            self.slots[i]
                .as_ref()
                .is_some_and(|p| p.state == ProcessState::Ready)
        })?;

        let previous = self.current;
        if let Ok(current) = self.get_mut(previous)
            && current.state == ProcessState::Running
        {
            current.state = ProcessState::Ready;
        }
        let process = self.slots[next].as_mut()?;
        process.state = ProcessState::Running;
        self.current = process.pid;
        self.context_switches = self.context_switches.wrapping_add(1);
        trace!("context switch {previous} -> {}", self.current);
        Some(self.current)
    }

    /// One scheduler tick: charge the running process and advance uptime.
    ///
    /// A user process is preempted every [`SCHEDULER_TIME_SLICE`] ticks of
    /// its own CPU time.
    pub fn tick(&mut self) {
        self.clock();
        let Ok(current) = self.get_mut(self.current) else {
            return;
        };
        current.cpu_time = current.cpu_time.wrapping_add(1);
        if current.kind == ProcessKind::User
            && current.cpu_time.is_multiple_of(SCHEDULER_TIME_SLICE)
        {
            self.yield_cpu();
        }
    }

    /// # Errors
    /// [`ProcessError::NotFound`] if `pid` is not live.
    pub fn update_memory_usage(&mut self, pid: Pid, bytes: u32) -> Result<(), ProcessError> {
        self.get_mut(pid)?.memory_usage = bytes;
        Ok(())
    }

    /// Charge `slice` extra ticks of CPU time.
    ///
    /// # Errors
    /// [`ProcessError::NotFound`] if `pid` is not live.
    pub fn update_cpu_time(&mut self, pid: Pid, slice: u32) -> Result<(), ProcessError> {
        let process = self.get_mut(pid)?;
        process.cpu_time = process.cpu_time.saturating_add(slice);
        Ok(())
    }

    #[must_use]
    pub fn info(&self, pid: Pid) -> Option<&Process> {
        self.slots.iter().flatten().find(|p| p.pid == pid)
    }

    #[must_use]
    pub fn name(&self, pid: Pid) -> Option<&str> {
        self.info(pid).map(|p| p.name.as_str())
    }

    /// Up to `max` live processes in slot order.
    pub fn list(&self, max: usize) -> impl Iterator<Item = &Process> + '_ {
        self.slots.iter().flatten().take(max)
    }

    #[must_use]
    pub const fn current_pid(&self) -> Pid {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&Process> {
        self.info(self.current)
    }

    #[must_use]
    pub const fn uptime(&self) -> u32 {
        self.uptime
    }

    #[must_use]
    pub const fn context_switches(&self) -> u32 {
        self.context_switches
    }

    #[must_use]
    pub fn stats(&self) -> ProcessStats {
        let mut stats = ProcessStats {
            context_switches: self.context_switches,
            ..ProcessStats::default()
        };
        for process in self.slots.iter().flatten() {
            stats.total += 1;
            stats.total_cpu_time += u64::from(process.cpu_time);
            match process.state {
                ProcessState::Running => stats.running += 1,
                ProcessState::Ready => stats.ready += 1,
                ProcessState::Blocked => stats.blocked += 1,
                ProcessState::Terminated => {}
            }
        }
        stats
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
