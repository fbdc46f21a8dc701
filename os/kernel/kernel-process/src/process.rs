//! # Process Records

use alloc::string::String;
use core::fmt;
use kernel_info::sched::MAX_PROCESS_NAME_LENGTH;

/// Process identifier. Pids are handed out in increasing order and never
/// reused; pid 0 is the kernel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(u32);

impl Pid {
    pub const KERNEL: Self = Self(0);

    #[must_use]
    pub const fn new(pid: u32) -> Self {
        Self(pid)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle state.
///
/// ```text
///            yield/tick
///   Ready ◄────────────► Running
///     ▲  ╲               ╱
///     │   ╲  suspend    ╱ suspend
///     │    ▼           ▼
///  resume   Blocked ───┘
///
///   any live state ── terminate ──► Terminated
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Blocked => "blocked",
            Self::Terminated => "terminated",
        })
    }
}

/// Which band a process belongs to. The band fixes its priority range and
/// whether `tick` time-slices it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProcessKind {
    Kernel,
    System,
    User,
}

impl ProcessKind {
    /// Priority of a new process of this kind:
    ///
    /// | kind   | range    |
    /// |--------|----------|
    /// | Kernel | 200..255 |
    /// | System | 100..199 |
    /// | User   | 1..99    |
    #[must_use]
    pub const fn priority_for(self, pid: Pid) -> u32 {
        match self {
            Self::Kernel => 200 + pid.0 % 55,
            Self::System => 100 + pid.0 % 99,
            Self::User => 1 + pid.0 % 99,
        }
    }
}

impl fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Kernel => "kernel",
            Self::System => "system",
            Self::User => "user",
        })
    }
}

/// One entry of the process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    pub kind: ProcessKind,
    pub priority: u32,
    /// Ticks spent running, plus any explicitly accounted time.
    pub cpu_time: u32,
    /// Reported footprint in bytes. Purely informational.
    pub memory_usage: u32,
    /// The process that was running when this one was created.
    pub parent: Pid,
    /// Uptime at creation.
    pub start_time: u32,
    /// Opaque entry address, never called.
    pub entry_point: usize,
}

/// Cut `name` to the length limit without splitting a character.
pub(crate) fn truncate_name(name: &str) -> &str {
    if name.len() <= MAX_PROCESS_NAME_LENGTH {
        return name;
    }
    let mut end = MAX_PROCESS_NAME_LENGTH;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_stay_in_band() {
        for pid in 0..500 {
            let pid = Pid::new(pid);
            assert!((200..=254).contains(&ProcessKind::Kernel.priority_for(pid)));
            assert!((100..=198).contains(&ProcessKind::System.priority_for(pid)));
            assert!((1..=99).contains(&ProcessKind::User.priority_for(pid)));
        }
    }

    #[test]
    fn long_names_are_cut_at_char_boundary() {
        let ascii = "p".repeat(80);
        assert_eq!(truncate_name(&ascii).len(), MAX_PROCESS_NAME_LENGTH);

        // 'é' is two bytes, so byte 64 falls inside the 33rd one
        let accented = format!("a{}", "é".repeat(40));
        let cut = truncate_name(&accented);
        assert_eq!(cut.len(), 63);
        assert!(cut.ends_with('é'));
    }

    #[test]
    fn states_render_lowercase() {
        assert_eq!(ProcessState::Blocked.to_string(), "blocked");
        assert_eq!(ProcessKind::System.to_string(), "system");
    }
}
