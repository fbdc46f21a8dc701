use crate::process::{Pid, ProcessState};

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessError {
    #[error("process name must not be empty")]
    EmptyName,
    #[error("process table is full")]
    TableFull,
    #[error("every pid has been issued")]
    PidsExhausted,
    #[error("no live process with pid {0}")]
    NotFound(Pid),
    #[error("pid {0} is protected")]
    ProtectedProcess(Pid),
    #[error("cannot {op} a {from} process")]
    InvalidTransition {
        from: ProcessState,
        op: &'static str,
    },
}
