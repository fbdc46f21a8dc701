use kernel_info::sched::{MAX_PROCESSES, SCHEDULER_TIME_SLICE};
use kernel_process::{Pid, ProcessError, ProcessKind, ProcessState, ProcessTable};

fn booted() -> ProcessTable {
    let mut table = ProcessTable::new();
    table.initialize().unwrap();
    table
}

fn state(table: &ProcessTable, pid: Pid) -> ProcessState {
    table.info(pid).unwrap().state
}

#[test]
fn boot_installs_standard_processes() {
    let table = booted();
    let names: Vec<_> = table.list(MAX_PROCESSES).map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "kernel",
            "memory_manager",
            "vga_driver",
            "keyboard_driver",
            "filesystem",
            "shell",
            "text_editor",
            "rtc_driver",
            "scheduler"
        ]
    );

    let kernel = table.info(Pid::KERNEL).unwrap();
    assert_eq!(kernel.state, ProcessState::Running);
    assert_eq!(kernel.priority, 255);
    assert_eq!(kernel.memory_usage, 2 * 1024 * 1024);
    assert_eq!(table.current_pid(), Pid::KERNEL);

    assert_eq!(table.name(Pid::new(6)), Some("text_editor"));
    assert_eq!(state(&table, Pid::new(6)), ProcessState::Blocked);
    assert_eq!(table.info(Pid::new(8)).unwrap().kind, ProcessKind::Kernel);
    assert_eq!(table.info(Pid::new(3)).unwrap().priority, 103);
    assert_eq!(table.info(Pid::new(3)).unwrap().memory_usage, 64 * 1024);
    assert_eq!(table.uptime(), 9);

    let stats = table.stats();
    assert_eq!(stats.total, 9);
    assert_eq!(stats.running, 1);
    assert_eq!(stats.ready, 7);
    assert_eq!(stats.blocked, 1);
}

#[test]
fn initialize_is_idempotent() {
    let mut table = booted();
    let worker = table.create("worker", ProcessKind::User, 0).unwrap();
    table.initialize().unwrap();
    assert!(table.info(worker).is_some());
}

#[test]
fn suspend_resume_terminate_lifecycle() {
    let mut table = booted();
    let worker = table.create("worker", ProcessKind::User, 0x2000).unwrap();
    assert_eq!(state(&table, worker), ProcessState::Ready);
    assert_eq!(table.info(worker).unwrap().parent, Pid::KERNEL);

    table.suspend(worker).unwrap();
    assert_eq!(state(&table, worker), ProcessState::Blocked);
    assert_eq!(
        table.suspend(worker),
        Err(ProcessError::InvalidTransition {
            from: ProcessState::Blocked,
            op: "suspend"
        })
    );
    table.resume(worker).unwrap();
    assert_eq!(
        table.resume(worker),
        Err(ProcessError::InvalidTransition {
            from: ProcessState::Ready,
            op: "resume"
        })
    );

    let last = table.terminate(worker).unwrap();
    assert_eq!(last.state, ProcessState::Terminated);
    assert_eq!(table.suspend(worker), Err(ProcessError::NotFound(worker)));
    assert_eq!(table.resume(worker), Err(ProcessError::NotFound(worker)));
    assert!(table.info(worker).is_none());
}

#[test]
fn kernel_process_is_protected() {
    let mut table = booted();
    assert_eq!(
        table.terminate(Pid::KERNEL),
        Err(ProcessError::ProtectedProcess(Pid::KERNEL))
    );
    assert_eq!(
        table.suspend(Pid::KERNEL),
        Err(ProcessError::ProtectedProcess(Pid::KERNEL))
    );
    assert_eq!(state(&table, Pid::KERNEL), ProcessState::Running);
}

#[test]
fn create_rejects_empty_names_and_full_tables() {
    let mut table = booted();
    assert_eq!(
        table.create("", ProcessKind::User, 0),
        Err(ProcessError::EmptyName)
    );
    let free = MAX_PROCESSES - table.stats().total;
    for i in 0..free {
        table.create(&format!("p{i}"), ProcessKind::User, 0).unwrap();
    }
    assert_eq!(
        table.create("one_too_many", ProcessKind::User, 0),
        Err(ProcessError::TableFull)
    );
}

#[test]
fn slots_are_reused_but_pids_are_not() {
    let mut table = booted();
    let a = table.create("a", ProcessKind::User, 0).unwrap();
    table.terminate(a).unwrap();
    let b = table.create("b", ProcessKind::User, 0).unwrap();
    assert!(b > a);
    assert_eq!(table.stats().total, 10);
    assert!(table.info(a).is_none());
}

#[test]
fn yield_visits_every_ready_process() {
    let mut table = ProcessTable::new();
    table.initialize().unwrap();
    // leave only user workers and the kernel ready
    for pid in [1, 2, 3, 4, 5, 7, 8] {
        table.suspend(Pid::new(pid)).unwrap();
    }
    let workers: Vec<_> = (0..5)
        .map(|i| table.create(&format!("w{i}"), ProcessKind::User, 0).unwrap())
        .collect();

    let ready = workers.len() + 1; // the kernel becomes ready once it yields
    let mut seen = Vec::new();
    for _ in 0..ready {
        seen.push(table.yield_cpu().unwrap());
    }
    for worker in &workers {
        assert!(seen.contains(worker), "{worker} never ran");
    }
    assert!(seen.contains(&Pid::KERNEL));
    assert_eq!(table.context_switches(), u32::try_from(ready).unwrap());
}

#[test]
fn yield_with_nothing_ready_keeps_current() {
    let mut table = booted();
    for pid in [1, 2, 3, 4, 5, 7, 8] {
        table.suspend(Pid::new(pid)).unwrap();
    }
    assert_eq!(table.yield_cpu(), None);
    assert_eq!(table.current_pid(), Pid::KERNEL);
    assert_eq!(state(&table, Pid::KERNEL), ProcessState::Running);
    assert_eq!(table.context_switches(), 0);
}

#[test]
fn exactly_one_process_runs_after_switches() {
    let mut table = booted();
    for _ in 0..25 {
        table.yield_cpu();
        assert_eq!(table.stats().running, 1);
        assert_eq!(state(&table, table.current_pid()), ProcessState::Running);
    }
}

#[test]
fn user_processes_are_preempted_each_time_slice() {
    let mut table = booted();
    for pid in [1, 2, 3, 4, 5, 7, 8] {
        table.suspend(Pid::new(pid)).unwrap();
    }
    let worker = table.create("worker", ProcessKind::User, 0).unwrap();
    assert_eq!(table.yield_cpu(), Some(worker));

    for _ in 0..SCHEDULER_TIME_SLICE - 1 {
        table.tick();
    }
    assert_eq!(table.current_pid(), worker);
    table.tick();
    assert_eq!(table.current_pid(), Pid::KERNEL, "slice used up");
    assert_eq!(table.info(worker).unwrap().cpu_time, SCHEDULER_TIME_SLICE);
    assert_eq!(state(&table, worker), ProcessState::Ready);
}

#[test]
fn kernel_processes_are_not_time_sliced() {
    let mut table = booted();
    for _ in 0..3 * SCHEDULER_TIME_SLICE {
        table.tick();
    }
    assert_eq!(table.current_pid(), Pid::KERNEL);
    assert_eq!(
        table.info(Pid::KERNEL).unwrap().cpu_time,
        3 * SCHEDULER_TIME_SLICE
    );
    assert_eq!(table.uptime(), 9 + 3 * SCHEDULER_TIME_SLICE);
}

#[test]
fn suspending_the_running_process_hands_off() {
    let mut table = booted();
    let next = table.yield_cpu().unwrap();
    assert_eq!(next, Pid::new(1));
    table.suspend(next).unwrap();
    assert_ne!(table.current_pid(), next);
    assert_eq!(table.stats().running, 1);
}

#[test]
fn terminating_the_running_process_hands_off() {
    let mut table = booted();
    let worker = table.create("worker", ProcessKind::User, 0).unwrap();
    let sibling = table.create("sibling", ProcessKind::User, 0).unwrap();
    while table.current_pid() != worker {
        table.yield_cpu();
    }
    let switches = table.context_switches();
    let last = table.terminate(worker).unwrap();
    assert_eq!(last.state, ProcessState::Terminated);
    assert_eq!(table.current_pid(), sibling);
    assert_eq!(state(&table, sibling), ProcessState::Running);
    assert_eq!(table.context_switches(), switches + 1);
    assert_eq!(table.stats().running, 1);
}

#[test]
fn children_record_the_running_parent() {
    let mut table = booted();
    let shell = Pid::new(5);
    while table.current_pid() != shell {
        table.yield_cpu();
    }
    let child = table.create("child", ProcessKind::User, 0).unwrap();
    assert_eq!(table.info(child).unwrap().parent, shell);
}

#[test]
fn accounting_updates() {
    let mut table = booted();
    table.update_memory_usage(Pid::new(1), 4096).unwrap();
    table.update_cpu_time(Pid::new(2), 3).unwrap();
    table.update_cpu_time(Pid::new(2), 2).unwrap();
    assert_eq!(table.info(Pid::new(1)).unwrap().memory_usage, 4096);
    assert_eq!(table.info(Pid::new(2)).unwrap().cpu_time, 5);
    assert_eq!(table.stats().total_cpu_time, 5);
    assert_eq!(
        table.update_cpu_time(Pid::new(99), 1),
        Err(ProcessError::NotFound(Pid::new(99)))
    );
}
