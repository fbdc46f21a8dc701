use kernel::{BootError, Kernel, services};
use kernel_fs::FsError;
use kernel_info::KernelConfig;
use kernel_process::{Pid, ProcessState};

fn boot() -> Kernel {
    Kernel::boot(KernelConfig::new().with_heap_size(1024 * 1024)).unwrap()
}

#[test]
fn boot_brings_up_every_subsystem() {
    let kernel = boot();
    assert!(kernel.fs.file_exists("/home/readme.txt"));
    assert!(kernel.fs.file_exists("/usr/bin"));
    assert_eq!(kernel.processes.current_pid(), Pid::KERNEL);
    assert_eq!(kernel.processes.stats().total, 9);
    assert!(kernel.heap.used_bytes() > 0, "starter files live on the heap");
}

#[test]
fn too_small_heap_fails_boot() {
    let result = Kernel::boot(KernelConfig::new().with_heap_size(1024));
    assert!(matches!(
        result,
        Err(BootError::Filesystem(FsError::OutOfMemory(_)))
    ));
}

#[test]
fn activity_round_charges_services() {
    let mut kernel = boot();
    let heap_used = kernel.heap.used_bytes();
    kernel.simulate_activity(true);
    kernel.simulate_activity(false);

    let cpu = |pid| kernel.processes.info(pid).unwrap().cpu_time;
    assert_eq!(cpu(services::VGA_DRIVER), 2);
    assert_eq!(cpu(services::KEYBOARD_DRIVER), 2);
    assert_eq!(cpu(services::FILESYSTEM), 2);
    assert_eq!(cpu(services::SHELL), 6);
    assert_eq!(cpu(services::SCHEDULER), 2);
    assert_eq!(cpu(services::RTC_DRIVER), 0);
    assert_eq!(cpu(Pid::KERNEL), 2, "one tick per round");

    let memory_manager = kernel.processes.info(services::MEMORY_MANAGER).unwrap();
    assert_eq!(
        memory_manager.memory_usage,
        u32::try_from(heap_used / 4).unwrap()
    );
}

#[test]
fn activity_survives_a_terminated_service() {
    let mut kernel = boot();
    kernel.processes.terminate(services::SHELL).unwrap();
    kernel.simulate_activity(false);
    assert!(kernel.processes.info(services::SHELL).is_none());
    assert_eq!(kernel.processes.uptime(), 10);
}

#[test]
fn editor_round_trip_through_the_heap() {
    let mut kernel = boot();
    kernel
        .processes
        .resume(services::TEXT_EDITOR)
        .unwrap();
    assert_eq!(
        kernel.processes.info(services::TEXT_EDITOR).unwrap().state,
        ProcessState::Ready
    );

    let Kernel { heap, fs, .. } = &mut kernel;
    let mut text = fs.read_to_end(heap, "/tmp/notes.txt").unwrap();
    text.extend_from_slice(b"- [x] editor save\n");
    fs.write_all(heap, "/tmp/notes.txt", &text).unwrap();
    assert_eq!(fs.read_to_end(heap, "/tmp/notes.txt").unwrap(), text);
}

#[test]
fn report_reflects_current_state() {
    let mut kernel = boot();
    for _ in 0..5 {
        kernel.simulate_activity(false);
    }
    let report = kernel.report();
    assert_eq!(report.uptime, 14);
    assert_eq!(report.current, Pid::KERNEL);
    assert_eq!(report.fs.total_files, 6);
    assert_eq!(report.heap.total_bytes, 1024 * 1024);
    assert_eq!(report.processes.total_cpu_time, 5 * (1 + 1 + 3 + 1) + 5);
}
