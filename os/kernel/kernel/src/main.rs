//! # Kernel Host Runner
//!
//! Boots the kernel core as an ordinary process, drives the activity loop for
//! a number of ticks and prints the diagnostic views.
//!
//! ```text
//! KERNEL_LOG=debug kernel [TICKS]
//! ```

mod logger;

use crate::logger::ConsoleLogger;
use kernel::Kernel;
use kernel_info::KernelConfig;
use log::{LevelFilter, info, warn};
use std::error::Error;
use std::str::FromStr;

const DEFAULT_TICKS: u32 = 100;

/// Ticks between two progress reports.
const REPORT_INTERVAL: u32 = 25;

fn log_level() -> LevelFilter {
    match std::env::var("KERNEL_LOG") {
        Ok(value) => LevelFilter::from_str(&value).unwrap_or(LevelFilter::Info),
        Err(_) => LevelFilter::Info,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = KernelConfig::new().with_log_level(log_level());
    ConsoleLogger::new(config.log_level).init()?;

    let ticks = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<u32>()?,
        None => DEFAULT_TICKS,
    };

    let mut kernel = Kernel::boot(config)?;
    for tick in 1..=ticks {
        // keyboard input arrives every few ticks
        kernel.simulate_activity(tick % 7 == 0);
        if tick % REPORT_INTERVAL == 0 {
            info!("tick {tick}: {} running", kernel.processes.current_pid());
        }
    }

    println!("{}", kernel.report());
    println!();
    println!(
        "{:>4} {:<16} {:<10} {:<7} {:>4} {:>8} {:>10}",
        "PID", "NAME", "STATE", "KIND", "PRIO", "CPU", "MEMORY"
    );
    for p in kernel.processes.list(usize::MAX) {
        println!(
            "{:>4} {:<16} {:<10} {:<7} {:>4} {:>8} {:>10}",
            p.pid, p.name, p.state, p.kind, p.priority, p.cpu_time, p.memory_usage
        );
    }

    println!();
    match kernel.fs.list_directory(Some("/"), usize::MAX) {
        Ok(entries) => {
            for entry in entries {
                println!("{} {:>5} {}", entry.permissions, entry.size, entry.name);
            }
        }
        Err(e) => warn!("cannot list /: {e}"),
    }

    kernel.heap.dump_info();
    Ok(())
}
