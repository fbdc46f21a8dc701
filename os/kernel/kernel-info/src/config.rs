//! # Runtime Configuration

use crate::memory::HEAP_SIZE;
use log::LevelFilter;

/// Parameters chosen at boot.
///
/// Table capacities are compile-time constants; only the arena size and the
/// log verbosity may vary between boots.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KernelConfig {
    /// Capacity of the heap arena in bytes.
    pub heap_size: usize,
    /// Maximum level passed to the installed logger.
    pub log_level: LevelFilter,
}

impl KernelConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heap_size: HEAP_SIZE,
            log_level: LevelFilter::Info,
        }
    }

    #[must_use]
    pub const fn with_heap_size(mut self, heap_size: usize) -> Self {
        self.heap_size = heap_size;
        self
    }

    #[must_use]
    pub const fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = log_level;
        self
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let cfg = KernelConfig::default();
        assert_eq!(cfg.heap_size, HEAP_SIZE);
        assert_eq!(cfg.log_level, LevelFilter::Info);
    }

    #[test]
    fn builders_override_fields() {
        let cfg = KernelConfig::new()
            .with_heap_size(64 * 1024)
            .with_log_level(LevelFilter::Trace);
        assert_eq!(cfg.heap_size, 64 * 1024);
        assert_eq!(cfg.log_level, LevelFilter::Trace);
    }
}
