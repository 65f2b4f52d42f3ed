//! Periodic CPU / memory sampling via `sysinfo`.

use crate::capture::types::EventKind;
use sysinfo::System;

/// Samples system-wide CPU and memory utilization on demand. The runtime
/// calls [`ResourceSampler::sample`] from its resource ticker thread.
pub struct ResourceSampler {
    sys: System,
}

impl ResourceSampler {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }

    /// Take one sample. CPU usage needs two refreshes separated by time to
    /// be meaningful; the fixed sample interval between ticks provides that.
    pub fn sample(&mut self) -> EventKind {
        self.sys.refresh_cpu();
        self.sys.refresh_memory();

        let cpu = self.sys.global_cpu_info().cpu_usage() as f64;
        let total = self.sys.total_memory();
        let memory = if total > 0 {
            self.sys.used_memory() as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        EventKind::PcUsage { cpu, memory }
    }
}

impl Default for ResourceSampler {
    fn default() -> Self {
        Self::new()
    }
}
