//! Host metrics collection using sysinfo.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::warn;

use crate::error::ControlError;
use crate::types::{HostMetrics, SystemSnapshot};

const GIB: u64 = 1024 * 1024 * 1024;

/// Source of host utilization snapshots. Implementations block for as long as
/// a meaningful CPU reading takes and must never panic past this call.
pub trait Sampler: Send + Sync {
    fn sample(&self) -> SystemSnapshot;
}

/// Raw byte counters read from the OS in one pass.
///
/// sysinfo exposes only total and available space per disk, not the free
/// count that includes root-reserved blocks. Disk "used" is therefore
/// `total - available`, so reserved blocks count as used and the percentage
/// reads a little higher than `df`'s `used / (used + avail)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostReadings {
    pub cpu_percent: f32,
    pub mem_total: u64,
    pub mem_available: u64,
    pub disk_total: u64,
    pub disk_available: u64,
}

impl HostReadings {
    pub fn into_snapshot(self) -> SystemSnapshot {
        if self.mem_total == 0 {
            return SystemSnapshot::failed(ControlError::Sampling(
                "memory total reported as zero".into(),
            ));
        }
        if self.disk_total == 0 {
            return SystemSnapshot::failed(ControlError::Sampling(
                "disk total reported as zero".into(),
            ));
        }
        let mem_used = self.mem_total.saturating_sub(self.mem_available);
        let disk_used = self.disk_total.saturating_sub(self.disk_available);
        SystemSnapshot::Sampled(HostMetrics {
            cpu_percent: round1(self.cpu_percent.clamp(0.0, 100.0)),
            memory_percent: percent(mem_used, self.mem_total),
            memory_used_gib: mem_used / GIB,
            memory_total_gib: self.mem_total / GIB,
            disk_percent: percent(disk_used, self.disk_total),
            disk_used_gib: disk_used / GIB,
            disk_total_gib: self.disk_total / GIB,
        })
    }
}

fn percent(used: u64, total: u64) -> f32 {
    round1((used as f64 / total as f64 * 100.0) as f32)
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Samples the local host. Keeps one `System` alive so CPU deltas are
/// measured against the previous refresh.
pub struct SystemSampler {
    sys: Mutex<System>,
    cpu_window: Duration,
    disk_mount: PathBuf,
}

impl SystemSampler {
    pub fn new(cpu_window: Duration, disk_mount: impl Into<PathBuf>) -> Self {
        SystemSampler {
            sys: Mutex::new(System::new()),
            cpu_window: cpu_window.max(MINIMUM_CPU_UPDATE_INTERVAL),
            disk_mount: disk_mount.into(),
        }
    }

    fn read(&self) -> Result<HostReadings, ControlError> {
        let mut sys = self
            .sys
            .lock()
            .map_err(|_| ControlError::Sampling("system handle poisoned".into()))?;

        sys.refresh_cpu_usage();
        std::thread::sleep(self.cpu_window);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let cpu_percent = sys.global_cpu_usage();
        let mem_total = sys.total_memory();
        let mem_available = sys.available_memory();
        drop(sys);

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == self.disk_mount.as_path())
            .ok_or_else(|| {
                ControlError::Sampling(format!(
                    "no filesystem mounted at {}",
                    self.disk_mount.display()
                ))
            })?;

        Ok(HostReadings {
            cpu_percent,
            mem_total,
            mem_available,
            disk_total: disk.total_space(),
            disk_available: disk.available_space(),
        })
    }
}

impl Sampler for SystemSampler {
    fn sample(&self) -> SystemSnapshot {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.read())) {
            Ok(Ok(readings)) => readings.into_snapshot(),
            Ok(Err(e)) => {
                warn!("host sampling failed: {e}");
                SystemSnapshot::failed(e)
            }
            Err(_) => {
                warn!("sysinfo refresh panicked");
                SystemSnapshot::failed(ControlError::Sampling("sysinfo refresh panicked".into()))
            }
        }
    }
}
