//! Host CPU and memory sampling.

use std::fmt;

use sysinfo::System;

/// Raw host figures needed to derive utilisation percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostReading {
    /// 1-minute load average.
    pub load_one: f64,
    /// Logical core count.
    pub logical_cores: usize,
    /// Total memory in bytes.
    pub total_memory: u64,
    /// Free memory in bytes.
    pub free_memory: u64,
}

/// Source of host readings.
pub trait HostProbe: Send + Sync {
    fn read(&mut self) -> HostReading;
}

/// [`HostProbe`] backed by `sysinfo`.
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for SysinfoProbe {
    fn read(&mut self) -> HostReading {
        self.system.refresh_memory();
        self.system.refresh_cpu();

        HostReading {
            load_one: System::load_average().one,
            logical_cores: self.system.cpus().len(),
            total_memory: self.system.total_memory(),
            // Matches what most agents report as "free": reclaimable cache included.
            free_memory: self.system.available_memory(),
        }
    }
}

/// A utilisation percentage that is always finite.
///
/// Displays with two decimals, e.g. `"42.17"` or `"0.00"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    /// Round `raw` to two decimals; non-finite input becomes zero.
    pub fn new(raw: f64) -> Self {
        if raw.is_finite() {
            Self((raw * 100.0).round() / 100.0)
        } else {
            Self(0.0)
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// CPU and memory utilisation at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SystemSample {
    pub cpu: Percent,
    pub mem: Percent,
}

impl SystemSample {
    /// Derive percentages from a reading, guarding every division.
    pub fn from_reading(reading: HostReading) -> Self {
        let cpu = if reading.logical_cores == 0 {
            0.0
        } else {
            reading.load_one / reading.logical_cores as f64 * 100.0
        };
        let mem = if reading.total_memory == 0 {
            0.0
        } else {
            let used = reading.total_memory.saturating_sub(reading.free_memory);
            used as f64 / reading.total_memory as f64 * 100.0
        };

        Self {
            cpu: Percent::new(cpu),
            mem: Percent::new(mem),
        }
    }
}

/// Samples host utilisation through a [`HostProbe`].
pub struct SystemSampler {
    probe: Box<dyn HostProbe>,
}

impl SystemSampler {
    pub fn new(probe: Box<dyn HostProbe>) -> Self {
        Self { probe }
    }

    pub fn sample(&mut self) -> SystemSample {
        SystemSample::from_reading(self.probe.read())
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new(Box::new(SysinfoProbe::new()))
    }
}
