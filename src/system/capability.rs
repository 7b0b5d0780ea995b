//! Capability kinds and the per-kind provider traits.
//!
//! Callers only ever hold a provider through one of these traits. Which
//! concrete reader sits behind it is decided by the registry from the
//! detected platform.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Cpu,
    Memory,
    Disk,
    Network,
    Temperature,
    Battery,
    Uptime,
    ProcessIdentity,
}

impl CapabilityKind {
    pub const COUNT: usize = 8;

    pub const ALL: [CapabilityKind; Self::COUNT] = [
        CapabilityKind::Cpu,
        CapabilityKind::Memory,
        CapabilityKind::Disk,
        CapabilityKind::Network,
        CapabilityKind::Temperature,
        CapabilityKind::Battery,
        CapabilityKind::Uptime,
        CapabilityKind::ProcessIdentity,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            CapabilityKind::Cpu => "CPU",
            CapabilityKind::Memory => "MEMORY",
            CapabilityKind::Disk => "DISK",
            CapabilityKind::Network => "NETWORK",
            CapabilityKind::Temperature => "TEMPERATURE",
            CapabilityKind::Battery => "BATTERY",
            CapabilityKind::Uptime => "UPTIME",
            CapabilityKind::ProcessIdentity => "PROCESS",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

impl fmt::Display for LoadAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {:.2} {:.2}", self.one, self.five, self.fifteen)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessIdentity {
    pub name: String,
    pub path: String,
}

/// Cumulative completed I/O operations for one block device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskStat {
    pub device: String,
    pub reads: u64,
    pub writes: u64,
}

/// Cumulative byte counters for one network interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetStat {
    pub interface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BatteryStatus {
    pub name: String,
    pub capacity_percent: Option<u8>,
    pub status: Option<String>,
    pub voltage_volts: Option<f64>,
    pub energy_wh: Option<f64>,
    pub power_watts: Option<f64>,
}

pub trait CpuProvider: Send + Sync {
    /// Lifetime average CPU share of one process, normalized by core count.
    fn process_cpu_percent(&self, pid: u32) -> Result<f64>;
    /// Aggregate busy share over `window`. Blocks the caller for the length
    /// of the window.
    fn usage_percent(&self, window: Duration) -> Result<f64>;
    fn load_average(&self) -> Result<LoadAverage>;
}

pub trait MemoryProvider: Send + Sync {
    fn process_memory_percent(&self, pid: u32) -> Result<f64>;
    fn usage_percent(&self) -> Result<f64>;
    fn total_bytes(&self) -> Result<u64>;
}

pub trait UptimeProvider: Send + Sync {
    fn uptime(&self) -> Result<Duration>;
}

pub trait TemperatureProvider: Send + Sync {
    /// Sensor name to degrees Celsius.
    fn temperatures(&self) -> Result<BTreeMap<String, f64>>;
}

pub trait DiskProvider: Send + Sync {
    fn disks(&self) -> Result<Vec<DiskStat>>;
}

pub trait NetworkProvider: Send + Sync {
    fn interfaces(&self) -> Result<Vec<NetStat>>;
}

pub trait BatteryProvider: Send + Sync {
    fn batteries(&self) -> Result<Vec<BatteryStatus>>;
}

pub trait IdentityProvider: Send + Sync {
    fn identify(&self, pid: u32) -> Result<ProcessIdentity>;
}

/// A constructed provider, tagged with the capability it serves.
#[derive(Clone)]
pub enum Provider {
    Cpu(Arc<dyn CpuProvider>),
    Memory(Arc<dyn MemoryProvider>),
    Disk(Arc<dyn DiskProvider>),
    Network(Arc<dyn NetworkProvider>),
    Temperature(Arc<dyn TemperatureProvider>),
    Battery(Arc<dyn BatteryProvider>),
    Uptime(Arc<dyn UptimeProvider>),
    ProcessIdentity(Arc<dyn IdentityProvider>),
}

impl Provider {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Provider::Cpu(_) => CapabilityKind::Cpu,
            Provider::Memory(_) => CapabilityKind::Memory,
            Provider::Disk(_) => CapabilityKind::Disk,
            Provider::Network(_) => CapabilityKind::Network,
            Provider::Temperature(_) => CapabilityKind::Temperature,
            Provider::Battery(_) => CapabilityKind::Battery,
            Provider::Uptime(_) => CapabilityKind::Uptime,
            Provider::ProcessIdentity(_) => CapabilityKind::ProcessIdentity,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Provider").field(&self.kind()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_position_in_all() {
        for (i, kind) in CapabilityKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn load_average_display() {
        let load = LoadAverage {
            one: 0.5,
            five: 1.25,
            fifteen: 2.0,
        };
        assert_eq!(load.to_string(), "0.50 1.25 2.00");
    }
}
