//! One-shot report of every capability the registry can resolve, for
//! `procdash --probe`.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};

use super::capability::{CapabilityKind, Provider};
use super::platform::Platform;
use super::registry::CapabilityRegistry;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityReport {
    pub kind: CapabilityKind,
    pub supported: bool,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub platform: Platform,
    pub capabilities: Vec<CapabilityReport>,
}

/// Resolve every kind and take one reading from each available provider.
/// `pid` is the process used for per-process capabilities.
pub fn probe(registry: &CapabilityRegistry, pid: u32, cpu_window: Duration) -> ProbeReport {
    let capabilities = CapabilityKind::ALL
        .iter()
        .map(|&kind| {
            let supported = registry.platform().supports(kind);
            let provider = registry.get(kind);
            let available = provider.is_some();
            let (reading, error) = match provider.map(|p| read(&p, pid, cpu_window)) {
                Some(Ok(value)) => (Some(value), None),
                Some(Err(err)) => (None, Some(err.to_string())),
                None => (None, None),
            };
            CapabilityReport {
                kind,
                supported,
                available,
                reading,
                error,
            }
        })
        .collect();

    ProbeReport {
        platform: registry.platform(),
        capabilities,
    }
}

fn read(provider: &Provider, pid: u32, cpu_window: Duration) -> Result<Value> {
    Ok(match provider {
        Provider::Cpu(cpu) => json!({
            "usage_percent": cpu.usage_percent(cpu_window)?,
            "load_average": cpu.load_average()?.to_string(),
            "process_percent": cpu.process_cpu_percent(pid)?,
        }),
        Provider::Memory(memory) => json!({
            "usage_percent": memory.usage_percent()?,
            "total_bytes": memory.total_bytes()?,
            "process_percent": memory.process_memory_percent(pid)?,
        }),
        Provider::Disk(disk) => json!(disk.disks()?),
        Provider::Network(network) => json!(network.interfaces()?),
        Provider::Temperature(sensors) => json!(sensors.temperatures()?),
        Provider::Battery(battery) => json!(battery.batteries()?),
        Provider::Uptime(uptime) => json!({ "seconds": uptime.uptime()?.as_secs() }),
        Provider::ProcessIdentity(identity) => json!(identity.identify(pid)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::system::capability::{DiskProvider, DiskStat, UptimeProvider};
    use std::sync::Arc;

    struct OneDisk;

    impl DiskProvider for OneDisk {
        fn disks(&self) -> Result<Vec<DiskStat>> {
            Ok(vec![DiskStat {
                device: "sda".to_string(),
                reads: 10,
                writes: 20,
            }])
        }
    }

    struct BrokenUptime;

    impl UptimeProvider for BrokenUptime {
        fn uptime(&self) -> Result<Duration> {
            Err(Error::malformed("uptime", "empty"))
        }
    }

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::with_factory(Platform::Linux, |_, kind| match kind {
            CapabilityKind::Disk => Ok(Provider::Disk(Arc::new(OneDisk))),
            CapabilityKind::Uptime => Ok(Provider::Uptime(Arc::new(BrokenUptime))),
            other => Err(Error::ProviderUnavailable(other)),
        })
    }

    fn entry(report: &ProbeReport, kind: CapabilityKind) -> &CapabilityReport {
        report
            .capabilities
            .iter()
            .find(|c| c.kind == kind)
            .unwrap()
    }

    #[test]
    fn reports_every_kind() {
        let report = probe(&registry(), 1, Duration::ZERO);
        assert_eq!(report.capabilities.len(), CapabilityKind::COUNT);
        assert!(report.capabilities.iter().all(|c| c.supported));
    }

    #[test]
    fn reading_error_and_absence_are_distinguished() {
        let report = probe(&registry(), 1, Duration::ZERO);

        let disk = entry(&report, CapabilityKind::Disk);
        assert!(disk.available);
        assert_eq!(
            disk.reading,
            Some(json!([{ "device": "sda", "reads": 10, "writes": 20 }]))
        );

        let uptime = entry(&report, CapabilityKind::Uptime);
        assert!(uptime.available);
        assert!(uptime.reading.is_none());
        assert!(uptime.error.as_deref().unwrap().contains("uptime"));

        let battery = entry(&report, CapabilityKind::Battery);
        assert!(!battery.available);
        assert!(battery.error.is_none());
    }

    #[test]
    fn unsupported_kinds_on_macos() {
        let registry = CapabilityRegistry::with_factory(Platform::MacOs, |_, kind| {
            Err(Error::ProviderUnavailable(kind))
        });
        let report = probe(&registry, 1, Duration::ZERO);
        let memory = entry(&report, CapabilityKind::Memory);
        assert!(!memory.supported);
        assert!(!memory.available);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["platform"], "macos");
        assert_eq!(json["capabilities"][1]["kind"], "memory");
        assert!(json["capabilities"][1].get("reading").is_none());
    }
}
