//! Host platform detection and the `(Platform, CapabilityKind)` dispatch
//! table that constructs providers.

pub mod linux;
mod sysinfo_identity;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

pub use sysinfo_identity::SysinfoIdentity;

use super::capability::{CapabilityKind, Provider};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    FreeBsd,
    MacOs,
}

const LINUX_SUPPORTED: &[CapabilityKind] = &CapabilityKind::ALL;
const IDENTITY_ONLY: &[CapabilityKind] = &[CapabilityKind::ProcessIdentity];

impl Platform {
    /// Detect the platform this binary is running on.
    pub fn detect() -> Result<Self> {
        Self::from_os_name(std::env::consts::OS)
    }

    pub fn from_os_name(name: &str) -> Result<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("linux") {
            Ok(Platform::Linux)
        } else if lower.contains("freebsd") {
            Ok(Platform::FreeBsd)
        } else if lower.contains("mac") || lower.contains("darwin") {
            Ok(Platform::MacOs)
        } else {
            Err(Error::UnsupportedPlatform(name.to_string()))
        }
    }

    pub fn supported(self) -> &'static [CapabilityKind] {
        match self {
            Platform::Linux => LINUX_SUPPORTED,
            Platform::FreeBsd | Platform::MacOs => IDENTITY_ONLY,
        }
    }

    pub fn supports(self, kind: CapabilityKind) -> bool {
        self.supported().contains(&kind)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Platform::Linux => "Linux",
            Platform::FreeBsd => "FreeBSD",
            Platform::MacOs => "macOS",
        })
    }
}

/// Build the production provider for `kind` on `platform`.
pub fn construct(platform: Platform, kind: CapabilityKind) -> Result<Provider> {
    use CapabilityKind as K;
    use linux::{PROC_ROOT, SYS_ROOT};

    match (platform, kind) {
        (Platform::Linux, K::Cpu) => Ok(Provider::Cpu(Arc::new(linux::ProcCpu::new(PROC_ROOT)?))),
        (Platform::Linux, K::Memory) => Ok(Provider::Memory(Arc::new(linux::ProcMemory::new(
            PROC_ROOT,
        )))),
        (Platform::Linux, K::Disk) => Ok(Provider::Disk(Arc::new(linux::ProcDisk::new(PROC_ROOT)))),
        (Platform::Linux, K::Network) => Ok(Provider::Network(Arc::new(linux::ProcNetwork::new(
            PROC_ROOT,
        )))),
        (Platform::Linux, K::Temperature) => Ok(Provider::Temperature(Arc::new(
            linux::SysTemperature::discover(SYS_ROOT)?,
        ))),
        (Platform::Linux, K::Battery) => Ok(Provider::Battery(Arc::new(
            linux::SysBattery::discover(SYS_ROOT)?,
        ))),
        (Platform::Linux, K::Uptime) => Ok(Provider::Uptime(Arc::new(linux::ProcUptime::new(
            PROC_ROOT,
        )))),
        (Platform::Linux, K::ProcessIdentity) => Ok(Provider::ProcessIdentity(Arc::new(
            linux::ProcIdentity::new(PROC_ROOT),
        ))),
        (Platform::FreeBsd | Platform::MacOs, K::ProcessIdentity) => {
            Ok(Provider::ProcessIdentity(Arc::new(SysinfoIdentity::new())))
        }
        (_, kind) => Err(Error::ProviderUnavailable(kind)),
    }
}
