use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use super::capability::{
    BatteryProvider, CapabilityKind, CpuProvider, DiskProvider, IdentityProvider, MemoryProvider,
    NetworkProvider, Provider, TemperatureProvider, UptimeProvider,
};
use super::platform::{self, Platform};
use crate::error::Result;

pub type ProviderFactory =
    Box<dyn Fn(Platform, CapabilityKind) -> Result<Provider> + Send + Sync + 'static>;

/// Lazily constructs and caches one provider per supported capability.
///
/// Unsupported kinds resolve to `None` without touching the factory. A
/// supported kind whose construction fails is logged once and stays `None`
/// for the life of the registry.
pub struct CapabilityRegistry {
    platform: Platform,
    factory: ProviderFactory,
    slots: [OnceLock<Option<Provider>>; CapabilityKind::COUNT],
}

impl CapabilityRegistry {
    pub fn new(platform: Platform) -> Self {
        Self::with_factory(platform, platform::construct)
    }

    pub fn with_factory<F>(platform: Platform, factory: F) -> Self
    where
        F: Fn(Platform, CapabilityKind) -> Result<Provider> + Send + Sync + 'static,
    {
        Self {
            platform,
            factory: Box::new(factory),
            slots: std::array::from_fn(|_| OnceLock::new()),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn supported(&self) -> &'static [CapabilityKind] {
        self.platform.supported()
    }

    pub fn get(&self, kind: CapabilityKind) -> Option<Provider> {
        if !self.platform.supports(kind) {
            return None;
        }
        self.slots[kind.index()]
            .get_or_init(|| self.construct(kind))
            .clone()
    }

    fn construct(&self, kind: CapabilityKind) -> Option<Provider> {
        match (self.factory)(self.platform, kind) {
            Ok(provider) if provider.kind() == kind => {
                debug!(%kind, platform = %self.platform, "provider constructed");
                Some(provider)
            }
            Ok(provider) => {
                warn!(%kind, got = %provider.kind(), "factory returned the wrong provider kind");
                None
            }
            Err(err) => {
                warn!(%kind, platform = %self.platform, error = %err, "provider unavailable");
                None
            }
        }
    }

    pub fn cpu(&self) -> Option<Arc<dyn CpuProvider>> {
        match self.get(CapabilityKind::Cpu)? {
            Provider::Cpu(p) => Some(p),
            _ => None,
        }
    }

    pub fn memory(&self) -> Option<Arc<dyn MemoryProvider>> {
        match self.get(CapabilityKind::Memory)? {
            Provider::Memory(p) => Some(p),
            _ => None,
        }
    }

    pub fn disk(&self) -> Option<Arc<dyn DiskProvider>> {
        match self.get(CapabilityKind::Disk)? {
            Provider::Disk(p) => Some(p),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<Arc<dyn NetworkProvider>> {
        match self.get(CapabilityKind::Network)? {
            Provider::Network(p) => Some(p),
            _ => None,
        }
    }

    pub fn temperature(&self) -> Option<Arc<dyn TemperatureProvider>> {
        match self.get(CapabilityKind::Temperature)? {
            Provider::Temperature(p) => Some(p),
            _ => None,
        }
    }

    pub fn battery(&self) -> Option<Arc<dyn BatteryProvider>> {
        match self.get(CapabilityKind::Battery)? {
            Provider::Battery(p) => Some(p),
            _ => None,
        }
    }

    pub fn uptime(&self) -> Option<Arc<dyn UptimeProvider>> {
        match self.get(CapabilityKind::Uptime)? {
            Provider::Uptime(p) => Some(p),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<Arc<dyn IdentityProvider>> {
        match self.get(CapabilityKind::ProcessIdentity)? {
            Provider::ProcessIdentity(p) => Some(p),
            _ => None,
        }
    }
}
