use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::cache::IdentityCache;
use super::capability::{CpuProvider, IdentityProvider, MemoryProvider};
use super::process::{ProcessSnapshot, ProcessTable};
use super::registry::CapabilityRegistry;
use super::snapshot::SystemSnapshot;
use super::sort::sort_rows;
use crate::error::Result;
use crate::view::SortSpec;

pub const DEFAULT_CPU_WINDOW: Duration = Duration::from_millis(100);

/// Result of one sampling cycle: rows already in display order.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub rows: Vec<ProcessSnapshot>,
    pub system: SystemSnapshot,
}

struct RowProviders {
    identity: Option<Arc<dyn IdentityProvider>>,
    cpu: Option<Arc<dyn CpuProvider>>,
    memory: Option<Arc<dyn MemoryProvider>>,
}

pub struct Collector {
    registry: Arc<CapabilityRegistry>,
    processes: Box<dyn ProcessTable>,
    identities: IdentityCache,
    cpu_window: Duration,
}

impl Collector {
    pub fn new(registry: Arc<CapabilityRegistry>, processes: Box<dyn ProcessTable>) -> Self {
        Collector {
            registry,
            processes,
            identities: IdentityCache::new(),
            cpu_window: DEFAULT_CPU_WINDOW,
        }
    }

    pub fn with_cpu_window(mut self, window: Duration) -> Self {
        self.cpu_window = window;
        self
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    pub fn cached_identities(&self) -> usize {
        self.identities.len()
    }

    /// Enumerate, sample every live process, order the rows by `sort` and
    /// read the system-wide figures. A process whose read fails is left out
    /// of this cycle; it never aborts the cycle.
    pub fn refresh(&mut self, sort: &SortSpec) -> Sample {
        let _refresh_span = tracing::debug_span!("collector.refresh").entered();

        let pids = self.processes.refresh();
        let alive: HashSet<u32> = pids.iter().copied().collect();
        self.identities.retain_alive(&alive);

        let providers = RowProviders {
            identity: self.registry.identity(),
            cpu: self.registry.cpu(),
            memory: self.registry.memory(),
        };

        let mut rows = Vec::with_capacity(pids.len());
        let mut skipped = 0usize;
        for pid in pids {
            match self.build_row(pid, &providers) {
                Ok(row) => rows.push(row),
                Err(err) => {
                    skipped += 1;
                    debug!(pid, error = %err, "skipping process this cycle");
                }
            }
        }
        sort_rows(&mut rows, sort);

        let system = self.sample_system();
        debug!(rows = rows.len(), skipped, "refresh complete");
        Sample { rows, system }
    }

    fn build_row(&mut self, pid: u32, providers: &RowProviders) -> Result<ProcessSnapshot> {
        let (name, path) = match &providers.identity {
            Some(identity) => {
                let started = self.processes.start_time(pid);
                let found = self
                    .identities
                    .get_or_try_insert(pid, started, || identity.identify(pid))?;
                (Some(found.name.clone()), Some(found.path.clone()))
            }
            None => (None, None),
        };
        let user = self.processes.user(pid)?;
        let cpu_percent = providers
            .cpu
            .as_ref()
            .map(|cpu| cpu.process_cpu_percent(pid))
            .transpose()?;
        let mem_percent = providers
            .memory
            .as_ref()
            .map(|mem| mem.process_memory_percent(pid))
            .transpose()?;

        Ok(ProcessSnapshot {
            pid,
            name,
            path,
            user,
            cpu_percent,
            mem_percent,
        })
    }

    fn sample_system(&self) -> SystemSnapshot {
        let mut system = SystemSnapshot::default();

        if let Some(cpu) = self.registry.cpu() {
            system.cpu_usage_percent = reading("cpu usage", cpu.usage_percent(self.cpu_window));
            system.load_average = reading("load average", cpu.load_average());
        }
        if let Some(memory) = self.registry.memory() {
            system.mem_usage_percent = reading("memory usage", memory.usage_percent());
            system.total_memory_bytes = reading("total memory", memory.total_bytes());
        }
        if let Some(uptime) = self.registry.uptime() {
            system.uptime_hours =
                reading("uptime", uptime.uptime()).map(|d| d.as_secs_f64() / 3600.0);
        }
        if let Some(sensors) = self.registry.temperature() {
            system.temperatures = reading("temperatures", sensors.temperatures()).unwrap_or_default();
        }

        system
    }
}

fn reading<T>(what: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(what, error = %err, "system reading unavailable");
            None
        }
    }
}
