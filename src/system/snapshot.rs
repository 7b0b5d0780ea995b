use std::collections::BTreeMap;

use serde::Serialize;

use super::capability::LoadAverage;

/// System-wide readings for the status line. Every field is optional
/// because any provider may be absent or fail on a given cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub cpu_usage_percent: Option<f64>,
    pub mem_usage_percent: Option<f64>,
    pub total_memory_bytes: Option<u64>,
    pub temperatures: BTreeMap<String, f64>,
    pub uptime_hours: Option<f64>,
    pub load_average: Option<LoadAverage>,
}
