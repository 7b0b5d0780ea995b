//! procfs/sysfs readers. Every provider takes its root directory so tests
//! can point it at a fixture tree.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::system::cache::TtlCache;
use crate::system::capability::{
    BatteryProvider, BatteryStatus, CapabilityKind, CpuProvider, DiskProvider, DiskStat,
    IdentityProvider, LoadAverage, MemoryProvider, NetStat, NetworkProvider, ProcessIdentity,
    TemperatureProvider, UptimeProvider,
};

pub const PROC_ROOT: &str = "/proc";
pub const SYS_ROOT: &str = "/sys";

const PAGE_SIZE: u64 = 4096;
const SENSOR_TTL: Duration = Duration::from_millis(500);
const UNKNOWN: &str = "Unknown";

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::read(path, e))
}

/// Read `<root>/<pid>/<file>`, reporting a vanished process as `ProcessGone`.
fn read_pid_file(root: &Path, pid: u32, file: &str) -> Result<String> {
    let path = root.join(pid.to_string()).join(file);
    fs::read_to_string(&path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::ProcessGone(pid),
        _ => Error::read(path, e),
    })
}

fn read_trimmed_or(path: &Path, fallback: &str) -> String {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| fallback.to_string())
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    };
    out.sort();
    out
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// utime + stime, in clock ticks, from the contents of `/proc/<pid>/stat`.
pub fn parse_stat_cpu_ticks(contents: &str) -> Result<u64> {
    // comm may contain spaces and parens, so split after the last ')'
    let after_comm = contents
        .rfind(')')
        .ok_or_else(|| Error::malformed("pid stat", "missing comm terminator"))?
        + 1;
    let fields: Vec<&str> = contents[after_comm..].split_whitespace().collect();
    // state(0) ... utime(11) stime(12)
    let field = |i: usize| -> Result<u64> {
        fields
            .get(i)
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| Error::malformed("pid stat", format!("field {i}")))
    };
    Ok(field(11)? + field(12)?)
}

/// Resident pages from the contents of `/proc/<pid>/statm`.
pub fn parse_statm_rss_pages(contents: &str) -> Result<u64> {
    contents
        .split_whitespace()
        .nth(1)
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| Error::malformed("statm", contents.trim()))
}

pub fn parse_uptime_secs(contents: &str) -> Result<f64> {
    contents
        .split_whitespace()
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| Error::malformed("uptime", contents.trim()))
}

pub fn parse_loadavg(contents: &str) -> Result<LoadAverage> {
    let mut parts = contents.split_whitespace().map(|p| p.parse::<f64>().ok());
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Some(one)), Some(Some(five)), Some(Some(fifteen))) => {
            Ok(LoadAverage { one, five, fifteen })
        }
        _ => Err(Error::malformed("loadavg", contents.trim())),
    }
}

/// `(total, idle)` jiffies from the aggregate `cpu` line of `/proc/stat`.
pub fn parse_cpu_totals(contents: &str) -> Result<(u64, u64)> {
    let line = contents
        .lines()
        .next()
        .filter(|l| l.starts_with("cpu "))
        .ok_or_else(|| Error::malformed("stat", "missing aggregate cpu line"))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse().unwrap_or(0))
        .collect();
    let idle = *values
        .get(3)
        .ok_or_else(|| Error::malformed("stat", line.to_string()))?;
    Ok((values.iter().sum(), idle))
}

pub fn count_cores(contents: &str) -> usize {
    contents
        .lines()
        .filter(|l| {
            l.strip_prefix("cpu")
                .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        })
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemInfo {
    pub total_kb: u64,
    pub free_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    pub sreclaimable_kb: u64,
    pub shmem_kb: u64,
}

impl MemInfo {
    /// Free plus reclaimable page cache, minus shared memory.
    pub fn reclaimable_free_kb(&self) -> u64 {
        (self.free_kb + self.buffers_kb + self.cached_kb + self.sreclaimable_kb)
            .saturating_sub(self.shmem_kb)
    }

    pub fn used_kb(&self) -> u64 {
        self.total_kb.saturating_sub(self.reclaimable_free_kb())
    }

    pub fn used_percent(&self) -> f64 {
        round_to(100.0 * self.used_kb() as f64 / self.total_kb as f64, 2)
    }
}

pub fn parse_meminfo(contents: &str) -> Result<MemInfo> {
    let mut info = MemInfo::default();
    for line in contents.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        match key {
            "MemTotal" => info.total_kb = value,
            "MemFree" => info.free_kb = value,
            "Buffers" => info.buffers_kb = value,
            "Cached" => info.cached_kb = value,
            "SReclaimable" => info.sreclaimable_kb = value,
            "Shmem" => info.shmem_kb = value,
            _ => {}
        }
    }
    if info.total_kb == 0 {
        return Err(Error::malformed("meminfo", "MemTotal missing or zero"));
    }
    Ok(info)
}

pub fn parse_diskstats(contents: &str) -> Vec<DiskStat> {
    contents
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 14 {
                return None;
            }
            Some(DiskStat {
                device: parts[2].to_string(),
                reads: parts[3].parse().ok()?,
                writes: parts[7].parse().ok()?,
            })
        })
        .collect()
}

pub fn parse_net_dev(contents: &str) -> Vec<NetStat> {
    contents
        .lines()
        .skip(2)
        .filter_map(|line| {
            let (iface, counters) = line.split_once(':')?;
            let nums: Vec<u64> = counters
                .split_whitespace()
                .filter_map(|n| n.parse().ok())
                .collect();
            if nums.len() < 9 {
                return None;
            }
            Some(NetStat {
                interface: iface.trim().to_string(),
                rx_bytes: nums[0],
                tx_bytes: nums[8],
            })
        })
        .collect()
}

#[derive(Debug)]
pub struct ProcCpu {
    root: PathBuf,
    cores: usize,
}

impl ProcCpu {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let cores = count_cores(&read(&root.join("stat"))?);
        if cores == 0 {
            return Err(Error::malformed("stat", "no per-core cpu lines"));
        }
        Ok(Self { root, cores })
    }

    fn totals(&self) -> Result<(u64, u64)> {
        parse_cpu_totals(&read(&self.root.join("stat"))?)
    }
}

impl CpuProvider for ProcCpu {
    fn process_cpu_percent(&self, pid: u32) -> Result<f64> {
        let ticks = parse_stat_cpu_ticks(&read_pid_file(&self.root, pid, "stat")?)?;
        let uptime = parse_uptime_secs(&read(&self.root.join("uptime"))?)?;
        if uptime <= 0.0 {
            return Err(Error::malformed("uptime", "non-positive uptime"));
        }
        Ok(round_to(100.0 * ticks as f64 / uptime / self.cores as f64, 3))
    }

    fn usage_percent(&self, window: Duration) -> Result<f64> {
        let (total1, idle1) = self.totals()?;
        std::thread::sleep(window);
        let (total2, idle2) = self.totals()?;

        let total = total2.saturating_sub(total1);
        let idle = idle2.saturating_sub(idle1);
        if total == 0 {
            return Ok(0.0);
        }
        Ok(100.0 * total.saturating_sub(idle) as f64 / total as f64)
    }

    fn load_average(&self) -> Result<LoadAverage> {
        parse_loadavg(&read(&self.root.join("loadavg"))?)
    }
}

#[derive(Debug)]
pub struct ProcMemory {
    root: PathBuf,
    meminfo: TtlCache<MemInfo>,
}

impl ProcMemory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            meminfo: TtlCache::new(SENSOR_TTL),
        }
    }

    fn meminfo(&self) -> Result<MemInfo> {
        self.meminfo
            .get_or_refresh(|| parse_meminfo(&read(&self.root.join("meminfo"))?))
    }
}

impl MemoryProvider for ProcMemory {
    fn process_memory_percent(&self, pid: u32) -> Result<f64> {
        let info = self.meminfo()?;
        let rss_pages = parse_statm_rss_pages(&read_pid_file(&self.root, pid, "statm")?)?;
        let rss_bytes = rss_pages * PAGE_SIZE;
        Ok(round_to(
            100.0 * rss_bytes as f64 / (info.total_kb * 1024) as f64,
            3,
        ))
    }

    fn usage_percent(&self) -> Result<f64> {
        Ok(self.meminfo()?.used_percent())
    }

    fn total_bytes(&self) -> Result<u64> {
        Ok(self.meminfo()?.total_kb * 1024)
    }
}

#[derive(Debug)]
pub struct ProcUptime {
    root: PathBuf,
}

impl ProcUptime {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl UptimeProvider for ProcUptime {
    fn uptime(&self) -> Result<Duration> {
        let secs = parse_uptime_secs(&read(&self.root.join("uptime"))?)?;
        Duration::try_from_secs_f64(secs).map_err(|e| Error::malformed("uptime", e.to_string()))
    }
}

#[derive(Debug)]
pub struct ProcDisk {
    root: PathBuf,
}

impl ProcDisk {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DiskProvider for ProcDisk {
    fn disks(&self) -> Result<Vec<DiskStat>> {
        Ok(parse_diskstats(&read(&self.root.join("diskstats"))?))
    }
}

#[derive(Debug)]
pub struct ProcNetwork {
    root: PathBuf,
}

impl ProcNetwork {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl NetworkProvider for ProcNetwork {
    fn interfaces(&self) -> Result<Vec<NetStat>> {
        Ok(parse_net_dev(&read(&self.root.join("net/dev"))?))
    }
}

/// Temperatures from `class/hwmon`, falling back to `class/thermal` zones
/// when hwmon exposes nothing.
#[derive(Debug)]
pub struct SysTemperature {
    hwmon: PathBuf,
    thermal: PathBuf,
    cache: TtlCache<BTreeMap<String, f64>>,
}

impl SysTemperature {
    pub fn discover(sys_root: impl AsRef<Path>) -> Result<Self> {
        let class = sys_root.as_ref().join("class");
        let hwmon = class.join("hwmon");
        let thermal = class.join("thermal");
        if !hwmon.is_dir() && !thermal.is_dir() {
            return Err(Error::ProviderUnavailable(CapabilityKind::Temperature));
        }
        Ok(Self {
            hwmon,
            thermal,
            cache: TtlCache::new(SENSOR_TTL),
        })
    }

    fn scan(&self) -> BTreeMap<String, f64> {
        let mut temps = BTreeMap::new();
        for chip in sorted_entries(&self.hwmon) {
            let name = read_trimmed_or(&chip.join("name"), "hwmon");
            for input in sorted_entries(&chip) {
                let file = file_name(&input);
                let Some(base) = file
                    .strip_suffix("_input")
                    .filter(|b| b.starts_with("temp"))
                else {
                    continue;
                };
                let label = read_trimmed_or(&chip.join(format!("{base}_label")), base);
                if let Some(celsius) = read_millidegrees(&input) {
                    temps.insert(format!("{name}:{label}"), celsius);
                }
            }
        }
        if !temps.is_empty() {
            return temps;
        }

        for zone in sorted_entries(&self.thermal) {
            if !file_name(&zone).starts_with("thermal_zone") {
                continue;
            }
            let kind = read_trimmed_or(&zone.join("type"), "zone");
            if let Some(celsius) = read_millidegrees(&zone.join("temp")) {
                temps.insert(kind, celsius);
            }
        }
        temps
    }
}

fn read_millidegrees(path: &Path) -> Option<f64> {
    let raw: f64 = fs::read_to_string(path).ok()?.trim().parse().ok()?;
    Some(raw / 1000.0)
}

impl TemperatureProvider for SysTemperature {
    fn temperatures(&self) -> Result<BTreeMap<String, f64>> {
        self.cache.get_or_refresh(|| Ok(self.scan()))
    }
}

#[derive(Debug)]
pub struct SysBattery {
    batteries: Vec<PathBuf>,
}

impl SysBattery {
    pub fn discover(sys_root: impl AsRef<Path>) -> Result<Self> {
        let supply = sys_root.as_ref().join("class/power_supply");
        let batteries: Vec<PathBuf> = sorted_entries(&supply)
            .into_iter()
            .filter(|p| file_name(p).starts_with("BAT"))
            .collect();
        if batteries.is_empty() {
            return Err(Error::ProviderUnavailable(CapabilityKind::Battery));
        }
        Ok(Self { batteries })
    }
}

fn read_micro(path: &Path) -> Option<f64> {
    let raw: f64 = fs::read_to_string(path).ok()?.trim().parse().ok()?;
    Some(raw / 1_000_000.0)
}

impl BatteryProvider for SysBattery {
    fn batteries(&self) -> Result<Vec<BatteryStatus>> {
        Ok(self
            .batteries
            .iter()
            .map(|dir| BatteryStatus {
                name: file_name(dir).to_string(),
                capacity_percent: fs::read_to_string(dir.join("capacity"))
                    .ok()
                    .and_then(|s| s.trim().parse().ok()),
                status: fs::read_to_string(dir.join("status"))
                    .ok()
                    .map(|s| s.trim().to_string()),
                voltage_volts: read_micro(&dir.join("voltage_now")),
                energy_wh: read_micro(&dir.join("energy_now")),
                power_watts: read_micro(&dir.join("power_now")),
            })
            .collect())
    }
}

/// Executable path from the `exe` link, name from its basename, with
/// `comm` as the name fallback for kernel threads and unreadable links.
#[derive(Debug)]
pub struct ProcIdentity {
    root: PathBuf,
}

impl ProcIdentity {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl IdentityProvider for ProcIdentity {
    fn identify(&self, pid: u32) -> Result<ProcessIdentity> {
        let dir = self.root.join(pid.to_string());
        if !dir.is_dir() {
            return Err(Error::ProcessGone(pid));
        }

        let path = fs::read_link(dir.join("exe"))
            .ok()
            .map(|p| p.to_string_lossy().into_owned());
        let name = match path.as_deref().and_then(|p| p.rsplit('/').next()) {
            Some(base) if !base.is_empty() => base.to_string(),
            _ => read_trimmed_or(&dir.join("comm"), UNKNOWN),
        };

        Ok(ProcessIdentity {
            name,
            path: path.unwrap_or_else(|| UNKNOWN.to_string()),
        })
    }
}
