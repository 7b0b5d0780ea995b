use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind, Users};

use crate::error::{Error, Result};

/// One table row. `None` means the capability is absent on this host.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: Option<String>,
    pub path: Option<String>,
    pub user: String,
    pub cpu_percent: Option<f64>,
    pub mem_percent: Option<f64>,
}

/// Process enumeration and ownership lookup.
pub trait ProcessTable: Send {
    /// Re-enumerate and return live pids in ascending order.
    fn refresh(&mut self) -> Vec<u32>;
    /// Owner of `pid` as of the last `refresh`.
    fn user(&self, pid: u32) -> Result<String>;
    /// Start time of `pid`, in seconds since the epoch. Tells a recycled
    /// pid apart from the process that held it before.
    fn start_time(&self, _pid: u32) -> Option<u64> {
        None
    }
}

pub struct SysinfoProcessTable {
    sys: System,
    users: Users,
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoProcessTable {
    pub fn new() -> Self {
        SysinfoProcessTable {
            sys: System::new(),
            users: Users::new_with_refreshed_list(),
        }
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn refresh(&mut self) -> Vec<u32> {
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_user(UpdateKind::OnlyIfNotSet),
        );
        self.users.refresh();

        // threads show up as tasks on Linux; only whole processes are rows
        let mut pids: Vec<u32> = self
            .sys
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, _)| pid.as_u32())
            .collect();
        pids.sort_unstable();
        pids
    }

    fn user(&self, pid: u32) -> Result<String> {
        let process = self
            .sys
            .process(Pid::from_u32(pid))
            .ok_or(Error::ProcessGone(pid))?;
        Ok(process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|u| u.name().to_string())
            .unwrap_or_else(|| "Unknown".to_string()))
    }

    fn start_time(&self, pid: u32) -> Option<u64> {
        self.sys
            .process(Pid::from_u32(pid))
            .map(|process| process.start_time())
    }
}
