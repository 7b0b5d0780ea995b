use std::sync::{Mutex, PoisonError};

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

use crate::error::{Error, Result};
use crate::system::capability::{IdentityProvider, ProcessIdentity};

/// Process identity through `sysinfo`, for hosts without procfs.
pub struct SysinfoIdentity {
    sys: Mutex<System>,
}

impl Default for SysinfoIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoIdentity {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl IdentityProvider for SysinfoIdentity {
    fn identify(&self, pid: u32) -> Result<ProcessIdentity> {
        let mut sys = self.sys.lock().unwrap_or_else(PoisonError::into_inner);
        let spid = Pid::from_u32(pid);
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[spid]),
            true,
            ProcessRefreshKind::nothing().with_exe(UpdateKind::OnlyIfNotSet),
        );
        let process = sys.process(spid).ok_or(Error::ProcessGone(pid))?;

        let path = process.exe().map(|p| p.to_string_lossy().into_owned());
        let name = match process.exe().and_then(|p| p.file_name()) {
            Some(base) => base.to_string_lossy().into_owned(),
            None => process.name().to_string_lossy().into_owned(),
        };

        Ok(ProcessIdentity {
            name,
            path: path.unwrap_or_else(|| "Unknown".to_string()),
        })
    }
}
