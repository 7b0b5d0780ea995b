//! Error types shared by the sampling pipeline and the terminal layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::system::capability::CapabilityKind;

#[derive(Debug, Error)]
pub enum Error {
    /// Host OS name did not match any known platform. Fatal at startup.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Capability is supported but its provider could not be constructed.
    #[error("{0} provider is not available on this system")]
    ProviderUnavailable(CapabilityKind),

    /// The process exited between enumeration and the read.
    #[error("process {0} not found")]
    ProcessGone(u32),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

impl Error {
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(what: &'static str, detail: impl Into<String>) -> Self {
        Error::Malformed {
            what,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_path() {
        let err = Error::read(
            "/proc/1/stat",
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/proc/1/stat"), "{msg}");
        assert!(msg.contains("gone"), "{msg}");
    }

    #[test]
    fn provider_unavailable_names_the_kind() {
        let err = Error::ProviderUnavailable(CapabilityKind::Temperature);
        assert_eq!(
            err.to_string(),
            "TEMPERATURE provider is not available on this system"
        );
    }
}
