//! How a wrapped language server terminated.

use std::process::ExitStatus;

/// Termination of the server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerExit {
    /// Process exited normally with an exit code.
    Exited {
        /// The process exit code.
        code: i32,
    },
    /// Process was killed by a signal (Unix only).
    Signalled {
        /// The signal number that terminated the process.
        signal: i32,
    },
    /// The platform reported neither a code nor a signal.
    Unknown,
}

impl ServerExit {
    /// Whether the server exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self, Self::Exited { code: 0 })
    }
}

impl From<ExitStatus> for ServerExit {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited { code };
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signalled { signal };
            }
        }

        Self::Unknown
    }
}

impl std::fmt::Display for ServerExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exited { code } => write!(f, "exit status {code}"),
            Self::Signalled { signal } => write!(f, "terminated by signal {signal}"),
            Self::Unknown => f.write_str("unknown exit status"),
        }
    }
}
