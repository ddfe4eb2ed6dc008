//! Error Types for LibOS Clients
//!
//! Every client operation funnels through one IPC round trip; this enum is
//! what a round trip (or the client logic around it) can fail with.

use core::fmt;

use libos_ipc::ServiceHost;
use serde::Serialize;

/// Errors returned by IPC calls and the resource wrappers built on them.
///
/// Termination is never decided here. Callers that want the fatal
/// behaviour pass the error to the IO client's abort helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum IpcError {
    /// The service host reported failure (success flag clear).
    TrapFailed {
        /// Host the command was sent to
        host: ServiceHost,
        /// Host-relative command code
        command: u32,
    },

    /// The feature exists in the protocol but is not built yet.
    Unimplemented(&'static str),

    /// A resource was presented to an owner that did not create it.
    NotOwned,

    /// An argument cannot be encoded into the wire payload.
    InvalidArgument(&'static str),

    /// A response word index past the fixed word count.
    WordOutOfRange(usize),
}

impl IpcError {
    /// Whether this error marks a feature that is fatal by construction
    /// (as opposed to a runtime failure a caller could retry or recover).
    pub fn is_fatal_by_design(&self) -> bool {
        matches!(self, IpcError::Unimplemented(_))
    }

    /// Check if this is a trap-level failure.
    pub fn is_trap_failure(&self) -> bool {
        matches!(self, IpcError::TrapFailed { .. })
    }
}

impl fmt::Display for IpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpcError::TrapFailed { host, command } => write!(
                f,
                "{} host rejected {}",
                host.name(),
                host.command_name(*command)
            ),
            IpcError::Unimplemented(feature) => write!(f, "{} Currently Unsupported", feature),
            IpcError::NotOwned => write!(f, "Resource not owned by this context"),
            IpcError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            IpcError::WordOutOfRange(index) => {
                write!(f, "Response word {} out of range", index)
            }
        }
    }
}
