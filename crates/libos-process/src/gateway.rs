//! Trap Gateway
//!
//! The only place the process crosses into the kernel. Two entry points:
//! submit an IPC command (trap `0x00`) and terminate (trap `0x01`).
//!
//! ## Calling Convention (AArch64)
//!
//! - `x0`: address of the `IpcCommand`
//! - The handler writes the response into the same record before returning
//!
//! The [`Gateway`] trait is the seam between the channel and the trap, so
//! the channel can run against the kernel or against
//! [`MockGateway`](crate::testing::MockGateway).

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
use core::arch::asm;

use libos_ipc::IpcCommand;

/// Entry points into the kernel.
pub trait Gateway {
    /// Issue the IPC trap for `command`.
    ///
    /// Blocks until the service host has written its response into
    /// `command.response`.
    ///
    /// # Safety
    ///
    /// `command.arguments`, and every address the payload carries, must be
    /// valid for the access the addressed command performs (reads of the
    /// payload, writes into read destinations) for the whole call.
    unsafe fn request_ipc(&self, command: &mut IpcCommand);

    /// Terminate the process. Never returns.
    fn abort(&self) -> !;
}

impl<G: Gateway + ?Sized> Gateway for &G {
    unsafe fn request_ipc(&self, command: &mut IpcCommand) {
        // SAFETY: forwarded with the caller's guarantees
        unsafe { (**self).request_ipc(command) }
    }

    fn abort(&self) -> ! {
        (**self).abort()
    }
}

/// The `svc` based gateway used by processes running on the kernel.
#[derive(Clone, Copy, Debug, Default)]
pub struct SvcGateway;

#[cfg(all(target_arch = "aarch64", target_os = "none"))]
impl Gateway for SvcGateway {
    #[inline(never)]
    unsafe fn request_ipc(&self, command: &mut IpcCommand) {
        let record: *mut IpcCommand = command;
        // SAFETY: the record is a live, exclusively borrowed stack value and
        // the caller guarantees the payload behind it. The handler writes
        // only into `record.response`, so no `nomem`/`readonly` here.
        unsafe {
            asm!(
                "svc #0x00",
                in("x0") record,
                clobber_abi("C"),
                options(nostack)
            );
        }
    }

    fn abort(&self) -> ! {
        // SAFETY: the abort trap takes no arguments and touches no memory
        unsafe {
            asm!("svc #0x01", options(nostack, nomem));
        }
        // The trap returned: fault so the kernel tears the process down
        // SAFETY: `udf` raises an undefined-instruction exception and never
        // falls through
        unsafe {
            asm!("udf #0", options(noreturn, nostack, nomem));
        }
    }
}

#[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
impl Gateway for SvcGateway {
    unsafe fn request_ipc(&self, _command: &mut IpcCommand) {
        // No kernel to trap into: the response slot stays unsuccessful
    }

    fn abort(&self) -> ! {
        panic!("abort trap issued outside the LibOS target")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr;
    use libos_ipc::{io, ServiceHost};

    #[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
    #[test]
    fn test_host_build_leaves_response_unsuccessful() {
        let mut record = IpcCommand::new(ServiceHost::Io, io::CMD_LOG, ptr::null());
        // SAFETY: null payload, the host-build gateway never dereferences it
        unsafe { SvcGateway.request_ipc(&mut record) };
        assert!(!record.response.is_successful());
    }

    #[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
    #[test]
    #[should_panic(expected = "abort trap")]
    fn test_host_build_abort_panics() {
        SvcGateway.abort();
    }
}
