//! IPC Channel
//!
//! Builds the [`IpcCommand`] record, hands its address to the gateway and
//! copies the response back out. This is the only marshalling boundary:
//! every client call is exactly one [`IpcChannel::submit`].
//!
//! # Example
//!
//! ```ignore
//! use libos_ipc::{graphics, ServiceHost};
//! use libos_process::IpcChannel;
//!
//! let channel = IpcChannel::kernel();
//! let context = channel
//!     .call_empty(ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT)?
//!     .handle();
//! ```

use core::ffi::c_void;
use core::mem::size_of;
use core::ptr;

use libos_ipc::{IpcCommand, IpcResponse, ServiceHost, RESPONSE_WORDS, WIRE_VERSION};

use crate::error::IpcError;
use crate::gateway::{Gateway, SvcGateway};

// Decoding below assumes the revision-1 layout: flag padded to 8 bytes,
// then the fixed word array.
const _: () = assert!(WIRE_VERSION == 1);
const _: () = assert!(size_of::<IpcResponse>() == 8 + 8 * RESPONSE_WORDS);

static KERNEL: IpcChannel<SvcGateway> = IpcChannel::new(SvcGateway);

/// A synchronous request/response channel over a [`Gateway`].
#[derive(Debug, Default)]
pub struct IpcChannel<G> {
    gateway: G,
}

impl IpcChannel<SvcGateway> {
    /// The channel that traps into the kernel.
    pub fn kernel() -> &'static Self {
        &KERNEL
    }
}

impl<G: Gateway> IpcChannel<G> {
    /// Create a channel over `gateway`.
    pub const fn new(gateway: G) -> Self {
        Self { gateway }
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Submit one command and return the raw response, unchecked.
    ///
    /// Issues exactly one trap. The payload is not copied before the trap.
    ///
    /// # Safety
    ///
    /// `arguments` (and any address inside the payload) must stay valid,
    /// unmoved and, for read destinations, writable until this returns.
    pub unsafe fn submit(
        &self,
        host: ServiceHost,
        command: u32,
        arguments: *const c_void,
    ) -> IpcResponse {
        let mut record = IpcCommand::new(host, command, arguments);
        // SAFETY: `record` outlives the trap; payload validity is the
        // caller's contract.
        unsafe { self.gateway.request_ipc(&mut record) };
        record.response
    }

    /// Submit `arguments` as the payload and decode the response.
    ///
    /// # Safety
    ///
    /// Raw addresses stored inside `arguments` must satisfy the same
    /// contract as [`submit`](Self::submit). `arguments` itself is borrowed
    /// for the call and therefore valid.
    pub unsafe fn call<A>(
        &self,
        host: ServiceHost,
        command: u32,
        arguments: &A,
    ) -> Result<Response, IpcError> {
        let payload = arguments as *const A as *const c_void;
        // SAFETY: forwarded contract, see above
        let raw = unsafe { self.submit(host, command, payload) };
        Response::decode(&raw, host, command)
    }

    /// Submit a command that carries no payload.
    pub fn call_empty(&self, host: ServiceHost, command: u32) -> Result<Response, IpcError> {
        // SAFETY: null payload, nothing for the host to dereference
        let raw = unsafe { self.submit(host, command, ptr::null()) };
        Response::decode(&raw, host, command)
    }

    /// Submit a command whose single argument travels in the pointer slot.
    pub fn call_with_word(
        &self,
        host: ServiceHost,
        command: u32,
        word: u64,
    ) -> Result<Response, IpcError> {
        let slot = word as usize as *const c_void;
        // SAFETY: the host reads the slot as a value and never dereferences it
        let raw = unsafe { self.submit(host, command, slot) };
        Response::decode(&raw, host, command)
    }

    /// Terminate the process through the gateway.
    pub fn abort(&self) -> ! {
        self.gateway.abort()
    }
}

/// A response whose success flag has been checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    words: [u64; RESPONSE_WORDS],
}

impl Response {
    /// Validate a raw response for `host`/`command`.
    pub fn decode(raw: &IpcResponse, host: ServiceHost, command: u32) -> Result<Self, IpcError> {
        if !raw.is_successful() {
            return Err(IpcError::TrapFailed { host, command });
        }
        Ok(Self { words: raw.words })
    }

    /// Word `index` of the response.
    pub fn word(&self, index: usize) -> Result<u64, IpcError> {
        self.words
            .get(index)
            .copied()
            .ok_or(IpcError::WordOutOfRange(index))
    }

    /// Word 0: the handle created by open/create commands.
    pub fn handle(&self) -> u64 {
        self.words[0]
    }

    /// All response words.
    pub fn words(&self) -> &[u64; RESPONSE_WORDS] {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockGateway, Request};
    use libos_ipc::{graphics, io, LogArgs};

    #[test]
    fn test_submit_is_one_trap_with_fixed_shape() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);

        for (host, command) in [
            (ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT),
            (ServiceHost::Io, io::CMD_GET_LOCATION),
            (ServiceHost::Graphics, 77),
        ] {
            let before = mock.round_trips();
            // SAFETY: null payload; none of these commands dereference it
            let raw = unsafe { channel.submit(host, command, ptr::null()) };
            assert_eq!(mock.round_trips(), before + 1);
            assert_eq!(raw.words.len(), RESPONSE_WORDS);
        }
    }

    #[test]
    fn test_call_surfaces_trap_failure() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);

        let err = channel
            .call_with_word(ServiceHost::Graphics, graphics::CMD_DESTROY_GRAPHICS_CONTEXT, 999)
            .unwrap_err();
        assert_eq!(
            err,
            IpcError::TrapFailed {
                host: ServiceHost::Graphics,
                command: graphics::CMD_DESTROY_GRAPHICS_CONTEXT
            }
        );
    }

    #[test]
    fn test_call_with_word_carries_value_in_pointer_slot() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);

        let handle = channel
            .call_empty(ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT)
            .unwrap()
            .handle();
        channel
            .call_with_word(ServiceHost::Graphics, graphics::CMD_DESTROY_GRAPHICS_CONTEXT, handle)
            .unwrap();

        let journal = mock.journal();
        assert_eq!(journal[1].request, Request::Word(handle));
    }

    #[test]
    fn test_call_passes_payload_address() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let text = "hello";
        let args = LogArgs {
            addr: text.as_ptr(),
            size: text.len() as u32,
        };

        // SAFETY: `text` outlives the call
        unsafe { channel.call(ServiceHost::Io, io::CMD_LOG, &args) }.unwrap();
        assert_eq!(mock.console(), "hello");
    }

    #[test]
    fn test_response_word_bounds() {
        let response = Response::decode(
            &IpcResponse::with_word0(5),
            ServiceHost::Io,
            io::CMD_OPEN_FILE_STREAM,
        )
        .unwrap();
        assert_eq!(response.handle(), 5);
        assert_eq!(response.word(RESPONSE_WORDS - 1), Ok(0));
        assert_eq!(
            response.word(RESPONSE_WORDS),
            Err(IpcError::WordOutOfRange(RESPONSE_WORDS))
        );
    }

    #[test]
    fn test_kernel_channel_on_host_build_fails_cleanly() {
        #[cfg(not(all(target_arch = "aarch64", target_os = "none")))]
        {
            let err = IpcChannel::kernel()
                .call_empty(ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT)
                .unwrap_err();
            assert!(err.is_trap_failure());
        }
    }
}
