//! IO Service Host Client for LibOS
//!
//! Provides the process-side API of the IO host:
//!
//! - **Logging**: [`IoClient::log`], [`IoClient::log_line`], formatted logging
//!   through [`LogWriter`] and the [`io_log!`] / [`io_logln!`] macros
//! - **Fatal policy**: [`IoClient::abort_with_message`] and
//!   [`IoClient::unwrap_or_abort`] for call sites that choose to terminate
//! - **Streams**: [`InFileStream`], a read stream that owns its handle
//!
//! # Example
//!
//! ```ignore
//! use libos_io::{InFileStream, IoClient};
//!
//! let io = IoClient::kernel();
//! let mut stream = InFileStream::open(io, "/boot/config")?;
//! let mut header = [0u8; 16];
//! stream.read_at(0, &mut header)?;
//! // Stream closed when dropped
//! ```

#![no_std]
extern crate alloc;

mod log;
pub mod stream;

pub use log::LogWriter;
pub use stream::InFileStream;

use libos_process::{Gateway, IpcChannel, SvcGateway};

/// Client for the IO service host.
///
/// A thin, copyable view of an [`IpcChannel`]; every method is one or more
/// round trips on that channel.
pub struct IoClient<'c, G: Gateway = SvcGateway> {
    channel: &'c IpcChannel<G>,
}

impl<G: Gateway> Clone for IoClient<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: Gateway> Copy for IoClient<'_, G> {}

impl IoClient<'static, SvcGateway> {
    /// IO client on the kernel channel.
    pub fn kernel() -> Self {
        Self::new(IpcChannel::kernel())
    }
}

impl<'c, G: Gateway> IoClient<'c, G> {
    /// Create an IO client on `channel`.
    pub fn new(channel: &'c IpcChannel<G>) -> Self {
        Self { channel }
    }

    /// The channel this client submits on.
    pub fn channel(&self) -> &'c IpcChannel<G> {
        self.channel
    }

    /// Open a read stream on `path`.
    pub fn open_stream(&self, path: &str) -> Result<InFileStream<'c, G>, libos_process::IpcError> {
        InFileStream::open(*self, path)
    }
}

/// Log formatted text through the kernel IO host.
///
/// Each formatted fragment is its own Log round trip.
#[macro_export]
macro_rules! io_log {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let _ = write!($crate::IoClient::kernel().writer(), $($arg)*);
    }};
}

/// Log formatted text followed by a newline through the kernel IO host.
#[macro_export]
macro_rules! io_logln {
    () => ($crate::io_log!("\n"));
    ($($arg:tt)*) => {{
        $crate::io_log!($($arg)*);
        $crate::io_log!("\n");
    }};
}
