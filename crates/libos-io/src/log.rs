//! Logging through the IO host's Log command.

use alloc::format;
use alloc::string::ToString;
use core::ffi::CStr;
use core::fmt;

use libos_ipc::{io, LogArgs, ServiceHost, LOG_UNBOUNDED};
use libos_process::{Gateway, IpcError};

use crate::IoClient;

impl<'c, G: Gateway> IoClient<'c, G> {
    /// Log `text` with an explicit length.
    pub fn log(&self, text: &str) -> Result<(), IpcError> {
        self.log_bytes(text.as_bytes())
    }

    /// Log raw bytes with an explicit length.
    ///
    /// `LOG_UNBOUNDED` is reserved, so at most `u32::MAX - 1` bytes fit in
    /// one command.
    pub fn log_bytes(&self, bytes: &[u8]) -> Result<(), IpcError> {
        let size = u32::try_from(bytes.len())
            .ok()
            .filter(|size| *size != LOG_UNBOUNDED)
            .ok_or(IpcError::InvalidArgument("log text too long for one command"))?;
        let args = LogArgs {
            addr: bytes.as_ptr(),
            size,
        };
        // SAFETY: `bytes` is borrowed for the whole round trip
        unsafe { self.channel.call(ServiceHost::Io, io::CMD_LOG, &args) }?;
        Ok(())
    }

    /// Log NUL-terminated text; the host finds the end.
    pub fn log_cstr(&self, text: &CStr) -> Result<(), IpcError> {
        let args = LogArgs {
            addr: text.as_ptr() as *const u8,
            size: LOG_UNBOUNDED,
        };
        // SAFETY: `text` is NUL-terminated and borrowed for the round trip
        unsafe { self.channel.call(ServiceHost::Io, io::CMD_LOG, &args) }?;
        Ok(())
    }

    /// Log `text` then a newline.
    ///
    /// Two round trips; a concurrent logger may interleave between them.
    pub fn log_line(&self, text: &str) -> Result<(), IpcError> {
        self.log(text)?;
        self.log("\n")
    }

    /// Log `"Error: " + message` as a line, then terminate the process.
    pub fn abort_with_message(&self, message: &str) -> ! {
        let line = format!("Error: {}", message);
        // Termination proceeds even if the log is rejected
        let _ = self.log_line(&line);
        self.channel.abort()
    }

    /// Unwrap `result`, or log the error and terminate.
    ///
    /// This is the call-site policy for callers that treat any IPC failure
    /// as fatal.
    pub fn unwrap_or_abort<T>(&self, result: Result<T, IpcError>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => self.abort_with_message(&err.to_string()),
        }
    }

    /// A `core::fmt::Write` sink over this client.
    pub fn writer(&self) -> LogWriter<'c, G> {
        LogWriter { io: *self }
    }
}

/// Formatted-output adapter: every `write_str` is one Log round trip.
pub struct LogWriter<'c, G: Gateway> {
    io: IoClient<'c, G>,
}

impl<G: Gateway> fmt::Write for LogWriter<'_, G> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.io.log(s).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use libos_process::testing::{MockGateway, Request};
    use libos_process::IpcChannel;

    #[test]
    fn test_log_line_is_two_round_trips() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = IoClient::new(&channel);

        client.log_line("ready").unwrap();

        let logs = mock.round_trips_for(ServiceHost::Io, io::CMD_LOG);
        assert_eq!(logs.len(), 2);
        assert_eq!(
            logs[1].request,
            Request::Log {
                text: "\n".into()
            }
        );
        assert_eq!(mock.console(), "ready\n");
    }

    #[test]
    fn test_log_cstr_is_unbounded() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = IoClient::new(&channel);

        let text = CStr::from_bytes_with_nul(b"kernel says hi\0").unwrap();
        client.log_cstr(text).unwrap();
        assert_eq!(mock.console(), "kernel says hi");
    }

    #[test]
    fn test_rejected_log_is_reported() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = IoClient::new(&channel);

        mock.fail_next(ServiceHost::Io, io::CMD_LOG);
        assert!(client.log("lost").unwrap_err().is_trap_failure());
        assert_eq!(mock.console(), "");
    }

    #[test]
    fn test_writer_formats() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = IoClient::new(&channel);

        write!(client.writer(), "{} frames in {}ms", 60, 1000).unwrap();
        assert_eq!(mock.console(), "60 frames in 1000ms");
    }

    #[test]
    #[should_panic(expected = "abort trap")]
    fn test_abort_with_message_terminates() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        IoClient::new(&channel).abort_with_message("disk on fire");
    }

    #[test]
    fn test_unwrap_or_abort_passes_values_through() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = IoClient::new(&channel);

        assert_eq!(client.unwrap_or_abort(Ok::<u32, IpcError>(7)), 7);
        assert_eq!(mock.round_trips(), 0);
    }
}
