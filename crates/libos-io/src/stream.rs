//! Read streams backed by the IO host.
//!
//! An [`InFileStream`] owns one stream handle from `open` until it is
//! closed, either explicitly with [`InFileStream::close`] or when dropped.
//! The handle is released exactly once on every path.

use alloc::vec::Vec;
use core::mem::ManuallyDrop;

use libos_ipc::{io, ServiceHost, StreamRequest};
use libos_process::{Gateway, IpcError, SvcGateway};

use crate::IoClient;

/// A read stream that owns its IO host handle.
///
/// Move-only: duplicating it would make two owners close one handle.
///
/// ```compile_fail
/// use libos_io::InFileStream;
///
/// fn duplicate(stream: &InFileStream<'static>) -> InFileStream<'static> {
///     stream.clone()
/// }
/// ```
pub struct InFileStream<'c, G: Gateway = SvcGateway> {
    client: IoClient<'c, G>,
    handle: u64,
}

impl<'c, G: Gateway> InFileStream<'c, G> {
    /// Open `path` for reading.
    ///
    /// The returned stream closes its handle when dropped, including on
    /// early returns from the caller.
    pub fn open(client: IoClient<'c, G>, path: &str) -> Result<Self, IpcError> {
        if path.as_bytes().contains(&0) {
            return Err(IpcError::InvalidArgument("path contains a NUL byte"));
        }
        let mut name = Vec::with_capacity(path.len() + 1);
        name.extend_from_slice(path.as_bytes());
        name.push(0);

        let request = StreamRequest::open(name.as_ptr());
        // SAFETY: `name` is NUL-terminated and lives until the call returns
        let response = unsafe {
            client
                .channel()
                .call(ServiceHost::Io, io::CMD_OPEN_FILE_STREAM, &request)
        }?;

        Ok(Self {
            client,
            handle: response.handle(),
        })
    }

    /// The IO host handle owned by this stream.
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Size of the stream.
    ///
    /// The IO host does not serve `GetLocation` yet, so this always reports
    /// [`IpcError::Unimplemented`] without a round trip.
    pub fn size(&self) -> Result<u64, IpcError> {
        Err(IpcError::Unimplemented("InFileStream::size"))
    }

    /// Move the stream position to `address`.
    pub fn seek(&mut self, address: u64) -> Result<(), IpcError> {
        let request = StreamRequest::seek(self.handle, address);
        // SAFETY: the seek payload carries no addresses
        unsafe {
            self.client
                .channel()
                .call(ServiceHost::Io, io::CMD_SEEK, &request)
        }?;
        Ok(())
    }

    /// Fill `dest` from the current position.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<(), IpcError> {
        let request = StreamRequest::read(self.handle, dest.as_mut_ptr(), dest.len() as u64);
        // SAFETY: `dest` is exclusively borrowed and writable for its full
        // length until the call returns
        unsafe {
            self.client
                .channel()
                .call(ServiceHost::Io, io::CMD_FILE_STREAM_ACTION, &request)
        }?;
        Ok(())
    }

    /// Seek to `address`, then fill `dest`.
    ///
    /// Two round trips, not atomic with respect to other users of the handle.
    pub fn read_at(&mut self, address: u64, dest: &mut [u8]) -> Result<(), IpcError> {
        self.seek(address)?;
        self.read(dest)
    }

    /// Close the stream and report whether the IO host accepted it.
    pub fn close(self) -> Result<(), IpcError> {
        let this = ManuallyDrop::new(self);
        close_handle(this.client, this.handle)
    }

    /// Give up ownership of the handle without closing it.
    pub fn into_raw_handle(self) -> u64 {
        let this = ManuallyDrop::new(self);
        this.handle
    }
}

impl<G: Gateway> Drop for InFileStream<'_, G> {
    fn drop(&mut self) {
        let _ = close_handle(self.client, self.handle);
    }
}

fn close_handle<G: Gateway>(client: IoClient<'_, G>, handle: u64) -> Result<(), IpcError> {
    let request = StreamRequest::close(handle);
    // SAFETY: the close payload carries no addresses
    unsafe {
        client
            .channel()
            .call(ServiceHost::Io, io::CMD_CLOSE_FILE_STREAM, &request)
    }?;
    Ok(())
}
