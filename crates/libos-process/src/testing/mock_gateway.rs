//! In-memory service hosts for testing.
//!
//! `MockGateway` stands in for the kernel and both service hosts. It reads
//! the real wire payloads out of the caller's memory, serves them from
//! in-memory state, writes responses back into the command record and keeps
//! a journal of every round trip.

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::ffi::{c_char, CStr};
use core::{ptr, slice};

use libos_ipc::{
    graphics, io, IpcCommand, IpcResponse, LogArgs, RenderRequest, ServiceHost, StreamRequest,
    LOG_UNBOUNDED,
};
use serde::Serialize;

use crate::gateway::Gateway;

/// Payload of a round trip, as the mock host decoded it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Request {
    /// Null payload
    Empty,
    /// A value carried in the pointer slot
    Word(u64),
    /// Log text
    Log { text: String },
    /// Any stream sub-command
    Stream {
        mode: u32,
        name: Option<String>,
        handle: u64,
        destination: u64,
        size: u64,
    },
    /// Frame submission
    Render {
        handle: u64,
        length: u32,
        width: u32,
        pixel_bytes: usize,
    },
    /// Command the mock does not understand
    Unknown,
}

/// One journal entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundTrip {
    pub host: ServiceHost,
    pub command: u32,
    pub request: Request,
    /// Whether the response carried the success flag
    pub success: bool,
}

impl RoundTrip {
    /// Handle the request refers to, if any.
    pub fn handle(&self) -> Option<u64> {
        match self.request {
            Request::Word(handle) => Some(handle),
            Request::Stream { handle, .. } => Some(handle),
            Request::Render { handle, .. } => Some(handle),
            _ => None,
        }
    }
}

/// Simulated open stream
struct MockStream {
    path: String,
    position: u64,
}

type Observer = Box<dyn Fn(&RoundTrip)>;

/// Mock gateway for unit testing.
///
/// Provides simulated IO and Graphics hosts for testing client logic
/// without a kernel.
pub struct MockGateway {
    /// File contents by path
    files: RefCell<BTreeMap<String, Vec<u8>>>,
    /// Open streams by handle
    streams: RefCell<BTreeMap<u64, MockStream>>,
    /// Live graphics contexts
    contexts: RefCell<BTreeSet<u64>>,
    /// Next handle to hand out (shared by streams and contexts)
    next_handle: Cell<u64>,
    /// Captured Log output
    console: RefCell<String>,
    /// Every round trip so far
    journal: RefCell<Vec<RoundTrip>>,
    /// Command whose next round trip reports failure
    fail_next: Cell<Option<(ServiceHost, u32)>>,
    /// Called after each round trip is journaled
    observer: RefCell<Option<Observer>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create a mock with no files and no open resources.
    pub fn new() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            streams: RefCell::new(BTreeMap::new()),
            contexts: RefCell::new(BTreeSet::new()),
            next_handle: Cell::new(1),
            console: RefCell::new(String::new()),
            journal: RefCell::new(Vec::new()),
            fail_next: Cell::new(None),
            observer: RefCell::new(None),
        }
    }

    /// Make `path` openable with `content`.
    pub fn add_file(&self, path: &str, content: &[u8]) {
        self.files
            .borrow_mut()
            .insert(String::from(path), content.to_vec());
    }

    /// Make the next `command` on `host` report failure without side effects.
    pub fn fail_next(&self, host: ServiceHost, command: u32) {
        self.fail_next.set(Some((host, command)));
    }

    /// Run `observer` after every round trip.
    pub fn set_observer(&self, observer: impl Fn(&RoundTrip) + 'static) {
        *self.observer.borrow_mut() = Some(Box::new(observer));
    }

    /// Copy of the journal.
    pub fn journal(&self) -> Vec<RoundTrip> {
        self.journal.borrow().clone()
    }

    /// Journal entries for one host/command pair.
    pub fn round_trips_for(&self, host: ServiceHost, command: u32) -> Vec<RoundTrip> {
        self.journal
            .borrow()
            .iter()
            .filter(|trip| trip.host == host && trip.command == command)
            .cloned()
            .collect()
    }

    /// Number of round trips so far.
    pub fn round_trips(&self) -> usize {
        self.journal.borrow().len()
    }

    /// Forget recorded round trips.
    pub fn clear_journal(&self) {
        self.journal.borrow_mut().clear();
    }

    /// Everything logged so far.
    pub fn console(&self) -> String {
        self.console.borrow().clone()
    }

    /// Whether a stream handle is still open.
    pub fn is_stream_open(&self, handle: u64) -> bool {
        self.streams.borrow().contains_key(&handle)
    }

    /// Current position of an open stream.
    pub fn stream_position(&self, handle: u64) -> Option<u64> {
        self.streams.borrow().get(&handle).map(|s| s.position)
    }

    /// Number of open streams.
    pub fn open_streams(&self) -> usize {
        self.streams.borrow().len()
    }

    /// Whether a graphics context handle is still live.
    pub fn is_context_live(&self, handle: u64) -> bool {
        self.contexts.borrow().contains(&handle)
    }

    /// Number of live graphics contexts.
    pub fn live_contexts(&self) -> usize {
        self.contexts.borrow().len()
    }

    fn allocate_handle(&self) -> u64 {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        handle
    }

    fn take_injected_failure(&self, host: ServiceHost, command: u32) -> bool {
        if self.fail_next.get() == Some((host, command)) {
            self.fail_next.set(None);
            true
        } else {
            false
        }
    }

    /// Decode the payload of `record` from caller memory.
    ///
    /// # Safety
    ///
    /// The payload must match what `record.command` expects on `record.host`.
    unsafe fn capture(&self, record: &IpcCommand) -> Request {
        let arguments = record.arguments;
        match (record.host, record.command) {
            (ServiceHost::Io, io::CMD_LOG) => {
                // SAFETY: Log payload is a `LogArgs` per the caller contract
                let args = unsafe { &*(arguments as *const LogArgs) };
                let bytes = if args.size == LOG_UNBOUNDED {
                    // SAFETY: unbounded logs carry NUL-terminated text
                    unsafe { CStr::from_ptr(args.addr as *const c_char) }.to_bytes()
                } else {
                    // SAFETY: `size` bytes at `addr` are readable
                    unsafe { slice::from_raw_parts(args.addr, args.size as usize) }
                };
                Request::Log {
                    text: String::from_utf8_lossy(bytes).into_owned(),
                }
            }
            (ServiceHost::Io, io::CMD_GET_LOCATION) if arguments.is_null() => Request::Empty,
            (ServiceHost::Io, io::CMD_OPEN_FILE_STREAM..=io::CMD_GET_LOCATION) => {
                // SAFETY: stream commands carry a `StreamRequest`
                let request = unsafe { &*(arguments as *const StreamRequest) };
                let name = if request.name.is_null() {
                    None
                } else {
                    // SAFETY: a non-null name is NUL-terminated
                    let name = unsafe { CStr::from_ptr(request.name as *const c_char) };
                    Some(String::from_utf8_lossy(name.to_bytes()).into_owned())
                };
                Request::Stream {
                    mode: request.mode.bits(),
                    name,
                    handle: request.handle,
                    destination: request.destination,
                    size: request.size,
                }
            }
            (ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT) => Request::Empty,
            (ServiceHost::Graphics, graphics::CMD_DESTROY_GRAPHICS_CONTEXT) => {
                Request::Word(arguments as usize as u64)
            }
            (ServiceHost::Graphics, graphics::CMD_RENDER_FRAME_BUFFER) => {
                // SAFETY: render carries a `RenderRequest` pointing at a
                // live descriptor
                let request = unsafe { &*(arguments as *const RenderRequest) };
                let frame = unsafe { &*request.buffer };
                let pixels = frame.length as usize * frame.width as usize;
                Request::Render {
                    handle: request.handle,
                    length: frame.length,
                    width: frame.width,
                    pixel_bytes: pixels * core::mem::size_of::<libos_ipc::Color>(),
                }
            }
            _ => Request::Unknown,
        }
    }

    /// Serve a decoded request, performing any writes into caller memory.
    fn serve(&self, host: ServiceHost, command: u32, request: &Request) -> IpcResponse {
        match (host, command, request) {
            (ServiceHost::Io, io::CMD_LOG, Request::Log { text }) => {
                self.console.borrow_mut().push_str(text);
                IpcResponse::with_word0(text.len() as u64)
            }
            (
                ServiceHost::Io,
                io::CMD_OPEN_FILE_STREAM,
                Request::Stream {
                    name: Some(name), ..
                },
            ) => {
                if !self.files.borrow().contains_key(name) {
                    return IpcResponse::EMPTY;
                }
                let handle = self.allocate_handle();
                self.streams.borrow_mut().insert(
                    handle,
                    MockStream {
                        path: name.clone(),
                        position: 0,
                    },
                );
                IpcResponse::with_word0(handle)
            }
            (ServiceHost::Io, io::CMD_CLOSE_FILE_STREAM, Request::Stream { handle, .. }) => {
                match self.streams.borrow_mut().remove(handle) {
                    Some(_) => IpcResponse::with_word0(0),
                    None => IpcResponse::EMPTY,
                }
            }
            (ServiceHost::Io, io::CMD_SEEK, Request::Stream { handle, destination, .. }) => {
                match self.streams.borrow_mut().get_mut(handle) {
                    Some(stream) => {
                        stream.position = *destination;
                        IpcResponse::with_word0(*destination)
                    }
                    None => IpcResponse::EMPTY,
                }
            }
            (
                ServiceHost::Io,
                io::CMD_FILE_STREAM_ACTION,
                Request::Stream {
                    handle,
                    destination,
                    size,
                    ..
                },
            ) => self.serve_read(*handle, *destination, *size),
            (ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT, Request::Empty) => {
                let handle = self.allocate_handle();
                self.contexts.borrow_mut().insert(handle);
                IpcResponse::with_word0(handle)
            }
            (
                ServiceHost::Graphics,
                graphics::CMD_DESTROY_GRAPHICS_CONTEXT,
                Request::Word(handle),
            ) => {
                if self.contexts.borrow_mut().remove(handle) {
                    IpcResponse::with_word0(0)
                } else {
                    IpcResponse::EMPTY
                }
            }
            (
                ServiceHost::Graphics,
                graphics::CMD_RENDER_FRAME_BUFFER,
                Request::Render { handle, .. },
            ) => {
                if self.contexts.borrow().contains(handle) {
                    IpcResponse::with_word0(0)
                } else {
                    IpcResponse::EMPTY
                }
            }
            // GetLocation and unknown commands are not served
            _ => IpcResponse::EMPTY,
        }
    }

    /// Copy `size` bytes from the stream position into `destination`.
    /// Bytes past the end of the file read as zero.
    fn serve_read(&self, handle: u64, destination: u64, size: u64) -> IpcResponse {
        let mut streams = self.streams.borrow_mut();
        let Some(stream) = streams.get_mut(&handle) else {
            return IpcResponse::EMPTY;
        };
        let files = self.files.borrow();
        let Some(content) = files.get(&stream.path) else {
            return IpcResponse::EMPTY;
        };

        if size == 0 {
            return IpcResponse::with_word0(0);
        }

        let start = (stream.position as usize).min(content.len());
        let end = (start + size as usize).min(content.len());
        let available = &content[start..end];
        let dest = destination as usize as *mut u8;
        // SAFETY: the read contract makes `size` bytes at `destination`
        // writable for the round trip
        unsafe {
            ptr::copy_nonoverlapping(available.as_ptr(), dest, available.len());
            ptr::write_bytes(dest.add(available.len()), 0, size as usize - available.len());
        }
        stream.position += size;
        IpcResponse::with_word0(available.len() as u64)
    }
}

impl Gateway for MockGateway {
    unsafe fn request_ipc(&self, command: &mut IpcCommand) {
        let host = command.host;
        let code = command.command;

        // SAFETY: forwarded caller contract
        let request = unsafe { self.capture(command) };
        let response = if self.take_injected_failure(host, code) {
            IpcResponse::EMPTY
        } else {
            self.serve(host, code, &request)
        };
        command.response = response;

        let trip = RoundTrip {
            host,
            command: code,
            request,
            success: response.is_successful(),
        };
        self.journal.borrow_mut().push(trip.clone());
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer(&trip);
        }
    }

    fn abort(&self) -> ! {
        panic!("abort trap: process terminated")
    }
}
