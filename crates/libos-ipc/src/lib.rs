//! IPC Protocol & Command Constants for LibOS
//!
//! This crate defines:
//! - **Trap numbers** (Process → Kernel entry points)
//! - **Service hosts** (the processes that receive IPC commands)
//! - **Command codes** per service host
//! - **Wire records** exchanged across the trap (see [`wire`])
//!
//! It is the **single source of truth** for the protocol. Every other crate
//! builds its requests from the records defined here.
//!
//! # Trap Numbers
//!
//! | Trap | Meaning                                   |
//! |------|-------------------------------------------|
//! | 0x00 | Submit an [`IpcCommand`] to a service host |
//! | 0x01 | Terminate the calling process             |
//!
//! # Command Namespaces
//!
//! Command codes are only meaningful relative to their [`ServiceHost`]. The
//! IO and Graphics namespaces overlap numerically on purpose.
//!
//! | Host     | Code | Command                 | Payload                  |
//! |----------|------|-------------------------|--------------------------|
//! | IO       | 0    | Log                     | [`LogArgs`]              |
//! | IO       | 1    | OpenFileStream          | [`StreamRequest`]        |
//! | IO       | 2    | CloseFileStream         | [`StreamRequest`]        |
//! | IO       | 3    | Seek                    | [`StreamRequest`]        |
//! | IO       | 4    | FileStreamAction (read) | [`StreamRequest`]        |
//! | IO       | 5    | GetLocation             | (not implemented)        |
//! | Graphics | 0    | CreateGraphicsContext   | none                     |
//! | Graphics | 1    | DestroyGraphicsContext  | handle in pointer slot   |
//! | Graphics | 2    | RenderFrameBuffer       | [`RenderRequest`]        |
//!
//! # Usage
//!
//! ```rust
//! use libos_ipc::{io, ServiceHost, RESPONSE_WORDS};
//!
//! let host = ServiceHost::Io;
//! let cmd = io::CMD_OPEN_FILE_STREAM;
//! assert_eq!(io::name(cmd), "OpenFileStream");
//! assert_eq!(RESPONSE_WORDS, 20);
//! # let _ = host;
//! ```

#![no_std]

use serde::{Deserialize, Serialize};

pub mod wire;

pub use wire::{
    Color, FrameDescriptor, IpcCommand, IpcResponse, LogArgs, RenderRequest, StreamMode,
    StreamRequest,
};

// =============================================================================
// Protocol Constants
// =============================================================================

/// Number of 64-bit words in every [`IpcResponse`], regardless of command.
pub const RESPONSE_WORDS: usize = 20;

/// Log size meaning "the text is NUL-terminated, find the end yourself".
pub const LOG_UNBOUNDED: u32 = u32::MAX;

/// Revision of the wire layout decoded by this crate.
///
/// The layout is closed; the number exists so decoders can state which
/// revision they validate against.
pub const WIRE_VERSION: u32 = 1;

// =============================================================================
// Trap Numbers (Process → Kernel)
// =============================================================================

/// Trap numbers passed to the `svc` instruction.
pub mod svc {
    /// Submit an IPC command. Input: address of an `IpcCommand`.
    pub const REQUEST_IPC: u16 = 0x00;
    /// Terminate the calling process. Never returns.
    pub const ABORT: u16 = 0x01;
}

// =============================================================================
// Service Hosts
// =============================================================================

/// Identifier of the service process receiving a command.
///
/// Fixed at compile time; the kernel dispatches on this value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ServiceHost {
    /// File and console IO
    Io = 0,
    /// Graphics contexts and frame submission
    Graphics = 1,
}

impl ServiceHost {
    /// Convert from the raw wire value.
    ///
    /// Returns `None` for unknown hosts.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ServiceHost::Io),
            1 => Some(ServiceHost::Graphics),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceHost::Io => "IO",
            ServiceHost::Graphics => "Graphics",
        }
    }

    /// Name of `command` within this host's namespace.
    pub fn command_name(&self, command: u32) -> &'static str {
        match self {
            ServiceHost::Io => io::name(command),
            ServiceHost::Graphics => graphics::name(command),
        }
    }
}

// =============================================================================
// IO Service Host Commands
// =============================================================================

/// Commands understood by the IO service host.
pub mod io {
    /// Print text to the console. Payload: `LogArgs`
    pub const CMD_LOG: u32 = 0;
    /// Open a file stream. Payload: `StreamRequest` with mode and name.
    /// Response word 0: stream handle
    pub const CMD_OPEN_FILE_STREAM: u32 = 1;
    /// Close a file stream. Payload: `StreamRequest` with handle
    pub const CMD_CLOSE_FILE_STREAM: u32 = 2;
    /// Move the stream position. Payload: `StreamRequest` with handle and
    /// target address in `destination`
    pub const CMD_SEEK: u32 = 3;
    /// Read from the stream position. Payload: `StreamRequest` with handle,
    /// destination buffer address and size
    pub const CMD_FILE_STREAM_ACTION: u32 = 4;
    /// Query stream location/size. Reserved, the host does not serve it yet
    pub const CMD_GET_LOCATION: u32 = 5;

    /// Name of an IO command, `"Unknown"` for codes outside the set.
    pub fn name(command: u32) -> &'static str {
        match command {
            CMD_LOG => "Log",
            CMD_OPEN_FILE_STREAM => "OpenFileStream",
            CMD_CLOSE_FILE_STREAM => "CloseFileStream",
            CMD_SEEK => "Seek",
            CMD_FILE_STREAM_ACTION => "FileStreamAction",
            CMD_GET_LOCATION => "GetLocation",
            _ => "Unknown",
        }
    }
}

// =============================================================================
// Graphics Service Host Commands
// =============================================================================

/// Commands understood by the Graphics service host.
pub mod graphics {
    /// Create a graphics context. No payload. Response word 0: context handle
    pub const CMD_CREATE_GRAPHICS_CONTEXT: u32 = 0;
    /// Destroy a graphics context. The handle travels in the pointer slot
    pub const CMD_DESTROY_GRAPHICS_CONTEXT: u32 = 1;
    /// Submit a frame. Payload: `RenderRequest`
    pub const CMD_RENDER_FRAME_BUFFER: u32 = 2;

    /// Name of a Graphics command, `"Unknown"` for codes outside the set.
    pub fn name(command: u32) -> &'static str {
        match command {
            CMD_CREATE_GRAPHICS_CONTEXT => "CreateGraphicsContext",
            CMD_DESTROY_GRAPHICS_CONTEXT => "DestroyGraphicsContext",
            CMD_RENDER_FRAME_BUFFER => "RenderFrameBuffer",
            _ => "Unknown",
        }
    }
}
