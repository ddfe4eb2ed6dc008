//! Wire records exchanged across the IPC trap.
//!
//! Every record is `#[repr(C)]`: the service hosts read and write these
//! layouts directly from the calling process's memory.
//!
//! # IpcCommand layout (64-bit)
//!
//! ```text
//! offset  size  field
//! 0       4     host        (ServiceHost)
//! 4       4     command     (u32, host-relative)
//! 8       8     arguments   (payload address)
//! 16      168   response    (IpcResponse, written by the trap handler)
//! ```

use core::ffi::c_void;
use core::ptr;

use serde::{Deserialize, Serialize};

use crate::{ServiceHost, RESPONSE_WORDS};

// =============================================================================
// Response
// =============================================================================

/// Fixed-shape response written back by the trap handler.
///
/// Every command on every host produces exactly this shape. Callers index
/// into `words` positionally (word 0 is the created handle for open/create).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct IpcResponse {
    /// Non-zero when the service host handled the command
    pub success: u8,
    /// Response words, unused entries are zero
    pub words: [u64; RESPONSE_WORDS],
}

impl IpcResponse {
    /// An unsuccessful, all-zero response. This is what the record holds
    /// before the trap handler writes to it.
    pub const EMPTY: Self = Self {
        success: 0,
        words: [0; RESPONSE_WORDS],
    };

    /// Successful response carrying `words`.
    pub const fn ok(words: [u64; RESPONSE_WORDS]) -> Self {
        Self { success: 1, words }
    }

    /// Successful response whose first word is `value`, rest zero.
    pub const fn with_word0(value: u64) -> Self {
        let mut words = [0; RESPONSE_WORDS];
        words[0] = value;
        Self::ok(words)
    }

    /// Whether the host reported success.
    pub fn is_successful(&self) -> bool {
        self.success != 0
    }

    /// Response word `index`, `None` past the fixed word count.
    pub fn word(&self, index: usize) -> Option<u64> {
        self.words.get(index).copied()
    }
}

impl Default for IpcResponse {
    fn default() -> Self {
        Self::EMPTY
    }
}

// =============================================================================
// Command
// =============================================================================

/// The record whose address is handed to the IPC trap.
///
/// Lives on the caller's stack for exactly one round trip. The payload
/// behind `arguments` must stay valid and unmoved until the trap returns.
#[derive(Debug)]
#[repr(C)]
pub struct IpcCommand {
    /// Receiving service host
    pub host: ServiceHost,
    /// Host-relative command code
    pub command: u32,
    /// Address of the argument payload (may be null, or carry a raw value)
    pub arguments: *const c_void,
    /// Response slot, overwritten by the trap handler
    pub response: IpcResponse,
}

impl IpcCommand {
    /// Build a command with an empty response slot.
    pub fn new(host: ServiceHost, command: u32, arguments: *const c_void) -> Self {
        Self {
            host,
            command,
            arguments,
            response: IpcResponse::EMPTY,
        }
    }
}

// =============================================================================
// IO Payloads
// =============================================================================

bitflags::bitflags! {
    /// Access mode of a stream request.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct StreamMode: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

/// Payload of the Log command.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct LogArgs {
    /// Text address
    pub addr: *const u8,
    /// Byte count, or `LOG_UNBOUNDED` for NUL-terminated text
    pub size: u32,
}

/// Payload shared by every stream sub-command.
///
/// Fields a sub-command does not use stay at their default (null / zero).
/// `destination` is the buffer address for reads and the target position
/// for seeks.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct StreamRequest {
    pub mode: StreamMode,
    /// NUL-terminated path, open only
    pub name: *const u8,
    pub handle: u64,
    pub destination: u64,
    pub size: u64,
}

impl Default for StreamRequest {
    fn default() -> Self {
        Self {
            mode: StreamMode::empty(),
            name: ptr::null(),
            handle: 0,
            destination: 0,
            size: 0,
        }
    }
}

impl StreamRequest {
    /// OpenFileStream payload for a read stream.
    pub fn open(name: *const u8) -> Self {
        Self {
            mode: StreamMode::READ,
            name,
            ..Self::default()
        }
    }

    /// CloseFileStream payload.
    pub fn close(handle: u64) -> Self {
        Self {
            mode: StreamMode::READ,
            handle,
            ..Self::default()
        }
    }

    /// Seek payload.
    pub fn seek(handle: u64, address: u64) -> Self {
        Self {
            mode: StreamMode::READ,
            handle,
            destination: address,
            ..Self::default()
        }
    }

    /// FileStreamAction payload reading `size` bytes into `dest`.
    pub fn read(handle: u64, dest: *mut u8, size: u64) -> Self {
        Self {
            mode: StreamMode::READ,
            handle,
            destination: dest as u64,
            size,
            ..Self::default()
        }
    }
}

// =============================================================================
// Graphics Payloads
// =============================================================================

/// One pixel: 8 bits per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 0xFF);
    pub const WHITE: Self = Self::rgba(0xFF, 0xFF, 0xFF, 0xFF);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Pixel storage as the Graphics host reads it.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct FrameDescriptor {
    /// First pixel, `length * width` pixels follow
    pub pixels: *const Color,
    pub length: u32,
    pub width: u32,
}

/// Payload of RenderFrameBuffer: the context and the frame to present.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct RenderRequest {
    pub handle: u64,
    pub buffer: *const FrameDescriptor,
}
