//! Process-side IPC library for LibOS
//!
//! This crate is the bottom of the client stack. It provides:
//!
//! - **Gateway**: the trap entry points (`svc 0x00` submit, `svc 0x01` abort)
//! - **Channel**: builds the command record, traps, and decodes the response
//! - **Error**: the error kinds every client operation reports
//! - **Testing**: an in-memory gateway that plays both service hosts
//!
//! Data flows strictly downward: clients build payloads, the channel traps,
//! and responses come back unchanged except for field extraction.
//!
//! ```text
//!  libos-io / libos-graphics
//!            │  payload (&StreamRequest, &LogArgs, ...)
//!            ▼
//!      IpcChannel::call ──► IpcCommand { host, command, &payload, response }
//!            │
//!            ▼
//!      Gateway::request_ipc  (svc 0x00)
//! ```

#![no_std]
extern crate alloc;

pub mod channel;
pub mod error;
pub mod gateway;
pub mod testing;

// Convenient re-exports at crate root
pub use channel::{IpcChannel, Response};
pub use error::IpcError;
pub use gateway::{Gateway, SvcGateway};
pub use libos_ipc::{IpcCommand, IpcResponse, ServiceHost, RESPONSE_WORDS};
