//! Graphics Service Host Client for LibOS
//!
//! Two layers over the Graphics host's command set:
//!
//! - **Raw commands** ([`GraphicsClient`]): create/destroy a context handle
//!   and submit a frame, one round trip each
//! - **Resources** ([`GraphicsContext`], [`FrameBuffer`]): a context that owns
//!   its handle and every frame buffer it allocated
//!
//! Frame buffers live in the context's arena and are addressed by
//! [`FrameBufferId`]. Callers never hold an owning reference, so a buffer can
//! only be freed through the context that created it.
//!
//! # Example
//!
//! ```ignore
//! use libos_graphics::{GraphicsClient, GraphicsContext};
//! use libos_ipc::Color;
//!
//! let mut context = GraphicsContext::new(GraphicsClient::kernel())?;
//! let frame = context.create_frame_buffer(640, 480)?;
//! context.frame_buffer_mut(frame)?.fill(Color::BLACK);
//! // Buffers freed, then the context handle destroyed, on drop
//! ```

#![no_std]
extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod client;
pub mod context;
pub mod frame_buffer;

pub use client::GraphicsClient;
pub use context::GraphicsContext;
pub use frame_buffer::{FrameBuffer, FrameBufferId};
pub use libos_ipc::Color;
