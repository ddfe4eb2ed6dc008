//! Graphics context: one host context handle plus the frame buffers it owns.
//!
//! Lifecycle:
//!
//! ```text
//!   new() ──► Active { handle, frame buffers }
//!                 │  create_frame_buffer / destroy_frame_buffer
//!                 ▼
//!   drop / destroy() ──► free every frame buffer ──► DestroyGraphicsContext(handle)
//! ```

use alloc::vec::Vec;
use core::mem::{self, ManuallyDrop};
use core::sync::atomic::{AtomicU64, Ordering};

use libos_process::{Gateway, IpcError, SvcGateway};

use crate::client::GraphicsClient;
use crate::frame_buffer::{FrameBuffer, FrameBufferId};

/// Source of owner tokens. Host handles may be reused after destroy, these
/// are not.
static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Owner of a Graphics host context and its frame buffers.
///
/// Move-only: a copy would destroy the host context twice.
///
/// ```compile_fail
/// use libos_graphics::GraphicsContext;
///
/// fn duplicate(context: &GraphicsContext<'static>) -> GraphicsContext<'static> {
///     context.clone()
/// }
/// ```
pub struct GraphicsContext<'c, G: Gateway = SvcGateway> {
    client: GraphicsClient<'c, G>,
    handle: u64,
    /// Process-local identity stamped into every `FrameBufferId`
    owner: u64,
    /// Owned buffers, scanned linearly; order is not significant
    frame_buffers: Vec<(u32, FrameBuffer)>,
    next_index: u32,
}

impl<'c, G: Gateway> GraphicsContext<'c, G> {
    /// Create a context on the Graphics host.
    pub fn new(client: GraphicsClient<'c, G>) -> Result<Self, IpcError> {
        let handle = client.create_graphics_context()?;
        Ok(Self {
            client,
            handle,
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            frame_buffers: Vec::new(),
            next_index: 0,
        })
    }

    /// The host handle of this context.
    pub fn handle(&self) -> u64 {
        self.handle
    }

    /// Allocate a frame buffer with `Length = width` and `Width = height`.
    ///
    /// The context keeps ownership; the returned id is only a reference.
    pub fn create_frame_buffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<FrameBufferId, IpcError> {
        let index = self.next_index;
        let next = index
            .checked_add(1)
            .ok_or(IpcError::InvalidArgument("frame buffer ids exhausted"))?;
        let frame = FrameBuffer::new(width, height)?;

        self.next_index = next;
        self.frame_buffers.push((index, frame));
        Ok(FrameBufferId {
            owner: self.owner,
            index,
        })
    }

    /// Whether `id` names a buffer this context still owns.
    pub fn owns(&self, id: FrameBufferId) -> bool {
        self.position(id).is_some()
    }

    /// Number of frame buffers currently owned.
    pub fn frame_buffer_count(&self) -> usize {
        self.frame_buffers.len()
    }

    pub fn frame_buffer(&self, id: FrameBufferId) -> Result<&FrameBuffer, IpcError> {
        let at = self.position(id).ok_or(IpcError::NotOwned)?;
        Ok(&self.frame_buffers[at].1)
    }

    pub fn frame_buffer_mut(&mut self, id: FrameBufferId) -> Result<&mut FrameBuffer, IpcError> {
        let at = self.position(id).ok_or(IpcError::NotOwned)?;
        Ok(&mut self.frame_buffers[at].1)
    }

    /// Free one frame buffer ahead of context teardown.
    pub fn destroy_frame_buffer(&mut self, id: FrameBufferId) -> Result<(), IpcError> {
        let at = self.position(id).ok_or(IpcError::NotOwned)?;
        self.frame_buffers.swap_remove(at);
        Ok(())
    }

    /// Present an owned frame buffer.
    ///
    /// Ownership is checked first: a foreign id yields [`IpcError::NotOwned`].
    /// Presentation itself is not supported yet, so an owned id yields
    /// [`IpcError::Unimplemented`]. Neither case issues a round trip; the raw
    /// [`GraphicsClient::render_frame_buffer`] command is the submission path.
    pub fn render_frame_buffer(&self, id: FrameBufferId) -> Result<(), IpcError> {
        if !self.owns(id) {
            return Err(IpcError::NotOwned);
        }
        Err(IpcError::Unimplemented("GraphicsContext::render_frame_buffer"))
    }

    /// Tear down explicitly and report whether the host accepted it.
    pub fn destroy(self) -> Result<(), IpcError> {
        let mut this = ManuallyDrop::new(self);
        let frame_buffers = mem::take(&mut this.frame_buffers);
        drop(frame_buffers);
        this.client.destroy_graphics_context(this.handle)
    }

    fn position(&self, id: FrameBufferId) -> Option<usize> {
        if id.owner != self.owner {
            return None;
        }
        self.frame_buffers
            .iter()
            .position(|(index, _)| *index == id.index)
    }
}

impl<G: Gateway> Drop for GraphicsContext<'_, G> {
    fn drop(&mut self) {
        // Buffers go first, the host context last
        self.frame_buffers.clear();
        let _ = self.client.destroy_graphics_context(self.handle);
    }
}
