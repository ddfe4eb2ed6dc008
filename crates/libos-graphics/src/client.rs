//! Raw Graphics host commands.

use libos_ipc::{graphics, RenderRequest, ServiceHost};
use libos_process::{Gateway, IpcChannel, IpcError, SvcGateway};

use crate::frame_buffer::FrameBuffer;

/// Client for the Graphics service host.
///
/// Stateless and copyable; resource ownership is [`GraphicsContext`]'s job.
///
/// [`GraphicsContext`]: crate::GraphicsContext
pub struct GraphicsClient<'c, G: Gateway = SvcGateway> {
    channel: &'c IpcChannel<G>,
}

impl<G: Gateway> Clone for GraphicsClient<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: Gateway> Copy for GraphicsClient<'_, G> {}

impl GraphicsClient<'static, SvcGateway> {
    /// Graphics client on the kernel channel.
    pub fn kernel() -> Self {
        Self::new(IpcChannel::kernel())
    }
}

impl<'c, G: Gateway> GraphicsClient<'c, G> {
    pub fn new(channel: &'c IpcChannel<G>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &'c IpcChannel<G> {
        self.channel
    }

    /// Ask the host for a new context handle.
    pub fn create_graphics_context(&self) -> Result<u64, IpcError> {
        let response = self
            .channel
            .call_empty(ServiceHost::Graphics, graphics::CMD_CREATE_GRAPHICS_CONTEXT)?;
        Ok(response.handle())
    }

    /// Release a context handle. The handle travels in the argument slot.
    pub fn destroy_graphics_context(&self, handle: u64) -> Result<(), IpcError> {
        self.channel.call_with_word(
            ServiceHost::Graphics,
            graphics::CMD_DESTROY_GRAPHICS_CONTEXT,
            handle,
        )?;
        Ok(())
    }

    /// Submit `frame` for presentation on context `handle`.
    ///
    /// The host reads pixels straight out of `frame`, which stays borrowed
    /// until the round trip completes.
    pub fn render_frame_buffer(&self, handle: u64, frame: &FrameBuffer) -> Result<(), IpcError> {
        let descriptor = frame.descriptor();
        let request = RenderRequest {
            handle,
            buffer: &descriptor,
        };
        // SAFETY: `descriptor` and the pixels it points at are borrowed for
        // the whole call
        unsafe {
            self.channel
                .call(ServiceHost::Graphics, graphics::CMD_RENDER_FRAME_BUFFER, &request)
        }?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libos_process::testing::{MockGateway, Request};

    #[test]
    fn test_create_and_destroy_context() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = GraphicsClient::new(&channel);

        let handle = client.create_graphics_context().unwrap();
        assert!(mock.is_context_live(handle));

        client.destroy_graphics_context(handle).unwrap();
        assert!(!mock.is_context_live(handle));
        assert_eq!(mock.journal()[1].request, Request::Word(handle));
    }

    #[test]
    fn test_destroy_unknown_context_fails() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = GraphicsClient::new(&channel);

        let err = client.destroy_graphics_context(41).unwrap_err();
        assert_eq!(
            err,
            IpcError::TrapFailed {
                host: ServiceHost::Graphics,
                command: graphics::CMD_DESTROY_GRAPHICS_CONTEXT
            }
        );
    }

    #[test]
    fn test_render_passes_caller_pixels() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = GraphicsClient::new(&channel);
        let handle = client.create_graphics_context().unwrap();

        let frame = FrameBuffer::new(3, 2).unwrap();
        client.render_frame_buffer(handle, &frame).unwrap();

        let trip = mock.journal().pop().unwrap();
        assert!(trip.success);
        assert_eq!(
            trip.request,
            Request::Render {
                handle,
                length: 3,
                width: 2,
                pixel_bytes: 24,
            }
        );
    }

    #[test]
    fn test_render_on_dead_context_fails() {
        let mock = MockGateway::new();
        let channel = IpcChannel::new(&mock);
        let client = GraphicsClient::new(&channel);

        let frame = FrameBuffer::new(1, 1).unwrap();
        assert!(client
            .render_frame_buffer(7, &frame)
            .unwrap_err()
            .is_trap_failure());
    }
}
