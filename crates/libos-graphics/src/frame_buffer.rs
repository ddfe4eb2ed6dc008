//! Pixel storage owned by a graphics context.

use alloc::vec;
use alloc::vec::Vec;
use core::mem::size_of;

use libos_ipc::{Color, FrameDescriptor};
use libos_process::IpcError;

/// Non-owning reference to a frame buffer inside a [`GraphicsContext`].
///
/// Owner tokens are unique per process and indices are never reused within
/// a context, so a stale id stays invalid after its buffer or its context is
/// destroyed, even if the host hands the context handle out again.
///
/// [`GraphicsContext`]: crate::GraphicsContext
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameBufferId {
    /// Token of the owning context (not the host handle)
    pub owner: u64,
    /// Slot within that context
    pub index: u32,
}

/// A `length x width` grid of [`Color`] pixels.
///
/// Heap allocated once at creation; the Graphics host reads it in place.
/// Not clonable, a context hands out ids rather than buffers.
///
/// ```compile_fail
/// use libos_graphics::FrameBuffer;
///
/// let frame = FrameBuffer::new(2, 2).unwrap();
/// let copy = frame.clone();
/// ```
#[derive(Debug)]
pub struct FrameBuffer {
    pixels: Vec<Color>,
    length: u32,
    width: u32,
}

impl FrameBuffer {
    /// Allocate a transparent buffer of `length * width` pixels.
    pub fn new(length: u32, width: u32) -> Result<Self, IpcError> {
        let count = (length as usize)
            .checked_mul(width as usize)
            .filter(|count| count.checked_mul(size_of::<Color>()).is_some())
            .ok_or(IpcError::InvalidArgument("frame buffer dimensions overflow"))?;

        #[cfg(test)]
        live::inc();

        Ok(Self {
            pixels: vec![Color::TRANSPARENT; count],
            length,
            width,
        })
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Size of the pixel storage in bytes.
    pub fn byte_len(&self) -> usize {
        self.pixels.len() * size_of::<Color>()
    }

    /// Set every pixel to `color`.
    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Wire view of this buffer. Valid while `self` is borrowed.
    pub fn descriptor(&self) -> FrameDescriptor {
        FrameDescriptor {
            pixels: self.pixels.as_ptr(),
            length: self.length,
            width: self.width,
        }
    }
}

#[cfg(test)]
impl Drop for FrameBuffer {
    fn drop(&mut self) {
        live::dec();
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_is_length_times_width_pixels() {
        let frame = FrameBuffer::new(4, 4).unwrap();
        assert_eq!(frame.pixels().len(), 16);
        assert_eq!(frame.byte_len(), 64);

        let wide = FrameBuffer::new(8, 3).unwrap();
        assert_eq!((wide.length(), wide.width()), (8, 3));
        assert_eq!(wide.byte_len(), 8 * 3 * 4);
    }

    #[test]
    fn test_new_buffer_is_transparent() {
        let frame = FrameBuffer::new(2, 2).unwrap();
        assert!(frame.pixels().iter().all(|p| *p == Color::TRANSPARENT));
    }

    #[test]
    fn test_fill_and_write() {
        let mut frame = FrameBuffer::new(2, 1).unwrap();
        frame.fill(Color::WHITE);
        frame.pixels_mut()[1] = Color::rgba(1, 2, 3, 4);
        assert_eq!(frame.pixels(), &[Color::WHITE, Color::rgba(1, 2, 3, 4)]);
    }

    #[test]
    fn test_descriptor_points_at_pixels() {
        let frame = FrameBuffer::new(5, 7).unwrap();
        let descriptor = frame.descriptor();
        assert_eq!(descriptor.pixels, frame.pixels().as_ptr());
        assert_eq!((descriptor.length, descriptor.width), (5, 7));
    }

    #[test]
    fn test_empty_dimensions_allocate_nothing() {
        let frame = FrameBuffer::new(0, 100).unwrap();
        assert_eq!(frame.byte_len(), 0);
    }

    #[test]
    fn test_overflowing_dimensions_are_rejected() {
        assert!(matches!(
            FrameBuffer::new(u32::MAX, u32::MAX),
            Err(IpcError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_live_count_tracks_drop() {
        let before = live::count();
        let frame = FrameBuffer::new(1, 1).unwrap();
        assert_eq!(live::count(), before + 1);
        drop(frame);
        assert_eq!(live::count(), before);
    }
}
