//! Single frame buffer written by the capture DMA and read by the host transfer.

/// Pixel layout of one captured frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FrameFormat {
    /// Number of horizontal pixels.
    pub width: u16,
    /// Number of vertical pixels.
    pub height: u16,
    /// Bytes emitted by the sampler for every pixel.
    pub bytes_per_pixel: u8,
}

impl FrameFormat {
    /// QVGA (320x240) with RGB565.
    pub const QVGA_RGB565: FrameFormat = FrameFormat::new(320, 240, 2);

    /// QQVGA (160x120) with RGB565.
    pub const QQVGA_RGB565: FrameFormat = FrameFormat::new(160, 120, 2);

    /// Creates a new FrameFormat of `width` by `height` pixels.
    pub const fn new(width: u16, height: u16, bytes_per_pixel: u8) -> Self {
        FrameFormat {
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Number of total bytes in one frame.
    pub const fn size(&self) -> usize {
        (self.width as usize) * (self.height as usize) * (self.bytes_per_pixel as usize)
    }
}

/// Frame format selected at build time.
#[cfg(feature = "qvga")]
pub const FRAME_FORMAT: FrameFormat = FrameFormat::QVGA_RGB565;

/// Frame format selected at build time.
#[cfg(not(feature = "qvga"))]
pub const FRAME_FORMAT: FrameFormat = FrameFormat::QQVGA_RGB565;

/// Number of total bytes in one frame of `FRAME_FORMAT`.
pub const FRAME_SIZE: usize = FRAME_FORMAT.size();

/// Frame buffer errors.
#[derive(Debug, Eq, PartialEq)]
pub enum FrameBufferError {
    /// Backing storage length does not match the frame format.
    SizeMismatch { expected: usize, actual: usize },
}

/// `FrameBuffer` wraps storage sized exactly for one frame of its `FrameFormat`. The contents
/// are only readable after a capture has completed, and starting a new capture invalidates the
/// previous frame since it is overwritten in place.
#[derive(Debug)]
pub struct FrameBuffer<'a> {
    /// Backing storage. Its length never changes after calling `new`.
    data: &'a mut [u8],

    /// Set once a capture completes, cleared when the next one is armed.
    valid: bool,
}

impl<'a> FrameBuffer<'a> {
    /// Creates a new FrameBuffer over `data`, which must be exactly `format.size()` bytes.
    pub fn new(data: &'a mut [u8], format: FrameFormat) -> Result<Self, FrameBufferError> {
        if data.len() != format.size() {
            return Err(FrameBufferError::SizeMismatch {
                expected: format.size(),
                actual: data.len(),
            });
        }

        Ok(FrameBuffer { data, valid: false })
    }

    /// The last completed frame, `None` if no capture has completed since the last one was armed.
    pub fn frame(&self) -> Option<&[u8]> {
        if self.valid {
            Some(&self.data[..])
        } else {
            None
        }
    }

    /// Hand the storage to a writer that is about to fill it. Invalidates the current frame and
    /// returns the destination address and length.
    pub(crate) fn begin_write(&mut self) -> (*mut u8, usize) {
        self.valid = false;
        (self.data.as_mut_ptr(), self.data.len())
    }

    /// Mark the storage as holding one complete frame.
    pub(crate) fn commit(&mut self) {
        self.valid = true;
    }
}
