//! Frame capture over the parallel data bus of the OV7670. A bit-sampling unit (the STM32F7 DCMI
//! on the Nucleo board) assembles bytes from the data lines on each pixel clock while HREF is
//! high, and a DMA channel drains its output queue into the frame buffer. The DMA is started on
//! a VSYNC rising edge, so the buffer always holds a frame from its first line.

use crate::frame_buf::FrameBuffer;
use embedded_hal::digital::v2::InputPin;

/// DMA transfer descriptor from the sampler queue into the frame buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transfer {
    /// Sampler output queue register.
    pub read_addr: usize,
    pub read_increment: bool,
    /// First byte of the frame buffer.
    pub write_addr: *mut u8,
    pub write_increment: bool,
    /// Data request line pacing the transfer.
    pub dreq: u8,
    /// Number of bytes to move.
    pub count: usize,
}

/// The bit-sampling unit. Once started it pushes one byte per sampled pixel group into its output
/// queue, clocked by PCLK and gated by HREF.
pub trait PixelSampler {
    /// Load and start the sampling program.
    fn start(&mut self);

    /// Address of the output queue register.
    fn rx_address(&self) -> usize;

    /// Data request line asserted while the output queue holds data.
    fn rx_dreq(&self) -> u8;
}

/// A DMA channel able to run one peripheral-to-memory transfer at a time.
pub trait DmaChannel {
    /// Program the channel without starting it.
    ///
    /// # Safety
    ///
    /// `transfer.write_addr` must stay valid for `transfer.count` bytes until the transfer
    /// completes or `abort` is called.
    unsafe fn configure(&mut self, transfer: &Transfer);

    /// Start the programmed transfer.
    fn start(&mut self);

    /// `true` while the transfer has not completed.
    fn is_busy(&mut self) -> bool;

    /// Stop the channel, discarding any remaining bytes.
    fn abort(&mut self);
}

/// Capture errors.
#[derive(Debug, Eq, PartialEq)]
pub enum CaptureError<E> {
    /// VSYNC pin read error.
    Vsync(E),
    /// VSYNC did not toggle within the spin budget.
    SyncTimeout,
    /// DMA did not complete within the spin budget.
    TransferTimeout,
}

/// VSYNC-synchronized DMA capture engine.
pub struct Capture<VSYNC, SMP, DMA> {
    vsync: VSYNC,
    sampler: SMP,
    dma: DMA,
}

impl<VSYNC, SMP: PixelSampler, DMA> Capture<VSYNC, SMP, DMA> {
    /// Creates a new capture engine. The DMA channel is left unprogrammed until the first capture.
    pub fn new(vsync: VSYNC, sampler: SMP, dma: DMA) -> Self {
        Capture {
            vsync,
            sampler,
            dma,
        }
    }

    /// Release the VSYNC pin, sampler and DMA channel.
    pub fn free(self) -> (VSYNC, SMP, DMA) {
        (self.vsync, self.sampler, self.dma)
    }

    /// Start the sampler so it is ready for the next capture.
    pub fn start_sampler(&mut self) {
        self.sampler.start();
    }
}

impl<VSYNC, SMP, DMA, E> Capture<VSYNC, SMP, DMA>
where
    VSYNC: InputPin<Error = E>,
    SMP: PixelSampler,
    DMA: DmaChannel,
{
    /// Capture exactly one frame into `frame`.
    ///
    /// With `timeout` set to `None` both VSYNC waits and the completion poll spin forever, so a
    /// sensor that stops toggling VSYNC or a sampler that stops producing hangs the caller.
    /// `Some(n)` bounds each wait to `n` unsuccessful polls instead, so `Some(0)` gives up on the
    /// first miss.
    pub fn capture_frame(
        &mut self,
        frame: &mut FrameBuffer,
        timeout: Option<u32>,
    ) -> Result<(), CaptureError<E>> {
        let (write_addr, len) = frame.begin_write();
        let transfer = Transfer {
            read_addr: self.sampler.rx_address(),
            read_increment: false,
            write_addr,
            write_increment: true,
            dreq: self.sampler.rx_dreq(),
            count: len,
        };

        // The frame buffer stays mutably borrowed until the transfer completes or is aborted
        unsafe {
            self.dma.configure(&transfer);
        }

        // Wait for vsync rising edge to start frame
        if let Err(e) = self.wait_for_frame_start(timeout) {
            self.dma.abort();
            return Err(e);
        }

        self.dma.start();

        let mut budget = SpinBudget::new(timeout);
        while self.dma.is_busy() {
            if budget.exhausted() {
                self.dma.abort();
                return Err(CaptureError::TransferTimeout);
            }
        }

        frame.commit();
        Ok(())
    }

    /// Spin while VSYNC is high, then until it goes high again.
    fn wait_for_frame_start(&mut self, timeout: Option<u32>) -> Result<(), CaptureError<E>> {
        self.wait_for_level(false, timeout)?;
        self.wait_for_level(true, timeout)
    }

    fn wait_for_level(&mut self, high: bool, timeout: Option<u32>) -> Result<(), CaptureError<E>> {
        let mut budget = SpinBudget::new(timeout);
        while self.vsync.is_high().map_err(CaptureError::Vsync)? != high {
            if budget.exhausted() {
                return Err(CaptureError::SyncTimeout);
            }
        }

        Ok(())
    }
}

/// Poll counter for one busy-wait. Without a limit it never runs out and never counts.
struct SpinBudget {
    spins: u32,
    limit: Option<u32>,
}

impl SpinBudget {
    fn new(limit: Option<u32>) -> Self {
        SpinBudget { spins: 0, limit }
    }

    /// Record one unsuccessful poll. Returns `true` once `limit` polls have been spent.
    fn exhausted(&mut self) -> bool {
        match self.limit {
            Some(limit) => {
                self.spins = self.spins.saturating_add(1);
                self.spins >= limit
            }
            None => false,
        }
    }
}
