//! The capture context created once at startup and handed to every component.

use crate::frame_buf::FrameBuffer;
use crate::ov7670::parallel::{Capture, CaptureError, DmaChannel, PixelSampler};
use crate::ov7670::sccb::Sccb;
use embedded_hal::blocking::i2c;
use embedded_hal::digital::v2::InputPin;

/// Everything the pipeline drives: the sensor bus, the XCLK generator, the reset line, the
/// capture engine and the frame buffer it fills.
pub struct CaptureConfig<'a, I2C, XCLK, RST, VSYNC, SMP, DMA> {
    /// Sensor register bus.
    pub sccb: Sccb<I2C>,
    /// Master clock generator.
    pub xclk: XCLK,
    /// Active low sensor reset line.
    pub reset: RST,
    /// VSYNC input, sampler and DMA channel.
    pub capture: Capture<VSYNC, SMP, DMA>,
    /// The single frame buffer.
    pub frame: FrameBuffer<'a>,
    /// Spin budget for each capture wait, `None` to wait forever.
    pub timeout: Option<u32>,
}

impl<'a, I2C, XCLK, RST, VSYNC, SMP, DMA> CaptureConfig<'a, I2C, XCLK, RST, VSYNC, SMP, DMA> {
    /// Creates a new CaptureConfig with no capture timeout.
    pub fn new<E>(
        i2c: I2C,
        xclk: XCLK,
        reset: RST,
        capture: Capture<VSYNC, SMP, DMA>,
        frame: FrameBuffer<'a>,
    ) -> Self
    where
        I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
    {
        CaptureConfig {
            sccb: Sccb::new(i2c),
            xclk,
            reset,
            capture,
            frame,
            timeout: None,
        }
    }

    /// Bound every capture wait to `spins` polls.
    pub fn with_timeout(mut self, spins: u32) -> Self {
        self.timeout = Some(spins);
        self
    }
}

/// The sensor operations the command protocol exposes.
pub trait Camera {
    type Error;

    /// Write a sensor register, absorbing bus failures.
    fn write_register(&mut self, address: u8, value: u8);

    /// Read a sensor register, absorbing bus failures.
    fn read_register(&mut self, address: u8) -> u8;

    /// Capture one frame and return it.
    fn capture_frame(&mut self) -> Result<&[u8], Self::Error>;
}

impl<'a, I2C, XCLK, RST, VSYNC, SMP, DMA, E, PE> Camera
    for CaptureConfig<'a, I2C, XCLK, RST, VSYNC, SMP, DMA>
where
    I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
    VSYNC: InputPin<Error = PE>,
    SMP: PixelSampler,
    DMA: DmaChannel,
{
    type Error = CaptureError<PE>;

    fn write_register(&mut self, address: u8, value: u8) {
        self.sccb.write(address, value);
    }

    fn read_register(&mut self, address: u8) -> u8 {
        self.sccb.read(address)
    }

    fn capture_frame(&mut self) -> Result<&[u8], Self::Error> {
        self.capture.capture_frame(&mut self.frame, self.timeout)?;
        Ok(self.frame.frame().unwrap_or(&[]))
    }
}
