//! OV7670 device driver.

pub mod parallel;
pub mod regs;
pub mod sccb;

use crate::config::CaptureConfig;
use crate::xclk::{self, PulseGenerator};
use embedded_hal::{
    blocking::{delay::DelayMs, i2c},
    digital::v2::OutputPin,
};
use parallel::{DmaChannel, PixelSampler};
use regs::RegisterTable;
use sccb::BusRate;

/// SCCB bit rate used for bring-up, deliberately slower than `SCCB_BITRATE_HZ`.
pub const BRINGUP_BITRATE_HZ: u32 = 10_000;

/// Time the sensor is held in reset, and given to wake back up afterwards.
pub const RESET_SETTLE_MS: u16 = 100;

/// Pause after every register write during bring-up.
pub const REG_WRITE_DELAY_MS: u16 = 1;

/// Outcome of applying the bring-up register table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BringUp {
    /// Table entries sent to the sensor.
    pub written: usize,
    /// Entries whose bus transaction failed.
    pub failed: usize,
}

/// Initialize the OV7670.
/// * Starts XCLK, the sensor does not respond on SCCB without it.
/// * Sets the SCCB bit rate and pulses the reset line.
/// * Writes `table` entry by entry, skipping entries the sensor does not acknowledge.
/// * Starts the sampler, so `capture_frame` can be called afterwards.
pub fn init<I2C, E, XCLK, RST, VSYNC, SMP, DMA, D>(
    config: &mut CaptureConfig<I2C, XCLK, RST, VSYNC, SMP, DMA>,
    table: &RegisterTable,
    delay: &mut D,
) -> BringUp
where
    I2C: i2c::Read<Error = E> + i2c::Write<Error = E> + BusRate,
    XCLK: PulseGenerator,
    RST: OutputPin,
    SMP: PixelSampler,
    DMA: DmaChannel,
    D: DelayMs<u16>,
{
    // XCLK generation
    xclk::start(&mut config.xclk);

    // SCCB at bring-up rate
    config.sccb.set_bitrate(BRINGUP_BITRATE_HZ);

    // Reset camera, and give it some time to wake back up
    let _ = config.reset.set_low();
    delay.delay_ms(RESET_SETTLE_MS);
    let _ = config.reset.set_high();
    delay.delay_ms(RESET_SETTLE_MS);

    // Configure the OV7670 using the register table
    let (written, failed) = config.sccb.apply_table(table, delay, REG_WRITE_DELAY_MS);

    // Enable the sampler
    config.capture.start_sampler();

    BringUp { written, failed }
}
