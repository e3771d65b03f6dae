//! I2C1 as the SCCB bus. The HAL fixes the bit rate when the driver is built, so changing it
//! tears the driver down and builds it again around the same peripheral and pins.

use super::pins::SccbPins;
use crate::ov7670::sccb::{BusRate, SCCB_BITRATE_HZ};
use embedded_hal::blocking::i2c;
use stm32f7xx_hal::{
    i2c::{BlockingI2c, Error, Mode},
    pac::I2C1,
    rcc::{Clocks, APB1},
    time::U32Ext,
};

/// Bus busy/data timeout of the blocking driver.
const DATA_TIMEOUT_US: u32 = 10_000;

/// SCCB port errors.
#[derive(Debug)]
pub enum PortError {
    /// The I2C driver reported an error.
    Bus(Error),
    /// The driver was lost while changing the bit rate.
    Unavailable,
}

pub struct SccbPort {
    i2c: Option<BlockingI2c<I2C1, SccbPins>>,
    clocks: Clocks,
    apb1: APB1,
}

impl SccbPort {
    /// Build the port at the nominal SCCB bit rate.
    pub fn new(i2c1: I2C1, pins: SccbPins, clocks: Clocks, mut apb1: APB1) -> Self {
        let i2c = build(i2c1, pins, clocks, &mut apb1, SCCB_BITRATE_HZ);
        SccbPort {
            i2c: Some(i2c),
            clocks,
            apb1,
        }
    }

    fn driver(&mut self) -> Result<&mut BlockingI2c<I2C1, SccbPins>, PortError> {
        self.i2c.as_mut().ok_or(PortError::Unavailable)
    }
}

fn build(
    i2c1: I2C1,
    pins: SccbPins,
    clocks: Clocks,
    apb1: &mut APB1,
    hz: u32,
) -> BlockingI2c<I2C1, SccbPins> {
    BlockingI2c::i2c1(
        i2c1,
        pins,
        Mode::standard((hz / 1000).khz()),
        clocks,
        apb1,
        DATA_TIMEOUT_US,
    )
}

impl BusRate for SccbPort {
    fn set_bitrate(&mut self, hz: u32) {
        if let Some(i2c) = self.i2c.take() {
            let (i2c1, pins) = i2c.free();
            self.i2c = Some(build(i2c1, pins, self.clocks, &mut self.apb1, hz));
        }
    }
}

impl i2c::Write for SccbPort {
    type Error = PortError;

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), PortError> {
        self.driver()?.write(address, bytes).map_err(PortError::Bus)
    }
}

impl i2c::Read for SccbPort {
    type Error = PortError;

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), PortError> {
        self.driver()?.read(address, buffer).map_err(PortError::Bus)
    }
}
