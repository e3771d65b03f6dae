//! A generic driver for the Serial Camera Control Bus on the OV7670 image sensor. Works with any
//! bus implementing the embedded-hal I2C interface.
//!
//! SCCB has no repeated start, so a register read is a one byte write of the address followed by
//! a separate one byte read.

use super::regs::{Register, RegisterTable};
use embedded_hal::blocking::{delay::DelayMs, i2c};

/// Device address is 0x42, however the I2C driver will left-shift the provided address by 1.
pub const OV7670_ADDRESS: u8 = 0x21;

/// Nominal SCCB bit rate.
pub const SCCB_BITRATE_HZ: u32 = 100_000;

/// Expected manufacturer ID.
pub const OV7670_MANF_ID: u16 = 0x7FA2;

/// A bus whose bit rate is programmed once before the first transaction.
pub trait BusRate {
    fn set_bitrate(&mut self, hz: u32);
}

/// SCCB errors.
#[derive(Debug, Eq, PartialEq)]
pub enum SccbError<E> {
    /// I2C write error.
    I2cWrite(E),
    /// I2C read error.
    I2cRead(E),
    /// Manufacturer ID mismatch.
    ReadManfId(u16),
}

/// SCCB driver.
pub struct Sccb<I2C> {
    /// Bus the sensor is attached to.
    i2c: I2C,
    /// Device I2C address.
    address: u8,
    /// Last byte received from the device, returned again when a read fails.
    latched: u8,
}

impl<I2C, E> Sccb<I2C>
where
    I2C: i2c::Read<Error = E> + i2c::Write<Error = E>,
{
    /// Creates a new SCCB driver owning an I2C bus.
    pub fn new(i2c: I2C) -> Self {
        Sccb {
            i2c,
            address: OV7670_ADDRESS,
            latched: 0xFF,
        }
    }

    /// Release the underlying bus.
    pub fn free(self) -> I2C {
        self.i2c
    }

    /// Read a register, reporting bus failures.
    pub fn try_read(&mut self, reg: u8) -> Result<u8, SccbError<E>> {
        // Write the address
        self.i2c
            .write(self.address, &[reg])
            .map_err(SccbError::I2cWrite)?;

        // Read the value
        let mut buf = [self.latched];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(SccbError::I2cRead)?;

        self.latched = buf[0];
        Ok(buf[0])
    }

    /// Write a register, reporting bus failures.
    pub fn try_write(&mut self, reg: u8, val: u8) -> Result<(), SccbError<E>> {
        self.i2c
            .write(self.address, &[reg, val])
            .map_err(SccbError::I2cWrite)
    }

    /// Read a register. A failed transaction yields the last byte the bus latched, which the
    /// caller cannot tell apart from a real value.
    pub fn read(&mut self, reg: u8) -> u8 {
        self.try_read(reg).unwrap_or(self.latched)
    }

    /// Write a register, discarding bus failures.
    pub fn write(&mut self, reg: u8, val: u8) {
        let _ = self.try_write(reg, val);
    }

    /// Read the 16-bit manufacturer ID (MIDH:MIDL).
    pub fn manufacturer_id(&mut self) -> Result<u16, SccbError<E>> {
        let msb: u16 = self.try_read(Register::MANF_ID_MSB)?.into();
        let lsb: u16 = self.try_read(Register::MANF_ID_LSB)?.into();
        Ok((msb << 8) | lsb)
    }

    /// Check the manufacturer ID matches the expected value.
    pub fn check_id(&mut self) -> Result<(), SccbError<E>> {
        let manf_id = self.manufacturer_id()?;
        if manf_id != OV7670_MANF_ID {
            return Err(SccbError::ReadManfId(manf_id));
        }

        Ok(())
    }

    /// Apply every entry of `table` in order, pausing `delay_ms` after each write. Failed writes
    /// are skipped. Returns the number of entries written and how many of those failed.
    pub fn apply_table<D: DelayMs<u16>>(
        &mut self,
        table: &RegisterTable,
        delay: &mut D,
        delay_ms: u16,
    ) -> (usize, usize) {
        let mut written = 0;
        let mut failed = 0;
        for entry in table.iter() {
            if self.try_write(entry.address, entry.value).is_err() {
                failed += 1;
            }
            written += 1;
            delay.delay_ms(delay_ms);
        }

        (written, failed)
    }
}

impl<I2C: BusRate> Sccb<I2C> {
    /// Program the bus bit rate.
    pub fn set_bitrate(&mut self, hz: u32) {
        self.i2c.set_bitrate(hz);
    }
}
