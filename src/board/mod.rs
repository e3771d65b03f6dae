//! Support for the STM32F767ZI Nucleo-144 board.
//! * Note: The OV7670 driver is not part of this module and only sees these types through the
//!   `embedded-hal` traits and the capture traits.

pub mod dcmi;
pub mod pins;
pub mod sccb;
pub mod xclk;

use core::convert::Infallible;
use embedded_hal::digital::v2::{OutputPin, ToggleableOutputPin};
use stm32f7xx_hal::{
    gpio::{gpiob::PB0, Output, PushPull},
    time::{MegaHertz, U32Ext},
};

/// 8 MHz clock from the ST-LINK MCO is the HSE clock source.
pub fn get_xtal() -> MegaHertz {
    8.mhz()
}

/// LD1, toggled on every host command.
pub struct StatusLed {
    pin: PB0<Output<PushPull>>,
    lit: bool,
}

impl StatusLed {
    pub fn new(mut pin: PB0<Output<PushPull>>) -> Self {
        pin.set_low().ok();
        StatusLed { pin, lit: false }
    }
}

impl ToggleableOutputPin for StatusLed {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Infallible> {
        self.lit = !self.lit;
        if self.lit {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
        Ok(())
    }
}
