//! XCLK generation on TIM8 channel 4 (PC9). Assumes the pin is already in alternate mode.

use crate::xclk::PulseGenerator;
use stm32f7xx_hal::pac::{RCC, TIM8};

/// TIM8 running as an edge aligned PWM straight off the timer kernel clock.
pub struct Tim8Xclk {
    tim: TIM8,
}

impl Tim8Xclk {
    pub fn new(tim: TIM8) -> Self {
        let rcc_regs = unsafe { &(*RCC::ptr()) };

        // Enable peripheral clock
        rcc_regs.apb2enr.modify(|_, w| w.tim8en().set_bit());

        // No prescaler, PWM mode 1 on channel 4 with preload
        unsafe {
            tim.psc.write(|w| w.psc().bits(0));
            tim.ccmr2_output()
                .modify(|_, w| w.oc4m().bits(0b110).oc4pe().set_bit());
        }
        tim.cr1.modify(|_, w| w.arpe().set_bit());

        Tim8Xclk { tim }
    }
}

impl PulseGenerator for Tim8Xclk {
    fn set_top(&mut self, top: u16) {
        unsafe {
            self.tim.arr.write(|w| w.arr().bits(top));
        }
    }

    fn set_level(&mut self, level: u16) {
        unsafe {
            self.tim.ccr4.write(|w| w.ccr().bits(level));
        }
    }

    fn enable(&mut self) {
        // Load the preloaded registers, then enable the output (advanced timers also need MOE)
        self.tim.egr.write(|w| w.ug().set_bit());
        self.tim.ccer.modify(|_, w| w.cc4e().set_bit());
        self.tim.bdtr.modify(|_, w| w.moe().set_bit());
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }
}
