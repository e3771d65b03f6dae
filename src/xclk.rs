//! Master clock (XCLK) generation for the image sensor.

/// XCLK period in system clock cycles. The OV7670 requires 10 MHz <= XCLK <= 48 MHz, so with a
/// 216 MHz SYSCLK this gives 36 MHz.
pub const XCLK_DIVIDER: u16 = 6;

/// A hardware counter that drives one pin high for the first `level` counts of every period and
/// wraps after `top`, giving a square wave at `clock / (top + 1)`.
pub trait PulseGenerator {
    /// Set the last count before the counter wraps back to zero.
    fn set_top(&mut self, top: u16);

    /// Set the count at which the output goes low.
    fn set_level(&mut self, level: u16);

    /// Start the counter.
    fn enable(&mut self);
}

/// Start a continuous 50% duty square wave at SYSCLK / `XCLK_DIVIDER` on the generator's pin.
pub fn start<P: PulseGenerator>(generator: &mut P) {
    generator.set_top(XCLK_DIVIDER - 1);
    generator.set_level(XCLK_DIVIDER / 2);
    generator.enable();
}

/// Frequency produced by `start` for a given system clock.
pub const fn frequency(sysclk_hz: u32) -> u32 {
    sysclk_hz / XCLK_DIVIDER as u32
}
