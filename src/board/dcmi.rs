//! The parallel bus on the STM32F7: the DCMI peripheral samples the data lines and DMA2 drains
//! its data register into memory. Assumes that GPIO is set up prior to using this module.

use crate::ov7670::parallel::{DmaChannel, PixelSampler, Transfer};
use core::convert::Infallible;
use embedded_hal::digital::v2::InputPin;
use stm32f7xx_hal::pac::{DCMI, DMA2, GPIOG, RCC};

// DMA2-Stream 1-Channel 1 is used to interface with DCMI
const DMA_STREAM: usize = 1;
const DMA_CHANNEL: u8 = 1;

// DCMI data register address
const DCMI_DR_ADDR: usize = 0x5005_0000 + 0x28;

// Stream 1 flags in LISR/LIFCR: FEIF1, DMEIF1, TEIF1, HTIF1, TCIF1
const STREAM1_FLAGS: u32 = 0xF40;
const TCIF1: u32 = 1 << 11;

// DCMI VSYNC is PG9
const VSYNC_PIN: u32 = 9;

/// DCMI in continuous capture mode with 8-bit data. Every pixel clock rising edge while HREF
/// is high latches one byte, four bytes make one word in the data register.
pub struct DcmiSampler {
    dcmi: DCMI,
}

impl DcmiSampler {
    pub fn new(dcmi: DCMI) -> Self {
        let rcc_regs = unsafe { &(*RCC::ptr()) };

        // Enable peripheral clock
        rcc_regs.ahb2enr.modify(|_, w| w.dcmien().set_bit());

        DcmiSampler { dcmi }
    }
}

impl PixelSampler for DcmiSampler {
    fn start(&mut self) {
        // Data valid while HREF is high, VSYNC high outside the frame, sample on PCLK rising
        self.dcmi.cr.write(|w| {
            w.vspol()
                .set_bit()
                .hspol()
                .clear_bit()
                .pckpol()
                .set_bit()
                .cm()
                .clear_bit()
        });

        // Enable the DCMI peripheral and start capture
        self.dcmi
            .cr
            .modify(|_, w| w.enable().set_bit().capture().set_bit());
    }

    fn rx_address(&self) -> usize {
        DCMI_DR_ADDR
    }

    fn rx_dreq(&self) -> u8 {
        DMA_CHANNEL
    }
}

/// DMA2 stream 1, polled for completion.
pub struct Dma2Stream1 {
    dma: DMA2,
}

impl Dma2Stream1 {
    pub fn new(dma: DMA2) -> Self {
        let rcc_regs = unsafe { &(*RCC::ptr()) };

        // Enable peripheral clock
        rcc_regs.ahb1enr.modify(|_, w| w.dma2en().set_bit());

        Dma2Stream1 { dma }
    }

    fn disable(&mut self) {
        let stream = &self.dma.st[DMA_STREAM];
        stream.cr.modify(|_, w| w.en().clear_bit());
        while stream.cr.read().en().bit_is_set() {}
    }

    fn clear_flags(&mut self) {
        unsafe {
            self.dma.lifcr.write(|w| w.bits(STREAM1_FLAGS));
        }
    }
}

impl DmaChannel for Dma2Stream1 {
    unsafe fn configure(&mut self, transfer: &Transfer) {
        self.disable();
        self.clear_flags();

        let stream = &self.dma.st[DMA_STREAM];
        stream.cr.write(|w| {
            let w = w
                // Flow controller (0 = DMA, 1 = peripheral)
                .pfctrl()
                .clear_bit()
                // Direction
                .dir()
                .peripheral_to_memory()
                // One shot
                .circ()
                .clear_bit()
                .dbm()
                .clear_bit()
                // Address increments
                .pinc()
                .bit(transfer.read_increment)
                .minc()
                .bit(transfer.write_increment)
                // DCMI_DR is always read as a word, the FIFO unpacks it
                .psize()
                .bits32()
                // Priority level
                .pl()
                .high()
                // Channel
                .chsel()
                .bits(transfer.dreq)
                // Frame buffer is filled bytewise
                .msize()
                .bits8()
        });

        // Direct mode off, the packing needs the FIFO
        stream
            .fcr
            .write(|w| w.dmdis().set_bit().fth().full());

        // NDTR counts peripheral words
        let words = transfer.count / 4;
        stream.ndtr.write(|w| w.ndt().bits(words as u16));
        stream.par.write(|w| w.pa().bits(transfer.read_addr as u32));
        stream
            .m0ar
            .write(|w| w.m0a().bits(transfer.write_addr as u32));
    }

    fn start(&mut self) {
        self.dma.st[DMA_STREAM].cr.modify(|_, w| w.en().set_bit());
    }

    fn is_busy(&mut self) -> bool {
        if self.dma.lisr.read().bits() & TCIF1 == 0 {
            return true;
        }

        self.clear_flags();
        false
    }

    fn abort(&mut self) {
        self.disable();
        self.clear_flags();
    }
}

/// DCMI VSYNC pin, read through the GPIOG input data register while it stays in alternate mode.
pub struct VsyncPin;

impl InputPin for VsyncPin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        let gpiog_regs = unsafe { &(*GPIOG::ptr()) };
        Ok(gpiog_regs.idr.read().bits() & (1 << VSYNC_PIN) != 0)
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}
