//! OV7670 serial bridge firmware for the Nucleo-F767ZI.

#![no_main]
#![no_std]

use ovbridge::board::{
    self,
    dcmi::{Dma2Stream1, DcmiSampler, VsyncPin},
    pins::configure_pins,
    sccb::SccbPort,
    xclk::Tim8Xclk,
    StatusLed,
};
use ovbridge::config::CaptureConfig;
use ovbridge::dispatch::CommandDispatcher;
use ovbridge::frame_buf::{FrameBuffer, FRAME_FORMAT, FRAME_SIZE};
use ovbridge::ov7670::{
    self,
    parallel::Capture,
    regs::DEFAULT_TABLE,
    sccb::{SccbError, OV7670_MANF_ID},
};
use ovbridge::protocol::BAUD_RATE;
use ovbridge::xclk;

use core::panic::PanicInfo;
use core::ptr::addr_of_mut;
use cortex_m_rt::entry;
use rtt_target::{rprintln, rtt_init, set_print_channel};
use stm32f7xx_hal::{
    delay::Delay,
    pac,
    prelude::*,
    rcc::{HSEClock, HSEClockMode},
    serial::{self, Serial},
};

// Single frame buffer, filled by DMA and read back by the dispatcher
static mut IMAGE_BUF: [u8; FRAME_SIZE] = [0; FRAME_SIZE];

#[entry]
fn main() -> ! {
    // Setup RTT for logging
    let channels = rtt_init! {
        up: {
            0: {
                size: 4096
                mode: BlockIfFull
                name: "Terminal"
            }
        }
    };

    set_print_channel(channels.up.0);

    // Get peripherals
    let pac_periph = pac::Peripherals::take().unwrap();
    let cm_periph = pac::CorePeripherals::take().unwrap();

    // Nucleo board: HSE = 8 MHz from the ST-LINK, SYSCLK = 216 MHz
    let rcc = pac_periph.RCC.constrain();
    let hse_cfg = HSEClock::new(board::get_xtal(), HSEClockMode::Bypass);
    let clocks = rcc.cfgr.hse(hse_cfg).sysclk(216.mhz()).freeze();
    rprintln!(
        "SYSCLK {} Hz, XCLK {} Hz",
        clocks.sysclk().0,
        xclk::frequency(clocks.sysclk().0)
    );

    // Delay configuration
    let mut delay = Delay::new(cm_periph.SYST, clocks);

    // GPIO configuration
    let pins = configure_pins();

    // USART3 host link
    let link = Serial::new(
        pac_periph.USART3,
        pins.link,
        clocks,
        serial::Config {
            baud_rate: BAUD_RATE.bps(),
            oversampling: serial::Oversampling::By16,
            character_match: None,
        },
    );
    let (tx, rx) = link.split();

    // Capture pipeline
    let image_buf = unsafe { &mut *addr_of_mut!(IMAGE_BUF) };
    let frame = FrameBuffer::new(&mut image_buf[..], FRAME_FORMAT).unwrap();
    let capture = Capture::new(
        VsyncPin,
        DcmiSampler::new(pac_periph.DCMI),
        Dma2Stream1::new(pac_periph.DMA2),
    );
    let mut config = CaptureConfig::new(
        SccbPort::new(pac_periph.I2C1, pins.sccb, clocks, rcc.apb1),
        Tim8Xclk::new(pac_periph.TIM8),
        pins.reset,
        capture,
        frame,
    );

    // Bring up the OV7670
    let report = ov7670::init(&mut config, &DEFAULT_TABLE, &mut delay);
    rprintln!(
        "OV7670 bring-up: {} registers written, {} failed",
        report.written,
        report.failed
    );

    // A mismatch is only reported, the host can still poke at registers
    match config.sccb.check_id() {
        Ok(()) => rprintln!("Manufacturer ID {:#06x}", OV7670_MANF_ID),
        Err(SccbError::ReadManfId(id)) => rprintln!("Unexpected manufacturer ID {:#06x}", id),
        Err(e) => rprintln!("Manufacturer ID read failed: {:?}", e),
    }

    rprintln!(
        "Serving {}x{} frames at {} baud",
        FRAME_FORMAT.width,
        FRAME_FORMAT.height,
        BAUD_RATE
    );

    let mut dispatcher = CommandDispatcher::new(rx, tx, StatusLed::new(pins.led));
    dispatcher.run(&mut config, |e| rprintln!("Dispatch error: {:?}", e))
}

#[inline(never)]
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    rprintln!("Panicked!");
    rprintln!("{:?}", info);
    loop {}
}
