//! GPIO pin configuration for the Nucleo-F767ZI.

use embedded_hal::digital::v2::OutputPin;
use stm32f7xx_hal::{
    gpio::{
        gpiob::{PB0, PB8, PB9},
        gpiod::{PD14, PD8, PD9},
        Alternate, GpioExt, Output, PushPull, Speed, AF4, AF7,
    },
    pac,
};

/// I2C1 pins carrying SCCB.
pub type SccbPins = (PB8<Alternate<AF4>>, PB9<Alternate<AF4>>);

/// USART3 pins carrying the host link, routed to the ST-LINK virtual COM port.
pub type LinkPins = (PD8<Alternate<AF7>>, PD9<Alternate<AF7>>);

/// Pins the firmware drives directly. Everything else is handed to its peripheral.
pub struct BoardPins {
    pub sccb: SccbPins,
    pub link: LinkPins,
    /// OV7670 RESET, active low.
    pub reset: PD14<Output<PushPull>>,
    /// LD1, the green user LED.
    pub led: PB0<Output<PushPull>>,
}

/// Configure GPIOs for alternate functions and return the pins needed by drivers. The
/// peripherals are stolen, so this should only be done during init.
///
/// Pin configuration:
///
///     I2C1 SCL:   PB8  --> Nucleo CN7.2   (D15)  --> OV7670 SIOC
///     I2C1 SDA:   PB9 <--> Nucleo CN7.4   (D14) <--> OV7670 SIOD
///     TIM8 CH4:   PC9  --> Nucleo CN8.4   (D44)  --> OV7670 XCLK
///     GPIO:       PD14 --> Nucleo CN7.16  (D10)  --> OV7670 RESET
///     DCMI PCLK:  PA6  <-- Nucleo CN7.12  (D12) <--  OV7670 PCLK
///     DCMI HSYNC: PA4  <-- Nucleo CN7.17  (D24) <--  OV7670 HREF
///     DCMI VSYNC: PG9  <-- Nucleo CN11.63       <--  OV7670 VSYNC
///     DCMI D0:    PC6  <-- Nucleo CN7.1   (D16) <--  OV7670 D0
///     DCMI D1:    PC7  <-- Nucleo CN7.11  (D21) <--  OV7670 D1
///     DCMI D2:    PC8  <-- Nucleo CN8.2   (D43) <--  OV7670 D2
///     DCMI D3:    PE1  <-- Nucleo CN11.61       <--  OV7670 D3
///     DCMI D4:    PE4  <-- Nucleo CN9.16  (D57) <--  OV7670 D4
///     DCMI D5:    PB6  <-- Nucleo CN10.13 (D26) <--  OV7670 D5
///     DCMI D6:    PE5  <-- Nucleo CN9.18  (D58) <--  OV7670 D6
///     DCMI D7:    PE6  <-- Nucleo CN9.20  (D59) <--  OV7670 D7
///     USART3 TX:  PD8  --> ST-LINK VCP RX
///     USART3 RX:  PD9 <--  ST-LINK VCP TX
pub fn configure_pins() -> BoardPins {
    let pac_periph = unsafe { pac::Peripherals::steal() };
    let gpioa = pac_periph.GPIOA.split();
    let gpiob = pac_periph.GPIOB.split();
    let gpioc = pac_periph.GPIOC.split();
    let gpiod = pac_periph.GPIOD.split();
    let gpioe = pac_periph.GPIOE.split();
    let gpiog = pac_periph.GPIOG.split();

    // TIM8 channel 4 drives XCLK
    let _xclk = gpioc.pc9.into_alternate_af3().set_speed(Speed::VeryHigh);

    // I2C1 for SCCB
    let scl = gpiob
        .pb8
        .into_alternate_af4()
        .internal_pull_up(true)
        .set_open_drain();
    let sda = gpiob
        .pb9
        .into_alternate_af4()
        .internal_pull_up(true)
        .set_open_drain();

    // USART3 for the host link
    let tx = gpiod.pd8.into_alternate_af7();
    let rx = gpiod.pd9.into_alternate_af7();

    // Reset is held high until bring-up pulses it
    let mut reset = gpiod.pd14.into_push_pull_output();
    reset.set_high().ok();

    let led = gpiob.pb0.into_push_pull_output();

    // DCMI for the parallel bus. VSYNC stays in alternate mode, its level is still readable
    // through the input data register.
    let _dcmi_pclk = gpioa
        .pa6
        .into_alternate_af13()
        .internal_pull_up(true)
        .set_speed(Speed::VeryHigh);
    let _dcmi_hsync = gpioa
        .pa4
        .into_alternate_af13()
        .internal_pull_up(true)
        .set_speed(Speed::VeryHigh);
    let _dcmi_vsync = gpiog
        .pg9
        .into_alternate_af13()
        .internal_pull_up(true)
        .set_speed(Speed::VeryHigh);

    let _dcmi_d0 = gpioc.pc6.into_alternate_af13().set_speed(Speed::VeryHigh);
    let _dcmi_d1 = gpioc.pc7.into_alternate_af13().set_speed(Speed::VeryHigh);
    let _dcmi_d2 = gpioc.pc8.into_alternate_af13().set_speed(Speed::VeryHigh);
    let _dcmi_d3 = gpioe.pe1.into_alternate_af13().set_speed(Speed::VeryHigh);
    let _dcmi_d4 = gpioe.pe4.into_alternate_af13().set_speed(Speed::VeryHigh);
    let _dcmi_d5 = gpiob.pb6.into_alternate_af13().set_speed(Speed::VeryHigh);
    let _dcmi_d6 = gpioe.pe5.into_alternate_af13().set_speed(Speed::VeryHigh);
    let _dcmi_d7 = gpioe.pe6.into_alternate_af13().set_speed(Speed::VeryHigh);

    BoardPins {
        sccb: (scl, sda),
        link: (tx, rx),
        reset,
        led,
    }
}
