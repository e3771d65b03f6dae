//! Host-side stand-ins for the board peripherals. Every mock records what it was asked to do in
//! a shared `EventLog`, so tests can check ordering across peripherals.

use crate::ov7670::parallel::{DmaChannel, PixelSampler, Transfer};
use crate::xclk::PulseGenerator;
use core::convert::Infallible;
use embedded_hal::{
    blocking::{delay::DelayMs, i2c},
    digital::v2::{InputPin, OutputPin, ToggleableOutputPin},
    serial,
};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    BusWrite { address: u8, bytes: Vec<u8> },
    BusRead { address: u8, len: usize },
    BusRate(u32),
    PinLow(&'static str),
    PinHigh(&'static str),
    PinToggled(&'static str),
    Delay(u16),
    XclkTop(u16),
    XclkLevel(u16),
    XclkEnabled,
    VsyncSample(bool),
    SamplerStarted,
    DmaConfigured,
    DmaStarted,
    DmaAborted,
}

#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<Event> {
        self.0.borrow_mut().drain(..).collect()
    }
}

/// SCCB device that stores every register write and returns it on read.
pub struct EchoBus {
    log: EventLog,
    regs: [u8; 256],
    /// Register addressed by the last one byte write.
    pointer: u8,
    fail_all: bool,
    fail_reg: Option<u8>,
}

impl EchoBus {
    pub fn new(log: &EventLog) -> Self {
        EchoBus {
            log: log.clone(),
            regs: [0; 256],
            pointer: 0,
            fail_all: false,
            fail_reg: None,
        }
    }

    /// NACK every transaction.
    pub fn fail_all(&mut self, fail: bool) {
        self.fail_all = fail;
    }

    /// NACK register writes to `reg`.
    pub fn fail_writes_to(&mut self, reg: u8) {
        self.fail_reg = Some(reg);
    }
}

impl i2c::Write for EchoBus {
    type Error = ();

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), ()> {
        self.log.push(Event::BusWrite {
            address,
            bytes: bytes.to_vec(),
        });
        if self.fail_all || (bytes.len() == 2 && Some(bytes[0]) == self.fail_reg) {
            return Err(());
        }

        match *bytes {
            [reg] => self.pointer = reg,
            [reg, val] => {
                self.pointer = reg;
                self.regs[reg as usize] = val;
            }
            _ => return Err(()),
        }
        Ok(())
    }
}

impl i2c::Read for EchoBus {
    type Error = ();

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), ()> {
        self.log.push(Event::BusRead {
            address,
            len: buffer.len(),
        });
        if self.fail_all {
            return Err(());
        }

        for byte in buffer.iter_mut() {
            *byte = self.regs[self.pointer as usize];
        }
        Ok(())
    }
}

impl crate::ov7670::sccb::BusRate for EchoBus {
    fn set_bitrate(&mut self, hz: u32) {
        self.log.push(Event::BusRate(hz));
    }
}

/// Delay that returns immediately.
pub struct NoDelay(EventLog);

impl NoDelay {
    pub fn new(log: &EventLog) -> Self {
        NoDelay(log.clone())
    }
}

impl DelayMs<u16> for NoDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.0.push(Event::Delay(ms));
    }
}

/// Output pin recording level changes under a name.
pub struct MockPin {
    log: EventLog,
    name: &'static str,
}

impl MockPin {
    pub fn new(log: &EventLog, name: &'static str) -> Self {
        MockPin {
            log: log.clone(),
            name,
        }
    }
}

impl OutputPin for MockPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.log.push(Event::PinLow(self.name));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.log.push(Event::PinHigh(self.name));
        Ok(())
    }
}

impl ToggleableOutputPin for MockPin {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Infallible> {
        self.log.push(Event::PinToggled(self.name));
        Ok(())
    }
}

/// XCLK generator recording its programming.
pub struct MockPulse(EventLog);

impl MockPulse {
    pub fn new(log: &EventLog) -> Self {
        MockPulse(log.clone())
    }
}

impl PulseGenerator for MockPulse {
    fn set_top(&mut self, top: u16) {
        self.0.push(Event::XclkTop(top));
    }

    fn set_level(&mut self, level: u16) {
        self.0.push(Event::XclkLevel(level));
    }

    fn enable(&mut self) {
        self.0.push(Event::XclkEnabled);
    }
}

/// VSYNC input playing back a fixed sequence of levels, then holding `idle` forever.
pub struct ScriptedVsync {
    log: EventLog,
    script: RefCell<VecDeque<bool>>,
    idle: bool,
}

impl ScriptedVsync {
    pub fn new(log: &EventLog, script: &[bool], idle: bool) -> Self {
        ScriptedVsync {
            log: log.clone(),
            script: RefCell::new(script.iter().copied().collect()),
            idle,
        }
    }

    fn sample(&self) -> bool {
        let level = self.script.borrow_mut().pop_front().unwrap_or(self.idle);
        self.log.push(Event::VsyncSample(level));
        level
    }
}

impl InputPin for ScriptedVsync {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.sample())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(!self.sample())
    }
}

/// Sampler with a fixed queue address.
pub struct MockSampler(EventLog);

impl MockSampler {
    pub const RX_ADDRESS: usize = 0x5005_0028;
    pub const DREQ: u8 = 1;

    pub fn new(log: &EventLog) -> Self {
        MockSampler(log.clone())
    }
}

impl PixelSampler for MockSampler {
    fn start(&mut self) {
        self.0.push(Event::SamplerStarted);
    }

    fn rx_address(&self) -> usize {
        MockSampler::RX_ADDRESS
    }

    fn rx_dreq(&self) -> u8 {
        MockSampler::DREQ
    }
}

/// DMA channel copying a programmed raster into the destination once started.
pub struct MockDma {
    log: EventLog,
    raster: Vec<u8>,
    transfer: Option<Transfer>,
    /// Number of `is_busy` polls answered with `true` after each start.
    polls: usize,
    remaining: usize,
    stalled: bool,
}

impl MockDma {
    pub fn new(log: &EventLog, raster: &[u8]) -> Self {
        MockDma {
            log: log.clone(),
            raster: raster.to_vec(),
            transfer: None,
            polls: 0,
            remaining: 0,
            stalled: false,
        }
    }

    pub fn with_polls(mut self, polls: usize) -> Self {
        self.polls = polls;
        self
    }

    pub fn with_raster(mut self, raster: &[u8]) -> Self {
        self.raster = raster.to_vec();
        self
    }

    /// Never complete, as if the sampler stopped producing.
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    pub fn last_transfer(&self) -> Option<Transfer> {
        self.transfer
    }
}

impl DmaChannel for MockDma {
    unsafe fn configure(&mut self, transfer: &Transfer) {
        self.log.push(Event::DmaConfigured);
        self.transfer = Some(*transfer);
    }

    fn start(&mut self) {
        self.log.push(Event::DmaStarted);
        self.remaining = self.polls;
        if self.stalled || self.raster.is_empty() {
            return;
        }

        if let Some(transfer) = self.transfer {
            // The destination is valid for `count` bytes per the `configure` contract
            let dest =
                unsafe { std::slice::from_raw_parts_mut(transfer.write_addr, transfer.count) };
            for (i, byte) in dest.iter_mut().enumerate() {
                *byte = self.raster[i % self.raster.len()];
            }
        }
    }

    fn is_busy(&mut self) -> bool {
        if self.stalled {
            return true;
        }
        if self.remaining > 0 {
            self.remaining -= 1;
            return true;
        }
        false
    }

    fn abort(&mut self) {
        self.log.push(Event::DmaAborted);
    }
}

/// Link end closed by the host, returned once all queued bytes are consumed.
#[derive(Debug, Eq, PartialEq)]
pub struct LinkClosed;

#[derive(Default)]
struct LinkState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
}

/// In-memory host link. Clones share the same queues, so the test keeps one end while the
/// dispatcher owns the other.
#[derive(Clone, Default)]
pub struct MockLink(Rc<RefCell<LinkState>>);

impl MockLink {
    pub fn new() -> Self {
        MockLink::default()
    }

    /// Queue bytes as if sent by the host.
    pub fn host_send(&self, bytes: &[u8]) {
        self.0.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Take everything the device has sent.
    pub fn host_receive(&self) -> Vec<u8> {
        self.0.borrow_mut().tx.drain(..).collect()
    }

    /// Bytes sent by the host not yet read by the device.
    pub fn pending(&self) -> usize {
        self.0.borrow().rx.len()
    }
}

impl serial::Read<u8> for MockLink {
    type Error = LinkClosed;

    fn read(&mut self) -> nb::Result<u8, LinkClosed> {
        self.0
            .borrow_mut()
            .rx
            .pop_front()
            .ok_or(nb::Error::Other(LinkClosed))
    }
}

impl serial::Write<u8> for MockLink {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        self.0.borrow_mut().tx.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }
}
