//! Command dispatcher serving the host link.

use crate::config::Camera;
use crate::protocol::{Command, Decoder};
use embedded_hal::{digital::v2::ToggleableOutputPin, serial};

/// Dispatcher errors. None of these are reported to the host.
#[derive(Debug, Eq, PartialEq)]
pub enum DispatchError<RE, TE, CE> {
    /// Host link receive error.
    LinkRead(RE),
    /// Host link transmit error.
    LinkWrite(TE),
    /// Frame capture error.
    Capture(CE),
}

/// Reads commands from the host link one opcode at a time and runs them against a `Camera`.
pub struct CommandDispatcher<RX, TX, LED> {
    rx: RX,
    tx: TX,
    /// Toggled on every opcode.
    led: LED,
    decoder: Decoder,
}

impl<RX, TX, LED> CommandDispatcher<RX, TX, LED>
where
    RX: serial::Read<u8>,
    TX: serial::Write<u8>,
    LED: ToggleableOutputPin,
{
    /// Creates a new CommandDispatcher on the link halves, with the decoder waiting for an opcode.
    pub fn new(rx: RX, tx: TX, led: LED) -> Self {
        CommandDispatcher {
            rx,
            tx,
            led,
            decoder: Decoder::new(),
        }
    }

    /// Serve commands forever, passing every error to `on_error` and carrying on.
    pub fn run<C, F>(&mut self, camera: &mut C, mut on_error: F) -> !
    where
        C: Camera,
        F: FnMut(DispatchError<RX::Error, TX::Error, C::Error>),
    {
        loop {
            if let Err(e) = self.serve(camera) {
                on_error(e);
            }
        }
    }

    /// Block for one opcode and execute it. Returns the command that ran, or `None` if the opcode
    /// was not recognized and has been dropped.
    pub fn serve<C: Camera>(
        &mut self,
        camera: &mut C,
    ) -> Result<Option<Command>, DispatchError<RX::Error, TX::Error, C::Error>> {
        let opcode = self.read_byte::<C::Error>()?;
        let _ = self.led.toggle();

        let mut command = self.decoder.feed(opcode);
        while command.is_none() && !self.decoder.is_idle() {
            let byte = self.read_byte::<C::Error>()?;
            command = self.decoder.feed(byte);
        }

        match command {
            Some(Command::WriteRegister { address, value }) => {
                camera.write_register(address, value);
            }
            Some(Command::ReadRegister { address }) => {
                let value = camera.read_register(address);
                self.write_all::<C::Error>(&[value])?;
            }
            Some(Command::CaptureFrame) => {
                let frame = match camera.capture_frame() {
                    Ok(frame) => frame,
                    Err(e) => return Err(DispatchError::Capture(e)),
                };
                self.write_all::<C::Error>(frame)?;
            }
            None => (),
        }

        Ok(command)
    }

    fn read_byte<CE>(&mut self) -> Result<u8, DispatchError<RX::Error, TX::Error, CE>> {
        match nb::block!(self.rx.read()) {
            Ok(byte) => Ok(byte),
            Err(e) => {
                // Drop any half received command
                self.decoder = Decoder::new();
                Err(DispatchError::LinkRead(e))
            }
        }
    }

    fn write_all<CE>(
        &mut self,
        bytes: &[u8],
    ) -> Result<(), DispatchError<RX::Error, TX::Error, CE>> {
        for byte in bytes {
            if let Err(e) = nb::block!(self.tx.write(*byte)) {
                return Err(DispatchError::LinkWrite(e));
            }
        }
        match nb::block!(self.tx.flush()) {
            Ok(()) => Ok(()),
            Err(e) => Err(DispatchError::LinkWrite(e)),
        }
    }
}
