use std::io::{self, Read, Write};

use ovbridge::ov7670::regs::Register;
use ovbridge::protocol::{Command, MAX_COMMAND_LEN};
use serialport::{ClearBuffer, SerialPort};

/// MVFP bit mirroring the image horizontally.
const MIRROR_BIT: u8 = 5;
/// MVFP bit flipping the image vertically.
const VFLIP_BIT: u8 = 4;

/// Byte stream to the bridge.
pub trait Port: Read + Write {
    /// Drop anything buffered in either direction.
    fn discard(&mut self) -> io::Result<()>;
}

impl Port for Box<dyn SerialPort> {
    fn discard(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::All)?;
        Ok(())
    }
}

pub struct BridgeLink<P> {
    port: P,
}

impl<P: Port> BridgeLink<P> {
    pub fn new(port: P) -> Self {
        BridgeLink { port }
    }

    fn send(&mut self, cmd: Command) -> io::Result<()> {
        self.port.discard()?;

        let mut buf = [0; MAX_COMMAND_LEN];
        let bytes = cmd.encode(&mut buf);
        log::debug!("Sending {:?}: {:02x?}", cmd, bytes);

        self.port.write_all(bytes)?;
        self.port.flush()
    }

    pub fn write_register(&mut self, address: u8, value: u8) -> io::Result<()> {
        self.send(Command::WriteRegister { address, value })
    }

    pub fn read_register(&mut self, address: u8) -> io::Result<u8> {
        self.send(Command::ReadRegister { address })?;

        let mut value = [0];
        self.port.read_exact(&mut value)?;
        log::debug!("Register {:#04x} = {:#04x}", address, value[0]);
        Ok(value[0])
    }

    /// Read `address`, apply `update` and write the result back. Returns the written value.
    fn modify<F: FnOnce(u8) -> u8>(&mut self, address: u8, update: F) -> io::Result<u8> {
        let value = update(self.read_register(address)?);
        self.write_register(address, value)?;
        Ok(value)
    }

    pub fn set_bit(&mut self, address: u8, bit: u8) -> io::Result<u8> {
        let mask = bit_mask(bit)?;
        self.modify(address, |v| v | mask)
    }

    pub fn clear_bit(&mut self, address: u8, bit: u8) -> io::Result<u8> {
        let mask = bit_mask(bit)?;
        self.modify(address, |v| v & !mask)
    }

    pub fn get_bit(&mut self, address: u8, bit: u8) -> io::Result<bool> {
        let mask = bit_mask(bit)?;
        Ok(self.read_register(address)? & mask != 0)
    }

    /// Set the mirror and vertical flip bits of MVFP. Returns the written value.
    pub fn flip(&mut self, horizontal: bool, vertical: bool) -> io::Result<u8> {
        self.modify(Register::MIRROR_VFLIP, |v| {
            let v = with_bit(v, MIRROR_BIT, horizontal);
            with_bit(v, VFLIP_BIT, vertical)
        })
    }

    /// Capture one frame into `frame`, which must be sized for the device's frame format.
    /// A short reply is an error.
    pub fn capture(&mut self, frame: &mut [u8]) -> io::Result<()> {
        self.send(Command::CaptureFrame)?;
        self.port.read_exact(frame)?;
        log::debug!("Received {} frame bytes", frame.len());
        Ok(())
    }
}

fn bit_mask(bit: u8) -> io::Result<u8> {
    if bit > 7 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("bit {} out of range 0..=7", bit),
        ));
    }

    Ok(1 << bit)
}

fn with_bit(value: u8, bit: u8, set: bool) -> u8 {
    if set {
        value | (1 << bit)
    } else {
        value & !(1 << bit)
    }
}
