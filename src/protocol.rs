//! Binary command protocol between the host and the bridge.
//!
//! Every command is an opcode byte followed by a fixed number of argument bytes. There is no
//! framing, length prefix or checksum, and unknown opcodes are dropped without a reply.
//!
//! | Opcode | Arguments      | Reply                         |
//! |--------|----------------|-------------------------------|
//! | 0xAA   | address, value | none                          |
//! | 0xBB   | address        | value                         |
//! | 0xCC   | none           | one frame of raw sensor bytes |

/// Host link baud rate.
pub const BAUD_RATE: u32 = 1_500_000;

pub const CMD_REG_WRITE: u8 = 0xAA;
pub const CMD_REG_READ: u8 = 0xBB;
pub const CMD_CAPTURE: u8 = 0xCC;

/// Longest encoded command.
pub const MAX_COMMAND_LEN: usize = 3;

/// A decoded host command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// Write `value` to sensor register `address`.
    WriteRegister { address: u8, value: u8 },
    /// Read sensor register `address`, reply with its value.
    ReadRegister { address: u8 },
    /// Capture a frame, reply with the whole frame buffer.
    CaptureFrame,
}

impl Command {
    /// Encode into `buf`, returning the bytes to send.
    pub fn encode<'a>(&self, buf: &'a mut [u8; MAX_COMMAND_LEN]) -> &'a [u8] {
        match *self {
            Command::WriteRegister { address, value } => {
                *buf = [CMD_REG_WRITE, address, value];
                &buf[..3]
            }
            Command::ReadRegister { address } => {
                buf[..2].copy_from_slice(&[CMD_REG_READ, address]);
                &buf[..2]
            }
            Command::CaptureFrame => {
                buf[0] = CMD_CAPTURE;
                &buf[..1]
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    AwaitOpcode,
    ReadRegAddr { write: bool },
    ReadValue { address: u8 },
}

/// Byte-at-a-time command decoder.
#[derive(Clone, Debug)]
pub struct Decoder {
    state: State,
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

impl Decoder {
    /// Creates a new Decoder waiting for an opcode.
    pub const fn new() -> Self {
        Decoder {
            state: State::AwaitOpcode,
        }
    }

    /// `true` when the next byte is read as an opcode.
    pub fn is_idle(&self) -> bool {
        self.state == State::AwaitOpcode
    }

    /// Feed one byte from the link. Returns a command once its last byte has arrived. Unknown
    /// opcodes are consumed and leave the decoder waiting for the next opcode.
    pub fn feed(&mut self, byte: u8) -> Option<Command> {
        let (next, command) = match self.state {
            State::AwaitOpcode => match byte {
                CMD_REG_WRITE => (State::ReadRegAddr { write: true }, None),
                CMD_REG_READ => (State::ReadRegAddr { write: false }, None),
                CMD_CAPTURE => (State::AwaitOpcode, Some(Command::CaptureFrame)),
                _ => (State::AwaitOpcode, None),
            },
            State::ReadRegAddr { write: true } => (State::ReadValue { address: byte }, None),
            State::ReadRegAddr { write: false } => (
                State::AwaitOpcode,
                Some(Command::ReadRegister { address: byte }),
            ),
            State::ReadValue { address } => (
                State::AwaitOpcode,
                Some(Command::WriteRegister {
                    address,
                    value: byte,
                }),
            ),
        };

        self.state = next;
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn decode_all(bytes: &[u8]) -> Vec<Command> {
        let mut decoder = Decoder::new();
        bytes.iter().filter_map(|b| decoder.feed(*b)).collect()
    }

    #[test]
    fn decodes_each_command() {
        assert_eq!(
            decode_all(&[0xAA, 0x12, 0x34, 0xBB, 0x12, 0xCC]),
            [
                Command::WriteRegister {
                    address: 0x12,
                    value: 0x34
                },
                Command::ReadRegister { address: 0x12 },
                Command::CaptureFrame,
            ]
        );
    }

    #[test]
    fn unknown_opcodes_are_dropped() {
        let mut decoder = Decoder::new();
        for byte in [0x00u8, 0xFF, 0x01, 0xAB].iter() {
            assert_eq!(decoder.feed(*byte), None);
            assert!(decoder.is_idle());
        }
        assert_eq!(decode_all(&[0x00, 0xBB, 0xAA, 0xFF]), [Command::ReadRegister {
            address: 0xAA
        }]);
    }

    #[test]
    fn argument_bytes_are_never_opcodes() {
        // 0xCC as an address or value must not trigger a capture
        assert_eq!(
            decode_all(&[0xAA, 0xCC, 0xCC]),
            [Command::WriteRegister {
                address: 0xCC,
                value: 0xCC
            }]
        );
    }

    #[test]
    fn encode_matches_decode() {
        let commands = [
            Command::WriteRegister {
                address: 0x1E,
                value: 0x21,
            },
            Command::ReadRegister { address: 0x1C },
            Command::CaptureFrame,
        ];
        let mut wire = Vec::new();
        for cmd in commands.iter() {
            let mut buf = [0; MAX_COMMAND_LEN];
            wire.extend_from_slice(cmd.encode(&mut buf));
        }
        assert_eq!(wire, [0xAA, 0x1E, 0x21, 0xBB, 0x1C, 0xCC]);
        assert_eq!(decode_all(&wire), commands);
    }
}
