//! OV7670 register addresses and the bring-up register tables.

/// One register write: `value` goes to `address`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegisterEntry {
    pub address: u8,
    pub value: u8,
}

impl RegisterEntry {
    /// End-of-table marker. A real write of 0x00 to register 0x00 cannot be expressed.
    pub const END: RegisterEntry = RegisterEntry::new(0x00, 0x00);

    /// Creates a new RegisterEntry writing `value` to `address`.
    pub const fn new(address: u8, value: u8) -> Self {
        RegisterEntry { address, value }
    }

    pub fn is_end(&self) -> bool {
        *self == RegisterEntry::END
    }
}

/// An ordered register configuration terminated by `RegisterEntry::END`. Iteration also stops at
/// the end of the backing slice, so a table missing its terminator never reads past it.
#[derive(Clone, Copy, Debug)]
pub struct RegisterTable<'a> {
    entries: &'a [RegisterEntry],
}

impl<'a> RegisterTable<'a> {
    /// Creates a new RegisterTable over `entries`, which should end with `RegisterEntry::END`.
    pub const fn new(entries: &'a [RegisterEntry]) -> Self {
        RegisterTable { entries }
    }

    /// The entries to write, in order, excluding the terminator and anything after it.
    pub fn iter(&self) -> impl Iterator<Item = RegisterEntry> + 'a {
        self.entries.iter().copied().take_while(|entry| !entry.is_end())
    }
}

/// Device register addresses.
pub struct Register;

impl Register {
    // Common control registers
    pub const COM_CNTRL_03: u8 = 0x0C;
    pub const COM_CNTRL_07: u8 = 0x12;
    pub const COM_CNTRL_08: u8 = 0x13;
    pub const COM_CNTRL_10: u8 = 0x15;
    pub const COM_CNTRL_13: u8 = 0x3D;
    pub const COM_CNTRL_14: u8 = 0x3E;
    pub const COM_CNTRL_15: u8 = 0x40;

    // Clock and line buffer
    pub const CLK_RC: u8 = 0x11;
    pub const TSLB: u8 = 0x3A;
    pub const RGB_444: u8 = 0x8C;

    // Window
    pub const HSTART: u8 = 0x17;
    pub const HSTOP: u8 = 0x18;
    pub const VSTART: u8 = 0x19;
    pub const VSTOP: u8 = 0x1A;
    pub const HREF: u8 = 0x32;
    pub const VREF: u8 = 0x03;

    // Scaling
    pub const SCALING_XSC: u8 = 0x70;
    pub const SCALING_YSC: u8 = 0x71;
    pub const SCALING_DCWCTR: u8 = 0x72;
    pub const SCALING_PCLK_DIV: u8 = 0x73;
    pub const SCALING_PCLK_DELAY: u8 = 0xA2;

    // Mirror / vertical flip
    pub const MIRROR_VFLIP: u8 = 0x1E;

    // Manufacturer ID registers
    pub const MANF_ID_MSB: u8 = 0x1C;
    pub const MANF_ID_LSB: u8 = 0x1D;
}

const fn reg(address: u8, value: u8) -> RegisterEntry {
    RegisterEntry::new(address, value)
}

/// QVGA (320x240) with RGB565, PCLK gated during horizontal blanking.
pub static QVGA_RGB565: [RegisterEntry; 23] = [
    // Internal clock prescaler off, PCLK = XCLK
    reg(Register::CLK_RC, 0x01),
    // QVGA output with RGB data format
    reg(Register::COM_CNTRL_07, 0x14),
    // RGB 565 data format with full output range (0x00 --> 0xFF)
    reg(Register::COM_CNTRL_15, 0xd0),
    reg(Register::RGB_444, 0x00),
    // Line buffer auto window off, YUYV byte order
    reg(Register::TSLB, 0x04),
    // Gamma and UV auto adjust
    reg(Register::COM_CNTRL_13, 0xc8),
    // Enable down sampling (DCW)
    reg(Register::COM_CNTRL_03, 0x04),
    // Manual scaling, PCLK divided by 2
    reg(Register::COM_CNTRL_14, 0x19),
    reg(Register::SCALING_XSC, 0x3a),
    reg(Register::SCALING_YSC, 0x35),
    reg(Register::SCALING_DCWCTR, 0x11),
    reg(Register::SCALING_PCLK_DIV, 0xf1),
    reg(Register::SCALING_PCLK_DELAY, 0x02),
    // Output window
    reg(Register::HSTART, 0x16),
    reg(Register::HSTOP, 0x04),
    reg(Register::HREF, 0x24),
    reg(Register::VSTART, 0x02),
    reg(Register::VSTOP, 0x7a),
    reg(Register::VREF, 0x0a),
    // PCLK does not toggle during horizontal blanking, VSYNC active high
    reg(Register::COM_CNTRL_10, 0x20),
    // Enable auto gain, auto white balance and auto exposure
    reg(Register::COM_CNTRL_08, 0xe7),
    // No mirror and no vertical flip
    reg(Register::MIRROR_VFLIP, 0x01),
    RegisterEntry::END,
];

/// QQVGA (160x120) with RGB565, PCLK gated during horizontal blanking.
pub static QQVGA_RGB565: [RegisterEntry; 23] = [
    reg(Register::CLK_RC, 0x01),
    // QVGA base timing, the scaler halves it again
    reg(Register::COM_CNTRL_07, 0x14),
    reg(Register::COM_CNTRL_15, 0xd0),
    reg(Register::RGB_444, 0x00),
    reg(Register::TSLB, 0x04),
    reg(Register::COM_CNTRL_13, 0xc8),
    reg(Register::COM_CNTRL_03, 0x04),
    // Manual scaling, PCLK divided by 4
    reg(Register::COM_CNTRL_14, 0x1a),
    reg(Register::SCALING_XSC, 0x3a),
    reg(Register::SCALING_YSC, 0x35),
    reg(Register::SCALING_DCWCTR, 0x22),
    reg(Register::SCALING_PCLK_DIV, 0xf2),
    reg(Register::SCALING_PCLK_DELAY, 0x02),
    reg(Register::HSTART, 0x16),
    reg(Register::HSTOP, 0x04),
    reg(Register::HREF, 0xa4),
    reg(Register::VSTART, 0x02),
    reg(Register::VSTOP, 0x7a),
    reg(Register::VREF, 0x0a),
    reg(Register::COM_CNTRL_10, 0x20),
    reg(Register::COM_CNTRL_08, 0xe7),
    reg(Register::MIRROR_VFLIP, 0x01),
    RegisterEntry::END,
];

/// Register table matching the build-time `FRAME_FORMAT`.
#[cfg(feature = "qvga")]
pub const DEFAULT_TABLE: RegisterTable<'static> = RegisterTable::new(&QVGA_RGB565);

/// Register table matching the build-time `FRAME_FORMAT`.
#[cfg(not(feature = "qvga"))]
pub const DEFAULT_TABLE: RegisterTable<'static> = RegisterTable::new(&QQVGA_RGB565);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_buf::{FrameFormat, FRAME_FORMAT};
    use std::vec::Vec;

    #[test]
    fn stops_at_first_sentinel() {
        let entries = [
            reg(0x12, 0x80),
            reg(0x40, 0x10),
            RegisterEntry::END,
            reg(0x41, 0x01),
        ];
        let written: Vec<_> = RegisterTable::new(&entries).iter().collect();
        assert_eq!(written, [reg(0x12, 0x80), reg(0x40, 0x10)]);
    }

    #[test]
    fn zero_address_with_nonzero_value_is_not_a_sentinel() {
        let entries = [reg(0x00, 0x01), reg(0x01, 0x00), RegisterEntry::END];
        assert_eq!(RegisterTable::new(&entries).iter().count(), 2);
    }

    #[test]
    fn missing_sentinel_stops_at_slice_end() {
        let entries = [reg(0x12, 0x14), reg(0x40, 0xd0)];
        assert_eq!(RegisterTable::new(&entries).iter().count(), 2);
    }

    #[test]
    fn builtin_tables_are_terminated_once() {
        for table in [&QVGA_RGB565[..], &QQVGA_RGB565[..]].iter() {
            assert_eq!(table.last(), Some(&RegisterEntry::END));
            assert_eq!(table.iter().filter(|e| e.is_end()).count(), 1);
            assert_eq!(RegisterTable::new(table).iter().count(), table.len() - 1);
        }
    }

    #[test]
    fn default_table_matches_frame_format() {
        let expected = if FRAME_FORMAT == FrameFormat::QVGA_RGB565 {
            &QVGA_RGB565[..]
        } else {
            assert_eq!(FRAME_FORMAT, FrameFormat::QQVGA_RGB565);
            &QQVGA_RGB565[..]
        };
        assert!(DEFAULT_TABLE.iter().eq(RegisterTable::new(expected).iter()));
    }
}
