use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::time::Duration;

use structopt::StructOpt;

mod image;
mod link;

use link::BridgeLink;
use ovbridge::frame_buf::FRAME_FORMAT;
use ovbridge::protocol::BAUD_RATE;

/// Longest wait for any single read from the port.
const READ_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, StructOpt)]
#[structopt(name = "ovbridge-host", about = "Talk to an OV7670 through the serial bridge.")]
struct Opt {
    /// Serial device. Defaults to /dev/ttyACM0
    #[structopt(long = "device", parse(from_os_str))]
    serial: Option<PathBuf>,
    /// Link baud rate
    #[structopt(long, default_value = "1500000")]
    baud: u32,
    #[structopt(short, long)]
    debug: bool,
    #[structopt(subcommand)]
    cmd: CliCommand,
}

#[derive(StructOpt, Debug)]
enum CliCommand {
    /// Read a sensor register
    Read {
        #[structopt(parse(try_from_str = parse_u8))]
        reg: u8,
    },
    /// Write a sensor register
    Write {
        #[structopt(parse(try_from_str = parse_u8))]
        reg: u8,
        #[structopt(parse(try_from_str = parse_u8))]
        value: u8,
    },
    /// Set one bit of a sensor register
    SetBit {
        #[structopt(parse(try_from_str = parse_u8))]
        reg: u8,
        bit: u8,
    },
    /// Clear one bit of a sensor register
    ClearBit {
        #[structopt(parse(try_from_str = parse_u8))]
        reg: u8,
        bit: u8,
    },
    /// Print one bit of a sensor register
    GetBit {
        #[structopt(parse(try_from_str = parse_u8))]
        reg: u8,
        bit: u8,
    },
    /// Mirror and/or vertically flip the image. Omitted flags are turned off
    Flip {
        #[structopt(long)]
        horizontal: bool,
        #[structopt(long)]
        vertical: bool,
    },
    /// Capture frames to PPM (or raw) files
    Capture {
        #[structopt(parse(from_os_str))]
        path: PathBuf,
        /// Number of frames, numbered in the file name when more than one
        #[structopt(long, default_value = "1")]
        count: u32,
        /// Write the frame bytes as received
        #[structopt(long)]
        raw: bool,
        #[structopt(long)]
        width: Option<u16>,
        #[structopt(long)]
        height: Option<u16>,
    },
}

/// Parse `0x`-prefixed hex or decimal.
fn parse_u8(s: &str) -> Result<u8, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

/// `frame.ppm` becomes `frame-003.ppm` for index 3.
fn numbered_path(path: &Path, index: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}-{:03}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}-{:03}", stem, index),
    };
    path.with_file_name(name)
}

fn command_capture<P: link::Port>(
    link: &mut BridgeLink<P>,
    path: &Path,
    count: u32,
    raw: bool,
    width: u16,
    height: u16,
) -> io::Result<()> {
    let mut frame = vec![0; usize::from(width) * usize::from(height) * 2];

    for index in 0..count {
        link.capture(&mut frame)?;

        let path = if count == 1 {
            path.to_path_buf()
        } else {
            numbered_path(path, index)
        };
        let mut out = BufWriter::new(File::create(&path)?);
        if raw {
            out.write_all(&frame)?;
        } else {
            image::write_ppm(&mut out, width, height, &frame)?;
        }
        out.flush()?;

        log::info!("Frame {} written to {}", index, path.display());
    }

    Ok(())
}

fn main() -> io::Result<()> {
    let opt = Opt::from_args();

    let loglevel = if opt.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new().filter_level(loglevel).init();

    if opt.baud != BAUD_RATE {
        log::warn!("Bridge firmware runs at {} baud, using {}", BAUD_RATE, opt.baud);
    }

    let devpath = opt.serial.unwrap_or_else(|| PathBuf::from("/dev/ttyACM0"));
    let port = serialport::new(devpath.to_string_lossy(), opt.baud)
        .timeout(Duration::from_millis(READ_TIMEOUT_MS))
        .open()?;
    log::debug!("Opened {}", devpath.display());

    let mut link = BridgeLink::new(port);

    match opt.cmd {
        CliCommand::Read { reg } => {
            let value = link.read_register(reg)?;
            println!("{:#04x}", value);
        }
        CliCommand::Write { reg, value } => link.write_register(reg, value)?,
        CliCommand::SetBit { reg, bit } => {
            let value = link.set_bit(reg, bit)?;
            println!("{:#04x}", value);
        }
        CliCommand::ClearBit { reg, bit } => {
            let value = link.clear_bit(reg, bit)?;
            println!("{:#04x}", value);
        }
        CliCommand::GetBit { reg, bit } => {
            println!("{}", link.get_bit(reg, bit)? as u8);
        }
        CliCommand::Flip {
            horizontal,
            vertical,
        } => {
            let value = link.flip(horizontal, vertical)?;
            println!("MVFP = {:#04x}", value);
        }
        CliCommand::Capture {
            path,
            count,
            raw,
            width,
            height,
        } => {
            let width = width.unwrap_or(FRAME_FORMAT.width);
            let height = height.unwrap_or(FRAME_FORMAT.height);
            command_capture(&mut link, &path, count, raw, width, height)?;
        }
    }

    Ok(())
}
