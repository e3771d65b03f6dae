//! Frame conversion for captured RGB565 data.

use std::io::{self, Write};

/// Expand one RGB565 pixel to 8 bits per channel.
pub fn rgb565_to_rgb888(pixel: u16) -> [u8; 3] {
    let r = (pixel >> 11) & 0x1f;
    let g = (pixel >> 5) & 0x3f;
    let b = pixel & 0x1f;
    [scale(r, 0x1f), scale(g, 0x3f), scale(b, 0x1f)]
}

fn scale(value: u16, max: u32) -> u8 {
    (u32::from(value) * 0xff / max) as u8
}

/// Write `frame`, little-endian RGB565 in raster order, as a binary PPM.
pub fn write_ppm<W: Write>(out: &mut W, width: u16, height: u16, frame: &[u8]) -> io::Result<()> {
    let expected = usize::from(width) * usize::from(height) * 2;
    if frame.len() != expected {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{}x{} RGB565 frame is {} bytes, got {}",
                width,
                height,
                expected,
                frame.len()
            ),
        ));
    }

    write!(out, "P6\n{} {}\n255\n", width, height)?;

    let mut pixels = Vec::with_capacity(expected / 2 * 3);
    for bytes in frame.chunks_exact(2) {
        pixels.extend_from_slice(&rgb565_to_rgb888(u16::from_le_bytes([bytes[0], bytes[1]])));
    }
    out.write_all(&pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_extremes() {
        assert_eq!(rgb565_to_rgb888(0x0000), [0, 0, 0]);
        assert_eq!(rgb565_to_rgb888(0xffff), [255, 255, 255]);
        assert_eq!(rgb565_to_rgb888(0xf800), [255, 0, 0]);
        assert_eq!(rgb565_to_rgb888(0x07e0), [0, 255, 0]);
        assert_eq!(rgb565_to_rgb888(0x001f), [0, 0, 255]);
    }

    #[test]
    fn scaling_rounds_down() {
        // 16/31 * 255 = 131.6, 32/63 * 255 = 129.5
        assert_eq!(rgb565_to_rgb888((16 << 11) | (32 << 5) | 1), [131, 129, 8]);
    }

    #[test]
    fn ppm_header_and_little_endian_pixels() {
        // Red then blue, low byte first
        let frame = [0x00, 0xf8, 0x1f, 0x00];
        let mut out = Vec::new();
        write_ppm(&mut out, 2, 1, &frame).unwrap();

        let mut expected = b"P6\n2 1\n255\n".to_vec();
        expected.extend_from_slice(&[255, 0, 0, 0, 0, 255]);
        assert_eq!(out, expected);
    }

    #[test]
    fn ppm_rejects_wrong_frame_size() {
        let mut out = Vec::new();
        let err = write_ppm(&mut out, 2, 2, &[0; 6]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }
}
