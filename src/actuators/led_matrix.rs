//! Sense HAT 8x8 LED matrix through the `RPi-Sense FB` framebuffer
//!
//! The framebuffer is 64 RGB565 little-endian pixels, row-major. Messages
//! scroll right to left using a 5x7 column font.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use crate::config::Rotation;
use crate::error::{hardware, Result};

pub const GRAPHICS_ROOT: &str = "/sys/class/graphics";
pub const DEV_ROOT: &str = "/dev";

const FB_NAME: &str = "RPi-Sense FB";
const SIZE: usize = 8;
const FRAME_BYTES: usize = SIZE * SIZE * 2;
const WHITE: u16 = 0xFFFF;

/// One on/off bitmap, indexed `[y][x]`
pub type Frame = [[bool; SIZE]; SIZE];

#[derive(Debug)]
pub struct LedMatrix {
    device: PathBuf,
    rotation: AtomicU16,
    scroll: Duration,
}

impl LedMatrix {
    pub fn open(device: impl Into<PathBuf>, scroll: Duration) -> Self {
        Self {
            device: device.into(),
            rotation: AtomicU16::new(0),
            scroll,
        }
    }

    /// Locate the Sense HAT framebuffer among `fbN` devices
    pub fn discover(graphics_root: &Path, dev_root: &Path, scroll: Duration) -> Result<Self> {
        let entries = fs::read_dir(graphics_root)
            .map_err(|e| hardware(format!("Cannot list {}: {}", graphics_root.display(), e)))?;

        for entry in entries.flatten() {
            let name = fs::read_to_string(entry.path().join("name")).unwrap_or_default();
            if name.trim() == FB_NAME {
                let device = dev_root.join(entry.file_name());
                tracing::debug!("Found LED matrix at {}", device.display());
                return Ok(Self::open(device, scroll));
            }
        }

        Err(hardware(format!("No {} framebuffer found", FB_NAME)))
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn set_rotation(&self, rotation: Rotation) {
        self.rotation.store(rotation.degrees(), Ordering::Relaxed);
    }

    pub fn rotation(&self) -> Rotation {
        Rotation::from_degrees(self.rotation.load(Ordering::Relaxed))
    }

    pub fn clear(&self) -> Result<()> {
        self.write_raw(&[0u8; FRAME_BYTES])
    }

    /// Scroll `text` across the matrix, then blank it
    pub fn show_message(&self, text: &str) -> Result<()> {
        let columns = message_columns(text);
        for offset in 0..=columns.len() - SIZE {
            self.write_frame(&frame_at(&columns, offset))?;
            if !self.scroll.is_zero() {
                std::thread::sleep(self.scroll);
            }
        }
        self.clear()
    }

    pub fn write_frame(&self, frame: &Frame) -> Result<()> {
        self.write_raw(&render(frame, self.rotation()))
    }

    fn write_raw(&self, bytes: &[u8]) -> Result<()> {
        let mut fb = OpenOptions::new()
            .write(true)
            .open(&self.device)
            .map_err(|e| hardware(format!("Cannot open {}: {}", self.device.display(), e)))?;
        fb.write_all(bytes)
            .map_err(|e| hardware(format!("Cannot write {}: {}", self.device.display(), e)))
    }
}

/// Where logical pixel (x, y) lands on the panel for a given rotation
pub fn rotate(x: usize, y: usize, rotation: Rotation) -> (usize, usize) {
    let last = SIZE - 1;
    match rotation {
        Rotation::Deg0 => (x, y),
        Rotation::Deg90 => (last - y, x),
        Rotation::Deg180 => (last - x, last - y),
        Rotation::Deg270 => (y, last - x),
    }
}

/// Encode a frame as framebuffer bytes
pub fn render(frame: &Frame, rotation: Rotation) -> [u8; FRAME_BYTES] {
    let mut bytes = [0u8; FRAME_BYTES];
    for (y, row) in frame.iter().enumerate() {
        for (x, lit) in row.iter().enumerate() {
            if *lit {
                let (px, py) = rotate(x, y, rotation);
                let idx = (py * SIZE + px) * 2;
                bytes[idx..idx + 2].copy_from_slice(&WHITE.to_le_bytes());
            }
        }
    }
    bytes
}

/// Column bitmaps for a message, padded with a blank screen on both sides
pub fn message_columns(text: &str) -> Vec<u8> {
    let mut columns = vec![0u8; SIZE];
    for ch in text.chars() {
        columns.extend_from_slice(glyph(ch));
        columns.push(0);
    }
    columns.extend_from_slice(&[0u8; SIZE]);
    columns
}

/// The 8x8 window starting at column `offset`
pub fn frame_at(columns: &[u8], offset: usize) -> Frame {
    let mut frame = [[false; SIZE]; SIZE];
    for (x, bits) in columns[offset..offset + SIZE].iter().enumerate() {
        for (y, row) in frame.iter_mut().enumerate() {
            row[x] = (bits >> y) & 1 == 1;
        }
    }
    frame
}

fn glyph(ch: char) -> &'static [u8; 5] {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        &FONT[(code - 0x20) as usize]
    } else {
        &FONT[('?' as u32 - 0x20) as usize]
    }
}

// 5x7 ASCII font, one byte per column, bit 0 at the top
const FONT: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x41, 0x22, 0x14, 0x08, 0x00], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x01, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x32], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x00, 0x7F, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // backslash
    [0x41, 0x41, 0x7F, 0x00, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x08, 0x14, 0x54, 0x54, 0x3C], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x00, 0x7F, 0x10, 0x28, 0x44], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x08, 0x08, 0x2A, 0x1C, 0x08], // ~
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn fake_fb() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fb1");
        fs::write(&path, [0xAAu8; FRAME_BYTES]).unwrap();
        (dir, path)
    }

    #[test]
    fn test_message_columns() {
        // 8 blank + 6 per glyph + 8 blank
        assert_eq!(message_columns("").len(), 16);
        assert_eq!(message_columns("21C").len(), 8 + 18 + 8);
        assert_eq!(&message_columns("1")[8..13], &[0x00, 0x42, 0x7F, 0x40, 0x00]);
    }

    #[test]
    fn test_unknown_glyph_is_question_mark() {
        assert_eq!(glyph('°'), glyph('?'));
        assert_eq!(glyph('A'), &[0x7E, 0x11, 0x11, 0x11, 0x7E]);
    }

    #[test]
    fn test_frame_at() {
        let columns: Vec<u8> = vec![0x01, 0, 0, 0, 0, 0, 0, 0x80, 0xFF];
        let frame = frame_at(&columns, 0);
        assert!(frame[0][0]);
        assert!(frame[7][7]);
        assert!(!frame[1][0]);

        let frame = frame_at(&columns, 1);
        assert!((0..8).all(|y| frame[y][7]));
    }

    #[test]
    fn test_rotate_corners() {
        assert_eq!(rotate(0, 0, Rotation::Deg0), (0, 0));
        assert_eq!(rotate(0, 0, Rotation::Deg90), (7, 0));
        assert_eq!(rotate(0, 0, Rotation::Deg180), (7, 7));
        assert_eq!(rotate(0, 0, Rotation::Deg270), (0, 7));
    }

    #[test]
    fn test_render_applies_rotation() {
        let mut frame = [[false; SIZE]; SIZE];
        frame[0][0] = true;

        let bytes = render(&frame, Rotation::Deg180);
        let last = FRAME_BYTES - 2;
        assert_eq!(&bytes[last..], &[0xFF, 0xFF]);
        assert_eq!(bytes.iter().filter(|b| **b != 0).count(), 2);
    }

    #[test]
    fn test_show_message_ends_cleared() {
        let (_dir, path) = fake_fb();
        let matrix = LedMatrix::open(&path, Duration::ZERO);
        matrix.set_rotation(Rotation::Deg270);

        matrix.show_message("Hi").unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![0u8; FRAME_BYTES]);
        assert_eq!(matrix.rotation(), Rotation::Deg270);
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        let graphics = dir.path().join("graphics");
        for (fb, name) in [("fb0", "BCM2708 FB"), ("fb1", "RPi-Sense FB")] {
            fs::create_dir_all(graphics.join(fb)).unwrap();
            fs::write(graphics.join(fb).join("name"), format!("{}\n", name)).unwrap();
        }

        let matrix = LedMatrix::discover(&graphics, Path::new("/dev"), Duration::ZERO).unwrap();
        assert_eq!(matrix.device(), Path::new("/dev/fb1"));
    }

    #[test]
    fn test_missing_device_is_hardware_error() {
        let dir = tempfile::tempdir().unwrap();
        let matrix = LedMatrix::open(dir.path().join("fb9"), Duration::ZERO);
        assert!(matches!(matrix.clear(), Err(Error::HardwareUnavailable(_))));
    }
}
