//! Signature and logical screen descriptor.
//!
//! ## Layout
//!
//! - 6 bytes signature, `GIF87a` or `GIF89a`
//! - `width: u16`, `height: u16` (little endian)
//! - packed byte: bit 7 global table flag, bits 4-6 color resolution,
//!   bit 3 sort flag, bits 0-2 table size (`2^(k+1)` entries)
//! - background color index, pixel aspect ratio
//! - global color table when the flag is set

use std::fmt::{Display, Formatter};

use anyhow::{Result, bail};
use log::Level::Warn;

use crate::log_or_err;
use crate::process::decode::DecoderState;
use crate::structs::color_table::ColorTable;
use crate::utils::cursor::ByteCursor;
use crate::utils::errors::{DecodeError, FormatError};

pub const SIGNATURE_LEN: usize = 6;
pub const SCREEN_DESCRIPTOR_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Gif87a,
    Gif89a,
}

impl Version {
    pub fn from_signature(signature: &[u8]) -> Option<Self> {
        match signature {
            b"GIF87a" => Some(Self::Gif87a),
            b"GIF89a" => Some(Self::Gif89a),
            _ => None,
        }
    }

    /// Consumes the 6-byte signature. Failing here is always fatal.
    pub fn read(cursor: &mut ByteCursor) -> Result<Self> {
        let Ok(signature) = cursor.slice(SIGNATURE_LEN) else {
            bail!(FormatError::TooShort(cursor.remaining()));
        };

        match Self::from_signature(signature) {
            Some(version) => Ok(version),
            None => {
                let mut magic = [0u8; SIGNATURE_LEN];
                magic.copy_from_slice(signature);
                bail!(FormatError::InvalidSignature(magic))
            }
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Gif87a => write!(f, "GIF87a"),
            Version::Gif89a => write!(f, "GIF89a"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub packed: u8,
    pub background_index: u8,
    pub aspect: u8,
    pub global_table: Option<ColorTable>,
}

impl ScreenDescriptor {
    /// Reads the descriptor and the global table following it.
    ///
    /// A descriptor cut short by the end of input yields an empty 0x0 screen.
    pub fn read(state: &DecoderState, cursor: &mut ByteCursor) -> Result<Self> {
        if cursor.remaining() < SCREEN_DESCRIPTOR_LEN {
            log_or_err!(
                state,
                Warn,
                DecodeError::TruncatedScreenDescriptor(cursor.remaining())
            );
            cursor.take_up_to(SCREEN_DESCRIPTOR_LEN);
            return Ok(Self::default());
        }

        let mut screen = Self {
            width: cursor.read_u16_le()?,
            height: cursor.read_u16_le()?,
            packed: cursor.read_u8()?,
            background_index: cursor.read_u8()?,
            aspect: cursor.read_u8()?,
            global_table: None,
        };

        if screen.has_global_table() {
            screen.global_table = Some(ColorTable::read(
                state,
                cursor,
                screen.global_table_size(),
            )?);
        }

        Ok(screen)
    }

    pub fn has_global_table(&self) -> bool {
        self.packed & 0x80 != 0
    }

    pub fn global_table_size(&self) -> usize {
        ColorTable::size_from_field(self.packed)
    }

    pub fn color_resolution(&self) -> u8 {
        ((self.packed >> 4) & 0x07) + 1
    }

    pub fn sorted(&self) -> bool {
        self.packed & 0x08 != 0
    }
}

#[test]
fn reads_signature() -> Result<()> {
    let mut cursor = ByteCursor::new(b"GIF87aXYZ");
    assert_eq!(Version::read(&mut cursor)?, Version::Gif87a);
    assert_eq!(cursor.position(), 6);

    let mut cursor = ByteCursor::new(b"GIF90a");
    let err = Version::read(&mut cursor).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FormatError>(),
        Some(FormatError::InvalidSignature(_))
    ));

    let mut cursor = ByteCursor::new(b"GIF");
    let err = Version::read(&mut cursor).unwrap_err();
    assert_eq!(
        err.downcast_ref::<FormatError>(),
        Some(&FormatError::TooShort(3))
    );
    Ok(())
}

#[test]
fn reads_screen_with_global_table() -> Result<()> {
    let state = DecoderState::default();
    let data = [
        0x0A, 0x00, 0x14, 0x00, 0x91, 0x03, 0x00, // 10x20, 4 colours, bg 3
        0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00,
    ];
    let mut cursor = ByteCursor::new(&data);

    let screen = ScreenDescriptor::read(&state, &mut cursor)?;
    assert_eq!((screen.width, screen.height), (10, 20));
    assert!(screen.has_global_table());
    assert!(!screen.sorted());
    assert_eq!(screen.color_resolution(), 2);
    assert_eq!(screen.background_index, 3);
    assert_eq!(screen.global_table.as_ref().map(ColorTable::len), Some(4));
    assert!(cursor.is_empty());
    Ok(())
}

#[test]
fn truncated_screen_is_tolerated() -> Result<()> {
    let state = DecoderState::default();
    let mut cursor = ByteCursor::new(&[0x02, 0x00, 0x02]);

    let screen = ScreenDescriptor::read(&state, &mut cursor)?;
    assert_eq!((screen.width, screen.height), (0, 0));
    assert!(screen.global_table.is_none());
    assert!(cursor.is_empty());
    Ok(())
}
