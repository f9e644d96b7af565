//! Image descriptor, read after an image chunk tag (`0x2C`).
//!
//! - `left, top, width, height: u16`
//! - packed byte: bit 7 local table flag, bit 6 interlace flag, bit 5 sort
//!   flag, bits 0-2 table size
//! - local color table when the flag is set

use anyhow::Result;
use log::Level::Warn;

use crate::log_or_err;
use crate::process::decode::DecoderState;
use crate::structs::color_table::ColorTable;
use crate::utils::cursor::ByteCursor;
use crate::utils::errors::DecodeError;

pub const IMAGE_DESCRIPTOR_LEN: usize = 9;

#[derive(Debug, Clone, Default)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub packed: u8,
    pub local_table: Option<ColorTable>,
}

impl ImageDescriptor {
    /// Returns `None` when the input ends inside the descriptor.
    pub fn read(state: &DecoderState, cursor: &mut ByteCursor) -> Result<Option<Self>> {
        if cursor.remaining() < IMAGE_DESCRIPTOR_LEN {
            log_or_err!(
                state,
                Warn,
                DecodeError::TruncatedImageDescriptor(cursor.position())
            );
            cursor.take_up_to(IMAGE_DESCRIPTOR_LEN);
            return Ok(None);
        }

        let mut desc = Self {
            left: cursor.read_u16_le()?,
            top: cursor.read_u16_le()?,
            width: cursor.read_u16_le()?,
            height: cursor.read_u16_le()?,
            packed: cursor.read_u8()?,
            local_table: None,
        };

        if desc.has_local_table() {
            desc.local_table = Some(ColorTable::read(state, cursor, desc.local_table_size())?);
        }

        Ok(Some(desc))
    }

    pub fn has_local_table(&self) -> bool {
        self.packed & 0x80 != 0
    }

    pub fn interlaced(&self) -> bool {
        self.packed & 0x40 != 0
    }

    pub fn local_table_size(&self) -> usize {
        ColorTable::size_from_field(self.packed)
    }

    /// Pixel count of the decoded index buffer.
    pub fn samples(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[test]
fn reads_descriptor_with_local_table() -> Result<()> {
    let state = DecoderState::default();
    let data = [
        0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0xC0, // interlaced, 2 colours
        0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x08,
    ];
    let mut cursor = ByteCursor::new(&data);

    let desc = ImageDescriptor::read(&state, &mut cursor)?.unwrap();
    assert_eq!((desc.left, desc.top, desc.width, desc.height), (1, 2, 3, 4));
    assert!(desc.interlaced());
    assert_eq!(desc.samples(), 12);
    assert_eq!(desc.local_table.as_ref().map(ColorTable::len), Some(2));
    assert_eq!(cursor.read_u8()?, 0x08);
    Ok(())
}

#[test]
fn truncated_descriptor_yields_none() -> Result<()> {
    let state = DecoderState::default();
    let mut cursor = ByteCursor::new(&[0x00, 0x00, 0x00, 0x00, 0x02]);

    assert!(ImageDescriptor::read(&state, &mut cursor)?.is_none());
    assert!(cursor.is_empty());
    Ok(())
}
