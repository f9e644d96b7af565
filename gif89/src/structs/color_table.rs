//! Global and local color tables.

use anyhow::Result;
use log::Level::Warn;

use crate::log_or_err;
use crate::process::decode::DecoderState;
use crate::utils::cursor::ByteCursor;
use crate::utils::errors::DecodeError;

/// Largest table a packed size field can describe.
pub const MAX_COLOR_TABLE_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Index-addressed list of RGB triples, 2 to 256 entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorTable {
    entries: Vec<Rgb>,
}

impl ColorTable {
    /// Entry count encoded in the low three bits of a packed field.
    pub const fn size_from_field(packed: u8) -> usize {
        1 << ((packed & 0x07) + 1)
    }

    /// Reads `size` RGB triples.
    ///
    /// A table cut short by the end of input is padded with black.
    pub fn read(state: &DecoderState, cursor: &mut ByteCursor, size: usize) -> Result<Self> {
        let found = (cursor.remaining() / 3).min(size);
        let bytes = cursor.take_up_to(found * 3);

        if found < size {
            log_or_err!(
                state,
                Warn,
                DecodeError::TruncatedColorTable {
                    expected: size,
                    found,
                }
            );
        }

        let mut entries = bytes
            .chunks_exact(3)
            .map(|rgb| Rgb::new(rgb[0], rgb[1], rgb[2]))
            .collect::<Vec<_>>();
        entries.resize(size, Rgb::default());

        Ok(Self { entries })
    }

    /// A 256-entry gray ramp, used when an image has no table at all.
    pub fn grayscale() -> Self {
        Self {
            entries: (0..=255u8).map(|v| Rgb::new(v, v, v)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<Rgb> {
        self.entries.get(index as usize).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rgb> {
        self.entries.iter()
    }
}

impl From<Vec<Rgb>> for ColorTable {
    fn from(mut entries: Vec<Rgb>) -> Self {
        entries.truncate(MAX_COLOR_TABLE_SIZE);
        Self { entries }
    }
}

#[test]
fn size_field() {
    assert_eq!(ColorTable::size_from_field(0x00), 2);
    assert_eq!(ColorTable::size_from_field(0x80), 2);
    assert_eq!(ColorTable::size_from_field(0x91), 4);
    assert_eq!(ColorTable::size_from_field(0xF7), 256);
}

#[test]
fn truncated_table_is_padded() -> Result<()> {
    let state = DecoderState::default();
    let data = [1, 2, 3, 4, 5, 6, 7, 8];
    let mut cursor = ByteCursor::new(&data);

    let table = ColorTable::read(&state, &mut cursor, 4)?;
    assert_eq!(table.len(), 4);
    assert_eq!(table.get(1), Some(Rgb::new(4, 5, 6)));
    assert_eq!(table.get(2), Some(Rgb::default()));
    assert_eq!(table.get(4), None);
    Ok(())
}

#[test]
fn truncated_table_fails_when_strict() {
    let state = DecoderState {
        fail_level: Warn,
        ..Default::default()
    };
    let mut cursor = ByteCursor::new(&[0; 5]);

    assert!(ColorTable::read(&state, &mut cursor, 2).is_err());
}
