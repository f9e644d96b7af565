//! Variable-width code extraction for LZW image data.
//!
//! Codes are packed least-significant bit first, so the reader sits on a
//! little-endian [`BitReader`]. The width is set from outside by the LZW
//! decoder; this reader knows nothing about the code table.

use std::io;

use bitstream_io::{BitRead, BitReader, LittleEndian};

/// Widest code the GIF flavour of LZW ever uses.
pub const MAX_CODE_SIZE: u32 = 12;

#[derive(Debug)]
pub struct CodeReader<R: io::Read> {
    bs: BitReader<R, LittleEndian>,
    code_size: u32,
    codes_read: usize,
}

impl<R> CodeReader<R>
where
    R: io::Read,
{
    pub fn new(read: R, code_size: u32) -> Self {
        debug_assert!((1..=MAX_CODE_SIZE).contains(&code_size));

        Self {
            bs: BitReader::new(read),
            code_size,
            codes_read: 0,
        }
    }

    #[inline(always)]
    pub fn code_size(&self) -> u32 {
        self.code_size
    }

    #[inline(always)]
    pub fn set_code_size(&mut self, code_size: u32) {
        debug_assert!(code_size <= MAX_CODE_SIZE);
        self.code_size = code_size;
    }

    pub fn codes_read(&self) -> usize {
        self.codes_read
    }

    /// Reads the next `code_size`-bit code.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] when the underlying byte
    /// stream ends before enough bits are buffered.
    #[inline(always)]
    pub fn next_code(&mut self) -> io::Result<u16> {
        match self.bs.read_unsigned_var::<u16>(self.code_size) {
            Ok(code) => {
                self.codes_read += 1;
                Ok(code)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "next_code({}): code stream ended after {} codes",
                    self.code_size, self.codes_read
                ),
            )),
            Err(e) => Err(e),
        }
    }
}

impl<'a> CodeReader<io::Cursor<&'a [u8]>> {
    /// Reads codes straight from a flat byte slice, without sub-block framing.
    pub fn from_slice(buf: &'a [u8], code_size: u32) -> Self {
        Self::new(io::Cursor::new(buf), code_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_lsb_first() -> anyhow::Result<()> {
        // 3-bit codes 4, 1, 6, 5 -> 0b101_110_001_100
        let bits: u16 = 4 | (1 << 3) | (6 << 6) | (5 << 9);
        let data = bits.to_le_bytes();
        let mut reader = CodeReader::from_slice(&data, 3);

        assert_eq!(reader.next_code()?, 4);
        assert_eq!(reader.next_code()?, 1);
        assert_eq!(reader.next_code()?, 6);
        assert_eq!(reader.next_code()?, 5);
        assert_eq!(reader.codes_read(), 4);
        Ok(())
    }

    #[test]
    fn width_change_applies_to_next_code() -> anyhow::Result<()> {
        // a 3-bit code followed by a 9-bit code spanning two bytes
        let bits: u32 = 0b011 | (0x1A5 << 3);
        let data = bits.to_le_bytes();
        let mut reader = CodeReader::from_slice(&data[..2], 3);

        assert_eq!(reader.next_code()?, 0b011);
        reader.set_code_size(9);
        assert_eq!(reader.next_code()?, 0x1A5);
        Ok(())
    }

    #[test]
    fn exhaustion_is_unexpected_eof() {
        let data = [0xFFu8];
        let mut reader = CodeReader::from_slice(&data, 5);

        assert!(reader.next_code().is_ok());
        let err = reader.next_code().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
