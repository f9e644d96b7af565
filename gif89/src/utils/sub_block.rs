//! Length-prefixed sub-block sequences.
//!
//! Image data and extension payloads are stored as `{len: u8, len bytes}`
//! groups, ended by a group with `len == 0`. [`SubBlockReader`] flattens such a
//! sequence into a byte stream and leaves the cursor behind the terminator.

use std::io;

use crate::utils::cursor::ByteCursor;

/// How a sub-block sequence ended once the reader was finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTerminator {
    /// The zero-length block directly followed the consumed data.
    Clean,
    /// More non-empty blocks had to be skipped before the terminator.
    TrailingData { skipped: usize },
    /// The input ended before a zero-length block was seen.
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockState {
    Data,
    Terminated,
    Exhausted,
}

/// Byte-at-a-time pull interface over a sub-block sequence.
///
/// Also implements [`io::Read`]; the end of the sequence reads as `Ok(0)`.
#[derive(Debug)]
pub struct SubBlockReader<'c, 'a> {
    cursor: &'c mut ByteCursor<'a>,
    block_remaining: usize,
    state: BlockState,
    blocks: usize,
}

impl<'c, 'a> SubBlockReader<'c, 'a> {
    /// `cursor` must be positioned at the first length byte.
    pub fn new(cursor: &'c mut ByteCursor<'a>) -> Self {
        Self {
            cursor,
            block_remaining: 0,
            state: BlockState::Data,
            blocks: 0,
        }
    }

    /// Number of non-empty sub-blocks entered so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    /// Moves to the next non-empty block. Returns `false` at the end of data.
    fn refill(&mut self) -> bool {
        while self.block_remaining == 0 {
            if self.state != BlockState::Data {
                return false;
            }

            match self.cursor.read_u8() {
                Ok(0) => self.state = BlockState::Terminated,
                Ok(len) => {
                    let len = len as usize;
                    if len > self.cursor.remaining() {
                        log::debug!(
                            "Sub-block at offset {} claims {len} bytes, only {} remain",
                            self.cursor.position() - 1,
                            self.cursor.remaining()
                        );
                    }
                    // a short final block is read as far as it goes
                    self.block_remaining = len.min(self.cursor.remaining());
                    self.blocks += 1;
                }
                Err(_) => self.state = BlockState::Exhausted,
            }
        }

        true
    }

    /// Returns the next data byte, or `None` once the sequence has ended.
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        if !self.refill() {
            return None;
        }

        let byte = self.cursor.read_u8().ok()?;
        self.block_remaining -= 1;

        Some(byte)
    }

    /// Discards the rest of the sequence, including the terminator.
    ///
    /// Returns the number of data bytes skipped.
    pub fn skip(&mut self) -> usize {
        let mut skipped = 0;

        while self.refill() {
            skipped += self.cursor.take_up_to(self.block_remaining).len();
            self.block_remaining = 0;
        }

        skipped
    }

    /// Consumes whatever is left of the sequence and reports how it ended.
    ///
    /// Unread bytes of the block currently being read do not count as trailing
    /// data; whole blocks after it do.
    pub fn finish(mut self) -> BlockTerminator {
        if self.state == BlockState::Data {
            self.cursor.take_up_to(self.block_remaining);
            self.block_remaining = 0;
        }

        let skipped = self.skip();

        match self.state {
            BlockState::Exhausted => BlockTerminator::Missing,
            _ if skipped > 0 => BlockTerminator::TrailingData { skipped },
            _ => BlockTerminator::Clean,
        }
    }
}

impl io::Read for SubBlockReader<'_, '_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || !self.refill() {
            return Ok(0);
        }

        let bytes = self
            .cursor
            .take_up_to(self.block_remaining.min(buf.len()));
        buf[..bytes.len()].copy_from_slice(bytes);
        self.block_remaining -= bytes.len();

        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn flattens_blocks() {
        let data = [3, 1, 2, 3, 2, 4, 5, 0, 0xAA];
        let mut cursor = ByteCursor::new(&data);
        let mut reader = SubBlockReader::new(&mut cursor);

        let bytes = std::iter::from_fn(|| reader.next_byte()).collect::<Vec<_>>();
        assert_eq!(bytes, [1, 2, 3, 4, 5]);
        assert_eq!(reader.blocks(), 2);
        assert_eq!(reader.finish(), BlockTerminator::Clean);

        // the cursor resumes right after the terminator
        assert_eq!(cursor.read_u8(), Ok(0xAA));
    }

    #[test]
    fn read_impl_stops_at_terminator() -> anyhow::Result<()> {
        let data = [2, 7, 8, 1, 9, 0, 0x3B];
        let mut cursor = ByteCursor::new(&data);
        let mut reader = SubBlockReader::new(&mut cursor);

        let mut out = Vec::new();
        reader.read_to_end(&mut out)?;
        assert_eq!(out, [7, 8, 9]);
        assert_eq!(reader.read(&mut [0u8; 4])?, 0);
        assert_eq!(reader.finish(), BlockTerminator::Clean);
        assert_eq!(cursor.position(), 6);
        Ok(())
    }

    #[test]
    fn finish_reports_trailing_blocks() {
        let data = [2, 1, 2, 3, 9, 9, 9, 0, 0x2C];
        let mut cursor = ByteCursor::new(&data);
        let mut reader = SubBlockReader::new(&mut cursor);

        assert_eq!(reader.next_byte(), Some(1));
        assert_eq!(
            reader.finish(),
            BlockTerminator::TrailingData { skipped: 3 }
        );
        assert_eq!(cursor.read_u8(), Ok(0x2C));
    }

    #[test]
    fn finish_reports_missing_terminator() {
        // second block claims 5 bytes but only 2 are present
        let data = [1, 1, 5, 2, 3];
        let mut cursor = ByteCursor::new(&data);
        let mut reader = SubBlockReader::new(&mut cursor);

        let bytes = std::iter::from_fn(|| reader.next_byte()).collect::<Vec<_>>();
        assert_eq!(bytes, [1, 2, 3]);
        assert_eq!(reader.finish(), BlockTerminator::Missing);
        assert!(cursor.is_empty());
    }

    #[test]
    fn skip_extension_payload() {
        let data = [4, b'a', b'b', b'c', b'd', 1, b'e', 0, 0x3B];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(SubBlockReader::new(&mut cursor).skip(), 5);
        assert_eq!(cursor.read_u8(), Ok(0x3B));
    }
}
