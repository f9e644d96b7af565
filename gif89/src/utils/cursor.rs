//! Bounds-checked read position over a borrowed byte buffer.

use crate::utils::errors::CursorError;

/// Read cursor over `data[start..end]`.
///
/// Every read checks the declared `end` and reports
/// [`CursorError::OutOfData`] instead of reading past it. Whether that is fatal
/// is up to the caller.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    start: usize,
    end: usize,
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            start: 0,
            end: data.len(),
            pos: 0,
        }
    }

    /// Cursor restricted to `data[start..end]`, both clamped to the buffer.
    pub fn with_range(data: &'a [u8], start: usize, end: usize) -> Self {
        let end = end.min(data.len());
        let start = start.min(end);

        Self {
            data,
            start,
            end,
            pos: start,
        }
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline(always)]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    /// Moves the read position back (or forward) to `pos`, clamped to the range.
    pub fn rewind_to(&mut self, pos: usize) {
        self.pos = pos.clamp(self.start, self.end);
    }

    #[inline(always)]
    fn require(&self, n: usize) -> Result<(), CursorError> {
        if n > self.remaining() {
            return Err(CursorError::OutOfData {
                requested: n,
                remaining: self.remaining(),
            });
        }

        Ok(())
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        self.require(1)?;
        let value = self.data[self.pos];
        self.pos += 1;

        Ok(value)
    }

    #[inline(always)]
    pub fn read_u16_le(&mut self) -> Result<u16, CursorError> {
        let bytes = self.slice(2)?;

        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn advance(&mut self, n: usize) -> Result<(), CursorError> {
        self.require(n)?;
        self.pos += n;

        Ok(())
    }

    /// Returns the next `n` bytes without consuming them.
    pub fn peek(&self, n: usize) -> Result<&'a [u8], CursorError> {
        self.require(n)?;

        Ok(&self.data[self.pos..self.pos + n])
    }

    /// Returns the next `n` bytes and consumes them.
    pub fn slice(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        let bytes = self.peek(n)?;
        self.pos += n;

        Ok(bytes)
    }

    /// Consumes and returns at most `n` bytes.
    pub fn take_up_to(&mut self, n: usize) -> &'a [u8] {
        let n = n.min(self.remaining());
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian() {
        let mut cursor = ByteCursor::new(&[0x34, 0x12, 0xFF]);
        assert_eq!(cursor.read_u16_le(), Ok(0x1234));
        assert_eq!(cursor.read_u8(), Ok(0xFF));
        assert!(cursor.is_empty());
    }

    #[test]
    fn never_reads_past_end() {
        let data = [1u8, 2, 3, 4, 5];
        let mut cursor = ByteCursor::with_range(&data, 1, 3);

        assert_eq!(cursor.remaining(), 2);
        assert_eq!(
            cursor.slice(3),
            Err(CursorError::OutOfData {
                requested: 3,
                remaining: 2
            })
        );
        // failed reads leave the position untouched
        assert_eq!(cursor.position(), 1);

        assert_eq!(cursor.slice(2), Ok(&data[1..3]));
        assert!(cursor.read_u8().is_err());
        assert!(cursor.read_u16_le().is_err());
        assert_eq!(cursor.take_up_to(10), &[] as &[u8]);
    }

    #[test]
    fn peek_and_rewind() {
        let data = [9u8, 8, 7];
        let mut cursor = ByteCursor::new(&data);

        assert_eq!(cursor.peek(2), Ok(&data[..2]));
        assert_eq!(cursor.position(), 0);

        cursor.advance(3).unwrap();
        assert!(cursor.advance(1).is_err());

        cursor.rewind_to(1);
        assert_eq!(cursor.read_u8(), Ok(8));

        cursor.rewind_to(100);
        assert_eq!(cursor.position(), 3);
    }
}
