//! Variable-width LZW decompression.
//!
//! Codes start at `data_size + 1` bits and widen by one bit each time the
//! dictionary fills the current width, up to 12 bits (4096 entries). Two codes
//! are reserved: `clear = 1 << data_size` resets dictionary and width,
//! `end = clear + 1` finishes the image.
//!
//! A dictionary entry is stored as `(prefix code, suffix byte)`, so a string is
//! recovered back to front by walking the prefix chain. The bytes are pushed on
//! a stack while walking and popped into the output, which restores forward
//! order.

use std::io;

use log::{debug, trace};

use crate::utils::bitstream_io::{CodeReader, MAX_CODE_SIZE};
use crate::utils::cursor::ByteCursor;
use crate::utils::errors::DecodeError;
use crate::utils::sub_block::{BlockTerminator, SubBlockReader};

/// Dictionary capacity at the 12-bit limit.
pub const MAX_CODES: usize = 1 << MAX_CODE_SIZE;

/// Longest string plus one pending byte of the KwKwK case.
const STACK_SIZE: usize = MAX_CODES + 1;

pub const MIN_DATA_SIZE: u8 = 2;
pub const MAX_DATA_SIZE: u8 = 8;

const _: () = assert!(MAX_CODES == 4096 && STACK_SIZE == 4097);
const _: () = assert!((1 << MAX_DATA_SIZE) + 2 < MAX_CODES);

/// How a call to [`LzwDecoder::decode`] ended.
///
/// Each variant carries the number of bytes written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzwStatus {
    /// The output buffer was filled.
    Complete(usize),
    /// An end code arrived or the code stream ran dry before the buffer was full.
    Truncated(usize),
    /// A code beyond the next free dictionary slot was read.
    InvalidCode(usize),
    /// The dictionary was full and no clear code followed (strict mode only).
    TableOverflow(usize),
}

impl LzwStatus {
    pub fn produced(self) -> usize {
        match self {
            LzwStatus::Complete(n)
            | LzwStatus::Truncated(n)
            | LzwStatus::InvalidCode(n)
            | LzwStatus::TableOverflow(n) => n,
        }
    }

    pub fn is_complete(self) -> bool {
        matches!(self, LzwStatus::Complete(_))
    }
}

#[derive(Debug)]
struct CodeTable {
    prefix: [u16; MAX_CODES],
    suffix: [u8; MAX_CODES],
}

impl CodeTable {
    fn new(clear_code: u16) -> Box<Self> {
        let mut table = Box::new(Self {
            prefix: [0; MAX_CODES],
            suffix: [0; MAX_CODES],
        });

        for code in 0..clear_code as usize {
            table.suffix[code] = code as u8;
        }

        table
    }
}

#[derive(Debug)]
struct DecodeStack {
    bytes: [u8; STACK_SIZE],
    top: usize,
}

impl DecodeStack {
    fn new() -> Box<Self> {
        Box::new(Self {
            bytes: [0; STACK_SIZE],
            top: 0,
        })
    }

    #[inline(always)]
    fn push(&mut self, byte: u8) {
        // prefix chains strictly decrease, so STACK_SIZE is never exceeded
        if let Some(slot) = self.bytes.get_mut(self.top) {
            *slot = byte;
            self.top += 1;
        }
    }

    #[inline(always)]
    fn pop(&mut self) -> Option<u8> {
        self.top = self.top.checked_sub(1)?;
        Some(self.bytes[self.top])
    }

    fn clear(&mut self) {
        self.top = 0;
    }
}

enum Step {
    Continue,
    End,
    Invalid,
    Overflow,
}

/// Dictionary state machine of the GIF flavour of LZW.
///
/// State survives between [`decode`](Self::decode) calls, so one image can be
/// decoded into several output slices in sequence.
#[derive(Debug)]
pub struct LzwDecoder {
    table: Box<CodeTable>,
    stack: Box<DecodeStack>,

    data_size: u8,
    clear_code: u16,
    end_code: u16,
    available: u16,
    code_size: u32,
    old_code: Option<u16>,
    first: u8,

    pub fail_level: log::Level,
}

impl LzwDecoder {
    pub fn new(data_size: u8) -> Result<Self, DecodeError> {
        if !(MIN_DATA_SIZE..=MAX_DATA_SIZE).contains(&data_size) {
            return Err(DecodeError::InvalidMinCodeSize(data_size));
        }

        let clear_code = 1u16 << data_size;

        Ok(Self {
            table: CodeTable::new(clear_code),
            stack: DecodeStack::new(),
            data_size,
            clear_code,
            end_code: clear_code + 1,
            available: clear_code + 2,
            code_size: data_size as u32 + 1,
            old_code: None,
            first: 0,
            fail_level: log::Level::Error,
        })
    }

    /// Sets the failure level for a full dictionary.
    ///
    /// - `log::Level::Error`: keep decoding with a frozen dictionary (default)
    /// - `log::Level::Warn`: stop with [`LzwStatus::TableOverflow`] (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    pub fn data_size(&self) -> u8 {
        self.data_size
    }

    pub fn clear_code(&self) -> u16 {
        self.clear_code
    }

    pub fn end_code(&self) -> u16 {
        self.end_code
    }

    /// Next dictionary slot to be assigned.
    pub fn available(&self) -> u16 {
        self.available
    }

    /// Width in bits of the next code to read.
    pub fn code_size(&self) -> u32 {
        self.code_size
    }

    /// Restores the state that follows a clear code.
    pub fn reset(&mut self) {
        self.code_size = self.data_size as u32 + 1;
        self.available = self.clear_code + 2;
        self.old_code = None;
    }

    /// Decodes codes from `codes` until `out` is full or the data stops.
    pub fn decode<R: io::Read>(&mut self, codes: &mut CodeReader<R>, out: &mut [u8]) -> LzwStatus {
        codes.set_code_size(self.code_size);

        let mut produced = 0;

        while produced < out.len() {
            if let Some(byte) = self.stack.pop() {
                out[produced] = byte;
                produced += 1;
                continue;
            }

            let code = match codes.next_code() {
                Ok(code) => code,
                Err(e) => {
                    debug!("{e}");
                    return LzwStatus::Truncated(produced);
                }
            };

            match self.step(code) {
                Step::Continue => {}
                Step::End => {
                    debug!("End code after {produced} of {} bytes", out.len());
                    return LzwStatus::Truncated(produced);
                }
                Step::Invalid => {
                    debug!(
                        "Invalid code {code} with {} available after {produced} bytes",
                        self.available
                    );
                    return LzwStatus::InvalidCode(produced);
                }
                Step::Overflow => return LzwStatus::TableOverflow(produced),
            }

            if codes.code_size() != self.code_size {
                codes.set_code_size(self.code_size);
            }
        }

        LzwStatus::Complete(produced)
    }

    /// Interprets one code, leaving its string on the stack.
    fn step(&mut self, code: u16) -> Step {
        if code == self.clear_code {
            trace!("Clear code, dictionary reset");
            self.reset();
            return Step::Continue;
        }

        if code == self.end_code {
            return Step::End;
        }

        // lenient: `code == available` is still accepted as the KwKwK case
        if code > self.available {
            return Step::Invalid;
        }

        let Some(old_code) = self.old_code else {
            let byte = self.table.suffix[code as usize];
            self.stack.push(byte);
            self.old_code = Some(code);
            self.first = byte;
            return Step::Continue;
        };

        let in_code = code;
        let mut code = code;

        if code >= self.available {
            self.stack.push(self.first);
            code = old_code;
        }

        while code >= self.clear_code {
            self.stack.push(self.table.suffix[code as usize]);
            code = self.table.prefix[code as usize];
        }

        self.first = self.table.suffix[code as usize];

        if (self.available as usize) < MAX_CODES {
            self.stack.push(self.first);

            let slot = self.available as usize;
            self.table.prefix[slot] = old_code;
            self.table.suffix[slot] = self.first;
            self.available += 1;

            if self.available == 1 << self.code_size && self.code_size < MAX_CODE_SIZE {
                self.code_size += 1;
                trace!(
                    "Code size grows to {} bits at {} entries",
                    self.code_size, self.available
                );
            }
        } else if log::Level::Warn <= self.fail_level {
            self.stack.clear();
            return Step::Overflow;
        } else {
            self.stack.push(self.first);
        }

        self.old_code = Some(in_code);

        Step::Continue
    }
}

/// Outcome of decoding one image's compressed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageData {
    pub min_code_size: u8,
    pub status: LzwStatus,
    pub terminator: BlockTerminator,
}

/// Decodes the minimum code size byte and the sub-blocks that follow it.
///
/// The cursor always ends up behind the data's terminator (or at the end of
/// input), even when the minimum code size is rejected.
pub fn decode_image_data(
    cursor: &mut ByteCursor,
    out: &mut [u8],
    fail_level: log::Level,
) -> Result<ImageData, DecodeError> {
    let Ok(min_code_size) = cursor.read_u8() else {
        return Ok(ImageData {
            min_code_size: 0,
            status: LzwStatus::Truncated(0),
            terminator: BlockTerminator::Missing,
        });
    };

    let mut sub_blocks = SubBlockReader::new(cursor);

    let mut decoder = match LzwDecoder::new(min_code_size) {
        Ok(decoder) => decoder,
        Err(e) => {
            sub_blocks.skip();
            return Err(e);
        }
    };
    decoder.set_fail_level(fail_level);

    let status = {
        let mut codes = CodeReader::new(&mut sub_blocks, decoder.code_size());
        decoder.decode(&mut codes, out)
    };

    Ok(ImageData {
        min_code_size,
        status,
        terminator: sub_blocks.finish(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct BitWriter {
        out: Vec<u8>,
        acc: u32,
        bits: u32,
    }

    impl BitWriter {
        fn write(&mut self, code: u16, size: u32) {
            self.acc |= (code as u32) << self.bits;
            self.bits += size;
            while self.bits >= 8 {
                self.out.push(self.acc as u8);
                self.acc >>= 8;
                self.bits -= 8;
            }
        }

        fn finish(mut self) -> Vec<u8> {
            if self.bits > 0 {
                self.out.push(self.acc as u8);
            }
            self.out
        }
    }

    /// Reference GIF LZW encoder, codes only (no sub-block framing).
    pub(crate) fn lzw_encode(data: &[u8], data_size: u8) -> Vec<u8> {
        let clear = 1u16 << data_size;
        let end = clear + 1;
        let reset_size = data_size as u32 + 1;

        let mut writer = BitWriter::default();
        let mut dict: HashMap<(u16, u8), u16> = HashMap::new();
        let mut code_size = reset_size;
        let mut next = clear + 2;

        writer.write(clear, code_size);

        let Some((&head, tail)) = data.split_first() else {
            writer.write(end, code_size);
            return writer.finish();
        };

        let mut prefix = head as u16;
        for &k in tail {
            if let Some(&code) = dict.get(&(prefix, k)) {
                prefix = code;
                continue;
            }

            writer.write(prefix, code_size);
            if next == 1 << code_size && code_size < MAX_CODE_SIZE {
                code_size += 1;
            }

            if (next as usize) < MAX_CODES {
                dict.insert((prefix, k), next);
                next += 1;
            } else {
                writer.write(clear, code_size);
                dict.clear();
                code_size = reset_size;
                next = clear + 2;
            }

            prefix = k as u16;
        }

        writer.write(prefix, code_size);
        if next == 1 << code_size && code_size < MAX_CODE_SIZE {
            code_size += 1;
        }
        writer.write(end, code_size);

        writer.finish()
    }

    /// Frames `codes` as sub-blocks of at most `block_len` bytes plus terminator.
    pub(crate) fn sub_blocks(codes: &[u8], block_len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(codes.len() + codes.len() / block_len + 2);
        for block in codes.chunks(block_len) {
            out.push(block.len() as u8);
            out.extend_from_slice(block);
        }
        out.push(0);
        out
    }

    /// Deterministic index sequence drawn from `1 << data_size` symbols.
    pub(crate) fn pseudo_random_indices(len: usize, data_size: u8, seed: u32) -> Vec<u8> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                ((state >> 16) % (1u32 << data_size)) as u8
            })
            .collect()
    }

    fn decode_framed(framed: &[u8], data_size: u8, samples: usize) -> (Vec<u8>, LzwStatus) {
        let mut cursor = ByteCursor::new(framed);
        let mut sub_blocks = SubBlockReader::new(&mut cursor);
        let mut decoder = LzwDecoder::new(data_size).unwrap();
        let mut codes = CodeReader::new(&mut sub_blocks, decoder.code_size());

        let mut out = vec![0; samples];
        let status = decoder.decode(&mut codes, &mut out);
        (out, status)
    }

    /// Feeds codes one by one and collects the emitted bytes.
    fn feed(decoder: &mut LzwDecoder, codes: &[u16]) -> Vec<u8> {
        let mut out = Vec::new();
        for &code in codes {
            assert!(matches!(decoder.step(code), Step::Continue), "code {code}");
            while let Some(byte) = decoder.stack.pop() {
                out.push(byte);
            }
        }
        out
    }

    #[test]
    fn reference_encoder_known_vector() {
        // four pixels of alternating colour, minimum code size 2
        let codes = lzw_encode(&[0, 1, 0, 1], 2);
        assert_eq!(codes, [0x44, 0x5C]);
    }

    #[test]
    fn roundtrip_all_data_sizes() {
        for data_size in MIN_DATA_SIZE..=MAX_DATA_SIZE {
            for (len, seed) in [(1, 7), (97, 11), (5_000, 23), (40_000, 42)] {
                let indices = pseudo_random_indices(len, data_size, seed);
                let framed = sub_blocks(&lzw_encode(&indices, data_size), 255);

                let (out, status) = decode_framed(&framed, data_size, indices.len());
                assert_eq!(status, LzwStatus::Complete(len), "data_size {data_size}");
                assert!(out == indices, "data_size {data_size}, len {len}");
            }
        }
    }

    #[test]
    fn roundtrip_repetitive_runs() {
        // long runs exercise the KwKwK path and deep prefix chains
        let mut indices = vec![3u8; 10_000];
        indices.extend((0..10_000).map(|i| ((i * 37 + 123) % 256) as u8));

        let framed = sub_blocks(&lzw_encode(&indices, 8), 200);
        let (out, status) = decode_framed(&framed, 8, indices.len());
        assert_eq!(status, LzwStatus::Complete(indices.len()));
        assert!(out == indices);
    }

    #[test]
    fn kwkwk_code() {
        let mut decoder = LzwDecoder::new(2).unwrap();

        // 1, then code 6 before it exists: "1" + "1"
        assert_eq!(feed(&mut decoder, &[4, 1, 6]), [1, 1, 1]);
        assert_eq!(decoder.available(), 7);
        assert_eq!(feed(&mut decoder, &[6]), [1, 1]);
        assert_eq!(decoder.available(), 8);
        assert_eq!(decoder.code_size(), 4);
    }

    #[test]
    fn width_grows_exactly_at_power_of_two() {
        let mut decoder = LzwDecoder::new(8).unwrap();
        feed(&mut decoder, &[256, 0]);
        assert_eq!(decoder.available(), 258);

        let mut crossings = Vec::new();
        while (decoder.available() as usize) < MAX_CODES {
            let before = decoder.code_size();
            feed(&mut decoder, &[0]);

            let available = decoder.available() as u32;
            if available == 1 << before && before < MAX_CODE_SIZE {
                assert_eq!(decoder.code_size(), before + 1);
                crossings.push((available, decoder.code_size()));
            } else {
                assert_eq!(decoder.code_size(), before, "at {available}");
            }
        }

        assert_eq!(crossings, [(512, 10), (1024, 11), (2048, 12)]);
        assert_eq!(decoder.code_size(), 12);

        // a full table keeps decoding at 12 bits without new entries
        assert_eq!(feed(&mut decoder, &[5]), [5]);
        assert_eq!(decoder.available() as usize, MAX_CODES);
        assert_eq!(decoder.code_size(), 12);
    }

    #[test]
    fn width_crossings_in_bitstream() {
        // enough distinct pairs to push a 2-bit alphabet past 12-bit codes
        let indices = pseudo_random_indices(60_000, 2, 99);
        let codes = lzw_encode(&indices, 2);

        let mut reader = CodeReader::from_slice(&codes, 3);
        let mut decoder = LzwDecoder::new(2).unwrap();
        let mut out = vec![0; indices.len()];

        let mut widths = Vec::new();
        let mut produced = 0;
        while produced < out.len() {
            let status = decoder.decode(&mut reader, &mut out[produced..produced + 1]);
            produced += status.produced();
            if widths.last() != Some(&decoder.code_size()) {
                widths.push(decoder.code_size());
            }
            if !status.is_complete() {
                break;
            }
        }

        assert_eq!(produced, indices.len());
        assert!(out == indices);
        assert!(widths.starts_with(&[3, 4, 5, 6, 7, 8, 9, 10, 11, 12]));
    }

    #[test]
    fn clear_code_restarts_dictionary() {
        let mut decoder = LzwDecoder::new(2).unwrap();
        let before = feed(&mut decoder, &[4, 1, 6, 6, 2, 3]);
        assert_eq!(before, [1, 1, 1, 1, 1, 2, 3]);
        assert_eq!(decoder.code_size(), 4);

        let after = feed(&mut decoder, &[4]);
        assert!(after.is_empty());
        assert_eq!(decoder.code_size(), 3);
        assert_eq!(decoder.available(), 6);

        let mut fresh = LzwDecoder::new(2).unwrap();
        let codes = [0, 2, 6, 7, 3];
        assert_eq!(feed(&mut decoder, &codes), feed(&mut fresh, &codes));
        assert_eq!(decoder.available(), fresh.available());
        assert_eq!(decoder.code_size(), fresh.code_size());
    }

    #[test]
    fn end_code_truncates() {
        // clear, 1, end, then a code that must never be read
        let mut writer = BitWriter::default();
        for code in [4, 1, 5, 2] {
            writer.write(code, 3);
        }
        let framed = sub_blocks(&writer.finish(), 255);

        let (out, status) = decode_framed(&framed, 2, 4);
        assert_eq!(status, LzwStatus::Truncated(1));
        assert_eq!(out, [1, 0, 0, 0]);
    }

    #[test]
    fn exhausted_stream_truncates() {
        let indices = pseudo_random_indices(500, 4, 3);
        let codes = lzw_encode(&indices, 4);
        let framed = sub_blocks(&codes[..codes.len() / 2], 255);

        let (out, status) = decode_framed(&framed, 4, indices.len());
        let LzwStatus::Truncated(n) = status else {
            panic!("unexpected status {status:?}");
        };
        assert!(n > 0 && n < indices.len());
        assert_eq!(out[..n], indices[..n]);
        assert!(out[n..].iter().all(|&b| b == 0));
    }

    #[test]
    fn code_past_available_is_invalid() {
        let mut writer = BitWriter::default();
        // available is 6 after the first code, 7 is out of range
        for code in [4, 1, 7] {
            writer.write(code, 3);
        }
        let framed = sub_blocks(&writer.finish(), 255);

        let (out, status) = decode_framed(&framed, 2, 4);
        assert_eq!(status, LzwStatus::InvalidCode(1));
        assert_eq!(out, [1, 0, 0, 0]);
    }

    #[test]
    fn full_table_stops_when_strict() {
        let mut decoder = LzwDecoder::new(8).unwrap();
        decoder.set_fail_level(log::Level::Warn);
        feed(&mut decoder, &[256, 0]);
        while (decoder.available() as usize) < MAX_CODES {
            feed(&mut decoder, &[0]);
        }

        assert!(matches!(decoder.step(7), Step::Overflow));
    }

    #[test]
    fn rejects_bad_min_code_size() {
        assert_eq!(
            LzwDecoder::new(1).unwrap_err(),
            DecodeError::InvalidMinCodeSize(1)
        );
        assert_eq!(
            LzwDecoder::new(9).unwrap_err(),
            DecodeError::InvalidMinCodeSize(9)
        );
    }

    #[test]
    fn image_data_reports_terminator() -> anyhow::Result<()> {
        let mut data = vec![2];
        data.extend(sub_blocks(&lzw_encode(&[0, 1, 0, 1], 2), 255));
        data.push(0x3B);

        let mut cursor = ByteCursor::new(&data);
        let mut out = [0u8; 4];
        let image = decode_image_data(&mut cursor, &mut out, log::Level::Error)?;

        assert_eq!(image.min_code_size, 2);
        assert_eq!(image.status, LzwStatus::Complete(4));
        assert_eq!(image.terminator, BlockTerminator::Clean);
        assert_eq!(out, [0, 1, 0, 1]);
        assert_eq!(cursor.read_u8()?, 0x3B);
        Ok(())
    }

    #[test]
    fn image_data_skips_rejected_blocks() {
        let data = [12, 2, 0xAA, 0xBB, 0, 0x3B];
        let mut cursor = ByteCursor::new(&data);
        let mut out = [0u8; 4];

        let err = decode_image_data(&mut cursor, &mut out, log::Level::Error).unwrap_err();
        assert_eq!(err, DecodeError::InvalidMinCodeSize(12));
        assert_eq!(cursor.read_u8(), Ok(0x3B));
    }
}
