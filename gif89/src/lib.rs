#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Decoder core for GIF87a and GIF89a streams.
//!
//! ### Stream Organization
//!
//! **Header**: signature, logical screen descriptor and optional global color table.
//! **Chunks**: extensions (`0x21`), images (`0x2C`) and the trailer (`0x3B`).
//! Extension payloads and image data are stored as length-prefixed sub-blocks.
//!
//! ### Image Data
//!
//! Indices are LZW compressed with codes of 3 to 12 bits, packed LSB first.
//! Interlaced images transmit their rows in four passes.
//!
//! ### Leniency
//!
//! Real-world encoders are often sloppy. Truncated descriptors, short or
//! unterminated image data and invalid codes end the affected image early
//! instead of failing the stream; pixels that were not produced stay zero.
//! Every such case is routed through a fail level, so strict callers can turn
//! them into errors.
//!
//! ## Quick Start
//!
//! 1. Open a stream with [`process::decode::StreamDecoder`]
//! 2. Pull frames with [`next_frame`](process::decode::StreamDecoder::next_frame),
//!    or composite them into a [`structs::surface::Surface`] with
//!    [`decode`](process::decode::StreamDecoder::decode)
//!
//! ```rust
//! use gif89::process::{decode::StreamDecoder, EXAMPLE_DATA};
//!
//! let mut decoder = StreamDecoder::open(EXAMPLE_DATA)?;
//! println!("{}x{}", decoder.screen().width, decoder.screen().height);
//!
//! while let Some(frame) = decoder.next_frame()? {
//!     println!("frame {}: {} indices, clean: {}", frame.index, frame.pixels.len(), frame.is_clean());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::structs::screen::{SIGNATURE_LEN, Version};

/// Stream processing.
///
/// 1. **LZW** ([`process::lzw`]): Code table state machine and image data decoding.
///
/// 2. **Deinterlacing** ([`process::deinterlace`]): Four-pass row reordering.
///
/// 3. **Compositing** ([`process::composite`]): Indexed and palette blits.
///
/// 4. **Decoding** ([`process::decode`]): Chunk dispatch, frames and looping.
///
/// 5. **Scanning** ([`process::scan`]): Chunk listing without pixel decoding.
pub mod process;

/// Data structures representing format components.
///
/// - **Screen** ([`structs::screen`]): Signature and logical screen descriptor
/// - **Images** ([`structs::image`]): Image descriptors
/// - **Color Tables** ([`structs::color_table`]): Global and local tables
/// - **Frames** ([`structs::frame`]): Decoded images
/// - **Surfaces** ([`structs::surface`]): Destination pixels and palettes
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Cursor** ([`utils::cursor`]): Bounds-checked byte reading
/// - **Sub-blocks** ([`utils::sub_block`]): Length-prefixed block sequences
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Variable-width code reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;

/// Recognizes the GIF signature at the start of `data`.
///
/// ```rust
/// use gif89::structs::screen::Version;
///
/// assert_eq!(gif89::probe(b"GIF89a\x01\x00"), Some(Version::Gif89a));
/// assert_eq!(gif89::probe(b"\x89PNG\r\n"), None);
/// ```
pub fn probe(data: &[u8]) -> Option<Version> {
    data.get(..SIGNATURE_LEN).and_then(Version::from_signature)
}

#[test]
fn probe_needs_full_signature() {
    assert_eq!(probe(b"GIF87a"), Some(Version::Gif87a));
    assert_eq!(probe(b"GIF89"), None);
    assert_eq!(probe(b"gif89a"), None);
}
