/// LZW decompression of image data.
///
/// Provides the [`LzwDecoder`](lzw::LzwDecoder) state machine and
/// [`decode_image_data`](lzw::decode_image_data), which runs it over one
/// image's sub-block sequence.
pub mod lzw;

/// Interlaced row order.
pub mod deinterlace;

/// Writing decoded indices into a destination surface, raw or through a
/// palette.
pub mod composite;

/// Chunk dispatch and multi-frame decoding.
///
/// Provides the [`StreamDecoder`](decode::StreamDecoder), which turns a whole
/// input buffer into [`Frame`](crate::structs::frame::Frame)s one image chunk at
/// a time.
pub mod decode;

/// Chunk listing without pixel decoding.
///
/// Provides the [`ChunkScanner`](scan::ChunkScanner) iterator.
pub mod scan;

pub const EXTENSION_TAG: u8 = 0x21;
pub const IMAGE_TAG: u8 = 0x2C;
pub const TRAILER_TAG: u8 = 0x3B;

/// 2x2 GIF89a with a black and white global table, a graphic control
/// extension and one image holding indices `[0, 1, 0, 1]`.
pub const EXAMPLE_DATA: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x02, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x02, 0x44, 0x5C, 0x00, 0x3B,
];
