use crate::process::lzw::LzwStatus;
use crate::structs::color_table::ColorTable;
use crate::utils::sub_block::BlockTerminator;

/// One decoded image chunk.
///
/// `pixels` holds `width * height` color indices in natural row order (already
/// deinterlaced). Pixels past the point where decoding stopped are zero.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Zero-based position of this image in the stream.
    pub index: usize,
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlaced: bool,
    pub pixels: Vec<u8>,
    /// Local table if the image has one, the global table otherwise.
    pub palette: ColorTable,
    pub transparent_index: Option<u8>,
    pub status: LzwStatus,
    pub terminator: BlockTerminator,
}

impl Frame {
    /// `true` when every pixel was produced and the data was properly terminated.
    pub fn is_clean(&self) -> bool {
        self.status.is_complete() && self.terminator == BlockTerminator::Clean
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let width = self.width as usize;
        &self.pixels[y * width..(y + 1) * width]
    }
}
