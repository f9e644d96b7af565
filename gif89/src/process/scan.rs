use std::fmt::{Display, Formatter};

use anyhow::Result;
use log::Level::Warn;

use crate::log_or_err;
use crate::process::decode::DecoderState;
use crate::process::{EXTENSION_TAG, IMAGE_TAG, TRAILER_TAG};
use crate::structs::image::ImageDescriptor;
use crate::structs::screen::{ScreenDescriptor, Version};
use crate::utils::cursor::ByteCursor;
use crate::utils::errors::DecodeError;
use crate::utils::sub_block::{BlockTerminator, SubBlockReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionLabel {
    GraphicControl,
    Comment,
    PlainText,
    Application,
    Other(u8),
}

impl From<u8> for ExtensionLabel {
    fn from(label: u8) -> Self {
        match label {
            0xF9 => Self::GraphicControl,
            0xFE => Self::Comment,
            0x01 => Self::PlainText,
            0xFF => Self::Application,
            other => Self::Other(other),
        }
    }
}

impl Display for ExtensionLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtensionLabel::GraphicControl => write!(f, "graphic control"),
            ExtensionLabel::Comment => write!(f, "comment"),
            ExtensionLabel::PlainText => write!(f, "plain text"),
            ExtensionLabel::Application => write!(f, "application"),
            ExtensionLabel::Other(label) => write!(f, "unknown ({label:#04X})"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Chunk {
    Extension {
        label: ExtensionLabel,
        payload_len: usize,
    },
    Image {
        descriptor: ImageDescriptor,
        min_code_size: u8,
        /// Compressed bytes, sub-block framing excluded.
        data_len: usize,
        terminator: BlockTerminator,
    },
    Trailer,
    Unknown(u8),
}

/// Walks the chunk sequence without decoding pixel data.
///
/// Yields each chunk once and stops after the trailer or at the end of input.
/// The fail level decides, as for [`StreamDecoder`], which irregularities end
/// the walk with an error.
///
/// [`StreamDecoder`]: crate::process::decode::StreamDecoder
///
/// # Example
///
/// ```rust
/// use gif89::process::EXAMPLE_DATA;
/// use gif89::process::scan::{Chunk, ChunkScanner};
///
/// let scanner = ChunkScanner::new(EXAMPLE_DATA).unwrap();
/// let images = scanner
///     .filter(|chunk| matches!(chunk, Ok(Chunk::Image { .. })))
///     .count();
/// assert_eq!(images, 1);
/// ```
#[derive(Debug)]
pub struct ChunkScanner<'a> {
    cursor: ByteCursor<'a>,
    version: Version,
    screen: ScreenDescriptor,
    state: DecoderState,
    offset: usize,
    done: bool,
}

impl<'a> ChunkScanner<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        Self::with_fail_level(data, log::Level::Error)
    }

    pub fn with_fail_level(data: &'a [u8], fail_level: log::Level) -> Result<Self> {
        let state = DecoderState {
            fail_level,
            ..Default::default()
        };

        let mut cursor = ByteCursor::new(data);
        let version = Version::read(&mut cursor)?;
        let screen = ScreenDescriptor::read(&state, &mut cursor)?;

        Ok(Self {
            offset: cursor.position(),
            cursor,
            version,
            screen,
            state,
            done: false,
        })
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn screen(&self) -> &ScreenDescriptor {
        &self.screen
    }

    /// Byte offset of the chunk most recently yielded.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn scan_chunk(&mut self) -> Result<Option<Chunk>> {
        self.offset = self.cursor.position();

        let Ok(tag) = self.cursor.read_u8() else {
            self.done = true;
            log_or_err!(self.state, Warn, DecodeError::MissingTrailer(self.offset));
            return Ok(None);
        };

        let chunk = match tag {
            EXTENSION_TAG => {
                let label = self.cursor.read_u8().unwrap_or_default();
                Chunk::Extension {
                    label: label.into(),
                    payload_len: SubBlockReader::new(&mut self.cursor).skip(),
                }
            }
            IMAGE_TAG => {
                let Some(descriptor) = ImageDescriptor::read(&self.state, &mut self.cursor)? else {
                    self.done = true;
                    return Ok(None);
                };

                let min_code_size = self.cursor.read_u8().unwrap_or_default();
                let mut data = SubBlockReader::new(&mut self.cursor);
                let data_len = data.skip();

                Chunk::Image {
                    descriptor,
                    min_code_size,
                    data_len,
                    terminator: data.finish(),
                }
            }
            TRAILER_TAG => {
                self.done = true;
                Chunk::Trailer
            }
            tag => {
                log_or_err!(
                    self.state,
                    Warn,
                    DecodeError::UnknownChunk {
                        tag,
                        offset: self.offset
                    }
                );
                Chunk::Unknown(tag)
            }
        };

        Ok(Some(chunk))
    }
}

impl Iterator for ChunkScanner<'_> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.scan_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::EXAMPLE_DATA;

    #[test]
    fn lists_example_chunks() -> Result<()> {
        let mut scanner = ChunkScanner::new(EXAMPLE_DATA)?;
        assert_eq!(scanner.version(), Version::Gif89a);
        assert_eq!(scanner.screen().width, 2);

        let Some(Chunk::Extension { label, payload_len }) = scanner.next().transpose()? else {
            panic!("expected an extension");
        };
        assert_eq!(label, ExtensionLabel::GraphicControl);
        assert_eq!(payload_len, 4);
        assert_eq!(scanner.offset(), 19);

        let Some(Chunk::Image {
            descriptor,
            min_code_size,
            data_len,
            terminator,
        }) = scanner.next().transpose()?
        else {
            panic!("expected an image");
        };
        assert_eq!((descriptor.width, descriptor.height), (2, 2));
        assert_eq!(min_code_size, 2);
        assert_eq!(data_len, 2);
        assert_eq!(terminator, BlockTerminator::Clean);

        assert!(matches!(scanner.next().transpose()?, Some(Chunk::Trailer)));
        assert!(scanner.next().is_none());
        Ok(())
    }

    #[test]
    fn stops_at_end_of_input() -> Result<()> {
        let data = &EXAMPLE_DATA[..EXAMPLE_DATA.len() - 1];
        let chunks = ChunkScanner::new(data)?.collect::<Result<Vec<_>>>()?;
        assert_eq!(chunks.len(), 2);

        let strict = ChunkScanner::with_fail_level(data, Warn)?;
        let last = strict.last().unwrap();
        assert!(last.is_err());
        Ok(())
    }

    #[test]
    fn reports_unknown_tags() -> Result<()> {
        let mut data = EXAMPLE_DATA.to_vec();
        data.insert(19, 0x42);

        let chunks = ChunkScanner::new(&data)?.collect::<Result<Vec<_>>>()?;
        assert!(matches!(chunks[0], Chunk::Unknown(0x42)));
        assert_eq!(chunks.len(), 4);
        Ok(())
    }

    #[test]
    fn extension_labels() {
        assert_eq!(ExtensionLabel::from(0xFE), ExtensionLabel::Comment);
        assert_eq!(ExtensionLabel::from(0x01).to_string(), "plain text");
        assert_eq!(ExtensionLabel::from(0x7F).to_string(), "unknown (0x7F)");
    }
}
