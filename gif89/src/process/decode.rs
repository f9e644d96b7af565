use anyhow::Result;
use log::Level::{Error, Warn};
use log::{debug, trace};

use crate::log_or_err;
use crate::process::composite::{blit_indexed, blit_palette};
use crate::process::deinterlace::deinterlace;
use crate::process::lzw::{ImageData, LzwStatus, decode_image_data};
use crate::process::{EXTENSION_TAG, IMAGE_TAG, TRAILER_TAG};
use crate::structs::color_table::ColorTable;
use crate::structs::frame::Frame;
use crate::structs::image::ImageDescriptor;
use crate::structs::screen::{ScreenDescriptor, Version};
use crate::structs::surface::{Palette, PixelFormat, Surface};
use crate::utils::cursor::ByteCursor;
use crate::utils::errors::DecodeError;
use crate::utils::sub_block::{BlockTerminator, SubBlockReader};

/// Validation settings shared by the descriptor readers.
#[derive(Debug, Clone)]
pub struct DecoderState {
    pub fail_level: log::Level,
    /// Frames produced since the chunk sequence was last (re)started.
    pub counter: usize,
}

impl Default for DecoderState {
    fn default() -> Self {
        Self {
            fail_level: Error,
            counter: 0,
        }
    }
}

/// What the container tells a caller before any pixel is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: usize,
    pub height: usize,
    /// Frames carry palette indices.
    pub palette: bool,
    pub format: PixelFormat,
}

/// One composited frame, returned by [`StreamDecoder::decode`].
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame: Frame,
    /// The frame's color table with the transparent entry at alpha 0. This is
    /// the palette for interpreting an `Index8` destination.
    pub palette: Palette,
}

/// Decodes the frames of an in-memory stream one image chunk per call.
///
/// The decoder remembers where the previous call stopped. Once the trailer is
/// reached after two or more frames, the chunk sequence starts over, so an
/// animation loops forever; a single-frame stream stays exhausted instead.
///
/// # Example
///
/// ```rust
/// use gif89::process::EXAMPLE_DATA;
/// use gif89::process::decode::StreamDecoder;
/// use gif89::structs::surface::{PixelFormat, Surface};
///
/// let mut decoder = StreamDecoder::open(EXAMPLE_DATA).unwrap();
/// let header = decoder.header();
/// let mut surface = Surface::new(header.width, header.height, PixelFormat::Bgra8);
///
/// while let Some(report) = decoder.decode(&mut surface).unwrap() {
///     println!("frame {} at ({}, {})", report.frame.index, report.frame.left, report.frame.top);
/// }
/// ```
#[derive(Debug)]
pub struct StreamDecoder<'a> {
    cursor: ByteCursor<'a>,
    version: Version,
    screen: ScreenDescriptor,
    first_chunk: usize,
    exhausted: bool,
    state: DecoderState,

    index_canvas: Option<Surface>,
    color_canvas: Option<Surface>,
}

impl<'a> StreamDecoder<'a> {
    /// Reads the signature and the logical screen.
    ///
    /// Only a missing or wrong signature is fatal; a truncated screen is
    /// tolerated like any other non-conformance.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        Self::with_fail_level(data, Error)
    }

    /// Like [`open`](Self::open), with the fail level applied from the first
    /// byte on.
    ///
    /// - `log::Level::Error`: Only fail on Error level messages (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn with_fail_level(data: &'a [u8], fail_level: log::Level) -> Result<Self> {
        let state = DecoderState {
            fail_level,
            ..Default::default()
        };

        let mut cursor = ByteCursor::new(data);
        let version = Version::read(&mut cursor)?;
        let screen = ScreenDescriptor::read(&state, &mut cursor)?;

        debug!(
            "{version} screen {}x{}, global table: {}, background {}",
            screen.width,
            screen.height,
            screen.global_table.as_ref().map_or(0, ColorTable::len),
            screen.background_index
        );

        Ok(Self {
            first_chunk: cursor.position(),
            cursor,
            version,
            screen,
            exhausted: false,
            state,
            index_canvas: None,
            color_canvas: None,
        })
    }

    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: Only fail on Error level messages (default)
    /// - `log::Level::Warn`: Fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn screen(&self) -> &ScreenDescriptor {
        &self.screen
    }

    pub fn header(&self) -> ImageHeader {
        ImageHeader {
            width: self.screen.width as usize,
            height: self.screen.height as usize,
            palette: true,
            format: PixelFormat::Index8,
        }
    }

    /// Byte offset of the next chunk.
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    /// Frames produced since the chunk sequence was last (re)started.
    pub fn frames_decoded(&self) -> usize {
        self.state.counter
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Decodes the next image chunk.
    ///
    /// Returns `None` at the end of the chunk sequence. After a loop restart
    /// the following call yields the first frame again.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        while !self.exhausted {
            let offset = self.cursor.position();

            let Ok(tag) = self.cursor.read_u8() else {
                log_or_err!(self.state, Warn, DecodeError::MissingTrailer(offset));
                self.end_of_stream();
                return Ok(None);
            };

            match tag {
                EXTENSION_TAG => self.skip_extension(offset),
                IMAGE_TAG => {
                    if let Some(frame) = self.read_image(offset)? {
                        return Ok(Some(frame));
                    }
                }
                TRAILER_TAG => {
                    trace!("Trailer at offset {offset}");
                    self.end_of_stream();
                    return Ok(None);
                }
                tag => log_or_err!(self.state, Warn, DecodeError::UnknownChunk { tag, offset }),
            }
        }

        Ok(None)
    }

    /// Decodes the next frame and composites it onto the decoder's canvas,
    /// then copies the whole canvas into `dest`.
    ///
    /// The destination's pixel format selects the mode. `Index8` receives raw
    /// indices with the transparent index skipped, `Bgra8` receives palette
    /// colors with zero alpha skipped. Each mode keeps its own canvas, created
    /// at screen size on first use and composited over from then on.
    pub fn decode(&mut self, dest: &mut Surface) -> Result<Option<FrameReport>> {
        let Some(frame) = self.next_frame()? else {
            return Ok(None);
        };

        let (width, height) = (self.screen.width as usize, self.screen.height as usize);
        let format = dest.format();
        let palette = Palette::from_table(&frame.palette, frame.transparent_index);

        let canvas = match format {
            PixelFormat::Index8 => &mut self.index_canvas,
            PixelFormat::Bgra8 => &mut self.color_canvas,
        }
        .get_or_insert_with(|| Surface::new(width, height, format));

        let mut region = canvas.region(
            frame.left as usize,
            frame.top as usize,
            frame.width as usize,
            frame.height as usize,
        );

        match format {
            PixelFormat::Index8 => blit_indexed(
                &mut region,
                &frame.pixels,
                frame.width as usize,
                frame.transparent_index,
            ),
            PixelFormat::Bgra8 => {
                blit_palette(&mut region, &frame.pixels, frame.width as usize, &palette)
            }
        }

        dest.blit(0, 0, canvas)?;

        Ok(Some(FrameReport { frame, palette }))
    }

    fn end_of_stream(&mut self) {
        if self.state.counter >= 2 {
            debug!(
                "End of stream after {} frames, restarting at offset {}",
                self.state.counter, self.first_chunk
            );
            self.state.counter = 0;
            self.cursor.rewind_to(self.first_chunk);
        } else {
            debug!("End of stream after {} frames", self.state.counter);
            self.exhausted = true;
        }
    }

    fn skip_extension(&mut self, offset: usize) {
        let Ok(label) = self.cursor.read_u8() else {
            return;
        };

        let skipped = SubBlockReader::new(&mut self.cursor).skip();
        debug!("Extension {label:#04X} at offset {offset}, {skipped} bytes skipped");
    }

    /// `None` when the input ends inside the image descriptor.
    fn read_image(&mut self, offset: usize) -> Result<Option<Frame>> {
        let Some(descriptor) = ImageDescriptor::read(&self.state, &mut self.cursor)? else {
            return Ok(None);
        };

        let palette = match descriptor.local_table.as_ref().or(self.screen.global_table.as_ref()) {
            Some(table) => table.clone(),
            None => {
                log_or_err!(self.state, Warn, DecodeError::MissingColorTable(offset));
                ColorTable::grayscale()
            }
        };

        let samples = descriptor.samples();
        let mut pixels = vec![0; samples];

        let data = match decode_image_data(&mut self.cursor, &mut pixels, self.state.fail_level) {
            Ok(data) => data,
            Err(e) => {
                log_or_err!(self.state, Error, e);
                ImageData {
                    min_code_size: 0,
                    status: LzwStatus::Truncated(0),
                    terminator: BlockTerminator::Clean,
                }
            }
        };

        debug!(
            "Image {} at offset {offset}: {}x{} at ({}, {}), min code size {}, {:?}",
            self.state.counter,
            descriptor.width,
            descriptor.height,
            descriptor.left,
            descriptor.top,
            data.min_code_size,
            data.status
        );

        match data.status {
            LzwStatus::Complete(_) => {}
            LzwStatus::Truncated(produced) => log_or_err!(
                self.state,
                Warn,
                DecodeError::TruncatedImageData {
                    produced,
                    expected: samples,
                }
            ),
            LzwStatus::InvalidCode(produced) => log_or_err!(
                self.state,
                Warn,
                DecodeError::InvalidCode {
                    produced,
                    expected: samples,
                }
            ),
            LzwStatus::TableOverflow(produced) => {
                log_or_err!(self.state, Warn, DecodeError::TableOverflow(produced))
            }
        }

        match data.terminator {
            BlockTerminator::Clean => {}
            BlockTerminator::TrailingData { skipped } => {
                log_or_err!(self.state, Warn, DecodeError::TrailingSubBlocks(skipped))
            }
            BlockTerminator::Missing => {
                log_or_err!(self.state, Warn, DecodeError::MissingTerminator)
            }
        }

        if descriptor.interlaced() {
            pixels = deinterlace(&pixels, descriptor.width as usize, descriptor.height as usize);
        }

        let frame = Frame {
            index: self.state.counter,
            left: descriptor.left,
            top: descriptor.top,
            width: descriptor.width,
            height: descriptor.height,
            interlaced: descriptor.interlaced(),
            pixels,
            palette,
            transparent_index: Some(self.screen.background_index),
            status: data.status,
            terminator: data.terminator,
        };

        self.state.counter += 1;

        Ok(Some(frame))
    }
}
