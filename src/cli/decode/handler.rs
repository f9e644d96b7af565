use std::path::PathBuf;

use anyhow::{Result, anyhow};
use indicatif::ProgressBar;
use log::Level;

use super::decoder_thread::DecodedFrame;
use super::output::{frame_path, manifest_path, write_frame_file};
use crate::cli::command::{DecodeMode, ImageFormat};
use crate::manifest::{FrameInfo, Manifest, ScreenInfo};
use gif89::log_or_err;

pub struct WriterState {
    pub fail_level: Level,
}

pub struct FrameHandlerContext<'a> {
    pub base_path: &'a Option<PathBuf>,
    pub format: ImageFormat,
    pub mode: DecodeMode,
    pub pb: &'a Option<ProgressBar>,
    pub state: &'a WriterState,
    pub start_time: std::time::Instant,
}

/// Collects decoded frames, writes them to disk and builds the manifest.
#[derive(Default)]
pub struct DecodeHandler {
    pub manifest: Option<Manifest>,
    pub manifest_path: Option<PathBuf>,
    pub decoded_frames: u64,
    pub decoded_pixels: u64,
    pub damaged_frames: u64,
}

impl DecodeHandler {
    /// Prepares the manifest written by [`DecodeHandler::finalize`].
    pub fn begin(
        &mut self,
        base_path: &Option<PathBuf>,
        manifest: Manifest,
    ) -> Result<()> {
        if let Some(path) = base_path {
            self.manifest_path = Some(manifest_path(path)?);
            self.manifest = Some(manifest);
        }
        Ok(())
    }

    pub fn handle_decoded_frame(
        &mut self,
        decoded: DecodedFrame,
        ctx: &FrameHandlerContext,
    ) -> Result<()> {
        let DecodedFrame { report, canvas } = decoded;
        let frame = &report.frame;

        self.decoded_frames += 1;
        self.decoded_pixels += frame.status.produced() as u64;

        if !frame.is_clean() {
            self.damaged_frames += 1;
            log::debug!("Frame {} decoded with {:?}", frame.index, frame.status);
        }

        if let Some(base_path) = ctx.base_path {
            let path = frame_path(base_path, frame.index, ctx.format)?;
            let palette = match ctx.mode {
                DecodeMode::Indexed => Some(&report.palette),
                DecodeMode::Color => None,
            };

            if let Err(e) = write_frame_file(&path, ctx.format, &canvas, palette) {
                log_or_err!(
                    ctx.state,
                    Level::Error,
                    anyhow!("Failed to write {}: {e}", path.display())
                );
            } else {
                log::debug!("Wrote frame {} to {}", frame.index, path.display());
                if let Some(manifest) = &mut self.manifest {
                    manifest.frames.push(FrameInfo::new(frame, &path));
                }
            }
        }

        self.update_progress_display(ctx);
        Ok(())
    }

    fn update_progress_display(&self, ctx: &FrameHandlerContext) {
        if let Some(pb) = ctx.pb {
            let elapsed = ctx.start_time.elapsed().as_secs_f64();
            let fps = if elapsed > 0.0 {
                self.decoded_frames as f64 / elapsed
            } else {
                0.0
            };
            pb.set_message(format!(
                "frames/s: {fps:.1} | pixels: {} | damaged: {}",
                self.decoded_pixels, self.damaged_frames
            ));
        }
    }

    pub fn finalize(&mut self) -> Result<()> {
        if let (Some(manifest), Some(path)) = (&self.manifest, &self.manifest_path) {
            std::fs::write(path, manifest.to_yaml()?)?;
            log::info!("Manifest written to {}", path.display());
        }

        Ok(())
    }
}

/// Manifest header for a stream, frames are appended while decoding.
pub fn new_manifest(
    data: &[u8],
    source: &str,
    mode: DecodeMode,
    format: ImageFormat,
) -> Result<Manifest> {
    let scanner = gif89::process::scan::ChunkScanner::new(data)?;
    Ok(Manifest {
        version: scanner.version().to_string(),
        source: source.to_string(),
        screen: ScreenInfo::from(scanner.screen()),
        mode: mode.as_str().to_string(),
        format: format.extension().to_string(),
        frames: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gif89::process::EXAMPLE_DATA;
    use gif89::process::decode::StreamDecoder;
    use gif89::structs::surface::{PixelFormat, Surface};

    #[test]
    fn writes_frames_and_manifest() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("gif89d-handler-{}", std::process::id()));
        std::fs::create_dir_all(&dir)?;
        let base_path = Some(dir.join("example"));

        let mut decoder = StreamDecoder::open(EXAMPLE_DATA)?;
        let mut canvas = Surface::new(2, 2, PixelFormat::Bgra8);
        let report = decoder.decode(&mut canvas)?.ok_or_else(|| anyhow!("no frame"))?;

        let state = WriterState {
            fail_level: Level::Warn,
        };
        let ctx = FrameHandlerContext {
            base_path: &base_path,
            format: ImageFormat::Raw,
            mode: DecodeMode::Color,
            pb: &None,
            state: &state,
            start_time: std::time::Instant::now(),
        };

        let mut handler = DecodeHandler::default();
        let manifest = new_manifest(EXAMPLE_DATA, "example.gif", ctx.mode, ctx.format)?;
        handler.begin(&base_path, manifest)?;
        handler.handle_decoded_frame(DecodedFrame { report, canvas }, &ctx)?;
        handler.finalize()?;

        let raw = std::fs::read(dir.join("example.000.raw"))?;
        assert_eq!(raw.len(), 2 * 2 * 4);
        assert_eq!(raw[4..8], [255, 255, 255, 255]);

        let yaml = std::fs::read_to_string(dir.join("example.yaml"))?;
        assert!(yaml.contains("file: example.000.raw"));
        assert_eq!(handler.decoded_frames, 1);

        std::fs::remove_dir_all(&dir)?;
        Ok(())
    }
}
