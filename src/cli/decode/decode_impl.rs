use std::sync::mpsc;

use anyhow::{Result, anyhow};
use indicatif::{MultiProgress, ProgressBar};

use super::decoder_thread::{DecoderThreadConfig, spawn_decoder_thread};
use super::handler::{DecodeHandler, FrameHandlerContext, WriterState, new_manifest};
use super::progress::{create_progress_bar, estimate_total_frames};
use crate::cli::command::{Cli, DecodeArgs, DecodeMode};
use crate::input::InputReader;
use gif89::structs::surface::PixelFormat;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!(
        "Decoding GIF stream: {} (strict mode: {}, mode: {})",
        args.input.display(),
        cli.strict,
        args.mode.as_str()
    );

    let base_path = args.output_path.clone();
    if let Some(ref path) = base_path {
        log::info!("Output path specified: {}", path.display());
    } else {
        log::info!("No output path given, frames are decoded but not written");
    }

    let mut input = InputReader::new(&args.input)?;
    let data = input.read_all()?;

    if gif89::probe(&data).is_none() {
        return Err(anyhow!("{} is not a GIF image", args.input.display()));
    }

    let should_estimate = !args.no_estimate_progress && multi.is_some();
    let total_frames = if should_estimate {
        Some(estimate_total_frames(&data)?)
    } else {
        if args.no_estimate_progress {
            log::debug!("Progress estimation disabled by --no-estimate-progress flag");
        }
        None
    };

    let pb = match multi {
        Some(multi) => Some(create_progress_bar(multi, total_frames)?),
        None => None,
    };

    let fail_level = cli.fail_level();
    let state = WriterState { fail_level };

    let mut handler = DecodeHandler::default();
    let source = if input.is_pipe() {
        "stdin".to_string()
    } else {
        args.input.display().to_string()
    };
    handler.begin(&base_path, new_manifest(&data, &source, args.mode, args.format)?)?;

    let (tx, rx) = mpsc::channel();
    let decode_thread = spawn_decoder_thread(DecoderThreadConfig {
        data,
        format: match args.mode {
            DecodeMode::Color => PixelFormat::Bgra8,
            DecodeMode::Indexed => PixelFormat::Index8,
        },
        fail_level,
        tx,
        pb_clone: pb.clone(),
    });

    let start_time = std::time::Instant::now();
    let ctx = FrameHandlerContext {
        base_path: &base_path,
        format: args.format,
        mode: args.mode,
        pb: &pb,
        state: &state,
        start_time,
    };

    while let Ok(result) = rx.recv() {
        let handled = result.and_then(|decoded| handler.handle_decoded_frame(decoded, &ctx));
        if let Err(e) = handled {
            if let Some(pb) = pb {
                pb.finish_with_message("decode failed");
            }
            return Err(e);
        }
    }

    handler.finalize()?;

    match decode_thread.join() {
        Ok(Ok(())) => {
            finalize_progress_bar(&pb, &handler, start_time);
            log::info!(
                "Decoding completed successfully: {} frames, {} damaged",
                handler.decoded_frames,
                handler.damaged_frames
            );
        }
        Ok(Err(e)) => {
            if let Some(pb) = pb {
                pb.finish_with_message("decode failed");
            }
            return Err(e);
        }
        Err(_) => {
            if let Some(pb) = pb {
                pb.finish_with_message("decode thread panicked");
            }
            return Err(anyhow!("Decode thread panicked"));
        }
    }

    Ok(())
}

fn finalize_progress_bar(
    pb: &Option<ProgressBar>,
    handler: &DecodeHandler,
    start_time: std::time::Instant,
) {
    if let Some(pb) = pb {
        let elapsed = start_time.elapsed().as_secs_f64();
        let megapixels = handler.decoded_pixels as f64 / 1e6;
        let rate = if elapsed > 0.0 { megapixels / elapsed } else { 0.0 };

        pb.finish_with_message(format!(
            "frames: {} | {megapixels:.2} MP at {rate:.1} MP/s",
            handler.decoded_frames
        ));
    }
}
