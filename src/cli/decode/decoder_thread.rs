use std::sync::mpsc;
use std::thread;

use anyhow::Result;
use indicatif::ProgressBar;
use gif89::process::decode::{FrameReport, StreamDecoder};
use gif89::structs::surface::{PixelFormat, Surface};

/// A frame together with the canvas it was composited onto.
pub struct DecodedFrame {
    pub report: FrameReport,
    pub canvas: Surface,
}

pub struct DecoderThreadConfig {
    pub data: Vec<u8>,
    pub format: PixelFormat,
    pub fail_level: log::Level,
    pub tx: mpsc::Sender<Result<DecodedFrame>>,
    pub pb_clone: Option<ProgressBar>,
}

/// Decodes one pass over the stream and sends every frame to `tx`.
///
/// Errors are sent through the channel as well, the thread then stops.
pub fn spawn_decoder_thread(config: DecoderThreadConfig) -> thread::JoinHandle<Result<()>> {
    thread::spawn(move || -> Result<()> {
        let DecoderThreadConfig {
            data,
            format,
            fail_level,
            tx,
            pb_clone,
        } = config;

        let mut decoder = match StreamDecoder::with_fail_level(&data, fail_level) {
            Ok(decoder) => decoder,
            Err(e) => {
                // the receiver reports the error, a closed channel is fine here
                let _ = tx.send(Err(e));
                return Ok(());
            }
        };

        let header = decoder.header();
        let mut canvas = Surface::new(header.width, header.height, format);
        let mut frame_count = 0u64;

        loop {
            match decoder.decode(&mut canvas) {
                Ok(Some(report)) => {
                    frame_count += 1;
                    if let Some(pb) = &pb_clone {
                        pb.set_position(frame_count);
                    }

                    let frame = DecodedFrame {
                        report,
                        canvas: canvas.clone(),
                    };
                    if tx.send(Ok(frame)).is_err() {
                        log::debug!("Frame receiver closed, stopping decoder");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }

        log::info!("Processing complete: {frame_count} frames");
        Ok(())
    })
}

#[test]
fn sends_example_frame() -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_decoder_thread(DecoderThreadConfig {
        data: gif89::process::EXAMPLE_DATA.to_vec(),
        format: PixelFormat::Index8,
        fail_level: log::Level::Warn,
        tx,
        pb_clone: None,
    });

    let frames = rx.iter().collect::<Result<Vec<_>>>()?;
    assert!(handle.join().is_ok());

    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].canvas.data(), [0, 1, 0, 1]);
    assert_eq!(frames[0].report.frame.index, 0);
    Ok(())
}
