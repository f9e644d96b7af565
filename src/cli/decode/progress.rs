use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use gif89::process::scan::{Chunk, ChunkScanner};

/// Counts image chunks without decoding them.
pub fn estimate_total_frames(data: &[u8]) -> Result<u64> {
    log::info!("Counting frames for progress estimation");
    let count_start = std::time::Instant::now();

    let images = ChunkScanner::new(data)?
        .filter(|chunk| matches!(chunk, Ok(Chunk::Image { .. })))
        .count() as u64;

    log::info!(
        "Found {images} image chunks in {:.3}s ({} bytes)",
        count_start.elapsed().as_secs_f64(),
        data.len()
    );

    Ok(images)
}

pub fn create_progress_bar(
    multi: &MultiProgress,
    total_frames: Option<u64>,
) -> Result<ProgressBar> {
    let pb = if let Some(total) = total_frames {
        let pb = multi.add(ProgressBar::new(total));
        pb.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} frames ({percent}%)\n{msg} | elapsed: {elapsed_precise} | ETA: {eta_precise}",
        )?);

        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    } else {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} {pos} frames\n{msg} | elapsed: {elapsed_precise}",
        )?);

        pb
    };
    pb.set_message("initializing decoder");
    Ok(pb)
}

#[test]
fn estimates_example_frames() -> Result<()> {
    assert_eq!(estimate_total_frames(gif89::process::EXAMPLE_DATA)?, 1);
    Ok(())
}
