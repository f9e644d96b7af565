use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::command::{Cli, InfoArgs};
use crate::input::InputReader;
use gif89::process::scan::{Chunk, ChunkScanner};
use gif89::structs::image::ImageDescriptor;
use gif89::structs::screen::{ScreenDescriptor, Version};
use gif89::utils::sub_block::BlockTerminator;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing GIF stream: {}", args.input.display());

    let data = InputReader::new(&args.input)?.read_all()?;

    if gif89::probe(&data).is_none() {
        println!("No GIF signature found in the file.");
        println!("This doesn't appear to be a valid GIF image.");
        return Ok(());
    }

    let mut scanner = ChunkScanner::with_fail_level(&data, cli.fail_level())?;
    display_stream_info(scanner.version(), scanner.screen());

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb.set_message("Scanning chunks...");
            Some(pb)
        }
        None => None,
    };

    let mut summary = ChunkSummary::default();

    println!("Chunks");
    while let Some(chunk) = scanner.next() {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                if let Some(pb) = &pb {
                    pb.finish_and_clear();
                }
                return Err(e);
            }
        };

        summary.add(&chunk);
        display_chunk(scanner.offset(), &chunk);
    }
    println!();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    display_summary(&summary, data.len());

    Ok(())
}

#[derive(Debug, Default)]
struct ChunkSummary {
    images: usize,
    extensions: usize,
    unknown: usize,
    interlaced: usize,
    local_tables: usize,
    compressed_bytes: usize,
    pixels: usize,
    irregular_terminators: usize,
    trailer: bool,
}

impl ChunkSummary {
    fn add(&mut self, chunk: &Chunk) {
        match chunk {
            Chunk::Extension { .. } => self.extensions += 1,
            Chunk::Image {
                descriptor,
                data_len,
                terminator,
                ..
            } => {
                self.images += 1;
                self.interlaced += descriptor.interlaced() as usize;
                self.local_tables += descriptor.has_local_table() as usize;
                self.compressed_bytes += data_len;
                self.pixels += descriptor.samples();
                self.irregular_terminators += (*terminator != BlockTerminator::Clean) as usize;
            }
            Chunk::Trailer => self.trailer = true,
            Chunk::Unknown(_) => self.unknown += 1,
        }
    }
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

fn display_stream_info(version: Version, screen: &ScreenDescriptor) {
    println!();
    println!("GIF Stream Information");
    println!("======================");
    println!();
    println!("Stream Information");
    println!("  Signature                 {version}");
    println!("  Logical screen            {}x{}", screen.width, screen.height);
    match &screen.global_table {
        Some(table) => println!(
            "  Global color table        {} colors (sorted: {})",
            table.len(),
            yes_no(screen.sorted())
        ),
        None => println!("  Global color table        none"),
    }
    println!("  Color resolution          {} bits", screen.color_resolution());
    println!("  Background index          {}", screen.background_index);
    if screen.aspect != 0 {
        let ratio = (screen.aspect as f64 + 15.0) / 64.0;
        println!("  Pixel aspect ratio        {ratio:.3}");
    }
    println!();
}

fn display_image(descriptor: &ImageDescriptor) -> String {
    let table = match &descriptor.local_table {
        Some(table) => format!("{} colors", table.len()),
        None => "none".to_string(),
    };

    format!(
        "image {}x{} at ({}, {}), interlaced: {}, local table: {table}",
        descriptor.width,
        descriptor.height,
        descriptor.left,
        descriptor.top,
        yes_no(descriptor.interlaced())
    )
}

fn display_chunk(offset: usize, chunk: &Chunk) {
    match chunk {
        Chunk::Extension { label, payload_len } => {
            println!("  {offset:>10}  extension {label}, {payload_len} bytes");
        }
        Chunk::Image {
            descriptor,
            min_code_size,
            data_len,
            terminator,
        } => {
            println!("  {offset:>10}  {}", display_image(descriptor));
            let terminator = match terminator {
                BlockTerminator::Clean => String::new(),
                BlockTerminator::TrailingData { skipped } => {
                    format!(", terminator after {skipped} extra bytes")
                }
                BlockTerminator::Missing => ", no terminator".to_string(),
            };
            println!(
                "  {:>10}  min code size {min_code_size}, {data_len} bytes{terminator}",
                ""
            );
        }
        Chunk::Trailer => println!("  {offset:>10}  trailer"),
        Chunk::Unknown(tag) => println!("  {offset:>10}  unknown tag {tag:#04X}"),
    }
}

fn display_summary(summary: &ChunkSummary, total_bytes: usize) {
    println!("Analysis Summary");
    println!("  Images                    {}", summary.images);
    println!("  Interlaced images         {}", summary.interlaced);
    println!("  Local color tables        {}", summary.local_tables);
    println!("  Extensions                {}", summary.extensions);
    if summary.unknown > 0 {
        println!("  Unknown chunk tags        {}", summary.unknown);
    }
    if summary.irregular_terminators > 0 {
        println!("  Irregular terminators     {}", summary.irregular_terminators);
    }
    println!("  Trailer                   {}", yes_no(summary.trailer));
    println!("  Size                      {total_bytes} bytes");
    if summary.pixels > 0 {
        let bits_per_pixel = summary.compressed_bytes as f64 * 8.0 / summary.pixels as f64;
        println!(
            "  Compressed data           {} bytes ({bits_per_pixel:.2} bits/pixel)",
            summary.compressed_bytes
        );
    }
    println!();
}

#[test]
fn summary_counts_example_chunks() -> Result<()> {
    let mut summary = ChunkSummary::default();
    for chunk in ChunkScanner::new(gif89::process::EXAMPLE_DATA)? {
        summary.add(&chunk?);
    }

    assert_eq!(summary.images, 1);
    assert_eq!(summary.extensions, 1);
    assert_eq!(summary.pixels, 4);
    assert_eq!(summary.compressed_bytes, 2);
    assert!(summary.trailer);
    Ok(())
}
