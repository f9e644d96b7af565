use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use gif89::structs::surface::{Palette, Surface};

use super::super::command::ImageFormat;
use crate::tga::write_tga;

pub fn create_path_with_suffix(base_path: &Path, suffix: &str) -> Result<PathBuf> {
    let name = base_path
        .file_name()
        .ok_or_else(|| anyhow!("Output path has no file name: {}", base_path.display()))?;

    let mut path = base_path.to_path_buf();
    path.set_file_name(format!("{}.{suffix}", name.to_string_lossy()));
    Ok(path)
}

/// `PATH.NNN.ext`, numbered from zero.
pub fn frame_path(base_path: &Path, index: usize, format: ImageFormat) -> Result<PathBuf> {
    create_path_with_suffix(base_path, &format!("{index:03}.{}", format.extension()))
}

pub fn manifest_path(base_path: &Path) -> Result<PathBuf> {
    create_path_with_suffix(base_path, "yaml")
}

/// Writes one composited canvas in the requested image format.
pub fn write_frame<W: Write>(
    writer: &mut W,
    format: ImageFormat,
    canvas: &Surface,
    palette: Option<&Palette>,
) -> Result<()> {
    match format {
        ImageFormat::Tga => write_tga(writer, canvas, palette)?,
        ImageFormat::Raw => {
            for y in 0..canvas.height() {
                writer.write_all(canvas.row(y))?;
            }
        }
    }
    Ok(())
}

pub fn write_frame_file(
    path: &Path,
    format: ImageFormat,
    canvas: &Surface,
    palette: Option<&Palette>,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_frame(&mut writer, format, canvas, palette)?;
    writer.flush()?;
    Ok(())
}
