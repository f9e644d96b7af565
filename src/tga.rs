use std::io::{self, Write};

use gif89::structs::surface::{Palette, PixelFormat, Surface};
use gif89d_macros::ToBytes;

use crate::byteorder::WriteBytesLe;
use crate::impl_u8_enum;

pub const TGA_HEADER_LEN: usize = 18;

/// Image descriptor bit 5: rows are stored top to bottom.
const TOP_LEFT_ORIGIN: u8 = 0x20;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    ColorMapped = 1,
    TrueColor = 2,
}

impl_u8_enum!(ImageType);

#[derive(Debug, ToBytes)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: ImageType,
    pub color_map_first: u16,
    pub color_map_length: u16,
    pub color_map_depth: u8,
    pub x_origin: u16,
    pub y_origin: u16,
    pub width: u16,
    pub height: u16,
    pub pixel_depth: u8,
    pub descriptor: u8,
}

impl TgaHeader {
    pub fn for_surface(surface: &Surface, palette: Option<&Palette>) -> io::Result<Self> {
        let dimension = |v: usize| {
            u16::try_from(v).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("{v} pixels exceed TGA limits"))
            })
        };

        let (width, height) = (dimension(surface.width())?, dimension(surface.height())?);

        let header = match surface.format() {
            PixelFormat::Bgra8 => Self {
                id_length: 0,
                color_map_type: 0,
                image_type: ImageType::TrueColor,
                color_map_first: 0,
                color_map_length: 0,
                color_map_depth: 0,
                x_origin: 0,
                y_origin: 0,
                width,
                height,
                pixel_depth: 32,
                descriptor: TOP_LEFT_ORIGIN | 8,
            },
            PixelFormat::Index8 => {
                let entries = palette.map_or(0, Palette::size);
                Self {
                    id_length: 0,
                    color_map_type: 1,
                    image_type: ImageType::ColorMapped,
                    color_map_first: 0,
                    // indices can address the whole table even past its size
                    color_map_length: if entries == 0 { 0 } else { 256 },
                    color_map_depth: 32,
                    x_origin: 0,
                    y_origin: 0,
                    width,
                    height,
                    pixel_depth: 8,
                    descriptor: TOP_LEFT_ORIGIN,
                }
            }
        };

        Ok(header)
    }
}

/// Writes `surface` as an uncompressed TGA image.
///
/// `Bgra8` surfaces become 32-bit true color, `Index8` surfaces a color-mapped
/// image with `palette` stored as 32-bit BGRA entries.
pub fn write_tga<W: Write>(
    writer: &mut W,
    surface: &Surface,
    palette: Option<&Palette>,
) -> io::Result<()> {
    let header = TgaHeader::for_surface(surface, palette)?;

    let mut bytes = Vec::with_capacity(TGA_HEADER_LEN + 256 * 4);
    header.write_le(&mut bytes);

    if header.color_map_length > 0 {
        if let Some(palette) = palette {
            for index in 0..=255u8 {
                bytes.extend_from_slice(&palette[index].to_bgra());
            }
        }
    }

    writer.write_all(&bytes)?;

    for y in 0..surface.height() {
        writer.write_all(surface.row(y))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gif89::structs::color_table::{ColorTable, Rgb};

    #[test]
    fn true_color_header() -> io::Result<()> {
        let mut surface = Surface::new(3, 2, PixelFormat::Bgra8);
        surface.address_mut(2, 1).copy_from_slice(&[1, 2, 3, 4]);

        let mut out = Vec::new();
        write_tga(&mut out, &surface, None)?;

        assert_eq!(
            out[..TGA_HEADER_LEN],
            [0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 3, 0, 2, 0, 32, 0x28]
        );
        assert_eq!(out.len(), TGA_HEADER_LEN + 3 * 2 * 4);
        assert_eq!(out[out.len() - 4..], [1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn color_mapped_with_palette() -> io::Result<()> {
        let table = ColorTable::from(vec![Rgb::new(10, 20, 30), Rgb::new(40, 50, 60)]);
        let palette = Palette::from_table(&table, Some(0));
        let surface = Surface::new(2, 2, PixelFormat::Index8);

        let mut out = Vec::new();
        write_tga(&mut out, &surface, Some(&palette))?;

        assert_eq!(
            out[..TGA_HEADER_LEN],
            [0, 1, 1, 0, 0, 0, 1, 32, 0, 0, 0, 0, 2, 0, 2, 0, 8, 0x20]
        );
        let map = &out[TGA_HEADER_LEN..TGA_HEADER_LEN + 8];
        assert_eq!(map, [30, 20, 10, 0, 60, 50, 40, 255]);
        assert_eq!(out.len(), TGA_HEADER_LEN + 256 * 4 + 4);
        Ok(())
    }
}
