//! Frame compositing into a destination region.
//!
//! Both modes leave a destination pixel untouched when the source pixel is
//! transparent, so earlier frames show through.

use crate::structs::surface::{Palette, PixelFormat, Region};

/// Copies raw indices into an `Index8` region, skipping `transparent`.
///
/// `indices` is a row-major buffer `src_width` wide. Only the part that
/// overlaps the (clipped) region is written.
pub fn blit_indexed(
    region: &mut Region,
    indices: &[u8],
    src_width: usize,
    transparent: Option<u8>,
) {
    debug_assert_eq!(region.format(), PixelFormat::Index8);

    if src_width == 0 {
        return;
    }

    let width = region.width().min(src_width);

    for (y, src_row) in indices.chunks_exact(src_width).take(region.height()).enumerate() {
        let dst_row = region.row_mut(y);

        for (dst, &index) in dst_row.iter_mut().zip(&src_row[..width]) {
            if Some(index) != transparent {
                *dst = index;
            }
        }
    }
}

/// Maps indices through `palette` into a `Bgra8` region, skipping colors
/// with zero alpha.
pub fn blit_palette(region: &mut Region, indices: &[u8], src_width: usize, palette: &Palette) {
    debug_assert_eq!(region.format(), PixelFormat::Bgra8);

    if src_width == 0 {
        return;
    }

    let width = region.width().min(src_width);

    for (y, src_row) in indices.chunks_exact(src_width).take(region.height()).enumerate() {
        let dst_row = region.row_mut(y);

        for (dst, &index) in dst_row.chunks_exact_mut(4).zip(&src_row[..width]) {
            let color = palette[index];
            if color.a != 0 {
                dst.copy_from_slice(&color.to_bgra());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::color_table::{ColorTable, Rgb};
    use crate::structs::surface::{Color, Surface};

    #[test]
    fn indexed_keeps_transparent_pixels() {
        let mut surface = Surface::new(3, 2, PixelFormat::Index8);
        surface.row_mut(0).fill(9);
        surface.row_mut(1).fill(9);

        let mut region = surface.region(1, 0, 2, 2);
        blit_indexed(&mut region, &[0, 1, 2, 0], 2, Some(0));

        assert_eq!(surface.row(0), [9, 9, 1]);
        assert_eq!(surface.row(1), [9, 2, 9]);
    }

    #[test]
    fn indexed_without_transparency() {
        let mut surface = Surface::new(2, 1, PixelFormat::Index8);
        surface.row_mut(0).fill(9);

        blit_indexed(&mut surface.region(0, 0, 2, 1), &[0, 3], 2, None);
        assert_eq!(surface.row(0), [0, 3]);
    }

    #[test]
    fn palette_skips_zero_alpha() {
        let table = ColorTable::from(vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)]);
        let palette = Palette::from_table(&table, Some(0));

        let mut surface = Surface::new(2, 2, PixelFormat::Bgra8);
        let marker = Color::new(10, 20, 30, 40).to_bgra();
        for y in 0..2 {
            for x in 0..2 {
                surface.address_mut(x, y).copy_from_slice(&marker);
            }
        }

        // index 5 lies past the table and maps to transparent black
        blit_palette(&mut surface.region(0, 0, 2, 2), &[0, 1, 5, 1], 2, &palette);

        assert_eq!(surface.color(0, 0), Some(Color::new(10, 20, 30, 40)));
        assert_eq!(surface.color(1, 0), Some(Color::new(255, 255, 255, 255)));
        assert_eq!(surface.color(0, 1), Some(Color::new(10, 20, 30, 40)));
        assert_eq!(surface.color(1, 1), Some(Color::new(255, 255, 255, 255)));
    }

    #[test]
    fn clipped_at_surface_edge() {
        let table = ColorTable::grayscale();
        let palette = Palette::from_table(&table, None);

        let mut surface = Surface::new(2, 2, PixelFormat::Bgra8);
        let indices: Vec<u8> = (0..9).map(|i| (i * 37 + 123) as u8).collect();
        blit_palette(&mut surface.region(1, 1, 3, 3), &indices, 3, &palette);

        let g = indices[0];
        assert_eq!(surface.color(1, 1), Some(Color::new(g, g, g, 0xFF)));
        assert_eq!(surface.color(0, 0), Some(Color::default()));
        assert_eq!(surface.color(1, 0), Some(Color::default()));
    }
}
