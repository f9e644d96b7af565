//! Minimal raster collaborator: pixel storage, palettes and clipped regions.
//!
//! Two formats cover the decoder's needs. `Index8` holds raw color indices,
//! `Bgra8` holds 32-bit colors stored as `[b, g, r, a]`.

use std::ops::{Index, IndexMut};

use anyhow::{Result, ensure};

use crate::structs::color_table::{ColorTable, MAX_COLOR_TABLE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Index8,
    Bgra8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Index8 => 1,
            PixelFormat::Bgra8 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline(always)]
    pub const fn to_bgra(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }

    #[inline(always)]
    pub const fn from_bgra(bgra: [u8; 4]) -> Self {
        Self::new(bgra[2], bgra[1], bgra[0], bgra[3])
    }
}

/// Fixed-capacity color list with a settable size.
///
/// Slots past `size` stay transparent black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Color; MAX_COLOR_TABLE_SIZE],
    size: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: [Color::default(); MAX_COLOR_TABLE_SIZE],
            size: 0,
        }
    }
}

impl Palette {
    /// Opaque palette built from `table`; the `transparent` entry gets alpha 0.
    pub fn from_table(table: &ColorTable, transparent: Option<u8>) -> Self {
        let mut palette = Self::default();

        for (slot, rgb) in palette.colors.iter_mut().zip(table.iter()) {
            *slot = Color::new(rgb.r, rgb.g, rgb.b, 0xFF);
        }
        palette.size = table.len().min(MAX_COLOR_TABLE_SIZE);

        if let Some(index) = transparent {
            palette.colors[index as usize].a = 0;
        }

        palette
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn set_size(&mut self, size: usize) {
        self.size = size.min(MAX_COLOR_TABLE_SIZE);
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors[..self.size]
    }
}

impl Index<u8> for Palette {
    type Output = Color;

    #[inline(always)]
    fn index(&self, index: u8) -> &Color {
        &self.colors[index as usize]
    }
}

impl IndexMut<u8> for Palette {
    #[inline(always)]
    fn index_mut(&mut self, index: u8) -> &mut Color {
        &mut self.colors[index as usize]
    }
}

/// Owned, zero-initialised pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: usize,
    height: usize,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel();

        Self {
            width,
            height,
            format,
            stride,
            data: vec![0; stride * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Bytes of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the surface.
    pub fn address(&self, x: usize, y: usize) -> &[u8] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let bpp = self.format.bytes_per_pixel();
        let offset = y * self.stride + x * bpp;

        &self.data[offset..offset + bpp]
    }

    pub fn address_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let bpp = self.format.bytes_per_pixel();
        let offset = y * self.stride + x * bpp;

        &mut self.data[offset..offset + bpp]
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.data[y * self.stride..(y + 1) * self.stride]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.data[y * self.stride..(y + 1) * self.stride]
    }

    /// Color at `(x, y)` of a `Bgra8` surface.
    pub fn color(&self, x: usize, y: usize) -> Option<Color> {
        if self.format != PixelFormat::Bgra8 {
            return None;
        }

        let p = self.address(x, y);
        Some(Color::from_bgra([p[0], p[1], p[2], p[3]]))
    }

    /// Sub-rectangle at `(x, y)`, clipped to this surface.
    pub fn region(&mut self, x: usize, y: usize, width: usize, height: usize) -> Region<'_> {
        let mut width = width.min(self.width.saturating_sub(x));
        let mut height = height.min(self.height.saturating_sub(y));

        // an empty region has no rows to address
        if width == 0 || height == 0 {
            width = 0;
            height = 0;
        }
        let (x, y) = (x.min(self.width), y.min(self.height));

        Region {
            surface: self,
            x,
            y,
            width,
            height,
        }
    }

    /// Copies `src` to `(x, y)`. Both surfaces must share a pixel format.
    pub fn blit(&mut self, x: usize, y: usize, src: &Surface) -> Result<()> {
        ensure!(
            self.format == src.format,
            "blit between {:?} and {:?} surfaces is not supported",
            src.format,
            self.format
        );

        let bpp = self.format.bytes_per_pixel();
        let mut region = self.region(x, y, src.width, src.height);
        let row_bytes = region.width() * bpp;

        for row in 0..region.height() {
            region.row_mut(row).copy_from_slice(&src.row(row)[..row_bytes]);
        }

        Ok(())
    }
}

/// Mutable view of a clipped rectangle of a [`Surface`].
#[derive(Debug)]
pub struct Region<'s> {
    surface: &'s mut Surface,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

impl Region<'_> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.surface.format
    }

    /// Bytes of row `y` inside the region, `width * bytes_per_pixel` long.
    #[inline(always)]
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let bpp = self.surface.format.bytes_per_pixel();
        let start = self.x * bpp;
        let end = start + self.width * bpp;

        &mut self.surface.row_mut(self.y + y)[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::color_table::Rgb;

    #[test]
    fn palette_from_table() {
        let table = ColorTable::from(vec![Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)]);
        let palette = Palette::from_table(&table, Some(1));

        assert_eq!(palette.size(), 2);
        assert_eq!(palette[0], Color::new(1, 2, 3, 0xFF));
        assert_eq!(palette[1], Color::new(4, 5, 6, 0));
        assert_eq!(palette[200], Color::default());
        assert_eq!(palette.colors().len(), 2);
    }

    #[test]
    fn region_is_clipped() {
        let mut surface = Surface::new(4, 3, PixelFormat::Index8);
        let mut region = surface.region(3, 1, 5, 5);

        assert_eq!((region.width(), region.height()), (1, 2));
        region.row_mut(1)[0] = 7;
        assert_eq!(surface.address(3, 2), &[7]);

        let region = surface.region(9, 9, 2, 2);
        assert_eq!((region.width(), region.height()), (0, 0));
    }

    #[test]
    fn region_past_right_edge_is_empty() -> Result<()> {
        let mut surface = Surface::new(2, 2, PixelFormat::Index8);

        let region = surface.region(5, 0, 1, 1);
        assert_eq!((region.width(), region.height()), (0, 0));

        let region = surface.region(0, 2, 1, 1);
        assert_eq!((region.width(), region.height()), (0, 0));

        let mut src = Surface::new(1, 2, PixelFormat::Index8);
        src.row_mut(0)[0] = 9;
        surface.blit(3, 0, &src)?;
        assert_eq!(surface.data(), [0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn blit_same_format() -> Result<()> {
        let mut src = Surface::new(2, 2, PixelFormat::Bgra8);
        src.address_mut(1, 1).copy_from_slice(&[1, 2, 3, 4]);

        let mut dst = Surface::new(3, 3, PixelFormat::Bgra8);
        dst.blit(1, 1, &src)?;
        assert_eq!(dst.color(2, 2), Some(Color::new(3, 2, 1, 4)));
        assert_eq!(dst.color(0, 0), Some(Color::default()));

        let indexed = Surface::new(2, 2, PixelFormat::Index8);
        assert!(dst.blit(0, 0, &indexed).is_err());
        Ok(())
    }
}
