//! Four-pass interlaced row order.
//!
//! | pass | first row | step |
//! |------|-----------|------|
//! | 1    | 0         | 8    |
//! | 2    | 4         | 8    |
//! | 3    | 2         | 4    |
//! | 4    | 1         | 2    |

const PASS_START: [usize; 4] = [0, 4, 2, 1];
const PASS_STEP: [usize; 4] = [8, 8, 4, 2];

/// Destination rows in the order an interlaced image transmits them.
///
/// Yields every row of `0..height` exactly once.
pub fn interlaced_rows(height: usize) -> impl Iterator<Item = usize> {
    PASS_START
        .into_iter()
        .zip(PASS_STEP)
        .flat_map(move |(start, step)| (start..height).step_by(step))
}

/// Rearranges `src`, whose rows are stored in transmission order, into natural
/// top-to-bottom order.
///
/// `src` must hold at least `width * height` bytes.
pub fn deinterlace(src: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut dst = vec![0; width * height];

    if width == 0 {
        return dst;
    }

    for (src_row, dst_row) in src.chunks_exact(width).zip(interlaced_rows(height)) {
        dst[dst_row * width..(dst_row + 1) * width].copy_from_slice(src_row);
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_for_eight() {
        let rows: Vec<_> = interlaced_rows(8).collect();
        assert_eq!(rows, [0, 4, 2, 6, 1, 3, 5, 7]);
    }

    #[test]
    fn every_row_exactly_once() {
        for height in 0..40 {
            let mut rows: Vec<_> = interlaced_rows(height).collect();
            rows.sort_unstable();
            assert!(rows.iter().copied().eq(0..height), "height {height}");
        }
    }

    #[test]
    fn restores_8x8_pattern() {
        let width = 8;
        let natural: Vec<u8> = (0..64).map(|i| ((i * 37 + 123) % 256) as u8).collect();

        // lay the pattern out in transmission order
        let mut transmitted = Vec::with_capacity(natural.len());
        for row in [0, 4, 2, 6, 1, 3, 5, 7] {
            transmitted.extend_from_slice(&natural[row * width..(row + 1) * width]);
        }

        assert_eq!(deinterlace(&transmitted, width, 8), natural);
    }

    #[test]
    fn short_images() {
        // a single row and a three row image still follow pass order
        assert_eq!(deinterlace(&[1, 2], 2, 1), [1, 2]);
        assert_eq!(deinterlace(&[1, 2, 3], 1, 3), [1, 3, 2]);
        assert!(deinterlace(&[], 0, 5).is_empty());
    }
}
