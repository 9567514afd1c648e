//! Neighbourhood filters on binary masks.
//!
//! Both filters replicate edge pixels beyond the image border. For the
//! all-ones window sum this is the same as clipping the window to the image.

use ndarray::{Array2, ArrayView2};

use crate::cloud_shadow::common::error::Result;
use crate::cloud_shadow::detection::params::{SearchWindow, validate_median_kernel};
use crate::cloud_shadow::raster::types::Mask;

/// Square median filter with edge replication. Kernel size 1 is the identity.
///
/// On a binary mask the median is 1 exactly when more than half of the
/// `k * k` replicated neighbours are set, so each output pixel is a weighted
/// count over a summed-area table. Any nonzero input counts as set.
pub fn median_filter(mask: ArrayView2<'_, u8>, kernel_size: usize) -> Result<Mask> {
    validate_median_kernel("kernel_size", kernel_size)?;
    let (rows, cols) = mask.dim();
    if kernel_size == 1 || rows == 0 || cols == 0 {
        return Ok(mask.to_owned());
    }

    let integral = summed_area_table(mask);
    let radius = kernel_size / 2;
    let majority = (kernel_size as u128).pow(2) / 2;

    Ok(Mask::from_shape_fn((rows, cols), |(row, col)| {
        let rows_span = ReplicatedSpan::new(row, radius, rows);
        let cols_span = ReplicatedSpan::new(col, radius, cols);
        u8::from(replicated_count(&integral, rows_span, cols_span) > majority)
    }))
}

/// Number of set pixels inside the search window anchored on each pixel.
///
/// The anchor sits at `(height / 2, width / 2)` of the window, so pixel `r`
/// sees rows `r - height/2 ..= r - height/2 + height - 1`.
pub fn window_sum(mask: ArrayView2<'_, u8>, window: SearchWindow) -> Result<Array2<usize>> {
    window.validate()?;

    let (rows, cols) = mask.dim();
    let integral = summed_area_table(mask);
    let (up, left) = (window.height / 2, window.width / 2);
    let (down, right) = (window.height - up, window.width - left);

    Ok(Array2::from_shape_fn((rows, cols), |(row, col)| {
        let top = row.saturating_sub(up);
        let bottom = row.saturating_add(down).min(rows);
        let first = col.saturating_sub(left);
        let last = col.saturating_add(right).min(cols);
        rect_sum(&integral, top, bottom, first, last)
    }))
}

/// `table[[r, c]]` holds the count of set pixels above and left of `(r, c)`.
fn summed_area_table(mask: ArrayView2<'_, u8>) -> Array2<usize> {
    let (rows, cols) = mask.dim();
    let mut table = Array2::<usize>::zeros((rows + 1, cols + 1));
    for r in 0..rows {
        let mut row_sum = 0;
        for c in 0..cols {
            row_sum += usize::from(mask[[r, c]] != 0);
            table[[r + 1, c + 1]] = table[[r, c + 1]] + row_sum;
        }
    }
    table
}

/// Set pixels in rows `top..bottom` and columns `first..last`.
fn rect_sum(table: &Array2<usize>, top: usize, bottom: usize, first: usize, last: usize) -> usize {
    table[[bottom, last]] + table[[top, first]] - table[[top, last]] - table[[bottom, first]]
}

/// One axis of a replicated kernel: the in-bounds range `start..end` plus
/// how many kernel taps fall before the first and after the last index.
#[derive(Debug, Clone, Copy)]
struct ReplicatedSpan {
    start: usize,
    end: usize,
    before: u128,
    after: u128,
}

impl ReplicatedSpan {
    fn new(center: usize, radius: usize, len: usize) -> Self {
        let last = len - 1;
        let reach = center.saturating_add(radius);
        Self {
            start: center.saturating_sub(radius),
            end: reach.min(last) + 1,
            before: radius.saturating_sub(center) as u128,
            after: reach.saturating_sub(last) as u128,
        }
    }
}

/// Set pixels in the replicated kernel. Taps beyond the border land on the
/// edge row, edge column or corner pixel and are weighted accordingly.
fn replicated_count(table: &Array2<usize>, r: ReplicatedSpan, c: ReplicatedSpan) -> u128 {
    let (rows, cols) = (table.nrows() - 1, table.ncols() - 1);
    let sum = |top, bottom, first, last| rect_sum(table, top, bottom, first, last) as u128;

    let inner = sum(r.start, r.end, c.start, c.end);
    let top_edge = sum(0, 1, c.start, c.end);
    let bottom_edge = sum(rows - 1, rows, c.start, c.end);
    let left_edge = sum(r.start, r.end, 0, 1);
    let right_edge = sum(r.start, r.end, cols - 1, cols);

    inner
        + r.before * top_edge
        + r.after * bottom_edge
        + c.before * left_edge
        + c.after * right_edge
        + r.before * c.before * sum(0, 1, 0, 1)
        + r.before * c.after * sum(0, 1, cols - 1, cols)
        + r.after * c.before * sum(rows - 1, rows, 0, 1)
        + r.after * c.after * sum(rows - 1, rows, cols - 1, cols)
}
