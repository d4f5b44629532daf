//! 2D complex FFTs on row-major buffers, built on rustfft.
//!
//! Plans and scratch space are created per call, so concurrent transforms
//! never share mutable state. Both directions run in `Complex<T>`, i.e. in
//! the precision of the field that produced the buffer.

use num_complex::Complex;
use rustfft::{FftDirection, FftPlanner};

use crate::grid::Grid2D;
use crate::precision::Real;

/// Unnormalized forward transform, in place.
pub fn forward_fft_2d<T: Real>(grid: Grid2D, data: &mut [Complex<T>]) {
    transform_2d(grid, data, FftDirection::Forward);
}

/// Inverse transform, in place, normalized by `1 / (nx * ny)` so that a
/// forward/inverse pair is the identity.
pub fn inverse_fft_2d<T: Real>(grid: Grid2D, data: &mut [Complex<T>]) {
    transform_2d(grid, data, FftDirection::Inverse);
    if grid.is_empty() {
        return;
    }
    let scale = T::one() / T::from_usize(grid.len()).unwrap_or_else(T::one);
    for value in data.iter_mut() {
        *value = value.scale(scale);
    }
}

/// Sample frequencies of a length-`n` transform in cycles per sample,
/// ordered like the transform output: `[0, 1, .., -2, -1] / n`.
pub fn fftfreq<T: Real>(n: usize) -> Vec<T> {
    if n == 0 {
        return Vec::new();
    }
    let split = n.div_ceil(2);
    let inv_n = 1.0 / n as f64;
    (0..n)
        .map(|idx| {
            let centered = if idx < split {
                idx as f64
            } else {
                -((n - idx) as f64)
            };
            T::from_f64_lossy(centered * inv_n)
        })
        .collect()
}

fn transform_2d<T: Real>(grid: Grid2D, data: &mut [Complex<T>], direction: FftDirection) {
    assert_eq!(data.len(), grid.len(), "buffer length must match grid size");
    if grid.is_empty() {
        return;
    }
    let (nx, ny) = (grid.nx, grid.ny);

    let mut planner = FftPlanner::<T>::new();
    let fft_x = planner.plan_fft(nx, direction);
    let fft_y = planner.plan_fft(ny, direction);
    let scratch_len = fft_x
        .get_inplace_scratch_len()
        .max(fft_y.get_inplace_scratch_len());
    let mut scratch = vec![Complex::new(T::zero(), T::zero()); scratch_len];

    // Rows are contiguous; rustfft walks the buffer in chunks of nx.
    fft_x.process_with_scratch(data, &mut scratch);

    // Columns (need to gather/scatter)
    let mut col_buf = vec![Complex::new(T::zero(), T::zero()); ny];
    for col in 0..nx {
        for row in 0..ny {
            col_buf[row] = data[row * nx + col];
        }
        fft_y.process_with_scratch(&mut col_buf, &mut scratch);
        for row in 0..ny {
            data[row * nx + col] = col_buf[row];
        }
    }
}
