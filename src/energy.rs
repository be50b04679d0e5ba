// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image.
//!
//! The importance score of a pixel is the sum, over every channel, of
//! the squared differences against its four replicated-border
//! neighbors:
//!
//! ```text
//! e(x,y) = Σ_c (v−l)² + (v−r)² + (v−u)² + (v−d)²
//! ```
//!
//! A replicated border neighbor equals the center pixel, so its term
//! is zero and the border cases drop out of the sum entirely.  Channel
//! values are widened to i64 before differencing and the map itself
//! holds u64, so neither the per-pixel sum nor the downstream
//! cumulative DP sums can overflow for any sane channel depth.

use bytemuck::Pod;
use num_traits::{NumCast, ToPrimitive};

use crate::buffer::{Buffer, Residency};
use crate::error::{CarveError, Result, SyncDirection};
use crate::twodmap::TwoDimensionalMap;

// Infallible for any channel-sized primitive; following the widening
// pattern used throughout the image ecosystem.
#[inline]
fn widen<T: ToPrimitive>(v: T) -> i64 {
    NumCast::from(v).unwrap()
}

fn fill_energy_row<T>(
    data: &[T],
    width: usize,
    height: usize,
    channels: usize,
    y: usize,
    row: &mut [u64],
) where
    T: Pod + ToPrimitive,
{
    for (x, cell) in row.iter_mut().enumerate() {
        let mut acc: u64 = 0;
        for c in 0..channels {
            let v = widen(data[(y * width + x) * channels + c]);
            let grad = |nx: usize, ny: usize| -> u64 {
                let d = v - widen(data[(ny * width + nx) * channels + c]);
                (d * d) as u64
            };
            if x > 0 {
                acc += grad(x - 1, y);
            }
            if x + 1 < width {
                acc += grad(x + 1, y);
            }
            if y > 0 {
                acc += grad(x, y - 1);
            }
            if y + 1 < height {
                acc += grad(x, y + 1);
            }
        }
        *cell = acc;
    }
}

/// Compute the energy of every pixel in an image.
///
/// The input must be host-current: a `DeviceOnly` buffer is rejected
/// rather than implicitly synced, since the driver owns the sync
/// schedule.  The image itself is never mutated.
pub fn compute_energy<T>(image: &Buffer<T>) -> Result<TwoDimensionalMap<u64>>
where
    T: Pod + ToPrimitive + Sync,
{
    if image.residency() == Residency::DeviceOnly {
        return Err(CarveError::Sync {
            direction: SyncDirection::ToHost,
            reason: "energy input is device-dirty; sync_to_host first".to_owned(),
        });
    }

    let (width, height, channels) = (image.width(), image.height(), image.channels());
    let data = image.host();
    let mut emap = TwoDimensionalMap::new(width, height);

    // Each row reads only the shared source image, so rows are
    // independent work units.
    #[cfg(feature = "threaded")]
    {
        use rayon::prelude::*;
        emap.as_mut_slice()
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| fill_energy_row(data, width, height, channels, y, row));
    }

    #[cfg(not(feature = "threaded"))]
    for (y, row) in emap.rows_mut().enumerate() {
        fill_energy_row(data, width, height, channels, y, row);
    }

    Ok(emap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_has_zero_energy() {
        let buf = Buffer::from_host(&[4, 3], vec![7u8; 12]).unwrap();
        let energy = compute_energy(&buf).unwrap();
        assert!(energy.as_slice().iter().all(|&e| e == 0));
    }

    #[test]
    fn energy_of_known_gradient() {
        // 3x3 ramp; every value hand-checked against the formula.
        let buf = Buffer::from_host(&[3, 3], vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        let energy = compute_energy(&buf).unwrap();
        assert_eq!(
            energy.as_slice(),
            &[10, 11, 10, 19, 20, 19, 10, 11, 10]
        );
    }

    #[test]
    fn bright_line_concentrates_energy_at_its_column() {
        // A one-column white line on black: the line's own column must
        // carry the maximum, with its flanks next and zero elsewhere.
        let mut data = vec![0u8; 5 * 3];
        for y in 0..3 {
            data[y * 5 + 2] = 255;
        }
        let buf = Buffer::from_host(&[5, 3], data).unwrap();
        let energy = compute_energy(&buf).unwrap();

        let d = 255u64 * 255;
        for y in 0..3 {
            let row = &energy.as_slice()[y * 5..(y + 1) * 5];
            assert_eq!(row, &[0, d, 2 * d, d, 0]);
        }
    }

    #[test]
    fn channels_accumulate_independently() {
        // Two pixels, two channels: (0,3) and (4,0).
        let buf = Buffer::from_host(&[2, 1, 2], vec![0u8, 3, 4, 0]).unwrap();
        let energy = compute_energy(&buf).unwrap();
        assert_eq!(energy.as_slice(), &[25, 25]);
    }

    #[test]
    fn device_dirty_input_is_rejected() {
        let mut buf = Buffer::from_host(&[2, 2], vec![0u8; 4]).unwrap();
        buf.mark_device_dirty();
        let result = compute_energy(&buf);
        assert!(matches!(result, Err(CarveError::Sync { .. })));
    }
}
