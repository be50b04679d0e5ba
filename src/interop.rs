// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! In-memory conversions between [`Buffer`] and the `image` crate's
//! `ImageBuffer`.  No decoding or encoding happens here; files are
//! someone else's problem.

use bytemuck::Pod;
use image::{ImageBuffer, Pixel, Primitive};

use crate::buffer::{Buffer, Residency};
use crate::error::{CarveError, Result, SyncDirection};

/// Copy an `ImageBuffer` into a fresh `HostOnly` [`Buffer`] with
/// extents `[width, height, channels]`.
pub fn from_image<P, S>(img: &ImageBuffer<P, Vec<S>>) -> Result<Buffer<S>>
where
    P: Pixel<Subpixel = S>,
    S: Primitive + Pod,
{
    let (width, height) = img.dimensions();
    let extents = [
        width as usize,
        height as usize,
        P::CHANNEL_COUNT as usize,
    ];
    Buffer::from_host(&extents, img.as_raw().clone())
}

/// Copy a host-current [`Buffer`] back out as an `ImageBuffer`.
///
/// The buffer's channel extent must match `P::CHANNEL_COUNT`.
pub fn to_image<P, S>(buf: &Buffer<S>) -> Result<ImageBuffer<P, Vec<S>>>
where
    P: Pixel<Subpixel = S>,
    S: Primitive + Pod,
{
    let expected = P::CHANNEL_COUNT as usize;
    if buf.channels() != expected {
        return Err(CarveError::ChannelMismatch {
            expected,
            found: buf.channels(),
        });
    }
    if buf.residency() == Residency::DeviceOnly {
        return Err(CarveError::Sync {
            direction: SyncDirection::ToHost,
            reason: "buffer is device-dirty; sync_to_host first".to_owned(),
        });
    }
    match ImageBuffer::from_raw(buf.width() as u32, buf.height() as u32, buf.host().to_vec()) {
        Some(img) => Ok(img),
        // Unreachable while Buffer's length invariant holds (host
        // storage is exactly the extent product); if it ever trips,
        // the residual cause is a shape problem, not a channel one.
        None => Err(CarveError::Allocation {
            extents: buf.extents().to_vec(),
            elem_size: std::mem::size_of::<S>(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carver::seamcarve;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn round_trip_preserves_pixels() {
        let img = RgbImage::from_fn(4, 3, |x, y| Rgb([x as u8, y as u8, (x + y) as u8]));
        let buf = from_image(&img).unwrap();
        assert_eq!(buf.extents(), &[4, 3, 3]);
        let back: RgbImage = to_image(&buf).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn channel_mismatch_is_rejected() {
        let img = GrayImage::from_pixel(2, 2, Luma([9]));
        let buf = from_image(&img).unwrap();
        let result: Result<RgbImage> = to_image(&buf);
        assert!(matches!(
            result,
            Err(CarveError::ChannelMismatch {
                expected: 3,
                found: 1
            })
        ));
    }

    #[test]
    fn carve_a_real_image_end_to_end() {
        // A flat gray image with a white column at x=5: the carve must
        // never eat the busy column's flanks before the flat regions,
        // and the output must decode back into an image of the target
        // width.
        let img = GrayImage::from_fn(8, 4, |x, _| Luma([if x == 5 { 255 } else { 64 }]));
        let buf = from_image(&img).unwrap();
        let out = seamcarve(buf, 6).unwrap();
        let carved: GrayImage = to_image(&out).unwrap();
        assert_eq!(carved.dimensions(), (6, 4));
        // The white line survives: exactly one column of 255s remains.
        let white_cols = (0..6)
            .filter(|&x| (0..4).all(|y| carved.get_pixel(x, y)[0] == 255))
            .count();
        assert_eq!(white_cols, 1);
    }
}
