// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - the main driver.
//!
//! Repeats the energy → find → remove cycle, one column per iteration,
//! until the working image reaches the target width.  The driver owns
//! the source buffer exclusively for the duration of a carve; a failed
//! carve cannot be resumed, only restarted from the original image.

use bytemuck::Pod;
use num_traits::ToPrimitive;

use crate::buffer::Buffer;
use crate::energy::compute_energy;
use crate::error::{CarveError, Result};
use crate::seam::{find_vertical_seam, Seam};

/// Driver lifecycle.  `Carving` is only ever observable from within
/// the loop itself; callers see `Ready`, `Done`, or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarveState {
    Ready,
    Carving,
    Done,
    Failed,
}

/// Excise one vertical seam, producing a buffer one column narrower.
///
/// Each row is copied as two runs split at the seam column, so the
/// pixels beyond the cut shift one column toward lower indices.  The
/// input is never mutated; the result is fresh, `HostOnly`, and has
/// the same height and channel extents.
pub fn remove_vertical_seam<T: Pod>(image: &Buffer<T>, seam: &Seam) -> Result<Buffer<T>> {
    let (width, height, channels) = (image.width(), image.height(), image.channels());
    debug_assert_eq!(seam.len(), height);
    debug_assert!(seam.is_valid(width));

    let mut extents = image.extents().to_vec();
    extents[0] = width - 1;
    let mut out = Buffer::allocate(&extents)?;

    let src = image.host();
    let src_row = width * channels;
    let dst_row = (width - 1) * channels;
    for (y, &cut) in seam.columns().iter().enumerate() {
        let srow = &src[y * src_row..(y + 1) * src_row];
        let drow = &mut out.host_mut()[y * dst_row..(y + 1) * dst_row];
        let split = cut * channels;
        drow[..split].copy_from_slice(&srow[..split]);
        drow[split..].copy_from_slice(&srow[split + channels..]);
    }
    out.mark_host_dirty();
    Ok(out)
}

/// A struct for holding the image to be carved.
///
/// Takes the source buffer by value: while a carve is in progress no
/// one else may touch it, and the state machine below decides whether
/// it ever comes back out.
pub struct SeamCarver<T>
where
    T: Pod + ToPrimitive + Sync,
{
    source: Buffer<T>,
    state: CarveState,
}

impl<T> SeamCarver<T>
where
    T: Pod + ToPrimitive + Sync,
{
    /// Creates a new SeamCarver owning the image to be carved.
    pub fn new(source: Buffer<T>) -> Self {
        SeamCarver {
            source,
            state: CarveState::Ready,
        }
    }

    pub fn state(&self) -> CarveState {
        self.state
    }

    /// The untouched source image.
    pub fn source(&self) -> &Buffer<T> {
        &self.source
    }

    /// Carve down to `target_width`, returning a fresh `HostOnly`
    /// buffer with height and channels unchanged.
    ///
    /// A target outside `[1, width]` fails with `InvalidTarget` before
    /// any work begins, leaving the source bytes and residency alone.
    /// Any failure inside the loop surfaces wrapped in
    /// [`CarveError::Iteration`]; no partial-width image is ever
    /// returned.
    pub fn carve(&mut self, target_width: usize) -> Result<Buffer<T>> {
        if self.state != CarveState::Ready {
            return Err(CarveError::InvalidState { state: self.state });
        }
        let width = self.source.width();
        if target_width == 0 || target_width > width {
            self.state = CarveState::Failed;
            return Err(CarveError::InvalidTarget {
                target: target_width,
                width,
            });
        }

        self.state = CarveState::Carving;
        match self.run(target_width) {
            Ok(out) => {
                self.state = CarveState::Done;
                Ok(out)
            }
            Err(e) => {
                self.state = CarveState::Failed;
                Err(e)
            }
        }
    }

    /// Carve with the target taken from the output buffer's own
    /// declared extents: `out.width()` is the target, so the iteration
    /// count is `source.width() - out.width()`.  Height and channel
    /// extents must match the source.  On success `out` holds the
    /// carved pixels and is marked host-dirty.
    pub fn carve_into(&mut self, out: &mut Buffer<T>) -> Result<()> {
        // The lifecycle guard runs before any extent checking, so a
        // finished or failed carver reports `InvalidState` here just
        // as `carve` would, and keeps its state.
        if self.state != CarveState::Ready {
            return Err(CarveError::InvalidState { state: self.state });
        }
        let target = out.width();
        if out.height() != self.source.height() || out.channels() != self.source.channels() {
            self.state = CarveState::Failed;
            return Err(CarveError::InvalidTarget {
                target,
                width: self.source.width(),
            });
        }
        let carved = self.carve(target)?;
        out.host_mut().copy_from_slice(carved.host());
        out.mark_host_dirty();
        Ok(())
    }

    fn run(&mut self, target_width: usize) -> Result<Buffer<T>> {
        self.source.sync_to_host()?;
        let mut scratch = self.source.clone_host()?;

        let mut iteration = 0usize;
        while scratch.width() > target_width {
            let width = scratch.width();
            scratch = carve_step(&scratch).map_err(|e| CarveError::Iteration {
                iteration,
                width,
                source: Box::new(e),
            })?;
            tracing::debug!(iteration, width = scratch.width(), "removed seam");
            iteration += 1;
        }
        Ok(scratch)
    }
}

// One full energy/find/remove cycle.
fn carve_step<T>(image: &Buffer<T>) -> Result<Buffer<T>>
where
    T: Pod + ToPrimitive + Sync,
{
    let energy = compute_energy(image)?;
    let seam = find_vertical_seam(&energy);
    remove_vertical_seam(image, &seam)
}

/// One-shot convenience wrapper around [`SeamCarver`].
pub fn seamcarve<T>(image: Buffer<T>, target_width: usize) -> Result<Buffer<T>>
where
    T: Pod + ToPrimitive + Sync,
{
    let mut carver = SeamCarver::new(image);
    carver.carve(target_width)
}
