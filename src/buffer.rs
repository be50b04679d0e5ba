// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A typed, multi-dimensional buffer with host/device freshness tracking.
//!
//! `Buffer<T>` owns its host storage outright and holds at most a weak
//! reference to an opaque device backing store; it never allocates or
//! frees device memory itself.  Instead of the classic pair of
//! independent `host_dirty`/`dev_dirty` booleans, freshness is a single
//! [`Residency`] tag, which makes the illegal "both sides stale" state
//! unrepresentable.
//!
//! Synchronization is entirely caller-driven: nothing in here copies
//! implicitly on access, because a hidden transfer inside a per-pixel
//! loop is exactly the kind of surprise this design exists to avoid.
//! Sync before you read, mark dirty after you write.

use std::mem;
use std::sync::Weak;

use bytemuck::Pod;

use crate::error::{CarveError, Result, SyncDirection};

/// Where the authoritative copy of a buffer's data currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// Host copy is authoritative; any device copy is stale.
    HostOnly,
    /// Device copy is authoritative; the host copy is stale.
    DeviceOnly,
    /// Both copies agree.
    Synced,
}

/// An opaque device backing store.
///
/// Allocation, lifetime, and transfer mechanics all belong to whoever
/// implements this; the buffer only asks it to move bytes.  Failures
/// are reported as a reason string and surface as [`CarveError::Sync`].
pub trait DeviceStore: Send + Sync {
    /// Copy `bytes` from the host into device memory.
    fn upload(&self, bytes: &[u8]) -> std::result::Result<(), String>;

    /// Copy device memory into `bytes` on the host.
    fn download(&self, bytes: &mut [u8]) -> std::result::Result<(), String>;
}

/// An N-dimensional array of `T` with extents ordered
/// `[width, height]` or `[width, height, channels]`.
///
/// Host layout is row-major and channel-interleaved:
/// `index(x, y, c) = (y * width + x) * channels + c`.
pub struct Buffer<T: Pod> {
    extents: Vec<usize>,
    data: Vec<T>,
    residency: Residency,
    device: Option<Weak<dyn DeviceStore>>,
}

fn checked_len<T>(extents: &[usize]) -> Result<usize> {
    let err = || CarveError::Allocation {
        extents: extents.to_vec(),
        elem_size: mem::size_of::<T>(),
    };
    // A buffer with a zero extent has no pixels; every consumer from
    // the energy builder down assumes at least one row and column, so
    // degenerate shapes are rejected at construction rather than left
    // to panic mid-carve.
    if extents.len() < 2 || extents.len() > 3 || extents.iter().any(|&e| e == 0) {
        return Err(err());
    }
    let len = extents
        .iter()
        .try_fold(1usize, |acc, &e| acc.checked_mul(e))
        .ok_or_else(err)?;
    // The byte size must be representable too, even though the host
    // vector is counted in elements.
    len.checked_mul(mem::size_of::<T>()).ok_or_else(err)?;
    Ok(len)
}

impl<T: Pod> Buffer<T> {
    /// Reserve zero-filled host storage for the given extents.
    ///
    /// The new buffer is `HostOnly` with no device handle attached.
    /// Overflow of the extent product, a zero extent, or a failed host
    /// reservation yields [`CarveError::Allocation`].
    pub fn allocate(extents: &[usize]) -> Result<Self> {
        let len = checked_len::<T>(extents)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| CarveError::Allocation {
                extents: extents.to_vec(),
                elem_size: mem::size_of::<T>(),
            })?;
        data.resize(len, T::zeroed());
        Ok(Buffer {
            extents: extents.to_vec(),
            data,
            residency: Residency::HostOnly,
            device: None,
        })
    }

    /// Wrap an existing host vector.  Its length must equal the extent
    /// product exactly.
    pub fn from_host(extents: &[usize], data: Vec<T>) -> Result<Self> {
        let len = checked_len::<T>(extents)?;
        if data.len() != len {
            return Err(CarveError::Allocation {
                extents: extents.to_vec(),
                elem_size: mem::size_of::<T>(),
            });
        }
        Ok(Buffer {
            extents: extents.to_vec(),
            data,
            residency: Residency::HostOnly,
            device: None,
        })
    }

    /// Associate a device backing store and declare where the
    /// authoritative copy currently lives.
    pub fn attach_device(&mut self, device: Weak<dyn DeviceStore>, residency: Residency) {
        self.device = Some(device);
        self.residency = residency;
    }

    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    pub fn width(&self) -> usize {
        self.extents[0]
    }

    pub fn height(&self) -> usize {
        self.extents[1]
    }

    /// Channel count; a two-dimensional buffer has one channel.
    pub fn channels(&self) -> usize {
        self.extents.get(2).copied().unwrap_or(1)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn residency(&self) -> Residency {
        self.residency
    }

    /// Record that the host copy was just written.
    pub fn mark_host_dirty(&mut self) {
        self.residency = Residency::HostOnly;
    }

    /// Record that the device copy was just written.
    pub fn mark_device_dirty(&mut self) {
        self.residency = Residency::DeviceOnly;
    }

    /// If the device copy is authoritative, download it and move to
    /// `Synced`.  Otherwise a no-op.
    pub fn sync_to_host(&mut self) -> Result<()> {
        if self.residency != Residency::DeviceOnly {
            return Ok(());
        }
        let store = self.live_device(SyncDirection::ToHost)?;
        store
            .download(bytemuck::cast_slice_mut(&mut self.data))
            .map_err(|reason| CarveError::Sync {
                direction: SyncDirection::ToHost,
                reason,
            })?;
        self.residency = Residency::Synced;
        Ok(())
    }

    /// If the host copy is authoritative, upload it and move to
    /// `Synced`.  Otherwise a no-op.
    pub fn sync_to_device(&mut self) -> Result<()> {
        if self.residency != Residency::HostOnly {
            return Ok(());
        }
        let store = self.live_device(SyncDirection::ToDevice)?;
        store
            .upload(bytemuck::cast_slice(&self.data))
            .map_err(|reason| CarveError::Sync {
                direction: SyncDirection::ToDevice,
                reason,
            })?;
        self.residency = Residency::Synced;
        Ok(())
    }

    fn live_device(&self, direction: SyncDirection) -> Result<std::sync::Arc<dyn DeviceStore>> {
        self.device
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| CarveError::Sync {
                direction,
                reason: "no live device backing store attached".to_owned(),
            })
    }

    /// Raw host storage.  The caller is responsible for having synced
    /// beforehand; a `DeviceOnly` buffer's host data is stale.
    pub fn host(&self) -> &[T] {
        &self.data
    }

    /// Mutable raw host storage.  Mark the buffer host-dirty after
    /// writing through this.
    pub fn host_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Indexed read access into host memory.
    pub fn view(&self) -> HostView<'_, T> {
        HostView {
            data: &self.data,
            width: self.width(),
            channels: self.channels(),
        }
    }

    /// Indexed write access into host memory.  Mark the buffer
    /// host-dirty once done.
    pub fn view_mut(&mut self) -> HostViewMut<'_, T> {
        let width = self.width();
        let channels = self.channels();
        HostViewMut {
            data: &mut self.data,
            width,
            channels,
        }
    }

    /// A fresh `HostOnly` buffer holding a copy of this one's host
    /// data.  No device handle carries over.
    pub fn clone_host(&self) -> Result<Self> {
        if self.residency == Residency::DeviceOnly {
            return Err(CarveError::Sync {
                direction: SyncDirection::ToHost,
                reason: "cannot clone stale host data; sync_to_host first".to_owned(),
            });
        }
        let mut copy = Buffer::allocate(&self.extents)?;
        copy.data.copy_from_slice(&self.data);
        Ok(copy)
    }
}

impl<T: Pod + std::fmt::Debug> std::fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("extents", &self.extents)
            .field("residency", &self.residency)
            .field("device", &self.device.is_some())
            .finish()
    }
}

/// Read-only indexed view over a buffer's host storage.
pub struct HostView<'a, T> {
    data: &'a [T],
    width: usize,
    channels: usize,
}

impl<T: Copy> HostView<'_, T> {
    #[inline]
    fn offset(&self, x: usize, y: usize, c: usize) -> usize {
        (y * self.width + x) * self.channels + c
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> T {
        self.data[self.offset(x, y, c)]
    }
}

/// Mutable indexed view over a buffer's host storage.
pub struct HostViewMut<'a, T> {
    data: &'a mut [T],
    width: usize,
    channels: usize,
}

impl<T: Copy> HostViewMut<'_, T> {
    #[inline]
    fn offset(&self, x: usize, y: usize, c: usize) -> usize {
        (y * self.width + x) * self.channels + c
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, c: usize) -> T {
        self.data[self.offset(x, y, c)]
    }

    #[inline]
    pub fn put(&mut self, x: usize, y: usize, c: usize, v: T) {
        let index = self.offset(x, y, c);
        self.data[index] = v;
    }
}
