// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error types for the carving pipeline.
//!
//! Every fallible operation in this crate reports one of these kinds.
//! None of them are retried internally; the caller gets the originating
//! iteration and dimensions and decides what to do.

use std::fmt;

use thiserror::Error;

use crate::carver::CarveState;

/// Which way a host/device copy was headed when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    ToHost,
    ToDevice,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::ToHost => write!(f, "device-to-host"),
            SyncDirection::ToDevice => write!(f, "host-to-device"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CarveError {
    /// The extent product overflowed, the extents were malformed, or the
    /// host reservation itself failed.
    #[error("cannot allocate buffer with extents {extents:?} and element size {elem_size}")]
    Allocation {
        extents: Vec<usize>,
        elem_size: usize,
    },

    /// Target width outside `[1, width]`, or an output buffer whose
    /// height/channel extents disagree with the source.
    #[error("invalid target width {target} for source width {width}")]
    InvalidTarget { target: usize, width: usize },

    /// A host/device copy failed, or was required but no live backing
    /// store was attached. Fatal: downstream computation would read
    /// stale data.
    #[error("{direction} sync failed: {reason}")]
    Sync {
        direction: SyncDirection,
        reason: String,
    },

    /// A failure inside the carving loop, wrapped with enough context
    /// to reproduce it.
    #[error("carve iteration {iteration} failed at width {width}")]
    Iteration {
        iteration: usize,
        width: usize,
        #[source]
        source: Box<CarveError>,
    },

    /// A finished or failed carver was asked to carve again. Restart
    /// from the original image instead.
    #[error("carver is in state {state:?} and cannot be restarted")]
    InvalidState { state: CarveState },

    /// The buffer's channel extent does not match the requested pixel type.
    #[error("pixel type has {expected} channels but buffer has {found}")]
    ChannelMismatch { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, CarveError>;
