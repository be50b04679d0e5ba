// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Content-aware width reduction by seam carving.
//!
//! Images live in a [`Buffer`]: a typed multi-dimensional array that
//! tracks whether the authoritative copy of its data is on the host,
//! on an opaque device backing store, or both.  The carving driver
//! repeatedly builds an energy map, finds the minimum-cost vertical
//! seam through it, and excises that seam, until the image reaches the
//! requested width.

pub mod buffer;
pub mod carver;
pub mod energy;
pub mod error;
pub mod interop;
pub mod seam;
pub mod twodmap;

pub use buffer::{Buffer, DeviceStore, HostView, HostViewMut, Residency};
pub use carver::{remove_vertical_seam, seamcarve, CarveState, SeamCarver};
pub use energy::compute_energy;
pub use error::{CarveError, Result, SyncDirection};
pub use seam::{find_vertical_seam, Seam};
