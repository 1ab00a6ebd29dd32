#![no_std]

//! # Surface Types
//!
//! Stable types for display surfaces: the text-bearing elements that
//! renderers write into.
//!
//! ## Philosophy
//!
//! - **Surfaces, not widgets**: a surface is addressable text plus a
//!   visibility flag; layout and styling live elsewhere
//! - **Immutable frames**: observations of a surface are snapshot
//!   frames, replaced by revision
//! - **Monotonic revisions**: every mutation strictly increases the
//!   surface revision
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A layout engine
//! - A styling system
//! - A widget toolkit

extern crate alloc;

use alloc::string::String;
use core::fmt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    /// Creates a new unique surface ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a SurfaceId from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface:{}", self.0)
    }
}

/// Immutable snapshot of a surface's state
///
/// Frames are what observers (tests, compositors, the demo loop) see;
/// they carry the revision so staleness is detectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceFrame {
    /// Surface this frame was taken from
    pub surface_id: SurfaceId,
    /// The surface's registration label
    pub label: String,
    /// Text content at snapshot time
    pub text: String,
    /// Whether the surface was visible
    pub visible: bool,
    /// Monotonic revision at snapshot time
    pub revision: u64,
}

impl SurfaceFrame {
    /// Checks if this frame supersedes another frame of the same surface
    pub fn is_newer_than(&self, other: &SurfaceFrame) -> bool {
        self.surface_id == other.surface_id && self.revision > other.revision
    }
}
