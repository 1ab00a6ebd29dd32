//! # Surface Host Service
//!
//! Owns the page's display surfaces and mediates every mutation.
//!
//! ## Philosophy
//!
//! - **Host-owned state**: renderers never hold a surface directly;
//!   they go through the host by ID
//! - **Monotonic revisions**: each mutation strictly increases the
//!   surface revision, so observers can detect staleness
//! - **Labels are unique**: a label addresses exactly one surface
//!
//! ## Non-Goals
//!
//! This is NOT:
//! - A compositor
//! - A layout engine
//! - A retained widget tree

use std::collections::HashMap;
use surface_types::{SurfaceFrame, SurfaceId};
use thiserror::Error;

/// Surface host error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceHostError {
    #[error("Surface not found: {0}")]
    SurfaceNotFound(SurfaceId),

    #[error("Label already registered: {0}")]
    LabelAlreadyRegistered(String),
}

/// Internal state for one surface
#[derive(Debug, Clone)]
struct SurfaceRecord {
    surface_id: SurfaceId,
    label: String,
    text: String,
    visible: bool,
    revision: u64,
}

impl SurfaceRecord {
    fn new(surface_id: SurfaceId, label: String) -> Self {
        Self {
            surface_id,
            label,
            text: String::new(),
            visible: true,
            revision: 0,
        }
    }

    fn frame(&self) -> SurfaceFrame {
        SurfaceFrame {
            surface_id: self.surface_id,
            label: self.label.clone(),
            text: self.text.clone(),
            visible: self.visible,
            revision: self.revision,
        }
    }
}

/// Surface host service
///
/// Registers surfaces by unique label and applies content/visibility
/// updates with revision bookkeeping.
pub struct SurfaceHost {
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    by_label: HashMap<String, SurfaceId>,
}

impl SurfaceHost {
    /// Creates a new surface host with no surfaces
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
            by_label: HashMap::new(),
        }
    }

    /// Registers a new surface under a unique label
    ///
    /// Surfaces start visible with empty text at revision 0.
    pub fn register(&mut self, label: impl Into<String>) -> Result<SurfaceId, SurfaceHostError> {
        let label = label.into();
        if self.by_label.contains_key(&label) {
            return Err(SurfaceHostError::LabelAlreadyRegistered(label));
        }

        let surface_id = SurfaceId::new();
        self.by_label.insert(label.clone(), surface_id);
        self.surfaces
            .insert(surface_id, SurfaceRecord::new(surface_id, label));

        Ok(surface_id)
    }

    /// Resolves a label to its surface ID
    pub fn resolve(&self, label: &str) -> Option<SurfaceId> {
        self.by_label.get(label).copied()
    }

    /// Sets a surface's text content, bumping its revision
    pub fn set_text(
        &mut self,
        surface_id: SurfaceId,
        text: impl Into<String>,
    ) -> Result<u64, SurfaceHostError> {
        let record = self.record_mut(surface_id)?;
        record.text = text.into();
        record.revision += 1;
        Ok(record.revision)
    }

    /// Sets a surface's visibility flag, bumping its revision
    pub fn set_visible(
        &mut self,
        surface_id: SurfaceId,
        visible: bool,
    ) -> Result<u64, SurfaceHostError> {
        let record = self.record_mut(surface_id)?;
        record.visible = visible;
        record.revision += 1;
        Ok(record.revision)
    }

    /// Returns the current text content of a surface
    pub fn text(&self, surface_id: SurfaceId) -> Result<&str, SurfaceHostError> {
        Ok(&self.record(surface_id)?.text)
    }

    /// Returns whether a surface is visible
    pub fn is_visible(&self, surface_id: SurfaceId) -> Result<bool, SurfaceHostError> {
        Ok(self.record(surface_id)?.visible)
    }

    /// Takes an immutable snapshot frame of a surface
    pub fn frame(&self, surface_id: SurfaceId) -> Result<SurfaceFrame, SurfaceHostError> {
        Ok(self.record(surface_id)?.frame())
    }

    /// Lists all registered surface IDs with their labels
    pub fn list(&self) -> Vec<(SurfaceId, String)> {
        self.surfaces
            .values()
            .map(|record| (record.surface_id, record.label.clone()))
            .collect()
    }

    fn record(&self, surface_id: SurfaceId) -> Result<&SurfaceRecord, SurfaceHostError> {
        self.surfaces
            .get(&surface_id)
            .ok_or(SurfaceHostError::SurfaceNotFound(surface_id))
    }

    fn record_mut(&mut self, surface_id: SurfaceId) -> Result<&mut SurfaceRecord, SurfaceHostError> {
        self.surfaces
            .get_mut(&surface_id)
            .ok_or(SurfaceHostError::SurfaceNotFound(surface_id))
    }
}

impl Default for SurfaceHost {
    fn default() -> Self {
        Self::new()
    }
}
