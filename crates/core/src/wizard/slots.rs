//! Result slots of a generated batch.
//!
//! Slots are addressed by index for the editor and by [`SlotId`] for work
//! that finishes later (refinements), so a late answer can never land in a
//! slot that was replaced in the meantime.

use crate::error::{AppError, Result};
use crate::model::{SlotId, ThumbnailResult};

#[derive(Debug, Default)]
pub struct Slots {
    entries: Vec<ThumbnailResult>,
}

impl Slots {
    pub fn new(entries: Vec<ThumbnailResult>) -> Self {
        Self { entries }
    }

    pub fn as_slice(&self) -> &[ThumbnailResult] {
        &self.entries
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut ThumbnailResult> {
        self.entries
            .get_mut(index)
            .ok_or(AppError::SlotNotFound(index))
    }

    pub fn by_id_mut(&mut self, id: &SlotId) -> Result<&mut ThumbnailResult> {
        self.entries
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| AppError::StaleSlot(id.to_string()))
    }
}
