//! Row control registry
//!
//! Links table rows to their controls, in page order.

use crate::control::{RowControl, RowController};
use indexmap::IndexMap;
use seqqc_dom::widgets::radio_group_name;
use std::sync::Arc;

/// Controls of one page keyed by row id
#[derive(Debug, Default, Clone)]
pub struct ControlRegistry {
    controls: IndexMap<String, Arc<RowControl>>,
}

impl ControlRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a control, replacing any control of the same row
    pub fn insert(&mut self, control: Arc<RowControl>) {
        self.controls.insert(control.row_id().to_string(), control);
    }

    /// Control of a row
    #[must_use]
    pub fn get(&self, row_id: &str) -> Option<&Arc<RowControl>> {
        self.controls.get(row_id)
    }

    /// Control owning a radio group
    #[must_use]
    pub fn by_radio_group(&self, group: &str) -> Option<&Arc<RowControl>> {
        self.controls
            .iter()
            .find(|(row_id, _)| radio_group_name(row_id) == group)
            .map(|(_, control)| control)
    }

    /// Controls in page order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RowControl>> {
        self.controls.values()
    }

    /// Controls as their shared capability
    #[must_use]
    pub fn controllers(&self) -> Vec<Arc<dyn RowController>> {
        self.controls
            .values()
            .map(|c| Arc::clone(c) as Arc<dyn RowController>)
            .collect()
    }

    /// Number of controls
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.controls.len()
    }

    /// Check if no control is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}
