//! Renderer settings.
//!
//! The full configuration surface: performance toggles, default tags and
//! colours, label styling, the optional label grid, reducers, the
//! z-index feature, and the program registries. Invalid settings are
//! fatal at load time; `validate` is called before a renderer is built
//! and never silently defaults a bad value.

use ig_core::attributes::{Color, EdgeAttributes, NodeAttributes};
use ig_core::graph::{EdgeKey, NodeId};
use thiserror::Error;

use crate::program::ProgramRegistry;

/// Error type reducers use to signal failure; the frame falls back to
/// the stored attributes for that entity.
#[derive(Debug, Error)]
#[error("reducer failed: {0}")]
pub struct ReducerError(pub String);

/// Per-frame, view-only attribute transform. Never mutates the store.
pub type NodeReducer = Box<dyn Fn(NodeId, NodeAttributes) -> Result<NodeAttributes, ReducerError>>;
pub type EdgeReducer =
    Box<dyn Fn(EdgeKey, EdgeAttributes) -> Result<EdgeAttributes, ReducerError>>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error(
        "invalid `label_grid.cell`: width and height must both be positive, got {width} x {height}"
    )]
    InvalidLabelGridCell { width: f32, height: f32 },
    #[error("default node type `{0}` has no registered program")]
    UnknownDefaultNodeType(String),
    #[error("default edge type `{0}` has no registered program")]
    UnknownDefaultEdgeType(String),
}

/// A label-grid cell. Width and height always travel together; a cell
/// with only one of them is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub width: f32,
    pub height: f32,
}

/// Spatial bucketing for labels: at most one label per cell, and labels
/// on nodes rendered smaller than the threshold are culled.
pub struct LabelGrid {
    pub cell: Option<Cell>,
    pub rendered_size_threshold: f32,
}

impl Default for LabelGrid {
    fn default() -> Self {
        Self {
            cell: None,
            rendered_size_threshold: f32::NEG_INFINITY,
        }
    }
}

pub struct Settings {
    // Performance
    pub hide_edges_on_move: bool,
    pub hide_labels_on_move: bool,
    pub render_labels: bool,
    pub render_edge_labels: bool,
    // Component rendering
    pub default_node_color: Color,
    pub default_node_type: String,
    pub default_edge_color: Color,
    pub default_edge_type: String,
    pub label_font: String,
    pub label_size: f32,
    pub label_weight: String,
    pub edge_label_font: String,
    pub edge_label_size: f32,
    pub edge_label_weight: String,
    // Labels
    pub label_grid: LabelGrid,
    // Reducers
    pub node_reducer: Option<NodeReducer>,
    pub edge_reducer: Option<EdgeReducer>,
    // Features
    pub z_index: bool,
    // Programs
    pub programs: ProgramRegistry,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hide_edges_on_move: false,
            hide_labels_on_move: false,
            render_labels: true,
            render_edge_labels: false,
            default_node_color: Color::rgb(0x99, 0x99, 0x99),
            default_node_type: "circle".to_owned(),
            default_edge_color: Color::rgb(0xcc, 0xcc, 0xcc),
            default_edge_type: "line".to_owned(),
            label_font: "Arial".to_owned(),
            label_size: 14.0,
            label_weight: "normal".to_owned(),
            edge_label_font: "Arial".to_owned(),
            edge_label_size: 14.0,
            edge_label_weight: "normal".to_owned(),
            label_grid: LabelGrid::default(),
            node_reducer: None,
            edge_reducer: None,
            z_index: false,
            programs: ProgramRegistry::default(),
        }
    }
}

impl Settings {
    /// Checks that the default tags resolve and the label grid cell is
    /// well-formed. Called once, before the first frame.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(cell) = self.label_grid.cell {
            if cell.width <= 0.0 || cell.height <= 0.0 {
                return Err(SettingsError::InvalidLabelGridCell {
                    width: cell.width,
                    height: cell.height,
                });
            }
        }
        if self.programs.node(&self.default_node_type).is_none() {
            return Err(SettingsError::UnknownDefaultNodeType(
                self.default_node_type.clone(),
            ));
        }
        if self.programs.edge(&self.default_edge_type).is_none() {
            return Err(SettingsError::UnknownDefaultEdgeType(
                self.default_edge_type.clone(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn partial_label_grid_cell_is_fatal() {
        let mut settings = Settings::default();
        settings.label_grid.cell = Some(Cell {
            width: 100.0,
            height: 0.0,
        });
        assert_eq!(
            settings.validate(),
            Err(SettingsError::InvalidLabelGridCell {
                width: 100.0,
                height: 0.0
            })
        );
    }

    #[test]
    fn default_tags_must_resolve() {
        let mut settings = Settings::default();
        settings.default_node_type = "square".to_owned();
        assert_eq!(
            settings.validate(),
            Err(SettingsError::UnknownDefaultNodeType("square".to_owned()))
        );
    }
}
