//! Drawing programs and their registry.
//!
//! A program is a stateless drawing routine selected by an entity's
//! type tag: a pure function of its inputs plus the shared backend, with
//! no per-entity state. The registry maps tags to boxed programs, node
//! and edge sides independently, and is seeded with the builtins the
//! default tags point at (`circle`, `line`, `arrow`). Label text is
//! included in the inputs, but the builtins leave it to the renderer's
//! label pass, which also handles grid culling.

use egui::{Color32, Pos2, Stroke};
use indexmap::IndexMap;

use crate::backend::DrawingBackend;

pub const STROKE_WIDTH: f32 = 1.0;
const HIGHLIGHT_STROKE_WIDTH: f32 = 2.0;

/// Inputs to a node program: already transformed into viewport space.
pub struct NodeParams<'a> {
    pub position: Pos2,
    /// Radius in pixels.
    pub size: f32,
    pub color: Color32,
    pub label: Option<&'a str>,
    pub highlighted: bool,
}

/// Inputs to an edge program: both resolved endpoints, viewport space.
pub struct EdgeParams<'a> {
    pub source: Pos2,
    pub source_size: f32,
    pub target: Pos2,
    pub target_size: f32,
    pub color: Color32,
    pub label: Option<&'a str>,
}

pub trait NodeProgram {
    fn draw(&self, backend: &mut dyn DrawingBackend, params: &NodeParams<'_>);
}

pub trait EdgeProgram {
    fn draw(&self, backend: &mut dyn DrawingBackend, params: &EdgeParams<'_>);
}

/// The builtin `circle` node program.
pub struct CircleNode;

impl NodeProgram for CircleNode {
    fn draw(&self, backend: &mut dyn DrawingBackend, params: &NodeParams<'_>) {
        let stroke = if params.highlighted {
            Stroke::new(HIGHLIGHT_STROKE_WIDTH, Color32::WHITE)
        } else {
            Stroke::NONE
        };
        backend.circle(params.position, params.size, params.color, stroke);
    }
}

/// The builtin `line` edge program.
pub struct LineEdge;

impl EdgeProgram for LineEdge {
    fn draw(&self, backend: &mut dyn DrawingBackend, params: &EdgeParams<'_>) {
        backend.line(
            params.source,
            params.target,
            Stroke::new(STROKE_WIDTH, params.color),
        );
    }
}

/// The builtin `arrow` edge program: the head stops at the target's
/// radius rather than its centre.
pub struct ArrowEdge;

impl EdgeProgram for ArrowEdge {
    fn draw(&self, backend: &mut dyn DrawingBackend, params: &EdgeParams<'_>) {
        let dir = (params.target - params.source).normalized();
        let tip = if dir.is_finite() {
            params.target - dir * params.target_size
        } else {
            params.target
        };
        backend.arrow(
            params.source,
            tip,
            Stroke::new(STROKE_WIDTH, params.color),
            params.target_size.max(4.0),
        );
    }
}

/// Tag-to-program mapping, node and edge sides independent. Exactly one
/// program per tag; registering an existing tag replaces it.
pub struct ProgramRegistry {
    node_programs: IndexMap<String, Box<dyn NodeProgram>>,
    edge_programs: IndexMap<String, Box<dyn EdgeProgram>>,
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        let mut registry = Self {
            node_programs: IndexMap::new(),
            edge_programs: IndexMap::new(),
        };
        registry.register_node("circle", Box::new(CircleNode));
        registry.register_edge("line", Box::new(LineEdge));
        registry.register_edge("arrow", Box::new(ArrowEdge));
        registry
    }
}

impl ProgramRegistry {
    pub fn register_node(&mut self, tag: impl Into<String>, program: Box<dyn NodeProgram>) {
        self.node_programs.insert(tag.into(), program);
    }

    pub fn register_edge(&mut self, tag: impl Into<String>, program: Box<dyn EdgeProgram>) {
        self.edge_programs.insert(tag.into(), program);
    }

    #[must_use]
    pub fn node(&self, tag: &str) -> Option<&dyn NodeProgram> {
        self.node_programs.get(tag).map(Box::as_ref)
    }

    #[must_use]
    pub fn edge(&self, tag: &str) -> Option<&dyn EdgeProgram> {
        self.edge_programs.get(tag).map(Box::as_ref)
    }
}
