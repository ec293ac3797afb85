//! The pointer-gesture state machine.
//!
//! Two states, `Idle` and `Dragging(node)`, driven by the renderer's
//! pointer events. Dragging moves a node through the camera's inverse
//! transform; clicking empty canvas creates a node and auto-connects it
//! to its two nearest neighbours (squared Euclidean distance, ties
//! broken by store insertion order). A node removed out from under an
//! in-progress drag cancels the gesture silently.

use egui::Pos2;
use tracing::debug;

use ig_core::attributes::{EdgeAttributes, NodeAttributes};
use ig_core::graph::{EdgeKey, GraphStore, NodeId};

use crate::renderer::{PointerEvent, Renderer};

/// Supplies the visual attributes for a node created by clicking the
/// stage. Colour and label generation stay outside the engine.
pub type NodeFactory = Box<dyn FnMut(Pos2) -> NodeAttributes>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DragState {
    Idle,
    Dragging(NodeId),
}

pub struct InteractionController {
    state: DragState,
    new_node: NodeFactory,
}

impl InteractionController {
    pub fn new(new_node: NodeFactory) -> Self {
        Self {
            state: DragState::Idle,
            new_node,
        }
    }

    #[must_use]
    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn handle(&mut self, event: PointerEvent, store: &mut GraphStore, renderer: &mut Renderer) {
        match event {
            PointerEvent::DownNode(node) => self.begin_drag(node, store, renderer),
            PointerEvent::MouseMove(pos) => self.drag_to(pos, store, renderer),
            PointerEvent::MouseUp(_) => self.end_drag(store, renderer),
            PointerEvent::ClickStage(pos) => self.create_node(pos, store, renderer),
            PointerEvent::MouseDown(_) => {}
        }
    }

    fn begin_drag(&mut self, node: NodeId, store: &mut GraphStore, renderer: &mut Renderer) {
        if !matches!(self.state, DragState::Idle) {
            return;
        }
        let Ok(attrs) = store.node_mut(node) else {
            return;
        };
        attrs.highlighted = true;
        self.state = DragState::Dragging(node);

        // Freeze the view for the duration of the gesture: pin the
        // current bounding box so the camera stops following content,
        // and block pan/zoom updates.
        let camera = renderer.camera_mut();
        if camera.bounding_box().is_none() {
            camera.set_bounding_box(Some(camera.current_bounds()));
        }
        camera.disable();
    }

    fn drag_to(&mut self, pos: Pos2, store: &mut GraphStore, renderer: &mut Renderer) {
        let DragState::Dragging(node) = self.state else {
            return;
        };
        let point = renderer.viewport_to_graph(pos);
        match store.node_mut(node) {
            Ok(attrs) => {
                attrs.x = point.x;
                attrs.y = point.y;
            }
            Err(_) => {
                // The dragged node was removed externally; cancel.
                debug!("dragged node {node} vanished, cancelling gesture");
                self.state = DragState::Idle;
                renderer.camera_mut().enable();
            }
        }
    }

    fn end_drag(&mut self, store: &mut GraphStore, renderer: &mut Renderer) {
        let DragState::Dragging(node) = self.state else {
            return;
        };
        if let Ok(attrs) = store.node_mut(node) {
            attrs.highlighted = false;
        }
        self.state = DragState::Idle;
        renderer.camera_mut().enable();
    }

    /// Creates a node at the clicked point and connects it to the two
    /// nearest existing nodes (one edge if only one other node exists,
    /// none if the graph was empty). The node is always created before
    /// any of its edges.
    fn create_node(&mut self, pos: Pos2, store: &mut GraphStore, renderer: &mut Renderer) {
        let point = renderer.viewport_to_graph(pos);
        let neighbours = nearest_two(store, point);

        let id = store.fresh_node_id();
        let mut attrs = (self.new_node)(point);
        attrs.x = point.x;
        attrs.y = point.y;
        if let Err(err) = store.add_node(id, attrs) {
            debug!("could not create node: {err}");
            return;
        }
        for neighbour in neighbours {
            if let Err(err) = store.add_edge(EdgeKey::new(id, neighbour), EdgeAttributes::default())
            {
                debug!("could not auto-connect {id}: {err}");
            }
        }
    }
}

/// The two nodes closest to `point` by squared Euclidean distance.
/// Comparison is strict, so an exact distance tie is won by the node
/// encountered first in store iteration order (insertion order).
fn nearest_two(store: &GraphStore, point: Pos2) -> Vec<NodeId> {
    let mut best: [Option<(f32, NodeId)>; 2] = [None, None];
    for (id, attrs) in store.nodes() {
        let distance = (attrs.x - point.x).powi(2) + (attrs.y - point.y).powi(2);
        if best[0].is_none_or(|(d, _)| distance < d) {
            best[1] = best[0];
            best[0] = Some((distance, id));
        } else if best[1].is_none_or(|(d, _)| distance < d) {
            best[1] = Some((distance, id));
        }
    }
    best.into_iter().flatten().map(|(_, id)| id).collect()
}
