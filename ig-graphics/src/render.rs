//! The per-frame render pass.
//!
//! For every visible entity: resolve its type tag to a program, apply
//! the reducer, transform through the camera, invoke the program.
//! Edges are drawn before nodes so glyphs are not occluded, unless the
//! z-index feature is on, in which case all entities are ordered by
//! their `z` attribute (stable sort, ties keep insertion order).
//!
//! A single bad entity never aborts the frame: unknown tags fall back
//! to the default program (warned once per tag), and a failing reducer
//! degrades that entity to its stored attributes (warned once per run).

use egui::{Color32, Pos2, vec2};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use tracing::warn;

use ig_core::attributes::{Color, EdgeAttributes, NodeAttributes};
use ig_core::graph::{EdgeKey, GraphStore, NodeId};

use crate::backend::DrawingBackend;
use crate::camera::Camera;
use crate::program::{EdgeParams, EdgeProgram, NodeParams, NodeProgram};
use crate::settings::Settings;

const LABEL_GAP: f32 = 3.0;
const LABEL_COLOR: Color32 = Color32::from_gray(0x22);

/// Per-run bookkeeping so failures are reported once, not
/// per-frame-per-entity.
#[derive(Default)]
pub struct RenderState {
    warned_node_tags: IndexSet<String>,
    warned_edge_tags: IndexSet<String>,
    node_reducer_warned: bool,
    edge_reducer_warned: bool,
}

/// Draws one frame of the store through `backend`. `moving` is true
/// while a pointer gesture is active and drives the hide-on-move
/// settings. Idempotent: always reflects current store state.
pub fn render_graph(
    store: &GraphStore,
    settings: &Settings,
    camera: &Camera,
    moving: bool,
    backend: &mut dyn DrawingBackend,
    state: &mut RenderState,
) {
    // Reduce nodes up front; edges resolve their endpoint positions
    // against the reduced attributes.
    let nodes: IndexMap<NodeId, NodeAttributes> = store
        .nodes()
        .map(|(id, attrs)| (id, reduce_node(settings, state, id, attrs)))
        .collect();

    let hide_edges = moving && settings.hide_edges_on_move;
    let edges: Vec<(EdgeKey, EdgeAttributes)> = if hide_edges {
        Vec::new()
    } else {
        store
            .edges()
            .map(|(key, attrs)| (key, reduce_edge(settings, state, key, attrs)))
            .collect()
    };

    enum Item {
        Edge(usize),
        Node(usize),
    }

    let items = edges
        .iter()
        .enumerate()
        .map(|(i, (_, attrs))| (attrs.z, Item::Edge(i)))
        .chain(
            nodes
                .values()
                .enumerate()
                .map(|(i, attrs)| (attrs.z, Item::Node(i))),
        );
    let items: Vec<(i32, Item)> = if settings.z_index {
        // `sorted_by_key` is stable, so z ties keep insertion order.
        items.sorted_by_key(|(z, _)| *z).collect()
    } else {
        items.collect()
    };

    for (_, item) in items {
        match item {
            Item::Edge(i) => {
                let (key, attrs) = &edges[i];
                let (Some(source), Some(target)) = (nodes.get(&key.source), nodes.get(&key.target))
                else {
                    continue;
                };
                let Some(program) = edge_program(settings, state, attrs.edge_type.as_deref())
                else {
                    continue;
                };
                program.draw(
                    backend,
                    &EdgeParams {
                        source: camera.graph_to_viewport(position(source)),
                        source_size: source.size * camera.scale(),
                        target: camera.graph_to_viewport(position(target)),
                        target_size: target.size * camera.scale(),
                        color: to_color32(attrs.color.unwrap_or(settings.default_edge_color)),
                        label: attrs.label.as_deref(),
                    },
                );
            }
            Item::Node(i) => {
                let Some((_, attrs)) = nodes.get_index(i) else {
                    continue;
                };
                let Some(program) = node_program(settings, state, attrs.node_type.as_deref())
                else {
                    continue;
                };
                program.draw(
                    backend,
                    &NodeParams {
                        position: camera.graph_to_viewport(position(attrs)),
                        size: attrs.size * camera.scale(),
                        color: to_color32(attrs.color.unwrap_or(settings.default_node_color)),
                        label: attrs.label.as_deref(),
                        highlighted: attrs.highlighted,
                    },
                );
            }
        }
    }

    let hide_labels = moving && settings.hide_labels_on_move;

    if settings.render_labels && !hide_labels {
        draw_node_labels(&nodes, settings, camera, backend);
    }

    if settings.render_edge_labels && !hide_labels && !hide_edges {
        for (key, attrs) in &edges {
            let Some(label) = attrs.label.as_deref() else {
                continue;
            };
            let (Some(source), Some(target)) = (nodes.get(&key.source), nodes.get(&key.target))
            else {
                continue;
            };
            let midpoint = camera
                .graph_to_viewport(position(source))
                .lerp(camera.graph_to_viewport(position(target)), 0.5);
            backend.text(midpoint, label, settings.edge_label_size, LABEL_COLOR);
        }
    }
}

/// Labels drawn beside their node, with threshold and grid culling: a
/// label is skipped when the node renders smaller than the configured
/// threshold, and each grid cell keeps only its first label (insertion
/// order).
fn draw_node_labels(
    nodes: &IndexMap<NodeId, NodeAttributes>,
    settings: &Settings,
    camera: &Camera,
    backend: &mut dyn DrawingBackend,
) {
    let mut occupied: IndexSet<(i64, i64)> = IndexSet::new();
    for attrs in nodes.values() {
        let Some(label) = attrs.label.as_deref() else {
            continue;
        };
        let radius = attrs.size * camera.scale();
        if radius < settings.label_grid.rendered_size_threshold {
            continue;
        }
        let anchor = camera.graph_to_viewport(position(attrs)) + vec2(radius + LABEL_GAP, 0.0);
        if let Some(cell) = settings.label_grid.cell {
            let bucket = (
                (anchor.x / cell.width).floor() as i64,
                (anchor.y / cell.height).floor() as i64,
            );
            if !occupied.insert(bucket) {
                continue;
            }
        }
        backend.text(anchor, label, settings.label_size, LABEL_COLOR);
    }
}

/// Topmost node whose visual hit-area contains the viewport point.
/// Hit testing happens in viewport space so it tracks the current zoom;
/// the last node drawn (insertion order) wins overlaps.
#[must_use]
pub fn node_at(store: &GraphStore, camera: &Camera, pos: Pos2) -> Option<NodeId> {
    store
        .nodes()
        .filter(|(_, attrs)| {
            let centre = camera.graph_to_viewport(position(attrs));
            (pos - centre).length_sq() <= (attrs.size * camera.scale()).powi(2)
        })
        .map(|(id, _)| id)
        .last()
}

fn position(attrs: &NodeAttributes) -> Pos2 {
    Pos2::new(attrs.x, attrs.y)
}

fn to_color32(color: Color) -> Color32 {
    Color32::from_rgb(color.r, color.g, color.b)
}

fn reduce_node(
    settings: &Settings,
    state: &mut RenderState,
    id: NodeId,
    attrs: &NodeAttributes,
) -> NodeAttributes {
    let Some(reducer) = &settings.node_reducer else {
        return attrs.clone();
    };
    match reducer(id, attrs.clone()) {
        Ok(reduced) => reduced,
        Err(err) => {
            if !state.node_reducer_warned {
                state.node_reducer_warned = true;
                warn!("node reducer failed, using stored attributes: {err}");
            }
            attrs.clone()
        }
    }
}

fn reduce_edge(
    settings: &Settings,
    state: &mut RenderState,
    key: EdgeKey,
    attrs: &EdgeAttributes,
) -> EdgeAttributes {
    let Some(reducer) = &settings.edge_reducer else {
        return attrs.clone();
    };
    match reducer(key, attrs.clone()) {
        Ok(reduced) => reduced,
        Err(err) => {
            if !state.edge_reducer_warned {
                state.edge_reducer_warned = true;
                warn!("edge reducer failed, using stored attributes: {err}");
            }
            attrs.clone()
        }
    }
}

fn node_program<'a>(
    settings: &'a Settings,
    state: &mut RenderState,
    tag: Option<&str>,
) -> Option<&'a dyn NodeProgram> {
    let tag = tag.unwrap_or(&settings.default_node_type);
    if let Some(program) = settings.programs.node(tag) {
        return Some(program);
    }
    if state.warned_node_tags.insert(tag.to_owned()) {
        warn!(
            "unknown node type `{tag}`, falling back to `{}`",
            settings.default_node_type
        );
    }
    settings.programs.node(&settings.default_node_type)
}

fn edge_program<'a>(
    settings: &'a Settings,
    state: &mut RenderState,
    tag: Option<&str>,
) -> Option<&'a dyn EdgeProgram> {
    let tag = tag.unwrap_or(&settings.default_edge_type);
    if let Some(program) = settings.programs.edge(tag) {
        return Some(program);
    }
    if state.warned_edge_tags.insert(tag.to_owned()) {
        warn!(
            "unknown edge type `{tag}`, falling back to `{}`",
            settings.default_edge_type
        );
    }
    settings.programs.edge(&settings.default_edge_type)
}

#[cfg(test)]
mod tests {
    use egui::pos2;

    use crate::backend::{DrawCall, RecordingBackend};
    use crate::camera::content_bounds;
    use crate::settings::{Cell, ReducerError};

    use super::*;

    fn seeded() -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::new();
        let ids: Vec<_> = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]
            .into_iter()
            .map(|(x, y)| {
                let id = store.fresh_node_id();
                store.add_node(id, NodeAttributes::at(x, y)).unwrap();
                id
            })
            .collect();
        store
            .add_edge(EdgeKey::new(ids[0], ids[1]), EdgeAttributes::default())
            .unwrap();
        (store, ids)
    }

    fn fitted_camera(store: &GraphStore) -> Camera {
        let mut camera = Camera::default();
        camera.refit(content_bounds(store), vec2(400.0, 400.0));
        camera
    }

    fn draw(store: &GraphStore, settings: &Settings, moving: bool) -> RecordingBackend {
        let camera = fitted_camera(store);
        let mut backend = RecordingBackend::new();
        let mut state = RenderState::default();
        render_graph(store, settings, &camera, moving, &mut backend, &mut state);
        backend
    }

    #[test]
    fn draws_every_node_and_edge() {
        let (store, _) = seeded();
        let backend = draw(&store, &Settings::default(), false);
        assert_eq!(backend.circles().count(), 3);
        assert_eq!(
            backend
                .calls
                .iter()
                .filter(|call| matches!(call, DrawCall::Line { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn edges_are_drawn_before_nodes() {
        let (store, _) = seeded();
        let backend = draw(&store, &Settings::default(), false);
        let first_circle = backend
            .calls
            .iter()
            .position(|call| matches!(call, DrawCall::Circle { .. }))
            .unwrap();
        let last_line = backend
            .calls
            .iter()
            .rposition(|call| matches!(call, DrawCall::Line { .. }))
            .unwrap();
        assert!(last_line < first_circle);
    }

    #[test]
    fn z_index_reorders_entities_stably() {
        let (mut store, ids) = seeded();
        store.edge_mut(EdgeKey::new(ids[0], ids[1])).unwrap().z = 1;
        let mut settings = Settings::default();
        settings.z_index = true;

        let backend = draw(&store, &settings, false);
        let first_circle = backend
            .calls
            .iter()
            .position(|call| matches!(call, DrawCall::Circle { .. }))
            .unwrap();
        let line = backend
            .calls
            .iter()
            .position(|call| matches!(call, DrawCall::Line { .. }))
            .unwrap();
        // The z=1 edge now draws after the z=0 nodes.
        assert!(line > first_circle);
    }

    #[test]
    fn unknown_type_falls_back_to_the_default_program() {
        let (mut store, ids) = seeded();
        store.node_mut(ids[0]).unwrap().node_type = Some("hexagon".to_owned());
        let backend = draw(&store, &Settings::default(), false);
        assert_eq!(backend.circles().count(), 3);
    }

    #[test]
    fn arrow_edges_use_the_arrow_program() {
        let (mut store, ids) = seeded();
        store
            .edge_mut(EdgeKey::new(ids[0], ids[1]))
            .unwrap()
            .edge_type = Some("arrow".to_owned());
        let backend = draw(&store, &Settings::default(), false);
        assert!(
            backend
                .calls
                .iter()
                .any(|call| matches!(call, DrawCall::Arrow { .. }))
        );
    }

    #[test]
    fn labels_are_drawn_and_suppressed_on_move() {
        let (mut store, ids) = seeded();
        store.node_mut(ids[0]).unwrap().label = Some("alpha".to_owned());
        let mut settings = Settings::default();
        settings.hide_labels_on_move = true;

        let backend = draw(&store, &settings, false);
        assert_eq!(backend.texts().collect::<Vec<_>>(), vec!["alpha"]);

        let backend = draw(&store, &settings, true);
        assert_eq!(backend.texts().count(), 0);
        // Suppression is view-only.
        assert_eq!(store.node(ids[0]).unwrap().label.as_deref(), Some("alpha"));
    }

    #[test]
    fn hide_edges_on_move_suppresses_edges_only() {
        let (store, _) = seeded();
        let mut settings = Settings::default();
        settings.hide_edges_on_move = true;
        let backend = draw(&store, &settings, true);
        assert_eq!(backend.circles().count(), 3);
        assert!(
            !backend
                .calls
                .iter()
                .any(|call| matches!(call, DrawCall::Line { .. }))
        );
    }

    #[test]
    fn label_grid_keeps_one_label_per_cell() {
        let mut store = GraphStore::new();
        for (x, y) in [(0.0, 0.0), (0.1, 0.1), (10.0, 10.0)] {
            let id = store.fresh_node_id();
            let mut attrs = NodeAttributes::at(x, y);
            attrs.label = Some(format!("{x}"));
            store.add_node(id, attrs).unwrap();
        }
        let mut settings = Settings::default();
        settings.label_grid.cell = Some(Cell {
            width: 100.0,
            height: 100.0,
        });
        settings.validate().unwrap();

        let backend = draw(&store, &settings, false);
        // The two near-coincident nodes share a cell; first one wins.
        assert_eq!(backend.texts().count(), 2);
        assert!(backend.texts().any(|t| t == "0"));
    }

    #[test]
    fn small_nodes_lose_their_labels_below_the_threshold() {
        let (mut store, ids) = seeded();
        store.node_mut(ids[0]).unwrap().label = Some("tiny".to_owned());
        store.node_mut(ids[0]).unwrap().size = 0.01;
        let mut settings = Settings::default();
        settings.label_grid.rendered_size_threshold = 5.0;
        let backend = draw(&store, &settings, false);
        assert_eq!(backend.texts().count(), 0);
    }

    #[test]
    fn reducer_output_is_drawn_but_never_stored() {
        let (store, ids) = seeded();
        let mut settings = Settings::default();
        let dimmed = ids[0];
        settings.node_reducer = Some(Box::new(move |id, mut attrs| {
            if id == dimmed {
                attrs.color = Some(Color::rgb(1, 2, 3));
            }
            Ok(attrs)
        }));

        let backend = draw(&store, &settings, false);
        assert!(backend.calls.iter().any(|call| matches!(
            call,
            DrawCall::Circle { fill, .. } if *fill == Color32::from_rgb(1, 2, 3)
        )));
        assert_eq!(store.node(ids[0]).unwrap().color, None);
    }

    #[test]
    fn failing_reducer_degrades_to_stored_attributes() {
        let (store, _) = seeded();
        let mut settings = Settings::default();
        settings.node_reducer = Some(Box::new(|_, _| Err(ReducerError("boom".to_owned()))));

        let camera = fitted_camera(&store);
        let mut state = RenderState::default();
        let mut backend = RecordingBackend::new();
        render_graph(&store, &settings, &camera, false, &mut backend, &mut state);
        assert_eq!(backend.circles().count(), 3);
        assert!(state.node_reducer_warned);

        // A second frame renders just the same.
        let mut backend = RecordingBackend::new();
        render_graph(&store, &settings, &camera, false, &mut backend, &mut state);
        assert_eq!(backend.circles().count(), 3);
    }

    #[test]
    fn node_at_accounts_for_zoom_and_draw_order() {
        let (mut store, ids) = seeded();
        let camera = fitted_camera(&store);

        let centre = camera.graph_to_viewport(pos2(0.0, 0.0));
        assert_eq!(node_at(&store, &camera, centre), Some(ids[0]));

        let radius = store.node(ids[0]).unwrap().size * camera.scale();
        let outside = centre + vec2(radius * 2.0, 0.0);
        assert_eq!(node_at(&store, &camera, outside), None);

        // A later node overlapping the first one wins the hit.
        let top = store.fresh_node_id();
        store.add_node(top, NodeAttributes::at(0.0, 0.0)).unwrap();
        assert_eq!(node_at(&store, &camera, centre), Some(top));
    }
}
