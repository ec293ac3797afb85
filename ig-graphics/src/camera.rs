//! Graph-space to viewport-space coordinate transform.
//!
//! The transform has two layers. The *fit* layer is recomputed every
//! frame from the bounding box of the graph content (or from a pinned
//! custom box) and maps that box, plus padding, onto the viewport. The
//! *gesture* layer is user pan/zoom state on top: a view centre stored
//! as a normalised position within the fitted box, and a zoom ratio.
//!
//! Composition order is fixed: translate the view centre to the origin,
//! scale into pixels, then translate to the viewport centre;
//! `viewport(p) = (p - centre) * fit_scale * ratio + viewport / 2`.
//! `viewport_to_graph` is the exact algebraic inverse, so round-trips
//! hold up to floating-point tolerance.

use egui::{Pos2, Rect, Vec2, vec2};
use ig_core::graph::GraphStore;

pub const ZOOM_FACTOR: f32 = 1.25;

/// Relative padding applied around the fitted bounding box.
const PADDING: f32 = 0.1;

/// Degenerate boxes (single node, empty graph) are padded out to this
/// many graph units per axis so the transform stays invertible.
const MIN_EXTENT: f32 = 1.0;

pub struct Camera {
    /// Normalised position of the view centre within the fitted box;
    /// `(0.5, 0.5)` is centred.
    centre: Vec2,
    /// User zoom multiplier; `1.0` shows the fitted box.
    ratio: f32,
    /// While disabled, pan/zoom updates are ignored but the transform
    /// keeps operating on the last-committed state.
    enabled: bool,
    custom_bbox: Option<Rect>,
    // Committed by the last `refit`.
    bbox: Rect,
    viewport: Vec2,
    fit_scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            centre: vec2(0.5, 0.5),
            ratio: 1.0,
            enabled: true,
            custom_bbox: None,
            bbox: Rect::from_center_size(Pos2::ZERO, Vec2::splat(MIN_EXTENT)),
            viewport: vec2(1.0, 1.0),
            fit_scale: 1.0,
        }
    }
}

impl Camera {
    /// Recomputes the fit layer for this frame. When a custom bounding
    /// box is pinned it replaces `content`, so content changes no
    /// longer move the view.
    pub fn refit(&mut self, content: Rect, viewport: Vec2) {
        self.bbox = self.custom_bbox.unwrap_or(content);
        if viewport.x > 0.0 && viewport.y > 0.0 {
            self.viewport = viewport;
        }
        let padded = self.extent() * (1.0 + 2.0 * PADDING);
        self.fit_scale = (self.viewport.x / padded.x).min(self.viewport.y / padded.y);
    }

    /// Pixels per graph unit under the current transform.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.fit_scale * self.ratio
    }

    #[must_use]
    pub fn graph_to_viewport(&self, p: Pos2) -> Pos2 {
        self.viewport_centre() + (p - self.centre_graph()) * self.scale()
    }

    #[must_use]
    pub fn viewport_to_graph(&self, v: Pos2) -> Pos2 {
        self.centre_graph() + (v - self.viewport_centre()) / self.scale()
    }

    /// Zooms by `factor`, keeping the viewport point `anchor` fixed.
    /// Ignored while the camera is disabled.
    pub fn zoom_by(&mut self, factor: f32, anchor: Pos2) {
        if !self.enabled || factor <= 0.0 {
            return;
        }
        let pinned = self.viewport_to_graph(anchor);
        self.ratio *= factor;
        let new_centre = pinned - (anchor - self.viewport_centre()) / self.scale();
        self.centre = (new_centre - self.bbox.min) / self.extent();
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(ZOOM_FACTOR, self.viewport_centre());
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(ZOOM_FACTOR.recip(), self.viewport_centre());
    }

    /// Translates the view by a viewport-space delta (the view follows
    /// the pointer). Ignored while the camera is disabled.
    pub fn pan_by(&mut self, delta: Vec2) {
        if !self.enabled {
            return;
        }
        self.centre -= (delta / self.scale()) / self.extent();
    }

    /// Restores the fitted view: centred, ratio 1.
    pub fn reset(&mut self) {
        self.centre = vec2(0.5, 0.5);
        self.ratio = 1.0;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Pins (or unpins) the box used by `refit`. While pinned, automatic
    /// re-fitting to content is suppressed.
    pub fn set_bounding_box(&mut self, bbox: Option<Rect>) {
        self.custom_bbox = bbox;
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        self.custom_bbox
    }

    /// The box committed by the last `refit`, pinned or not.
    #[must_use]
    pub fn current_bounds(&self) -> Rect {
        self.bbox
    }

    fn viewport_centre(&self) -> Pos2 {
        (self.viewport * 0.5).to_pos2()
    }

    fn centre_graph(&self) -> Pos2 {
        self.bbox.min + self.centre * self.extent()
    }

    fn extent(&self) -> Vec2 {
        self.bbox.size().max(Vec2::splat(MIN_EXTENT))
    }
}

/// Bounding box of all node positions; the fallback for an empty store
/// keeps the transform well-defined.
#[must_use]
pub fn content_bounds(store: &GraphStore) -> Rect {
    let mut positions = store.nodes().map(|(_, attrs)| Pos2::new(attrs.x, attrs.y));
    let Some(first) = positions.next() else {
        return Rect::from_center_size(Pos2::ZERO, Vec2::splat(MIN_EXTENT));
    };
    positions.fold(Rect::from_min_max(first, first), |bbox, p| {
        bbox.union(Rect::from_min_max(p, p))
    })
}

#[cfg(test)]
mod tests {
    use egui::pos2;
    use ig_core::attributes::NodeAttributes;
    use rstest::rstest;

    use super::*;

    const TOLERANCE: f32 = 1e-3;

    fn fitted(bbox: Rect, viewport: Vec2) -> Camera {
        let mut camera = Camera::default();
        camera.refit(bbox, viewport);
        camera
    }

    fn assert_pos_eq(a: Pos2, b: Pos2) {
        assert!((a - b).length() < TOLERANCE, "{a:?} != {b:?}");
    }

    #[rstest]
    #[case(pos2(0.0, 0.0))]
    #[case(pos2(-5.0, 5.0))]
    #[case(pos2(123.4, -56.7))]
    fn round_trip_is_identity(#[case] p: Pos2) {
        let mut camera = fitted(
            Rect::from_min_max(pos2(-10.0, -10.0), pos2(10.0, 10.0)),
            vec2(800.0, 600.0),
        );
        assert_pos_eq(camera.viewport_to_graph(camera.graph_to_viewport(p)), p);

        camera.zoom_by(2.5, pos2(100.0, 50.0));
        camera.pan_by(vec2(-30.0, 12.0));
        assert_pos_eq(camera.viewport_to_graph(camera.graph_to_viewport(p)), p);
    }

    #[test]
    fn fitted_view_centres_the_content() {
        let camera = fitted(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0)),
            vec2(400.0, 400.0),
        );
        assert_pos_eq(camera.graph_to_viewport(pos2(5.0, 5.0)), pos2(200.0, 200.0));
    }

    #[test]
    fn zoom_keeps_the_anchor_fixed() {
        let mut camera = fitted(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0)),
            vec2(400.0, 300.0),
        );
        let anchor = pos2(320.0, 40.0);
        let before = camera.viewport_to_graph(anchor);
        camera.zoom_by(1.7, anchor);
        assert_pos_eq(camera.viewport_to_graph(anchor), before);
    }

    #[test]
    fn pinned_bbox_suppresses_refit_to_content() {
        let viewport = vec2(400.0, 400.0);
        let bbox = Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0));
        let mut camera = fitted(bbox, viewport);
        camera.set_bounding_box(Some(camera.current_bounds()));

        let probe = pos2(5.0, 5.0);
        let before = camera.graph_to_viewport(probe);
        // Content moved; the pinned camera must not follow it.
        camera.refit(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0)), viewport);
        assert_pos_eq(camera.graph_to_viewport(probe), before);

        camera.set_bounding_box(None);
        camera.refit(Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0)), viewport);
        assert!((camera.graph_to_viewport(probe) - before).length() > 1.0);
    }

    #[test]
    fn disabled_camera_ignores_gestures_but_still_transforms() {
        let mut camera = fitted(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0)),
            vec2(400.0, 400.0),
        );
        let probe = pos2(3.0, 4.0);
        let before = camera.graph_to_viewport(probe);

        camera.disable();
        camera.zoom_by(2.0, pos2(0.0, 0.0));
        camera.pan_by(vec2(50.0, 50.0));
        assert_pos_eq(camera.graph_to_viewport(probe), before);

        camera.enable();
        camera.pan_by(vec2(50.0, 0.0));
        assert!((camera.graph_to_viewport(probe) - before).length() > 1.0);
    }

    #[test]
    fn single_node_content_stays_invertible() {
        let mut store = GraphStore::new();
        let id = store.fresh_node_id();
        store.add_node(id, NodeAttributes::at(3.0, 3.0)).unwrap();

        let camera = fitted(content_bounds(&store), vec2(200.0, 200.0));
        assert_pos_eq(
            camera.viewport_to_graph(camera.graph_to_viewport(pos2(3.0, 3.0))),
            pos2(3.0, 3.0),
        );
    }

    #[test]
    fn content_bounds_encloses_all_nodes() {
        let mut store = GraphStore::new();
        for (x, y) in [(0.0, 0.0), (-5.0, 5.0), (5.0, 5.0), (0.0, 10.0)] {
            let id = store.fresh_node_id();
            store.add_node(id, NodeAttributes::at(x, y)).unwrap();
        }
        let bbox = content_bounds(&store);
        assert_eq!(bbox, Rect::from_min_max(pos2(-5.0, 0.0), pos2(5.0, 10.0)));
    }
}
