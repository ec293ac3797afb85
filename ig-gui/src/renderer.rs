//! Per-frame orchestration: camera refit, input translation, drawing.
//!
//! `Renderer::frame` reads the current store state every call, so a
//! mutation made while handling this frame's events is visible to the
//! very next frame. Pointer input is translated into [`PointerEvent`]s,
//! each fired at most once per underlying input event and returned as
//! this frame's event list for the interaction controller to consume.
//! Positions in events are viewport-local (origin at the canvas
//! top-left), the same space the camera transforms.

use eframe::egui;
use egui::{CornerRadius, Pos2, Sense, Vec2};

use ig_core::graph::{GraphStore, NodeId};
use ig_graphics::backend::EguiBackend;
use ig_graphics::camera::{Camera, content_bounds};
use ig_graphics::render::{RenderState, node_at, render_graph};
use ig_graphics::settings::{Settings, SettingsError};

/// Pointer travel below this is still a click, not a drag.
const CLICK_TOLERANCE: f32 = 4.0;

/// Wheel-to-zoom sensitivity.
const SCROLL_ZOOM_RATE: f32 = 1.0 / 200.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PointerEvent {
    /// Pointer-down landed inside a node's visual hit-area.
    DownNode(NodeId),
    /// Click on empty canvas.
    ClickStage(Pos2),
    MouseDown(Pos2),
    MouseMove(Pos2),
    MouseUp(Pos2),
}

pub struct Renderer {
    camera: Camera,
    settings: Settings,
    state: RenderState,
    pointer_down: bool,
    down_on_node: bool,
    travelled: f32,
    last_pointer: Pos2,
}

impl Renderer {
    /// Fails fast on invalid settings; nothing is silently defaulted.
    pub fn new(settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            camera: Camera::default(),
            settings,
            state: RenderState::default(),
            pointer_down: false,
            down_on_node: false,
            travelled: 0.0,
            last_pointer: Pos2::ZERO,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn viewport_to_graph(&self, v: Pos2) -> Pos2 {
        self.camera.viewport_to_graph(v)
    }

    pub fn graph_to_viewport(&self, p: Pos2) -> Pos2 {
        self.camera.graph_to_viewport(p)
    }

    /// Renders one frame into `ui` and returns the pointer events it
    /// produced, in input order.
    pub fn frame(&mut self, store: &GraphStore, ui: &mut egui::Ui) -> Vec<PointerEvent> {
        let response = ui.allocate_response(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;

        self.camera.refit(content_bounds(store), rect.size());

        let events = self.pointer_events(store, ui, &response);

        let painter = ui.painter_at(rect);
        painter.add(egui::Shape::rect_filled(
            rect,
            CornerRadius::ZERO,
            ui.visuals().faint_bg_color,
        ));

        let mut backend = EguiBackend::new(ui);
        render_graph(
            store,
            &self.settings,
            &self.camera,
            self.pointer_down,
            &mut backend,
            &mut self.state,
        );
        let mut shapes = backend.shapes;
        for shape in &mut shapes {
            shape.translate(rect.min.to_vec2());
        }
        painter.extend(shapes);

        events
    }

    fn pointer_events(
        &mut self,
        store: &GraphStore,
        ui: &egui::Ui,
        response: &egui::Response,
    ) -> Vec<PointerEvent> {
        let rect = response.rect;
        let (pressed, released, delta, pointer, scroll) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta(),
                i.pointer.interact_pos(),
                i.smooth_scroll_delta.y,
            )
        });
        // Release may arrive with the pointer gone (outside the
        // window); fall back to its last known position so a drag can
        // always finish.
        let pointer_local = pointer.map(|p| p - rect.min.to_vec2());
        if let Some(p) = pointer_local {
            self.last_pointer = p;
        }
        let pointer_local = pointer_local.unwrap_or(self.last_pointer);

        let mut events = Vec::new();

        if response.hovered() && scroll != 0.0 {
            self.camera
                .zoom_by((scroll * SCROLL_ZOOM_RATE).exp(), pointer_local);
        }

        if pressed && response.hovered() {
            self.pointer_down = true;
            self.travelled = 0.0;
            events.push(PointerEvent::MouseDown(pointer_local));
            if let Some(node) = node_at(store, &self.camera, pointer_local) {
                self.down_on_node = true;
                events.push(PointerEvent::DownNode(node));
            } else {
                self.down_on_node = false;
            }
        }

        if self.pointer_down && delta != Vec2::ZERO {
            self.travelled += delta.length();
            events.push(PointerEvent::MouseMove(pointer_local));
            if !self.down_on_node {
                // Dragging empty canvas pans the view.
                self.camera.pan_by(delta);
            }
        }

        if released && self.pointer_down {
            self.pointer_down = false;
            events.push(PointerEvent::MouseUp(pointer_local));
            if !self.down_on_node && self.travelled < CLICK_TOLERANCE {
                events.push(PointerEvent::ClickStage(pointer_local));
            }
        }

        events
    }
}
