//! Drawing backends.
//!
//! Programs draw through the [`DrawingBackend`] trait: primitive calls
//! in pixel space, nothing more. [`EguiBackend`] turns primitives into
//! `egui::Shape`s for a painter; [`RecordingBackend`] records the calls
//! so tests can assert on what a frame would draw.

use egui::{Align2, Color32, FontId, Pos2, Shape, Stroke};

pub trait DrawingBackend {
    fn circle(&mut self, centre: Pos2, radius: f32, fill: Color32, stroke: Stroke);
    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke);
    /// A line from `from` to `to` with an arrowhead at `to`.
    fn arrow(&mut self, from: Pos2, to: Pos2, stroke: Stroke, head_size: f32);
    fn text(&mut self, anchor: Pos2, text: &str, size: f32, color: Color32);
}

/// Minimum rendered text size; anything smaller is unreadable and
/// skipped.
const MIN_TEXT_SIZE: f32 = 5.0;

/// Collects `egui::Shape`s ready for `Painter::extend`. Label fonts map
/// onto the proportional family.
pub struct EguiBackend<'a> {
    ui: &'a egui::Ui,
    pub shapes: Vec<Shape>,
}

impl<'a> EguiBackend<'a> {
    #[must_use]
    pub fn new(ui: &'a egui::Ui) -> Self {
        Self {
            ui,
            shapes: Vec::new(),
        }
    }
}

impl DrawingBackend for EguiBackend<'_> {
    fn circle(&mut self, centre: Pos2, radius: f32, fill: Color32, stroke: Stroke) {
        self.shapes.push(Shape::Circle(egui::epaint::CircleShape {
            center: centre,
            radius,
            fill,
            stroke,
        }));
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.shapes.push(Shape::line_segment([from, to], stroke));
    }

    fn arrow(&mut self, from: Pos2, to: Pos2, stroke: Stroke, head_size: f32) {
        self.shapes.push(Shape::line_segment([from, to], stroke));
        for wing in arrowhead(from, to, head_size) {
            self.shapes.push(Shape::line_segment(wing, stroke));
        }
    }

    fn text(&mut self, anchor: Pos2, text: &str, size: f32, color: Color32) {
        if size < MIN_TEXT_SIZE {
            return;
        }
        let shape = self.ui.fonts(|fonts| {
            Shape::text(
                fonts,
                anchor,
                Align2::LEFT_CENTER,
                text,
                FontId::proportional(size),
                color,
            )
        });
        self.shapes.push(shape);
    }
}

/// The two wing segments of an arrowhead pointing at `to`.
fn arrowhead(from: Pos2, to: Pos2, head_size: f32) -> [[Pos2; 2]; 2] {
    let dir = (to - from).normalized();
    if !dir.is_finite() {
        // Degenerate (self-loop drawn as a point); skip the head.
        return [[to, to], [to, to]];
    }
    let back = -dir * head_size;
    [
        [to, to + back.rot90() * 0.5 + back],
        [to, to - back.rot90() * 0.5 + back],
    ]
}

/// A primitive call recorded by [`RecordingBackend`].
#[derive(Clone, PartialEq, Debug)]
pub enum DrawCall {
    Circle {
        centre: Pos2,
        radius: f32,
        fill: Color32,
    },
    Line {
        from: Pos2,
        to: Pos2,
        color: Color32,
    },
    Arrow {
        from: Pos2,
        to: Pos2,
        color: Color32,
    },
    Text {
        anchor: Pos2,
        text: String,
        size: f32,
    },
}

#[derive(Default)]
pub struct RecordingBackend {
    pub calls: Vec<DrawCall>,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCall> {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::Circle { .. }))
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl DrawingBackend for RecordingBackend {
    fn circle(&mut self, centre: Pos2, radius: f32, fill: Color32, _stroke: Stroke) {
        self.calls.push(DrawCall::Circle {
            centre,
            radius,
            fill,
        });
    }

    fn line(&mut self, from: Pos2, to: Pos2, stroke: Stroke) {
        self.calls.push(DrawCall::Line {
            from,
            to,
            color: stroke.color,
        });
    }

    fn arrow(&mut self, from: Pos2, to: Pos2, stroke: Stroke, _head_size: f32) {
        self.calls.push(DrawCall::Arrow {
            from,
            to,
            color: stroke.color,
        });
    }

    fn text(&mut self, anchor: Pos2, text: &str, size: f32, _color: Color32) {
        self.calls.push(DrawCall::Text {
            anchor,
            text: text.to_owned(),
            size,
        });
    }
}
