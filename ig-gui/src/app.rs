use eframe::egui;

use ig_core::attributes::{Color, EdgeAttributes, NodeAttributes};
use ig_core::graph::{EdgeKey, GraphStore};
use ig_graphics::settings::{Settings, SettingsError};

use crate::interaction::{InteractionController, NodeFactory};
use crate::renderer::Renderer;

/// Colours cycled through for click-created nodes.
const PALETTE: [Color; 6] = [
    Color::rgb(0xe4, 0x5f, 0x5f),
    Color::rgb(0xe4, 0xa2, 0x5f),
    Color::rgb(0x5f, 0xe4, 0x8e),
    Color::rgb(0x5f, 0xb2, 0xe4),
    Color::rgb(0x8e, 0x5f, 0xe4),
    Color::rgb(0xe4, 0x5f, 0xc4),
];

const NAMES: [&str; 8] = [
    "Ada", "Grace", "Edsger", "Barbara", "Tony", "Niklaus", "Radia", "Donald",
];

pub struct App {
    store: GraphStore,
    renderer: Renderer,
    controller: InteractionController,
}

impl App {
    /// Builds the application; fails fast on invalid settings.
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Result<Self, SettingsError> {
        Ok(Self {
            store: seed_store(),
            renderer: Renderer::new(settings)?,
            controller: InteractionController::new(node_factory()),
        })
    }
}

/// The four-node demo cycle.
fn seed_store() -> GraphStore {
    let mut store = GraphStore::new();
    let names = ["Guillaume", "Alexis", "Paul", "Benoit"];
    let positions = [(0.0, 0.0), (-5.0, 5.0), (5.0, 5.0), (0.0, 10.0)];
    let ids: Vec<_> = names
        .iter()
        .zip(positions)
        .enumerate()
        .map(|(i, (name, (x, y)))| {
            let id = store.fresh_node_id();
            let mut attrs = NodeAttributes::at(x, y);
            attrs.size = 10.0;
            attrs.label = Some((*name).to_owned());
            attrs.color = Some(PALETTE[i % PALETTE.len()]);
            store.add_node(id, attrs).expect("fresh id cannot collide");
            id
        })
        .collect();
    for (a, b) in [(0, 1), (1, 3), (3, 2), (2, 0)] {
        store
            .add_edge(EdgeKey::new(ids[a], ids[b]), EdgeAttributes::default())
            .expect("seed endpoints exist");
    }
    store
}

/// Cycles through the palette and a few first names, the stand-in for
/// the original's random generators.
fn node_factory() -> NodeFactory {
    let mut count = 0_usize;
    Box::new(move |point| {
        let mut attrs = NodeAttributes::at(point.x, point.y);
        attrs.size = 10.0;
        attrs.color = Some(PALETTE[count % PALETTE.len()]);
        attrs.label = Some(format!("{} {}", NAMES[count % NAMES.len()], count));
        count += 1;
        attrs
    })
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.visuals_mut().button_frame = false;

                if ui.button("Reset view").clicked() {
                    let camera = self.renderer.camera_mut();
                    camera.set_bounding_box(None);
                    camera.reset();
                }
                if ui.button("Zoom In").clicked() {
                    self.renderer.camera_mut().zoom_in();
                }
                if ui.button("Zoom Out").clicked() {
                    self.renderer.camera_mut().zoom_out();
                }

                ui.separator();

                let settings = self.renderer.settings_mut();
                ui.checkbox(&mut settings.render_labels, "Labels");
                ui.checkbox(&mut settings.render_edge_labels, "Edge labels");
                ui.checkbox(&mut settings.hide_labels_on_move, "Hide labels on move");
                ui.checkbox(&mut settings.hide_edges_on_move, "Hide edges on move");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let events = self.renderer.frame(&self.store, ui);
            for event in events {
                self.controller
                    .handle(event, &mut self.store, &mut self.renderer);
            }
        });
    }
}
