#![warn(clippy::all, rust_2018_idioms)]

use anyhow::anyhow;
use clap::Parser;
use ig_graphics::settings::{Cell, Settings};

#[derive(Parser)]
struct Args {
    /// Suppress edge drawing while a pointer gesture is active
    #[arg(long)]
    hide_edges_on_move: bool,

    /// Suppress label drawing while a pointer gesture is active
    #[arg(long)]
    hide_labels_on_move: bool,

    /// Do not render node labels
    #[arg(long)]
    no_labels: bool,

    /// Render edge labels
    #[arg(long)]
    edge_labels: bool,

    /// Order entities by their z attribute instead of edges-then-nodes
    #[arg(long)]
    z_index: bool,

    /// Label grid cell as WIDTHxHEIGHT in pixels, e.g. 120x60
    #[arg(long, value_name = "CELL", value_parser = parse_cell)]
    label_grid_cell: Option<Cell>,
}

/// Parses "WIDTHxHEIGHT". Range checking is left to settings
/// validation so a bad cell fails the same way everywhere.
fn parse_cell(s: &str) -> Result<Cell, String> {
    let (width, height) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{s}`"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|err| format!("invalid dimension `{v}`: {err}"))
    };
    Ok(Cell {
        width: parse(width)?,
        height: parse(height)?,
    })
}

impl Args {
    fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.hide_edges_on_move = self.hide_edges_on_move;
        settings.hide_labels_on_move = self.hide_labels_on_move;
        settings.render_labels = !self.no_labels;
        settings.render_edge_labels = self.edge_labels;
        settings.z_index = self.z_index;
        settings.label_grid.cell = self.label_grid_cell;
        settings
    }
}

fn main() -> anyhow::Result<()> {
    // Log to stdout (if you run with `RUST_LOG=debug`).
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let settings = args.settings();

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "ig",
        native_options,
        Box::new(move |cc| Ok(Box::new(ig_gui::App::new(cc, settings)?))),
    )
    .map_err(|err| anyhow!("{err}"))?;

    Ok(())
}
