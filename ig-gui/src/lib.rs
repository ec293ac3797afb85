#![warn(clippy::all, rust_2018_idioms)]
mod app;
pub mod interaction;
pub mod renderer;

pub use app::App;
