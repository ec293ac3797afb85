pub mod backend;
pub mod camera;
pub mod program;
pub mod render;
pub mod settings;
