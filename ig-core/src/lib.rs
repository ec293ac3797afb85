pub mod attributes;
pub mod graph;
