//! Attribute records stored per node and per edge.
//!
//! The store keeps typed records rather than string-keyed maps; a `None`
//! type tag means "render with the configured default program".

/// 8-bit RGB colour.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct NodeAttributes {
    /// Graph-space position.
    pub x: f32,
    pub y: f32,
    /// Visual radius in graph units. Must be positive.
    pub size: f32,
    /// `None` falls back to the configured default node colour.
    pub color: Option<Color>,
    pub label: Option<String>,
    /// Tag selecting a node program; `None` resolves to the default tag.
    pub node_type: Option<String>,
    /// Transient, set only while the node is being dragged.
    pub highlighted: bool,
    /// Draw order when the z-index feature is enabled.
    pub z: i32,
}

impl Default for NodeAttributes {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            size: 1.0,
            color: None,
            label: None,
            node_type: None,
            highlighted: false,
            z: 0,
        }
    }
}

impl NodeAttributes {
    /// A default-looking node at the given graph-space position.
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct EdgeAttributes {
    /// Tag selecting an edge program; `None` resolves to the default tag.
    pub edge_type: Option<String>,
    /// `None` falls back to the configured default edge colour.
    pub color: Option<Color>,
    pub label: Option<String>,
    /// Draw order when the z-index feature is enabled.
    pub z: i32,
}

impl Default for EdgeAttributes {
    fn default() -> Self {
        Self {
            edge_type: None,
            color: None,
            label: None,
            z: 0,
        }
    }
}
