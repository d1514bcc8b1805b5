//! WebGPU rendering module
//!
//! Boxes are turned into pre-lit triangles on the CPU and drawn with one
//! pipeline under an orthographic camera.

pub mod camera;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use camera::view_projection;
pub use pipeline::RenderState;
pub use vertex::Vertex;
