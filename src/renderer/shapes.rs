//! Triangle generation for boxes

use glam::Vec3;

use super::vertex::{Vertex, colors};
use crate::sim::{BoxMesh, GameState};

/// Outward normals and corner signs of each face (two triangles, CCW from outside)
const FACES: [(Vec3, [[f32; 3]; 4]); 6] = [
    (Vec3::X, [[1.0, -1.0, 1.0], [1.0, -1.0, -1.0], [1.0, 1.0, -1.0], [1.0, 1.0, 1.0]]),
    (Vec3::NEG_X, [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]]),
    (Vec3::Y, [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]]),
    (Vec3::NEG_Y, [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]]),
    (Vec3::Z, [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]]),
    (Vec3::NEG_Z, [[1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, 1.0, -1.0], [1.0, 1.0, -1.0]]),
];

/// Light a base color for a face with the given world-space normal
fn shade(base: [f32; 3], normal: Vec3) -> [f32; 4] {
    let light = Vec3::from_array(colors::LIGHT_DIR);
    let intensity = (colors::AMBIENT + colors::DIRECTIONAL * normal.dot(light).max(0.0)).min(1.0);
    [
        colors::srgb_to_linear(base[0] * intensity),
        colors::srgb_to_linear(base[1] * intensity),
        colors::srgb_to_linear(base[2] * intensity),
        1.0,
    ]
}

/// Generate 36 vertices for a box mesh
pub fn cuboid(mesh: &BoxMesh, base: [f32; 3]) -> Vec<Vertex> {
    let half = mesh.size * 0.5;
    let mut vertices = Vec::with_capacity(36);

    for (normal, corners) in FACES.iter() {
        let color = shade(base, mesh.rotation * *normal);
        let world: [Vec3; 4] = corners.map(|c| {
            mesh.position + mesh.rotation * (Vec3::from_array(c) * half)
        });

        for i in [0, 1, 2, 0, 2, 3] {
            vertices.push(Vertex::new(world[i].to_array(), color));
        }
    }

    vertices
}

/// All triangles for the current scene
pub fn scene(state: &GameState) -> Vec<Vertex> {
    let count = state.stack.len() + state.overhangs.len();
    let mut vertices = Vec::with_capacity(count * 36);
    for mesh in state.meshes() {
        let base = colors::layer_color(mesh.color_index, state.hue_offset);
        vertices.extend(cuboid(mesh, base));
    }
    vertices
}
