//! Vertex types for the box renderer

use bytemuck::{Pod, Zeroable};

/// 3D vertex with position and pre-lit color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors for game elements
pub mod colors {
    /// Clear color; transparent so the page background shows through
    pub const CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];
    /// Ambient light intensity
    pub const AMBIENT: f32 = 0.6;
    /// Directional light intensity
    pub const DIRECTIONAL: f32 = 0.6;
    /// Direction toward the directional light (10, 20, 0), normalized
    pub const LIGHT_DIR: [f32; 3] = [0.447_213_6, 0.894_427_2, 0.0];
    /// Hue step per tower level (degrees)
    pub const HUE_STEP: f32 = 4.0;

    /// HSL (degrees, 0-1, 0-1) to sRGB
    pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
        let h = h.rem_euclid(360.0) / 60.0;
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - c / 2.0;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        [r + m, g + m, b + m]
    }

    /// sRGB component to linear (the surface format re-encodes)
    #[inline]
    pub fn srgb_to_linear(c: f32) -> f32 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    /// Base (unlit, sRGB) color of a tower level
    pub fn layer_color(level: u32, hue_offset: f32) -> [f32; 3] {
        hsl_to_rgb(hue_offset + level as f32 * HUE_STEP, 1.0, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::colors::*;

    fn close(a: [f32; 3], b: [f32; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    #[test]
    fn test_hsl_primaries() {
        assert!(close(hsl_to_rgb(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]));
        assert!(close(hsl_to_rgb(120.0, 1.0, 0.5), [0.0, 1.0, 0.0]));
        assert!(close(hsl_to_rgb(240.0, 1.0, 0.5), [0.0, 0.0, 1.0]));
        assert!(close(hsl_to_rgb(360.0 + 60.0, 1.0, 0.5), [1.0, 1.0, 0.0]));
    }

    #[test]
    fn test_layer_colors_shift_with_level() {
        let base = layer_color(0, 30.0);
        let next = layer_color(1, 30.0);
        assert!(!close(base, next));
        assert!(close(layer_color(90, 0.0), layer_color(0, 0.0)));
    }

    #[test]
    fn test_srgb_to_linear_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.5) < 0.5);
    }
}
