//! Orthographic isometric camera

use glam::{Mat4, Quat, Vec3};

use crate::sim::CameraRig;

/// Offset of the eye from the focus point before orbiting
const EYE_OFFSET: Vec3 = Vec3::new(4.0, 4.0, 4.0);
/// Visible world width at zoom 1
const VIEW_WIDTH: f32 = 10.0;
const DEPTH_RANGE: f32 = 200.0;

/// Point the camera looks at
pub fn focus(rig: &CameraRig) -> Vec3 {
    Vec3::new(0.0, rig.height, 0.0)
}

/// Combined view-projection matrix for a viewport with `aspect` = width / height
pub fn view_projection(rig: &CameraRig, aspect: f32) -> Mat4 {
    let target = focus(rig);
    let eye = target + Quat::from_rotation_y(rig.orbit) * EYE_OFFSET;
    let view = Mat4::look_at_rh(eye, target, Vec3::Y);

    let half_w = VIEW_WIDTH * rig.zoom / 2.0;
    let half_h = half_w / aspect.max(f32::EPSILON);
    let proj = Mat4::orthographic_rh(
        -half_w,
        half_w,
        -half_h,
        half_h,
        -DEPTH_RANGE / 2.0,
        DEPTH_RANGE / 2.0,
    );

    proj * view
}
