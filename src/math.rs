//! Camera matrices for the perspective lessons.

use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_4;

pub const FOV_Y: f32 = FRAC_PI_4;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 500.;
pub const EYE: Vec3 = Vec3::new(0., 0., 3.);

/// Projection × view for a camera at [`EYE`] looking at the origin, with `+Y` up.
///
/// The model matrix is the identity.
pub fn mvp(aspect: f32) -> Mat4 {
    let proj = Mat4::perspective_rh_gl(FOV_Y, aspect, Z_NEAR, Z_FAR);
    let view = Mat4::look_at_rh(EYE, Vec3::ZERO, Vec3::Y);

    proj * view
}

/// Width over height, falling back to 1 for a degenerate viewport.
pub fn aspect_ratio(width: i32, height: i32) -> f32 {
    if width <= 0 || height <= 0 {
        1.
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn to_ndc(m: Mat4, p: Vec3) -> Vec3 {
        let clip = m * Vec4::new(p.x, p.y, p.z, 1.);
        clip.truncate() / clip.w
    }

    #[test]
    fn origin_maps_to_the_centre() {
        let ndc = to_ndc(mvp(1.), Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
        assert!((-1.0..1.0).contains(&ndc.z));
    }

    #[test]
    fn farther_points_get_deeper() {
        let m = mvp(1.);
        let near = to_ndc(m, Vec3::new(0., 0., 0.));
        let far = to_ndc(m, Vec3::new(0., 0., -100.));
        assert!(far.z > near.z);
    }

    #[test]
    fn wide_viewport_squeezes_x() {
        let square = to_ndc(mvp(1.), Vec3::new(1., 1., 0.));
        let wide = to_ndc(mvp(2.), Vec3::new(1., 1., 0.));
        assert!((wide.x * 2. - square.x).abs() < 1e-5);
        assert!((wide.y - square.y).abs() < 1e-5);
    }

    #[test]
    fn degenerate_aspect() {
        assert_eq!(aspect_ratio(0, 10), 1.);
        assert_eq!(aspect_ratio(800, 400), 2.);
    }
}
