use glam::{DMat4, DVec2, DVec3};

use crate::{
    error::{PlatenError, PlatenResult},
    scene::Scene,
};

/// Page units per world unit when no explicit scale is configured.
pub const DEFAULT_SCALE: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageBounds {
    pub width: f64,
    pub height: f64,
}

/// World-to-page mapping derived from the scene camera.
#[derive(Clone, Copy, Debug)]
pub struct ViewTransform {
    pub matrix: DMat4,
    pub page: PageBounds,
}

pub fn derive_view(scene: &Scene, scale: f64) -> PlatenResult<ViewTransform> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PlatenError::configuration(format!(
            "page scale must be a positive finite number, got {scale}"
        )));
    }
    let camera = scene
        .camera
        .ok_or_else(|| PlatenError::configuration("scene has no active camera"))?;
    if !camera.ortho_scale.is_finite() || camera.ortho_scale <= 0.0 {
        return Err(PlatenError::configuration(format!(
            "camera ortho_scale must be a positive finite number, got {}",
            camera.ortho_scale
        )));
    }
    let (rx, ry) = (scene.render.resolution_x, scene.render.resolution_y);
    if rx == 0 || ry == 0 {
        return Err(PlatenError::configuration(
            "render resolution must be > 0 on both axes",
        ));
    }
    if camera.matrix_world.determinant() == 0.0 {
        return Err(PlatenError::configuration(
            "camera transform is not invertible",
        ));
    }

    let matrix = DMat4::from_scale(DVec3::splat(scale)) * camera.matrix_world.inverse();
    let (aspect_x, aspect_y) = aspect_normalize(rx as f64, ry as f64);
    let extent = scale * camera.ortho_scale;
    Ok(ViewTransform {
        matrix,
        page: PageBounds {
            width: extent * aspect_x,
            height: extent * aspect_y,
        },
    })
}

/// Per-axis aspect factors for a render resolution, longer axis pinned at 1.0.
pub fn aspect_normalize(x: f64, y: f64) -> (f64, f64) {
    if x < y { (x / y, 1.0) } else { (1.0, y / x) }
}

pub(crate) fn project(matrix: &DMat4, point: DVec3) -> DVec2 {
    let p = matrix.transform_point3(point);
    DVec2::new(p.x, p.y)
}
