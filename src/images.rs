use std::path::{Path, PathBuf};

use glam::{DMat4, DVec2};

use crate::emit::{ImagePlacement, PageSink};
use crate::error::PlatenResult;
use crate::export::ExportContext;
use crate::scene::{EmptyData, ImageData, Rgb};
use crate::view::{aspect_normalize, project};

const PLACEHOLDER_COLOR: Rgb = Rgb::BLACK;
const MISSING_COLOR: Rgb = Rgb::new(1.0, 0.0, 1.0);

/// Draws one image-holding empty as either an embedded raster or a filled
/// marker quad. Exactly one outcome is produced per payload: the placeholder
/// quad when requested, the magenta marker when the file cannot be resolved
/// or the projected quad collapses, the embedded image otherwise. An empty
/// without a payload draws nothing, as does a quad that fails to project to
/// finite coordinates.
pub(crate) fn draw_image(
    sink: &mut dyn PageSink,
    empty: &EmptyData,
    matrix: &DMat4,
    ctx: &ExportContext,
) -> PlatenResult<()> {
    let Some(image) = &empty.image else {
        return Ok(());
    };
    let resolved = resolve(image, &ctx.assets_root);
    let (aspect_x, aspect_y) =
        aspect_normalize(f64::from(resolved.width), f64::from(resolved.height));
    let dim = image.display_size;
    let offset = image.offset * dim;
    let corners = [
        DVec2::new(0.0, 0.0),
        DVec2::new(0.0, dim),
        DVec2::new(dim, dim),
        DVec2::new(dim, 0.0),
    ];
    let quad = corners.map(|corner| {
        let local = (corner + offset) * DVec2::new(aspect_x, aspect_y);
        project(matrix, local.extend(0.0))
    });
    if quad.iter().any(|corner| !corner.is_finite()) {
        tracing::warn!(
            "image quad for '{}' does not project to finite coordinates; skipping",
            image.source
        );
        return Ok(());
    }
    if ctx.placeholder_images {
        fill_quad(sink, &quad, PLACEHOLDER_COLOR)
    } else if resolved.missing {
        fill_quad(sink, &quad, MISSING_COLOR)
    } else if quad_collapsed(&quad) {
        tracing::warn!(
            "image quad for '{}' collapsed under projection; drawing the marker instead",
            image.source
        );
        fill_quad(sink, &quad, MISSING_COLOR)
    } else {
        place(sink, &quad, &resolved)
    }
}

fn fill_quad(sink: &mut dyn PageSink, quad: &[DVec2; 4], color: Rgb) -> PlatenResult<()> {
    sink.begin_path()?;
    sink.move_to(quad[0])?;
    for p in &quad[1..] {
        sink.line_to(*p)?;
    }
    sink.close_path()?;
    sink.set_color(color)?;
    sink.fill()
}

fn place(sink: &mut dyn PageSink, quad: &[DVec2; 4], image: &ResolvedImage) -> PlatenResult<()> {
    sink.save_state()?;
    sink.translate(quad[1])?;
    let left_edge = quad[0] - quad[1];
    // The placement angle convention is clockwise-positive; glam's angle_to
    // is counter-clockwise.
    sink.rotate(-left_edge.angle_to(DVec2::NEG_Y).to_degrees())?;
    let dim_x = (quad[0] - quad[3]).length();
    let dim_y = left_edge.length();
    sink.image(&ImagePlacement {
        width: image.width,
        height: image.height,
        matrix: [
            f64::from(image.width) / dim_x,
            0.0,
            0.0,
            -(f64::from(image.height) / dim_y),
            0.0,
            f64::from(image.height) / dim_y,
        ],
        path: image.path.clone(),
    })?;
    sink.restore_state()
}

// Placement divides by the projected edge lengths and takes an angle from
// the left edge; a zero-length or overflowed edge would put non-finite
// numerals in the stream.
fn quad_collapsed(quad: &[DVec2; 4]) -> bool {
    let width = (quad[0] - quad[3]).length();
    let height = (quad[0] - quad[1]).length();
    !(width.is_finite() && height.is_finite()) || width == 0.0 || height == 0.0
}

struct ResolvedImage {
    path: PathBuf,
    width: u32,
    height: u32,
    missing: bool,
}

// Pixel dimensions come from the file itself; a file that cannot be probed
// counts as missing and falls back to the declared payload size.
fn resolve(image: &ImageData, assets_root: &Path) -> ResolvedImage {
    let source = Path::new(&image.source);
    let path = if source.is_absolute() {
        source.to_path_buf()
    } else {
        assets_root.join(source)
    };
    match image::image_dimensions(&path) {
        Ok((width, height)) => ResolvedImage {
            width: width.max(1),
            height: height.max(1),
            path,
            missing: false,
        },
        Err(err) => {
            tracing::warn!("image path missing: {} ({err})", path.display());
            ResolvedImage {
                width: image.width.max(1),
                height: image.height.max(1),
                path,
                missing: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::{PageOp, RecordingSink};
    use glam::DVec3;

    fn ctx() -> ExportContext {
        ExportContext {
            placeholder_images: false,
            assets_root: PathBuf::from("target"),
        }
    }

    fn payload(source: &str, width: u32, height: u32) -> EmptyData {
        EmptyData {
            image: Some(ImageData {
                source: source.to_string(),
                width,
                height,
                display_size: 1.0,
                offset: DVec2::ZERO,
            }),
        }
    }

    fn drawn(empty: &EmptyData, matrix: DMat4, ctx: &ExportContext) -> Vec<PageOp> {
        let mut sink = RecordingSink::new();
        draw_image(&mut sink, empty, &matrix, ctx).unwrap();
        sink.ops().to_vec()
    }

    fn png_fixture(name: &str, width: u32, height: u32) -> PathBuf {
        let dir = PathBuf::from("target").join("image_fixtures");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        image::RgbImage::new(width, height).save(&path).unwrap();
        // Absolute, so resolution does not re-root it under assets_root.
        std::fs::canonicalize(path).unwrap()
    }

    #[test]
    fn missing_payload_draws_nothing() {
        let ops = drawn(&EmptyData { image: None }, DMat4::IDENTITY, &ctx());
        assert!(ops.is_empty());
    }

    #[test]
    fn missing_file_paints_the_magenta_marker() {
        let ops = drawn(
            &payload("no-such-file-anywhere.png", 1, 1),
            DMat4::IDENTITY,
            &ctx(),
        );
        assert!(ops.contains(&PageOp::SetColor(MISSING_COLOR)));
        assert!(ops.iter().any(|op| matches!(op, PageOp::Fill)));
        assert!(ops.iter().all(|op| !matches!(op, PageOp::Image(_))));
    }

    #[test]
    fn placeholder_mode_wins_over_an_existing_file() {
        let path = png_fixture("placeholder_wins.png", 2, 2);
        let mut ctx = ctx();
        ctx.placeholder_images = true;
        let ops = drawn(
            &payload(path.to_str().unwrap(), 2, 2),
            DMat4::IDENTITY,
            &ctx,
        );
        assert!(ops.contains(&PageOp::SetColor(PLACEHOLDER_COLOR)));
        assert!(ops.iter().all(|op| !matches!(op, PageOp::Image(_))));
    }

    #[test]
    fn existing_file_embeds_with_probed_dimensions() {
        let path = png_fixture("embedded.png", 4, 2);
        let mut empty = payload(path.to_str().unwrap(), 0, 0);
        if let Some(image) = &mut empty.image {
            image.display_size = 2.0;
        }
        let ops = drawn(&empty, DMat4::IDENTITY, &ctx());
        assert!(ops.iter().any(|op| matches!(op, PageOp::SaveState)));
        assert!(ops.iter().any(|op| matches!(op, PageOp::RestoreState)));
        // 4x2 source, display 2: quad is (0,0)(0,1)(2,1)(2,0).
        assert!(ops.contains(&PageOp::Translate(DVec2::new(0.0, 1.0))));
        let placement = ops
            .iter()
            .find_map(|op| match op {
                PageOp::Image(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!((placement.width, placement.height), (4, 2));
        let [a, b, c, d, tx, ty] = placement.matrix;
        assert!((a - 2.0).abs() < 1e-9);
        assert_eq!((b, c, tx), (0.0, 0.0, 0.0));
        assert!((d + 2.0).abs() < 1e-9);
        assert!((ty - 2.0).abs() < 1e-9);
        let rotation = ops
            .iter()
            .find_map(|op| match op {
                PageOp::Rotate(deg) => Some(*deg),
                _ => None,
            })
            .unwrap();
        assert!(rotation.abs() < 1e-9);
        assert!(placement.path.ends_with("embedded.png"));
    }

    #[test]
    fn declared_dimensions_drive_the_missing_quad_aspect() {
        let ops = drawn(&payload("missing.png", 4, 2), DMat4::IDENTITY, &ctx());
        assert!(ops.contains(&PageOp::MoveTo(DVec2::new(0.0, 0.0))));
        assert!(ops.contains(&PageOp::LineTo(DVec2::new(0.0, 0.5))));
        assert!(ops.contains(&PageOp::LineTo(DVec2::new(1.0, 0.5))));
        assert!(ops.contains(&PageOp::LineTo(DVec2::new(1.0, 0.0))));
    }

    #[test]
    fn zero_declared_dimensions_clamp_to_one() {
        let ops = drawn(&payload("missing.png", 0, 0), DMat4::IDENTITY, &ctx());
        assert!(ops.contains(&PageOp::MoveTo(DVec2::new(0.0, 0.0))));
        assert!(ops.contains(&PageOp::LineTo(DVec2::new(1.0, 1.0))));
    }

    #[test]
    fn offset_shifts_the_quad_before_projection() {
        let mut empty = payload("missing.png", 1, 1);
        if let Some(image) = &mut empty.image {
            image.display_size = 2.0;
            image.offset = DVec2::new(-0.5, -0.5);
        }
        let ops = drawn(&empty, DMat4::IDENTITY, &ctx());
        assert!(ops.contains(&PageOp::MoveTo(DVec2::new(-1.0, -1.0))));
        assert!(ops.contains(&PageOp::LineTo(DVec2::new(1.0, 1.0))));
    }

    #[test]
    fn rotation_is_clockwise_positive() {
        let path = png_fixture("rotated.png", 2, 2);
        let quarter_turn = DMat4::from_rotation_z(std::f64::consts::FRAC_PI_2);
        let ops = drawn(&payload(path.to_str().unwrap(), 2, 2), quarter_turn, &ctx());
        let rotation = ops
            .iter()
            .find_map(|op| match op {
                PageOp::Rotate(deg) => Some(*deg),
                _ => None,
            })
            .unwrap();
        assert!((rotation - 90.0).abs() < 1e-9);
    }

    #[test]
    fn collapsed_projection_paints_the_marker_instead_of_embedding() {
        let path = png_fixture("collapsed.png", 2, 2);
        let flat = DMat4::from_scale(DVec3::new(1.0, 0.0, 1.0));
        let ops = drawn(&payload(path.to_str().unwrap(), 2, 2), flat, &ctx());
        assert!(ops.contains(&PageOp::SetColor(MISSING_COLOR)));
        assert!(ops
            .iter()
            .all(|op| !matches!(op, PageOp::Image(_) | PageOp::SaveState)));
    }

    #[test]
    fn zero_display_size_draws_the_marker_not_the_embed() {
        let path = png_fixture("zero_display.png", 2, 2);
        let mut empty = payload(path.to_str().unwrap(), 2, 2);
        if let Some(image) = &mut empty.image {
            image.display_size = 0.0;
        }
        let ops = drawn(&empty, DMat4::IDENTITY, &ctx());
        assert!(ops.contains(&PageOp::SetColor(MISSING_COLOR)));
        assert!(ops.iter().all(|op| !matches!(op, PageOp::Image(_))));
    }

    #[test]
    fn non_finite_projection_draws_nothing() {
        let path = png_fixture("unprojectable.png", 2, 2);
        let wild = DMat4::from_translation(DVec3::new(f64::NAN, 0.0, 0.0));
        let ops = drawn(&payload(path.to_str().unwrap(), 2, 2), wild, &ctx());
        assert!(ops.is_empty());
    }
}
