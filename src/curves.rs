use glam::{DMat4, DVec3};

use crate::emit::PageSink;
use crate::error::PlatenResult;
use crate::scene::{BezierPoint, CurveData, Material, Rgb, Spline};
use crate::view::project;

/// Draws one curve (or text-as-curve) object as path primitives.
///
/// The path accumulates once per object; splines are grouped by material and,
/// for fill-eligible curves, partitioned into a stroke pass (open splines)
/// followed by a fill pass (closed splines). Paint operators are emitted per
/// material group even when no spline matched, which keeps the operator
/// stream uniform and is harmless downstream.
pub(crate) fn draw_curve(
    sink: &mut dyn PageSink,
    curve: &CurveData,
    matrix: &DMat4,
) -> PlatenResult<()> {
    sink.begin_path()?;
    let fill_eligible = curve.fill_eligible();
    if !fill_eligible {
        sink.set_line_width(2.0 * curve.bevel_depth * median_scale(matrix))?;
    }
    let passes: &[bool] = if fill_eligible { &[false, true] } else { &[false] };
    for &is_fill in passes {
        if curve.materials.is_empty() {
            paint_group(sink, curve, 0, None, is_fill, fill_eligible, matrix)?;
        } else {
            for (index, material) in curve.materials.iter().enumerate() {
                paint_group(sink, curve, index, Some(material), is_fill, fill_eligible, matrix)?;
            }
        }
    }
    Ok(())
}

fn paint_group(
    sink: &mut dyn PageSink,
    curve: &CurveData,
    index: usize,
    material: Option<&Material>,
    is_fill: bool,
    fill_eligible: bool,
    matrix: &DMat4,
) -> PlatenResult<()> {
    for spline in &curve.splines {
        if spline.material_index() != index {
            continue;
        }
        if fill_eligible && spline.cyclic() != is_fill {
            continue;
        }
        if spline.is_empty() {
            tracing::debug!("spline with no points skipped");
            continue;
        }
        match spline {
            Spline::Poly(poly) => draw_poly(sink, &poly.points, poly.cyclic, matrix)?,
            Spline::Bezier(bezier) => draw_bezier(sink, &bezier.points, bezier.cyclic, matrix)?,
        }
    }
    sink.set_color(material.map_or(Rgb::BLACK, |m| m.diffuse))?;
    if is_fill { sink.fill() } else { sink.stroke() }
}

fn draw_poly(
    sink: &mut dyn PageSink,
    points: &[DVec3],
    cyclic: bool,
    matrix: &DMat4,
) -> PlatenResult<()> {
    for (i, point) in points.iter().enumerate() {
        let p = project(matrix, *point);
        if i == 0 {
            sink.move_to(p)?;
        } else {
            sink.line_to(p)?;
        }
    }
    if cyclic {
        sink.close_path()?;
    }
    Ok(())
}

// Cyclic splines start at the last anchor so the wrap segment comes first;
// open splines run over consecutive pairs. Callers guarantee `points` is
// non-empty.
fn draw_bezier(
    sink: &mut dyn PageSink,
    points: &[BezierPoint],
    cyclic: bool,
    matrix: &DMat4,
) -> PlatenResult<()> {
    let (mut prev, tail) = if cyclic {
        (points[points.len() - 1], points)
    } else {
        (points[0], &points[1..])
    };
    if tail.is_empty() {
        return Ok(());
    }
    sink.move_to(project(matrix, prev.co))?;
    for cur in tail {
        sink.curve_to(
            project(matrix, prev.handle_right),
            project(matrix, cur.handle_left),
            project(matrix, cur.co),
        )?;
        prev = *cur;
    }
    if cyclic {
        sink.close_path()?;
    }
    Ok(())
}

// Scale of the upper 3x3, measured along the unit diagonal (the host
// convention this exporter's stroke widths were authored against).
fn median_scale(matrix: &DMat4) -> f64 {
    matrix
        .transform_vector3(DVec3::splat(1.0 / 3f64.sqrt()))
        .length()
}
