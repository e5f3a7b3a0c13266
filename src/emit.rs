use std::io::Write;
use std::path::PathBuf;

use glam::DVec2;

use crate::error::PlatenResult;
use crate::scene::Rgb;
use crate::view::PageBounds;

/// Document header fields written before any drawing primitive.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    /// Document title, typically the scene or input file name.
    pub title: String,
    /// Human-readable generation date, e.g. `14 December 2013`.
    pub created: String,
}

/// Placement request for an embedded raster image.
///
/// The emitter positions the image with `matrix` (six affine values
/// `a b c d tx ty`) relative to the current graphics state; callers set up
/// translation and rotation beforehand.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    pub matrix: [f64; 6],
    /// Path the consumer reads the raster data from.
    pub path: PathBuf,
}

/// Sink contract for page-description primitives.
///
/// Ordering contract: primitives are consumed in call order; a sink must not
/// reorder one relative to another. All coordinates arrive already projected
/// onto the page plane.
pub trait PageSink {
    /// Called once before any drawing primitive.
    fn begin_document(&mut self, meta: &DocumentMeta, bounds: PageBounds) -> PlatenResult<()>;
    /// Start a fresh path.
    fn begin_path(&mut self) -> PlatenResult<()>;
    fn move_to(&mut self, p: DVec2) -> PlatenResult<()>;
    fn line_to(&mut self, p: DVec2) -> PlatenResult<()>;
    /// Cubic segment from the current point via two control points.
    fn curve_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) -> PlatenResult<()>;
    fn close_path(&mut self) -> PlatenResult<()>;
    fn set_color(&mut self, color: Rgb) -> PlatenResult<()>;
    fn set_line_width(&mut self, width: f64) -> PlatenResult<()>;
    /// Fill the accumulated path and clear it.
    fn fill(&mut self) -> PlatenResult<()>;
    /// Stroke the accumulated path and clear it.
    fn stroke(&mut self) -> PlatenResult<()>;
    fn translate(&mut self, offset: DVec2) -> PlatenResult<()>;
    /// Rotate the graphics state, in degrees, counter-clockwise positive.
    fn rotate(&mut self, degrees: f64) -> PlatenResult<()>;
    fn save_state(&mut self) -> PlatenResult<()>;
    fn restore_state(&mut self) -> PlatenResult<()>;
    /// Embed one raster image under the current graphics state.
    fn image(&mut self, placement: &ImagePlacement) -> PlatenResult<()>;
    /// Called once after the last primitive; completes the page.
    fn show_page(&mut self) -> PlatenResult<()>;
}

/// Production sink: renders primitives as PostScript, one line each.
///
/// Geometry is written at 6 decimals, color components at 4.
pub struct PostScriptEmitter<W: Write> {
    out: W,
}

impl<W: Write> PostScriptEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> PageSink for PostScriptEmitter<W> {
    fn begin_document(&mut self, meta: &DocumentMeta, bounds: PageBounds) -> PlatenResult<()> {
        writeln!(self.out, "%!PS")?;
        writeln!(
            self.out,
            "%%Creator: {}",
            concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
        )?;
        writeln!(self.out, "%%CreationDate: {}", meta.created)?;
        writeln!(self.out, "%%Title: {}", meta.title)?;
        writeln!(
            self.out,
            "%%BoundingBox: 0 0 {:.6} {:.6}",
            bounds.width, bounds.height
        )?;
        writeln!(self.out, "%%EndComments")?;
        Ok(())
    }

    fn begin_path(&mut self) -> PlatenResult<()> {
        writeln!(self.out, "newpath")?;
        Ok(())
    }

    fn move_to(&mut self, p: DVec2) -> PlatenResult<()> {
        writeln!(self.out, "{:.6} {:.6} moveto", p.x, p.y)?;
        Ok(())
    }

    fn line_to(&mut self, p: DVec2) -> PlatenResult<()> {
        writeln!(self.out, "{:.6} {:.6} lineto", p.x, p.y)?;
        Ok(())
    }

    fn curve_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) -> PlatenResult<()> {
        writeln!(
            self.out,
            "{:.6} {:.6} {:.6} {:.6} {:.6} {:.6} curveto",
            c1.x, c1.y, c2.x, c2.y, p.x, p.y
        )?;
        Ok(())
    }

    fn close_path(&mut self) -> PlatenResult<()> {
        writeln!(self.out, "closepath")?;
        Ok(())
    }

    fn set_color(&mut self, color: Rgb) -> PlatenResult<()> {
        writeln!(
            self.out,
            "{:.4} {:.4} {:.4} setrgbcolor",
            color.r, color.g, color.b
        )?;
        Ok(())
    }

    fn set_line_width(&mut self, width: f64) -> PlatenResult<()> {
        writeln!(self.out, "{width:.6} setlinewidth")?;
        Ok(())
    }

    fn fill(&mut self) -> PlatenResult<()> {
        writeln!(self.out, "fill")?;
        Ok(())
    }

    fn stroke(&mut self) -> PlatenResult<()> {
        writeln!(self.out, "stroke")?;
        Ok(())
    }

    fn translate(&mut self, offset: DVec2) -> PlatenResult<()> {
        writeln!(self.out, "{:.6} {:.6} translate", offset.x, offset.y)?;
        Ok(())
    }

    fn rotate(&mut self, degrees: f64) -> PlatenResult<()> {
        writeln!(self.out, "{degrees:.6} rotate")?;
        Ok(())
    }

    fn save_state(&mut self) -> PlatenResult<()> {
        writeln!(self.out, "gsave")?;
        Ok(())
    }

    fn restore_state(&mut self) -> PlatenResult<()> {
        writeln!(self.out, "grestore")?;
        Ok(())
    }

    fn image(&mut self, placement: &ImagePlacement) -> PlatenResult<()> {
        let [a, b, c, d, tx, ty] = placement.matrix;
        writeln!(
            self.out,
            "{} {} 8 [{a:.6} {b:.6} {c:.6} {d:.6} {tx:.6} {ty:.6}] ({}) (r) file/DCTDecode filter false 3 colorimage",
            placement.width,
            placement.height,
            escape_text(&placement.path.display().to_string()),
        )?;
        Ok(())
    }

    fn show_page(&mut self) -> PlatenResult<()> {
        writeln!(self.out, "showpage")?;
        Ok(())
    }
}

// Parenthesized string literals: backslash-escape the delimiters themselves.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One recorded page primitive, structured for assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOp {
    BeginDocument { title: String, bounds: PageBounds },
    BeginPath,
    MoveTo(DVec2),
    LineTo(DVec2),
    CurveTo(DVec2, DVec2, DVec2),
    ClosePath,
    SetColor(Rgb),
    SetLineWidth(f64),
    Fill,
    Stroke,
    Translate(DVec2),
    Rotate(f64),
    SaveState,
    RestoreState,
    Image(ImagePlacement),
    ShowPage,
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingSink {
    ops: Vec<PageOp>,
}

impl RecordingSink {
    /// Create a new recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the captured primitives, in emission order.
    pub fn ops(&self) -> &[PageOp] {
        &self.ops
    }
}

impl PageSink for RecordingSink {
    fn begin_document(&mut self, meta: &DocumentMeta, bounds: PageBounds) -> PlatenResult<()> {
        self.ops.push(PageOp::BeginDocument {
            title: meta.title.clone(),
            bounds,
        });
        Ok(())
    }

    fn begin_path(&mut self) -> PlatenResult<()> {
        self.ops.push(PageOp::BeginPath);
        Ok(())
    }

    fn move_to(&mut self, p: DVec2) -> PlatenResult<()> {
        self.ops.push(PageOp::MoveTo(p));
        Ok(())
    }

    fn line_to(&mut self, p: DVec2) -> PlatenResult<()> {
        self.ops.push(PageOp::LineTo(p));
        Ok(())
    }

    fn curve_to(&mut self, c1: DVec2, c2: DVec2, p: DVec2) -> PlatenResult<()> {
        self.ops.push(PageOp::CurveTo(c1, c2, p));
        Ok(())
    }

    fn close_path(&mut self) -> PlatenResult<()> {
        self.ops.push(PageOp::ClosePath);
        Ok(())
    }

    fn set_color(&mut self, color: Rgb) -> PlatenResult<()> {
        self.ops.push(PageOp::SetColor(color));
        Ok(())
    }

    fn set_line_width(&mut self, width: f64) -> PlatenResult<()> {
        self.ops.push(PageOp::SetLineWidth(width));
        Ok(())
    }

    fn fill(&mut self) -> PlatenResult<()> {
        self.ops.push(PageOp::Fill);
        Ok(())
    }

    fn stroke(&mut self) -> PlatenResult<()> {
        self.ops.push(PageOp::Stroke);
        Ok(())
    }

    fn translate(&mut self, offset: DVec2) -> PlatenResult<()> {
        self.ops.push(PageOp::Translate(offset));
        Ok(())
    }

    fn rotate(&mut self, degrees: f64) -> PlatenResult<()> {
        self.ops.push(PageOp::Rotate(degrees));
        Ok(())
    }

    fn save_state(&mut self) -> PlatenResult<()> {
        self.ops.push(PageOp::SaveState);
        Ok(())
    }

    fn restore_state(&mut self) -> PlatenResult<()> {
        self.ops.push(PageOp::RestoreState);
        Ok(())
    }

    fn image(&mut self, placement: &ImagePlacement) -> PlatenResult<()> {
        self.ops.push(PageOp::Image(placement.clone()));
        Ok(())
    }

    fn show_page(&mut self) -> PlatenResult<()> {
        self.ops.push(PageOp::ShowPage);
        Ok(())
    }
}
