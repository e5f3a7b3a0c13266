use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use glam::DVec2;

use crate::curves::draw_curve;
use crate::emit::{DocumentMeta, PageSink, PostScriptEmitter};
use crate::error::PlatenResult;
use crate::images::draw_image;
use crate::scene::{ObjectData, Scene};
use crate::view::{DEFAULT_SCALE, derive_view};
use crate::walk::{PlacedObject, SceneObjects};

/// Knobs for one export run.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Replace embedded images with black placeholder quads.
    pub placeholder_images: bool,
    /// Page units per world unit.
    pub scale: f64,
    /// Document title; defaults to the scene name.
    pub title: Option<String>,
    /// Base directory for relative image paths; defaults to the current dir.
    pub assets_root: Option<PathBuf>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            placeholder_images: false,
            scale: DEFAULT_SCALE,
            title: None,
            assets_root: None,
        }
    }
}

/// Per-run state threaded to the drawing components.
pub(crate) struct ExportContext {
    pub(crate) placeholder_images: bool,
    pub(crate) assets_root: PathBuf,
}

impl ExportContext {
    fn new(options: &ExportOptions) -> Self {
        Self {
            placeholder_images: options.placeholder_images,
            assets_root: options
                .assets_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Export one scene into a page sink.
///
/// Pipeline:
/// 1. validate the scene and derive the view transform
/// 2. enumerate every placement (instances, background chain) and depth-sort
/// 3. draw curves and images back to front, then complete the page
#[tracing::instrument(skip(scene, sink))]
pub fn export_scene(
    scene: &Scene,
    sink: &mut dyn PageSink,
    options: &ExportOptions,
) -> PlatenResult<()> {
    scene.validate()?;
    let view = derive_view(scene, options.scale)?;
    let ctx = ExportContext::new(options);

    let title = options.title.clone().unwrap_or_else(|| scene.name.clone());
    let meta = DocumentMeta {
        title,
        created: creation_date(),
    };
    sink.begin_document(&meta, view.page)?;
    // The page origin sits at the center; the bounding box does not.
    sink.translate(DVec2::new(view.page.width / 2.0, view.page.height / 2.0))?;

    let mut placed: Vec<PlacedObject> = SceneObjects::new(scene, view.matrix).collect();
    sort_back_to_front(&mut placed);

    for item in &placed {
        match &item.object.data {
            ObjectData::Curve(curve) | ObjectData::Text(curve) => {
                draw_curve(sink, curve, &item.matrix)?;
            }
            ObjectData::Empty(empty) => draw_image(sink, empty, &item.matrix, &ctx)?,
            ObjectData::Unsupported => {}
        }
    }
    sink.show_page()
}

/// Export `scene` to a PostScript document at `path`.
///
/// The stream goes to a sibling temp file that is renamed into place on
/// success, so a failed export never leaves a partial document at `path`.
pub fn write_document(scene: &Scene, path: &Path, options: &ExportOptions) -> PlatenResult<()> {
    let tmp = temp_sibling(path);
    let mut tmp_guard = TempFileGuard(Some(tmp.clone()));
    {
        let file = fs::File::create(&tmp)?;
        let mut out = BufWriter::new(file);
        let mut emitter = PostScriptEmitter::new(&mut out);
        export_scene(scene, &mut emitter, options)?;
        out.flush()?;
    }
    fs::rename(&tmp, path)?;
    tmp_guard.0 = None;
    Ok(())
}

// Painter's order: ascending view-space depth of each placement's origin,
// object name as the deterministic tie-break.
fn sort_back_to_front(placed: &mut [PlacedObject<'_>]) {
    placed.sort_by(|a, b| {
        a.matrix
            .w_axis
            .z
            .total_cmp(&b.matrix.w_axis.z)
            .then_with(|| a.object.name.cmp(&b.object.name))
    });
}

// Header date in `14 December 2013` form.
fn creation_date() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!("{:02} {} {}", now.day(), now.month(), now.year())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| std::ffi::OsString::from("platen-output"));
    name.push(".tmp");
    path.with_file_name(name)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = fs::remove_file(path);
        }
    }
}
