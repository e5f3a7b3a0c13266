#![forbid(unsafe_code)]

pub mod emit;
pub mod error;
pub mod export;
pub mod scene;
pub mod view;
pub mod walk;

mod curves;
mod images;

pub use emit::{DocumentMeta, ImagePlacement, PageOp, PageSink, PostScriptEmitter, RecordingSink};
pub use error::{PlatenError, PlatenResult};
pub use export::{ExportOptions, export_scene, write_document};
pub use scene::Scene;
pub use view::{DEFAULT_SCALE, PageBounds, ViewTransform, aspect_normalize, derive_view};
pub use walk::{PlacedObject, SceneObjects};
