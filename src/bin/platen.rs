use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser};

/// Export an orthographic 3D scene to a flat PostScript page.
#[derive(Parser, Debug)]
#[command(name = "platen", version)]
struct Cli {
    /// Input scene JSON.
    scene: Option<PathBuf>,

    /// Output PostScript path (defaults to the scene path with a `.ps` extension).
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// Draw black placeholder quads instead of embedding images.
    #[arg(long, short = 'n')]
    no_images: bool,

    /// Page units per world unit.
    #[arg(long, default_value_t = platen::DEFAULT_SCALE)]
    scale: f64,

    /// Document title (defaults to the scene file name).
    #[arg(long)]
    title: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(scene_path) = cli.scene else {
        Cli::command().print_long_help()?;
        return Ok(());
    };

    let scene = read_scene_json(&scene_path)?;
    scene.validate()?;

    let out = cli.out.unwrap_or_else(|| scene_path.with_extension("ps"));
    let title = cli.title.or_else(|| {
        scene_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    });

    let options = platen::ExportOptions {
        placeholder_images: cli.no_images,
        scale: cli.scale,
        title,
        assets_root: Some(
            scene_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .to_path_buf(),
        ),
    };

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    platen::write_document(&scene, &out, &options)
        .with_context(|| format!("write document '{}'", out.display()))?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn read_scene_json(path: &Path) -> anyhow::Result<platen::Scene> {
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scene: platen::Scene = serde_json::from_reader(r).with_context(|| "parse scene JSON")?;
    Ok(scene)
}
