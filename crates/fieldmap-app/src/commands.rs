//! Subcommand implementations.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use kurbo::Size;
use uuid::Uuid;

use fieldmap_core::background::{BackgroundImage, ImageFormat, ImageSource};
use fieldmap_core::config::CanvasConfig;
use fieldmap_core::project::Project;
use fieldmap_core::session::Session;
use fieldmap_core::storage::{FileStorage, StorageExt};
use fieldmap_export::{ExportInput, StripOptions};
use fieldmap_render::{DisplayListRenderer, ImageCache, Layer, RasterDecoder, RenderContext, Renderer};

use crate::{Command, ExportFormat};

pub struct App {
    storage: Arc<FileStorage>,
    config: CanvasConfig,
}

impl App {
    pub fn new(storage: FileStorage, config: CanvasConfig) -> Self {
        Self {
            storage: Arc::new(storage),
            config,
        }
    }

    async fn open(&self, project: Uuid) -> Result<Session<FileStorage>> {
        Session::open(self.storage.clone(), project, self.config.clone())
            .await
            .with_context(|| format!("opening project {project}"))
    }
}

pub async fn run(app: &App, command: Command) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(app, command, &mut out).await
}

pub async fn execute(app: &App, command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::List => list(app, out).await,
        Command::New { name } => {
            let session = Session::create(app.storage.clone(), &name, app.config.clone()).await?;
            writeln!(out, "{}", session.project().id)?;
            session.close().await?;
            Ok(())
        }
        Command::Summary { project } => summary(app, project, out).await,
        Command::AddImage { project, file, name } => add_image(app, project, &file, name, out).await,
        Command::Calibrate { project, line, meters } => {
            let mut session = app.open(project).await?;
            let calibration = session
                .canvas_mut()
                .calibrate_from_line(line, meters)
                .context("calibrating")?;
            writeln!(out, "Calibrated at {:.3} px/m", calibration.pixels_per_meter)?;
            session.close().await?;
            Ok(())
        }
        Command::Render { project, width, height } => render(app, project, Size::new(width, height), out).await,
        Command::Export {
            project,
            format,
            output,
        } => export(app, project, format, output, out).await,
    }
}

async fn list(app: &App, out: &mut dyn Write) -> Result<()> {
    let mut projects: Vec<Project> = app.storage.load_all(None).await?;
    if projects.is_empty() {
        writeln!(out, "No projects in {}", app.storage.base_path().display())?;
        return Ok(());
    }
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    for project in projects {
        writeln!(
            out,
            "{}  {}  {}",
            project.id,
            project.updated_at.format("%Y-%m-%d %H:%M"),
            project.name
        )?;
    }
    Ok(())
}

async fn summary(app: &App, project: Uuid, out: &mut dyn Write) -> Result<()> {
    let session = app.open(project).await?;
    let canvas = session.canvas();
    writeln!(out, "{} ({})", session.project().name, session.project().id)?;
    match canvas.calibration() {
        Some(c) => writeln!(out, "Calibration: {:.3} px/m", c.pixels_per_meter)?,
        None => writeln!(out, "Calibration: none")?,
    }

    writeln!(out, "\nShapes ({}):", canvas.scene().len())?;
    for object in canvas.scene().objects() {
        let measurement = canvas.measure(object.id).map(|m| m.format()).unwrap_or_default();
        write!(out, "  {}  {:<8}  {:<20}  {}", object.id, object.kind().label(), object.name, measurement)?;
        if !object.metadata.tags.is_empty() {
            write!(out, "  [{}]", object.metadata.tags.join(", "))?;
        }
        writeln!(out)?;
    }

    if !canvas.sequences().is_empty() {
        writeln!(out, "\nJourneys:")?;
        for sequence in canvas.sequences().iter() {
            let names = sequence.names_in_order(canvas.scene());
            writeln!(out, "  {}: {}", sequence.name, names.join(" -> "))?;
        }
    }
    Ok(())
}

async fn add_image(app: &App, project: Uuid, file: &Path, name: Option<String>, out: &mut dyn Write) -> Result<()> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let format = ImageFormat::from_magic_bytes(&bytes)
        .or_else(|| {
            file.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .with_context(|| format!("{} is not a PNG, JPEG or WebP image", file.display()))?;
    let name = name.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    });

    let mut session = app.open(project).await?;
    let mut image = BackgroundImage::new(name, ImageSource::from_bytes(format, &bytes));
    image.z_index = session.canvas().scene().images().len() as i32;
    let id = session.canvas_mut().add_image(image);

    let mut cache = ImageCache::new();
    cache.decode_pending(&RasterDecoder, session.canvas_mut()).await;
    if let Some(e) = cache.error(id) {
        bail!("{} could not be decoded: {}", file.display(), e);
    }
    let size = session
        .canvas()
        .scene()
        .image(id)
        .and_then(|img| img.natural_size)
        .unwrap_or(Size::ZERO);
    session.close().await?;
    writeln!(out, "Added image {} ({}x{})", id, size.width, size.height)?;
    Ok(())
}

async fn render(app: &App, project: Uuid, container: Size, out: &mut dyn Write) -> Result<()> {
    let mut session = app.open(project).await?;
    let canvas = session.canvas_mut();
    canvas.set_container(container);
    let mut cache = ImageCache::new();
    cache.decode_pending(&RasterDecoder, canvas).await;
    canvas.fit_to_content();

    let mut renderer = DisplayListRenderer::new();
    renderer.build_scene(&RenderContext::new(session.canvas(), &cache))?;
    let list = renderer.display_list();
    writeln!(out, "Grid: {}", session.canvas().config().display.grid_style.name())?;
    for layer in [
        Layer::Background,
        Layer::Grid,
        Layer::Images,
        Layer::Shapes,
        Layer::Calibration,
        Layer::Draft,
    ] {
        writeln!(out, "{:<12} {}", format!("{layer:?}"), list.layer(layer).count())?;
    }
    if let Some(minimap) = renderer.minimap() {
        writeln!(out, "{:<12} {}", "Minimap", minimap.len())?;
    }
    Ok(())
}

fn default_output(project: &Project, format: ExportFormat) -> PathBuf {
    let stem: String = project
        .name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { project.id.to_string() } else { stem };
    PathBuf::from(format!("{stem}.{}", format.extension()))
}

async fn export(
    app: &App,
    project: Uuid,
    format: ExportFormat,
    output: Option<PathBuf>,
    out: &mut dyn Write,
) -> Result<()> {
    let session = app.open(project).await?;
    let input = ExportInput::new(session.project(), session.canvas());
    let path = output.unwrap_or_else(|| default_output(session.project(), format));

    match format {
        ExportFormat::Json => fs::write(&path, fieldmap_export::to_json(&input)?)?,
        ExportFormat::Csv => fs::write(&path, fieldmap_export::to_csv(&input))?,
        ExportFormat::Bundle => {
            let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = fieldmap_export::write_bundle(&input, BufWriter::new(file), &StripOptions::default())?;
            writer.flush()?;
        }
    }
    writeln!(out, "Exported to {}", path.display())?;
    Ok(())
}
