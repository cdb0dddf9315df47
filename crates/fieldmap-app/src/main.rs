mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use fieldmap_core::config::CanvasConfig;
use fieldmap_core::storage::FileStorage;

/// Field annotation projects: calibrated maps, annotated shapes and journeys
#[derive(Parser, Debug)]
#[command(name = "fieldmap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding project data
    #[arg(long, value_name = "DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Canvas configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored projects
    List,
    /// Create an empty project
    New {
        name: String,
    },
    /// Print shapes, measurements and journeys of a project
    Summary {
        project: Uuid,
    },
    /// Add a background image layer
    AddImage {
        project: Uuid,
        file: PathBuf,
        /// Layer name, defaults to the file name
        #[arg(long)]
        name: Option<String>,
    },
    /// Calibrate from an existing line shape
    Calibrate {
        project: Uuid,
        line: Uuid,
        /// Real-world length of the line
        meters: f64,
    },
    /// Build a frame headlessly and report what would be drawn
    Render {
        project: Uuid,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
    },
    /// Export a project
    Export {
        project: Uuid,
        #[arg(long, value_enum, default_value_t = ExportFormat::Bundle)]
        format: ExportFormat,
        /// Output file, defaults to `<project name>.<ext>` in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    Json,
    Csv,
    Bundle,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Bundle => "zip",
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let storage = match &args.data_dir {
        Some(dir) => FileStorage::new(dir.clone())
            .with_context(|| format!("opening project storage at {}", dir.display()))?,
        None => FileStorage::default_location().context("opening default project storage")?,
    };
    let config = CanvasConfig::load_or_default(args.config.as_deref());
    let app = commands::App::new(storage, config);

    pollster::block_on(commands::run(&app, args.command))
}
