use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use pdf_renderer_view::acquisition::LocalFileAcquirer;
use pdf_renderer_view::command_source::{CommandSource, LineCommandSource};
use pdf_renderer_view::sample_app::{SampleApp, run_with_command_source};
use pdf_renderer_view::settings;
use pdf_renderer_view::view::ViewConfiguration;
use pdf_renderer_view::view::loopback::LoopbackFactory;

#[derive(Parser, Debug)]
#[command(
    name = "pdf-renderer-view",
    version,
    about = "Drive a PDF page view from a command stream"
)]
struct Cli {
    /// Local PDF to open (path or file:// URI)
    source: Option<String>,

    /// Render only the first page
    #[arg(long)]
    single_page: bool,

    #[arg(long)]
    max_zoom: Option<f32>,

    /// Gap between pages, in density-independent pixels
    #[arg(long)]
    distance: Option<f32>,

    #[arg(long)]
    max_page_resolution: Option<f32>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    #[arg(long, default_value = "pdf-renderer-view.log")]
    log_file: PathBuf,

    /// Overrides the level from the settings file
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(settings::get_log_level)
        .parse()
        .unwrap_or(LevelFilter::Info);
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&cli.log_file)
            .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?,
    )?;

    info!("Starting pdf-renderer-view");

    let mut config = ViewConfiguration {
        source: cli.source.clone(),
        max_zoom: cli.max_zoom,
        distance_between_pages: cli.distance,
        max_page_resolution: cli.max_page_resolution,
        single_page: cli.single_page.then_some(true),
        ..ViewConfiguration::default()
    }
    .or(&settings::view_defaults());
    config.test_id = Some("pdf-renderer-view".to_string());

    let mut app = SampleApp::new(
        LoopbackFactory::new().verifying_files(),
        LocalFileAcquirer::new(),
        config,
    );

    let mut source: Box<dyn CommandSource> = match &cli.script {
        Some(path) => Box::new(LineCommandSource::new(BufReader::new(
            File::open(path).with_context(|| format!("cannot open script {}", path.display()))?,
        ))),
        None => Box::new(LineCommandSource::new(io::stdin().lock())),
    };

    let result = run_with_command_source(&mut app, source.as_mut(), &mut io::stdout().lock());
    if let Err(e) = &result {
        error!("Sample host failed: {e:?}");
    }

    info!("Shutting down pdf-renderer-view");
    result
}
