use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cupping_radar::config::AppConfig;
use cupping_radar::service::{ReportService, ResponseStatus};
use cupping_radar::sources::{CsvMetadataSource, CsvScoreSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Renders sensory radar reports for cupping lots.
///
/// Fonts are looked up in `assets/fonts` or the directory given by
/// `CUPPING_RADAR_FONTS_DIR`; the system Liberation Sans family is used when
/// no bundled fonts are found.
#[derive(Parser)]
#[command(author, version, about = "Sensory radar reports for cupping lots")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReportArgs {
    /// Lot identifier, e.g. "Lote - 1".
    #[arg(long)]
    lot: String,

    /// TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Score dataset CSV, overriding `sources.scores`.
    #[arg(long)]
    scores: Option<PathBuf>,

    /// Metadata dataset CSV, overriding `sources.metadata`.
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Font directory, overriding `report.fonts_dir`.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the report PDF to disk.
    #[command(name = "render")]
    Render {
        #[command(flatten)]
        args: ReportArgs,

        /// Output file; defaults to `<lot>_radar.pdf`.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the JSON response the report service would return.
    #[command(name = "respond", aliases = ["json"])]
    Respond {
        #[command(flatten)]
        args: ReportArgs,
    },
}

type Service = ReportService<CsvScoreSource, CsvMetadataSource>;

fn init_logger(verbose: bool) {
    let default_filter = if verbose {
        "cupping_radar=debug,info"
    } else {
        "cupping_radar=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn missing_source(name: &str, flag: &str) -> Box<dyn Error> {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("No {name} dataset configured; pass {flag} or set sources.{name} in the config file"),
    )
    .into()
}

fn build_service(args: &ReportArgs) -> Result<Service, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(fonts_dir) = &args.fonts_dir {
        config.report.fonts_dir = Some(fonts_dir.clone());
    }

    let scores = args
        .scores
        .clone()
        .or(config.sources.scores.clone())
        .ok_or_else(|| missing_source("scores", "--scores"))?;
    let metadata = args
        .metadata
        .clone()
        .or(config.sources.metadata.clone())
        .ok_or_else(|| missing_source("metadata", "--metadata"))?;

    tracing::debug!(scores = %scores.display(), metadata = %metadata.display(), "data sources");
    let service = ReportService::new(
        CsvScoreSource::new(scores, &config.report),
        CsvMetadataSource::new(metadata, &config.report),
        config.report,
    )?;
    Ok(service)
}

fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

fn render(args: &ReportArgs, output: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let service = build_service(args)?;
    let report = service.render(&args.lot)?;
    let path = output.unwrap_or_else(|| PathBuf::from(safe_file_name(&report.file_name())));
    std::fs::write(&path, report.bytes())?;
    println!("Generated {} ({} bytes)", path.display(), report.bytes().len());
    Ok(())
}

fn respond(args: &ReportArgs) -> Result<ResponseStatus, Box<dyn Error>> {
    let service = build_service(args)?;
    let response = service.handle(&args.lot);
    eprintln!("Status: {}", response.status.code());
    println!("{}", response.body_json()?);
    Ok(response.status)
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Render { args, output } => render(&args, output),
        Commands::Respond { args } => respond(&args).and_then(|status| match status {
            ResponseStatus::Ok => Ok(()),
            _ => std::process::exit(1),
        }),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
