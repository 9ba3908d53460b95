//! CLI definition, tracing setup, and the `generate` run.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use reviewpress_core::pipeline::{GenerateConfig, GenerateReport, IndexOutcome, generate};
use reviewpress_shared::{AppConfig, SiteConfig, load_config, load_config_from};
use tracing::info;

/// Exit code when the article was written but its sidecar or the index step failed.
const EXIT_PARTIAL: u8 = 2;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// reviewpress: render review articles into a static site.
#[derive(Parser)]
#[command(
    name = "reviewpress",
    version,
    about = "Render a review article document into a static HTML page and site index.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Article document (.yaml, .yml, or .json).
    #[arg(long)]
    pub input: PathBuf,

    /// Directory image paths in the document are resolved against.
    #[arg(long)]
    pub images_root: PathBuf,

    /// Output directory (created if absent).
    #[arg(long)]
    pub out: PathBuf,

    /// Merge the article into `<out>/index.json` and regenerate `index.html`.
    #[arg(long)]
    pub index: bool,

    /// Rebuild the index from `<out>/*.meta.json` sidecars (implies --index).
    #[arg(long)]
    pub rebuild_index: bool,

    /// Directory with `article.html.hbs` / `index.html.hbs` overrides.
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Directory with a `styles.css` to inline into generated pages.
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Config file (defaults to ~/.reviewpress/reviewpress.toml).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries the run summary.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "reviewpress=info",
        1 => "reviewpress=debug",
        _ => "reviewpress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run one generation and map the outcome to an exit code.
pub(crate) fn run(cli: Cli) -> Result<ExitCode> {
    let config = generate_config(cli)?;
    let report = generate(&config)
        .wrap_err_with(|| format!("failed to generate {}", config.input.display()))?;

    print_summary(&report);

    if let Err(e) = &report.sidecar {
        eprintln!(
            "error: article was written to {} but its metadata sidecar was not: {e}",
            report.article.path.display()
        );
    }
    if let IndexOutcome::Failed(e) = &report.index {
        eprintln!(
            "error: article was written to {} but the index update failed: {e}",
            report.article.path.display()
        );
    }

    if report.is_partial() {
        Ok(ExitCode::from(EXIT_PARTIAL))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Merge config file values, CLI flags, and defaults into a pipeline config.
fn generate_config(cli: Cli) -> Result<GenerateConfig> {
    let app_config: AppConfig = match &cli.config {
        Some(path) => load_config_from(path)
            .wrap_err_with(|| format!("failed to load config {}", path.display()))?,
        None => load_config().wrap_err("failed to load config")?,
    };

    let site = SiteConfig::from(&app_config).with_overrides(cli.templates, cli.assets);
    info!(
        site_title = %site.title,
        templates = ?site.templates_dir,
        assets = ?site.assets_dir,
        "configuration resolved"
    );

    Ok(GenerateConfig {
        input: cli.input,
        images_root: cli.images_root,
        out_dir: cli.out,
        update_index: cli.index || cli.rebuild_index,
        rebuild_index: cli.rebuild_index,
        site,
    })
}

fn print_summary(report: &GenerateReport) {
    println!();
    println!("  Article: {}", report.article.path.display());
    println!("  Slug:    {}", report.slug);
    println!(
        "  Size:    {} bytes (sha256 {})",
        report.article.size_bytes,
        &report.article.sha256[..12]
    );
    if !report.missing_images.is_empty() {
        println!("  Missing images: {}", report.missing_images.len());
        for path in &report.missing_images {
            println!("    - {path}");
        }
    }
    match &report.index {
        IndexOutcome::Skipped => println!("  Index:   skipped"),
        IndexOutcome::Updated { page, entries } => {
            println!("  Index:   {} ({entries} articles)", page.path.display())
        }
        IndexOutcome::Failed(_) => println!("  Index:   FAILED"),
    }
    println!("  Time:    {:.2}s", report.elapsed.as_secs_f64());
    println!();
}
