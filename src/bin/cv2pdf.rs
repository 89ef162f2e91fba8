//! CLI binary for cv-export.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExportConfig`, renders stage progress and reports failures.
//!
//! With no arguments it reproduces the site's print job exactly:
//! `_site/index.html` in, `assets/pdf/cv-keg-dev-print.pdf` out.

use anyhow::{Context, Result};
use clap::Parser;
use cv_export::{
    export, ExportConfig, ExportError, ExportProgressCallback, ExportReport, ProgressCallback,
    Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner with a stage counter, plus one log line per
/// finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(Stage::ALL.len() as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{pos:>2}/{len}]  {msg}  {elapsed:.dim}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Exporting");
        bar.set_message("starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ExportProgressCallback for CliProgressCallback {
    fn on_export_start(&self, total_stages: usize) {
        self.bar.set_length(total_stages as u64);
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(stage.label());
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.bar
            .println(format!("  {} {}", green("✓"), dim(stage.label())));
        self.bar.inc(1);
    }

    fn on_stage_warning(&self, stage: Stage, message: &str) {
        self.bar.println(format!(
            "  {} {}: {}",
            yellow("⚠"),
            stage.label(),
            yellow(message)
        ));
    }

    fn on_stage_failed(&self, stage: Stage, error: &str) {
        // Keep the first line only; the full report follows on exit.
        let first = error.lines().next().unwrap_or(error);
        self.bar
            .println(format!("  {} {}: {}", red("✗"), stage.label(), red(first)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default print job: _site/index.html -> assets/pdf/cv-keg-dev-print.pdf
  cv2pdf

  # Tighter layout, custom paths
  cv2pdf --input public/index.html --output out/cv.pdf --scale 0.8 --margin 0.3

  # Replace the built-in print stylesheet, skip debug PNGs
  cv2pdf --stylesheet print/compact.css --no-debug-screenshots

  # Machine-readable report for CI
  cv2pdf --json --no-progress > export-report.json

EXIT STATUS:
  0  PDF written and at least 1000 bytes
  1  any failure; the failure kind, message and cause chain go to stderr

ENVIRONMENT VARIABLES:
  CV2PDF_INPUT     Entry page of the built site
  CV2PDF_OUTPUT    PDF destination
  CHROME           Browser executable (also --chrome)
  RUST_LOG         Overrides the log filter (e.g. cv_export=debug)
"#;

/// Render the built résumé site to an A4 PDF with headless Chromium.
#[derive(Parser, Debug)]
#[command(
    name = "cv2pdf",
    version,
    about = "Render the built résumé site to an A4 PDF with headless Chromium",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Entry page of the built site.
    #[arg(short, long, env = "CV2PDF_INPUT", default_value = "_site/index.html")]
    input: PathBuf,

    /// Where to write the PDF.
    #[arg(
        short,
        long,
        env = "CV2PDF_OUTPUT",
        default_value = "assets/pdf/cv-keg-dev-print.pdf"
    )]
    output: PathBuf,

    /// Content scale (0.1–2.0). Default: 0.75.
    #[arg(long, env = "CV2PDF_SCALE")]
    scale: Option<f64>,

    /// Uniform page margin in inches. Default: 0.4.
    #[arg(long, env = "CV2PDF_MARGIN")]
    margin: Option<f64>,

    /// CSS file replacing the built-in print stylesheet.
    #[arg(long, env = "CV2PDF_STYLESHEET")]
    stylesheet: Option<PathBuf>,

    /// Settle delay in milliseconds, applied after image fixes and between
    /// debug screenshots. Default: 3000.
    #[arg(long, env = "CV2PDF_SETTLE_MS")]
    settle_ms: Option<u64>,

    /// Navigation timeout in seconds. Default: 60.
    #[arg(long, env = "CV2PDF_NAV_TIMEOUT")]
    nav_timeout: Option<u64>,

    /// Do not write debug-screenshot*.png.
    #[arg(long, env = "CV2PDF_NO_DEBUG_SCREENSHOTS")]
    no_debug_screenshots: bool,

    /// Browser executable. Auto-detected when unset.
    #[arg(long, env = "CHROME")]
    chrome: Option<PathBuf>,

    /// Print the export report as JSON on stdout.
    #[arg(long, env = "CV2PDF_JSON")]
    json: bool,

    /// Disable progress output.
    #[arg(long, env = "CV2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CV2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CV2PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The stage list printed by the progress callback replaces INFO logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress = show_progress.then(CliProgressCallback::new);
    let result = run(&cli, progress.clone()).await;
    if let Some(ref p) = progress {
        p.finish();
    }

    match result {
        Ok(report) => {
            if !cli.quiet && !cli.json {
                print_summary(&report);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_failure(&e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli, progress: Option<Arc<CliProgressCallback>>) -> Result<ExportReport> {
    let progress = progress.map(|p| p as ProgressCallback);
    let config = build_config(cli, progress)?;

    let report = export(&config).await.context("PDF generation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }
    Ok(report)
}

/// Map CLI args to `ExportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExportConfig> {
    let mut builder = ExportConfig::builder()
        .input_path(&cli.input)
        .output_path(&cli.output)
        .capture_debug_screenshots(!cli.no_debug_screenshots);

    if let Some(scale) = cli.scale {
        builder = builder.scale(scale);
    }
    if let Some(margin) = cli.margin {
        builder = builder.margin_inches(margin);
    }
    if let Some(ms) = cli.settle_ms {
        builder = builder.settle_ms(ms);
    }
    if let Some(secs) = cli.nav_timeout {
        builder = builder.navigation_timeout_secs(secs);
    }
    if let Some(ref path) = cli.stylesheet {
        let css = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stylesheet from {}", path.display()))?;
        builder = builder.print_stylesheet(css);
    }
    if let Some(ref chrome) = cli.chrome {
        builder = builder.chrome_path(chrome);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(report: &ExportReport) {
    eprintln!(
        "{}  {}  {}  {}ms",
        green("✔"),
        bold(&report.output_path.display().to_string()),
        dim(&format!("{} bytes", report.pdf_bytes)),
        report.duration_ms,
    );
    if report.images_rewritten > 0 {
        eprintln!(
            "   {} image sources rewritten",
            dim(&report.images_rewritten.to_string())
        );
    }
    for path in &report.debug_screenshots {
        eprintln!("   debug screenshot: {}", dim(&path.display().to_string()));
    }
    if !report.warnings.is_empty() {
        eprintln!("   {} warnings", yellow(&report.warnings.len().to_string()));
    }
}

/// Failure kind, message and cause chain, on stderr.
fn print_failure(e: &anyhow::Error) {
    let kind = e
        .downcast_ref::<ExportError>()
        .map(ExportError::kind)
        .unwrap_or("error");
    eprintln!("{} {} [{}]", red("✘"), bold(&e.to_string()), kind);
    for cause in e.chain().skip(1) {
        for line in cause.to_string().lines() {
            eprintln!("  {line}");
        }
    }
}
