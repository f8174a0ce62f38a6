//! CLI binary for edgequake-pdf2csv.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `convert` turns one local PDF into a CSV file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdf2csv::server::{self, AppState};
use edgequake_pdf2csv::{Conversion, ConversionConfig, Converter};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on 0.0.0.0:8000
  pdf2csv serve

  # Upload a PDF to a running service
  curl -F file=@invoice.pdf http://localhost:8000/convert_pdf_to_csv/ -o invoice.pdf.csv

  # Convert a local file (writes invoice.pdf.csv next to it)
  pdf2csv convert invoice.pdf

  # OCR a German scan at 300 DPI
  pdf2csv convert --ocr-lang deu --dpi 300 scan.pdf -o scan.csv

ENVIRONMENT VARIABLES:
  PDF2CSV_*          Every flag can be set as PDF2CSV_<FLAG>, e.g. PDF2CSV_PORT=9000
  PDFIUM_LIB_PATH    Path to libpdfium when it is not on the library path
  RUST_LOG           Overrides -v/-q, e.g. RUST_LOG=edgequake_pdf2csv=debug

REQUIREMENTS:
  libpdfium          https://github.com/bblanchon/pdfium-binaries
  tesseract          needed for scanned PDFs only (apt install tesseract-ocr)
"#;

/// Convert PDF documents to CSV: table extraction for text PDFs, OCR for scans.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2csv",
    version,
    about = "Convert PDF documents to CSV (tables from text PDFs, OCR text from scans)",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    engine: EngineArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2CSV_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to bind.
        #[arg(long, env = "PDF2CSV_HOST", default_value = "0.0.0.0")]
        host: IpAddr,

        /// Port to listen on.
        #[arg(long, env = "PDF2CSV_PORT", default_value_t = 8000)]
        port: u16,

        /// Largest accepted upload, in MiB.
        #[arg(long, env = "PDF2CSV_MAX_UPLOAD_MB", default_value_t = 50)]
        max_upload_mb: usize,
    },

    /// Convert one local PDF to a CSV file.
    Convert {
        /// Local PDF file path.
        input: PathBuf,

        /// Write CSV to this file. Default: the input path with .csv appended.
        #[arg(short, long, env = "PDF2CSV_OUTPUT")]
        output: Option<PathBuf>,
    },
}

/// Options shared by both subcommands.
#[derive(Args, Debug)]
struct EngineArgs {
    /// Directory for uploads, page images and CSV artifacts.
    #[arg(long, global = true, env = "PDF2CSV_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Rasterisation DPI for OCR (72–600).
    #[arg(long, global = true, env = "PDF2CSV_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Cap on the rendered image width and height, in pixels.
    #[arg(long, global = true, env = "PDF2CSV_MAX_PIXELS", default_value_t = 4000,
          value_parser = clap::value_parser!(u32).range(100..=20_000))]
    max_pixels: u32,

    /// Tesseract language(s), e.g. eng or eng+deu.
    #[arg(long, global = true, env = "PDF2CSV_OCR_LANG", default_value = "eng")]
    ocr_lang: String,

    /// Tesseract executable.
    #[arg(long, global = true, env = "PDF2CSV_TESSERACT", default_value = "tesseract")]
    tesseract: PathBuf,

    /// pdfium library file or the directory containing it.
    #[arg(long, global = true, env = "PDF2CSV_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "PDF2CSV_PASSWORD")]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The convert spinner gives the feedback that matters, so INFO-level
    // library logs are hidden there unless -v is given.
    let serving = matches!(cli.command, Command::Serve { .. });
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || !serving {
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

    let config = build_config(&cli.engine)?;
    let converter = Converter::from_config(config).context("Failed to initialise PDF engine")?;
    if !converter.ocr_available() {
        warn!(
            "tesseract not found at '{}'; scanned PDFs will fail",
            converter.config().tesseract_path.display()
        );
    }

    match cli.command {
        Command::Serve {
            host,
            port,
            max_upload_mb,
        } => {
            let addr = SocketAddr::new(host, port);
            let scratch = converter.scratch().root().display().to_string();
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    cyan("◆"),
                    bold(&format!("pdf2csv listening on http://{addr}")),
                    dim(&format!("scratch: {scratch}"))
                );
            }
            server::serve(
                AppState::new(converter),
                addr,
                max_upload_mb.saturating_mul(1024 * 1024),
            )
            .await
            .with_context(|| format!("Server on {addr} failed"))?;
        }
        Command::Convert { input, output } => {
            let output = output.unwrap_or_else(|| default_output(&input));
            run_convert(&converter, &input, &output, cli.quiet).await?;
        }
    }

    Ok(())
}

async fn run_convert(converter: &Converter, input: &Path, output: &Path, quiet: bool) -> Result<()> {
    let spinner = (!quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(input.display().to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let result = converter.convert_file(input, output).await;
    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }
    let conversion = result.with_context(|| format!("Conversion of {} failed", input.display()))?;

    let stats = conversion.stats();
    match &conversion {
        Conversion::Csv(artifact) => {
            if !quiet {
                eprintln!(
                    "{}  {} pages via {}  {} records  {}ms  →  {}",
                    green("✔"),
                    stats.total_pages,
                    stats.mode,
                    stats.rows_written,
                    stats.total_duration_ms,
                    bold(&artifact.path.display().to_string()),
                );
            }
            Ok(())
        }
        Conversion::NoData { .. } => {
            anyhow::bail!(
                "No data extracted: {} has text but no table was found ({} pages)",
                input.display(),
                stats.total_pages
            )
        }
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(args: &EngineArgs) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .dpi(args.dpi)
        .max_rendered_pixels(args.max_pixels)
        .ocr_language(args.ocr_lang.clone())
        .tesseract_path(args.tesseract.clone());

    if let Some(ref dir) = args.scratch_dir {
        builder = builder.scratch_dir(dir.clone());
    }
    if let Some(ref lib) = args.pdfium_lib {
        builder = builder.pdfium_lib_path(lib.clone());
    }
    if let Some(ref pwd) = args.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}

/// `<input>.csv`, the same name the HTTP service offers for download.
fn default_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".csv");
    PathBuf::from(name)
}
