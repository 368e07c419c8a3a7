use clap::{Args, Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use hahnemann::config::{config_dir, load_config, resolve_path, CONFIG_TEMPLATE};
use hahnemann::error::{HahnemannError, Result};
use hahnemann::invoice::{
    collect_lines, default_output_path, export_invoice, format_money, WatermarkMode,
};
use hahnemann::shell::{line_table, Shell};
use hahnemann::watermark::{self, WatermarkSource};

#[derive(Parser)]
#[command(name = "hahnemann")]
#[command(version, about = "Pharmacy inventory and PDF invoicing for The Hahnemann", long_about = None)]
struct Cli {
    /// Path to config directory (default: platform config dir or ~/.hahnemann)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log debug output to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LineArgs {
    /// Invoice line as "name:quantity:price[:discount]" (can be repeated)
    #[arg(short, long, value_name = "NAME:QTY:PRICE[:DISC]")]
    line: Vec<String>,

    /// TOML file with [[line]] tables (name, quantity, price, discount)
    #[arg(long, value_name = "FILE")]
    lines: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a config template and the stock watermark
    Init,

    /// Show configuration status
    Status,

    /// Print the computed invoice rows and grand total
    Preview {
        #[command(flatten)]
        lines: LineArgs,
    },

    /// Export a PDF invoice
    Generate {
        #[command(flatten)]
        lines: LineArgs,

        /// Custom output file path (default: output_dir/invoice.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not load or stamp the watermark
        #[arg(long)]
        no_watermark: bool,

        /// Print the export summary as JSON
        #[arg(long)]
        json: bool,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Start an interactive session (login, inventory, billing)
    Shell,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Preview { lines } => cmd_preview(&cfg_dir, &lines),
        Commands::Generate {
            lines,
            output,
            no_watermark,
            json,
            open,
        } => cmd_generate(&cfg_dir, &lines, output, no_watermark, json, open),
        Commands::Shell => cmd_shell(&cfg_dir),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(HahnemannError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    watermark::write_default(&cfg_dir.join("watermark.png"))?;

    println!("Initialized hahnemann config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Review shop and invoice settings:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Replace the stock watermark:       {}/watermark.png",
        cfg_dir.display()
    );
    println!();
    println!("Then start a session:");
    println!("  hahnemann shell");

    Ok(())
}

/// Show configuration status
fn cmd_status(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let source = WatermarkSource::from_setting(&config.pdf.watermark, cfg_dir);

    println!("Hahnemann Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Shop:             {}", config.shop.name);
    println!("Invoice title:    {}", config.invoice.title);
    println!("Currency:         {}", config.invoice.currency_label);
    println!("Watermark:        {source}");
    println!(
        "Output directory: {}",
        resolve_path(&config.pdf.output_dir, cfg_dir).display()
    );
    println!(
        "Next export:      {}",
        default_output_path(&config, cfg_dir).display()
    );
    println!(
        "Identity sign-in: {}",
        config.auth.client_id.as_deref().unwrap_or("not configured")
    );

    Ok(())
}

fn cmd_preview(cfg_dir: &Path, args: &LineArgs) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let lines = collect_lines(&args.line, args.lines.as_deref())?;
    println!("{}", line_table(&lines, &config.invoice.currency_label));
    Ok(())
}

/// Export a PDF invoice
fn cmd_generate(
    cfg_dir: &Path,
    args: &LineArgs,
    output: Option<PathBuf>,
    no_watermark: bool,
    json: bool,
    open: bool,
) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let lines = collect_lines(&args.line, args.lines.as_deref())?;
    let mode = if no_watermark {
        WatermarkMode::Skip
    } else {
        WatermarkMode::Configured
    };

    let summary = export_invoice(cfg_dir, &config, &lines, output, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Generated {}", config.invoice.file_name);
        println!("  Lines:  {}", summary.lines);
        println!("  Pages:  {}", summary.pages);
        println!(
            "  Total:  {}",
            format_money(summary.grand_total, &summary.currency_label)
        );
        println!("  Saved:  {}", summary.path.display());
    }

    if open {
        open_path(&summary.path)?;
    }

    Ok(())
}

fn cmd_shell(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let stdin = io::stdin();
    let mut shell = Shell::new(cfg_dir.to_path_buf(), config, io::stdout());
    shell.run(stdin.lock())
}

fn open_path(pdf_path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", pdf_path.to_str().unwrap_or("")])
            .spawn()?;
    }
    Ok(())
}
