use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use capguard::config::Config;
use capguard::output::OutputFormat;
use capguard::{render_report, scan, ScanOptions};

#[derive(Parser)]
#[command(
    name = "capguard",
    about = "Static analyzer for capability-check guard placement in C conditionals",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze C sources for capability-check guard conditions
    Analyze {
        /// Path to a source file or directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, ndjson)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Append captured records as NDJSON to this file
        #[arg(long, short = 'r')]
        report: Option<PathBuf>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Exit non-zero when a misplaced capability check is found
        #[arg(long)]
        deny_warnings: bool,
    },

    /// List the recognized capability-check functions
    ListChecks {
        /// Config file path (for extra entries)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .capguard.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            path,
            config,
            format,
            report,
            output,
            deny_warnings,
        } => cmd_analyze(path, config, format, report, output, deny_warnings),
        Commands::ListChecks { config, format } => cmd_list_checks(config, format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn cmd_analyze(
    path: PathBuf,
    config: Option<PathBuf>,
    format_str: String,
    report_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    deny_warnings: bool,
) -> Result<i32, capguard::error::CapError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    });

    let options = ScanOptions {
        config_path: config,
        format,
        deny_warnings_override: deny_warnings.then_some(true),
    };

    let report = scan(&path, &options)?;
    let rendered = render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Record stream is append-only, one serialized record per line.
    if let Some(report_file) = report_path {
        use std::io::Write;
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&report_file)?;
        f.write_all(render_report(&report, OutputFormat::Ndjson)?.as_bytes())?;
    }

    // Exit code: 0 = pass, 1 = misplaced checks under deny-warnings
    Ok(if report.pass { 0 } else { 1 })
}

fn cmd_list_checks(
    config: Option<PathBuf>,
    format_str: String,
) -> Result<i32, capguard::error::CapError> {
    let config = match config {
        Some(path) => Config::load(&path)?,
        None => Config::load(&PathBuf::from(".capguard.toml"))?,
    };
    let entries = config.registry().entries();

    match format_str.as_str() {
        "json" => {
            let rows: Vec<serde_json::Value> = entries
                .iter()
                .map(|(name, idx)| {
                    serde_json::json!({ "function": name, "capability_arg": idx })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            println!("{:<24} CAPABILITY ARG", "FUNCTION");
            println!("{}", "-".repeat(40));
            for (name, idx) in &entries {
                println!("{:<24} {}", name, idx);
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, capguard::error::CapError> {
    let path = PathBuf::from(".capguard.toml");

    if path.exists() && !force {
        eprintln!(".capguard.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .capguard.toml");

    Ok(0)
}
