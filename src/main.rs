//! @ai:module:intent CLI entry point that prints the documentation data of an Ansible role
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on config, registry, doc, output

use ansibledoc::{Config, DocumentationParser, Error, FileRegistry, OutputFormat, Result};
use clap::{ArgAction, Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ansibledoc")]
#[command(author, version, about = "Extract documentation annotations from Ansible roles")]
struct Cli {
    /// Role directory
    #[arg(default_value = ".")]
    role_dir: PathBuf,

    /// Config file, replaces the lookup of .ansibledoctor files in the role directory
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "json-pretty")]
    format: Format,

    /// Skip the check that the directory contains a tasks/ folder
    #[arg(short = 'n', long)]
    no_role_detection: bool,

    /// Increase log level
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease log level
    #[arg(short, long, action = ArgAction::Count)]
    quiet: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

fn init_logging(level: LevelFilter) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<String> {
    let mut config = Config::load(&cli.role_dir, cli.config.as_deref())?;
    config.adjust_log_level(i32::from(cli.quiet) - i32::from(cli.verbose));
    init_logging(config.logging.level.as_filter());

    for file in &config.config_files {
        info!("Using config file: {}", file.display());
    }

    if config.role.autodetect && !cli.no_role_detection && !config.is_role() {
        return Err(Error::NotARole(config.base_dir.clone()));
    }

    let registry = FileRegistry::scan(&config)?;
    debug!(
        "Registered {} file(s) in {}",
        registry.list_files().len(),
        registry.base_dir().display()
    );

    let tree = DocumentationParser::new(&config, &registry).parse()?;
    Ok(ansibledoc::format_tree(&tree, cli.format.into()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}
