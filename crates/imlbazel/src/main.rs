use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use imlbazel_schemas::{Configuration, Diagnostics, ProjectModel};
use itertools::Itertools;
use mimalloc::MiMalloc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// File the IDE loader writes into the workspace root.
const DEFAULT_MODEL: &str = "project-model.json";

/// Convert an IDE project module graph into build rules.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate rule files for every package of the workspace
    ///
    /// Reads the project model, collapses module cycles, resolves libraries
    /// and jars, and rewrites the per-package rule files that changed.
    Generate(GenerateArgs),

    /// Print the JSON Schema of an input document
    Schema {
        /// Which document to describe
        #[arg(value_enum, default_value_t = Document::Model)]
        document: Document,

        /// Output file path (writes to stdout if not specified)
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Workspace root
    #[arg(default_value = ".")]
    workspace: Utf8PathBuf,

    /// Project model JSON (defaults to <WORKSPACE>/project-model.json)
    #[arg(long)]
    model: Option<Utf8PathBuf>,

    /// Configuration JSON (built-in conventions if not specified)
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Report out-of-date packages without writing them
    #[arg(long)]
    dry_run: bool,

    /// Fail when any warning was reported
    #[arg(long)]
    warnings_as_errors: bool,

    /// Write the unit dependency graph in DOT format
    #[arg(long)]
    dot: Option<Utf8PathBuf>,

    /// Write the full rule graph as JSON
    #[arg(short, long)]
    output: Option<Utf8PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Document {
    /// The project model handed over by the IDE loader
    Model,
    /// The generator configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Output goes to stderr so JSON on stdout stays clean for piping.
    // Default to warn, allowlist our crates.
    const CRATES: &[&str] = &[
        "imlbazel",
        "imlbazel_condense",
        "imlbazel_ir",
        "imlbazel_rules",
        "imlbazel_schemas",
        "imlbazel_viz",
    ];
    let level = cli.verbose.tracing_level_filter();
    let allowlist = CRATES.iter().map(|c| format!("{c}={level}")).join(",");
    let filter = EnvFilter::new(format!("warn,{allowlist}"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate(args) => generate(&args),
        Commands::Schema { document, output } => schema(document, output.as_deref()),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn generate(args: &GenerateArgs) -> Result<ExitCode> {
    let model_path = args
        .model
        .clone()
        .unwrap_or_else(|| args.workspace.join(DEFAULT_MODEL));
    let mut model: ProjectModel = read_json(&model_path)?;
    if model.base_dir.is_relative() {
        model.base_dir = args.workspace.join(&model.base_dir);
    }
    let config = match &args.config {
        Some(path) => read_json(path)?,
        None => Configuration::default(),
    };

    let diagnostics = Diagnostics::new();
    let outcome = imlbazel_rules::run(&model, &config, args.dry_run, &diagnostics)
        .with_context(|| format!("failed to generate rules for {}", model.base_dir))?;

    if let Some(path) = &args.dot {
        let dot = imlbazel_viz::render_dot(&outcome.ir, "dependencies");
        imlbazel_viz::write_dot(path, &dot)?;
    }
    if let Some(path) = &args.output {
        let file = BufWriter::new(
            File::create(path).with_context(|| format!("failed to create output file {path}"))?,
        );
        serde_json::to_writer_pretty(file, &outcome.graph)
            .with_context(|| format!("failed to write output to {path}"))?;
    }

    let tally = diagnostics.tally();
    info!(
        updated = outcome.updated_packages,
        dry_run = args.dry_run,
        "{tally}"
    );
    Ok(if tally.is_failure(args.warnings_as_errors) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn schema(document: Document, output: Option<&Utf8Path>) -> Result<ExitCode> {
    let schema = match document {
        Document::Model => schemars::schema_for!(ProjectModel),
        Document::Config => schemars::schema_for!(Configuration),
    };

    // Stdout must outlive the lock, so bind it first.
    let stdout = std::io::stdout();
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create output file {path}"))?,
        )),
        None => Box::new(stdout.lock()),
    };
    serde_json::to_writer_pretty(&mut writer, &schema).context("failed to write schema")?;
    writeln!(writer)?;
    Ok(ExitCode::SUCCESS)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {path}"))
}
