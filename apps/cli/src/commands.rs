//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use nbcontent_core::{NotebookTransformer, Transformer};
use nbcontent_markdown::render_html;
use nbcontent_shared::{AppConfig, CompileOptions, ParsedContent, init_config, load_config};
use serde_json::Value;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// nbcontent: compile Jupyter notebooks into document trees.
#[derive(Parser)]
#[command(
    name = "nbcontent",
    version,
    about = "Compile .ipynb notebooks into structured document trees.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// What `parse` prints on stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// The full record as JSON.
    Json,
    /// The compiled tree rendered as HTML.
    Html,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Compile one notebook and print the resulting record.
    Parse {
        /// Path to the notebook file.
        path: PathBuf,

        /// Content id reported in the record (defaults to the file path).
        #[arg(long)]
        id: Option<String>,

        /// Output format (defaults to `output_format` from the config).
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Hand the file text to the transformer unparsed.
        #[arg(long)]
        raw: bool,

        /// Print JSON on a single line.
        #[arg(long)]
        compact: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Create a default config file at ~/.nbcontent/nbcontent.toml.
    Init,
    /// Print the effective configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber. Logs go to stderr; stdout carries output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "nbcontent=info",
        1 => "nbcontent=debug",
        _ => "nbcontent=trace",
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
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Parse {
            path,
            id,
            format,
            raw,
            compact,
        } => cmd_parse(&path, id.as_deref(), format, raw, compact).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_parse(
    path: &Path,
    id: Option<&str>,
    format: Option<OutputFormat>,
    raw: bool,
    compact: bool,
) -> Result<()> {
    let config = load_config()?;
    let format = format.unwrap_or_else(|| configured_format(&config));
    let pretty = config.defaults.pretty && !compact;

    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let content = if raw {
        Value::String(text)
    } else {
        serde_json::from_str(&text)
            .wrap_err_with(|| format!("{} is not valid JSON (use --raw to pass it through)", path.display()))?
    };

    let id = id
        .map(String::from)
        .unwrap_or_else(|| path.display().to_string());
    info!(%id, ?format, raw, "compiling notebook");

    let transformer = NotebookTransformer::new(CompileOptions::from(&config));
    let record = transformer.parse(&id, Some(&content)).await;

    println!("{}", render_record(&record, format, pretty)?);
    Ok(())
}

fn configured_format(config: &AppConfig) -> OutputFormat {
    match config.defaults.output_format.as_str() {
        "html" => OutputFormat::Html,
        _ => OutputFormat::Json,
    }
}

fn render_record(record: &ParsedContent, format: OutputFormat, pretty: bool) -> Result<String> {
    match (format, record.tree()) {
        (OutputFormat::Html, Some(root)) => Ok(render_html(std::slice::from_ref(root))),
        (OutputFormat::Html, None) => {
            warn!("record has a JSON body, printing JSON instead of HTML");
            to_json(record, pretty)
        }
        (OutputFormat::Json, _) => to_json(record, pretty),
    }
}

fn to_json(record: &ParsedContent, pretty: bool) -> Result<String> {
    let out = if pretty {
        serde_json::to_string_pretty(record)
    } else {
        serde_json::to_string(record)
    };
    out.map_err(|e| eyre!("failed to serialize record: {e}"))
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
