use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use qa_core::{ConversionQuery, Query, Services, UnitConverter};
use qa_services::{CloudinaryClient, WolframClient};

mod config;
mod render;
mod setup;

use config::{mask, Config};

/// Log level for tracing output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Everything, including HTTP client internals
    Trace,
    /// Query dispatch, pod selection, each image rehost
    Debug,
    Info,
    /// Swallowed service failures only
    Warn,
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Parser)]
#[command(name = "qa")]
#[command(author, version, about = "Quick-answer: unit conversions and Wolfram|Alpha answers", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Query to answer (unit conversion first, then Wolfram|Alpha)
    pub query: Vec<String>,

    /// Show every pod, not just the primary result
    #[arg(short, long)]
    pub full: bool,

    /// Skip the unit conversion shortcut
    #[arg(long)]
    pub no_convert: bool,

    /// Print the answer as JSON
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Enable debug logging (shorthand for --log-level debug)
    #[arg(short, long)]
    pub debug: bool,

    /// Write logs to file (JSON-lines format)
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run only the unit conversion shortcut
    Convert {
        query: Vec<String>,
    },
    /// Show current configuration
    Config,
    /// Initialize ~/.config/qa/config.toml
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Setup) => return setup::run(),
        Some(Commands::Config) => return show_config(&Config::load()?),
        Some(Commands::Convert { query }) => {
            let text = query.join(" ");
            let query = ConversionQuery::new(text, &UnitConverter::new())?;
            let answer = query.solve();
            return print_answer(&answer, cli.json);
        }
        None => {}
    }

    let text = cli.query.join(" ");
    if text.trim().is_empty() {
        anyhow::bail!("No query given. Try: qa 5 km  or  qa --full \"integrate x^2\"");
    }

    let query = select_query(&text, cli.full, cli.no_convert);
    let answer = match &query {
        Query::Conversion(q) => q.solve(),
        Query::Computation(_) => {
            let config = Config::load()?;
            let services = build_services(&config)?;
            query.solve(&services).await
        }
    };

    print_answer(&answer, cli.json)?;

    if answer.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(cli: &Cli) -> Result<()> {
    // --debug overrides --log-level
    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        cli.log_level
    };
    let filter = EnvFilter::new(log_level.as_filter());

    if let Some(log_path) = &cli.log_file {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to create log file: {:?}", log_path))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::sync::Mutex::new(file)))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

/// Prefer the local conversion shortcut; anything it cannot handle goes to
/// the computation service.
fn select_query(text: &str, full: bool, no_convert: bool) -> Query {
    if !no_convert {
        match Query::conversion(text, &UnitConverter::new()) {
            Ok(query) => return query,
            Err(e) => debug!(error = %e, "Conversion shortcut does not apply"),
        }
    }
    Query::computation(text, full)
}

fn build_services(config: &Config) -> Result<Services> {
    let app_id = config.wolfram_app_id().ok_or_else(|| {
        anyhow::anyhow!(
            "No Wolfram|Alpha app id. Set WOLFRAM_APP_ID or add to {}:\n\n\
             [wolfram]\n\
             app_id = \"XXXXXX-XXXXXXXXXX\"\n",
            Config::config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.toml".to_string())
        )
    })?;
    let mut wolfram = WolframClient::new(app_id);
    if let Some(url) = &config.wolfram.base_url {
        wolfram = wolfram.with_base_url(url);
    }

    let cloud_name = config
        .cloudinary_cloud_name()
        .context("No Cloudinary cloud name. Set CLOUDINARY_CLOUD_NAME or [cloudinary] cloud_name")?;
    let upload_preset = config
        .cloudinary_upload_preset()
        .context("No Cloudinary upload preset. Set CLOUDINARY_UPLOAD_PRESET or [cloudinary] upload_preset")?;
    let mut cloudinary = CloudinaryClient::new(cloud_name, upload_preset);
    if let Some(url) = &config.cloudinary.base_url {
        cloudinary = cloudinary.with_base_url(url);
    }

    Ok(Services::new(Arc::new(wolfram), Arc::new(cloudinary))
        .with_assembler_config(config.assembler_config()))
}

fn print_answer(answer: &qa_core::Answer, json: bool) -> Result<()> {
    if json {
        println!("{}", render::render_json(answer)?);
    } else if answer.is_error() {
        eprintln!("{}", render::render_text(answer));
    } else {
        println!("{}", render::render_text(answer));
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let path = Config::config_path()?;
    println!("Configuration ({}):", path.display());

    let unset = || "(not set)".to_string();

    println!("\nWolfram|Alpha:");
    println!(
        "  App id: {}",
        config.wolfram_app_id().map(|s| mask(&s)).unwrap_or_else(unset)
    );
    if let Some(url) = &config.wolfram.base_url {
        println!("  Base URL: {}", url);
    }

    println!("\nCloudinary:");
    println!(
        "  Cloud name: {}",
        config.cloudinary_cloud_name().unwrap_or_else(unset)
    );
    println!(
        "  Upload preset: {}",
        config
            .cloudinary_upload_preset()
            .map(|s| mask(&s))
            .unwrap_or_else(unset)
    );
    if let Some(url) = &config.cloudinary.base_url {
        println!("  Base URL: {}", url);
    }

    let assembler = config.assembler_config();
    println!("\nAssembler:");
    println!("  Rehost timeout: {:?}", assembler.rehost_timeout);
    println!("  Accent color: {}", assembler.accent_color);
    println!("  Web base URL: {}", assembler.web_base_url);

    Ok(())
}
