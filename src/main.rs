use chatwise_to_nowledge::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, NowledgeClient};
use chatwise_to_nowledge::pipeline;
use chatwise_to_nowledge::prompt::LinePrompter;
use chatwise_to_nowledge::{ImportConfig, ImportMode};
use clap::Parser;
use eyre::{Context, Result, eyre};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Import ChatWise chat exports into Nowledge Mem.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// ChatWise export: the downloaded zip or the extracted folder.
    #[arg(value_name = "PATH")]
    path: PathBuf,

    /// Import every new conversation without asking.
    #[arg(long, conflicts_with = "manual")]
    auto: bool,

    /// Confirm each new conversation before importing it.
    #[arg(long)]
    manual: bool,

    /// Nowledge Mem API address.
    /// Defaults to http://127.0.0.1:14242 if not set in config.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Path to a specific configuration file.
    /// Defaults to $XDG_CONFIG_HOME/chatwise-to-nowledge/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log HTTP and parsing details.
    #[arg(short, long)]
    verbose: bool,

    /// Hide the record list and progress bar.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    mode: Option<ImportMode>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(eyre!("Config file not found: {}", p.display()));
        }
        Some(p.to_path_buf())
    } else {
        dirs::config_dir()
            .map(|d| d.join("chatwise-to-nowledge/config.toml"))
            .filter(|p| p.exists())
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "chatwise_to_nowledge=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 1. Load config file (CLI path > default path)
    let file_cfg = load_file_config(cli.config.as_deref())?;

    // 2. Resolve mode (CLI > Config > ask)
    let mode = if cli.auto {
        Some(ImportMode::Auto)
    } else if cli.manual {
        Some(ImportMode::Manual)
    } else {
        file_cfg.mode
    };

    // 3. Build the Import Config
    let config = ImportConfig {
        input: cli.path,
        base_url: cli
            .base_url
            .or(file_cfg.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        timeout: cli
            .timeout
            .or(file_cfg.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT),
        mode,
        quiet: cli.quiet,
    };

    // 4. Run the Business Logic
    let client = NowledgeClient::new(&config.base_url, config.timeout)?;
    let mut prompter = LinePrompter::stdio();
    let mut stdout = std::io::stdout();
    pipeline::execute(&config, &client, &mut prompter, &mut stdout)?;

    Ok(())
}
