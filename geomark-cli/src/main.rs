//! Geomark CLI - map annotations from the terminal
//!
//! Runs the interactive shell by default; a few one-shot subcommands manage
//! credentials and configuration without entering it.

mod render;
mod shell;

use clap::{Parser, Subcommand};
use geomark_applications::{SessionManager, Storage};
use geomark_core::{
    init_logging, log_operation_start, log_operation_success, ErrorContext, GeomarkConfig,
    GeomarkError, GeomarkResult,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser)]
#[command(name = "geomark")]
#[command(about = "Place, filter and manage map markers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the storage directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (default)
    Shell,

    /// Register the local user, replacing any existing one
    Register {
        username: String,

        /// Password; read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Delete the stored credentials
    Forget,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> GeomarkResult<()> {
    let cli = Cli::parse();

    if let Some(Commands::Config {
        init: true,
        show,
        validate,
    }) = &cli.command
    {
        // must work before any config file exists
        return handle_config(cli.config.as_deref(), true, *show, *validate);
    }

    let mut config = GeomarkConfig::load_or_default(cli.config.as_deref())?;
    if let Some(data_dir) = &cli.data_dir {
        config.storage.data_dir = data_dir.display().to_string();
    }

    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config = logging_config.verbose();
    }
    init_logging(&logging_config).map_err(|e| GeomarkError::Config {
        message: format!("Failed to initialize logging: {}", e),
        source: Some(e),
        context: ErrorContext::new("cli")
            .with_operation("init_logging")
            .with_suggestion("Check the [logging] section of the config file"),
    })?;

    info!("Starting geomark v{}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            let storage = Storage::open(&config)?;
            shell::Shell::new(config, storage).run().await?;
        }
        Commands::Register { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt_password().await?,
            };
            handle_register(&config, &username, &password)?;
        }
        Commands::Forget => handle_forget(&config)?,
        Commands::Config {
            show,
            init,
            validate,
        } => handle_config(cli.config.as_deref(), init, show, validate)?,
    }

    Ok(())
}

fn handle_register(config: &GeomarkConfig, username: &str, password: &str) -> GeomarkResult<()> {
    log_operation_start!("register", username = %username);

    let storage = Storage::open(config)?;
    SessionManager::new(storage).register(username, password)?;

    log_operation_success!("register", username = %username);
    println!("✅ Registered {}", username);
    Ok(())
}

fn handle_forget(config: &GeomarkConfig) -> GeomarkResult<()> {
    let storage = Storage::open(config)?;
    let mut sessions = SessionManager::new(storage);

    match sessions.registered_username()? {
        Some(username) => {
            sessions.forget_credentials()?;
            println!("🗑  Removed credentials of {}", username);
        }
        None => println!("No registered user"),
    }
    Ok(())
}

async fn prompt_password() -> GeomarkResult<String> {
    print!("Password: ");
    std::io::stdout().flush()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let password = lines.next_line().await?.unwrap_or_default();
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

fn handle_config(
    path: Option<&std::path::Path>,
    init: bool,
    show: bool,
    validate: bool,
) -> GeomarkResult<()> {
    if init {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };
        GeomarkConfig::default().save_to_file(&config_path)?;
        println!("✅ Configuration initialized at: {:?}", config_path);
    }

    if show {
        let config = GeomarkConfig::load_or_default(path)?;
        let rendered = toml::to_string_pretty(&config).map_err(|e| GeomarkError::Config {
            message: format!("Failed to render configuration: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("cli").with_operation("show_config"),
        })?;
        println!("📋 Current configuration:");
        println!("{}", rendered);
    }

    if validate {
        match GeomarkConfig::load_or_default(path).and_then(|config| config.validate()) {
            Ok(()) => println!("✅ Configuration is valid"),
            Err(e) => {
                println!("❌ Configuration validation failed: {}", e);
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Where `config --init` writes when no path is given
fn default_config_path() -> GeomarkResult<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|dir| dir.join("geomark").join("config.toml"))
        .ok_or_else(|| GeomarkError::Config {
            message: "Cannot determine a configuration directory".to_string(),
            source: None,
            context: ErrorContext::new("cli")
                .with_operation("config_init")
                .with_suggestion("Pass an explicit path with --config"),
        })
}
