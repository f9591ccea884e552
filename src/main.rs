use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use dupdash::client::FileSource;
use dupdash::{cli, config, logging, web};

#[derive(Debug, Parser)]
#[command(name = "dupdash")]
#[command(about = "Duplicate APIs Detection dashboard")]
struct App {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a duplicates scan and list the groups, highest similarity first
    Scan {
        /// Read a saved scan result instead of calling the scan service
        #[arg(long)]
        input: Option<PathBuf>,
        /// Category tab to show (default: All Categories)
        #[arg(long)]
        category: Option<String>,
        /// Only show groups with an API matching this text
        #[arg(long)]
        search: Option<String>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Show at most N groups (default: dashboard.page_size, 0 for all)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show similarity statistics and the per-category breakdown
    Stats {
        /// Read a saved scan result instead of calling the scan service
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config files, scan service reachability and the scan history
    Health,
    /// Launch the web dashboard
    Web {
        /// Address to bind (default from config: 127.0.0.1:9747)
        #[arg(long)]
        bind: Option<String>,
        /// Serve a saved scan result instead of calling the scan service
        #[arg(long)]
        input: Option<PathBuf>,
        /// Do not open a browser window
        #[arg(long)]
        no_open: bool,
    },
    /// Show scan history and daily trend
    History {
        /// Only include the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration (show, init, set, reset)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective (merged) configuration
    Show,
    /// Write a default config file to ~/.dupdash/config.toml
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Set a config value using dotted keys, e.g. `api.base_url`
    Set { key: String, value: String },
    /// Reset the global config file to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    logging::init_logging(app.verbose, app.quiet);

    match app.command {
        Commands::Scan {
            input,
            category,
            search,
            format,
            limit,
        } => cli::run_scan(cli::ScanOptions {
            input,
            category,
            search,
            format: cli::OutputFormat::from_str_opt(Some(&format)),
            limit,
        }),
        Commands::Stats { input, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(input, fmt)
        }
        Commands::Health => cli::run_health(),
        Commands::Web {
            bind,
            input,
            no_open,
        } => {
            let cfg = config::load();
            let addr = bind.unwrap_or_else(|| cfg.dashboard.bind_addr.clone());
            let open = cfg.dashboard.open_browser && !no_open;
            let state = match input {
                Some(path) => web::AppState::with_source(cfg, Arc::new(FileSource::new(path))),
                None => web::AppState::from_config(cfg),
            };
            web::serve(&addr, state, open)
        }
        Commands::History { days, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(days, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
