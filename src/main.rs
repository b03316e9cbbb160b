//! Inkwell blog server.
//!
//! ```text
//!   request ──▶ tower-http layers (request id, trace, timeout)
//!           ──▶ static files (/public, /favicon.ico, /robots.txt)
//!           ──▶ dispatcher: SessionResolver ─▶ route group ─▶ Router ─▶ access check
//!           ──▶ page handler ─▶ response (JSON view or redirect)
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use inkwell::auth::accounts::parse_user_password;
use inkwell::auth::{Accounts, PasswordHasher, Role};
use inkwell::config::load_config;
use inkwell::lifecycle::{build_app, signals, startup, Shutdown};
use inkwell::observability::{logging, metrics};
use inkwell::{BlogConfig, HttpServer};

#[derive(Parser)]
#[command(name = "inkwell")]
#[command(about = "Blog server with cookie and ticket sessions", long_about = None)]
struct Cli {
    /// TOML config file; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Override listener.bind_address
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Add a guest user, given as LOGIN/PASSWORD
    AddUser { user_password: String },
    /// Add a password-less guest reachable through /?ticket=TICKET
    AddTicket { ticket: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("inkwell v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Serve { address: None }) {
        Commands::AddUser { user_password } => {
            let Some((login, password)) = parse_user_password(&user_password) else {
                return Err(format!("expected LOGIN/PASSWORD, got {:?}", user_password).into());
            };
            accounts(&config)?.create_user(login, password, Role::Guest).await?;
            Ok(())
        }
        Commands::AddTicket { ticket } => {
            if ticket.is_empty() || ticket.contains('/') {
                return Err(format!("invalid ticket {:?}", ticket).into());
            }
            accounts(&config)?.create_ticket(&ticket).await?;
            Ok(())
        }
        Commands::Serve { address } => {
            if let Some(address) = address {
                config.listener.bind_address = address;
            }
            serve(config).await
        }
    }
}

/// Accounts over the configured store file, for the user commands.
fn accounts(config: &BlogConfig) -> Result<Accounts, Box<dyn std::error::Error>> {
    if config.store.path.is_none() {
        return Err("user commands need a store path (store.path or BLOG_STORE)".into());
    }
    let store = startup::open_store(config)?;
    Ok(Accounts::new(Arc::new(store), PasswordHasher::new(config.auth.salt.clone())))
}

async fn serve(config: BlogConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        store = config.store.path.as_deref().unwrap_or("<memory>"),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let app = build_app(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stop = shutdown.listener();
    signals::spawn_signal_listener(shutdown);

    let server = HttpServer::new(config, app.state);
    server.run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
