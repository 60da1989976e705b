//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tuto_core::api::ApiClient;
use tuto_core::auth::TokenStore;
use tuto_core::config::{self, Config};
use tuto_core::session::Session;

mod commands;

#[derive(Parser)]
#[command(name = "tuto")]
#[command(version)]
#[command(about = "Terminal client for the tutoring backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend API base URL (overrides the config file)
    #[arg(long, env = config::API_URL_ENV, value_name = "URL", global = true)]
    api_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and persist the session tokens
    Login {
        /// Account username (prompted when omitted)
        #[arg(long)]
        username: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Clear the stored session
    Logout,

    /// Create a student account (does not log in)
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long = "first-name")]
        first_name: String,
        #[arg(long = "last-name")]
        last_name: String,
        #[arg(long)]
        password: String,
        /// School cycle: primaire or secondaire
        #[arg(long = "class-cycle")]
        class_cycle: String,
        /// Class level, e.g. 3e or Terminale
        #[arg(long = "class-level")]
        class_level: String,
        /// Exam series (required for 2nde/1ere/Terminale)
        #[arg(long)]
        series: Option<String>,
    },

    /// Show the current session and the screen it would mount
    Whoami,

    /// Change the account password
    ChangePassword {
        /// Current password (prompted when omitted)
        #[arg(long)]
        current: Option<String>,

        /// New password (prompted when omitted)
        #[arg(long)]
        new: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Display theme preference
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Print the path to the config file
    Path,
    /// Create a starter config file
    Init,
}

#[derive(clap::Subcommand)]
enum ThemeCommands {
    /// Switch to the dark theme
    Dark,
    /// Switch to the light theme
    Light,
    /// Show the active theme
    Status,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Builds the injected session: config -> token store -> API client.
fn build_session(api_url: Option<&str>) -> Result<Session> {
    let config = Config::load().context("load config")?;
    let base_url = config::resolve_base_url(api_url, config.api_base_url.as_deref(), None);

    let tokens = TokenStore::open_default();
    let api = ApiClient::new(base_url, tokens.clone());
    Ok(Session::new(api, tokens))
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { username, password } => {
            let mut session = build_session(cli.api_url.as_deref())?;
            commands::auth::login(&mut session, username, password).await
        }

        Commands::Logout => {
            let mut session = build_session(cli.api_url.as_deref())?;
            commands::auth::logout(&mut session)
        }

        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            password,
            class_cycle,
            class_level,
            series,
        } => {
            let mut session = build_session(cli.api_url.as_deref())?;
            commands::auth::register(
                &mut session,
                commands::auth::RegisterArgs {
                    username,
                    email,
                    first_name,
                    last_name,
                    password,
                    class_cycle,
                    class_level,
                    series,
                },
            )
            .await
        }

        Commands::Whoami => {
            let mut session = build_session(cli.api_url.as_deref())?;
            commands::auth::whoami(&mut session).await
        }

        Commands::ChangePassword { current, new } => {
            let mut session = build_session(cli.api_url.as_deref())?;
            commands::auth::change_password(&mut session, current, new).await
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },

        Commands::Theme { command } => match command {
            ThemeCommands::Dark => commands::theme::set(true),
            ThemeCommands::Light => commands::theme::set(false),
            ThemeCommands::Status => {
                commands::theme::status();
                Ok(())
            }
        },
    }
}
