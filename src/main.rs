//! # Finvio
//!
//! Command-line front end for the Finvio session layer. Logs in against the
//! invoicing API, keeps the session in a cookie file between runs and issues
//! authenticated requests through the refreshing client.
//!
//! ## Environment Setup
//! ```bash
//! export API_BASE_URL=https://api.finvio.example
//! export SECRET_KEY=change-me
//! ```
//!
//! ## Usage
//! ```bash
//! finvio login --email ada@example.com --password 'Secr3t!pass'
//! finvio whoami
//! finvio get /invoices
//! finvio logout
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finvio_client::api::RegisterOutcome;
use finvio_client::auth::{LoginRequest, RegisterForm};
use finvio_client::{AppState, Config};

#[derive(Parser, Debug)]
#[command(name = "finvio", about = "Finvio invoicing client")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "FINVIO_PASSWORD")]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Show the logged-in user
    Whoami,
    /// Clear the stored session
    Logout,
    /// Authenticated GET against the API, printing the JSON body
    Get { path: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    tracing::debug!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration from environment")?;
    let app = AppState::from_config(&config)?;

    match args.command {
        Command::Login { email, password } => {
            let message = app.auth_api.login(LoginRequest { email, password }).await?;
            println!("{message}");
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let form = RegisterForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
            };
            match app.auth_api.register(form).await? {
                RegisterOutcome::SignedIn { message } | RegisterOutcome::Created { message } => {
                    println!("{message}")
                }
            }
        }
        Command::Whoami => {
            app.auth.activate().await?;
            match app.auth.user() {
                Some(user) => println!("{} <{}> (id {})", user.name, user.email, user.id),
                None => println!("Not logged in"),
            }
        }
        Command::Logout => {
            app.auth_api.logout();
            println!("Logged out");
        }
        Command::Get { path } => {
            let response = app.client.get::<serde_json::Value>(&path).await?;
            println!("{}", serde_json::to_string_pretty(&response.data)?);
        }
    }

    Ok(())
}
