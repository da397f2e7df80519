//! KibraConnect operator CLI.
//!
//! # Usage
//!
//! ```bash
//! # Log in and print the access token
//! kibra login --email amina@kibra.example --password '...'
//!
//! # Ask the backend about a payment
//! KIBRA_TOKEN=... kibra verify T1234567890
//!
//! # Replay a recorded checkout
//! kibra replay events.jsonl --authorization-url https://checkout.paystack.com/abc
//!
//! # Configure logging level
//! RUST_LOG=debug kibra orders
//! ```
//!
//! # Environment Variables
//!
//! - `KIBRA_CONFIG` - Path to TOML configuration file (default: `kibra.toml`)
//! - `KIBRA_API_URL` - Override the API base URL
//! - `KIBRA_TOKEN` - Access token for authenticated commands
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! A `.env` file in the working directory is loaded first.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use kibra::checkout::{Checkout, Outcome};
use kibra::handshake::Handshake;
use kibra::verify::PaymentVerifier;
use kibra::{CheckoutSession, VerificationResult};
use kibra_http::{ApiClient, HttpPaymentVerifier, Session};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use kibra_cli::config::{CliConfig, DEFAULT_CONFIG_PATH};
use kibra_cli::replay::{LoggingHooks, parse_events, replay};

#[derive(Debug, Parser)]
#[command(name = "kibra", version, about = "KibraConnect operator CLI")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, env = "KIBRA_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and print the access token.
    Login {
        /// Account email.
        #[arg(long, env = "KIBRA_EMAIL")]
        email: String,
        /// Account password.
        #[arg(long, env = "KIBRA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Ask the backend for the outcome of a payment.
    Verify {
        /// Transaction reference.
        reference: String,
    },
    /// List the caller's orders as JSON.
    Orders,
    /// Print the home feed as JSON.
    Feed {
        /// Include ads.
        #[arg(long)]
        ads: bool,
    },
    /// Replay recorded browser events through a checkout handshake.
    Replay {
        /// JSON array or JSON-lines file of browser events.
        events: PathBuf,
        /// Provider checkout URL the recording started from.
        #[arg(long)]
        authorization_url: String,
        /// Reference from the checkout session, used when callbacks omit it.
        #[arg(long)]
        reference: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        tracing::error!("kibra failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::load_from(&cli.config)?;
    tracing::debug!(
        path = %cli.config.display(),
        api_url = %config.api_url,
        authenticated = config.token.is_some(),
        "Loaded configuration"
    );

    let session = Arc::new(config.token.clone().map_or_else(Session::new, Session::with_token));
    let client = ApiClient::new(config.api_config(), session)?;

    match cli.command {
        Command::Login { email, password } => {
            let tokens = client.login(&email, &password).await?;
            tracing::info!("Logged in");
            writeln!(std::io::stdout().lock(), "{}", tokens.access)?;
        }
        Command::Verify { reference } => {
            require_token(&client)?;
            let verifier = HttpPaymentVerifier::new(client);
            match verifier.verify(&reference).await? {
                VerificationResult::Success { order_id } => {
                    writeln!(std::io::stdout().lock(), "confirmed: order {order_id}")?;
                }
                VerificationResult::Failure { error_message } => {
                    writeln!(std::io::stdout().lock(), "failed: {error_message}")?;
                }
            }
        }
        Command::Orders => {
            require_token(&client)?;
            print_json(&client.orders().await?)?;
        }
        Command::Feed { ads } => {
            let posts = client.posts().await?;
            let ads = if ads { Some(client.ads().await?) } else { None };
            print_json(&serde_json::json!({ "posts": posts, "ads": ads }))?;
        }
        Command::Replay {
            events,
            authorization_url,
            reference,
        } => {
            require_token(&client)?;
            let events = parse_events(&std::fs::read_to_string(&events)?)?;
            let session = CheckoutSession {
                authorization_url: Some(authorization_url),
                reference,
                ..CheckoutSession::default()
            };
            let handshake = Handshake::with_patterns(session, config.patterns.clone())?;
            let mut checkout =
                Checkout::from_handshake(handshake, HttpPaymentVerifier::new(client))
                    .with_timeout(config.verify_timeout())
                    .with_hook(LoggingHooks);

            let report = replay(&mut checkout, &events).await?;
            let line = match &report.outcome {
                Outcome::Confirmed { order_id } => format!("confirmed: order {order_id}"),
                Outcome::Rejected { title, message } => format!("{title}: {message}"),
                Outcome::Pending | Outcome::Ignored => "no outcome".to_owned(),
            };
            writeln!(
                std::io::stdout().lock(),
                "{line} ({} events, {} ignored{})",
                report.events,
                report.ignored,
                if report.abandoned { ", abandoned" } else { "" }
            )?;
        }
    }

    Ok(())
}

fn require_token(client: &ApiClient) -> Result<(), Box<dyn std::error::Error>> {
    if client.session().is_authenticated() {
        Ok(())
    } else {
        Err("this command needs an access token; set KIBRA_TOKEN or run `kibra login`".into())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
