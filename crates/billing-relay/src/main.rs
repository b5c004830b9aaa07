//! Billing Relay CLI
//!
//! Runs the relay under the AWS Lambda runtime, or drives it by hand.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use billing_relay::alerting::Severity;
use billing_relay::config::{LogFormat, LoggingConfig};
use billing_relay::secrets::{AwsSecretStore, SecretStore, StaticSecretStore};
use billing_relay::{Config, Relay};
use clap::{Parser, Subcommand};
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Secret identifier used by `invoke --secrets-file` when none is configured
const LOCAL_SECRET_ID: &str = "local";

/// Billing Relay - AWS billing alarms to Slack and phone
#[derive(Parser)]
#[command(name = "billing-relay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "BILLING_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Defaults to `lambda`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve events from the Lambda runtime API
    Lambda,

    /// Relay a single SNS event and print the response
    Invoke {
        /// Event JSON file, or `-` for stdin
        #[arg(short, long)]
        event: PathBuf,

        /// Read the credential JSON from this file instead of Secrets Manager
        #[arg(long)]
        secrets_file: Option<PathBuf>,
    },

    /// Show how an alarm name is classified
    Classify {
        /// Alarm name to classify
        alarm_name: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Pick up a local .env before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging, cli.verbose);

    // Execute command
    let result = match cli.command.unwrap_or(Commands::Lambda) {
        Commands::Lambda => run_lambda(config).await,
        Commands::Invoke {
            event,
            secrets_file,
        } => run_invoke(config, &event, secrets_file.as_deref()).await,
        Commands::Classify { alarm_name } => {
            run_classify(&alarm_name);
            Ok(())
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for command output
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn run_lambda(config: Config) -> anyhow::Result<()> {
    let store = AwsSecretStore::from_config(&config.secrets).await;
    let relay = Relay::from_config(&config, Arc::new(store))?;

    info!(secret_id = ?config.secrets.secret_id, "Starting Lambda runtime");

    let relay = &relay;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        relay
            .respond(&event.payload)
            .await
            .map_err(lambda_runtime::Error::from)
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
}

async fn run_invoke(
    mut config: Config,
    event_path: &Path,
    secrets_file: Option<&Path>,
) -> anyhow::Result<()> {
    let event = read_event(event_path)?;

    let store: Arc<dyn SecretStore> = match secrets_file {
        Some(path) => {
            let secret = std::fs::read_to_string(path)
                .with_context(|| format!("reading secrets file {}", path.display()))?;
            let secret_id = config
                .secrets
                .secret_id
                .get_or_insert_with(|| LOCAL_SECRET_ID.to_string())
                .clone();
            Arc::new(StaticSecretStore::new().with_secret(secret_id, secret))
        }
        None => Arc::new(AwsSecretStore::from_config(&config.secrets).await),
    };

    let relay = Relay::from_config(&config, store)?;
    let response = relay.respond(&event).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn read_event(path: &Path) -> anyhow::Result<Value> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        raw
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading event {}", path.display()))?
    };

    serde_json::from_str(&raw).context("event is not valid JSON")
}

fn run_classify(alarm_name: &str) {
    println!("{}", Severity::from_alarm_name(alarm_name).as_str());
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "billing-relay", &mut io::stdout());
}
