use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use payflow::auth::AuthClient;
use payflow::config::AppConfig;
use payflow::context::StepContext;
use payflow::flows;
use payflow::http::ApiClient;
use payflow::workflow::interpret::CallerFacingResult;
use payflow::workflow::types::WorkflowHandle;

#[derive(Parser)]
#[command(
    name = "payflow",
    about = "Drive asynchronous contract workflows on the payments platform"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Start the workflow and exit without polling for its outcome
    #[arg(long)]
    no_wait: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue an annuity contract
    IssueAnnuity {
        /// JSON file with the annuity terms
        #[arg(long)]
        payload: PathBuf,
    },
    /// Settle one period of an existing annuity
    SettleAnnuity {
        #[arg(long)]
        payload: PathBuf,
    },
    /// Issue a composed contract from an obligation list
    IssueComposed {
        #[arg(long)]
        payload: PathBuf,
    },
    /// Accept and complete a swap, then await its settlement
    SwapComposed {
        #[arg(long)]
        payload: PathBuf,
    },
    /// Fund an entity's platform wallet
    Onramp {
        #[arg(long)]
        payload: PathBuf,
    },
}

fn load_payload<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn report_started(handle: &WorkflowHandle) {
    println!("started workflow {}", handle.workflow_id);
}

fn report(result: &CallerFacingResult) {
    println!("{result}");
    if !result.is_success() {
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;

    tracing::info!(base_url = %config.platform.base_url, "Authenticating");
    let auth = AuthClient::new(&config.platform)?;
    let token = auth.login(&config.auth).await?;

    let api = ApiClient::new(&config.platform.base_url, &token, config.request_timeout())?;
    let workflows = &config.workflows;
    let mut ctx = StepContext::new();

    match &cli.command {
        Command::IssueAnnuity { payload } => {
            let request = load_payload(payload)?;
            if cli.no_wait {
                report_started(&flows::annuity::start_issue(&api, workflows, &request).await?);
            } else {
                report(&flows::annuity::issue(&api, workflows, &request, &mut ctx).await?);
            }
        }
        Command::SettleAnnuity { payload } => {
            let request = load_payload(payload)?;
            if cli.no_wait {
                report_started(&flows::annuity::start_settle(&api, workflows, &request).await?);
            } else {
                report(&flows::annuity::settle(&api, workflows, &request, &mut ctx).await?);
            }
        }
        Command::IssueComposed { payload } => {
            let request = load_payload(payload)?;
            if cli.no_wait {
                report_started(&flows::composed::start_issue(&api, workflows, &request).await?);
            } else {
                report(&flows::composed::issue(&api, workflows, &request, &mut ctx).await?);
            }
        }
        Command::SwapComposed { payload } => {
            let request = load_payload(payload)?;
            if cli.no_wait {
                report_started(&flows::composed::start_swap(&api, workflows, &request).await?);
            } else {
                report(&flows::composed::swap(&api, workflows, &request, &mut ctx).await?);
            }
        }
        Command::Onramp { payload } => {
            let request = load_payload(payload)?;
            if cli.no_wait {
                report_started(&flows::onramp::start(&api, workflows, &request).await?);
            } else {
                report(&flows::onramp::run(&api, workflows, &request, &mut ctx).await?);
            }
        }
    }

    Ok(())
}
