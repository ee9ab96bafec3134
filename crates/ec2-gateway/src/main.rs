//! ec2-gateway: HTTP gateway for EC2 instances, key pairs and security groups
//!
//! Loads AWS credentials once, checks them against STS and serves the HTTP
//! API until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use ec2_gateway::aws::AwsContext;
use ec2_gateway::aws::provider::ProviderFactory;
use ec2_gateway::config::{
    AwsSettings, GatewayConfig, ServerConfig, StaticCredentials, parse_bind_addr,
};
use ec2_gateway::http::{AppState, router};
use ec2_gateway::planner::Deadlines;
use ec2_gateway::wait::PollConfig;
use ec2_gateway_common::defaults::{
    DEFAULT_BIND_ADDR, DEFAULT_POLL_BASE_SECS, DEFAULT_POLL_MAX_SECS, DEFAULT_POLL_READ_RETRIES,
    DEFAULT_PROVISION_DEADLINE_SECS, DEFAULT_REGION, DEFAULT_TRANSITION_DEADLINE_SECS,
};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ec2-gateway")]
#[command(about = "Lifecycle gateway for EC2 resources")]
#[command(version)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "EC2_GATEWAY_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Region used when a request does not name one
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile name (overrides default credential resolution)
    #[arg(long, env = "AWS_PROFILE")]
    aws_profile: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,

    /// First delay between status polls, in seconds
    #[arg(long, default_value_t = DEFAULT_POLL_BASE_SECS)]
    poll_base_secs: u64,

    /// Cap on the delay between status polls, in seconds
    #[arg(long, default_value_t = DEFAULT_POLL_MAX_SECS)]
    poll_max_secs: u64,

    /// Consecutive failed status reads tolerated while waiting
    #[arg(long, default_value_t = DEFAULT_POLL_READ_RETRIES)]
    poll_read_retries: u32,

    /// Wait budget for start/stop, in seconds
    #[arg(long, default_value_t = DEFAULT_TRANSITION_DEADLINE_SECS)]
    transition_deadline_secs: u64,

    /// Wait budget for launch/terminate, in seconds
    #[arg(long, default_value_t = DEFAULT_PROVISION_DEADLINE_SECS)]
    provision_deadline_secs: u64,
}

impl TryFrom<Args> for GatewayConfig {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let static_credentials = match (args.access_key_id, args.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: args.session_token,
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
            ),
        };

        Ok(GatewayConfig {
            aws: AwsSettings {
                region: args.region,
                profile: args.aws_profile,
                static_credentials,
            },
            poll: PollConfig {
                base_interval: Duration::from_secs(args.poll_base_secs),
                max_interval: Duration::from_secs(args.poll_max_secs),
                max_read_retries: args.poll_read_retries,
            },
            deadlines: Deadlines {
                transition: Duration::from_secs(args.transition_deadline_secs),
                provision: Duration::from_secs(args.provision_deadline_secs),
            },
            server: ServerConfig {
                bind: parse_bind_addr(&args.bind)?,
            },
        })
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = GatewayConfig::try_from(args)?;
    config.validate().context("Invalid configuration")?;

    if let Some(profile) = &config.aws.profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let aws = AwsContext::new(&config.aws).await;

    // Credentials are checked once; the gateway keeps serving even if this
    // fails so `/identity` can report the problem per request
    let provider = aws.for_region(config.region());
    match ec2_gateway::Gateway::new(provider, config.gateway_settings())
        .caller_identity()
        .await
    {
        Ok(identity) => info!(account = %identity.account, arn = %identity.arn, "AWS credentials valid"),
        Err(e) => warn!(error = %e, "Could not validate AWS credentials"),
    }

    let state = AppState::new(aws, config.gateway_settings(), config.region());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!(addr = %config.server.bind, region = %config.region(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received, shutting down");
}
