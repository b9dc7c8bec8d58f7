//! usersvc-conformance binary: run the suite against a live service and exit
//! nonzero unless every case passes.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usersvc_conformance::{Suite, SuiteConfig, UsersClient};

#[derive(Debug, Parser)]
#[command(name = "usersvc-conformance", version, about = "Conformance checks for the users API")]
struct Cli {
    #[arg(long, default_value = "http://localhost:5000", env = "USERS_BASE_URL")]
    base_url: String,

    /// GET /users calls issued to exercise the request counter.
    #[arg(long, default_value_t = 20)]
    traffic: u32,

    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    #[arg(long, default_value_t = 5)]
    ready_timeout_secs: u64,

    /// Per-request client timeout.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Target was just started: the first user must get id 1.
    #[arg(long)]
    expect_fresh: bool,

    #[arg(long)]
    skip_delete: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = UsersClient::new(&cli.base_url, Duration::from_secs(cli.timeout_secs))?;
    let suite = Suite::new(
        client,
        SuiteConfig {
            traffic: cli.traffic,
            interval: Duration::from_millis(cli.interval_ms),
            ready_timeout: Duration::from_secs(cli.ready_timeout_secs),
            expect_fresh: cli.expect_fresh,
            skip_delete: cli.skip_delete,
        },
    );

    let report = suite.run().await;
    println!("{report}");
    Ok(ExitCode::from(report.exit_code()))
}
