//! node-deployer
//!
//! Usage:
//! - Default config: `node-deployer` (reads `deploy.toml`)
//! - Custom config: `node-deployer --config /etc/node-deployer/app.toml`
//! - Custom log file: `node-deployer --log-file /var/log/node-deployer.log`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use node_deployer::config::env::constants::DEFAULT_CONFIG_FILE;
use node_deployer::RuntimeConfig;

#[derive(Parser)]
#[command(name = "node-deployer")]
#[command(about = "Provision this host and deploy a Node.js application under PM2")]
#[command(version)]
struct Cli {
    /// Deployment config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log file (overrides host.log_file)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = RuntimeConfig {
        config_path: cli.config,
        log_file: cli.log_file,
    };

    ExitCode::from(node_deployer::run_with_config(runtime).await)
}
