//! tablesync CLI - the `tablesync` binary.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use tablesync_cli::{Cli, Commands};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    tablesync_core::init_logging(cli.log_format.into(), "warn");
    tablesync_reconcile::metrics::register_metrics();
    let config = cli.config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let succeeded = runtime.block_on(async {
        match cli.command {
            Commands::Reconcile(args) => {
                tablesync_cli::commands::reconcile::execute(args, &config).await
            }
            Commands::Bulk(args) => tablesync_cli::commands::bulk::execute(args, &config).await,
        }
    })?;

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
