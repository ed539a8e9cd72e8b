use anyhow::Result;
use clap::Parser;

use lifecycle_hooks::cli::commands::inspect::InspectCommand;
use lifecycle_hooks::cli::commands::run::RunCommand;
use lifecycle_hooks::cli::commands::CliCommand;
use lifecycle_hooks::cli::{Cli, Commands};
use lifecycle_hooks::{init_config, init_telemetry};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = init_config()?.clone();
    if let Err(e) = init_telemetry(&config.observability) {
        eprintln!("Warning: failed to initialize telemetry: {e}");
    }

    match cli.command {
        Commands::Run {
            code,
            params,
            fail,
            output,
            trace_hooks,
        } => tokio::runtime::Runtime::new()?.block_on(async {
            RunCommand::new(code)
                .with_params(params)
                .with_failure(fail)
                .with_output(output)
                .with_trace_hooks(trace_hooks)
                .with_config(config)
                .execute()
                .await
        }),
        Commands::Inspect { file } => tokio::runtime::Runtime::new()?.block_on(async {
            InspectCommand::new(file).execute().await
        }),
    }
}
