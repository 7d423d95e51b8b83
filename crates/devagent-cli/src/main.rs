//! Dev agent CLI entry point.

use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use devagent_cli::cli::{Cli, Commands};
use devagent_cli::commands;
use devagent_cli::repl::Repl;
use devagent_cli::validate_workspace_root;
use devagent_core::AgentSettings;

fn main() {
    // Local overrides first; dotenvy never replaces variables already set
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_path(devagent_core::env_file());

    let cli = Cli::parse();

    // Logs go to stderr so replies on stdout stay clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = cli.settings();
    for root in &settings.workspace_roots {
        if let Err(e) = validate_workspace_root(root) {
            warn!("{}", e);
        }
    }

    let result = match cli.command {
        Some(Commands::Repl) | None => run_repl(settings),
        Some(cmd) => commands::execute(cmd, settings),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_repl(settings: AgentSettings) -> commands::Result<()> {
    let mut repl = Repl::new(settings)?;
    repl.run()?;
    Ok(())
}
