//! cf-support - Kubernetes support data collection for Codefresh runtimes

use anyhow::Result;
use cf_support::catalog::RuntimeType;
use cf_support::cli::{Cli, Command};
use cf_support::commands::{self, CollectOptions, Prompter, StdinPrompter};
use cf_support::config;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    setup_tracing(cli.verbose);

    // Handle color settings
    if cli.no_color {
        owo_colors::set_override(false);
    }

    if let Some(Command::Completions(args)) = &cli.command {
        generate_completions(args.shell);
        return Ok(());
    }

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> cf_support::error::Result<()> {
    let app_config = config::load_config()?;
    let prompter = StdinPrompter;

    let runtime = match cli.command.as_ref().and_then(Command::runtime) {
        Some(runtime) => runtime,
        None => {
            let options: Vec<String> = RuntimeType::ALL.iter().map(|r| r.display_name().to_string()).collect();
            let index = prompter.select("Which Type Of Runtime Are We Collecting Data For?", &options)?;
            RuntimeType::ALL[index]
        }
    };

    let runtime_name = match &cli.command {
        Some(Command::Pipelines(args)) => args.runtime.clone(),
        _ => None,
    };

    let options = CollectOptions {
        runtime,
        namespace: cli.command.as_ref().and_then(Command::namespace).map(String::from),
        runtime_name,
        context: cli.context.clone(),
        output_dir: cli.output_dir.clone().unwrap_or(app_config.output_dir),
        concurrency: cli.concurrency.unwrap_or(app_config.concurrency),
        backend: cli.backend.unwrap_or(app_config.backend),
        assume_yes: cli.yes,
    };

    commands::collect(&options, &prompter).await?;
    Ok(())
}

fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "cf-support", &mut std::io::stdout());
}
