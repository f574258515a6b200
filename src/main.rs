//! Ping Monitor - main entry point

use clap::Parser;
use ping_monitor::{
    app::App,
    cli::Cli,
    config::{load_config, EnvManager},
    error::AppError,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();

    if cli.example_env {
        print!("{}", EnvManager::create_example_env_content());
        return;
    }

    let use_color = cli.use_colors();
    if let Err(e) = run(cli).await {
        eprintln!("{}", e.format_for_console(use_color));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> ping_monitor::Result<()> {
    let config = load_config(cli)?;
    App::new(config).run().await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format (see --example-env)");
            eprintln!("  - Elasticsearch servers must start with http:// or https://");
            eprintln!("  - Index prefixes must be lowercase without spaces or '/'");
        }
        AppError::Sink(_) => {
            eprintln!();
            eprintln!("Elasticsearch help:");
            eprintln!("  - Check that at least one server in --es-servers is reachable");
            eprintln!("  - Use --dry-run to log results without publishing");
        }
        _ => {}
    }
}
