use clap::Parser;
use owo_colors::{OwoColorize, Stream, Style};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    // Initialize logging
    let default_filter = if cli.verbose > 0 {
        "multisplunk_cli=debug,multisplunk_core=debug"
    } else {
        "multisplunk_cli=info,multisplunk_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match commands::run::run(&cli).await {
        Ok(false) => {}
        Ok(true) => process::exit(1),
        Err(e) => {
            eprintln!(
                "{}: {}",
                "Error".if_supports_color(Stream::Stderr, |t| t.style(Style::new().red().bold())),
                e
            );
            process::exit(1);
        }
    }
}
