mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{edit, html, linear, wikitext, EditArgs, HtmlArgs, LinearArgs, WikitextArgs};
use config::Config;
use tracing_subscriber::EnvFilter;

/// Wikiedit CLI - convert and edit rich documents in linear form
#[derive(Parser, Debug)]
#[command(name = "wikiedit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert HTML to linear data JSON
    Linear(LinearArgs),

    /// Convert linear data JSON to HTML
    Html(HtmlArgs),

    /// Convert HTML to wikitext through the linear model
    Wikitext(WikitextArgs),

    /// Apply a script of edits to linear data
    Edit(EditArgs),
}

fn init_tracing(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = Config::load(&cwd)?;
    init_tracing(&config, cli.verbose);

    match cli.command {
        Command::Linear(args) => linear(args, &config, &cwd),
        Command::Html(args) => html(args, &config, &cwd),
        Command::Wikitext(args) => wikitext(args, &config, &cwd),
        Command::Edit(args) => edit(args, &config, &cwd),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
