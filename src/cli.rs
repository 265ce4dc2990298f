use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::Duration;

mod analyze;
mod check;
mod config;
mod resolve;

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Show recent prices of a ticker and optionally an AI analyst report")]
    #[clap(visible_aliases = &["a"])]
    Analyze(Box<analyze::AnalyzeCommand>),

    #[command(about = "Check the listing, quote and generation services")]
    Check(Box<check::CheckCommand>),

    #[command(subcommand, about = "Show or set configurations")]
    Config(config::ConfigCommand),

    #[command(about = "Resolve a ticker name or code")]
    #[clap(visible_aliases = &["r"])]
    Resolve(Box<resolve::ResolveCommand>),
}

fn new_spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("[{elapsed}] {msg} {spinner:.cyan}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    spinner
}
