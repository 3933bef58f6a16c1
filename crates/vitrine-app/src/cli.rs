use clap::Parser;

/// Vitrine: a kiosk display shell for web dashboards.
#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about)]
pub struct Args {
    /// Layout to load at startup (overrides the configured default).
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
