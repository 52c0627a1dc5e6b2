use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "invtrack", about = "Replay a gateway session through the invite tracker")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/invtrack.toml")]
    pub config: String,

    /// Path to the recorded session fixture (overrides config)
    #[arg(long)]
    pub fixture: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,
}
