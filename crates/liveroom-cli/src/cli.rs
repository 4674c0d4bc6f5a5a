use clap::Parser;

/// Liveroom: join a live classroom session from the terminal.
#[derive(Parser, Debug)]
#[command(name = "liveroom", version, about)]
pub struct Args {
    /// Room to join.
    #[arg(short, long)]
    pub room: String,

    /// Participant id, as known to the rest of the room.
    #[arg(short, long)]
    pub user: String,

    /// Display name. Defaults to the participant id.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Join as the room host.
    #[arg(long)]
    pub host: bool,

    /// Bearer token for the broker. Falls back to `LIVEROOM_TOKEN`.
    #[arg(long)]
    pub token: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Broker URL override.
    #[arg(long)]
    pub broker: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
