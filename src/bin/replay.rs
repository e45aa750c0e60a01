//! Replays a recorded transcript into a chatroom

use chatroom_agents::logging::{self, LogConfig};
use chatroom_agents::replay::{load_transcript, replay};
use chatroom_agents::room::{RoomApiClient, DEFAULT_API_URL};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chatroom-replay", about = "Re-send a recorded transcript at its original pace")]
struct Args {
    /// Transcript (JSON array of messages with timestamps)
    transcript: PathBuf,

    /// Divide the original gaps between messages by this factor
    #[arg(long, default_value_t = 1.0)]
    speedup: f64,

    /// Chatroom message API
    #[arg(long, env = "CHATROOM_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = logging::init(&LogConfig::default())?;

    let entries = load_transcript(&args.transcript)?;
    tracing::info!(
        transcript = %args.transcript.display(),
        messages = entries.len(),
        speedup = args.speedup,
        "Replaying transcript"
    );

    let room = RoomApiClient::new(args.api_url)?;
    let sent = replay(&entries, args.speedup, &room).await?;
    tracing::info!(sent, "Replay finished");
    Ok(())
}
