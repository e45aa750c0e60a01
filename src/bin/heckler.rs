//! Posts canned disruptive phrases into a chatroom on a fixed cadence

use chatroom_agents::heckler::{load_phrases, Heckler};
use chatroom_agents::logging::{self, LogConfig};
use chatroom_agents::room::{RoomApiClient, DEFAULT_API_URL};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "chatroom-heckler", about = "Disrupt a chatroom with canned phrases")]
struct Args {
    /// One phrase per line; `#` starts a comment line
    #[arg(long, default_value = "assets/hate_speech.txt")]
    phrases: PathBuf,

    /// Seconds between posts
    #[arg(long, default_value_t = 10.0)]
    freq: f64,

    /// How many distinct bot names to rotate through
    #[arg(long, default_value_t = 4)]
    names: usize,

    /// Target room
    #[arg(long, default_value = "test")]
    room: String,

    /// Stop after this many posts
    #[arg(long)]
    count: Option<usize>,

    /// Chatroom message API
    #[arg(long, env = "CHATROOM_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = logging::init(&LogConfig::default())?;

    let phrases = load_phrases(&args.phrases)?;
    let interval = Duration::try_from_secs_f64(args.freq)?;
    let heckler = Heckler::new(args.room.clone(), phrases, args.names, &mut rand::thread_rng())?;
    tracing::info!(room = %args.room, interval_s = args.freq, names = args.names, "Starting heckler");

    let room = RoomApiClient::new(args.api_url)?;
    heckler.run(&room, interval, args.count).await;
    Ok(())
}
