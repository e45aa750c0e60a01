//! Runs the participants of one experiment against a chatroom server

use chatroom_agents::config::SimConfig;
use chatroom_agents::conversation::ConversationManager;
use chatroom_agents::experiment::{load_experiment, ParticipantSpec};
use chatroom_agents::llm::{build_service, LlmConfig};
use chatroom_agents::logging::{self, LogConfig};
use chatroom_agents::pacing::Pacer;
use chatroom_agents::prompt::{save_prompt, PromptAssets};
use chatroom_agents::room::{RoomApiClient, DEFAULT_API_URL};
use chatroom_agents::runtime::{
    LlmCompletion, Participant, ProductionMonitor, ProductionParticipant, SnapshotMonitor,
    DEFAULT_POLL_INTERVAL,
};
use clap::Parser;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "chatroom-agents", about = "Simulated participants for a shared chatroom")]
struct Args {
    /// Experiment description (JSON array of participants)
    experiment: PathBuf,

    /// Divide every simulated delay by this factor (10 when given without a value)
    #[arg(long, num_args = 0..=1, default_missing_value = "10.0")]
    speedup: Option<f64>,

    /// Reply with a placeholder instead of calling the completion provider
    #[arg(long)]
    offline: bool,

    /// Greet the room as soon as each participant is ready
    #[arg(long)]
    start: bool,

    /// Completion model
    #[arg(long)]
    model: Option<String>,

    /// Seconds to wait before starting
    #[arg(long, default_value_t = 0.0)]
    delay_seconds: f64,

    /// Upper bound, in simulated seconds, from leaving idle to replying
    #[arg(long)]
    max_time_to_response: Option<f64>,

    /// Chatroom message API
    #[arg(long, env = "CHATROOM_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Simulated seconds between room polls
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs_f64())]
    poll_interval: f64,

    /// Directory holding `bot-descriptions/`
    #[arg(long, default_value = "assets")]
    assets_dir: PathBuf,

    /// Where generated prompts are kept
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Directory for log files
    #[arg(long, default_value = "output/logs")]
    log_dir: PathBuf,

    /// Log to the console as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn sim_config(&self) -> Result<SimConfig, Box<dyn std::error::Error>> {
        let mut config = SimConfig::from_env()?;
        if let Some(speedup) = self.speedup {
            config.acceleration_factor = speedup;
        }
        if let Some(secs) = self.max_time_to_response {
            config.max_response = Some(Duration::try_from_secs_f64(secs)?);
        }
        config.offline |= self.offline;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _log_guard = logging::init(&LogConfig {
        dir: Some(args.log_dir.clone()),
        json: args.log_json,
    })?;

    let sim = Arc::new(args.sim_config()?);
    tracing::info!(
        speedup = sim.acceleration_factor,
        offline = sim.offline,
        max_response = ?sim.max_response,
        "Simulation configured"
    );
    let pacer = Pacer::new(Arc::clone(&sim));

    let mut llm_config = LlmConfig::from_env();
    if let Some(model) = &args.model {
        llm_config.model = Some(model.clone());
    }
    let service = build_service(&llm_config, sim.offline)?;
    let completion = Arc::new(LlmCompletion::new(Arc::clone(&service)));

    let specs = load_experiment(&args.experiment)?;
    tracing::info!(experiment = %args.experiment.display(), participants = specs.len(), "Loaded experiment");
    if specs.is_empty() {
        tracing::warn!("No enabled participants, nothing to do");
        return Ok(());
    }

    if args.delay_seconds > 0.0 {
        tracing::info!(seconds = args.delay_seconds, "Delaying start");
        tokio::time::sleep(Duration::try_from_secs_f64(args.delay_seconds)?).await;
    }

    let room = Arc::new(RoomApiClient::new(args.api_url.clone())?);
    let poll_interval = Duration::try_from_secs_f64(args.poll_interval)?;

    let mut monitors: BTreeMap<String, ProductionMonitor> = BTreeMap::new();
    let mut participants = Vec::new();
    for spec in &specs {
        let system_prompt = match build_prompt(spec, &args, service.as_ref(), llm_config.model()).await {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::error!(participant = %spec.username, error = %e, "Skipping participant");
                continue;
            }
        };

        let conversation = Arc::new(ConversationManager::new(spec.identity(), pacer.clone()));
        let participant: Arc<ProductionParticipant> = Arc::new(Participant::new(
            conversation,
            Arc::clone(&completion),
            Arc::clone(&room),
            spec.email.clone(),
            system_prompt,
        ));

        monitors
            .entry(spec.chatroom.clone())
            .or_insert_with(|| {
                SnapshotMonitor::new(Arc::clone(&room), spec.chatroom.clone(), pacer.clone())
                    .with_poll_interval(poll_interval)
            })
            .add_participant(Arc::clone(&participant));
        participants.push(participant);
    }

    if participants.is_empty() {
        return Err("No participant could be started".into());
    }

    for participant in &participants {
        let participant = Arc::clone(participant);
        let greet = args.start;
        tokio::spawn(async move {
            participant.warm_up().await;
            if greet {
                participant.greet().await;
            }
        });
    }

    let monitor_tasks: Vec<_> = monitors.into_values().map(|m| tokio::spawn(m.run())).collect();

    tokio::select! {
        _ = futures::future::join_all(monitor_tasks) => {
            tracing::error!("All room monitors stopped");
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}

/// Build, log and keep a copy of a participant's system prompt
async fn build_prompt(
    spec: &ParticipantSpec,
    args: &Args,
    llm: &dyn chatroom_agents::llm::LlmService,
    model: &str,
) -> Result<String, chatroom_agents::prompt::PromptError> {
    let assets = PromptAssets::new(&args.assets_dir, &spec.bot_description);
    let prompt = assets.build(spec.role, llm).await?;
    tracing::debug!(participant = %spec.username, prompt = %prompt, "System prompt");

    match save_prompt(&args.output_dir, spec.role, model, &prompt) {
        Ok(path) => tracing::info!(participant = %spec.username, path = %path.display(), "Saved system prompt"),
        Err(e) => tracing::warn!(participant = %spec.username, error = %e, "Failed to save system prompt"),
    }
    Ok(prompt)
}
