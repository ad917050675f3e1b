//! CLI for Video Express - prompt-to-video generation over Veo.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing_subscriber::EnvFilter;
use video_express::credential::DEFAULT_API_KEY_ENV;
use video_express::{
    AspectRatio, CredentialGate, CredentialProvider, EnvCredentialProvider, GeneratedVideo,
    GenerationState, Orchestrator, Resolution, Settings, StaticCredentialProvider, VeoModel,
    VideoConfig,
};

#[derive(Parser)]
#[command(name = "video-express")]
#[command(about = "Generate short videos from text prompts with Google Veo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one video and save it
    Generate(GenerateArgs),

    /// Interactive session with history
    Session(SessionArgs),

    /// Show resolved settings
    Config,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the video
    prompt: String,

    /// Output file path (defaults to video-express-<id>.mp4)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    options: RenderArgs,
}

#[derive(Args)]
struct SessionArgs {
    #[command(flatten)]
    options: RenderArgs,
}

#[derive(Args)]
struct RenderArgs {
    /// Aspect ratio
    #[arg(long, value_enum, default_value = "16:9")]
    aspect_ratio: AspectRatioArg,

    /// Output resolution
    #[arg(long, value_enum, default_value = "720p")]
    resolution: ResolutionArg,

    /// Veo model variant (overrides VEO_MODEL)
    #[arg(short, long, value_enum)]
    model: Option<ModelArg>,

    /// API key (overrides GOOGLE_API_KEY)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResolutionArg {
    #[value(name = "720p")]
    Hd,
    #[value(name = "1080p")]
    FullHd,
}

impl From<ResolutionArg> for Resolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Hd => Resolution::Hd,
            ResolutionArg::FullHd => Resolution::FullHd,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Fast,
    Quality,
}

impl From<ModelArg> for VeoModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Fast => VeoModel::Veo31Fast,
            ModelArg::Quality => VeoModel::Veo31,
        }
    }
}

impl RenderArgs {
    fn config(&self) -> VideoConfig {
        VideoConfig::new(self.aspect_ratio.into(), self.resolution.into())
    }

    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = Settings::from_env()?;
        if let Some(model) = self.model {
            settings.model = Some(VeoModel::from(model).as_str().to_string());
        }
        Ok(settings)
    }
}

const GATE_MESSAGE: &str = "No API key selected. Run `key <API_KEY>` to select one.";

/// How often the session prints a progress line while generating.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

const PROGRESS_TIPS: &[&str] = &[
    "Composing the scene",
    "Rendering frames",
    "Lighting the shots",
    "Encoding the video",
    "Nearly done, this usually takes 30-60 seconds",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            generate(args, cli.json).await?;
        }
        Commands::Session(args) => {
            run_session(args).await?;
        }
        Commands::Config => {
            show_config(cli.json)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("video_express=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn orchestrator(
    settings: &Settings,
    credentials: Arc<dyn CredentialProvider>,
) -> anyhow::Result<Orchestrator> {
    let client = settings.client(credentials.clone())?;
    Ok(Orchestrator::new(client, CredentialGate::new(credentials)))
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let settings = args.options.settings()?;
    let credentials: Arc<dyn CredentialProvider> = match &args.options.api_key {
        Some(key) => Arc::new(StaticCredentialProvider::new(key.clone())),
        None => Arc::new(EnvCredentialProvider::new()),
    };

    let mut session = orchestrator(&settings, credentials)?;
    if !session.start().await {
        anyhow::bail!("No API key: set {} or pass --api-key", DEFAULT_API_KEY_ENV);
    }

    let state = session.submit(&args.prompt, args.options.config()).await?;
    let video = match state {
        GenerationState::Completed { video } => video,
        GenerationState::Idle { error: Some(error) } | GenerationState::Failed { error } => {
            anyhow::bail!(error)
        }
        other => anyhow::bail!("generation ended in unexpected state: {}", other),
    };

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(video.download_file_name()));
    video.asset.save(&output)?;

    if json_output {
        let result = serde_json::json!({
            "type": "video",
            "success": true,
            "id": video.id,
            "output": output.display().to_string(),
            "size_bytes": video.asset.size(),
            "aspect_ratio": video.config.aspect_ratio.as_str(),
            "resolution": video.config.resolution.as_str(),
            "model": video.asset.metadata.model,
            "duration_ms": video.asset.metadata.duration_ms,
            "created_at": video.created_at.to_rfc3339(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated video: {} ({} bytes) via {}",
            output.display(),
            video.asset.size(),
            session.client().backend_name()
        );
        if let Some(duration) = video.asset.metadata.duration_ms {
            println!("Generation time: {}ms", duration);
        }
    }

    Ok(())
}

async fn run_session(args: SessionArgs) -> anyhow::Result<()> {
    let settings = args.options.settings()?;
    let mut config = args.options.config();

    // A mutable slot so `key <API_KEY>` can swap the credential mid-session
    let key = StaticCredentialProvider::default();
    if let Some(k) = args
        .options
        .api_key
        .clone()
        .or_else(|| std::env::var(DEFAULT_API_KEY_ENV).ok())
    {
        key.set(k);
    }

    let mut session = orchestrator(&settings, Arc::new(key.clone()))?;

    tokio::spawn(watch_progress(session.subscribe()));

    if !session.start().await {
        println!("{}", GATE_MESSAGE);
    }
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "" => {}
            "quit" | "exit" => break,
            "help" => print_help(),
            "status" => print_status(&session, config),
            "key" => {
                if !rest.is_empty() {
                    key.set(rest);
                }
                match session.select_credential().await {
                    Ok(()) => println!("API key selected."),
                    Err(e) => println!("Could not select a key: {}", e),
                }
            }
            "aspect" => match rest.parse::<AspectRatio>() {
                Ok(ar) => config = config.with_aspect_ratio(ar),
                Err(e) => println!("{}", e),
            },
            "resolution" => match rest.parse::<Resolution>() {
                Ok(res) => config = config.with_resolution(res),
                Err(e) => println!("{}", e),
            },
            "generate" => {
                if !session.has_credential() {
                    println!("{}", GATE_MESSAGE);
                    continue;
                }
                match session.submit(rest, config).await {
                    Ok(state) => print_state(&state),
                    Err(e) => println!("{}", e),
                }
            }
            "history" => {
                if session.history().is_empty() {
                    println!("No videos yet.");
                }
                for video in session.history().iter() {
                    print_entry(video);
                }
            }
            "view" => match rest.parse::<u64>() {
                Ok(id) => match session.view_history_entry(id) {
                    Ok(()) => print_state(&session.state()),
                    Err(e) => println!("{}", e),
                },
                Err(_) => println!("usage: view <id>"),
            },
            "save" => save(&session, rest),
            "reset" => {
                if !session.reset() {
                    println!("A generation is in progress.");
                }
            }
            other => println!("Unknown command '{}'. Type `help`.", other),
        }
    }

    Ok(())
}

/// Prints state transitions, plus a rotating progress line while generating.
async fn watch_progress(mut rx: watch::Receiver<GenerationState>) {
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut generating_since: Option<Instant> = None;
    let mut tick = 0;

    loop {
        let changed = match generating_since {
            Some(since) => tokio::select! {
                changed = rx.changed() => changed,
                _ = ticker.tick() => {
                    eprintln!("  {}", progress_line(since.elapsed(), tick));
                    tick += 1;
                    continue;
                }
            },
            None => rx.changed().await,
        };
        if changed.is_err() {
            break;
        }

        let state = rx.borrow_and_update().clone();
        eprintln!("[{}]", state.status());
        generating_since = state.is_generating().then(Instant::now);
        if generating_since.is_some() {
            ticker.reset();
            tick = 0;
        }
    }
}

fn progress_line(elapsed: Duration, tick: usize) -> String {
    let tip = PROGRESS_TIPS[tick % PROGRESS_TIPS.len()];
    format!("{}... ({}s)", tip, elapsed.as_secs())
}

fn save(session: &Orchestrator, rest: &str) {
    let (target, path) = rest.split_once(' ').unwrap_or((rest, ""));
    let state = session.state();
    let video = match target {
        "" | "current" => state.video(),
        id => match id.parse::<u64>() {
            Ok(id) => session.history().get(id),
            Err(_) => None,
        },
    };
    let Some(video) = video else {
        println!("Nothing to save.");
        return;
    };

    let path = match path.trim() {
        "" => PathBuf::from(video.download_file_name()),
        p => PathBuf::from(p),
    };
    match video.asset.save(&path) {
        Ok(()) => println!("Saved {} ({} bytes)", path.display(), video.asset.size()),
        Err(e) => println!("Save failed: {}", e),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  generate <prompt>          generate a video");
    println!("  aspect <16:9|9:16>         set aspect ratio");
    println!("  resolution <720p|1080p>    set resolution");
    println!("  history                    list generated videos");
    println!("  view <id>                  show a previous video");
    println!("  save <id|current> [path]   write a video to disk");
    println!("  reset                      start over");
    println!("  key [API_KEY]              select an API key");
    println!("  status                     show current state");
    println!("  quit");
}

fn print_status(session: &Orchestrator, config: VideoConfig) {
    println!(
        "state: {} | key: {} | {} {} | {} in history",
        session.state().status(),
        if session.has_credential() { "selected" } else { "missing" },
        config.aspect_ratio,
        config.resolution,
        session.history().len()
    );
}

fn print_state(state: &GenerationState) {
    match state {
        GenerationState::Completed { video } => {
            println!("Completed:");
            print_entry(video);
        }
        GenerationState::Failed { error } => println!("Error: {}", error),
        GenerationState::Idle { error: Some(error) } => {
            println!("{}", error);
            println!("{}", GATE_MESSAGE);
        }
        other => println!("{}", other),
    }
}

fn print_entry(video: &GeneratedVideo) {
    println!(
        "  #{} [{}] {} {} ({} bytes) {}",
        video.id,
        video.created_at.format("%H:%M:%S"),
        video.config.aspect_ratio,
        video.config.resolution,
        video.asset.size(),
        video.prompt
    );
}

fn show_config(json_output: bool) -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    let connector = settings.connector()?;
    let key_status = match std::env::var(DEFAULT_API_KEY_ENV) {
        Ok(k) if !k.trim().is_empty() => "set (redacted)",
        _ => "not set",
    };
    let client = settings.client(Arc::new(EnvCredentialProvider::new()))?;

    if json_output {
        let result = serde_json::json!({
            "backend": client.backend_name(),
            "model": connector.model().as_str(),
            "base_url": connector.base_url(),
            "api_key": key_status,
            "poll_interval_secs": client.poll_interval().as_secs_f64(),
            "poll_timeout_secs": client.poll_timeout().map(|d| d.as_secs_f64()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Backend:       {}", client.backend_name());
        println!("Model:         {}", connector.model());
        println!("Base URL:      {}", connector.base_url());
        println!("API key:       {} ({})", key_status, DEFAULT_API_KEY_ENV);
        println!("Poll interval: {:?}", client.poll_interval());
        match client.poll_timeout() {
            Some(t) => println!("Poll timeout:  {:?}", t),
            None => println!("Poll timeout:  none"),
        }
    }

    Ok(())
}
