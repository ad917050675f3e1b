//! Session-driven video generation example.
//!
//! Run with: `cargo run --example generate_video`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use std::sync::Arc;
use video_express::{
    AspectRatio, CredentialGate, CredentialProvider, EnvCredentialProvider, GenerationState,
    Orchestrator, Resolution, Settings, VideoConfig,
};

#[tokio::main]
async fn main() -> video_express::Result<()> {
    let credentials: Arc<dyn CredentialProvider> = Arc::new(EnvCredentialProvider::new());
    let client = Settings::from_env()?.client(credentials.clone())?;
    let mut session = Orchestrator::new(client, CredentialGate::new(credentials));

    if !session.start().await {
        eprintln!("Set GOOGLE_API_KEY first.");
        return Ok(());
    }

    let config = VideoConfig::new(AspectRatio::Portrait, Resolution::Hd);

    println!("Generating video (this may take a few minutes)...");
    match session
        .submit("Ocean waves crashing on a rocky shore at sunset", config)
        .await?
    {
        GenerationState::Completed { video } => {
            video.asset.save(video.download_file_name())?;
            println!(
                "Generated video: {} ({} bytes, {} polls)",
                video.download_file_name(),
                video.asset.size(),
                video.asset.metadata.polls
            );
        }
        other => println!("Generation did not complete: {}", other),
    }

    Ok(())
}
