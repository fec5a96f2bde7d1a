use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::warn;

use readaloud_core::{
    narration::backend::build_capability, AppConfig, NarrationEvent, VoiceCatalog,
};

/// How long to wait for the backend to publish its voices
const CATALOG_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run(config: &AppConfig) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let capability = build_capability(&config.narration, tx);

    let loaded = tokio::time::timeout(CATALOG_TIMEOUT, async {
        while let Some(event) = rx.recv().await {
            if event == NarrationEvent::CatalogChanged {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    if !loaded {
        warn!("Voice catalog did not load within {:?}", CATALOG_TIMEOUT);
    }

    let catalog = VoiceCatalog::from_voices(capability.list_voices());
    if catalog.is_empty() {
        println!("No voices available for the {:?} backend.", config.narration.backend);
        return Ok(());
    }

    let preferred = config.narration.voice.as_deref();
    println!("{:<3} {:<20} {:<12} NAME", "", "ID", "LANG");
    for voice in catalog.iter() {
        let marker = if Some(voice.id.as_str()) == preferred { "*" } else { "" };
        println!("{:<3} {:<20} {:<12} {}", marker, voice.id, voice.lang, voice.name);
    }

    Ok(())
}
