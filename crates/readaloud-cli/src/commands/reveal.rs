use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use readaloud_core::{
    narration::backend::build_capability, source::load_text, AppConfig, NarrationCapability,
    NarrationController, NarrationEvent, RevealEvent, RevealScheduler,
};

/// How long `--speak` waits for the backend to publish its voices
const CATALOG_TIMEOUT: Duration = Duration::from_secs(2);

/// Headless typewriter: print the document word by word, optionally narrating it
pub async fn run(config: &AppConfig, file: &Path, speak: bool) -> Result<()> {
    let text: Arc<str> = load_text(file).await?.into();
    if text.split_whitespace().next().is_none() {
        warn!("{} contains no words", file.display());
        return Ok(());
    }

    let (narration_tx, mut narration_rx) = mpsc::unbounded_channel();
    let mut narration = if speak {
        let capability = build_capability(&config.narration, narration_tx);
        let mut controller = NarrationController::from_config(capability, &config.narration);
        wait_for_catalog(&mut controller, &mut narration_rx).await;
        controller.play(Arc::clone(&text));
        Some(controller)
    } else {
        None
    };

    let mut scheduler = RevealScheduler::from_config(&config.reveal);
    if scheduler.start(Arc::clone(&text), Instant::now()).is_none() {
        return Ok(());
    }

    let mut stdout = tokio::io::stdout();
    let mut written = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let wake = scheduler.next_deadline().unwrap_or_else(Instant::now);

        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted");
                scheduler.cancel();
                if let Some(controller) = narration.as_mut() {
                    controller.teardown();
                }
                break;
            }
            _ = tokio::time::sleep_until(wake.into()), if scheduler.is_active() => {
                for event in scheduler.update(Instant::now()) {
                    if let RevealEvent::Tick(frame) = event {
                        let prefix = frame.prefix();
                        stdout.write_all(prefix[written..].as_bytes()).await?;
                        written = prefix.len();
                    }
                }
                stdout.flush().await?;
            }
            Some(event) = narration_rx.recv(), if narration.is_some() => {
                if let Some(controller) = narration.as_mut() {
                    controller.handle_event(event);
                }
            }
        }

        let narrating = narration.as_ref().is_some_and(|c| c.state().is_active());
        if !scheduler.is_active() && !narrating {
            break;
        }
    }

    stdout.write_all(b"\n").await?;
    stdout.flush().await?;

    if let Some(error) = narration.as_ref().and_then(|c| c.last_error()) {
        bail!("Narration failed: {}", error);
    }
    Ok(())
}

/// Give the backend a moment to publish its voices so the first utterance
/// already uses the selected voice instead of restarting once it arrives
async fn wait_for_catalog<C: NarrationCapability>(
    controller: &mut NarrationController<C>,
    events: &mut mpsc::UnboundedReceiver<NarrationEvent>,
) -> bool {
    let loaded = tokio::time::timeout(CATALOG_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            let catalog = event == NarrationEvent::CatalogChanged;
            controller.handle_event(event);
            if catalog {
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
    loaded
}
