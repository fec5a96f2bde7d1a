use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use crate::narration::{
    NarrationCapability, NarrationEvent, NarrationEventSender, Utterance, UtteranceId,
    VoiceDescriptor,
};

/// Control messages for the speaking task
#[derive(Debug, Clone, Copy)]
enum Control {
    Pause,
    Resume,
    Cancel,
}

struct ActiveSpeech {
    id: UtteranceId,
    control: mpsc::UnboundedSender<Control>,
    done: Arc<AtomicBool>,
}

/// Silent stand-in for a speech engine
///
/// "Speaks" for as long as the text would take at the configured words per
/// minute scaled by the utterance rate. Useful without audio hardware and
/// for exercising the full playback cycle.
pub struct SimulatedNarrator {
    words_per_minute: u32,
    events: NarrationEventSender,
    active: Option<ActiveSpeech>,
    voices: Arc<Mutex<Vec<VoiceDescriptor>>>,
}

impl SimulatedNarrator {
    /// Create the narrator and publish its voice list asynchronously.
    /// Must be called inside a tokio runtime.
    pub fn new(words_per_minute: u32, events: NarrationEventSender) -> Self {
        let voices = Arc::new(Mutex::new(Vec::new()));

        let catalog = Arc::clone(&voices);
        let catalog_events = events.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            if let Ok(mut list) = catalog.lock() {
                *list = builtin_voices();
            }
            let _ = catalog_events.send(NarrationEvent::CatalogChanged);
        });

        Self {
            words_per_minute: words_per_minute.max(1),
            events,
            active: None,
            voices,
        }
    }

    fn send_control(&self, control: Control) {
        if let Some(active) = &self.active {
            let _ = active.control.send(control);
        }
    }
}

fn builtin_voices() -> Vec<VoiceDescriptor> {
    vec![
        VoiceDescriptor::new("sim-en-us", "Simulated English (US)", "en-US"),
        VoiceDescriptor::new("sim-en-gb", "Simulated English (UK)", "en-GB"),
        VoiceDescriptor::new("sim-fr-fr", "Simulated French", "fr-FR"),
    ]
}

/// How long `words` take to read at `words_per_minute * rate`
pub fn speaking_duration(words: usize, words_per_minute: u32, rate: f32) -> Duration {
    let per_minute = f64::from(words_per_minute.max(1)) * f64::from(rate.max(0.1));
    Duration::from_secs_f64(words as f64 * 60.0 / per_minute)
}

impl NarrationCapability for SimulatedNarrator {
    fn speak(&mut self, utterance: Utterance) {
        self.cancel();

        let (control, control_rx) = mpsc::unbounded_channel();
        let done = Arc::new(AtomicBool::new(false));
        let duration = speaking_duration(
            utterance.word_count(),
            self.words_per_minute,
            utterance.rate,
        );
        debug!(utterance = utterance.id, ?duration, "Simulated speech");

        tokio::spawn(run_speech(
            utterance.id,
            duration,
            control_rx,
            self.events.clone(),
            Arc::clone(&done),
        ));

        self.active = Some(ActiveSpeech {
            id: utterance.id,
            control,
            done,
        });
    }

    fn pause(&mut self) {
        self.send_control(Control::Pause);
    }

    fn resume(&mut self) {
        self.send_control(Control::Resume);
    }

    fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(utterance = active.id, "Simulated speech cancelled");
            active.done.store(true, Ordering::SeqCst);
            let _ = active.control.send(Control::Cancel);
        }
    }

    fn is_speaking(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.done.load(Ordering::SeqCst))
    }

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Drop for SimulatedNarrator {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_speech(
    id: UtteranceId,
    duration: Duration,
    mut control: mpsc::UnboundedReceiver<Control>,
    events: NarrationEventSender,
    done: Arc<AtomicBool>,
) {
    let _ = events.send(NarrationEvent::Started(id));

    let mut remaining = duration;
    let mut paused = false;

    loop {
        if paused {
            match control.recv().await {
                Some(Control::Resume) => paused = false,
                Some(Control::Pause) => {}
                Some(Control::Cancel) | None => return,
            }
            continue;
        }

        let started = Instant::now();
        tokio::select! {
            _ = tokio::time::sleep(remaining) => {
                // A cancel may have raced the timer
                if !done.swap(true, Ordering::SeqCst) {
                    let _ = events.send(NarrationEvent::Ended(id));
                }
                return;
            }
            cmd = control.recv() => {
                remaining = remaining.saturating_sub(started.elapsed());
                match cmd {
                    Some(Control::Pause) => paused = true,
                    Some(Control::Resume) => {}
                    Some(Control::Cancel) | None => return,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::NarrationSettings;

    fn utterance(id: UtteranceId, text: &str, rate: f32) -> Utterance {
        let settings = NarrationSettings {
            rate,
            ..Default::default()
        };
        Utterance::new(id, Arc::from(text), None, settings)
    }

    #[test]
    fn test_speaking_duration_scales_with_rate() {
        assert_eq!(speaking_duration(120, 120, 1.0), Duration::from_secs(60));
        assert_eq!(speaking_duration(120, 120, 2.0), Duration::from_secs(30));
        assert_eq!(speaking_duration(0, 175, 1.0), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_catalog_published_asynchronously() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let narrator = SimulatedNarrator::new(175, tx);
        assert!(narrator.list_voices().is_empty());

        assert_eq!(rx.recv().await, Some(NarrationEvent::CatalogChanged));
        assert_eq!(narrator.list_voices().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speaks_then_ends() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut narrator = SimulatedNarrator::new(60, tx);
        assert_eq!(rx.recv().await, Some(NarrationEvent::CatalogChanged));

        // 3 words at 60 wpm = 3 seconds
        narrator.speak(utterance(7, "one two three", 1.0));
        assert!(narrator.is_speaking());
        assert_eq!(rx.recv().await, Some(NarrationEvent::Started(7)));

        let before = Instant::now();
        assert_eq!(rx.recv().await, Some(NarrationEvent::Ended(7)));
        assert!(before.elapsed() >= Duration::from_secs(3));
        assert!(!narrator.is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_extends_speech() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut narrator = SimulatedNarrator::new(60, tx);
        rx.recv().await;

        let begin = Instant::now();
        narrator.speak(utterance(1, "a b", 1.0));
        assert_eq!(rx.recv().await, Some(NarrationEvent::Started(1)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        narrator.pause();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(narrator.is_speaking());
        narrator.resume();

        assert_eq!(rx.recv().await, Some(NarrationEvent::Ended(1)));
        assert!(begin.elapsed() >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_reports_nothing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut narrator = SimulatedNarrator::new(60, tx);
        rx.recv().await;

        narrator.speak(utterance(1, "a b c d", 1.0));
        assert_eq!(rx.recv().await, Some(NarrationEvent::Started(1)));
        narrator.cancel();
        narrator.cancel();
        assert!(!narrator.is_speaking());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_speak_replaces_previous() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut narrator = SimulatedNarrator::new(60, tx);
        rx.recv().await;

        narrator.speak(utterance(1, "a b c d e f", 1.0));
        narrator.speak(utterance(2, "a", 1.0));

        let mut seen = Vec::new();
        tokio::time::sleep(Duration::from_secs(20)).await;
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert!(!seen.contains(&NarrationEvent::Ended(1)));
        assert!(seen.contains(&NarrationEvent::Ended(2)));
    }
}
