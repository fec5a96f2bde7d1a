use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::narration::{
    NarrationCapability, NarrationEvent, NarrationEventSender, Utterance, UtteranceId,
    VoiceDescriptor,
};

/// espeak-ng speaks 175 words per minute at its default speed
const BASE_WORDS_PER_MINUTE: f32 = 175.0;
/// espeak-ng pitch scale (0-99), 50 is neutral
const BASE_PITCH: f32 = 50.0;
/// espeak-ng amplitude scale (0-200), 100 is neutral
const BASE_AMPLITUDE: f32 = 100.0;
/// How often a running speech process is checked for exit
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Longest stderr excerpt carried by an error event
const MAX_ERROR_DETAIL: usize = 512;
/// Wait for the rest of stderr once a failed program has exited
const STDERR_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
enum ProcessSignal {
    Stop,
    Continue,
}

struct ActiveProcess {
    id: UtteranceId,
    /// Only reaped while this lock is held, so a pid read under it is never stale
    child: Arc<Mutex<Child>>,
    cancel: Option<oneshot::Sender<()>>,
    done: Arc<AtomicBool>,
}

impl ActiveProcess {
    fn signal(&self, signal: ProcessSignal) {
        if self.done.load(Ordering::SeqCst) {
            return;
        }
        let child = lock_child(&self.child);
        // None once the child has been reaped
        if let Some(pid) = child.id() {
            send_signal(pid, signal);
        }
    }
}

/// Narration through an external speech program (espeak-ng compatible)
///
/// Each utterance runs one child process fed through stdin. Pause and
/// resume stop and continue the child with SIGSTOP/SIGCONT on unix.
pub struct CommandNarrator {
    program: String,
    events: NarrationEventSender,
    active: Option<ActiveProcess>,
    voices: Arc<Mutex<Vec<VoiceDescriptor>>>,
}

impl CommandNarrator {
    /// Create the narrator and load its voice list in the background.
    /// Must be called inside a tokio runtime.
    pub fn new(program: &str, events: NarrationEventSender) -> Self {
        let voices = Arc::new(Mutex::new(Vec::new()));

        let catalog = Arc::clone(&voices);
        let catalog_events = events.clone();
        let catalog_program = program.to_string();
        tokio::spawn(async move {
            match load_voices(&catalog_program).await {
                Ok(list) => {
                    debug!(count = list.len(), "Loaded voices from {}", catalog_program);
                    if let Ok(mut guard) = catalog.lock() {
                        *guard = list;
                    }
                    let _ = catalog_events.send(NarrationEvent::CatalogChanged);
                }
                Err(e) => warn!("Failed to list voices from {}: {}", catalog_program, e),
            }
        });

        Self {
            program: program.to_string(),
            events,
            active: None,
            voices,
        }
    }

    fn signal(&self, signal: ProcessSignal) {
        if let Some(active) = &self.active {
            active.signal(signal);
        }
    }
}

async fn load_voices(program: &str) -> std::io::Result<Vec<VoiceDescriptor>> {
    let output = Command::new(program)
        .arg("--voices")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(std::io::Error::other(format!(
            "{} --voices exited with {}",
            program, output.status
        )));
    }
    Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse the table printed by `espeak-ng --voices`
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
pub fn parse_voice_list(output: &str) -> Vec<VoiceDescriptor> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("Pty"))
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let lang = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(VoiceDescriptor::new(lang, name.replace('_', " "), lang))
        })
        .collect()
}

/// Program arguments for one utterance
pub fn speech_args(utterance: &Utterance) -> Vec<String> {
    let words_per_minute = (BASE_WORDS_PER_MINUTE * utterance.rate).round() as u32;
    let pitch = (BASE_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32;
    let amplitude = (BASE_AMPLITUDE * utterance.volume).round().clamp(0.0, 200.0) as u32;

    let mut args = vec![
        "-s".to_string(),
        words_per_minute.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
    ];
    if let Some(voice) = &utterance.voice {
        args.push("-v".to_string());
        args.push(voice.id.clone());
    }
    args
}

fn lock_child(child: &Mutex<Child>) -> std::sync::MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Exit status if the child has finished, reaping it
fn try_reap(child: &Mutex<Child>) -> Option<std::io::Result<ExitStatus>> {
    lock_child(child).try_wait().transpose()
}

/// Trimmed stderr, keeping the tail when it is long
fn stderr_detail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.chars().count() <= MAX_ERROR_DETAIL {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .rev()
        .nth(MAX_ERROR_DETAIL - 1)
        .map_or(0, |(index, _)| index);
    format!("...{}", &text[cut..])
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: ProcessSignal) {
    let signo = match signal {
        ProcessSignal::Stop => libc::SIGSTOP,
        ProcessSignal::Continue => libc::SIGCONT,
    };
    // SAFETY: pid names our own child, which has not been reaped yet
    if unsafe { libc::kill(pid as libc::pid_t, signo) } != 0 {
        warn!(
            "Failed to send {:?} to speech process {}: {}",
            signal,
            pid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn send_signal(pid: u32, signal: ProcessSignal) {
    warn!("{:?} is not supported on this platform (speech process {})", signal, pid);
}

impl NarrationCapability for CommandNarrator {
    fn speak(&mut self, utterance: Utterance) {
        self.cancel();

        let id = utterance.id;
        let mut child = match Command::new(&self.program)
            .args(speech_args(&utterance))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", self.program, e);
                let _ = self.events.send(NarrationEvent::Errored(
                    id,
                    format!("Failed to start {}: {}", self.program, e),
                ));
                return;
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            let text = Arc::clone(&utterance.text);
            tokio::spawn(async move {
                // Fails harmlessly when the child is killed mid-write
                if stdin.write_all(text.as_bytes()).await.is_ok() {
                    let _ = stdin.shutdown().await;
                }
            });
        }

        // Drained concurrently so a chatty program never blocks on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buffer = Vec::new();
                let _ = pipe.read_to_end(&mut buffer).await;
                buffer
            })
        });

        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let done = Arc::new(AtomicBool::new(false));
        let child = Arc::new(Mutex::new(child));
        let events = self.events.clone();
        let program = self.program.clone();
        let task_done = Arc::clone(&done);
        let task_child = Arc::clone(&child);

        tokio::spawn(async move {
            let _ = events.send(NarrationEvent::Started(id));

            let mut poll = tokio::time::interval(EXIT_POLL_INTERVAL);
            poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let status = loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        if let Some(stderr) = &stderr {
                            stderr.abort();
                        }
                        return;
                    }
                    _ = poll.tick() => {
                        if let Some(status) = try_reap(&task_child) {
                            break status;
                        }
                    }
                }
            };
            if task_done.swap(true, Ordering::SeqCst) {
                return;
            }

            let event = match status {
                Ok(status) if status.success() => {
                    if let Some(stderr) = &stderr {
                        stderr.abort();
                    }
                    NarrationEvent::Ended(id)
                }
                Ok(status) => {
                    let bytes = match stderr {
                        Some(handle) => tokio::time::timeout(STDERR_GRACE, handle)
                            .await
                            .ok()
                            .and_then(Result::ok)
                            .unwrap_or_default(),
                        None => Vec::new(),
                    };
                    let detail = stderr_detail(&bytes);
                    NarrationEvent::Errored(
                        id,
                        if detail.is_empty() {
                            format!("{} exited with {}", program, status)
                        } else {
                            format!("{} exited with {}: {}", program, status, detail)
                        },
                    )
                }
                Err(e) => NarrationEvent::Errored(id, format!("{} failed: {}", program, e)),
            };
            let _ = events.send(event);
        });

        self.active = Some(ActiveProcess {
            id,
            child,
            cancel: Some(cancel_tx),
            done,
        });
    }

    fn pause(&mut self) {
        self.signal(ProcessSignal::Stop);
    }

    fn resume(&mut self) {
        self.signal(ProcessSignal::Continue);
    }

    fn cancel(&mut self) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        debug!(utterance = active.id, "Cancelling speech process");
        active.done.store(true, Ordering::SeqCst);
        {
            let mut child = lock_child(&active.child);
            // SIGKILL also ends a stopped process
            if child.id().is_some() {
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill speech process: {}", e);
                }
            }
        }
        if let Some(cancel) = active.cancel.take() {
            let _ = cancel.send(());
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

impl Drop for CommandNarrator {
    fn drop(&mut self) {
        self.cancel();
    }
}
