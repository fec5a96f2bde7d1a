use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::info;

use readaloud_core::{
    narration::backend::{build_capability, Narrator},
    source::load_text,
    AppConfig, NarrationEvent, ViewportInput,
};
use readaloud_tui::{
    app::{App, WELCOME_TEXT},
    event::{AppEvent, EventHandler, SourceEvent},
    input::{handle_key_event, Action},
    widgets::{CaptionWidget, DocumentWidget, HelpBarWidget, NarrationBarWidget},
};

pub async fn run(config: Arc<AppConfig>, file: Option<PathBuf>) -> Result<()> {
    if file.as_deref().is_some_and(|p| p.as_os_str() == "-") {
        bail!("The terminal reader cannot read stdin; use `readaloud reveal -` instead");
    }

    // Narration capability reports through this channel
    let (narration_tx, mut narration_rx) = mpsc::unbounded_channel::<NarrationEvent>();
    let narrator = build_capability(&config.narration, narration_tx);

    // Create channel for async document loads
    let (source_tx, mut source_rx) = mpsc::unbounded_channel::<SourceEvent>();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, SetTitle("readaloud"))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let title = file
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "readaloud".to_string());
    let mut app = App::new(config.clone(), narrator, title);

    match &file {
        Some(path) => {
            spawn_load(path.clone(), source_tx.clone());
            app.begin_loading(Instant::now());
        }
        None => {
            app.show_text(WELCOME_TEXT, Instant::now());
        }
    }

    let event_handler = EventHandler::new(config.ui.tick_rate_ms);

    let result = main_loop(
        &mut terminal,
        &mut app,
        &event_handler,
        &mut narration_rx,
        &mut source_rx,
        file.as_ref(),
        &source_tx,
    );

    // Stop speech and timers before giving the terminal back
    app.teardown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn main_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<Narrator>,
    event_handler: &EventHandler,
    narration_rx: &mut mpsc::UnboundedReceiver<NarrationEvent>,
    source_rx: &mut mpsc::UnboundedReceiver<SourceEvent>,
    file: Option<&PathBuf>,
    source_tx: &mpsc::UnboundedSender<SourceEvent>,
) -> Result<()> {
    loop {
        // Process narration outcomes (non-blocking)
        while let Ok(event) = narration_rx.try_recv() {
            app.handle_narration_event(event);
        }

        // Process completed document loads (non-blocking)
        while let Ok(event) = source_rx.try_recv() {
            app.on_source(event, Instant::now());
        }

        app.update(Instant::now());

        // Draw UI
        terminal.draw(|frame| {
            let size = frame.area();
            let help_height = if app.show_help { 1 } else { 0 };

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),           // Caption
                    Constraint::Min(1),              // Document
                    Constraint::Length(1),           // Narration bar
                    Constraint::Length(help_height), // Help
                ])
                .split(size);

            CaptionWidget::render(frame, layout[0], app);
            DocumentWidget::render(frame, layout[1], app);
            NarrationBarWidget::render(frame, layout[2], app);
            if app.show_help {
                HelpBarWidget::render(frame, layout[3], app);
            }
        })?;

        // Wake up in time for the next reveal or caption tick
        let timeout = app.poll_timeout(Instant::now(), event_handler.tick_rate());
        if let Some(event) = event_handler.next_within(timeout)? {
            match event {
                AppEvent::Key(key) => {
                    let action = handle_key_event(key);
                    handle_action(app, action, file, source_tx);
                }
                AppEvent::Wheel { down } => {
                    app.scroll(if down { 1 } else { -1 }, ViewportInput::Wheel);
                }
                AppEvent::Drag { row } => app.drag(row),
                AppEvent::Release => app.end_drag(),
                AppEvent::Resize(_, _) | AppEvent::Tick => {}
            }
        }

        if app.should_quit {
            info!("Quitting");
            return Ok(());
        }
    }
}

fn handle_action(
    app: &mut App<Narrator>,
    action: Action,
    file: Option<&PathBuf>,
    source_tx: &mpsc::UnboundedSender<SourceEvent>,
) {
    match action {
        Action::Quit => app.quit(),
        Action::PlayPause => app.play_pause(),
        Action::Reload => match file {
            Some(path) => {
                spawn_load(path.clone(), source_tx.clone());
                app.begin_loading(Instant::now());
            }
            None => {
                app.replay(Instant::now());
            }
        },
        Action::CancelReveal => app.cancel_reveal(),
        Action::Adjust(kind, steps) => app.adjust(kind, steps),
        Action::NextVoice => app.cycle_voice(true),
        Action::PrevVoice => app.cycle_voice(false),
        Action::ScrollDown => app.scroll(1, ViewportInput::Wheel),
        Action::ScrollUp => app.scroll(-1, ViewportInput::Wheel),
        Action::ScrollPageDown => {
            let page = app.page_size();
            app.scroll(page, ViewportInput::Wheel);
        }
        Action::ScrollPageUp => {
            let page = app.page_size();
            app.scroll(-page, ViewportInput::Wheel);
        }
        Action::ToggleHelp => app.toggle_help(),
        Action::None => {}
    }
}

/// Read the document on a background task
fn spawn_load(path: PathBuf, tx: mpsc::UnboundedSender<SourceEvent>) {
    tokio::spawn(async move {
        let event = match load_text(&path).await {
            Ok(text) => SourceEvent::Loaded(text),
            Err(e) => SourceEvent::Failed(format!("{}: {}", path.display(), e)),
        };
        let _ = tx.send(event);
    });
}
