pub mod app;
pub mod event;
mod views;
mod widgets;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bloombot_core::config::BloomConfig;
use bloombot_core::{
    ChatSession, ChatSettings, GenerativeBackend, IdentifySettings, PlantIdentifier,
};
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use futures_util::StreamExt;
use ratatui::{DefaultTerminal, Frame};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::photo;

use self::app::{App, Screen};
use self::event::{AsyncAction, AsyncResult};

/// Entry point for the interactive TUI mode.
pub async fn run_tui<B>(config: &BloomConfig, backend: Arc<B>) -> Result<()>
where
    B: GenerativeBackend + 'static,
{
    // Channels for async communication
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AsyncAction>();
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<AsyncResult>();

    let worker = Worker {
        identifier: Arc::new(PlantIdentifier::new(
            backend.clone(),
            IdentifySettings::from_config(config),
        )),
        backend,
        system_instruction: config.chat.system_instruction.clone(),
        chat_settings: ChatSettings::from_config(&config.chat),
        result_tx,
    };
    tokio::spawn(async move {
        worker_loop(worker, &mut action_rx).await;
    });

    let model = config.gemini.model.clone();

    // Initialize terminal
    let mut terminal = ratatui::init();
    let mut app = App::new(&config.chat.greeting, &config.chat.fallback_message);

    let result = run_loop(&mut terminal, &mut app, &action_tx, &mut result_rx, &model);

    // Restore terminal
    ratatui::restore();

    result
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    action_tx: &mpsc::UnboundedSender<AsyncAction>,
    result_rx: &mut mpsc::UnboundedReceiver<AsyncResult>,
    model: &str,
) -> Result<()> {
    loop {
        // Draw
        terminal.draw(|frame| render(frame, app, model))?;

        // Poll for async results (non-blocking)
        while let Ok(result) = result_rx.try_recv() {
            app.handle_result(result);
        }

        // Poll for keyboard events (50ms timeout for responsive UI)
        if ct_event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = ct_event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = app.handle_key(key) {
                        let _ = action_tx.send(action);
                    }
                }
            }
        }

        // Tick error timer
        app.tick_error();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, app: &App, model: &str) {
    let area = frame.area();

    let splash_active = std::time::Instant::now() < app.splash_until;
    if splash_active && app.screen == Screen::Dashboard {
        views::splash::render(frame, area, model);
        return;
    }

    match app.screen {
        Screen::Dashboard => views::dashboard::render(frame, app, area),
        Screen::Detail => views::detail::render(frame, app, area),
        Screen::Analyzer => views::analyzer::render(frame, app, area),
        Screen::Chat => views::chat::render(frame, app, area),
    }

    // Render error toast overlay if present
    if let Some(ref msg) = app.error_message {
        render_error_toast(frame, msg);
    }
}

fn render_error_toast(frame: &mut Frame, msg: &str) {
    use ratatui::{
        layout::{Constraint, Flex, Layout},
        style::{Color, Style},
        widgets::{Block, Borders, Clear, Paragraph, Wrap},
    };

    let area = frame.area();
    let [toast_area] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    let [toast_area] = Layout::vertical([Constraint::Length(4)])
        .flex(Flex::End)
        .areas(toast_area);

    frame.render_widget(Clear, toast_area);
    let toast = Paragraph::new(format!(" ✗ {msg}"))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White).bg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error "),
        );
    frame.render_widget(toast, toast_area);
}

/// Everything the async side needs to serve UI actions.
struct Worker<B> {
    identifier: Arc<PlantIdentifier<B>>,
    backend: Arc<B>,
    system_instruction: String,
    chat_settings: ChatSettings,
    result_tx: mpsc::UnboundedSender<AsyncResult>,
}

/// The chat session currently open in the UI and its streaming reply, if any.
struct OpenChat<B> {
    epoch: u64,
    session: Arc<ChatSession<B>>,
    reply: Option<JoinHandle<()>>,
}

impl<B> OpenChat<B> {
    fn abort_reply(&mut self) {
        if let Some(task) = self.reply.take() {
            task.abort();
        }
    }
}

/// Async worker loop: identifications run concurrently, chat replies
/// stream one at a time per session.
async fn worker_loop<B>(worker: Worker<B>, action_rx: &mut mpsc::UnboundedReceiver<AsyncAction>)
where
    B: GenerativeBackend + 'static,
{
    let mut chat: Option<OpenChat<B>> = None;

    while let Some(action) = action_rx.recv().await {
        match action {
            AsyncAction::Identify { path } => {
                let identifier = worker.identifier.clone();
                let tx = worker.result_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(identify_photo(&identifier, &path).await);
                });
            }
            AsyncAction::OpenChat { epoch } => {
                if let Some(mut old) = chat.take() {
                    old.abort_reply();
                }
                let session = ChatSession::create(
                    worker.backend.clone(),
                    worker.system_instruction.clone(),
                    worker.chat_settings.clone(),
                );
                tracing::debug!(epoch, "chat session opened");
                chat = Some(OpenChat {
                    epoch,
                    session: Arc::new(session),
                    reply: None,
                });
            }
            AsyncAction::SendChat { epoch, text } => match chat.as_mut() {
                Some(open) if open.epoch == epoch => {
                    let task = tokio::spawn(stream_reply(
                        open.session.clone(),
                        epoch,
                        text,
                        worker.result_tx.clone(),
                    ));
                    open.reply = Some(task);
                }
                _ => {
                    let _ = worker.result_tx.send(AsyncResult::ChatFailed {
                        epoch,
                        message: "no open chat session".into(),
                    });
                }
            },
            AsyncAction::CloseChat => {
                if let Some(mut old) = chat.take() {
                    old.abort_reply();
                    tracing::debug!(epoch = old.epoch, "chat session closed");
                }
            }
        }

        if worker.result_tx.is_closed() {
            break; // UI closed
        }
    }
}

async fn identify_photo<B: GenerativeBackend>(
    identifier: &PlantIdentifier<B>,
    path: &Path,
) -> AsyncResult {
    let default_mime = &identifier.settings().default_mime_type;
    let photo = match photo::load(path, None, default_mime).await {
        Ok(photo) => photo,
        Err(e) => return AsyncResult::IdentifyFailed(format!("{e:#}")),
    };
    match identifier.identify(&photo.bytes, &photo.mime_type).await {
        Ok(plant) => AsyncResult::Identified(Box::new(plant)),
        Err(e) => AsyncResult::IdentifyFailed(e.user_message()),
    }
}

async fn stream_reply<B: GenerativeBackend>(
    session: Arc<ChatSession<B>>,
    epoch: u64,
    text: String,
    tx: mpsc::UnboundedSender<AsyncResult>,
) {
    let mut stream = match session.send(&text).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = tx.send(AsyncResult::ChatFailed {
                epoch,
                message: e.to_string(),
            });
            return;
        }
    };
    while let Some(item) = stream.next().await {
        match item {
            Ok(text) => {
                if tx.send(AsyncResult::ChatFragment { epoch, text }).is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.send(AsyncResult::ChatFailed {
                    epoch,
                    message: e.to_string(),
                });
                return;
            }
        }
    }
    let _ = tx.send(AsyncResult::ChatFinished { epoch });
}
