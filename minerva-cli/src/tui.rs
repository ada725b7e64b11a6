//! Interactive chat screen built on ratatui.

use anyhow::Result;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use minerva_chat::{ChatClient, SendError};
use minerva_core::config::Config;
use minerva_core::session::{Role, SessionStore};
use minerva_providers::{HttpBackend, Provider};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

enum WorkerRequest {
    Send { session_id: String, prompt: String },
    StartSession,
}

enum WorkerEvent {
    Reply(String),
    Failed(String),
    SessionStarted(String),
}

#[derive(Clone, Copy)]
enum TimelineKind {
    User,
    Assistant,
    System,
    Error,
}

struct TimelineItem {
    kind: TimelineKind,
    text: String,
}

struct TuiApp {
    input: String,
    timeline: Vec<TimelineItem>,
    pending: bool,
    should_quit: bool,
    scroll: u16,
    session_id: String,
    provider: Provider,
}

impl TuiApp {
    fn new(session_id: String, provider: Provider) -> Self {
        Self {
            input: String::new(),
            timeline: vec![TimelineItem {
                kind: TimelineKind::System,
                text: "Welcome to Minerva. Enter to send, Shift+Enter for newline. /new /clear /quit"
                    .to_string(),
            }],
            pending: false,
            should_quit: false,
            scroll: 0,
            session_id,
            provider,
        }
    }

    fn add_line(&mut self, kind: TimelineKind, text: impl Into<String>) {
        self.timeline.push(TimelineItem {
            kind,
            text: text.into(),
        });
        self.scroll = self.scroll.saturating_add(1);
    }

    fn apply_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Reply(text) => {
                self.pending = false;
                self.add_line(TimelineKind::Assistant, text);
            }
            WorkerEvent::Failed(notice) => {
                self.pending = false;
                self.add_line(TimelineKind::Error, notice);
            }
            WorkerEvent::SessionStarted(id) => {
                self.session_id = id;
                self.timeline.clear();
                self.add_line(
                    TimelineKind::System,
                    format!("new session: {}", crate::short_id(&self.session_id)),
                );
                self.scroll = 0;
            }
        }
    }
}

pub async fn run_chat(config: &Config, session: Option<String>) -> Result<()> {
    let provider = crate::resolve_provider(config)?;
    let mut store = SessionStore::open(config.storage.sessions_path());

    let session_id = match session {
        Some(id) => {
            store.select(&id);
            id
        }
        None => store.start_new(),
    };
    let history: Vec<(Role, String)> = store
        .active_messages()
        .iter()
        .map(|m| (m.role, m.content.clone()))
        .collect();

    let client = ChatClient::new(Arc::new(HttpBackend::new(config.chat.backend_url.clone())));
    let credentials = config.credentials.clone();
    let credentials_ok = credentials.complete();

    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<WorkerRequest>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<WorkerEvent>();

    tokio::spawn(async move {
        while let Some(request) = request_rx.recv().await {
            match request {
                WorkerRequest::Send { session_id, prompt } => {
                    match client
                        .send(&mut store, &session_id, &prompt, &credentials, provider)
                        .await
                    {
                        Ok(content) => {
                            let _ = event_tx.send(WorkerEvent::Reply(content));
                        }
                        Err(SendError::MissingCredentials) => {
                            let _ = event_tx.send(WorkerEvent::Failed(
                                "missing credentials: run minerva onboard first".to_string(),
                            ));
                        }
                        Err(SendError::Backend(_)) => {
                            // send() already appended the failure notice to the
                            // transcript; show that same text.
                            let notice = store
                                .messages_of(&session_id)
                                .last()
                                .map(|m| m.content.clone())
                                .unwrap_or_default();
                            let _ = event_tx.send(WorkerEvent::Failed(notice));
                        }
                    }
                }
                WorkerRequest::StartSession => {
                    let id = store.start_new();
                    let _ = event_tx.send(WorkerEvent::SessionStarted(id));
                }
            }
        }
    });

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let mut app = TuiApp::new(session_id, provider);
    for (role, content) in history {
        let kind = match role {
            Role::User => TimelineKind::User,
            Role::Assistant => TimelineKind::Assistant,
        };
        app.add_line(kind, content);
    }

    loop {
        while let Ok(evt) = event_rx.try_recv() {
            app.apply_event(evt);
        }

        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(5),
                ])
                .split(frame.area());

            let status_line = format!(
                "provider: {} ({}) | session: {} | status: {}",
                app.provider.label(),
                app.provider.endpoint().model,
                crate::short_id(&app.session_id),
                if app.pending { "waiting" } else { "idle" },
            );
            let status = Paragraph::new(status_line)
                .block(Block::default().borders(Borders::ALL).title("minerva"));
            frame.render_widget(status, chunks[0]);

            let lines: Vec<Line> = app
                .timeline
                .iter()
                .map(|item| {
                    let (label, color) = match item.kind {
                        TimelineKind::User => ("user", Color::Cyan),
                        TimelineKind::Assistant => ("assistant", Color::Green),
                        TimelineKind::System => ("system", Color::Blue),
                        TimelineKind::Error => ("error", Color::Red),
                    };
                    Line::from(vec![
                        Span::styled(format!("[{}] ", label), Style::default().fg(color)),
                        Span::raw(item.text.clone()),
                    ])
                })
                .collect();
            let timeline = Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("conversation"),
                )
                .wrap(Wrap { trim: false })
                .scroll((app.scroll, 0));
            frame.render_widget(timeline, chunks[1]);

            let input = Paragraph::new(app.input.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("input (Enter send, Shift+Enter newline)"),
            );
            frame.render_widget(input, chunks[2]);
            frame.set_cursor_position((
                chunks[2].x + 1 + app.input.len() as u16,
                chunks[2].y + 1,
            ));
        })?;

        if event::poll(Duration::from_millis(60))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            app.should_quit = true;
                        }
                        KeyCode::Esc => {
                            app.should_quit = true;
                        }
                        KeyCode::PageUp | KeyCode::Up => {
                            app.scroll = app.scroll.saturating_sub(1);
                        }
                        KeyCode::PageDown | KeyCode::Down => {
                            app.scroll = app.scroll.saturating_add(1);
                        }
                        KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                            app.input.push('\n');
                        }
                        KeyCode::Enter => {
                            let content = app.input.trim().to_string();
                            if content.is_empty() {
                                app.input.clear();
                            } else if content == "/quit" {
                                app.should_quit = true;
                            } else if content == "/clear" {
                                app.input.clear();
                                app.timeline.clear();
                                app.scroll = 0;
                            } else if content == "/new" {
                                app.input.clear();
                                let _ = request_tx.send(WorkerRequest::StartSession);
                            } else if !credentials_ok {
                                app.input.clear();
                                app.add_line(
                                    TimelineKind::System,
                                    "set both API keys first (run: minerva onboard)",
                                );
                            } else if app.pending {
                                // One exchange at a time; keep the draft in the box.
                                app.add_line(
                                    TimelineKind::System,
                                    "still waiting for the previous reply",
                                );
                            } else {
                                app.input.clear();
                                app.add_line(TimelineKind::User, content.clone());
                                app.pending = true;
                                let _ = request_tx.send(WorkerRequest::Send {
                                    session_id: app.session_id.clone(),
                                    prompt: content,
                                });
                            }
                        }
                        KeyCode::Backspace => {
                            app.input.pop();
                        }
                        KeyCode::Char(ch) => {
                            app.input.push(ch);
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
