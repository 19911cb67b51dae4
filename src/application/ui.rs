use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::configuration::ClientState;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::configuration::StateFile;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::Mode;
use crate::domain::models::Outbound;
use crate::domain::models::SessionPatch;
use crate::domain::models::TextArea;
use crate::domain::models::Theme;
use crate::domain::services::BubbleList;
use crate::domain::services::Conversation;
use crate::domain::services::Scroll;
use crate::domain::services::SessionAdoption;
use crate::domain::services::SessionStore;
use crate::domain::services::Timers;

const SIDEBAR_WIDTH: u16 = 32;
const RENAME_FLAG_CLEAR: Duration = Duration::from_millis(900);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum InputState {
    Compose,
    Rename(String),
    AttachImage,
}

struct Shell<'a> {
    store: SessionStore,
    conversation: Conversation,
    timers: Timers,
    scroll: Scroll,
    bubble_list: BubbleList,
    loading: Loading,
    theme: Theme,
    mode: Mode,
    active: Option<String>,
    creating: bool,
    input_state: InputState,
    textarea: tui_textarea::TextArea<'a>,
    state_path: PathBuf,
    last_known_width: u16,
    last_known_height: u16,
    actions: mpsc::UnboundedSender<Action>,
    events: mpsc::UnboundedSender<Event>,
}

impl<'a> Shell<'a> {
    async fn new(
        actions: mpsc::UnboundedSender<Action>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Result<Shell<'a>> {
        // The persisted state is what the user last had on screen; it wins
        // over config defaults, the same way the web client trusts
        // localStorage.
        let state_file = StateFile::default();
        let state = state_file.load().await.unwrap_or_default();

        let mode = Mode::parse(&state.mode)
            .or_else(|| return Mode::parse(&Config::get(ConfigKey::Mode)))
            .unwrap_or_default();
        let theme = Theme::parse(&state.theme)
            .or_else(|| return Theme::parse(&Config::get(ConfigKey::Theme)))
            .unwrap_or_default();
        Config::set(ConfigKey::Mode, &mode.to_string());

        let mut last_session = state.session_id;
        if last_session.is_empty() {
            last_session = Config::get(ConfigKey::SessionID);
        }

        let mut shell = Shell {
            store: SessionStore::default(),
            conversation: Conversation::new(mode),
            timers: Timers::default(),
            scroll: Scroll::default(),
            bubble_list: BubbleList::new(theme),
            loading: Loading::default(),
            theme,
            mode,
            active: None,
            creating: false,
            input_state: InputState::Compose,
            textarea: TextArea::default(),
            state_path: state_file.path,
            last_known_width: 0,
            last_known_height: 0,
            actions,
            events,
        };

        shell.actions.send(Action::FetchSessions(mode))?;
        if !last_session.is_empty() {
            shell.navigate(Some(last_session))?;
        }

        return Ok(shell);
    }

    fn persist_state(&self) {
        let state = ClientState {
            session_id: self.active.clone().unwrap_or_default(),
            mode: self.mode.to_string(),
            theme: self.theme.name().to_string(),
        };
        let path = self.state_path.clone();

        tokio::spawn(async move {
            if let Err(err) = StateFile::new(path).save(&state).await {
                tracing::warn!(error = ?err, "failed to persist client state");
            }
        });
    }

    /// Single entry point for changing the active session. Resets the
    /// transcript, kicks off a cancellable history load, and persists the
    /// new position.
    fn navigate(&mut self, session_id: Option<String>) -> Result<()> {
        if !self.conversation.activate(session_id.clone()) {
            return Ok(());
        }

        self.active = session_id;
        if let Some(id) = &self.active {
            let token = self.conversation.begin_history_load();
            self.actions.send(Action::LoadHistory {
                session_id: id.to_string(),
                mode: self.mode,
                token,
            })?;
        }

        self.sync_dependants();
        self.persist_state();
        return Ok(());
    }

    fn adopt_session(&mut self, adoption: SessionAdoption) {
        self.store.upsert(SessionPatch::new(
            &adoption.id,
            Some(adoption.title.as_str()),
            Some(adoption.mode),
        ));
        self.active = Some(adoption.id);
        self.persist_state();
    }

    fn handle_session_titled(&mut self, id: &str, title: &str) {
        if !self.store.rename(id, title) {
            return;
        }

        let events = self.events.clone();
        let expired = id.to_string();
        self.timers.schedule(id, RENAME_FLAG_CLEAR, async move {
            let _ = events.send(Event::RenameFlagExpired(expired));
        });
    }

    fn switch_mode(&mut self, next: Mode) -> Result<()> {
        if next == self.mode {
            return Ok(());
        }

        self.mode = next;
        Config::set(ConfigKey::Mode, &next.to_string());
        self.conversation.set_mode(next);
        self.input_state = InputState::Compose;
        self.textarea = TextArea::default();

        let target = self
            .store
            .list_by_mode(next)
            .first()
            .map(|e| return e.id.to_string());
        self.navigate(target)?;
        self.actions.send(Action::FetchSessions(next))?;
        self.persist_state();

        return Ok(());
    }

    fn select_adjacent(&mut self, offset: i32) -> Result<()> {
        let ids = self
            .store
            .list_by_mode(self.mode)
            .iter()
            .map(|e| return e.id.to_string())
            .collect::<Vec<String>>();
        if ids.is_empty() {
            return Ok(());
        }

        let target = match self
            .active
            .as_ref()
            .and_then(|id| return ids.iter().position(|e| return e == id))
        {
            Some(current) => {
                let next = (current as i32 + offset).clamp(0, ids.len() as i32 - 1);
                ids[next as usize].to_string()
            }
            None => ids[0].to_string(),
        };

        return self.navigate(Some(target));
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        match event {
            Event::ChatReply(reply) => {
                let titled_id = reply.session_id.to_string();
                let title = reply.title.clone();

                if let Some(adoption) = self.conversation.apply_chat_reply(reply) {
                    self.adopt_session(adoption);
                }
                if let Some(title) = title {
                    self.handle_session_titled(&titled_id, &title);
                }

                self.sync_dependants();
                self.scroll.last();
            }
            Event::ImagesReply(reply) => {
                let titled_id = reply.session_id.to_string();
                let title = reply.title.clone();

                if let Some(adoption) = self.conversation.apply_images_reply(reply) {
                    self.adopt_session(adoption);
                }
                if let Some(title) = title {
                    self.handle_session_titled(&titled_id, &title);
                }

                self.sync_dependants();
                self.scroll.last();
            }
            Event::SendFailed(text) => {
                self.conversation.apply_send_failure(&text);
                self.sync_dependants();
                self.scroll.last();
            }
            Event::WorkerNotice(message) => {
                self.creating = false;
                self.conversation.push_notice(message);
                self.sync_dependants();
                self.scroll.last();
            }
            Event::HistoryLoaded { token, rows, .. } => {
                self.conversation.apply_history(&token, rows);
                self.sync_dependants();
                self.scroll.last();
            }
            Event::SessionsLoaded(sessions) => {
                self.store.replace(sessions);
            }
            Event::SessionCreated { id, mode } => {
                self.creating = false;
                self.store
                    .upsert(SessionPatch::new(&id, Some("New chat"), Some(mode)));
                self.navigate(Some(id))?;
            }
            Event::SessionRenamed { id, title } => {
                self.handle_session_titled(&id, &title);
            }
            Event::SessionDeleted(id) => {
                self.store.remove(&id);
                self.timers.cancel(&id);
                if self.active.as_deref() == Some(id.as_str()) {
                    self.navigate(None)?;
                }
            }
            Event::RenameFlagExpired(id) => {
                self.store.clear_just_renamed(&id);
            }
        }

        return Ok(());
    }

    fn submit_input(&mut self) -> Result<()> {
        let text = self.textarea.lines().join("\n");

        match std::mem::replace(&mut self.input_state, InputState::Compose) {
            InputState::Compose => {
                self.input_state = InputState::Compose;
                let outbound = self.conversation.begin_send(&text);
                let Some(outbound) = outbound else {
                    return Ok(());
                };

                self.textarea = TextArea::default();
                match outbound {
                    Outbound::Chat(req) => self.actions.send(Action::SendChat(req))?,
                    Outbound::OcrQa(req) => self.actions.send(Action::SendOcrQa(req))?,
                    Outbound::Images(req) => self.actions.send(Action::SendImages(req))?,
                }

                self.sync_dependants();
                self.scroll.last();
            }
            InputState::Rename(id) => {
                self.textarea = TextArea::default();
                let title = text.trim().to_string();
                if !title.is_empty() {
                    self.actions.send(Action::RenameSession { id, title })?;
                }
            }
            InputState::AttachImage => {
                self.textarea = TextArea::default();
                let path = text.trim().to_string();
                if !path.is_empty() {
                    if let Err(err) = self.conversation.queue_image(PathBuf::from(path)) {
                        self.conversation.push_error(&err);
                        self.sync_dependants();
                        self.scroll.last();
                    }
                }
            }
        }

        return Ok(());
    }

    fn begin_rename(&mut self) {
        let Some(id) = self.active.clone() else {
            return;
        };

        let title = self
            .store
            .get(&id)
            .map(|e| return e.title.to_string())
            .unwrap_or_default();

        self.textarea = TextArea::with_title("Rename session (Enter to save, Esc to cancel)");
        self.textarea.insert_str(&title);
        self.input_state = InputState::Rename(id);
    }

    fn begin_attach_image(&mut self) {
        if self.mode != Mode::Ocr || self.conversation.is_in_flight() {
            return;
        }

        self.textarea = TextArea::with_title("Path to image (Enter to queue, Esc to cancel)");
        self.input_state = InputState::AttachImage;
    }

    fn cancel_input(&mut self) {
        if matches!(self.input_state, InputState::Compose) {
            // No prompt up: Esc drops the most recently queued image instead.
            let queued = self.conversation.queued_images().len();
            if queued > 0 {
                self.conversation.dequeue_image(queued - 1);
            }
            return;
        }

        self.input_state = InputState::Compose;
        self.textarea = TextArea::default();
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        Config::set(ConfigKey::Theme, self.theme.name());
        self.bubble_list.set_theme(self.theme);
        self.sync_dependants();
        self.persist_state();
    }

    fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.conversation.messages, self.last_known_width);
        self.scroll
            .set_state(self.bubble_list.len() as u16, self.last_known_height);

        if self.conversation.is_in_flight() {
            self.scroll.last();
        }
    }

    fn input_title(&self) -> String {
        match &self.input_state {
            InputState::Rename(_) => {
                return "Rename session (Enter to save, Esc to cancel)".to_string();
            }
            InputState::AttachImage => {
                return "Path to image (Enter to queue, Esc to cancel)".to_string();
            }
            InputState::Compose => {
                let queued = self.conversation.queued_images().len();
                if self.mode == Mode::Ocr && queued > 0 {
                    return format!("Message Conversa · {queued} image(s) queued");
                }

                return "Message Conversa".to_string();
            }
        }
    }

    fn render_sidebar<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        let sessions = self.store.list_by_mode(self.mode);
        let items = sessions
            .iter()
            .map(|session| {
                let mut title = session.title.to_string();
                if session.just_renamed {
                    // Typing cursor while the rename animation window is up.
                    title.push('▌');
                }

                let style = if self.active.as_deref() == Some(session.id.as_str()) {
                    self.theme.accent_style()
                } else {
                    self.theme.bot_style()
                };

                return ListItem::new(Line::from(Span::styled(title, style)));
            })
            .collect::<Vec<ListItem>>();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.mode.label().to_string());

        frame.render_widget(List::new(items).block(block), rect);
    }

    fn render<B: Backend>(&mut self, frame: &mut Frame<B>) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(frame.size());

        self.render_sidebar(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(vec![Constraint::Min(1), Constraint::Max(4)])
            .split(columns[1]);

        if rows[0].width != self.last_known_width || rows[0].height != self.last_known_height {
            self.set_rect(rows[0]);
        }

        self.bubble_list.render(frame, rows[0], self.scroll.position);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight),
            rows[0].inner(&Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut self.scroll.scrollbar_state,
        );

        if self.conversation.is_in_flight() {
            self.loading.render(frame, rows[1]);
        } else {
            self.textarea.set_block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(self.input_title()),
            );
            frame.render_widget(self.textarea.widget(), rows[1]);
        }
    }
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    shell: &mut Shell<'_>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            shell.render(frame);
        })?;

        while let Ok(event) = rx.try_recv() {
            shell.handle_event(event)?;
        }

        if !crossterm::event::poll(POLL_INTERVAL)? {
            continue;
        }

        match crossterm::event::read()?.into() {
            Input { key: Key::Down, .. } => {
                shell.scroll.down();
            }
            Input { key: Key::Up, .. } => {
                shell.scroll.up();
            }
            Input {
                key: Key::Char('d'),
                ctrl: true,
                ..
            } => {
                shell.scroll.down_page();
            }
            Input {
                key: Key::Char('u'),
                ctrl: true,
                ..
            } => {
                shell.scroll.up_page();
            }
            Input {
                key: Key::Char('c'),
                ctrl: true,
                ..
            } => {
                break;
            }
            Input {
                key: Key::Char('n'),
                ctrl: true,
                ..
            } => {
                if !shell.creating {
                    shell.creating = true;
                    shell.actions.send(Action::CreateSession(shell.mode))?;
                }
            }
            Input {
                key: Key::Char('k'),
                ctrl: true,
                ..
            } => {
                shell.select_adjacent(-1)?;
            }
            Input {
                key: Key::Char('j'),
                ctrl: true,
                ..
            } => {
                shell.select_adjacent(1)?;
            }
            Input {
                key: Key::Char('e'),
                ctrl: true,
                ..
            } => {
                shell.begin_rename();
            }
            Input {
                key: Key::Char('x'),
                ctrl: true,
                ..
            } => {
                if let Some(id) = shell.active.clone() {
                    shell.actions.send(Action::DeleteSession(id))?;
                }
            }
            Input {
                key: Key::Char('o'),
                ctrl: true,
                ..
            } => {
                let next = shell.mode.next();
                shell.switch_mode(next)?;
            }
            Input {
                key: Key::Char('t'),
                ctrl: true,
                ..
            } => {
                shell.toggle_theme();
            }
            Input {
                key: Key::Char('g'),
                ctrl: true,
                ..
            } => {
                shell.begin_attach_image();
            }
            Input { key: Key::Esc, .. } => {
                shell.cancel_input();
            }
            Input {
                key: Key::Enter, ..
            } => {
                shell.submit_input()?;
            }
            input => {
                if !shell.conversation.is_in_flight() {
                    shell.textarea.input(input);
                }
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    disable_raw_mode().unwrap();
    crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture).unwrap();
    crossterm::execute!(io::stdout(), cursor::Show).unwrap();
}

pub async fn start(
    actions: mpsc::UnboundedSender<Action>,
    events: mpsc::UnboundedSender<Event>,
    rx: &mut mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let mut shell = Shell::new(actions, events).await?;
    start_loop(&mut terminal, &mut shell, rx).await?;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    return Ok(());
}
