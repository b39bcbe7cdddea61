use std::path::PathBuf;

use bloombot_core::model::{Conversation, PlantIdentification};
use bloombot_core::HistoryStore;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::event::{AsyncAction, AsyncResult};

/// Which screen is currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Detail,
    Analyzer,
    Chat,
}

/// Screens reachable from the navigation bar, in tab order.
pub const NAV_SCREENS: [Screen; 3] = [Screen::Dashboard, Screen::Analyzer, Screen::Chat];

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard | Screen::Detail => "Dashboard",
            Screen::Analyzer => "Scan Plant",
            Screen::Chat => "AI Expert",
        }
    }

    fn nav_index(&self) -> usize {
        match self {
            Screen::Dashboard | Screen::Detail => 0,
            Screen::Analyzer => 1,
            Screen::Chat => 2,
        }
    }
}

/// Single-line editable text with a byte-offset cursor kept on char boundaries.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    pub text: String,
    pub cursor: usize,
}

impl InputBuffer {
    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.text.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }

    pub fn right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Take the contents, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    /// Shared editing keys. Returns `false` when the key was not an edit.
    fn edit(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Home => self.home(),
            KeyCode::End => self.end(),
            _ => return false,
        }
        true
    }
}

/// Central application state.
pub struct App {
    pub screen: Screen,
    pub should_quit: bool,

    // -- Dashboard / detail --
    pub history: HistoryStore,
    pub selected: usize,
    pub detail_scroll: u16,

    // -- Analyzer --
    pub path_input: InputBuffer,
    pub analyzing: bool,
    pub show_result: bool,

    // -- Chat --
    pub conversation: Conversation,
    pub chat_input: InputBuffer,
    pub chat_epoch: u64,
    /// Lines scrolled up from the bottom of the transcript.
    pub chat_scroll: u16,
    greeting: String,
    fallback: String,

    // -- Splash --
    pub splash_until: std::time::Instant,

    // -- Error toast --
    pub error_message: Option<String>,
    pub error_timer: u8, // ticks remaining
}

impl App {
    pub fn new(greeting: &str, fallback: &str) -> Self {
        Self {
            screen: Screen::Dashboard,
            should_quit: false,

            history: HistoryStore::new(),
            selected: 0,
            detail_scroll: 0,

            path_input: InputBuffer::default(),
            analyzing: false,
            show_result: false,

            conversation: Conversation::with_greeting(greeting),
            chat_input: InputBuffer::default(),
            chat_epoch: 0,
            chat_scroll: 0,
            greeting: greeting.to_string(),
            fallback: fallback.to_string(),

            splash_until: std::time::Instant::now() + std::time::Duration::from_millis(1500),

            error_message: None,
            error_timer: 0,
        }
    }

    /// Process an async result from the worker.
    pub fn handle_result(&mut self, result: AsyncResult) {
        match result {
            AsyncResult::Identified(plant) => {
                self.analyzing = false;
                self.show_result = true;
                self.history.record(*plant);
                self.selected = 0;
            }
            AsyncResult::IdentifyFailed(msg) => {
                self.analyzing = false;
                self.show_error(msg);
            }
            AsyncResult::ChatFragment { epoch, text } if epoch == self.chat_epoch => {
                if self.conversation.append_fragment(&text).is_some() {
                    self.chat_scroll = 0;
                }
            }
            AsyncResult::ChatFinished { epoch } if epoch == self.chat_epoch => {
                self.conversation.finish_reply();
            }
            AsyncResult::ChatFailed { epoch, message } if epoch == self.chat_epoch => {
                tracing::warn!(%message, "chat reply failed");
                self.conversation.interrupt_reply(&self.fallback);
                self.chat_scroll = 0;
            }
            AsyncResult::ChatFragment { .. }
            | AsyncResult::ChatFinished { .. }
            | AsyncResult::ChatFailed { .. } => {
                // From a session the user already left.
            }
        }
    }

    /// Handle a key event. Returns an optional async action to dispatch.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }

        match key.code {
            KeyCode::Tab => {
                let next = (self.screen.nav_index() + 1) % NAV_SCREENS.len();
                return self.switch_screen(NAV_SCREENS[next]);
            }
            KeyCode::BackTab => {
                let idx = self.screen.nav_index();
                let prev = if idx == 0 { NAV_SCREENS.len() - 1 } else { idx - 1 };
                return self.switch_screen(NAV_SCREENS[prev]);
            }
            _ => {}
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard(key),
            Screen::Detail => {
                self.handle_detail(key);
                None
            }
            Screen::Analyzer => self.handle_analyzer(key),
            Screen::Chat => self.handle_chat(key),
        }
    }

    /// Move to `target`, opening or closing the chat session as needed.
    pub fn switch_screen(&mut self, target: Screen) -> Option<AsyncAction> {
        let from = self.screen;
        self.screen = target;

        if from != Screen::Chat && target == Screen::Chat {
            self.chat_epoch += 1;
            self.conversation = Conversation::with_greeting(&self.greeting);
            self.chat_input.clear();
            self.chat_scroll = 0;
            return Some(AsyncAction::OpenChat {
                epoch: self.chat_epoch,
            });
        }
        if from == Screen::Chat && target != Screen::Chat {
            return Some(AsyncAction::CloseChat);
        }
        None
    }

    fn handle_dashboard(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') => {
                self.selected = 0;
                None
            }
            KeyCode::Char('G') => {
                self.selected = self.history.len().saturating_sub(1);
                None
            }
            KeyCode::Enter => {
                if self.selected_plant().is_some() {
                    self.detail_scroll = 0;
                    self.screen = Screen::Detail;
                }
                None
            }
            KeyCode::Char('s') => self.switch_screen(Screen::Analyzer),
            KeyCode::Char('c') => self.switch_screen(Screen::Chat),
            _ => None,
        }
    }

    fn handle_detail(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.screen = Screen::Dashboard;
                self.detail_scroll = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.detail_scroll = self.detail_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.detail_scroll = self.detail_scroll.saturating_sub(1);
            }
            KeyCode::PageDown => self.detail_scroll = self.detail_scroll.saturating_add(20),
            KeyCode::PageUp => self.detail_scroll = self.detail_scroll.saturating_sub(20),
            _ => {}
        }
    }

    fn handle_analyzer(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        match key.code {
            KeyCode::Esc => self.switch_screen(Screen::Dashboard),
            KeyCode::Enter => {
                // Trigger is disabled while a scan is pending.
                if self.analyzing || self.path_input.text.trim().is_empty() {
                    return None;
                }
                self.analyzing = true;
                self.show_result = false;
                Some(AsyncAction::Identify {
                    path: PathBuf::from(self.path_input.text.trim()),
                })
            }
            _ => {
                self.path_input.edit(key);
                None
            }
        }
    }

    fn handle_chat(&mut self, key: KeyEvent) -> Option<AsyncAction> {
        match key.code {
            KeyCode::Esc => self.switch_screen(Screen::Dashboard),
            KeyCode::Enter => self.submit_chat(),
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(10);
                None
            }
            KeyCode::PageDown => {
                self.chat_scroll = self.chat_scroll.saturating_sub(10);
                None
            }
            _ => {
                self.chat_input.edit(key);
                None
            }
        }
    }

    fn submit_chat(&mut self) -> Option<AsyncAction> {
        // Sending is disabled while a reply streams.
        if self.conversation.is_streaming() || self.chat_input.text.trim().is_empty() {
            return None;
        }
        let text = self.chat_input.take();
        if let Err(e) = self.conversation.push_user(&text) {
            self.show_error(e.user_message());
            return None;
        }
        if let Err(e) = self.conversation.begin_reply() {
            self.show_error(e.user_message());
            return None;
        }
        self.chat_scroll = 0;
        Some(AsyncAction::SendChat {
            epoch: self.chat_epoch,
            text,
        })
    }

    fn move_selection(&mut self, delta: i32) {
        let len = self.history.len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected as i32;
        let new = (current + delta).clamp(0, len as i32 - 1);
        self.selected = new as usize;
    }

    pub fn selected_plant(&self) -> Option<&PlantIdentification> {
        self.history.get(self.selected)
    }

    fn show_error(&mut self, msg: String) {
        self.error_message = Some(msg);
        self.error_timer = 100; // ~5s at 50ms tick
    }

    /// Tick the error timer down.
    pub fn tick_error(&mut self) {
        if self.error_timer > 0 {
            self.error_timer -= 1;
            if self.error_timer == 0 {
                self.error_message = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloombot_core::model::{Difficulty, IdentificationPayload, PlantCareProfile, TurnRole};

    const FALLBACK: &str = "root system tangled";

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new("Hello! I'm BloomBot.", FALLBACK)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn plant(name: &str) -> Box<PlantIdentification> {
        Box::new(PlantIdentification::from_payload(
            IdentificationPayload {
                common_name: name.into(),
                scientific_name: "Testus plantus".into(),
                description: "test".into(),
                origin: None,
                difficulty: Difficulty::Easy,
                care: PlantCareProfile {
                    watering: "Weekly".into(),
                    sunlight: "Bright indirect".into(),
                    soil: "Loamy".into(),
                    fertilizer: "Monthly".into(),
                    toxicity: "Non-toxic".into(),
                },
            },
            None,
        ))
    }

    fn open_chat(app: &mut App) -> u64 {
        match app.switch_screen(Screen::Chat) {
            Some(AsyncAction::OpenChat { epoch }) => epoch,
            other => panic!("expected OpenChat, got {other:?}"),
        }
    }

    #[test]
    fn test_initial_state() {
        let app = app();
        assert_eq!(app.screen, Screen::Dashboard);
        assert!(!app.should_quit);
        assert!(app.history.is_empty());
        assert!(!app.analyzing);
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_from_input_screens() {
        let mut app = app();
        app.switch_screen(Screen::Analyzer);
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
        assert!(app.path_input.text.is_empty());
    }

    #[test]
    fn test_tab_cycles_screens() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Tab)), None);
        assert_eq!(app.screen, Screen::Analyzer);

        let action = app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Chat);
        assert!(matches!(action, Some(AsyncAction::OpenChat { epoch: 1 })));

        let action = app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.screen, Screen::Dashboard);
        assert_eq!(action, Some(AsyncAction::CloseChat));

        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.screen, Screen::Chat);
    }

    #[test]
    fn test_identified_result_recorded_newest_first() {
        let mut app = app();
        app.handle_result(AsyncResult::Identified(plant("Fern")));
        app.handle_result(AsyncResult::Identified(plant("Pothos")));
        assert_eq!(app.history.len(), 2);
        assert_eq!(app.selected_plant().unwrap().common_name, "Pothos");
    }

    #[test]
    fn test_history_capped_at_ten() {
        let mut app = app();
        for i in 0..11 {
            app.handle_result(AsyncResult::Identified(plant(&format!("plant-{i}"))));
        }
        assert_eq!(app.history.len(), 10);
        assert_eq!(app.history.latest().unwrap().common_name, "plant-10");
    }

    #[test]
    fn test_selection_navigation() {
        let mut app = app();
        for i in 0..3 {
            app.handle_result(AsyncResult::Identified(plant(&format!("p{i}"))));
        }
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.selected, 2);
        app.handle_key(key(KeyCode::Char('k')));
        assert_eq!(app.selected, 1);
        app.handle_key(key(KeyCode::Char('g')));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_enter_opens_detail_only_with_history() {
        let mut app = app();
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Dashboard);

        app.handle_result(AsyncResult::Identified(plant("Fern")));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.screen, Screen::Detail);

        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.detail_scroll, 1);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.screen, Screen::Dashboard);
    }

    #[test]
    fn test_analyzer_submits_path() {
        let mut app = app();
        app.switch_screen(Screen::Analyzer);
        type_text(&mut app, "photos/pothos.jpg");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Some(AsyncAction::Identify {
                path: PathBuf::from("photos/pothos.jpg")
            })
        );
        assert!(app.analyzing);
    }

    #[test]
    fn test_analyzer_trigger_disabled_while_pending() {
        let mut app = app();
        app.switch_screen(Screen::Analyzer);
        type_text(&mut app, "a.png");
        assert!(app.handle_key(key(KeyCode::Enter)).is_some());
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());

        app.handle_result(AsyncResult::IdentifyFailed("Failed to analyze image.".into()));
        assert!(!app.analyzing);
        assert!(app.error_message.is_some());
        assert!(app.history.is_empty());
        assert!(app.handle_key(key(KeyCode::Enter)).is_some());
    }

    #[test]
    fn test_analyzer_ignores_blank_path() {
        let mut app = app();
        app.switch_screen(Screen::Analyzer);
        type_text(&mut app, "   ");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert!(!app.analyzing);
    }

    #[test]
    fn test_input_buffer_editing() {
        let mut input = InputBuffer::default();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.left();
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.text, "hllo");
        input.end();
        input.backspace();
        assert_eq!(input.text, "hll");
        input.home();
        input.insert('>');
        assert_eq!(input.take(), ">hll");
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_chat_send_begins_reply() {
        let mut app = app();
        let epoch = open_chat(&mut app);
        assert_eq!(app.conversation.len(), 1);

        type_text(&mut app, "How often?");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Some(AsyncAction::SendChat {
                epoch,
                text: "How often?".into()
            })
        );
        assert!(app.chat_input.text.is_empty());
        assert_eq!(app.conversation.len(), 3);
        assert!(app.conversation.is_streaming());
    }

    #[test]
    fn test_chat_fragments_assemble() {
        let mut app = app();
        let epoch = open_chat(&mut app);
        type_text(&mut app, "Water?");
        app.handle_key(key(KeyCode::Enter));

        for text in ["Wat", "er d", "aily."] {
            app.handle_result(AsyncResult::ChatFragment {
                epoch,
                text: text.into(),
            });
        }
        app.handle_result(AsyncResult::ChatFinished { epoch });

        let last = app.conversation.turns().last().unwrap();
        assert_eq!(last.role, TurnRole::Model);
        assert_eq!(last.text, "Water daily.");
        assert!(!app.conversation.is_streaming());
    }

    #[test]
    fn test_chat_send_disabled_while_streaming() {
        let mut app = app();
        open_chat(&mut app);
        type_text(&mut app, "first");
        app.handle_key(key(KeyCode::Enter));
        let turns = app.conversation.len();

        type_text(&mut app, "second");
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert_eq!(app.conversation.len(), turns);
        assert_eq!(app.chat_input.text, "second");
    }

    #[test]
    fn test_chat_failure_keeps_partial() {
        let mut app = app();
        let epoch = open_chat(&mut app);
        type_text(&mut app, "bugs?");
        app.handle_key(key(KeyCode::Enter));
        app.handle_result(AsyncResult::ChatFragment {
            epoch,
            text: "Aph".into(),
        });
        app.handle_result(AsyncResult::ChatFailed {
            epoch,
            message: "stream interrupted".into(),
        });

        let turns = app.conversation.turns();
        assert_eq!(turns[turns.len() - 2].text, "Aph");
        assert_eq!(turns[turns.len() - 1].text, FALLBACK);
        assert!(!app.conversation.is_streaming());

        type_text(&mut app, "again");
        assert!(app.handle_key(key(KeyCode::Enter)).is_some());
    }

    #[test]
    fn test_stale_fragments_ignored_after_reentering_chat() {
        let mut app = app();
        let old = open_chat(&mut app);
        type_text(&mut app, "first");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.handle_key(key(KeyCode::Esc)), Some(AsyncAction::CloseChat));
        let new = open_chat(&mut app);
        assert_ne!(old, new);
        type_text(&mut app, "second");
        app.handle_key(key(KeyCode::Enter));

        app.handle_result(AsyncResult::ChatFragment {
            epoch: old,
            text: "stale".into(),
        });
        app.handle_result(AsyncResult::ChatFragment {
            epoch: new,
            text: "fresh".into(),
        });
        assert_eq!(app.conversation.turns().last().unwrap().text, "fresh");
        assert_eq!(app.conversation.len(), 3);
    }

    #[test]
    fn test_error_toast_timer() {
        let mut app = app();
        app.analyzing = true;
        app.handle_result(AsyncResult::IdentifyFailed("test error".into()));
        assert!(!app.analyzing);
        assert!(app.error_message.is_some());
        assert_eq!(app.error_timer, 100);

        for _ in 0..99 {
            app.tick_error();
        }
        assert!(app.error_message.is_some());

        app.tick_error();
        assert!(app.error_message.is_none());
        assert_eq!(app.error_timer, 0);
    }
}
