//! Library entry point for the jsonshelf TUI.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against a pre-configured [`DocumentStore`] and identity.

mod app;
mod client;
mod event;
mod ui;

use anyhow::anyhow;
use app::{App, Modal, Screen};
use client::ShelfClient;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyEventKind, KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use event::AppEvent;
use jsonshelf_core::{IngestError, LocalIdentity, RecordView, ShelfCoreError};
use jsonshelf_protocol::{DEFAULT_COLLECTION, OwnerId, RecordId, User};
use jsonshelf_store::DocumentStore;
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

const DETAIL_PAGE: u16 = 10;
const ENV_USER: &str = "USER";
const ENV_USERNAME: &str = "USERNAME";

/// Configuration for a jsonshelf TUI session.
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Collection records are read from and written to.
    pub collection: String,
    /// Maximum characters shown in the record preview.
    pub preview_max_chars: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            preview_max_chars: 100,
        }
    }
}

/// Launch the jsonshelf TUI against `store`.
///
/// The caller is responsible for initializing logging before calling `run`;
/// anything written to stderr while the alternate screen is active corrupts the display.
///
/// # Errors
/// Returns an error if terminal setup or the event loop fails.
pub async fn run(
    store: Arc<dyn DocumentStore>,
    identity: Arc<LocalIdentity>,
    config: TuiConfig,
) -> anyhow::Result<()> {
    info!(
        "starting tui (collection={}, preview_max_chars={})",
        config.collection, config.preview_max_chars
    );
    let client = Arc::new(ShelfClient::new(store, identity, &config.collection));

    let mut views = client.views();
    let mut users = client.users();
    let mut app = App::new(views.borrow_and_update().clone(), config.preview_max_chars);
    app.set_user(users.borrow_and_update().clone());
    if app.user.is_none() {
        app.sign_in_input = resolve_user_name();
    }

    let mut terminal = setup_terminal()?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());
    spawn_view_forwarder(views, tx.clone());
    spawn_user_forwarder(users, tx.clone());

    let result: anyhow::Result<()> = async {
        loop {
            terminal.draw(|frame| ui::draw(frame, &mut app))?;
            let event = rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("event channel closed unexpectedly"))?;
            if handle_app_event(event, &client, &mut app, tx.clone()).await? {
                break;
            }
        }
        Ok(())
    }
    .await;

    restore_terminal(&mut terminal)?;
    result
}

/// Dispatch a UI event and return true when the app should exit.
async fn handle_app_event(
    event: AppEvent,
    client: &Arc<ShelfClient>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    match event {
        AppEvent::Input(key) => return handle_input(key, client, app, sender).await,
        AppEvent::Tick => app.expire_status(Instant::now()),
        AppEvent::View(view) => app.apply_view(view),
        AppEvent::User(user) => app.set_user(user),
        AppEvent::Submitted(result) => app.finish_submit(result),
        AppEvent::ActionDone(message) => app.push_success(message),
        AppEvent::ActionError(message) => app.push_error(message),
        AppEvent::Scroll(delta) => {
            if matches!(app.modal, Some(Modal::Detail(_))) {
                if delta < 0 {
                    app.detail_scroll_up(delta.unsigned_abs());
                } else {
                    app.detail_scroll_down(delta.unsigned_abs());
                }
            } else if app.screen == Screen::Records && app.modal.is_none() {
                if delta < 0 {
                    app.select_prev();
                } else if delta > 0 {
                    app.select_next();
                }
            }
        }
    }
    Ok(false)
}

/// Handle keyboard input and dispatch actions.
async fn handle_input(
    key: KeyEvent,
    client: &Arc<ShelfClient>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) -> anyhow::Result<bool> {
    if key.kind != KeyEventKind::Press {
        return Ok(false);
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    match app.modal.clone() {
        Some(Modal::ConfirmDelete(_)) => {
            handle_confirm_input(key, client, app, sender);
            return Ok(false);
        }
        Some(Modal::Detail(_)) => {
            handle_detail_input(key, app);
            return Ok(false);
        }
        None => {}
    }

    if app.screen == Screen::SignIn {
        handle_sign_in_input(key, client, app);
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('o') if ctrl => sign_out(client, app).await,
        KeyCode::Tab => app.toggle_screen(),
        _ if app.screen == Screen::Entry => handle_entry_input(key, client, app, sender),
        _ => handle_records_input(key, app),
    }
    Ok(false)
}

fn handle_sign_in_input(key: KeyEvent, client: &Arc<ShelfClient>, app: &mut App) {
    match key.code {
        KeyCode::Enter => {
            let user_id = app.sign_in_input.trim().to_string();
            if user_id.is_empty() {
                app.push_error("Enter a user id to sign in");
                return;
            }
            info!("signing in (user_id={})", user_id);
            client.sign_in(&user_id);
        }
        KeyCode::Esc => app.sign_in_input.clear(),
        KeyCode::Backspace => {
            app.sign_in_input.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.sign_in_input.push(ch);
        }
        _ => {}
    }
}

/// Handle keyboard input in the JSON editor.
fn handle_entry_input(
    key: KeyEvent,
    client: &Arc<ShelfClient>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('s') if ctrl => submit_form(client, app, sender),
        _ if app.editor.form.is_submitting() => {}
        KeyCode::Char('f') if ctrl => app.format_input(),
        KeyCode::Char('l') if ctrl => app.load_sample(),
        KeyCode::Enter => app.editor.insert_char('\n'),
        KeyCode::Backspace => app.editor.backspace(),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Home => app.editor.move_line_start(),
        KeyCode::End => app.editor.move_line_end(),
        KeyCode::Char(ch) if !ctrl => app.editor.insert_char(ch),
        _ => {}
    }
}

/// Handle keyboard input on the record table.
fn handle_records_input(key: KeyEvent, app: &mut App) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('d') if ctrl => app.request_delete(),
        KeyCode::Delete => app.request_delete(),
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),
        KeyCode::Enter => app.open_detail(),
        KeyCode::Esc => app.clear_search(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(ch) if !ctrl => app.search_push(ch),
        _ => {}
    }
}

fn handle_detail_input(key: KeyEvent, app: &mut App) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => app.close_modal(),
        KeyCode::Char('d') if ctrl => app.request_delete(),
        KeyCode::Delete => app.request_delete(),
        KeyCode::Up => app.detail_scroll_up(1),
        KeyCode::Down => app.detail_scroll_down(1),
        KeyCode::PageUp => app.detail_scroll_up(DETAIL_PAGE),
        KeyCode::PageDown => app.detail_scroll_down(DETAIL_PAGE),
        KeyCode::Home => app.detail_scroll_up(u16::MAX),
        KeyCode::End => app.detail_scroll_down(u16::MAX),
        _ => {}
    }
}

/// Handle the yes/no answer to a pending delete.
fn handle_confirm_input(
    key: KeyEvent,
    client: &Arc<ShelfClient>,
    app: &mut App,
    sender: mpsc::Sender<AppEvent>,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            if let Some(id) = app.confirm_delete() {
                app.push_status("deleting...");
                spawn_delete(client.clone(), id, sender);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            debug!("delete cancelled");
            app.close_modal();
        }
        _ => {}
    }
}

/// Start a submission of the editor text for the signed-in user.
fn submit_form(client: &Arc<ShelfClient>, app: &mut App, sender: mpsc::Sender<AppEvent>) {
    if app.editor.form.is_submitting() {
        return;
    }
    let Some(owner_id) = client.current_owner() else {
        app.push_error(ShelfCoreError::NoSession.to_string());
        return;
    };
    let Some(text) = app.editor.form.begin_submit() else {
        app.push_error(IngestError::EmptyInput.to_string());
        return;
    };
    app.push_status("saving...");
    spawn_submit(client.clone(), text, owner_id, sender);
}

async fn sign_out(client: &Arc<ShelfClient>, app: &mut App) {
    info!("signing out");
    if let Err(err) = client.sign_out().await {
        warn!("sign out failed (error={})", err);
        app.push_error(format!("sign out failed: {err}"));
    }
}

/// Spawn a task that ingests `text` and reports the outcome.
fn spawn_submit(
    client: Arc<ShelfClient>,
    text: String,
    owner_id: OwnerId,
    sender: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        let result = client.submit(&text, &owner_id).await;
        if let Err(err) = &result {
            debug!("submission rejected (error={})", err);
        }
        let _ = sender.send(AppEvent::Submitted(result)).await;
    });
}

/// Spawn a task that deletes one record.
fn spawn_delete(client: Arc<ShelfClient>, id: RecordId, sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let event = match client.delete(&id).await {
            Ok(()) => AppEvent::ActionDone("Record deleted successfully".to_string()),
            Err(err) => AppEvent::ActionError(err.to_string()),
        };
        let _ = sender.send(event).await;
    });
}

/// Forward every published record view into the event loop.
fn spawn_view_forwarder(
    mut views: watch::Receiver<Arc<RecordView>>,
    sender: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if sender.send(AppEvent::View(view)).await.is_err() {
                break;
            }
        }
    });
}

/// Forward sign-in and sign-out into the event loop.
fn spawn_user_forwarder(
    mut users: watch::Receiver<Option<User>>,
    sender: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        while users.changed().await.is_ok() {
            let user = users.borrow_and_update().clone();
            if sender.send(AppEvent::User(user)).await.is_err() {
                break;
            }
        }
    });
}

/// Spawn a task to poll for input events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if matches!(crossterm::event::poll(Duration::from_millis(30)), Ok(true)) {
                while matches!(crossterm::event::poll(Duration::from_millis(0)), Ok(true)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    let sent = match event {
                        CrosstermEvent::Key(key) => sender.send(AppEvent::Input(key)).await,
                        CrosstermEvent::Mouse(mouse) => match mouse.kind {
                            MouseEventKind::ScrollUp => {
                                sender.send(AppEvent::Scroll(-MOUSE_SCROLL_LINES)).await
                            }
                            MouseEventKind::ScrollDown => {
                                sender.send(AppEvent::Scroll(MOUSE_SCROLL_LINES)).await
                            }
                            _ => Ok(()),
                        },
                        _ => Ok(()),
                    };
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

/// Spawn a periodic tick event generator.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).await.is_err() {
                break;
            }
        }
    });
}

/// Login name of the OS user, offered as the default user id.
fn resolve_user_name() -> String {
    std::env::var(ENV_USER)
        .or_else(|_| std::env::var(ENV_USERNAME))
        .unwrap_or_default()
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonshelf_store::MemoryDocumentStore;
    use pretty_assertions::assert_eq;

    struct Harness {
        client: Arc<ShelfClient>,
        app: App,
        tx: mpsc::Sender<AppEvent>,
        rx: mpsc::Receiver<AppEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(MemoryDocumentStore::new());
            let identity = Arc::new(LocalIdentity::signed_out());
            let client = Arc::new(ShelfClient::new(store, identity, DEFAULT_COLLECTION));
            let (tx, rx) = mpsc::channel(64);
            spawn_view_forwarder(client.views(), tx.clone());
            spawn_user_forwarder(client.users(), tx.clone());
            let view = client.views().borrow().clone();
            Self {
                app: App::new(view, 100),
                client,
                tx,
                rx,
            }
        }

        async fn key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let event = AppEvent::Input(KeyEvent::new(code, modifiers));
            handle_app_event(event, &self.client, &mut self.app, self.tx.clone())
                .await
                .expect("handle key")
        }

        async fn press(&mut self, code: KeyCode) {
            self.key(code, KeyModifiers::NONE).await;
        }

        async fn ctrl(&mut self, ch: char) {
            self.key(KeyCode::Char(ch), KeyModifiers::CONTROL).await;
        }

        async fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch)).await;
            }
        }

        async fn pump_until(&mut self, mut predicate: impl FnMut(&App) -> bool) {
            while !predicate(&self.app) {
                let event = tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
                    .await
                    .expect("event in time")
                    .expect("event channel open");
                handle_app_event(event, &self.client, &mut self.app, self.tx.clone())
                    .await
                    .expect("handle event");
            }
        }

        async fn sign_in(&mut self, user_id: &str) {
            self.type_text(user_id).await;
            self.press(KeyCode::Enter).await;
            self.pump_until(|app| app.screen == Screen::Entry).await;
        }
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let mut harness = Harness::new();
        assert!(
            harness
                .key(KeyCode::Char('c'), KeyModifiers::CONTROL)
                .await
        );
    }

    #[tokio::test]
    async fn blank_sign_in_is_rejected() {
        let mut harness = Harness::new();
        harness.type_text("   ").await;
        harness.press(KeyCode::Enter).await;
        assert_eq!(harness.app.screen, Screen::SignIn);
        assert!(harness.client.current_owner().is_none());
    }

    #[tokio::test]
    async fn typed_json_is_saved_and_listed() {
        let mut harness = Harness::new();
        harness.sign_in("u1").await;

        harness.type_text(r#"[{"a": 1}, {"a": 2}]"#).await;
        harness.ctrl('s').await;
        assert!(harness.app.editor.form.is_submitting());
        harness
            .pump_until(|app| app.status == "Successfully saved 2 records!")
            .await;
        assert_eq!(harness.app.editor.text(), "");

        harness.pump_until(|app| app.table.rows.len() == 2).await;
        assert_eq!(harness.app.table.columns, vec!["a"]);
    }

    #[tokio::test]
    async fn malformed_json_keeps_the_text() {
        let mut harness = Harness::new();
        harness.sign_in("u1").await;

        harness.type_text("{oops").await;
        harness.ctrl('f').await;
        assert_eq!(harness.app.status, "Invalid JSON format");
        harness.ctrl('s').await;
        harness
            .pump_until(|app| !app.editor.form.is_submitting())
            .await;
        assert!(harness.app.status.starts_with("Invalid JSON format."));
        assert_eq!(harness.app.editor.text(), "{oops");
    }

    #[tokio::test]
    async fn delete_goes_through_confirmation() {
        let mut harness = Harness::new();
        harness.sign_in("u1").await;
        harness.ctrl('l').await;
        harness.ctrl('s').await;
        harness.pump_until(|app| app.table.rows.len() == 3).await;

        harness.press(KeyCode::Tab).await;
        assert_eq!(harness.app.screen, Screen::Records);
        harness.type_text("data science").await;
        assert_eq!(harness.app.table.rows.len(), 1);

        harness.press(KeyCode::Delete).await;
        assert!(matches!(harness.app.modal, Some(Modal::ConfirmDelete(_))));
        harness.press(KeyCode::Char('n')).await;
        assert_eq!(harness.app.modal, None);

        harness.press(KeyCode::Enter).await;
        assert!(matches!(harness.app.modal, Some(Modal::Detail(_))));
        harness.press(KeyCode::Delete).await;
        harness.press(KeyCode::Char('y')).await;
        harness
            .pump_until(|app| app.status == "Record deleted successfully")
            .await;
        harness.pump_until(|app| app.view.records.len() == 2).await;
        assert!(harness.app.table.is_empty());

        harness.press(KeyCode::Esc).await;
        assert_eq!(harness.app.table.rows.len(), 2);
    }

    #[tokio::test]
    async fn sign_out_returns_to_sign_in() {
        let mut harness = Harness::new();
        harness.sign_in("u1").await;
        harness.ctrl('o').await;
        harness.pump_until(|app| app.screen == Screen::SignIn).await;
        assert!(harness.client.current_owner().is_none());
    }
}
