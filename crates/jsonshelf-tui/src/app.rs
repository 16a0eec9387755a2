//! Application state for the jsonshelf TUI.

use jsonshelf_core::projection::{self, RecordDetail, TableView};
use jsonshelf_core::{IngestError, IngestReport, JsonForm, RecordView, SyncPhase};
use jsonshelf_protocol::{Record, RecordId, User};
use log::{debug, info};
use ratatui::widgets::TableState;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long success and error messages stay on the status line.
const STATUS_TTL: Duration = Duration::from_secs(4);
const IDLE_STATUS: &str = "ready";

/// Top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// No user signed in.
    SignIn,
    /// JSON entry form.
    Entry,
    /// Searchable record table.
    Records,
}

/// Tone of the status line message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Overlay drawn above the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Full JSON of one record.
    Detail(RecordDetail),
    /// Blocking yes/no prompt before a delete is issued.
    ConfirmDelete(RecordId),
}

/// Multi-line text editor over the entry form.
///
/// The cursor is a byte offset into the form text and always sits on a char boundary.
#[derive(Debug, Default)]
pub struct Editor {
    pub form: JsonForm,
    cursor: usize,
}

impl Editor {
    pub fn text(&self) -> &str {
        &self.form.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_char(&mut self, ch: char) {
        self.sync_cursor();
        self.form.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        self.sync_cursor();
        if let Some(prev) = self.form.text[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
            self.form.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.sync_cursor();
        if let Some(prev) = self.form.text[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        self.sync_cursor();
        if let Some(next) = self.form.text[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    pub fn move_line_start(&mut self) {
        self.sync_cursor();
        self.cursor = self.line_start(self.cursor);
    }

    pub fn move_line_end(&mut self) {
        self.sync_cursor();
        self.cursor = self.line_end(self.cursor);
    }

    pub fn move_up(&mut self) {
        self.sync_cursor();
        let start = self.line_start(self.cursor);
        if start == 0 {
            return;
        }
        let column = self.form.text[start..self.cursor].chars().count();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.offset_for_column(prev_start, start - 1, column);
    }

    pub fn move_down(&mut self) {
        self.sync_cursor();
        let end = self.line_end(self.cursor);
        if end == self.form.text.len() {
            return;
        }
        let column = self.form.text[self.line_start(self.cursor)..self.cursor]
            .chars()
            .count();
        let next_start = end + 1;
        let next_end = self.line_end(next_start);
        self.cursor = self.offset_for_column(next_start, next_end, column);
    }

    /// Zero-based (line, column) of the cursor, column counted in chars.
    pub fn cursor_position(&self) -> (usize, usize) {
        let cursor = self.cursor.min(self.form.text.len());
        let before = &self.form.text[..cursor];
        let line = before.matches('\n').count();
        let column = before[self.line_start(cursor)..].chars().count();
        (line, column)
    }

    /// Move the cursor to the end after the text was replaced wholesale.
    pub fn cursor_to_end(&mut self) {
        self.cursor = self.form.text.len();
    }

    fn sync_cursor(&mut self) {
        if self.cursor > self.form.text.len() || !self.form.text.is_char_boundary(self.cursor) {
            self.cursor = self.form.text.len();
        }
    }

    fn line_start(&self, pos: usize) -> usize {
        self.form.text[..pos].rfind('\n').map_or(0, |idx| idx + 1)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.form.text[pos..]
            .find('\n')
            .map_or(self.form.text.len(), |idx| pos + idx)
    }

    fn offset_for_column(&self, start: usize, end: usize, column: usize) -> usize {
        self.form.text[start..end]
            .char_indices()
            .nth(column)
            .map_or(end, |(idx, _)| start + idx)
    }
}

/// Top-level application state for the TUI.
pub struct App {
    pub screen: Screen,
    /// Signed-in user, if any.
    pub user: Option<User>,
    /// User id typed on the sign-in screen.
    pub sign_in_input: String,
    pub editor: Editor,
    /// Latest synchronized record view.
    pub view: Arc<RecordView>,
    /// Search term on the records screen.
    pub search: String,
    /// Table derived from `view` and `search`.
    pub table: TableView,
    pub table_state: TableState,
    pub modal: Option<Modal>,
    pub detail_scroll: u16,
    pub detail_max_scroll: u16,
    pub status: String,
    pub status_kind: StatusKind,
    status_at: Option<Instant>,
    pub preview_max_chars: usize,
}

impl App {
    pub fn new(view: Arc<RecordView>, preview_max_chars: usize) -> Self {
        let mut app = Self {
            screen: Screen::SignIn,
            user: None,
            sign_in_input: String::new(),
            editor: Editor::default(),
            view,
            search: String::new(),
            table: TableView::default(),
            table_state: TableState::default(),
            modal: None,
            detail_scroll: 0,
            detail_max_scroll: 0,
            status: IDLE_STATUS.to_string(),
            status_kind: StatusKind::Info,
            status_at: None,
            preview_max_chars,
        };
        app.refresh_table();
        app
    }

    /// React to a sign-in or sign-out.
    pub fn set_user(&mut self, user: Option<User>) {
        match (&user, self.screen) {
            (Some(user), Screen::SignIn) => {
                info!("user signed in (user_id={})", user.id);
                self.screen = Screen::Entry;
            }
            (None, _) => {
                self.screen = Screen::SignIn;
                self.modal = None;
                self.search.clear();
                self.sign_in_input.clear();
            }
            _ => {}
        }
        self.user = user;
    }

    /// Replace the record view and rebuild the table.
    pub fn apply_view(&mut self, view: Arc<RecordView>) {
        debug!(
            "applying record view (version={}, phase={:?}, records={})",
            view.version,
            view.phase,
            view.records.len()
        );
        let newly_errored = view.phase == SyncPhase::Errored && self.view.phase != SyncPhase::Errored;
        self.view = view;
        if newly_errored {
            let message = self.view.error.clone().unwrap_or_default();
            self.push_error(format!("Error loading data: {message}"));
        }
        self.refresh_table();
    }

    pub fn refresh_table(&mut self) {
        self.table = projection::table(&self.view.records, &self.search);
        let len = self.table.rows.len();
        let selected = match (len, self.table_state.selected()) {
            (0, _) => None,
            (_, Some(idx)) => Some(idx.min(len - 1)),
            (_, None) => Some(0),
        };
        self.table_state.select(selected);
        if let Some(Modal::ConfirmDelete(id)) = &self.modal
            && !self.view.records.iter().any(|record| &record.id == id)
        {
            self.modal = None;
        }
    }

    pub fn search_push(&mut self, ch: char) {
        self.search.push(ch);
        self.table_state.select(Some(0));
        self.refresh_table();
    }

    pub fn search_pop(&mut self) {
        self.search.pop();
        self.table_state.select(Some(0));
        self.refresh_table();
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.table_state.select(Some(0));
        self.refresh_table();
    }

    pub fn select_next(&mut self) {
        let len = self.table.rows.len();
        if let Some(idx) = self.table_state.selected()
            && idx + 1 < len
        {
            self.table_state.select(Some(idx + 1));
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(idx) = self.table_state.selected() {
            self.table_state.select(Some(idx.saturating_sub(1)));
        }
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let row = self.table.rows.get(self.table_state.selected()?)?;
        self.view.records.iter().find(|record| record.id == row.id)
    }

    /// Truncated pretty JSON of the selected record.
    pub fn selected_preview(&self) -> Option<String> {
        self.selected_record()
            .map(|record| projection::preview(&record.payload, self.preview_max_chars))
    }

    pub fn open_detail(&mut self) {
        if let Some(record) = self.selected_record() {
            let detail = projection::detail(record);
            self.modal = Some(Modal::Detail(detail));
            self.detail_scroll = 0;
            self.detail_max_scroll = 0;
        }
    }

    /// Ask for confirmation before deleting the record in the detail view,
    /// or the selected row when no detail is open.
    pub fn request_delete(&mut self) {
        let id = match &self.modal {
            Some(Modal::Detail(detail)) => Some(detail.id.clone()),
            _ => self.selected_record().map(|record| record.id.clone()),
        };
        if let Some(id) = id {
            self.modal = Some(Modal::ConfirmDelete(id));
        }
    }

    /// Take the id awaiting confirmation, closing the prompt.
    pub fn confirm_delete(&mut self) -> Option<RecordId> {
        match self.modal.take() {
            Some(Modal::ConfirmDelete(id)) => Some(id),
            other => {
                self.modal = other;
                None
            }
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn update_detail_scroll_bounds(&mut self, max_scroll: u16) {
        self.detail_max_scroll = max_scroll;
        self.detail_scroll = self.detail_scroll.min(max_scroll);
    }

    pub fn detail_scroll_up(&mut self, lines: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(lines);
    }

    pub fn detail_scroll_down(&mut self, lines: u16) {
        self.detail_scroll = self
            .detail_scroll
            .saturating_add(lines)
            .min(self.detail_max_scroll);
    }

    /// Switch between the entry form and the record table.
    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Entry => Screen::Records,
            Screen::Records => Screen::Entry,
            Screen::SignIn => Screen::SignIn,
        };
    }

    /// Apply the outcome of a submission to the form and status line.
    pub fn finish_submit(&mut self, result: Result<IngestReport, IngestError>) {
        self.editor.form.finish_submit(&result);
        if result.is_ok() {
            self.editor.cursor_to_end();
        }
        match result {
            Ok(report) => self.push_success(report.summary()),
            Err(err) => self.push_error(err.to_string()),
        }
    }

    pub fn format_input(&mut self) {
        match self.editor.form.format() {
            Ok(()) => {
                self.editor.cursor_to_end();
                self.push_success("JSON formatted successfully!");
            }
            Err(_) => self.push_error("Invalid JSON format"),
        }
    }

    pub fn load_sample(&mut self) {
        self.editor.form.load_sample();
        self.editor.cursor_to_end();
    }

    /// Title and hint shown instead of the table, if the table has nothing to show.
    pub fn empty_state(&self) -> Option<(String, &'static str)> {
        match self.view.phase {
            SyncPhase::Subscribing => Some(("Loading data...".to_string(), "")),
            SyncPhase::Idle => Some(("Please sign in to view data".to_string(), "")),
            SyncPhase::Errored => Some((
                format!(
                    "Error loading data: {}",
                    self.view.error.as_deref().unwrap_or("unknown error")
                ),
                "",
            )),
            SyncPhase::Live if self.table.is_empty() => Some((
                "No records found".to_string(),
                projection::empty_message(&self.search),
            )),
            SyncPhase::Live => None,
        }
    }

    pub fn record_count_label(&self) -> String {
        format!("{} records found", self.table.rows.len())
    }

    pub fn push_status(&mut self, status: impl Into<String>) {
        self.set_status(status.into(), StatusKind::Info);
    }

    pub fn push_success(&mut self, status: impl Into<String>) {
        self.set_status(status.into(), StatusKind::Success);
    }

    pub fn push_error(&mut self, status: impl Into<String>) {
        self.set_status(status.into(), StatusKind::Error);
    }

    /// Clear success and error messages once they have been shown long enough.
    pub fn expire_status(&mut self, now: Instant) {
        if let Some(at) = self.status_at
            && now.duration_since(at) >= STATUS_TTL
        {
            self.status = IDLE_STATUS.to_string();
            self.status_kind = StatusKind::Info;
            self.status_at = None;
        }
    }

    fn set_status(&mut self, status: String, kind: StatusKind) {
        self.status = status;
        self.status_kind = kind;
        self.status_at = match kind {
            StatusKind::Info => None,
            StatusKind::Success | StatusKind::Error => Some(Instant::now()),
        };
    }
}
