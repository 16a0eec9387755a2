//! TUI event types for input and background results.

use crossterm::event::KeyEvent;
use jsonshelf_core::{IngestError, IngestReport, RecordView};
use jsonshelf_protocol::User;
use std::sync::Arc;

/// Application event emitted by input handlers and background tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event.
    Input(KeyEvent),
    /// Periodic tick event.
    Tick,
    /// A new synchronized record view was published.
    View(Arc<RecordView>),
    /// The signed-in user changed.
    User(Option<User>),
    /// A JSON submission finished.
    Submitted(Result<IngestReport, IngestError>),
    /// A background action succeeded.
    ActionDone(String),
    /// A background action failed.
    ActionError(String),
    /// Mouse wheel scroll.
    Scroll(i16),
}
