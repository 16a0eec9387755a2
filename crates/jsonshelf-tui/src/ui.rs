//! Rendering routines for the jsonshelf TUI.

use crate::app::{App, Modal, Screen, StatusKind};
use jsonshelf_core::RecordDetail;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation,
    ScrollbarState, Table, Wrap,
};

const PRIMARY: Color = Color::Rgb(236, 91, 43); // #EC5B2B
const SECONDARY: Color = Color::Rgb(238, 121, 72); // #EE7948
const TEXT: Color = Color::Rgb(238, 238, 238); // #eeeeee
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128); // #808080
const BORDER: Color = Color::Rgb(60, 60, 60); // #3c3c3c
const BORDER_ACTIVE: Color = Color::Rgb(238, 121, 72); // #EE7948
const SUCCESS: Color = Color::Rgb(120, 220, 140);
const ERROR: Color = Color::Rgb(255, 110, 110);
const MODAL_BG: Color = Color::Rgb(20, 20, 20);

const HEADER_HEIGHT: u16 = 3;
const PREVIEW_HEIGHT: u16 = 8;
const CREATED_WIDTH: u16 = 14;

const EDITOR_PLACEHOLDER: &str =
    "Enter your JSON data here... (single object or array of objects)";
const SEARCH_PLACEHOLDER: &str = "Search in JSON data...";

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT), // header bar
            Constraint::Min(0),                // screen body
            Constraint::Length(1),             // status bar
        ])
        .split(area);

    draw_header(frame, app, root[0]);
    match app.screen {
        Screen::SignIn => draw_sign_in(frame, app, root[1]),
        Screen::Entry => draw_entry(frame, app, root[1]),
        Screen::Records => draw_records(frame, app, root[1]),
    }
    draw_status_bar(frame, app, root[2]);

    match app.modal.clone() {
        Some(Modal::Detail(detail)) => draw_detail(frame, app, &detail, area),
        Some(Modal::ConfirmDelete(_)) => draw_confirm_delete(frame, area),
        None => {}
    }
}

/// Title, screen tabs, and the signed-in user.
fn draw_header(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let tab = |label: &'static str, screen: Screen| {
        if app.screen == screen {
            Span::styled(
                format!(" {label} "),
                Style::default()
                    .fg(Color::Rgb(10, 10, 10))
                    .bg(PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(TEXT_MUTED))
        }
    };

    let mut left = vec![
        Span::styled(
            " jsonshelf ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    if app.user.is_some() {
        left.push(tab("Add Data", Screen::Entry));
        left.push(Span::raw(" "));
        left.push(tab("View Data", Screen::Records));
    }

    let right = match &app.user {
        Some(user) => Line::from(vec![
            Span::styled(user.display_name().to_string(), Style::default().fg(TEXT)),
            Span::styled("  Ctrl+O", Style::default().fg(TEXT_MUTED)),
            Span::styled(" sign out ", Style::default().fg(BORDER)),
        ]),
        None => Line::from(Span::styled("signed out ", Style::default().fg(TEXT_MUTED))),
    };

    let right_len = right.width() as u16;
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right_len)])
        .split(inner);
    frame.render_widget(Paragraph::new(Line::from(left)), cols[0]);
    frame.render_widget(Paragraph::new(right), cols[1]);
}

fn draw_sign_in(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let panel = centered_rect(60, 7, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(
            " Sign in ",
            Style::default().fg(SECONDARY).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(panel);

    let input = if app.sign_in_input.is_empty() {
        Span::styled("user id", Style::default().fg(TEXT_MUTED))
    } else {
        Span::styled(app.sign_in_input.as_str(), Style::default().fg(TEXT))
    };
    let lines = vec![
        Line::from(Span::styled(
            " Please sign in to view data",
            Style::default().fg(TEXT),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ", Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)),
            input,
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " Enter to sign in",
            Style::default().fg(TEXT_MUTED),
        )),
    ];

    frame.render_widget(block, panel);
    frame.render_widget(Paragraph::new(lines), inner);
    frame.set_cursor_position((
        inner.x + 2 + app.sign_in_input.chars().count() as u16,
        inner.y + 2,
    ));
}

/// Draw the JSON editor with its placeholder and cursor.
fn draw_entry(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let submitting = app.editor.form.is_submitting();
    let title = if submitting {
        " JSON Data (saving...) "
    } else {
        " JSON Data "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if submitting { BORDER } else { BORDER_ACTIVE }))
        .title(Span::styled(title, Style::default().fg(SECONDARY)));
    let inner = block.inner(area);

    let (line, column) = app.editor.cursor_position();
    let scroll = (line as u16).saturating_sub(inner.height.saturating_sub(1));

    let paragraph = if app.editor.text().is_empty() {
        Paragraph::new(Line::from(Span::styled(
            EDITOR_PLACEHOLDER,
            Style::default().fg(TEXT_MUTED),
        )))
    } else {
        let lines: Vec<Line<'_>> = app
            .editor
            .text()
            .split('\n')
            .map(|text| Line::from(Span::styled(text, Style::default().fg(TEXT))))
            .collect();
        Paragraph::new(lines).scroll((scroll, 0))
    };

    frame.render_widget(block, area);
    frame.render_widget(paragraph, inner);
    if !submitting && inner.width > 0 && inner.height > 0 {
        let x = inner.x + (column as u16).min(inner.width - 1);
        let y = inner.y + (line as u16).saturating_sub(scroll);
        frame.set_cursor_position((x, y));
    }
}

/// Search box, record count, table, and preview of the selected row.
fn draw_records(frame: &mut Frame<'_>, app: &mut App, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // search
            Constraint::Min(0),                 // table
            Constraint::Length(PREVIEW_HEIGHT), // preview
        ])
        .split(area);

    draw_search(frame, app, parts[0]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(
            format!(" {} ", app.record_count_label()),
            Style::default().fg(TEXT_MUTED),
        ));

    if let Some((title, hint)) = app.empty_state() {
        let color = if title.starts_with("Error") { ERROR } else { TEXT };
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(hint, Style::default().fg(TEXT_MUTED))),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(ratatui::layout::Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(paragraph, parts[1]);
    } else {
        draw_table(frame, app, block, parts[1]);
    }

    draw_preview(frame, app, parts[2]);
}

fn draw_search(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(" Search ", Style::default().fg(SECONDARY)));
    let inner = block.inner(area);

    let prompt_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let line = if app.search.is_empty() {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(SEARCH_PLACEHOLDER, Style::default().fg(TEXT_MUTED)),
        ])
    } else {
        Line::from(vec![
            Span::styled(" ", prompt_style),
            Span::styled(app.search.as_str(), Style::default().fg(TEXT)),
        ])
    };

    frame.render_widget(block, area);
    frame.render_widget(Paragraph::new(line), inner);
    if app.modal.is_none() {
        frame.set_cursor_position((inner.x + 2 + app.search.chars().count() as u16, inner.y));
    }
}

fn draw_table(frame: &mut Frame<'_>, app: &mut App, block: Block<'_>, area: Rect) {
    let header_style = Style::default().fg(TEXT_MUTED).add_modifier(Modifier::BOLD);
    let header = Row::new(
        std::iter::once("Created")
            .chain(app.table.columns.iter().map(String::as_str))
            .map(|label| Cell::from(label.to_string()).style(header_style)),
    )
    .bottom_margin(1);

    let rows = app.table.rows.iter().map(|row| {
        Row::new(
            std::iter::once(Cell::from(row.created.clone()).style(Style::default().fg(TEXT_MUTED)))
                .chain(
                    row.cells
                        .iter()
                        .map(|cell| Cell::from(single_line(cell)).style(Style::default().fg(TEXT))),
                ),
        )
    });

    let widths = std::iter::once(Constraint::Length(CREATED_WIDTH))
        .chain(app.table.columns.iter().map(|_| Constraint::Fill(1)));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .column_spacing(2)
        .highlight_symbol("> ")
        .row_highlight_style(Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD));

    frame.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_preview(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER))
        .title(Span::styled(" Preview ", Style::default().fg(TEXT_MUTED)));
    let text = app.selected_preview().unwrap_or_default();
    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(TEXT))
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

/// Full JSON of one record in a scrollable modal.
fn draw_detail(frame: &mut Frame<'_>, app: &mut App, detail: &RecordDetail, area: Rect) {
    let modal = centered_rect(
        area.width.saturating_mul(4) / 5,
        area.height.saturating_mul(4) / 5,
        area,
    );
    frame.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(PRIMARY))
        .title(Span::styled(
            " JSON Data Details ",
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            " Up/Down scroll  Del delete  Esc close ",
            Style::default().fg(TEXT_MUTED),
        ))
        .style(Style::default().bg(MODAL_BG));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(" Created: ", Style::default().fg(TEXT_MUTED)),
            Span::styled(detail.created.clone(), Style::default().fg(TEXT)),
        ]),
        Line::from(vec![
            Span::styled(" Id: ", Style::default().fg(TEXT_MUTED)),
            Span::styled(detail.id.to_string(), Style::default().fg(TEXT_MUTED)),
        ]),
        Line::from(""),
    ];
    lines.extend(
        detail
            .body
            .lines()
            .map(|line| Line::from(Span::styled(format!(" {line}"), Style::default().fg(TEXT)))),
    );

    let inner = block.inner(modal);
    let content_width = inner.width.saturating_sub(1);
    let content_height = inner.height as usize;

    let total_lines = Paragraph::new(lines.clone())
        .wrap(Wrap { trim: false })
        .line_count(content_width)
        .max(1);
    let max_scroll = total_lines.saturating_sub(content_height) as u16;
    app.update_detail_scroll_bounds(max_scroll);
    let scroll = app.detail_scroll;

    let body_area = Rect {
        width: inner.width.saturating_sub(1),
        ..inner
    };
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));

    frame.render_widget(block, modal);
    frame.render_widget(body, body_area);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_lines)
            .position(scroll as usize)
            .viewport_content_length(content_height);
        let scrollbar_area = Rect {
            x: inner.x + inner.width.saturating_sub(1),
            y: inner.y,
            width: 1,
            height: inner.height,
        };
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .style(Style::default().fg(BORDER))
                .thumb_style(Style::default().fg(TEXT_MUTED)),
            scrollbar_area,
            &mut scrollbar_state,
        );
    }
}

fn draw_confirm_delete(frame: &mut Frame<'_>, area: Rect) {
    let modal = centered_rect(50, 6, area);
    frame.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(ERROR))
        .title(Span::styled(
            " Delete record ",
            Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(MODAL_BG));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Are you sure you want to delete this record?",
            Style::default().fg(TEXT),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y", Style::default().fg(ERROR).add_modifier(Modifier::BOLD)),
            Span::styled(" delete", Style::default().fg(TEXT_MUTED)),
            Span::styled("  n", Style::default().fg(TEXT).add_modifier(Modifier::BOLD)),
            Span::styled(" cancel", Style::default().fg(TEXT_MUTED)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), modal);
}

/// Draw the status bar at the bottom.
fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let status_color = match app.status_kind {
        StatusKind::Info => TEXT_MUTED,
        StatusKind::Success => SUCCESS,
        StatusKind::Error => ERROR,
    };

    let keys: &[(&str, &str)] = match app.screen {
        Screen::SignIn => &[("Ctrl+C", "quit"), ("Enter", "sign in")],
        Screen::Entry => &[
            ("Ctrl+C", "quit"),
            ("Tab", "records"),
            ("Ctrl+S", "save"),
            ("Ctrl+F", "format"),
            ("Ctrl+L", "sample"),
        ],
        Screen::Records => &[
            ("Ctrl+C", "quit"),
            ("Tab", "add"),
            ("Up/Down", "select"),
            ("Enter", "view"),
            ("Del", "delete"),
            ("Esc", "clear"),
        ],
    };
    let shortcuts: Vec<Span<'_>> = keys
        .iter()
        .enumerate()
        .flat_map(|(idx, (key, label))| {
            let lead = if idx == 0 { " " } else { "  " };
            [
                Span::styled(format!("{lead}{key}"), Style::default().fg(TEXT_MUTED)),
                Span::styled(format!(" {label}"), Style::default().fg(BORDER)),
            ]
        })
        .collect();

    let right_text = format!(" {} ", app.status);
    let right_len = right_text.chars().count() as u16;
    let left_area = Rect {
        width: area.width.saturating_sub(right_len),
        ..area
    };
    let right_area = Rect {
        x: area.x + area.width.saturating_sub(right_len),
        width: right_len.min(area.width),
        ..area
    };

    frame.render_widget(Paragraph::new(Line::from(shortcuts)), left_area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            right_text,
            Style::default().fg(status_color),
        ))),
        right_area,
    );
}

/// Rect of at most `width` x `height` centered in `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonshelf_core::{RecordView, SyncPhase};
    use jsonshelf_protocol::{OwnerId, User};
    use jsonshelf_test_utils::record;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use serde_json::json;
    use std::sync::Arc;

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal.draw(|frame| draw(frame, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app_with(records: Vec<jsonshelf_protocol::Record>) -> App {
        let mut app = App::new(Arc::new(RecordView::default()), 100);
        app.set_user(Some(User::new("u1", Some("u1@example.com".to_string()))));
        app.apply_view(Arc::new(RecordView {
            version: 1,
            phase: SyncPhase::Live,
            owner_id: Some(OwnerId::new("u1")),
            records: Arc::from(records),
            error: None,
        }));
        app
    }

    #[test]
    fn sign_in_screen_asks_for_user() {
        let mut app = App::new(Arc::new(RecordView::default()), 100);
        let screen = render(&mut app);
        assert!(screen.contains("Please sign in to view data"));
    }

    #[test]
    fn records_screen_shows_columns_and_count() {
        let mut app = app_with(vec![record("r1", "u1", json!({ "course": "Data Science" }))]);
        app.toggle_screen();
        let screen = render(&mut app);
        assert!(screen.contains("1 records found"));
        assert!(screen.contains("Created"));
        assert!(screen.contains("course"));
        assert!(screen.contains("Data Science"));
        assert!(screen.contains("u1@example.com"));
    }

    #[test]
    fn empty_records_screen_explains_itself() {
        let mut app = app_with(Vec::new());
        app.toggle_screen();
        let screen = render(&mut app);
        assert!(screen.contains("No records found"));
        assert!(screen.contains("Start by adding some JSON data"));
    }

    #[test]
    fn entry_screen_shows_placeholder() {
        let mut app = app_with(Vec::new());
        let screen = render(&mut app);
        assert!(screen.contains("Enter your JSON data here"));
    }

    #[test]
    fn confirm_prompt_is_drawn_over_the_table() {
        let mut app = app_with(vec![record("r1", "u1", json!({ "a": 1 }))]);
        app.toggle_screen();
        app.request_delete();
        let screen = render(&mut app);
        assert!(screen.contains("Are you sure you want to delete this record?"));
    }

    #[test]
    fn cells_are_flattened_to_one_line() {
        assert_eq!(single_line("a\nb\r\nc"), "a b  c");
    }
}
