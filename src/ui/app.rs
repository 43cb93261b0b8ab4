use std::mem;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info, warn};

use crate::db::{snapshot, LedgerStore};
use crate::export::export_to_path;
use crate::filter::RecordFilter;
use crate::models::{LedgerEntry, Record, ReviewStatus};
use crate::records::FilterOptions;
use crate::session::ReviewSession;

use super::forms::{CommentForm, FilterPanel, FilterSection, COMMENT_PREFIX};
use super::helpers::{centered_rect, record_lines, status_badge, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Width of the filter summary on the left.
const SIDEBAR_WIDTH: u16 = 34;

/// Fine-grained modes layered over the review screen.
enum Mode {
    Normal,
    EditingComment(CommentForm),
    EditingFilters(FilterPanel),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Review state shared across the TUI: the loaded records, the ledger, the
/// active filters and the cursor into the filtered list.
pub struct App<S: LedgerStore> {
    store: S,
    records: Vec<Record>,
    options: FilterOptions,
    filter: RecordFilter,
    /// Indices into `records`, in display order.
    visible: Vec<usize>,
    session: ReviewSession,
    current_entry: Option<LedgerEntry>,
    /// Comment sent with the next decision. Reloaded from the ledger whenever
    /// the cursor lands on another building.
    comment_draft: String,
    export_path: PathBuf,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl<S: LedgerStore> App<S> {
    /// Build the initial state and apply the empty filter. Fails only if the
    /// ledger cannot be read.
    pub fn new(store: S, records: Vec<Record>, export_path: PathBuf) -> Result<Self> {
        let options = FilterOptions::from_records(&records);
        let mut app = Self {
            store,
            records,
            options,
            filter: RecordFilter::default(),
            visible: Vec::new(),
            session: ReviewSession::default(),
            current_entry: None,
            comment_draft: String::new(),
            export_path,
            mode: Mode::Normal,
            status: None,
        };
        app.refilter().context("failed to read ledger")?;
        Ok(app)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::EditingComment(form) => self.handle_comment(code, form),
            Mode::EditingFilters(panel) => self.handle_filters(code, panel),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Right | KeyCode::Char('n') => {
                if self.session.next() {
                    self.clear_status();
                    self.reload_current();
                }
            }
            KeyCode::Left | KeyCode::Char('p') => {
                if self.session.prev() {
                    self.clear_status();
                    self.reload_current();
                }
            }
            KeyCode::Home => {
                self.session.reset();
                self.clear_status();
                self.reload_current();
            }
            KeyCode::Char('v') | KeyCode::Char('V') => self.decide(ReviewStatus::Validated),
            KeyCode::Char('r') | KeyCode::Char('R') => self.decide(ReviewStatus::Rejected),
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if self.current_record().is_some() {
                    self.clear_status();
                    return Mode::EditingComment(CommentForm::new(&self.comment_draft));
                }
                self.set_status("No building to comment on.", StatusKind::Error);
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.clear_status();
                return Mode::EditingFilters(FilterPanel::new(&self.filter));
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                let mut filter = self.filter.clone();
                filter.status = filter.status.next();
                self.apply_filter(filter);
            }
            KeyCode::Char('g') | KeyCode::Char('G') => self.open_map(),
            KeyCode::Char('x') | KeyCode::Char('X') => self.export(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_comment(&mut self, code: KeyCode, mut form: CommentForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Comment unchanged.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter => {
                self.comment_draft = form.text.trim().to_string();
                self.set_status(
                    "Comment kept; press [v] or [r] to store it with a decision.",
                    StatusKind::Info,
                );
                Mode::Normal
            }
            KeyCode::Backspace => {
                form.backspace();
                Mode::EditingComment(form)
            }
            KeyCode::Delete => {
                form.clear();
                Mode::EditingComment(form)
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
                Mode::EditingComment(form)
            }
            _ => Mode::EditingComment(form),
        }
    }

    fn handle_filters(&mut self, code: KeyCode, mut panel: FilterPanel) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Filters unchanged.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                self.apply_filter(panel.draft);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Left | KeyCode::Right => {
                panel.toggle_section()
            }
            KeyCode::Up => panel.move_selection(-1, &self.options),
            KeyCode::Down => panel.move_selection(1, &self.options),
            KeyCode::PageUp => panel.move_selection(-5, &self.options),
            KeyCode::PageDown => panel.move_selection(5, &self.options),
            KeyCode::Char(' ') => {
                panel.toggle_current(&self.options);
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                panel.draft.status = panel.draft.status.next();
            }
            KeyCode::Char('a') | KeyCode::Char('A') => panel.clear_section(),
            _ => {}
        }
        Mode::EditingFilters(panel)
    }

    /// Store a decision for the building under the cursor, then recompute the
    /// filtered list so status filters never lag behind the ledger.
    fn decide(&mut self, status: ReviewStatus) {
        let Some(cleabs) = self.current_record().map(|r| r.cleabs.clone()) else {
            self.set_status("No building selected.", StatusKind::Error);
            return;
        };
        let comment = Some(self.comment_draft.trim()).filter(|c| !c.is_empty());

        if let Err(err) = self.store.upsert(&cleabs, status.clone(), comment) {
            let err = anyhow::Error::from(err);
            warn!(cleabs = %cleabs, "review not stored: {err:#}");
            self.set_status(
                format!("Could not store decision: {}", surface_error(&err)),
                StatusKind::Error,
            );
            return;
        }
        info!(cleabs = %cleabs, status = status.label(), "decision stored");

        match self.refilter() {
            Ok(()) => self.set_status(format!("{cleabs}: {status}"), StatusKind::Info),
            Err(err) => self.report_read_error(err.into()),
        }
    }

    fn apply_filter(&mut self, filter: RecordFilter) {
        let previous = mem::replace(&mut self.filter, filter);
        match self.refilter() {
            Ok(()) if self.session.is_empty() => {
                self.set_status("No buildings match these filters.", StatusKind::Error)
            }
            Ok(()) => self.set_status(
                format!("{} building(s) shown.", self.session.len()),
                StatusKind::Info,
            ),
            Err(err) => {
                self.filter = previous;
                self.report_read_error(err.into());
            }
        }
    }

    /// Re-read the ledger, rebuild the visible list and clamp the cursor.
    fn refilter(&mut self) -> Result<(), crate::error::LedgerError> {
        let ledger = snapshot(&self.store)?;
        self.visible = self.filter.apply(&self.records, &ledger);
        self.session.refilter(self.visible.len());
        debug!(
            visible = self.visible.len(),
            filter = %self.filter.describe(),
            "filter applied"
        );
        self.current_entry = self
            .current_record()
            .and_then(|record| ledger.get(&record.cleabs).cloned());
        self.sync_comment_draft();
        Ok(())
    }

    /// Load the ledger state of the building under the cursor.
    fn reload_current(&mut self) {
        let lookup = match self.current_record() {
            Some(record) => self.store.get(&record.cleabs),
            None => Ok(None),
        };
        match lookup {
            Ok(entry) => {
                self.current_entry = entry;
                self.sync_comment_draft();
            }
            Err(err) => self.report_read_error(err.into()),
        }
    }

    fn sync_comment_draft(&mut self) {
        self.comment_draft = self
            .current_entry
            .as_ref()
            .and_then(|entry| entry.comment.clone())
            .unwrap_or_default();
    }

    fn open_map(&mut self) {
        let Some(link) = self.current_record().map(Record::map_link) else {
            self.set_status("No building selected.", StatusKind::Error);
            return;
        };
        match open_link(&link) {
            Ok(()) => self.set_status(format!("Opened {link}"), StatusKind::Info),
            Err(err) => self.set_status(format!("Failed to open link: {err}"), StatusKind::Error),
        }
    }

    fn export(&mut self) {
        match export_to_path(&self.records, &self.store, &self.export_path) {
            Ok(rows) => self.set_status(
                format!("Exported {rows} rows to {}.", self.export_path.display()),
                StatusKind::Info,
            ),
            Err(err) => self.set_status(
                format!("Export failed: {}", surface_error(&err)),
                StatusKind::Error,
            ),
        }
    }

    fn report_read_error(&mut self, err: anyhow::Error) {
        warn!("ledger read failed: {err:#}");
        self.set_status(
            format!("Could not read ledger: {}", surface_error(&err)),
            StatusKind::Error,
        );
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(content_area);
        self.draw_sidebar(frame, columns[0]);
        self.draw_record(frame, columns[1]);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::EditingComment(form) => self.draw_comment_form(frame, area, form),
            Mode::EditingFilters(panel) => self.draw_filter_panel(frame, area, panel),
            Mode::Normal => {}
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let heading = Style::default().add_modifier(Modifier::BOLD);
        let selection = |values: &std::collections::BTreeSet<String>| -> Vec<Line<'static>> {
            if values.is_empty() {
                vec![Line::from(Span::styled(
                    "  any",
                    Style::default().fg(Color::DarkGray),
                ))]
            } else {
                values
                    .iter()
                    .map(|value| Line::from(format!("  {value}")))
                    .collect()
            }
        };

        let mut lines = vec![Line::from(Span::styled("Nature", heading))];
        lines.extend(selection(&self.filter.natures));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("État de l'objet", heading)));
        lines.extend(selection(&self.filter.etats));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Status", heading)));
        lines.push(Line::from(format!("  {}", self.filter.status)));
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "{} of {} shown",
            self.visible.len(),
            self.records.len()
        )));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Filters"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_record(&self, frame: &mut Frame, area: Rect) {
        let (Some(position), Some(record)) = (self.session.position(), self.current_record())
        else {
            let message = Paragraph::new("No buildings match the current filters.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Review"));
            frame.render_widget(message, area);
            return;
        };

        let title = format!(
            "{}/{} — Building {}",
            position + 1,
            self.session.len(),
            record.cleabs
        );

        let mut lines = record_lines(record);
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw("Stored status: "),
            status_badge(self.current_entry.as_ref().map(|e| &e.status)),
        ]));

        let stored_comment = self
            .current_entry
            .as_ref()
            .and_then(|e| e.comment.as_deref())
            .unwrap_or("");
        lines.push(Line::from(format!("Stored comment: {stored_comment}")));
        if self.comment_draft != stored_comment {
            lines.push(Line::from(Span::styled(
                format!("Pending comment: {}", self.comment_draft),
                Style::default().fg(Color::Yellow),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&'static str, &'static str)] = match &self.mode {
            Mode::EditingComment(_) => &[
                ("[Enter]", " Keep"),
                ("[Del]", " Clear"),
                ("[Esc]", " Cancel"),
            ],
            Mode::EditingFilters(_) => &[
                ("[↑↓]", " Navigate"),
                ("[Tab]", " Column"),
                ("[Space]", " Toggle"),
                ("[a]", " Any"),
                ("[s]", " Status"),
                ("[Enter]", " Apply"),
                ("[Esc]", " Cancel"),
            ],
            Mode::Normal if self.session.is_empty() => &[
                ("[f]", " Filters"),
                ("[s]", " Status"),
                ("[x]", " Export"),
                ("[q]", " Quit"),
            ],
            Mode::Normal => &[
                ("[←→]", " Prev/Next"),
                ("[Home]", " First"),
                ("[v]", " Validate"),
                ("[r]", " Reject"),
                ("[c]", " Comment"),
                ("[f]", " Filters"),
                ("[s]", " Status"),
                ("[g]", " Map"),
                ("[x]", " Export"),
                ("[q]", " Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, label) in keys {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::raw(format!("{label}   ")));
        }
        Line::from(spans)
    }

    fn draw_comment_form(&self, frame: &mut Frame, area: Rect, form: &CommentForm) {
        let popup_area = centered_rect(70, 25, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Comment").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            form.build_line(),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to keep • Del to clear • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + COMMENT_PREFIX.len() as u16 + form.value_len() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_filter_panel(&self, frame: &mut Frame, area: Rect, panel: &FilterPanel) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(format!("Filters • status: {}", panel.draft.status))
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(inner);

        for (section, title, chunk) in [
            (FilterSection::Nature, "Nature", columns[0]),
            (FilterSection::Etat, "État de l'objet", columns[1]),
        ] {
            let mut column_block = Block::default().borders(Borders::ALL).title(title);
            if panel.section == section {
                column_block = column_block.border_style(Style::default().fg(Color::Yellow));
            }
            let selected = match section {
                FilterSection::Nature => panel.nature_selected,
                FilterSection::Etat => panel.etat_selected,
            };
            let visible_rows = chunk.height.saturating_sub(2) as usize;
            let scroll = selected.saturating_sub(visible_rows.saturating_sub(1));
            let paragraph = Paragraph::new(panel.build_lines(section, &self.options))
                .block(column_block)
                .scroll((scroll as u16, 0));
            frame.render_widget(paragraph, chunk);
        }
    }

    fn set_status<T: Into<String>>(&mut self, text: T, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn current_record(&self) -> Option<&Record> {
        let position = self.session.position()?;
        self.visible
            .get(position)
            .and_then(|&idx| self.records.get(idx))
    }

    /// Identifier of the building on screen, if any.
    pub fn current_cleabs(&self) -> Option<&str> {
        self.current_record().map(|r| r.cleabs.as_str())
    }

    pub fn current_entry(&self) -> Option<&LedgerEntry> {
        self.current_entry.as_ref()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
