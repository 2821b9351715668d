use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::db::{
    active_loans, add_author, add_genre, add_language, add_or_merge_book, add_publisher,
    add_reader, available_books, books_by_author, books_by_genre, books_by_pages,
    books_by_publisher, books_by_year, choose, close_loan, delete_copies, list_authors,
    list_books, list_genres, list_languages, list_publishers, list_readers, open_loan,
    reader_loans, resolve, QueryResult, Resolution,
};
use crate::error::{LibraryError, LibraryResult};
use crate::models::{BookDraft, Comparison};
use crate::table::render_table;
use crate::validation::{parse_id, parse_non_negative, parse_positive};

use super::forms::{ChoiceDialog, Form};
use super::helpers::{centered_rect, column, key_hints};
use super::screens::{Command, MenuId, MenuScreen, ResultScreen};

const FOOTER_HEIGHT: u16 = 3;
const PAGE: isize = 10;
const HORIZONTAL_STEP: isize = 4;

/// What occupies the main area.
enum Screen {
    Menu(MenuScreen),
    Results(ResultScreen),
}

/// Modal state layered over the current screen.
enum Mode {
    Normal,
    Form(Form),
    /// A lookup matched several rows; the form waits for an id.
    Choosing(ChoiceDialog),
}

/// What a finished command hands back to the screen.
enum Outcome {
    Message(String),
    Table {
        title: String,
        lines: Vec<String>,
        rows: usize,
    },
}

impl Outcome {
    fn table(title: impl Into<String>, result: QueryResult) -> Self {
        Outcome::Table {
            title: title.into(),
            lines: render_table(&result),
            rows: result.len(),
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
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

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            screen: Screen::Menu(MenuScreen::new(MenuId::Main)),
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Process one key press. Returns `true` once the user asked to leave.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Form(form) => self.handle_form(code, form)?,
            Mode::Choosing(dialog) => self.handle_choice(code, dialog)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let command = match &mut self.screen {
            Screen::Menu(menu) => match code {
                KeyCode::Char('q') => {
                    *exit = true;
                    None
                }
                KeyCode::Up => {
                    menu.move_selection(-1);
                    None
                }
                KeyCode::Down => {
                    menu.move_selection(1);
                    None
                }
                KeyCode::Enter => menu.current_command(),
                KeyCode::Char('0') | KeyCode::Esc | KeyCode::Backspace => {
                    match menu.parent() {
                        Some(parent) => *menu = parent,
                        None => *exit = true,
                    }
                    None
                }
                KeyCode::Char(ch @ '1'..='9') => {
                    let number = ch as usize - '0' as usize;
                    let selected = menu.select_number(number);
                    if selected.is_none() {
                        self.set_status(
                            format!("No entry {number} in this menu."),
                            StatusKind::Error,
                        );
                    }
                    selected
                }
                _ => None,
            },
            Screen::Results(results) => {
                match code {
                    KeyCode::Up => results.scroll_vertical(-1),
                    KeyCode::Down => results.scroll_vertical(1),
                    KeyCode::PageUp => results.scroll_vertical(-PAGE),
                    KeyCode::PageDown => results.scroll_vertical(PAGE),
                    KeyCode::Home => results.scroll_to_top(),
                    KeyCode::End => results.scroll_to_bottom(),
                    KeyCode::Left => results.scroll_horizontal(-HORIZONTAL_STEP),
                    KeyCode::Right => results.scroll_horizontal(HORIZONTAL_STEP),
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                        let menu = results.return_to.clone();
                        self.screen = Screen::Menu(menu);
                        self.clear_status();
                    }
                    _ => {}
                }
                None
            }
        };

        match command {
            Some(command) => Ok(self.start(command)),
            None => Ok(Mode::Normal),
        }
    }

    fn handle_form(&mut self, code: KeyCode, mut form: Form) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status(format!("{} cancelled.", form.title), StatusKind::Info);
                return Ok(Mode::Normal);
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => {
                form.backspace();
                form.error = None;
            }
            KeyCode::Enter => return Ok(self.submit(form)),
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Ok(Mode::Form(form))
    }

    fn handle_choice(&mut self, code: KeyCode, mut dialog: ChoiceDialog) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Choice cancelled.", StatusKind::Info);
                Ok(Mode::Form(dialog.form))
            }
            KeyCode::Backspace => {
                dialog.backspace();
                Ok(Mode::Choosing(dialog))
            }
            KeyCode::Up => {
                dialog.scroll_candidates(-1);
                Ok(Mode::Choosing(dialog))
            }
            KeyCode::Down => {
                dialog.scroll_candidates(1);
                Ok(Mode::Choosing(dialog))
            }
            KeyCode::PageUp => {
                dialog.scroll_candidates(-PAGE);
                Ok(Mode::Choosing(dialog))
            }
            KeyCode::PageDown => {
                dialog.scroll_candidates(PAGE);
                Ok(Mode::Choosing(dialog))
            }
            KeyCode::Home => {
                dialog.scroll_to_top();
                Ok(Mode::Choosing(dialog))
            }
            KeyCode::End => {
                dialog.scroll_to_bottom();
                Ok(Mode::Choosing(dialog))
            }
            KeyCode::Enter => match choose(&self.conn, &dialog.pending, &dialog.input) {
                Ok(id) => {
                    let ChoiceDialog { mut form, field, .. } = dialog;
                    form.set_resolved(field, id);
                    Ok(self.submit(form))
                }
                Err(err) => {
                    let ChoiceDialog { form, field, .. } = dialog;
                    Ok(self.reject(form, Some(field), err))
                }
            },
            KeyCode::Char(ch) => {
                dialog.push_char(ch);
                Ok(Mode::Choosing(dialog))
            }
            _ => Ok(Mode::Choosing(dialog)),
        }
    }

    /// Open a submenu, show a form, or run a listing straight away.
    fn start(&mut self, command: Command) -> Mode {
        self.clear_status();
        debug!(?command, "command selected");

        if let Command::Open(menu) = command {
            self.screen = Screen::Menu(MenuScreen::new(menu));
            return Mode::Normal;
        }
        if let Some(form) = Form::for_command(command) {
            return Mode::Form(form);
        }

        match self.listing(command) {
            Ok(outcome) => self.apply(outcome),
            Err(err) => {
                warn!(?command, category = ?err.category(), error = %err, "listing failed");
                self.set_status(err.to_string(), StatusKind::Error);
            }
        }
        Mode::Normal
    }

    /// Resolve every lookup field, then run the command. An ambiguous name
    /// suspends the form in a choice dialog.
    fn submit(&mut self, mut form: Form) -> Mode {
        while let Some((index, lookup)) = form.next_unresolved() {
            match resolve(&self.conn, lookup, form.value(index)) {
                Ok(Resolution::Resolved(id)) => form.set_resolved(index, id),
                Ok(Resolution::Ambiguous(pending)) => {
                    let lines = render_table(&pending.candidates);
                    self.clear_status();
                    return Mode::Choosing(ChoiceDialog::new(pending, lines, form, index));
                }
                Err(err) => return self.reject(form, Some(index), err),
            }
        }

        match self.execute(&form) {
            Ok(outcome) => {
                self.apply(outcome);
                Mode::Normal
            }
            Err(err) => self.reject(form, None, err),
        }
    }

    /// Keep the form open with the error shown, focusing the offending field
    /// when it is known.
    fn reject(&mut self, mut form: Form, field: Option<usize>, err: LibraryError) -> Mode {
        warn!(
            command = ?form.command,
            category = ?err.category(),
            error = %err,
            "operation rejected"
        );
        if let Some(field) = field {
            form.active = field;
        }
        let message = err.to_string();
        form.error = Some(message.clone());
        self.set_status(message, StatusKind::Error);
        Mode::Form(form)
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Message(text) => self.set_status(text, StatusKind::Info),
            Outcome::Table { title, lines, rows } => {
                let return_to = self.current_menu();
                self.screen = Screen::Results(ResultScreen::new(title, lines, return_to));
                let text = match rows {
                    0 => "No matching rows.".to_string(),
                    1 => "1 row.".to_string(),
                    count => format!("{count} rows."),
                };
                self.set_status(text, StatusKind::Info);
            }
        }
    }

    fn current_menu(&self) -> MenuScreen {
        match &self.screen {
            Screen::Menu(menu) => menu.clone(),
            Screen::Results(results) => results.return_to.clone(),
        }
    }

    /// Commands that run without input.
    fn listing(&self, command: Command) -> LibraryResult<Outcome> {
        let conn = &self.conn;
        match command {
            Command::ListBooks => Ok(Outcome::table("All Books", list_books(conn)?)),
            Command::AvailableBooks => {
                Ok(Outcome::table("Available Books", available_books(conn)?))
            }
            Command::ActiveLoans => Ok(Outcome::table("Active Loans", active_loans(conn)?)),
            Command::ListReaders => Ok(Outcome::table("Readers", list_readers(conn)?)),
            Command::ReferenceData => self.reference_data(),
            other => Err(LibraryError::validation(format!(
                "{other:?} needs input before it can run."
            ))),
        }
    }

    /// The four reference lists stacked on one result screen.
    fn reference_data(&self) -> LibraryResult<Outcome> {
        let sections = [
            ("Authors", list_authors(&self.conn)?),
            ("Genres", list_genres(&self.conn)?),
            ("Publishers", list_publishers(&self.conn)?),
            ("Languages", list_languages(&self.conn)?),
        ];

        let mut lines = Vec::new();
        let mut rows = 0;
        for (heading, result) in &sections {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.push((*heading).to_string());
            lines.extend(render_table(result));
            rows += result.len();
        }

        Ok(Outcome::Table {
            title: "Reference Data".to_string(),
            lines,
            rows,
        })
    }

    /// Run a submitted form against the store. Lookup fields are resolved by
    /// the time this is called.
    fn execute(&mut self, form: &Form) -> LibraryResult<Outcome> {
        match form.command {
            Command::AddBook => {
                let draft = BookDraft {
                    title: form.value(0).to_string(),
                    author_id: form.resolved_id(1)?,
                    genre_id: form.resolved_id(2)?,
                    publisher_id: form.resolved_id(3)?,
                    language_id: form.resolved_id(4)?,
                    year: form.value(5).to_string(),
                    pages: form.value(6).to_string(),
                    copies: form.value(7).to_string(),
                };
                let stored = add_or_merge_book(&mut self.conn, &draft)?;
                Ok(Outcome::Message(stored.to_string()))
            }
            Command::DeleteCopies => {
                let book_id = form.resolved_id(0)?;
                let count = parse_positive(form.value(1), "Copies to remove")?;
                let removed = delete_copies(&mut self.conn, book_id, count)?;
                Ok(Outcome::Message(removed.to_string()))
            }
            Command::BooksByYear => {
                let op = Comparison::parse(form.value(0))?;
                let year = parse_non_negative(form.value(1), "Year")?;
                Ok(Outcome::table(
                    format!("Books with year {} {year}", op.as_sql()),
                    books_by_year(&self.conn, op, year)?,
                ))
            }
            Command::BooksByPages => {
                let op = Comparison::parse(form.value(0))?;
                let pages = parse_non_negative(form.value(1), "Pages")?;
                Ok(Outcome::table(
                    format!("Books with pages {} {pages}", op.as_sql()),
                    books_by_pages(&self.conn, op, pages)?,
                ))
            }
            Command::BooksByAuthor => {
                let author_id = form.resolved_id(0)?;
                Ok(Outcome::table(
                    format!("Books by author {author_id}"),
                    books_by_author(&self.conn, author_id)?,
                ))
            }
            Command::BooksByGenre => {
                let genre_id = form.resolved_id(0)?;
                Ok(Outcome::table(
                    format!("Books in genre {genre_id}"),
                    books_by_genre(&self.conn, genre_id)?,
                ))
            }
            Command::BooksByPublisher => {
                let publisher_id = form.resolved_id(0)?;
                Ok(Outcome::table(
                    format!("Books from publisher {publisher_id}"),
                    books_by_publisher(&self.conn, publisher_id)?,
                ))
            }
            Command::LendBook => {
                let book_id = form.resolved_id(0)?;
                let reader_id = form.resolved_id(1)?;
                let opened = open_loan(&mut self.conn, book_id, reader_id, form.value(2))?;
                Ok(Outcome::Message(opened.to_string()))
            }
            Command::ReturnBook => {
                let loan_id = parse_id(form.value(0), "loan")?;
                let closed = close_loan(&mut self.conn, loan_id, form.value(1))?;
                Ok(Outcome::Message(closed.to_string()))
            }
            Command::AddReader => {
                let id = add_reader(&self.conn, form.value(0), form.value(1), form.value(2))?;
                Ok(Outcome::Message(format!("Reader {id} registered.")))
            }
            Command::ReaderLoans => {
                let reader_id = form.resolved_id(0)?;
                Ok(Outcome::table(
                    format!("Books held by reader {reader_id}"),
                    reader_loans(&self.conn, reader_id)?,
                ))
            }
            Command::AddAuthor => {
                let id = add_author(&self.conn, form.value(0), form.value(1))?;
                Ok(Outcome::Message(format!("Author {id} added.")))
            }
            Command::AddGenre => {
                let id = add_genre(&self.conn, form.value(0))?;
                Ok(Outcome::Message(format!("Genre {id} added.")))
            }
            Command::AddPublisher => {
                let id = add_publisher(&self.conn, form.value(0), form.value(1))?;
                Ok(Outcome::Message(format!("Publisher {id} added.")))
            }
            Command::AddLanguage => {
                let id = add_language(&self.conn, form.value(0))?;
                Ok(Outcome::Message(format!("Language {id} added.")))
            }
            other => self.listing(other),
        }
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

        match &self.screen {
            Screen::Menu(menu) => self.draw_menu(frame, content_area, menu),
            Screen::Results(results) => self.draw_results(frame, content_area, results),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Form(form) => self.draw_form(frame, area, form),
            Mode::Choosing(dialog) => self.draw_choice(frame, area, dialog),
            Mode::Normal => {}
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect, menu: &MenuScreen) {
        let items: Vec<ListItem> = menu
            .menu
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| ListItem::new(format!("{}. {}", index + 1, item.label)))
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(menu.menu.title()),
            )
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(menu.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect, results: &ResultScreen) {
        let lines: Vec<Line> = results
            .lines
            .iter()
            .map(|line| Line::from(line.as_str()))
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(results.title.as_str());
        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((results.scroll, results.offset));
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
        match (&self.screen, &self.mode) {
            (_, Mode::Form(_)) => key_hints(&[
                ("Tab/↑↓", "Switch field"),
                ("Enter", "Submit"),
                ("Esc", "Cancel"),
            ]),
            (_, Mode::Choosing(_)) => key_hints(&[
                ("↑↓ PgUp PgDn", "Scroll"),
                ("Enter", "Choose"),
                ("Esc", "Back to form"),
            ]),
            (Screen::Results(_), Mode::Normal) => key_hints(&[
                ("↑↓ PgUp PgDn", "Scroll"),
                ("←→", "Pan"),
                ("Home/End", "Jump"),
                ("Esc", "Back"),
            ]),
            (Screen::Menu(menu), Mode::Normal) => {
                let back = if menu.menu.parent().is_some() {
                    "Back"
                } else {
                    "Exit"
                };
                key_hints(&[
                    ("↑↓", "Navigate"),
                    ("1-9/Enter", "Select"),
                    ("0/Esc", back),
                    ("q", "Quit"),
                ])
            }
        }
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, form: &Form) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(form.title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = (0..form.fields.len())
            .map(|index| form.build_line(index))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to submit • Tab to switch field • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x.saturating_add(column(form.cursor_offset()));
        let cursor_y = inner.y.saturating_add(column(form.active));
        frame.set_cursor_position((cursor_x, cursor_y));
    }

    fn draw_choice(&self, frame: &mut Frame, area: Rect, dialog: &ChoiceDialog) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Several Matches")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        const INPUT_PREFIX: &str = "Id: ";
        let header_height = 3.min(inner.height);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(header_height), Constraint::Min(0)])
            .split(inner);

        let header = vec![
            Line::from(dialog.prompt()),
            Line::from(format!("{INPUT_PREFIX}{}", dialog.input)),
            Line::from(""),
        ];
        frame.render_widget(Paragraph::new(header), chunks[0]);

        let candidates: Vec<Line> = dialog
            .lines
            .iter()
            .map(|line| Line::from(line.as_str()))
            .collect();
        frame.render_widget(Paragraph::new(candidates).scroll((dialog.scroll, 0)), chunks[1]);

        let cursor_x = inner
            .x
            .saturating_add(column(INPUT_PREFIX.len() + dialog.input.chars().count()));
        frame.set_cursor_position((cursor_x, inner.y.saturating_add(1)));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app() -> App {
        App::new(open_in_memory().unwrap())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn status(app: &App) -> (StatusKind, String) {
        let status = app.status.as_ref().expect("status message");
        (status.kind, status.text.clone())
    }

    fn seed_references(app: &App) {
        add_author(&app.conn, "Anna Smith", "").unwrap();
        add_author(&app.conn, "Anna Brown", "UK").unwrap();
        add_genre(&app.conn, "Poetry").unwrap();
        add_publisher(&app.conn, "Penguin", "London").unwrap();
        add_language(&app.conn, "English").unwrap();
    }

    #[test]
    fn zero_on_main_menu_exits() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('2')));
        assert!(matches!(app.screen, Screen::Menu(ref menu) if menu.menu == MenuId::Loans));
        assert!(!press(&mut app, KeyCode::Char('0')));
        assert!(press(&mut app, KeyCode::Char('0')));
    }

    #[test]
    fn adding_a_genre_through_the_menus() {
        let mut app = app();
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('2'));
        assert!(matches!(app.mode, Mode::Form(ref form) if form.command == Command::AddGenre));

        type_text(&mut app, "Science fiction");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status(&app), (StatusKind::Info, "Genre 1 added.".to_string()));
        assert_eq!(list_genres(&app.conn).unwrap().len(), 1);
    }

    #[test]
    fn empty_required_field_keeps_the_form_open() {
        let mut app = app();
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Enter);

        match &app.mode {
            Mode::Form(form) => assert!(form.error.is_some()),
            _ => panic!("form should stay open"),
        }
        assert_eq!(status(&app).0, StatusKind::Error);
        assert!(list_languages(&app.conn).unwrap().is_empty());
    }

    #[test]
    fn ambiguous_author_is_chosen_in_a_dialog() {
        let mut app = app();
        seed_references(&app);

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('2'));
        type_text(&mut app, "Selected Poems");
        for value in ["anna", "1", "1", "1", "1990", "120", "2"] {
            press(&mut app, KeyCode::Tab);
            type_text(&mut app, value);
        }
        press(&mut app, KeyCode::Enter);

        match &app.mode {
            Mode::Choosing(dialog) => {
                assert_eq!(dialog.pending.ids, vec![1, 2]);
                assert_eq!(dialog.field, 1);
            }
            _ => panic!("expected the choice dialog"),
        }

        type_text(&mut app, "2");
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status(&app).0, StatusKind::Info);
        let books = list_books(&app.conn).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books.cell(0, 2), Some("Anna Brown"));
    }

    #[test]
    fn unlisted_choice_returns_to_the_form() {
        let mut app = app();
        seed_references(&app);

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('5'));
        type_text(&mut app, "ANNA");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Choosing(_)));

        type_text(&mut app, "x");
        press(&mut app, KeyCode::Enter);

        match &app.mode {
            Mode::Form(form) => {
                assert_eq!(form.command, Command::BooksByAuthor);
                assert_eq!(
                    form.error.as_deref(),
                    Some(LibraryError::InvalidChoice.to_string().as_str())
                );
            }
            _ => panic!("expected the form back"),
        }
    }

    #[test]
    fn listing_opens_results_and_back_restores_menu() {
        let mut app = app();
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Enter);

        match &app.screen {
            Screen::Results(results) => {
                assert_eq!(results.title, "All Books");
                assert!(results.lines[1].contains("copies_available"));
            }
            _ => panic!("expected results"),
        }
        assert_eq!(status(&app), (StatusKind::Info, "No matching rows.".to_string()));

        press(&mut app, KeyCode::Esc);
        match &app.screen {
            Screen::Menu(menu) => {
                assert_eq!(menu.menu, MenuId::Books);
                assert_eq!(menu.selected, 0);
            }
            _ => panic!("expected the books menu"),
        }
    }

    #[test]
    fn lending_without_copies_reports_the_rule() {
        let mut app = app();
        seed_references(&app);
        let draft = BookDraft {
            title: "Selected Poems".into(),
            author_id: 1,
            genre_id: 1,
            publisher_id: 1,
            language_id: 1,
            year: "1990".into(),
            pages: "120".into(),
            copies: "1".into(),
        };
        add_or_merge_book(&mut app.conn, &draft).unwrap();
        add_reader(&app.conn, "Ivan Petrov", "", "").unwrap();
        add_reader(&app.conn, "Olga Petrova", "", "").unwrap();

        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('2'));
        type_text(&mut app, "1");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "1");
        press(&mut app, KeyCode::Enter);
        assert_eq!(status(&app).0, StatusKind::Info);

        press(&mut app, KeyCode::Char('2'));
        type_text(&mut app, "poems");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "2");
        press(&mut app, KeyCode::Enter);

        let (kind, text) = status(&app);
        assert_eq!(kind, StatusKind::Error);
        assert_eq!(text, LibraryError::NoCopiesAvailable { book_id: 1 }.to_string());
    }

    #[test]
    fn reference_data_stacks_four_tables() {
        let mut app = app();
        seed_references(&app);
        press(&mut app, KeyCode::Char('5'));

        match &app.screen {
            Screen::Results(results) => {
                for heading in ["Authors", "Genres", "Publishers", "Languages"] {
                    assert!(results.lines.iter().any(|line| line == heading));
                }
            }
            _ => panic!("expected results"),
        }
        assert_eq!(status(&app), (StatusKind::Info, "5 rows.".to_string()));
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn long_candidate_lists_scroll_into_view() {
        let mut app = app();
        for number in 1..=30 {
            add_author(&app.conn, &format!("Zed Author {number}"), "").unwrap();
        }
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('4'));
        press(&mut app, KeyCode::Char('5'));
        type_text(&mut app, "zed");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Choosing(_)));

        terminal.draw(|frame| app.draw(frame)).unwrap();
        let before = screen_text(&terminal);
        assert!(before.contains("Zed Author 1 "));
        assert!(!before.contains("Zed Author 30"));

        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::PageDown);
        for _ in 0..5 {
            press(&mut app, KeyCode::Down);
        }
        match &app.mode {
            Mode::Choosing(dialog) => assert_eq!(dialog.scroll, 25),
            _ => panic!("dialog should stay open while scrolling"),
        }

        terminal.draw(|frame| app.draw(frame)).unwrap();
        let after = screen_text(&terminal);
        assert!(after.contains("Zed Author 30"));
        assert!(after.contains("Id: "));

        type_text(&mut app, "30");
        press(&mut app, KeyCode::Enter);
        match &app.screen {
            Screen::Results(results) => assert_eq!(results.title, "Books by author 30"),
            _ => panic!("expected the author's books"),
        }
    }

    #[test]
    fn draws_menu_and_form_without_panicking() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('2'));
        terminal.draw(|frame| app.draw(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Add Book"));
    }
}
