use std::cmp::min;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::db::resolver::{self, Disambiguation, Lookup};
use crate::error::{LibraryError, LibraryResult};

use super::screens::Command;

/// How a field filters keystrokes and what it shows while empty.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    Optional,
    Number,
    Date,
    Operator,
    /// An id or part of a name, resolved before the form is executed.
    Lookup(Lookup),
}

#[derive(Clone, Debug)]
pub(crate) struct FormField {
    pub(crate) label: &'static str,
    pub(crate) kind: FieldKind,
    pub(crate) value: String,
    pub(crate) resolved: Option<i64>,
}

impl FormField {
    fn new(label: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            kind,
            value: String::new(),
            resolved: None,
        }
    }

    fn placeholder(&self) -> &'static str {
        match self.kind {
            FieldKind::Text | FieldKind::Number => "<required>",
            FieldKind::Optional => "<optional>",
            FieldKind::Date => "<YYYY-MM-DD, empty for today>",
            FieldKind::Operator => "<, > or =",
            FieldKind::Lookup(_) => "<id or part of the name>",
        }
    }

    fn accepts(&self, ch: char) -> bool {
        match self.kind {
            FieldKind::Number => ch.is_ascii_digit(),
            FieldKind::Date => ch.is_ascii_digit() || ch == '-',
            FieldKind::Operator => matches!(ch, '<' | '>' | '='),
            FieldKind::Text | FieldKind::Optional | FieldKind::Lookup(_) => !ch.is_control(),
        }
    }
}

/// Input form for one command. Values stay raw strings; the core validates
/// them when the form is submitted.
#[derive(Clone, Debug)]
pub(crate) struct Form {
    pub(crate) command: Command,
    pub(crate) title: &'static str,
    pub(crate) fields: Vec<FormField>,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl Form {
    /// Form for a command that needs input, or `None` when it runs directly.
    pub(crate) fn for_command(command: Command) -> Option<Self> {
        let (title, fields): (&'static str, Vec<FormField>) = match command {
            Command::AddBook => (
                "Add Book",
                vec![
                    FormField::new("Title", FieldKind::Text),
                    FormField::new("Author", FieldKind::Lookup(resolver::AUTHORS)),
                    FormField::new("Genre", FieldKind::Lookup(resolver::GENRES)),
                    FormField::new("Publisher", FieldKind::Lookup(resolver::PUBLISHERS)),
                    FormField::new("Language", FieldKind::Lookup(resolver::LANGUAGES)),
                    FormField::new("Year", FieldKind::Number),
                    FormField::new("Pages", FieldKind::Number),
                    FormField::new("Copies", FieldKind::Number),
                ],
            ),
            Command::DeleteCopies => (
                "Delete Copies",
                vec![
                    FormField::new("Book", FieldKind::Lookup(resolver::BOOKS)),
                    FormField::new("Copies to remove", FieldKind::Number),
                ],
            ),
            Command::BooksByYear => (
                "Books by Year",
                vec![
                    FormField::new("Operator", FieldKind::Operator),
                    FormField::new("Year", FieldKind::Number),
                ],
            ),
            Command::BooksByPages => (
                "Books by Page Count",
                vec![
                    FormField::new("Operator", FieldKind::Operator),
                    FormField::new("Pages", FieldKind::Number),
                ],
            ),
            Command::BooksByAuthor => (
                "Books by Author",
                vec![FormField::new("Author", FieldKind::Lookup(resolver::AUTHORS))],
            ),
            Command::BooksByGenre => (
                "Books by Genre",
                vec![FormField::new("Genre", FieldKind::Lookup(resolver::GENRES))],
            ),
            Command::BooksByPublisher => (
                "Books by Publisher",
                vec![FormField::new("Publisher", FieldKind::Lookup(resolver::PUBLISHERS))],
            ),
            Command::LendBook => (
                "Lend a Book",
                vec![
                    FormField::new("Book", FieldKind::Lookup(resolver::BOOKS)),
                    FormField::new("Reader", FieldKind::Lookup(resolver::READERS)),
                    FormField::new("Loan date", FieldKind::Date),
                ],
            ),
            Command::ReturnBook => (
                "Return a Book",
                vec![
                    FormField::new("Loan id", FieldKind::Number),
                    FormField::new("Return date", FieldKind::Date),
                ],
            ),
            Command::AddReader => (
                "Add Reader",
                vec![
                    FormField::new("Full name", FieldKind::Text),
                    FormField::new("Phone", FieldKind::Optional),
                    FormField::new("Email", FieldKind::Optional),
                ],
            ),
            Command::ReaderLoans => (
                "Books Held by a Reader",
                vec![FormField::new("Reader", FieldKind::Lookup(resolver::READERS))],
            ),
            Command::AddAuthor => (
                "Add Author",
                vec![
                    FormField::new("Name", FieldKind::Text),
                    FormField::new("Country", FieldKind::Optional),
                ],
            ),
            Command::AddGenre => ("Add Genre", vec![FormField::new("Name", FieldKind::Text)]),
            Command::AddPublisher => (
                "Add Publisher",
                vec![
                    FormField::new("Name", FieldKind::Text),
                    FormField::new("City", FieldKind::Optional),
                ],
            ),
            Command::AddLanguage => ("Add Language", vec![FormField::new("Name", FieldKind::Text)]),
            Command::Open(_)
            | Command::ListBooks
            | Command::AvailableBooks
            | Command::ActiveLoans
            | Command::ListReaders
            | Command::ReferenceData => return None,
        };

        Some(Self {
            command,
            title,
            fields,
            active: 0,
            error: None,
        })
    }

    pub(crate) fn next_field(&mut self) {
        self.active = (self.active + 1) % self.fields.len();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = (self.active + self.fields.len() - 1) % self.fields.len();
    }

    /// Append a character to the active field if its kind allows it.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let Some(field) = self.fields.get_mut(self.active) else {
            return false;
        };
        if !field.accepts(ch) {
            return false;
        }
        field.value.push(ch);
        field.resolved = None;
        true
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.active) {
            field.value.pop();
            field.resolved = None;
        }
    }

    /// Trimmed raw value of a field.
    pub(crate) fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|field| field.value.trim())
            .unwrap_or("")
    }

    /// Id resolved for a lookup field during submission.
    pub(crate) fn resolved_id(&self, index: usize) -> LibraryResult<i64> {
        self.fields
            .get(index)
            .and_then(|field| field.resolved)
            .ok_or(LibraryError::EmptyInput)
    }

    /// First lookup field that still needs resolving.
    pub(crate) fn next_unresolved(&self) -> Option<(usize, Lookup)> {
        self.fields
            .iter()
            .enumerate()
            .find_map(|(index, field)| match field.kind {
                FieldKind::Lookup(lookup) if field.resolved.is_none() => Some((index, lookup)),
                _ => None,
            })
    }

    /// Record the id a lookup field resolved to and show it in place of the
    /// typed text.
    pub(crate) fn set_resolved(&mut self, index: usize, id: i64) {
        if let Some(field) = self.fields.get_mut(index) {
            field.resolved = Some(id);
            field.value = id.to_string();
        }
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, index: usize) -> Line<'static> {
        let Some(field) = self.fields.get(index) else {
            return Line::from("");
        };
        let is_active = index == self.active;

        let display = if field.value.is_empty() {
            field.placeholder().to_string()
        } else {
            field.value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if field.value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        let mut spans = vec![
            Span::raw(format!("{}: ", field.label)),
            Span::styled(display, style),
        ];
        if field.resolved.is_some() {
            spans.push(Span::styled(" ✓", Style::default().fg(Color::Green)));
        }
        Line::from(spans)
    }

    /// Cursor column offset for the active field, in characters.
    pub(crate) fn cursor_offset(&self) -> usize {
        self.fields
            .get(self.active)
            .map(|field| field.label.chars().count() + 2 + field.value.chars().count())
            .unwrap_or(0)
    }
}

/// Pick-an-id dialog shown when a lookup matched several rows. It keeps the
/// suspended form so submission can resume once the choice is made.
pub(crate) struct ChoiceDialog {
    pub(crate) pending: Disambiguation,
    pub(crate) lines: Vec<String>,
    pub(crate) input: String,
    pub(crate) form: Form,
    pub(crate) field: usize,
    /// First candidate line shown.
    pub(crate) scroll: u16,
}

impl ChoiceDialog {
    pub(crate) fn new(
        pending: Disambiguation,
        lines: Vec<String>,
        form: Form,
        field: usize,
    ) -> Self {
        Self {
            pending,
            lines,
            input: String::new(),
            form,
            field,
            scroll: 0,
        }
    }

    pub(crate) fn prompt(&self) -> String {
        format!(
            "Several {}s match '{}'. Enter one of the listed ids:",
            self.pending.lookup.label, self.pending.query
        )
    }

    /// Any printable character is accepted so a mistyped answer can be
    /// reported as an invalid choice.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.input.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.input.pop();
    }

    pub(crate) fn scroll_candidates(&mut self, delta: isize) {
        let max = self.lines.len().saturating_sub(1) as isize;
        let new = (self.scroll as isize + delta).clamp(0, max);
        self.scroll = min(new as usize, u16::MAX as usize) as u16;
    }

    pub(crate) fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub(crate) fn scroll_to_bottom(&mut self) {
        self.scroll = min(self.lines.len().saturating_sub(1), u16::MAX as usize) as u16;
    }
}
