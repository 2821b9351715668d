use std::cmp::min;

/// Menus in the navigation tree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuId {
    Main,
    Books,
    Filters,
    Loans,
    Readers,
    AddReference,
}

/// Everything a menu entry can trigger.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Open(MenuId),
    ListBooks,
    AddBook,
    DeleteCopies,
    BooksByYear,
    BooksByPublisher,
    BooksByGenre,
    BooksByPages,
    BooksByAuthor,
    AvailableBooks,
    ActiveLoans,
    LendBook,
    ReturnBook,
    ListReaders,
    AddReader,
    ReaderLoans,
    AddAuthor,
    AddGenre,
    AddPublisher,
    AddLanguage,
    ReferenceData,
}

pub(crate) struct MenuItem {
    pub(crate) label: &'static str,
    pub(crate) command: Command,
}

const fn item(label: &'static str, command: Command) -> MenuItem {
    MenuItem { label, command }
}

const MAIN_ITEMS: &[MenuItem] = &[
    item("Books", Command::Open(MenuId::Books)),
    item("Loans", Command::Open(MenuId::Loans)),
    item("Readers", Command::Open(MenuId::Readers)),
    item("Add reference data", Command::Open(MenuId::AddReference)),
    item(
        "Reference data (authors, genres, publishers, languages)",
        Command::ReferenceData,
    ),
];

const BOOK_ITEMS: &[MenuItem] = &[
    item("List all books", Command::ListBooks),
    item("Add book", Command::AddBook),
    item("Delete book / copies", Command::DeleteCopies),
    item("Search and filters", Command::Open(MenuId::Filters)),
];

const FILTER_ITEMS: &[MenuItem] = &[
    item("Books by year (<, >, =)", Command::BooksByYear),
    item("Books by publisher", Command::BooksByPublisher),
    item("Books by genre", Command::BooksByGenre),
    item("Books by page count (<, >, =)", Command::BooksByPages),
    item("Books by author", Command::BooksByAuthor),
    item("Available books", Command::AvailableBooks),
];

const LOAN_ITEMS: &[MenuItem] = &[
    item("Active loans", Command::ActiveLoans),
    item("Lend a book", Command::LendBook),
    item("Return a book", Command::ReturnBook),
];

const READER_ITEMS: &[MenuItem] = &[
    item("List readers", Command::ListReaders),
    item("Add reader", Command::AddReader),
    item("Books held by a reader", Command::ReaderLoans),
];

const REFERENCE_ITEMS: &[MenuItem] = &[
    item("Add author", Command::AddAuthor),
    item("Add genre", Command::AddGenre),
    item("Add publisher", Command::AddPublisher),
    item("Add language", Command::AddLanguage),
];

impl MenuId {
    pub(crate) fn title(self) -> &'static str {
        match self {
            MenuId::Main => "Library",
            MenuId::Books => "Books",
            MenuId::Filters => "Search and filters",
            MenuId::Loans => "Loans",
            MenuId::Readers => "Readers",
            MenuId::AddReference => "Add reference data",
        }
    }

    pub(crate) fn items(self) -> &'static [MenuItem] {
        match self {
            MenuId::Main => MAIN_ITEMS,
            MenuId::Books => BOOK_ITEMS,
            MenuId::Filters => FILTER_ITEMS,
            MenuId::Loans => LOAN_ITEMS,
            MenuId::Readers => READER_ITEMS,
            MenuId::AddReference => REFERENCE_ITEMS,
        }
    }

    /// Menu that "back" leads to; `None` for the main menu.
    pub(crate) fn parent(self) -> Option<MenuId> {
        match self {
            MenuId::Main => None,
            MenuId::Filters => Some(MenuId::Books),
            _ => Some(MenuId::Main),
        }
    }
}

/// A menu with a highlighted entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MenuScreen {
    pub(crate) menu: MenuId,
    pub(crate) selected: usize,
}

impl MenuScreen {
    pub(crate) fn new(menu: MenuId) -> Self {
        Self { menu, selected: 0 }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        let len = self.menu.items().len() as isize;
        if len == 0 {
            return;
        }
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    /// Select by the 1-based number shown next to each entry.
    pub(crate) fn select_number(&mut self, number: usize) -> Option<Command> {
        let index = number.checked_sub(1)?;
        let item = self.menu.items().get(index)?;
        self.selected = index;
        Some(item.command)
    }

    pub(crate) fn current_command(&self) -> Option<Command> {
        self.menu.items().get(self.selected).map(|item| item.command)
    }

    /// Screen for the parent menu with the entry that led here highlighted.
    pub(crate) fn parent(&self) -> Option<MenuScreen> {
        let parent = self.menu.parent()?;
        let selected = parent
            .items()
            .iter()
            .position(|item| item.command == Command::Open(self.menu))
            .unwrap_or(0);
        Some(MenuScreen {
            menu: parent,
            selected,
        })
    }
}

/// Rendered table lines with a scroll position. Going back restores the menu
/// the report was launched from.
pub(crate) struct ResultScreen {
    pub(crate) title: String,
    pub(crate) lines: Vec<String>,
    pub(crate) scroll: u16,
    pub(crate) offset: u16,
    pub(crate) return_to: MenuScreen,
}

impl ResultScreen {
    pub(crate) fn new(title: String, lines: Vec<String>, return_to: MenuScreen) -> Self {
        Self {
            title,
            lines,
            scroll: 0,
            offset: 0,
            return_to,
        }
    }

    pub(crate) fn scroll_vertical(&mut self, delta: isize) {
        let max = self.lines.len().saturating_sub(1) as isize;
        let new = (self.scroll as isize + delta).clamp(0, max);
        self.scroll = min(new as usize, u16::MAX as usize) as u16;
    }

    pub(crate) fn scroll_horizontal(&mut self, delta: isize) {
        let widest = self
            .lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let max = widest.saturating_sub(1) as isize;
        let new = (self.offset as isize + delta).clamp(0, max);
        self.offset = min(new as usize, u16::MAX as usize) as u16;
    }

    pub(crate) fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub(crate) fn scroll_to_bottom(&mut self) {
        self.scroll = min(self.lines.len().saturating_sub(1), u16::MAX as usize) as u16;
    }
}
