//! Ratatui front-end. Menus pick a command, forms collect raw text, and every
//! outcome comes back as table lines or a footer message.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
