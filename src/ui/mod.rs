//! Ratatui front end for reviewing buildings one at a time.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
