//! HTTP route handlers.

mod documents;
mod health;
mod search;

pub use documents::{clear_handler, index_handler};
pub use health::{health_handler, status_handler};
pub use search::search_handler;
