//! HTTP request handlers.

mod download;
mod list;
mod search;
mod upload;

pub use download::download_handler;
pub use list::list_handler;
pub use search::search_handler;
pub use upload::upload_handler;
