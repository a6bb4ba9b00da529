//! Data model for harvested comments
//!
//! - `Record`: one harvested comment, deduplicated by its remote `id`
//! - `Page`: one decoded API response, consumed as soon as it is fetched
//! - `Cursor`: the resume point persisted between runs

mod cursor;
mod page;
mod record;

pub use cursor::Cursor;
pub use page::{ApiResponse, Page};
pub use record::{decode_content, encode_content, Record, RecordSchema};
