pub mod author;
pub mod comment;
pub mod post;
pub mod tag;

pub use author::Author;
pub use comment::Comment;
pub use post::{Post, PostStatus, PostWithAuthor};
pub use tag::Tag;

/// Current time in the storage format shared by every timestamp column.
///
/// Fixed precision keeps lexical order equal to chronological order.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
