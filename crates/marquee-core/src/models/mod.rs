pub mod catalog;
pub mod movie;
pub mod rating;

pub use catalog::MovieCatalog;
pub use movie::{MovieRecord, NO_GENRES, format_runtime, trim_forum_url};
pub use rating::{Rating, ScoreInput, normalize};
