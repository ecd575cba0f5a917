pub mod de;
pub mod mapping;
pub mod models;

pub use models::{Character, Comic, ComicDate, ComicDetail, Thumbnail};
