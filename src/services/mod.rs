pub mod detail;
pub mod favorites;
pub mod feed;

pub use detail::DetailLoader;
pub use favorites::{Confirm, FavoriteSet, FavoritesStore};
pub use feed::{FeedAccumulator, RoundOutcome};
