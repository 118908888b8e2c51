//! Business logic between the HTTP layer and the repositories

pub mod auth;
pub mod catalog;
pub mod pagination;
pub mod playback;
pub mod wishlist;

pub use auth::{AuthConfig, AuthError, AuthService, AuthenticatedUser};
pub use catalog::{CatalogService, ContentDetail, ContentListItem};
pub use pagination::{Page, PageRequest};
pub use playback::{HistoryEntry, PlaybackService, PlaybackState, StreamInfo};
pub use wishlist::WishlistService;
