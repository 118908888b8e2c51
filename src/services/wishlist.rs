//! Wishlist toggling and listing

use anyhow::Result;
use tracing::debug;

use crate::db::Database;

use super::catalog::{CatalogService, ContentListItem};

#[derive(Clone)]
pub struct WishlistService {
    db: Database,
}

impl WishlistService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Flip the wishlist state for the pair and return the new state.
    ///
    /// `None` if the content does not exist.
    pub async fn toggle(&self, user_id: i64, content_id: i64) -> Result<Option<bool>> {
        if !self.db.contents().exists(content_id).await? {
            return Ok(None);
        }

        let wishlists = self.db.wishlists();
        let now_wishlisted = if wishlists.remove(user_id, content_id).await? {
            false
        } else {
            wishlists.add(user_id, content_id).await?;
            true
        };

        debug!(user_id, content_id, now_wishlisted, "Wishlist toggled");
        Ok(Some(now_wishlisted))
    }

    /// Wishlisted content as list items, most recently added first
    pub async fn list(&self, user_id: i64) -> Result<Vec<ContentListItem>> {
        let rows = self.db.wishlists().list_contents(user_id).await?;
        CatalogService::new(self.db.clone())
            .decorate(rows, Some(user_id))
            .await
    }
}
