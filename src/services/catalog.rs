//! Catalog browsing: paged listings, search, genre filter and detail
//!
//! Genre names and wishlist flags for a listing are fetched with one batched
//! query each for the whole page.

use anyhow::Result;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::{ContentFilter, ContentSummary, Database, GenreRecord};

use super::pagination::{Page, PageRequest};

/// Content entry in a listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContentListItem {
    pub id: i64,
    pub title: String,
    pub thumbnail_url: String,
    pub release_year: i64,
    pub genres: Vec<String>,
    pub is_wishlisted: bool,
}

/// Full content view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContentDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub video_url: String,
    pub duration: i64,
    pub release_year: i64,
    pub genres: Vec<GenreRecord>,
    pub is_wishlisted: bool,
    pub last_position: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// One page of the catalog slice selected by `filter`. `viewer` drives the
    /// wishlist flags; anonymous callers see them all unset.
    pub async fn list(
        &self,
        filter: ContentFilter<'_>,
        request: PageRequest,
        viewer: Option<i64>,
    ) -> Result<Page<ContentListItem>> {
        let contents = self.db.contents();
        let total = contents.count(filter).await?;
        let rows = contents
            .list_page(filter, request.size, request.offset())
            .await?;

        let items = self.decorate(rows, viewer).await?;
        Ok(Page::new(items, request, total))
    }

    /// Detail view, or `None` if the content does not exist
    pub async fn detail(&self, content_id: i64, viewer: Option<i64>) -> Result<Option<ContentDetail>> {
        let Some(content) = self.db.contents().get_by_id(content_id).await? else {
            return Ok(None);
        };

        let genres = self.db.genres().list_for_content(content_id).await?;
        let (is_wishlisted, last_position) = match viewer {
            Some(user_id) => (
                self.db.wishlists().contains(user_id, content_id).await?,
                self.db
                    .viewing_history()
                    .last_position(user_id, content_id)
                    .await?
                    .unwrap_or(0),
            ),
            None => (false, 0),
        };

        Ok(Some(ContentDetail {
            id: content.id,
            title: content.title,
            description: content.description,
            thumbnail_url: content.thumbnail_url,
            video_url: content.video_url,
            duration: content.duration,
            release_year: content.release_year,
            genres,
            is_wishlisted,
            last_position,
        }))
    }

    pub async fn genres(&self) -> Result<Vec<GenreRecord>> {
        self.db.genres().list_all().await
    }

    /// Attach genre names and wishlist flags to a batch of rows
    pub(crate) async fn decorate(
        &self,
        rows: Vec<ContentSummary>,
        viewer: Option<i64>,
    ) -> Result<Vec<ContentListItem>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut genre_names = self.db.genres().names_for_contents(&ids).await?;
        let wishlisted = match viewer {
            Some(user_id) => self.db.wishlists().contained_among(user_id, &ids).await?,
            None => Default::default(),
        };

        Ok(rows
            .into_iter()
            .map(|row| ContentListItem {
                genres: genre_names.remove(&row.id).unwrap_or_default(),
                is_wishlisted: wishlisted.contains(&row.id),
                id: row.id,
                title: row.title,
                thumbnail_url: row.thumbnail_url,
                release_year: row.release_year,
            })
            .collect())
    }
}
