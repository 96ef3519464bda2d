//! Feed preferences
//!
//! Read and write a user's tag choices and backfill flag. The read side
//! is the Preference Store Accessor the feed assembler consumes.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Database, FeedPreference, is_valid_tag};
use crate::error::AppError;

/// Preference service
pub struct PreferenceService {
    db: Arc<Database>,
}

impl PreferenceService {
    /// Create new preference service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// A user's chosen tags and backfill flag.
    ///
    /// A missing row means "no tags, backfill disabled" — preferences are
    /// created lazily on first save.
    pub async fn preferences_of(&self, user_id: &str) -> Result<(Vec<String>, bool), AppError> {
        let preference = self.db.get_feed_preference(user_id).await?;

        Ok(match preference {
            Some(preference) => (preference.tags, preference.backfill),
            None => (Vec::new(), false),
        })
    }

    /// Full preference row for the API, with the lazy default applied
    pub async fn get(&self, user_id: &str) -> Result<FeedPreference, AppError> {
        let preference = self.db.get_feed_preference(user_id).await?;

        Ok(preference.unwrap_or_else(|| FeedPreference {
            user_id: user_id.to_string(),
            tags: Vec::new(),
            backfill: false,
            updated_at: Utc::now(),
        }))
    }

    /// Save preferences, validating tags against the vocabulary and
    /// dropping duplicates while preserving order.
    pub async fn save(
        &self,
        user_id: &str,
        tags: Vec<String>,
        backfill: bool,
    ) -> Result<FeedPreference, AppError> {
        let mut deduped: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !is_valid_tag(&tag) {
                return Err(AppError::Validation(format!("unknown tag: {}", tag)));
            }
            if !deduped.contains(&tag) {
                deduped.push(tag);
            }
        }

        let preference = FeedPreference {
            user_id: user_id.to_string(),
            tags: deduped,
            backfill,
            updated_at: Utc::now(),
        };
        self.db.upsert_feed_preference(&preference).await?;

        Ok(preference)
    }
}
