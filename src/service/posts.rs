//! Post service
//!
//! Creation, lookup and deletion of posts, plus the single-author
//! listing used by profile pages.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Database, EntityId, Post, TagFilter, is_valid_tag};
use crate::error::AppError;
use crate::pagination::CursorPos;

/// Input for a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub content: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

/// One page of a single-author listing
#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub next_cursor: Option<CursorPos>,
}

/// Post service
pub struct PostService {
    db: Arc<Database>,
}

impl PostService {
    /// Create new post service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a post owned by `author_id`.
    ///
    /// Content must be non-empty and at least one vocabulary tag is
    /// required; duplicates are dropped.
    pub async fn create(&self, author_id: &str, input: NewPost) -> Result<Post, AppError> {
        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("post content is required".to_string()));
        }

        let mut tags: Vec<String> = Vec::with_capacity(input.tags.len());
        for tag in input.tags {
            if !is_valid_tag(&tag) {
                return Err(AppError::Validation(format!("unknown tag: {}", tag)));
            }
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        if tags.is_empty() {
            return Err(AppError::Validation(
                "at least one tag is required".to_string(),
            ));
        }

        let now = Utc::now();
        let post = Post {
            id: EntityId::new().0,
            author_id: author_id.to_string(),
            content: content.to_string(),
            image_url: input.image_url,
            tags,
            created_at: now,
            updated_at: now,
        };
        self.db.insert_post(&post).await?;

        tracing::info!(post_id = %post.id, author = %post.author_id, "Post created");

        Ok(post)
    }

    /// Get a post by id
    pub async fn get(&self, id: &str) -> Result<Post, AppError> {
        self.db.get_post(id).await?.ok_or(AppError::NotFound)
    }

    /// Delete a post. Only the author may delete it.
    pub async fn delete(&self, caller_id: &str, id: &str) -> Result<(), AppError> {
        let post = self.db.get_post(id).await?.ok_or(AppError::NotFound)?;
        if post.author_id != caller_id {
            return Err(AppError::Forbidden);
        }

        self.db.delete_post(id).await?;

        tracing::info!(post_id = %id, "Post deleted");

        Ok(())
    }

    /// Chronological page of one author's posts
    pub async fn posts_of_author(
        &self,
        author_id: &str,
        after: Option<&CursorPos>,
        page_size: usize,
    ) -> Result<PostPage, AppError> {
        let authors = [author_id.to_string()];
        let mut rows = self
            .db
            .posts_by_authors(&authors, TagFilter::Any, after, page_size + 1)
            .await?;

        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        let next_cursor = if has_more {
            rows.last().map(CursorPos::after)
        } else {
            None
        };

        Ok(PostPage {
            posts: rows,
            next_cursor,
        })
    }
}
