//! Cursor pagination
//!
//! Opaque position tokens over the `(created_at, id)` sort key.
//!
//! Every paginated post query in the application orders by
//! `created_at DESC, id ASC`. The timestamp alone is not unique, so the
//! id is carried as the deterministic tie-break; together they guarantee
//! that no row is skipped or repeated across sequential pages of a static
//! dataset. Offset/skip parameters are never accepted from clients —
//! offsets are not stable under concurrent inserts.
//!
//! `has_more` is always determined by fetching `page_size + 1` rows and
//! trimming the extra one, never by a separate count query.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::data::Post;

/// A position within the `(created_at DESC, id ASC)` order: the sort key
/// of the last row the client has seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPos {
    #[serde(rename = "t")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "i")]
    pub id: String,
}

impl CursorPos {
    /// Position just after `post` in the feed order.
    pub fn after(post: &Post) -> Self {
        Self {
            created_at: post.created_at,
            id: post.id.clone(),
        }
    }

    /// Encode as an opaque single-lane token (user-posts listing).
    pub fn encode(&self) -> String {
        encode_token(self)
    }

    /// Decode a single-lane token. `None` for malformed input.
    pub fn decode(token: &str) -> Option<Self> {
        decode_token(token)
    }
}

/// Compound feed cursor: independent positions for the preferred and
/// backfill lanes.
///
/// The two lanes paginate two disjoint result sets, so chaining them off
/// a single scalar position would skip or repeat rows whenever the
/// preferred pool runs out mid-page. Each lane advances only when its own
/// rows were served.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    #[serde(rename = "p", skip_serializing_if = "Option::is_none", default)]
    pub preferred: Option<CursorPos>,
    #[serde(rename = "b", skip_serializing_if = "Option::is_none", default)]
    pub backfill: Option<CursorPos>,
}

impl FeedCursor {
    /// Encode as an opaque token.
    pub fn encode(&self) -> String {
        encode_token(self)
    }

    /// Decode a client-supplied token, falling back to a fresh first page.
    ///
    /// A malformed or tampered token is not an error: pagination resets to
    /// the top of the feed. The caller never sees a distinction.
    pub fn decode_or_first_page(token: Option<&str>) -> Self {
        match token {
            None => Self::default(),
            Some(raw) => decode_token(raw).unwrap_or_else(|| {
                tracing::debug!("malformed feed cursor; restarting from first page");
                Self::default()
            }),
        }
    }
}

fn encode_token<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_vec(value).expect("cursor serialization is infallible");
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_token<T: DeserializeOwned>(token: &str) -> Option<T> {
    let bytes = URL_SAFE_NO_PAD.decode(token).ok()?;
    serde_json::from_slice(&bytes).ok()
}
