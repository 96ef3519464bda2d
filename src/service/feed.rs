//! Feed assembly
//!
//! The one authoritative implementation of feed construction: author set
//! from the friend graph, tag preferences, a preferred lane and an
//! optional backfill lane, merged preferred-first under a compound
//! cursor.
//!
//! Lane rules:
//! - preferred: posts by the author set that match the viewer's tags; an
//!   empty tag set degenerates to "all posts by the author set".
//! - backfill: posts by the author set matching none of the tags; runs
//!   only when the viewer opted in and has tags, and only fills whatever
//!   the preferred lane left open. Purely chronological, like preferred.
//!
//! The two lanes paginate independently (`FeedCursor` keeps a position
//! per lane). Within one page preferred rows always precede backfill
//! rows; the groups are never interleaved by timestamp.

use std::collections::HashSet;
use std::sync::Arc;

use crate::data::{Database, Post, TagFilter};
use crate::error::AppError;
use crate::metrics::{FEED_ASSEMBLY_DURATION_SECONDS, FEED_PAGES_TOTAL};
use crate::pagination::{CursorPos, FeedCursor};
use crate::service::{FriendGraphService, PreferenceService};

/// One assembled feed page
#[derive(Debug)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub next_cursor: Option<FeedCursor>,
    /// Whether any backfill rows were served on this page
    pub backfill_used: bool,
}

/// Outcome of the backfill lane for one request
enum BackfillLane {
    /// Backfill disabled, or no tags to backfill against
    Ineligible,
    /// The query failed; the lane position must not advance
    Failed,
    /// Rows fetched (up to page_size + 1)
    Fetched(Vec<Post>),
}

/// Feed service
pub struct FeedService {
    db: Arc<Database>,
    friend_graph: FriendGraphService,
    preferences: PreferenceService,
}

impl FeedService {
    /// Create new feed service
    pub fn new(db: Arc<Database>) -> Self {
        let friend_graph = FriendGraphService::new(db.clone());
        let preferences = PreferenceService::new(db.clone());
        Self {
            db,
            friend_graph,
            preferences,
        }
    }

    /// Assemble one feed page for a viewer.
    ///
    /// A preferred-lane failure propagates; a backfill-lane failure
    /// degrades to a preferred-only page whose cursor leaves the backfill
    /// position untouched, so the next request retries the lane.
    pub async fn assemble(
        &self,
        viewer_id: &str,
        cursor: &FeedCursor,
        page_size: usize,
    ) -> Result<FeedPage, AppError> {
        let timer = FEED_ASSEMBLY_DURATION_SECONDS.start_timer();

        // A viewer always sees their own posts plus friends'.
        let peers = self.friend_graph.peer_ids_of(viewer_id).await?;
        let mut authors: Vec<String> = peers.into_iter().collect();
        authors.push(viewer_id.to_string());
        authors.sort_unstable();
        authors.dedup();

        let (tags, backfill_enabled) = self.preferences.preferences_of(viewer_id).await?;

        // page_size + 1 per lane: the extra row answers has-more without
        // a count query.
        let fetch = page_size + 1;
        let backfill_eligible = backfill_enabled && !tags.is_empty();

        let (preferred_result, backfill_lane) = if backfill_eligible {
            // No data dependency between the lanes; issue both at once
            // and merge only after both complete.
            let (preferred, backfill) = tokio::join!(
                self.db.posts_by_authors(
                    &authors,
                    TagFilter::MatchesAny(&tags),
                    cursor.preferred.as_ref(),
                    fetch,
                ),
                self.db.posts_by_authors(
                    &authors,
                    TagFilter::MatchesNone(&tags),
                    cursor.backfill.as_ref(),
                    fetch,
                ),
            );

            let backfill_lane = match backfill {
                Ok(rows) => BackfillLane::Fetched(rows),
                Err(error) => {
                    tracing::warn!(
                        %error,
                        viewer = %viewer_id,
                        "backfill query failed; serving preferred rows only"
                    );
                    BackfillLane::Failed
                }
            };
            (preferred, backfill_lane)
        } else {
            let preferred = self
                .db
                .posts_by_authors(
                    &authors,
                    TagFilter::MatchesAny(&tags),
                    cursor.preferred.as_ref(),
                    fetch,
                )
                .await;
            (preferred, BackfillLane::Ineligible)
        };

        // No feed is better than a silently wrong one.
        let preferred_rows = preferred_result?;

        let page = merge_page(preferred_rows, backfill_lane, cursor, page_size);

        FEED_PAGES_TOTAL
            .with_label_values(&[if page.backfill_used { "used" } else { "unused" }])
            .inc();
        timer.observe_duration();

        Ok(page)
    }
}

/// Merge both lanes into a page and derive the compound next-cursor.
///
/// Pure function; all pagination correctness lives here. Each lane's
/// position advances only past rows that were actually served from it.
fn merge_page(
    mut preferred_rows: Vec<Post>,
    backfill_lane: BackfillLane,
    prior: &FeedCursor,
    page_size: usize,
) -> FeedPage {
    let preferred_has_more = preferred_rows.len() > page_size;
    preferred_rows.truncate(page_size);

    let mut page = preferred_rows;
    let preferred_pos = page
        .last()
        .map(CursorPos::after)
        .or_else(|| prior.preferred.clone());

    let room = page_size - page.len();
    let mut backfill_pos = prior.backfill.clone();
    let mut backfill_has_more = false;
    let mut backfill_retry = false;
    let mut backfill_used = false;

    match backfill_lane {
        BackfillLane::Ineligible => {}
        BackfillLane::Failed => {
            // Unknown whether the lane has rows; keep the page chainable
            // so the next request can retry from the same position.
            backfill_retry = room > 0;
        }
        BackfillLane::Fetched(mut rows) => {
            if room > 0 {
                backfill_has_more = rows.len() > room;
                rows.truncate(room);
                if let Some(last) = rows.last() {
                    backfill_pos = Some(CursorPos::after(last));
                    backfill_used = true;
                }
                page.extend(rows);
            } else {
                // Preferred filled the page; fetched rows stay unserved
                // and the lane position stays put.
                backfill_has_more = !rows.is_empty();
            }
        }
    }

    // Proof obligation, not an accident of the current predicates: the
    // lanes are disjoint (intersects vs. not-intersects when tags are
    // set; no backfill at all when they are not), so an id can never
    // appear twice. Enforce it anyway.
    let mut seen = HashSet::new();
    page.retain(|post| {
        let fresh = seen.insert(post.id.clone());
        debug_assert!(fresh, "duplicate post across feed lanes: {}", post.id);
        fresh
    });

    let has_more = preferred_has_more || backfill_has_more || backfill_retry;
    let next_cursor = has_more.then(|| FeedCursor {
        preferred: preferred_pos,
        backfill: backfill_pos,
    });

    FeedPage {
        posts: page,
        next_cursor,
        backfill_used,
    }
}
