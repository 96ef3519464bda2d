//! Tag endpoints

use axum::{extract::State, response::Json};

use crate::AppState;
use crate::data::TAG_VOCABULARY;
use crate::error::AppError;

use super::dto::TrendingTagResponse;

/// GET /tags
///
/// The fixed vocabulary; clients render it as the pickable tag list.
pub async fn list_tags() -> Json<Vec<&'static str>> {
    Json(TAG_VOCABULARY.to_vec())
}

/// GET /tags/trending
pub async fn trending_tags(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrendingTagResponse>>, AppError> {
    let trending = state.db.trending_tags(5).await?;

    Ok(Json(
        trending
            .into_iter()
            .map(|(name, count)| TrendingTagResponse { name, count })
            .collect(),
    ))
}
