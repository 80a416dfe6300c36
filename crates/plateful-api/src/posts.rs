use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use plateful_types::api::{Claims, CreatePostRequest, PostResponse};

use crate::auth::AppState;
use crate::convert::post_response;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let description = req.description.trim();
    if description.is_empty() {
        return Err(ApiError::BadRequest("description is required".into()));
    }
    if let Some(minutes) = req.expires_in_minutes {
        if minutes <= 0 {
            return Err(ApiError::BadRequest(
                "expires_in_minutes must be positive".into(),
            ));
        }
    }

    let post_id = Uuid::new_v4();
    let tags = req.dietary_tags.join(",");

    let row = state.db.create_post(
        &post_id.to_string(),
        &claims.sub.to_string(),
        description,
        req.category.as_deref().unwrap_or("other"),
        req.quantity.as_deref().unwrap_or(""),
        &tags,
        req.location.as_deref().unwrap_or(""),
        req.expires_in_minutes,
    )?;

    Ok((StatusCode::CREATED, Json(post_response(row)?)))
}

/// GET /posts — the shared feed, newest first.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_posts(query.limit.min(200))?;
    let posts: Vec<PostResponse> = rows
        .into_iter()
        .map(post_response)
        .collect::<Result<_, _>>()?;
    Ok(Json(posts))
}

/// GET /posts/mine — the caller's own listings.
pub async fn my_posts(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state
        .db
        .list_posts_by_owner(&claims.sub.to_string(), query.limit.min(200))?;
    let posts: Vec<PostResponse> = rows
        .into_iter()
        .map(post_response)
        .collect::<Result<_, _>>()?;
    Ok(Json(posts))
}
