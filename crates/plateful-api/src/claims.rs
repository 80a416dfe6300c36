use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use plateful_types::api::{Claims, ClaimView, CreateClaimRequest, DecideClaimRequest};
use plateful_types::models::ClaimAction;

use crate::auth::AppState;
use crate::convert::{claim_response, claim_view};
use crate::error::ApiError;

/// POST /posts/{post_id}/claims — request a post's item. The store
/// enforces the workflow invariants (post active, not the caller's
/// own, no prior claim) inside one transaction.
pub async fn create_claim(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateClaimRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claim_id = Uuid::new_v4();

    let row = state.db.create_claim(
        &claim_id.to_string(),
        &post_id.to_string(),
        &claims.sub.to_string(),
        req.message.trim(),
    )?;

    Ok((StatusCode::CREATED, Json(claim_response(row)?)))
}

/// POST /claims/{claim_id}/decision — approve or reject. Only the
/// owning post's owner gets past the store; a decided claim cannot be
/// re-decided.
pub async fn decide_claim(
    State(state): State<AppState>,
    Path(claim_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<DecideClaimRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let action: ClaimAction = req
        .action
        .parse()
        .map_err(|_| ApiError::InvalidAction(req.action.clone()))?;

    let row = state
        .db
        .decide_claim(&claim_id.to_string(), &claims.sub.to_string(), action)?;

    Ok(Json(claim_response(row)?))
}

/// GET /claims/incoming — claims other users made on the caller's posts.
pub async fn incoming_claims(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_incoming_claims(&claims.sub.to_string())?;
    let views: Vec<ClaimView> = rows.into_iter().map(claim_view).collect::<Result<_, _>>()?;
    Ok(Json(views))
}

/// GET /claims/outgoing — the caller's claims on other users' posts.
pub async fn outgoing_claims(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.list_outgoing_claims(&claims.sub.to_string())?;
    let views: Vec<ClaimView> = rows.into_iter().map(claim_view).collect::<Result<_, _>>()?;
    Ok(Json(views))
}
