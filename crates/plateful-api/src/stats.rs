use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::warn;

use plateful_types::api::{Claims, StatsResponse};

use crate::auth::AppState;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// When true, counts only the caller's own posts.
    #[serde(default)]
    pub mine: bool,
}

/// GET /stats — post counts plus the CO2 display heuristic. A storage
/// failure degrades to zeroed stats instead of failing the page.
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let owner = query.mine.then(|| claims.sub.to_string());

    let stats = match state.db.compute_stats(owner.as_deref()) {
        Ok(row) => StatsResponse {
            available: row.available,
            shared: row.shared,
            total: row.total,
            co2_estimate: row.co2_estimate(),
        },
        Err(e) => {
            warn!("Stats unavailable, serving zeros: {}", e);
            StatsResponse::zero()
        }
    };

    Json(stats)
}
