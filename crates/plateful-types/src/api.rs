use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ClaimStatus, PostStatus, Role};

// -- JWT Claims --

/// JWT claims carried on every authenticated request. The role travels
/// in the token so privileged handlers can check it without a user
/// lookup; the middleware re-validates it against the closed enum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    /// Optional; defaults to "user". Validated against the closed set.
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub token: String,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Minutes until the post expires; omit for no expiry.
    #[serde(default)]
    pub expires_in_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub description: String,
    pub category: String,
    pub quantity: String,
    pub dietary_tags: Vec<String>,
    pub location: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

// -- Claims --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateClaimRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub claimer_id: Uuid,
    pub message: String,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// Decision body. The action is a raw string so a bad value maps to
/// the API's invalid-action error instead of a generic deserialize 422.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecideClaimRequest {
    pub action: String,
}

/// A claim joined with enough post context to render a list row:
/// incoming (claims on my posts) or outgoing (my claims on others').
#[derive(Debug, Serialize)]
pub struct ClaimView {
    pub claim_id: Uuid,
    pub post_id: Uuid,
    pub post_description: String,
    pub post_status: PostStatus,
    pub counterpart_email: String,
    pub message: String,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

// -- Stats --

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub available: i64,
    pub shared: i64,
    pub total: i64,
    pub co2_estimate: i64,
}

impl StatsResponse {
    pub fn zero() -> Self {
        Self {
            available: 0,
            shared: 0,
            total: 0,
            co2_estimate: 0,
        }
    }
}
