//! Row-to-response conversions shared by the handler modules.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use plateful_db::models::{ClaimRow, ClaimViewRow, PostRow};
use plateful_types::api::{ClaimResponse, ClaimView, PostResponse};
use plateful_types::models::{ClaimStatus, PostStatus};

use crate::error::ApiError;

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC, falling back through RFC 3339 first.
pub fn parse_ts(value: &str, context: &str) -> DateTime<Utc> {
    value
        .parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", value, context, e);
            DateTime::default()
        })
}

pub fn parse_opt_ts(value: Option<&str>, context: &str) -> Option<DateTime<Utc>> {
    value.map(|v| parse_ts(v, context))
}

pub fn parse_id(value: &str, context: &str) -> Uuid {
    value.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", value, context, e);
        Uuid::default()
    })
}

/// Status columns are held to the closed enums; a row with an unknown
/// status is corrupt and surfaces as a 500 rather than a guess.
fn parse_post_status(value: &str, context: &str) -> Result<PostStatus, ApiError> {
    value.parse().map_err(|e| {
        warn!("Corrupt post status on {}: {}", context, e);
        ApiError::Internal
    })
}

fn parse_claim_status(value: &str, context: &str) -> Result<ClaimStatus, ApiError> {
    value.parse().map_err(|e| {
        warn!("Corrupt claim status on {}: {}", context, e);
        ApiError::Internal
    })
}

fn split_tags(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn post_response(row: PostRow) -> Result<PostResponse, ApiError> {
    let status = parse_post_status(&row.status, &row.id)?;
    Ok(PostResponse {
        id: parse_id(&row.id, "post"),
        owner_id: parse_id(&row.owner_id, &row.id),
        owner_email: row.owner_email,
        description: row.description,
        category: row.category,
        quantity: row.quantity,
        dietary_tags: split_tags(&row.dietary_tags),
        location: row.location,
        status,
        created_at: parse_ts(&row.created_at, &row.id),
        expires_at: parse_opt_ts(row.expires_at.as_deref(), &row.id),
    })
}

pub fn claim_response(row: ClaimRow) -> Result<ClaimResponse, ApiError> {
    let status = parse_claim_status(&row.status, &row.id)?;
    Ok(ClaimResponse {
        id: parse_id(&row.id, "claim"),
        post_id: parse_id(&row.post_id, &row.id),
        claimer_id: parse_id(&row.claimer_id, &row.id),
        message: row.message,
        status,
        created_at: parse_ts(&row.created_at, &row.id),
        decided_at: parse_opt_ts(row.decided_at.as_deref(), &row.id),
    })
}

pub fn claim_view(row: ClaimViewRow) -> Result<ClaimView, ApiError> {
    let status = parse_claim_status(&row.status, &row.claim_id)?;
    let post_status = parse_post_status(&row.post_status, &row.post_id)?;
    Ok(ClaimView {
        claim_id: parse_id(&row.claim_id, "claim"),
        post_id: parse_id(&row.post_id, &row.claim_id),
        post_description: row.post_description,
        post_status,
        counterpart_email: row.counterpart_email,
        message: row.message,
        status,
        created_at: parse_ts(&row.created_at, &row.claim_id),
        decided_at: parse_opt_ts(row.decided_at.as_deref(), &row.claim_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sqlite_default_format() {
        let ts = parse_ts("2026-03-01 12:30:00", "test");
        assert_eq!(ts.to_rfc3339(), "2026-03-01T12:30:00+00:00");
    }

    #[test]
    fn parses_rfc3339() {
        let ts = parse_ts("2026-03-01T12:30:00Z", "test");
        assert_eq!(ts.timestamp(), 1772368200);
    }

    #[test]
    fn splits_and_trims_tags() {
        assert_eq!(split_tags("vegan, halal ,"), vec!["vegan", "halal"]);
        assert!(split_tags("").is_empty());
    }
}
