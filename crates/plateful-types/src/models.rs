use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Stored as text in the DB but parsed back into this
/// enum at every boundary — an unknown role string is an error, not a
/// fourth role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Business,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Business => "business",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "business" => Ok(Role::Business),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// Lifecycle of a post. `Active` flips to `Claimed` when the owner
/// approves a claim; there is no transition back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Active,
    Claimed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Claimed => "claimed",
        }
    }
}

impl FromStr for PostStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PostStatus::Active),
            "claimed" => Ok(PostStatus::Claimed),
            other => Err(UnknownVariant::new("post status", other)),
        }
    }
}

/// Lifecycle of a claim. Leaves `Pending` exactly once, via the post
/// owner's decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ClaimStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            other => Err(UnknownVariant::new("claim status", other)),
        }
    }
}

/// The two things an owner can do with a pending claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimAction {
    Approve,
    Reject,
}

impl ClaimAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimAction::Approve => "approve",
            ClaimAction::Reject => "reject",
        }
    }
}

impl FromStr for ClaimAction {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(ClaimAction::Approve),
            "reject" => Ok(ClaimAction::Reject),
            other => Err(UnknownVariant::new("claim action", other)),
        }
    }
}

/// Parse failure for any of the closed string enums above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub category: String,
    pub quantity: String,
    pub dietary_tags: Vec<String>,
    pub location: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub post_id: Uuid,
    pub claimer_id: Uuid,
    pub message: String,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        for role in [Role::User, Role::Business, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_rejected() {
        let err = "superadmin".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.value, "superadmin");
    }

    #[test]
    fn claim_action_parses() {
        assert_eq!("approve".parse::<ClaimAction>().unwrap(), ClaimAction::Approve);
        assert_eq!("reject".parse::<ClaimAction>().unwrap(), ClaimAction::Reject);
        assert!("Approve".parse::<ClaimAction>().is_err());
    }

    #[test]
    fn status_strings_are_stable() {
        assert_eq!(PostStatus::Active.as_str(), "active");
        assert_eq!(PostStatus::Claimed.as_str(), "claimed");
        assert_eq!(ClaimStatus::Pending.as_str(), "pending");
    }
}
