/// Database row types — these map directly to SQLite rows.
/// Distinct from plateful-types API models to keep the DB layer
/// independent; status/role strings are parsed into enums at the API
/// boundary.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

pub struct PostRow {
    pub id: String,
    pub owner_id: String,
    pub owner_email: String,
    pub description: String,
    pub category: String,
    pub quantity: String,
    pub dietary_tags: String,
    pub location: String,
    pub status: String,
    pub created_at: String,
    pub expires_at: Option<String>,
}

#[derive(Debug)]
pub struct ClaimRow {
    pub id: String,
    pub post_id: String,
    pub claimer_id: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
    pub decided_at: Option<String>,
}

/// Claim joined with its post for list views. `counterpart_email` is
/// the claimer for incoming lists and the post owner for outgoing.
pub struct ClaimViewRow {
    pub claim_id: String,
    pub post_id: String,
    pub post_description: String,
    pub post_status: String,
    pub counterpart_email: String,
    pub message: String,
    pub status: String,
    pub created_at: String,
    pub decided_at: Option<String>,
}

pub struct StatsRow {
    pub available: i64,
    pub shared: i64,
    pub total: i64,
}

impl StatsRow {
    /// Display heuristic: floor(shared × 1.5) kg of CO2 avoided.
    pub fn co2_estimate(&self) -> i64 {
        self.shared * 3 / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co2_estimate_floors() {
        let stats = |shared| StatsRow {
            available: 0,
            shared,
            total: shared,
        };
        assert_eq!(stats(0).co2_estimate(), 0);
        assert_eq!(stats(1).co2_estimate(), 1);
        assert_eq!(stats(3).co2_estimate(), 4);
        assert_eq!(stats(4).co2_estimate(), 6);
    }
}
