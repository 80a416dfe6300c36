use plateful_types::models::ClaimAction;
use rusqlite::Connection;

use crate::Database;
use crate::error::StoreError;
use crate::models::{ClaimRow, ClaimViewRow, PostRow, StatsRow, UserRow};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<(), StoreError> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password_hash, role) VALUES (?1, ?2, ?3, ?4)",
                (id, email, password_hash, role),
            )
            .map_err(|e| {
                let err = StoreError::from(e);
                if err.is_constraint_violation() {
                    StoreError::Conflict("email already registered")
                } else {
                    err
                }
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Posts --

    #[allow(clippy::too_many_arguments)]
    pub fn create_post(
        &self,
        id: &str,
        owner_id: &str,
        description: &str,
        category: &str,
        quantity: &str,
        dietary_tags: &str,
        location: &str,
        expires_in_minutes: Option<i64>,
    ) -> Result<PostRow, StoreError> {
        self.with_conn_mut(|conn| {
            // expires_at computed by SQLite so it shares the clock and
            // format of created_at
            conn.execute(
                "INSERT INTO posts
                    (id, owner_id, description, category, quantity, dietary_tags, location, expires_at)
                 VALUES
                    (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                     CASE WHEN ?8 IS NULL THEN NULL
                          ELSE datetime('now', ?8 || ' minutes') END)",
                rusqlite::params![
                    id,
                    owner_id,
                    description,
                    category,
                    quantity,
                    dietary_tags,
                    location,
                    expires_in_minutes
                ],
            )?;
            query_post(conn, id)?.ok_or(StoreError::NotFound("post"))
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>, StoreError> {
        self.with_conn(|conn| query_post(conn, id))
    }

    pub fn list_posts(&self, limit: u32) -> Result<Vec<PostRow>, StoreError> {
        self.with_conn(|conn| query_posts(conn, None, limit))
    }

    pub fn list_posts_by_owner(
        &self,
        owner_id: &str,
        limit: u32,
    ) -> Result<Vec<PostRow>, StoreError> {
        self.with_conn(|conn| query_posts(conn, Some(owner_id), limit))
    }

    // -- Claim workflow --

    /// Insert a pending claim, enforcing the workflow invariants inside
    /// one transaction: the post must exist and be active, the claimer
    /// must not own it, and (post, claimer) must not already have a
    /// claim.
    pub fn create_claim(
        &self,
        id: &str,
        post_id: &str,
        claimer_id: &str,
        message: &str,
    ) -> Result<ClaimRow, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let (owner_id, status): (String, String) = tx
                .query_row(
                    "SELECT owner_id, status FROM posts WHERE id = ?1",
                    [post_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or(StoreError::NotFound("post"))?;

            if owner_id == claimer_id {
                return Err(StoreError::Forbidden("cannot claim your own post"));
            }
            if status != "active" {
                return Err(StoreError::Conflict("post is not active"));
            }

            let duplicate: Option<String> = tx
                .query_row(
                    "SELECT id FROM claims WHERE post_id = ?1 AND claimer_id = ?2",
                    [post_id, claimer_id],
                    |row| row.get(0),
                )
                .optional()?;
            if duplicate.is_some() {
                return Err(StoreError::Conflict("post already claimed by this user"));
            }

            tx.execute(
                "INSERT INTO claims (id, post_id, claimer_id, message) VALUES (?1, ?2, ?3, ?4)",
                (id, post_id, claimer_id, message),
            )?;

            let row = query_claim(&tx, id)?.ok_or(StoreError::NotFound("claim"))?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// Apply the owner's decision. Approve flips the claim to approved
    /// and the post to claimed in the same transaction; reject only
    /// touches the claim. A claim that already left pending cannot be
    /// re-decided.
    pub fn decide_claim(
        &self,
        claim_id: &str,
        decider_id: &str,
        action: ClaimAction,
    ) -> Result<ClaimRow, StoreError> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let (post_id, claim_status, owner_id, post_status): (String, String, String, String) =
                tx.query_row(
                    "SELECT c.post_id, c.status, p.owner_id, p.status
                     FROM claims c
                     JOIN posts p ON c.post_id = p.id
                     WHERE c.id = ?1",
                    [claim_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )
                .optional()?
                .ok_or(StoreError::NotFound("claim"))?;

            // Ownership is checked before claim state so a stranger
            // always sees Forbidden, never Conflict.
            if owner_id != decider_id {
                return Err(StoreError::Forbidden("only the post owner may decide"));
            }
            if claim_status != "pending" {
                return Err(StoreError::Conflict("claim already decided"));
            }

            match action {
                ClaimAction::Approve => {
                    if post_status != "active" {
                        return Err(StoreError::Conflict("post is no longer active"));
                    }
                    tx.execute(
                        "UPDATE claims SET status = 'approved', decided_at = datetime('now')
                         WHERE id = ?1",
                        [claim_id],
                    )?;
                    tx.execute(
                        "UPDATE posts SET status = 'claimed' WHERE id = ?1",
                        [&post_id],
                    )?;
                }
                ClaimAction::Reject => {
                    tx.execute(
                        "UPDATE claims SET status = 'rejected', decided_at = datetime('now')
                         WHERE id = ?1",
                        [claim_id],
                    )?;
                }
            }

            let row = query_claim(&tx, claim_id)?.ok_or(StoreError::NotFound("claim"))?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// Claims made against posts owned by `owner_id`, newest first.
    pub fn list_incoming_claims(&self, owner_id: &str) -> Result<Vec<ClaimViewRow>, StoreError> {
        self.with_conn(|conn| {
            query_claim_views(
                conn,
                "SELECT c.id, c.post_id, p.description, p.status, u.email,
                        c.message, c.status, c.created_at, c.decided_at
                 FROM claims c
                 JOIN posts p ON c.post_id = p.id
                 JOIN users u ON c.claimer_id = u.id
                 WHERE p.owner_id = ?1
                 ORDER BY c.created_at DESC",
                owner_id,
            )
        })
    }

    /// Claims made by `claimer_id` against other users' posts.
    pub fn list_outgoing_claims(&self, claimer_id: &str) -> Result<Vec<ClaimViewRow>, StoreError> {
        self.with_conn(|conn| {
            query_claim_views(
                conn,
                "SELECT c.id, c.post_id, p.description, p.status, u.email,
                        c.message, c.status, c.created_at, c.decided_at
                 FROM claims c
                 JOIN posts p ON c.post_id = p.id
                 JOIN users u ON p.owner_id = u.id
                 WHERE c.claimer_id = ?1
                 ORDER BY c.created_at DESC",
                claimer_id,
            )
        })
    }

    // -- Stats --

    /// Post counts, optionally restricted to one owner. `available`
    /// excludes posts whose expiry has passed.
    pub fn compute_stats(&self, owner_id: Option<&str>) -> Result<StatsRow, StoreError> {
        self.with_conn(|conn| {
            let owner_clause = match owner_id {
                Some(_) => " AND owner_id = ?1",
                None => "",
            };
            let params: Vec<&dyn rusqlite::types::ToSql> = match &owner_id {
                Some(id) => vec![id],
                None => vec![],
            };

            let count = |condition: &str| -> Result<i64, StoreError> {
                let sql = format!(
                    "SELECT COUNT(*) FROM posts WHERE {}{}",
                    condition, owner_clause
                );
                Ok(conn.query_row(&sql, params.as_slice(), |row| row.get(0))?)
            };

            Ok(StatsRow {
                available: count(
                    "status = 'active' AND (expires_at IS NULL OR expires_at > datetime('now'))",
                )?,
                shared: count("status = 'claimed'")?,
                total: count("1=1")?,
            })
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>, StoreError> {
    // column is one of two compile-time literals, never user input
    let sql = format!(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                email: row.get(1)?,
                password_hash: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_post(conn: &Connection, id: &str) -> Result<Option<PostRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.owner_id, u.email, p.description, p.category, p.quantity,
                p.dietary_tags, p.location, p.status, p.created_at, p.expires_at
         FROM posts p
         JOIN users u ON p.owner_id = u.id
         WHERE p.id = ?1",
    )?;

    let row = stmt.query_row([id], map_post_row).optional()?;
    Ok(row)
}

fn query_posts(
    conn: &Connection,
    owner_id: Option<&str>,
    limit: u32,
) -> Result<Vec<PostRow>, StoreError> {
    let base = "SELECT p.id, p.owner_id, u.email, p.description, p.category, p.quantity,
                       p.dietary_tags, p.location, p.status, p.created_at, p.expires_at
                FROM posts p
                JOIN users u ON p.owner_id = u.id";

    let rows = match owner_id {
        Some(owner) => {
            let sql = format!(
                "{} WHERE p.owner_id = ?1 ORDER BY p.created_at DESC LIMIT ?2",
                base
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(rusqlite::params![owner, limit], map_post_row)?
                .collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let sql = format!("{} ORDER BY p.created_at DESC LIMIT ?1", base);
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(rusqlite::params![limit], map_post_row)?
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok(rows)
}

fn map_post_row(row: &rusqlite::Row<'_>) -> Result<PostRow, rusqlite::Error> {
    Ok(PostRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_email: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        quantity: row.get(5)?,
        dietary_tags: row.get(6)?,
        location: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        expires_at: row.get(10)?,
    })
}

fn query_claim(conn: &Connection, id: &str) -> Result<Option<ClaimRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, claimer_id, message, status, created_at, decided_at
         FROM claims WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(ClaimRow {
                id: row.get(0)?,
                post_id: row.get(1)?,
                claimer_id: row.get(2)?,
                message: row.get(3)?,
                status: row.get(4)?,
                created_at: row.get(5)?,
                decided_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_claim_views(
    conn: &Connection,
    sql: &str,
    param: &str,
) -> Result<Vec<ClaimViewRow>, StoreError> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map([param], |row| {
            Ok(ClaimViewRow {
                claim_id: row.get(0)?,
                post_id: row.get(1)?,
                post_description: row.get(2)?,
                post_status: row.get(3)?,
                counterpart_email: row.get(4)?,
                message: row.get(5)?,
                status: row.get(6)?,
                created_at: row.get(7)?,
                decided_at: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_user(db: &Database, email: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_user(&id, email, "hash", "user").unwrap();
        id
    }

    fn add_post(db: &Database, owner_id: &str, description: &str) -> String {
        let id = Uuid::new_v4().to_string();
        db.create_post(&id, owner_id, description, "meal", "2", "vegan", "downtown", None)
            .unwrap();
        id
    }

    #[test]
    fn duplicate_email_is_conflict() {
        let db = test_db();
        add_user(&db, "a@example.com");
        let err = db
            .create_user(&Uuid::new_v4().to_string(), "a@example.com", "hash", "user")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err}");
    }

    #[test]
    fn post_defaults_to_active() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let post_id = add_post(&db, &owner, "leftover curry");

        let post = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(post.status, "active");
        assert_eq!(post.owner_email, "owner@example.com");
        assert!(post.expires_at.is_none());
    }

    #[test]
    fn expiry_is_computed_from_minutes() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let id = Uuid::new_v4().to_string();
        db.create_post(&id, &owner, "bread", "bakery", "1", "", "", Some(60))
            .unwrap();

        let post = db.get_post(&id).unwrap().unwrap();
        let expires = post.expires_at.expect("expiry set");
        assert!(expires > post.created_at);
    }

    #[test]
    fn cannot_claim_own_post() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let post_id = add_post(&db, &owner, "soup");

        let err = db
            .create_claim(&Uuid::new_v4().to_string(), &post_id, &owner, "me first")
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)), "{err}");
    }

    #[test]
    fn claim_on_missing_post_is_not_found() {
        let db = test_db();
        let claimer = add_user(&db, "b@example.com");

        let err = db
            .create_claim(&Uuid::new_v4().to_string(), "no-such-post", &claimer, "")
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "{err}");
    }

    #[test]
    fn duplicate_claim_is_conflict() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let claimer = add_user(&db, "b@example.com");
        let post_id = add_post(&db, &owner, "pasta");

        db.create_claim(&Uuid::new_v4().to_string(), &post_id, &claimer, "first")
            .unwrap();
        let err = db
            .create_claim(&Uuid::new_v4().to_string(), &post_id, &claimer, "again")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err}");
    }

    #[test]
    fn claim_on_claimed_post_is_conflict() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let first = add_user(&db, "first@example.com");
        let second = add_user(&db, "second@example.com");
        let post_id = add_post(&db, &owner, "rice");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &post_id, &first, "").unwrap();
        db.decide_claim(&claim_id, &owner, ClaimAction::Approve)
            .unwrap();

        let err = db
            .create_claim(&Uuid::new_v4().to_string(), &post_id, &second, "too late")
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err}");
    }

    #[test]
    fn approve_marks_post_claimed_atomically() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let claimer = add_user(&db, "b@example.com");
        let post_id = add_post(&db, &owner, "stew");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &post_id, &claimer, "pickup at 5pm")
            .unwrap();

        let claim = db
            .decide_claim(&claim_id, &owner, ClaimAction::Approve)
            .unwrap();
        assert_eq!(claim.status, "approved");
        assert!(claim.decided_at.is_some());

        let post = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(post.status, "claimed");
    }

    #[test]
    fn reject_leaves_post_active() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let claimer = add_user(&db, "b@example.com");
        let post_id = add_post(&db, &owner, "salad");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &post_id, &claimer, "").unwrap();

        let claim = db
            .decide_claim(&claim_id, &owner, ClaimAction::Reject)
            .unwrap();
        assert_eq!(claim.status, "rejected");
        assert!(claim.decided_at.is_some());

        let post = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(post.status, "active");
    }

    #[test]
    fn only_owner_may_decide() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let claimer = add_user(&db, "b@example.com");
        let stranger = add_user(&db, "c@example.com");
        let post_id = add_post(&db, &owner, "pie");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &post_id, &claimer, "").unwrap();

        for decider in [&claimer, &stranger] {
            let err = db
                .decide_claim(&claim_id, decider, ClaimAction::Approve)
                .unwrap_err();
            assert!(matches!(err, StoreError::Forbidden(_)), "{err}");
        }

        // Still forbidden (not conflict) after the claim is decided
        db.decide_claim(&claim_id, &owner, ClaimAction::Reject)
            .unwrap();
        let err = db
            .decide_claim(&claim_id, &stranger, ClaimAction::Approve)
            .unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)), "{err}");
    }

    #[test]
    fn deciding_twice_is_conflict() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let claimer = add_user(&db, "b@example.com");
        let post_id = add_post(&db, &owner, "buns");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &post_id, &claimer, "").unwrap();
        db.decide_claim(&claim_id, &owner, ClaimAction::Approve)
            .unwrap();

        for action in [ClaimAction::Approve, ClaimAction::Reject] {
            let err = db.decide_claim(&claim_id, &owner, action).unwrap_err();
            assert!(matches!(err, StoreError::Conflict(_)), "{err}");
        }
    }

    #[test]
    fn failed_decision_changes_nothing() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let claimer = add_user(&db, "b@example.com");
        let post_id = add_post(&db, &owner, "cake");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &post_id, &claimer, "").unwrap();

        let _ = db.decide_claim(&claim_id, &claimer, ClaimAction::Approve);

        let post = db.get_post(&post_id).unwrap().unwrap();
        assert_eq!(post.status, "active");
        let outgoing = db.list_outgoing_claims(&claimer).unwrap();
        assert_eq!(outgoing[0].status, "pending");
    }

    #[test]
    fn incoming_and_outgoing_views() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");
        let claimer = add_user(&db, "b@example.com");
        let post_id = add_post(&db, &owner, "noodles");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &post_id, &claimer, "after work")
            .unwrap();

        let incoming = db.list_incoming_claims(&owner).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].counterpart_email, "b@example.com");
        assert_eq!(incoming[0].post_description, "noodles");
        assert_eq!(incoming[0].message, "after work");

        let outgoing = db.list_outgoing_claims(&claimer).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].counterpart_email, "owner@example.com");

        assert!(db.list_incoming_claims(&claimer).unwrap().is_empty());
        assert!(db.list_outgoing_claims(&owner).unwrap().is_empty());
    }

    #[test]
    fn stats_count_by_status_and_owner() {
        let db = test_db();
        let alice = add_user(&db, "alice@example.com");
        let bob = add_user(&db, "bob@example.com");

        // Alice: two active, one later claimed by Bob
        let p1 = add_post(&db, &alice, "one");
        add_post(&db, &alice, "two");
        // Bob: one active
        add_post(&db, &bob, "three");

        let claim_id = Uuid::new_v4().to_string();
        db.create_claim(&claim_id, &p1, &bob, "").unwrap();
        db.decide_claim(&claim_id, &alice, ClaimAction::Approve)
            .unwrap();

        let all = db.compute_stats(None).unwrap();
        assert_eq!(all.available, 2);
        assert_eq!(all.shared, 1);
        assert_eq!(all.total, 3);
        assert_eq!(all.co2_estimate(), 1);

        let alices = db.compute_stats(Some(&alice)).unwrap();
        assert_eq!(alices.available, 1);
        assert_eq!(alices.shared, 1);
        assert_eq!(alices.total, 2);

        let bobs = db.compute_stats(Some(&bob)).unwrap();
        assert_eq!(bobs.available, 1);
        assert_eq!(bobs.shared, 0);
        assert_eq!(bobs.total, 1);
    }

    #[test]
    fn expired_posts_are_not_available() {
        let db = test_db();
        let owner = add_user(&db, "owner@example.com");

        let id = Uuid::new_v4().to_string();
        db.create_post(&id, &owner, "old bread", "bakery", "1", "", "", Some(-5))
            .unwrap();

        let stats = db.compute_stats(None).unwrap();
        assert_eq!(stats.available, 0);
        assert_eq!(stats.total, 1);
    }
}
