use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const PROFILE_COLUMNS: &str = "p.id, i.id, i.username, i.email
     FROM profiles p JOIN identities i ON i.id = p.identity_id";

const IDENTITY_COLUMNS: &str =
    "id, username, email, password_hash, is_staff, created_at FROM identities";

const TOKEN_COLUMNS: &str = "id, token_hash, token_lookup, kind, identity_id, created_at, \
     expires_at, last_used_at, revoked_at FROM tokens";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::with_timeout(db_path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens the database. Statements that wait longer than `busy_timeout`
    /// on a lock fail with [`Error::Busy`].
    pub fn with_timeout<P: AsRef<Path>>(db_path: P, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn query_profiles(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Profile>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, row_to_profile)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn query_lessons(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<Lesson>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(args, row_to_lesson)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

#[derive(Clone, Copy)]
enum EdgeSide {
    /// The profile is the follower (`from_profile`).
    Following,
    /// The profile is the one being followed (`to_profile`).
    Followers,
}

impl EdgeSide {
    fn columns(self) -> (&'static str, &'static str) {
        match self {
            EdgeSide::Following => ("from_profile", "to_profile"),
            EdgeSide::Followers => ("to_profile", "from_profile"),
        }
    }
}

/// Rewrites the friendship rows on one side of `profile_id` so that the set of
/// counterparts equals `others`. Rows for retained counterparts are left
/// untouched.
fn rewrite_follow_edges(
    tx: &Transaction<'_>,
    profile_id: i64,
    others: &[i64],
    side: EdgeSide,
) -> Result<()> {
    let (own, other) = side.columns();

    let current: HashSet<i64> = {
        let mut stmt = tx.prepare(&format!(
            "SELECT DISTINCT {other} FROM friendships WHERE {own} = ?1"
        ))?;
        let current = stmt
            .query_map(params![profile_id], |row| row.get(0))?
            .collect::<std::result::Result<HashSet<i64>, _>>()?;
        current
    };
    let wanted: HashSet<i64> = others.iter().copied().collect();

    for removed in current.difference(&wanted) {
        tx.execute(
            &format!("DELETE FROM friendships WHERE {own} = ?1 AND {other} = ?2"),
            params![profile_id, removed],
        )?;
    }

    let now = format_datetime(&Utc::now());
    let mut inserted = HashSet::new();
    for &added in others {
        if current.contains(&added) || !inserted.insert(added) {
            continue;
        }
        tx.execute(
            &format!("INSERT INTO friendships ({own}, {other}, created_at) VALUES (?1, ?2, ?3)"),
            params![profile_id, added, now],
        )
        .map_err(|e| Error::from_sqlite(e, "Follow sets must reference other existing profiles"))?;
    }

    Ok(())
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

// Fixed width so stored timestamps compare correctly as strings.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn row_to_identity(row: &Row<'_>) -> rusqlite::Result<Identity> {
    Ok(Identity {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        is_staff: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        user: IdentitySummary {
            id: row.get(1)?,
            username: row.get(2)?,
            email: row.get(3)?,
        },
    })
}

fn row_to_lesson(row: &Row<'_>) -> rusqlite::Result<Lesson> {
    Ok(Lesson {
        id: row.get(0)?,
        name: row.get(1)?,
        topic: row.get(2)?,
    })
}

fn row_to_friendship(row: &Row<'_>) -> rusqlite::Result<Friendship> {
    Ok(Friendship {
        id: row.get(0)?,
        from_profile: row.get(1)?,
        to_profile: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn row_to_taken_lesson(row: &Row<'_>) -> rusqlite::Result<TakenLesson> {
    Ok(TakenLesson {
        id: row.get(0)?,
        profile: row.get(1)?,
        lesson: row.get(2)?,
        times_taken: row.get(3)?,
    })
}

fn row_to_token(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        kind: row.get(3)?,
        identity_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: parse_datetime(&row.get::<_, String>(6)?),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
        revoked_at: row.get::<_, Option<String>>(8)?.map(|s| parse_datetime(&s)),
    })
}

impl ToSql for TokenKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TokenKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        TokenKind::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown token kind: {s}").into()))
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Identity operations

    fn create_identity(&self, identity: &NewIdentity) -> Result<(Identity, Profile)> {
        let created_at = Utc::now();

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO identities (username, email, password_hash, is_staff, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                identity.username,
                identity.email,
                identity.password_hash,
                identity.is_staff,
                format_datetime(&created_at),
            ],
        )
        .map_err(|e| Error::from_sqlite(e, "Username or email already in use"))?;
        let identity_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO profiles (identity_id) VALUES (?1)",
            params![identity_id],
        )?;
        let profile_id = tx.last_insert_rowid();

        tx.commit()?;

        let created = Identity {
            id: identity_id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            password_hash: identity.password_hash.clone(),
            is_staff: identity.is_staff,
            created_at,
        };
        let profile = Profile {
            id: profile_id,
            user: IdentitySummary::from(&created),
        };
        Ok((created, profile))
    }

    fn get_identity(&self, id: i64) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} WHERE id = ?1"),
            params![id],
            row_to_identity,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_identity_by_username(&self, username: &str) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} WHERE username = ?1"),
            params![username],
            row_to_identity,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_identity_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} WHERE email = ?1"),
            params![email],
            row_to_identity,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_identity(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM identities WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Profile operations

    fn get_profile(&self, id: i64) -> Result<Option<Profile>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROFILE_COLUMNS} WHERE p.id = ?1"),
            params![id],
            row_to_profile,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_profile_by_identity(&self, identity_id: i64) -> Result<Option<Profile>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROFILE_COLUMNS} WHERE p.identity_id = ?1"),
            params![identity_id],
            row_to_profile,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_profiles(&self, cursor: i64, limit: i32) -> Result<Vec<Profile>> {
        self.query_profiles(
            &format!("SELECT {PROFILE_COLUMNS} WHERE p.id > ?1 ORDER BY p.id LIMIT ?2"),
            params![cursor, limit],
        )
    }

    fn list_non_staff_profiles(&self) -> Result<Vec<Profile>> {
        self.query_profiles(
            &format!("SELECT {PROFILE_COLUMNS} WHERE i.is_staff = 0 ORDER BY p.id"),
            params![],
        )
    }

    fn list_following(&self, profile_id: i64) -> Result<Vec<Profile>> {
        self.query_profiles(
            &format!(
                "SELECT {PROFILE_COLUMNS}
                 WHERE p.id IN (SELECT to_profile FROM friendships WHERE from_profile = ?1)
                 ORDER BY p.id"
            ),
            params![profile_id],
        )
    }

    fn list_followers(&self, profile_id: i64) -> Result<Vec<Profile>> {
        self.query_profiles(
            &format!(
                "SELECT {PROFILE_COLUMNS}
                 WHERE p.id IN (SELECT from_profile FROM friendships WHERE to_profile = ?1)
                 ORDER BY p.id"
            ),
            params![profile_id],
        )
    }

    fn update_profile(&self, profile_id: i64, update: &ProfileUpdate) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let identity_id: i64 = tx
            .query_row(
                "SELECT identity_id FROM profiles WHERE id = ?1",
                params![profile_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        if update.username.is_some() || update.email.is_some() {
            tx.execute(
                "UPDATE identities SET username = COALESCE(?1, username),
                 email = COALESCE(?2, email) WHERE id = ?3",
                params![update.username, update.email, identity_id],
            )
            .map_err(|e| Error::from_sqlite(e, "Username or email already in use"))?;
        }

        if let Some(following) = &update.following {
            rewrite_follow_edges(&tx, profile_id, following, EdgeSide::Following)?;
        }
        if let Some(followers) = &update.followers {
            rewrite_follow_edges(&tx, profile_id, followers, EdgeSide::Followers)?;
        }

        tx.commit()?;
        Ok(())
    }

    // Lesson operations

    fn create_lesson(&self, name: &str, topic: &str) -> Result<Lesson> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO lessons (name, topic) VALUES (?1, ?2)",
            params![name, topic],
        )?;
        Ok(Lesson {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            topic: topic.to_string(),
        })
    }

    fn get_lesson(&self, id: i64) -> Result<Option<Lesson>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, topic FROM lessons WHERE id = ?1",
            params![id],
            row_to_lesson,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_lessons(&self, cursor: i64, limit: i32) -> Result<Vec<Lesson>> {
        self.query_lessons(
            "SELECT id, name, topic FROM lessons WHERE id > ?1 ORDER BY id LIMIT ?2",
            params![cursor, limit],
        )
    }

    fn update_lesson(&self, lesson: &Lesson) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE lessons SET name = ?1, topic = ?2 WHERE id = ?3",
            params![lesson.name, lesson.topic, lesson.id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_lesson(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM lessons WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Friendship log operations

    fn create_friendship(&self, from_profile: i64, to_profile: i64) -> Result<Friendship> {
        let created_at = Utc::now();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO friendships (from_profile, to_profile, created_at) VALUES (?1, ?2, ?3)",
            params![from_profile, to_profile, format_datetime(&created_at)],
        )
        .map_err(|e| Error::from_sqlite(e, "Friendship must link two different existing profiles"))?;

        Ok(Friendship {
            id: conn.last_insert_rowid(),
            from_profile,
            to_profile,
            created_at,
        })
    }

    fn get_friendship(&self, id: i64) -> Result<Option<Friendship>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, from_profile, to_profile, created_at FROM friendships WHERE id = ?1",
            params![id],
            row_to_friendship,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_friendships(&self, cursor: i64, limit: i32) -> Result<Vec<Friendship>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, from_profile, to_profile, created_at
             FROM friendships WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], row_to_friendship)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_friendship(&self, friendship: &Friendship) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE friendships SET from_profile = ?1, to_profile = ?2 WHERE id = ?3",
                params![friendship.from_profile, friendship.to_profile, friendship.id],
            )
            .map_err(|e| Error::from_sqlite(e, "Friendship must link two different existing profiles"))?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_friendship(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM friendships WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Taken lesson operations

    fn create_taken_lesson(
        &self,
        profile_id: i64,
        lesson_id: i64,
        times_taken: u32,
    ) -> Result<TakenLesson> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO taken_lessons (profile_id, lesson_id, times_taken) VALUES (?1, ?2, ?3)",
            params![profile_id, lesson_id, times_taken],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Validation("The fields profile, lesson must make a unique set".to_string())
            } else {
                Error::from_sqlite(e, "Invalid profile or lesson id")
            }
        })?;

        Ok(TakenLesson {
            id: conn.last_insert_rowid(),
            profile: profile_id,
            lesson: lesson_id,
            times_taken,
        })
    }

    fn get_taken_lesson(&self, id: i64) -> Result<Option<TakenLesson>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, profile_id, lesson_id, times_taken FROM taken_lessons WHERE id = ?1",
            params![id],
            row_to_taken_lesson,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_taken_lessons(&self, cursor: i64, limit: i32) -> Result<Vec<TakenLesson>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, profile_id, lesson_id, times_taken
             FROM taken_lessons WHERE id > ?1 ORDER BY id LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![cursor, limit], row_to_taken_lesson)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_taken_lesson(&self, taken: &TakenLesson) -> Result<()> {
        let rows = self
            .conn()
            .execute(
                "UPDATE taken_lessons SET profile_id = ?1, lesson_id = ?2, times_taken = ?3
                 WHERE id = ?4",
                params![taken.profile, taken.lesson, taken.times_taken, taken.id],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Validation(
                        "The fields profile, lesson must make a unique set".to_string(),
                    )
                } else {
                    Error::from_sqlite(e, "Invalid profile or lesson id")
                }
            })?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_taken_lesson(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM taken_lessons WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn record_lesson_taken(&self, profile_id: i64, lesson_id: i64) -> Result<TakenLesson> {
        let conn = self.conn();
        conn.query_row(
            "INSERT INTO taken_lessons (profile_id, lesson_id, times_taken) VALUES (?1, ?2, 1)
             ON CONFLICT(profile_id, lesson_id) DO UPDATE SET times_taken = times_taken + 1
             RETURNING id, profile_id, lesson_id, times_taken",
            params![profile_id, lesson_id],
            row_to_taken_lesson,
        )
        .map_err(|e| Error::from_sqlite(e, "Invalid profile or lesson id"))
    }

    fn list_profile_lessons(&self, profile_id: i64) -> Result<Vec<Lesson>> {
        self.query_lessons(
            "SELECT l.id, l.name, l.topic
             FROM taken_lessons tl
             JOIN lessons l ON l.id = tl.lesson_id
             WHERE tl.profile_id = ?1
             ORDER BY tl.id",
            params![profile_id],
        )
    }

    fn list_friends_lessons(&self, profile_id: i64) -> Result<Vec<Lesson>> {
        self.query_lessons(
            "SELECT l.id, l.name, l.topic
             FROM taken_lessons tl
             JOIN lessons l ON l.id = tl.lesson_id
             WHERE tl.profile_id IN (SELECT to_profile FROM friendships WHERE from_profile = ?1)
             ORDER BY tl.id",
            params![profile_id],
        )
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, kind, identity_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.kind,
                token.identity_id,
                format_datetime(&token.created_at),
                format_datetime(&token.expires_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::TokenLookupCollision),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} WHERE token_lookup = ?1"),
            params![lookup],
            row_to_token,
        )
        .optional()
        .map_err(Error::from)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn revoke_token(&self, id: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE tokens SET revoked_at = ?1 WHERE id = ?2 AND revoked_at IS NULL",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(rows > 0)
    }

    fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM tokens WHERE expires_at <= ?1",
            params![format_datetime(&now)],
        )?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (SqliteStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (store, temp)
    }

    fn new_identity(username: &str, is_staff: bool) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            is_staff,
        }
    }

    fn ids(profiles: &[Profile]) -> Vec<i64> {
        profiles.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (store, _temp) = open_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"identities".to_string()));
        assert!(tables.contains(&"profiles".to_string()));
        assert!(tables.contains(&"lessons".to_string()));
        assert!(tables.contains(&"friendships".to_string()));
        assert!(tables.contains(&"taken_lessons".to_string()));
        assert!(tables.contains(&"tokens".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (store, _temp) = open_store();
        store.initialize().unwrap();
    }

    #[test]
    fn test_identity_creation_creates_empty_profile() {
        let (store, _temp) = open_store();

        let (identity, profile) = store.create_identity(&new_identity("user_1", false)).unwrap();
        assert_eq!(profile.user.id, identity.id);
        assert_eq!(profile.user.username, "user_1");

        let fetched = store.get_profile_by_identity(identity.id).unwrap().unwrap();
        assert_eq!(fetched, profile);
        assert!(store.list_followers(profile.id).unwrap().is_empty());
        assert!(store.list_following(profile.id).unwrap().is_empty());
    }

    #[test]
    fn test_identity_update_keeps_single_profile() {
        let (store, _temp) = open_store();

        let (_, profile) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let update = ProfileUpdate {
            email: Some("changed@example.com".to_string()),
            ..Default::default()
        };
        store.update_profile(profile.id, &update).unwrap();

        let profiles = store.list_profiles(0, 10).unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, profile.id);
        assert_eq!(profiles[0].user.email, "changed@example.com");
    }

    #[test]
    fn test_duplicate_username_rolls_back() {
        let (store, _temp) = open_store();

        store.create_identity(&new_identity("user_1", false)).unwrap();
        let mut duplicate = new_identity("user_1", false);
        duplicate.email = "other@example.com".to_string();

        let result = store.create_identity(&duplicate);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.list_profiles(0, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_identity_cascades() {
        let (store, _temp) = open_store();

        let (a, pa) = store.create_identity(&new_identity("a", false)).unwrap();
        let (_, pb) = store.create_identity(&new_identity("b", false)).unwrap();
        let lesson = store.create_lesson("Statistics", "Math").unwrap();
        store.create_friendship(pb.id, pa.id).unwrap();
        store.record_lesson_taken(pa.id, lesson.id).unwrap();

        assert!(store.delete_identity(a.id).unwrap());

        assert!(store.get_profile(pa.id).unwrap().is_none());
        assert!(store.list_following(pb.id).unwrap().is_empty());
        assert!(store.list_taken_lessons(0, 10).unwrap().is_empty());
    }

    #[test]
    fn test_friendship_scenario() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let (_, p2) = store.create_identity(&new_identity("user_2", false)).unwrap();
        let lesson = store.create_lesson("Statistics", "Math").unwrap();
        let taken = store.create_taken_lesson(p2.id, lesson.id, 2).unwrap();
        assert_eq!(taken.times_taken, 2);

        let friendship = store.create_friendship(p1.id, p2.id).unwrap();
        assert_eq!(friendship.from_profile, p1.id);
        assert_eq!(friendship.to_profile, p2.id);

        assert_eq!(store.list_following(p1.id).unwrap().len(), 1);
        assert_eq!(store.list_followers(p1.id).unwrap().len(), 0);
        assert_eq!(store.list_following(p2.id).unwrap().len(), 0);
        assert_eq!(store.list_followers(p2.id).unwrap().len(), 1);

        assert_eq!(store.list_following(p1.id).unwrap(), vec![p2.clone()]);
        assert_eq!(store.list_friends_lessons(p1.id).unwrap(), vec![lesson]);
        assert!(store.list_friends_lessons(p2.id).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_friendship_rows_keep_set_semantics() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let (_, p2) = store.create_identity(&new_identity("user_2", false)).unwrap();

        let first = store.create_friendship(p1.id, p2.id).unwrap();
        let second = store.create_friendship(p1.id, p2.id).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(ids(&store.list_following(p1.id).unwrap()), vec![p2.id]);

        store.delete_friendship(first.id).unwrap();
        assert_eq!(ids(&store.list_following(p1.id).unwrap()), vec![p2.id]);

        store.delete_friendship(second.id).unwrap();
        assert!(store.list_following(p1.id).unwrap().is_empty());
        assert!(store.list_followers(p2.id).unwrap().is_empty());
    }

    #[test]
    fn test_friendship_rejects_self_and_unknown_profiles() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();

        let result = store.create_friendship(p1.id, p1.id);
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = store.create_friendship(p1.id, 9999);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_update_friendship_retargets_edge() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let (_, p2) = store.create_identity(&new_identity("user_2", false)).unwrap();
        let (_, p3) = store.create_identity(&new_identity("user_3", false)).unwrap();

        let mut friendship = store.create_friendship(p1.id, p2.id).unwrap();
        friendship.to_profile = p3.id;
        store.update_friendship(&friendship).unwrap();

        assert_eq!(ids(&store.list_following(p1.id).unwrap()), vec![p3.id]);
        assert!(store.list_followers(p2.id).unwrap().is_empty());
    }

    fn following(ids: &[i64]) -> ProfileUpdate {
        ProfileUpdate {
            following: Some(ids.to_vec()),
            ..Default::default()
        }
    }

    #[test]
    fn test_update_profile_replaces_edges() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let (_, p2) = store.create_identity(&new_identity("user_2", false)).unwrap();
        let (_, p3) = store.create_identity(&new_identity("user_3", false)).unwrap();

        let kept = store.create_friendship(p1.id, p2.id).unwrap();
        store.update_profile(p1.id, &following(&[p2.id, p3.id, p3.id])).unwrap();
        assert_eq!(ids(&store.list_following(p1.id).unwrap()), vec![p2.id, p3.id]);
        assert!(store.get_friendship(kept.id).unwrap().is_some());

        store.update_profile(p1.id, &following(&[p3.id])).unwrap();
        assert_eq!(ids(&store.list_following(p1.id).unwrap()), vec![p3.id]);
        assert!(store.get_friendship(kept.id).unwrap().is_none());

        let followers = ProfileUpdate {
            followers: Some(vec![p2.id]),
            ..Default::default()
        };
        store.update_profile(p1.id, &followers).unwrap();
        assert_eq!(ids(&store.list_followers(p1.id).unwrap()), vec![p2.id]);
        assert_eq!(ids(&store.list_following(p2.id).unwrap()), vec![p1.id]);
    }

    #[test]
    fn test_update_profile_is_atomic() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let (_, p2) = store.create_identity(&new_identity("user_2", false)).unwrap();
        let (_, p3) = store.create_identity(&new_identity("user_3", false)).unwrap();
        store.create_friendship(p1.id, p2.id).unwrap();

        let result = store.update_profile(p1.id, &following(&[p1.id]));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(ids(&store.list_following(p1.id).unwrap()), vec![p2.id]);

        let mixed = ProfileUpdate {
            username: Some("renamed".to_string()),
            following: Some(vec![p3.id]),
            followers: Some(vec![9999]),
            ..Default::default()
        };
        let result = store.update_profile(p1.id, &mixed);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(ids(&store.list_following(p1.id).unwrap()), vec![p2.id]);
        assert_eq!(
            store.get_profile(p1.id).unwrap().unwrap().user.username,
            "user_1"
        );
    }

    #[test]
    fn test_update_profile_unknown_profile() {
        let (store, _temp) = open_store();

        let result = store.update_profile(42, &ProfileUpdate::default());
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn test_taken_lesson_unique_pair() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let lesson = store.create_lesson("Statistics", "Math").unwrap();

        store.create_taken_lesson(p1.id, lesson.id, 0).unwrap();
        let result = store.create_taken_lesson(p1.id, lesson.id, 0);
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = store.create_taken_lesson(p1.id, 9999, 0);
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_record_lesson_taken_increments() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let lesson = store.create_lesson("Statistics", "Math").unwrap();

        let first = store.record_lesson_taken(p1.id, lesson.id).unwrap();
        assert_eq!(first.times_taken, 1);
        let second = store.record_lesson_taken(p1.id, lesson.id).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.times_taken, 2);

        assert_eq!(store.list_taken_lessons(0, 10).unwrap().len(), 1);
        assert_eq!(store.list_profile_lessons(p1.id).unwrap(), vec![lesson]);
    }

    #[test]
    fn test_record_lesson_taken_after_bare_create() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let lesson = store.create_lesson("Statistics", "Math").unwrap();

        store.create_taken_lesson(p1.id, lesson.id, 0).unwrap();
        let recorded = store.record_lesson_taken(p1.id, lesson.id).unwrap();
        assert_eq!(recorded.times_taken, 1);
    }

    #[test]
    fn test_delete_lesson_cascades_to_taken_lessons() {
        let (store, _temp) = open_store();

        let (_, p1) = store.create_identity(&new_identity("user_1", false)).unwrap();
        let lesson = store.create_lesson("Statistics", "Math").unwrap();
        store.record_lesson_taken(p1.id, lesson.id).unwrap();

        assert!(store.delete_lesson(lesson.id).unwrap());
        assert!(store.list_profile_lessons(p1.id).unwrap().is_empty());
        assert!(!store.delete_lesson(lesson.id).unwrap());
    }

    #[test]
    fn test_lessons_allow_duplicate_names() {
        let (store, _temp) = open_store();

        let a = store.create_lesson("Statistics", "Math").unwrap();
        let b = store.create_lesson("Statistics", "Economics").unwrap();
        assert_ne!(a.id, b.id);

        let page = store.list_lessons(a.id, 10).unwrap();
        assert_eq!(page, vec![b]);
    }

    #[test]
    fn test_non_staff_profiles() {
        let (store, _temp) = open_store();

        let (_, regular) = store.create_identity(&new_identity("regular", false)).unwrap();
        store.create_identity(&new_identity("admin", true)).unwrap();

        let profiles = store.list_non_staff_profiles().unwrap();
        assert_eq!(profiles, vec![regular]);
    }

    #[test]
    fn test_token_lookup_collision() {
        let (store, _temp) = open_store();
        let (identity, _) = store.create_identity(&new_identity("user_1", false)).unwrap();

        let token1 = Token {
            id: "token-1".to_string(),
            token_hash: "hash1".to_string(),
            token_lookup: "lookup12".to_string(),
            kind: TokenKind::Access,
            identity_id: identity.id,
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::minutes(5),
            last_used_at: None,
            revoked_at: None,
        };
        store.create_token(&token1).unwrap();

        let token2 = Token {
            id: "token-2".to_string(),
            token_hash: "hash2".to_string(),
            ..token1.clone()
        };

        let result = store.create_token(&token2);
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
    }

    #[test]
    fn test_revoke_and_purge_tokens() {
        let (store, _temp) = open_store();
        let (identity, _) = store.create_identity(&new_identity("user_1", false)).unwrap();

        let now = Utc::now();
        let live = Token {
            id: "live".to_string(),
            token_hash: "hash".to_string(),
            token_lookup: "aaaaaaaa".to_string(),
            kind: TokenKind::Refresh,
            identity_id: identity.id,
            created_at: now,
            expires_at: now + chrono::Duration::days(1),
            last_used_at: None,
            revoked_at: None,
        };
        let stale = Token {
            id: "stale".to_string(),
            token_lookup: "bbbbbbbb".to_string(),
            expires_at: now - chrono::Duration::seconds(1),
            ..live.clone()
        };
        store.create_token(&live).unwrap();
        store.create_token(&stale).unwrap();

        assert!(store.revoke_token("live").unwrap());
        assert!(!store.revoke_token("live").unwrap());
        let fetched = store.get_token_by_lookup("aaaaaaaa").unwrap().unwrap();
        assert_eq!(fetched.kind, TokenKind::Refresh);
        assert!(fetched.revoked_at.is_some());

        assert_eq!(store.delete_expired_tokens(now).unwrap(), 1);
        assert!(store.get_token_by_lookup("bbbbbbbb").unwrap().is_none());
    }
}
