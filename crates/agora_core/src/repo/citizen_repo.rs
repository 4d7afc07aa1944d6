//! Citizen directory contracts and SQLite implementation.
//!
//! # Responsibility
//! - Maintain the directory projection used to resolve author references.
//! - Serve summary lookups for the read side of the comment repository.
//!
//! # Invariants
//! - The directory is a projection; identity is owned upstream and rows are
//!   replaced wholesale on upsert.
//! - `full_name` is derived on read, never persisted.

use crate::model::comment::{AuthorSummary, CitizenProfile};
use crate::repo::comment_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Directory interface for citizen summary resolution.
pub trait CitizenDirectory {
    /// Inserts or replaces one citizen's directory row.
    fn upsert_citizen(&self, profile: &CitizenProfile) -> RepoResult<()>;
    /// Looks up one citizen's summary projection.
    fn get_citizen(&self, citizen_id: &str) -> RepoResult<Option<AuthorSummary>>;
}

/// SQLite-backed citizen directory.
pub struct SqliteCitizenDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCitizenDirectory<'conn> {
    /// Constructs a directory from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_directory_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CitizenDirectory for SqliteCitizenDirectory<'_> {
    fn upsert_citizen(&self, profile: &CitizenProfile) -> RepoResult<()> {
        profile.validate()?;

        self.conn.execute(
            "INSERT INTO citizens (id, first_name, last_name, avatar)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                avatar = excluded.avatar;",
            params![
                profile.id.as_str(),
                profile.first_name.as_str(),
                profile.last_name.as_str(),
                profile.avatar.as_deref(),
            ],
        )?;

        Ok(())
    }

    fn get_citizen(&self, citizen_id: &str) -> RepoResult<Option<AuthorSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, first_name, last_name, avatar
             FROM citizens
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([citizen_id])?;

        if let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let first_name: String = row.get(1)?;
            let last_name: String = row.get(2)?;
            let avatar: Option<String> = row.get(3)?;
            return Ok(Some(AuthorSummary::new(id, first_name, last_name, avatar)));
        }

        Ok(None)
    }
}

fn ensure_directory_ready(conn: &Connection) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'citizens'
        );",
        [],
        |row| row.get(0),
    )?;

    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::MissingRequiredTable("citizens"))
    }
}
