//! Comment repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Mediate all reads and writes to the comment collection.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate caller input before any SQL mutation.
//! - Read paths reject invalid persisted state instead of masking it.
//! - A citizen holds at most one active vote and one active flag per
//!   comment, enforced by the `(comment_uuid, citizen_id)` primary keys.
//! - Subject listings are ordered by creation time descending.

use crate::db::{migrations::latest_version, DbError};
use crate::model::comment::{
    Author, AuthorSummary, Comment, CommentId, CommentValidationError, Flag, NewComment, NewReply,
    Reply, VoteTally, VoteValue,
};
use log::{error, info};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const COMMENT_SELECT_SQL: &str = "SELECT
    c.uuid,
    c.text,
    c.author_id,
    c.context,
    c.reference,
    c.created_at,
    z.first_name,
    z.last_name,
    z.avatar
FROM comments c
LEFT JOIN citizens z ON z.id = c.author_id";

const REPLY_SELECT_SQL: &str = "SELECT
    r.uuid,
    r.text,
    r.author_id,
    r.created_at,
    z.first_name,
    z.last_name,
    z.avatar
FROM replies r
LEFT JOIN citizens z ON z.id = r.author_id";

/// Report category recorded by the flag operation.
const FLAG_CATEGORY_SPAM: &str = "spam";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for comment persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CommentValidationError),
    Db(DbError),
    NotFound(CommentId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "comment not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted comment data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CommentValidationError> for RepoError {
    fn from(value: CommentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Context/reference pair identifying the subject a comment belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectQuery {
    /// Subject kind, e.g. `proposal`.
    pub context: String,
    /// Subject id within `context`, e.g. a proposal id.
    pub reference: String,
}

impl SubjectQuery {
    pub fn new(context: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            reference: reference.into(),
        }
    }
}

/// Repository interface for the comment collection.
pub trait CommentRepository {
    /// Returns every stored comment, author left as an unresolved reference,
    /// most recent first.
    fn list_all(&self) -> RepoResult<Vec<Comment>>;
    /// Validates and persists a new comment, returning it with the author
    /// reference resolved to its summary fields.
    fn create(&self, new_comment: &NewComment) -> RepoResult<Comment>;
    /// Returns the comments for one subject, authors resolved, most recent
    /// first.
    fn get_for(&self, query: &SubjectQuery) -> RepoResult<Vec<Comment>>;
    /// Appends a reply to an existing comment and returns the persisted
    /// reply.
    fn reply(&self, comment_id: CommentId, new_reply: &NewReply) -> RepoResult<Reply>;
    /// Registers a positive vote by the citizen, replacing any previous vote.
    fn upvote(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment>;
    /// Registers a negative vote by the citizen, replacing any previous vote.
    fn downvote(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment>;
    /// Marks the comment as reported (`spam`) by the citizen. Idempotent per
    /// citizen.
    fn flag(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment>;
    /// Clears the citizen's report mark. Idempotent per citizen.
    fn unflag(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment>;
}

/// SQLite-backed comment repository.
pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Reads one comment with its author resolved, failing `NotFound` when
    /// the id does not resolve.
    fn read_resolved(&self, comment_id: CommentId) -> RepoResult<Comment> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE c.uuid = ?1;"))?;
        let mut rows = stmt.query([comment_id.to_string()])?;

        if let Some(row) = rows.next()? {
            let mut comment = comment_from_row(row, true)?;
            attach_children(self.conn, &mut comment, true)?;
            return Ok(comment);
        }

        Err(RepoError::NotFound(comment_id))
    }

    fn ensure_comment_exists(&self, comment_id: CommentId) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM comments WHERE uuid = ?1);",
            [comment_id.to_string()],
            |row| row.get(0),
        )?;

        if exists == 1 {
            Ok(())
        } else {
            Err(RepoError::NotFound(comment_id))
        }
    }

    fn cast_vote(
        &self,
        comment_id: CommentId,
        citizen_id: &str,
        value: VoteValue,
    ) -> RepoResult<Comment> {
        require_citizen(citizen_id)?;
        self.ensure_comment_exists(comment_id)?;

        self.conn.execute(
            "INSERT INTO comment_votes (comment_uuid, citizen_id, value, created_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT (comment_uuid, citizen_id) DO UPDATE SET
                value = excluded.value,
                created_at = excluded.created_at;",
            params![
                comment_id.to_string(),
                citizen_id,
                vote_value_to_db(value),
            ],
        )?;

        info!(
            "event=comment_vote module=repo status=ok comment={} value={}",
            comment_id,
            vote_value_to_db(value)
        );
        self.read_resolved(comment_id)
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn list_all(&self) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL} ORDER BY c.created_at DESC, c.uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut comments = Vec::new();

        while let Some(row) = rows.next()? {
            comments.push(comment_from_row(row, false)?);
        }
        for comment in &mut comments {
            attach_children(self.conn, comment, false)?;
        }

        Ok(comments)
    }

    fn create(&self, new_comment: &NewComment) -> RepoResult<Comment> {
        new_comment.validate()?;

        let comment_id: CommentId = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO comments (uuid, text, author_id, context, reference, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, (strftime('%s', 'now') * 1000));",
            params![
                comment_id.to_string(),
                new_comment.text.as_str(),
                new_comment.author.as_str(),
                new_comment.context.as_str(),
                new_comment.reference.as_str(),
            ],
        );
        if let Err(err) = inserted {
            error!(
                "event=comment_create module=repo status=error context={} reference={} error_code=comment_persist_failed error={}",
                new_comment.context, new_comment.reference, err
            );
            return Err(err.into());
        }

        info!(
            "event=comment_create module=repo status=ok comment={} context={} reference={}",
            comment_id, new_comment.context, new_comment.reference
        );
        self.read_resolved(comment_id)
    }

    fn get_for(&self, query: &SubjectQuery) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE c.context = ?1 AND c.reference = ?2
             ORDER BY c.created_at DESC, c.uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![query.context.as_str(), query.reference.as_str()])?;
        let mut comments = Vec::new();

        while let Some(row) = rows.next()? {
            comments.push(comment_from_row(row, true)?);
        }
        for comment in &mut comments {
            attach_children(self.conn, comment, true)?;
        }

        Ok(comments)
    }

    fn reply(&self, comment_id: CommentId, new_reply: &NewReply) -> RepoResult<Reply> {
        self.ensure_comment_exists(comment_id)?;
        new_reply.validate()?;

        let reply_id = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO replies (uuid, comment_uuid, text, author_id, created_at)
             VALUES (?1, ?2, ?3, ?4, (strftime('%s', 'now') * 1000));",
            params![
                reply_id.to_string(),
                comment_id.to_string(),
                new_reply.text.as_str(),
                new_reply.author.as_str(),
            ],
        );
        // A reply that cannot be persisted fails the whole call; no phantom
        // reply is ever handed back to the caller.
        if let Err(err) = inserted {
            error!(
                "event=comment_reply module=repo status=error comment={} error_code=reply_persist_failed error={}",
                comment_id, err
            );
            return Err(err.into());
        }

        info!(
            "event=comment_reply module=repo status=ok comment={} reply={}",
            comment_id, reply_id
        );

        let mut stmt = self
            .conn
            .prepare(&format!("{REPLY_SELECT_SQL} WHERE r.uuid = ?1;"))?;
        let mut rows = stmt.query([reply_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return reply_from_row(row, true);
        }

        Err(RepoError::InvalidData(format!(
            "reply `{reply_id}` missing immediately after insert"
        )))
    }

    fn upvote(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        self.cast_vote(comment_id, citizen_id, VoteValue::Positive)
    }

    fn downvote(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        self.cast_vote(comment_id, citizen_id, VoteValue::Negative)
    }

    fn flag(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        require_citizen(citizen_id)?;
        self.ensure_comment_exists(comment_id)?;

        self.conn.execute(
            "INSERT INTO comment_flags (comment_uuid, citizen_id, category, created_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT (comment_uuid, citizen_id) DO NOTHING;",
            params![comment_id.to_string(), citizen_id, FLAG_CATEGORY_SPAM],
        )?;

        info!(
            "event=comment_flag module=repo status=ok comment={} category={}",
            comment_id, FLAG_CATEGORY_SPAM
        );
        self.read_resolved(comment_id)
    }

    fn unflag(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        require_citizen(citizen_id)?;
        self.ensure_comment_exists(comment_id)?;

        self.conn.execute(
            "DELETE FROM comment_flags WHERE comment_uuid = ?1 AND citizen_id = ?2;",
            params![comment_id.to_string(), citizen_id],
        )?;

        info!(
            "event=comment_unflag module=repo status=ok comment={}",
            comment_id
        );
        self.read_resolved(comment_id)
    }
}

fn comment_from_row(row: &Row<'_>, resolve_author: bool) -> RepoResult<Comment> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in comments.uuid"))
    })?;
    let author_id: String = row.get("author_id")?;

    Ok(Comment {
        id,
        text: row.get("text")?,
        author: author_from_row(row, author_id, resolve_author)?,
        context: row.get("context")?,
        reference: row.get("reference")?,
        created_at: row.get("created_at")?,
        replies: Vec::new(),
        tally: VoteTally::default(),
        flags: Vec::new(),
    })
}

fn reply_from_row(row: &Row<'_>, resolve_author: bool) -> RepoResult<Reply> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in replies.uuid"))
    })?;
    let author_id: String = row.get("author_id")?;

    Ok(Reply {
        id,
        text: row.get("text")?,
        author: author_from_row(row, author_id, resolve_author)?,
        created_at: row.get("created_at")?,
    })
}

/// Builds the author field from the joined citizen columns.
///
/// A citizen missing from the directory degrades to an unresolved reference;
/// the weak reference is never an error.
fn author_from_row(row: &Row<'_>, author_id: String, resolve: bool) -> RepoResult<Author> {
    if resolve {
        let first_name: Option<String> = row.get("first_name")?;
        let last_name: Option<String> = row.get("last_name")?;
        if let (Some(first_name), Some(last_name)) = (first_name, last_name) {
            let avatar: Option<String> = row.get("avatar")?;
            return Ok(Author::Resolved(AuthorSummary::new(
                author_id, first_name, last_name, avatar,
            )));
        }
    }

    Ok(Author::Reference(author_id))
}

fn attach_children(
    conn: &Connection,
    comment: &mut Comment,
    resolve_authors: bool,
) -> RepoResult<()> {
    let comment_uuid = comment.id.to_string();
    comment.replies = load_replies(conn, &comment_uuid, resolve_authors)?;
    comment.tally = load_tally(conn, &comment_uuid)?;
    comment.flags = load_flags(conn, &comment_uuid)?;
    Ok(())
}

fn load_replies(
    conn: &Connection,
    comment_uuid: &str,
    resolve_authors: bool,
) -> RepoResult<Vec<Reply>> {
    let mut stmt = conn.prepare(&format!(
        "{REPLY_SELECT_SQL}
         WHERE r.comment_uuid = ?1
         ORDER BY r.created_at ASC, r.uuid ASC;"
    ))?;
    let mut rows = stmt.query([comment_uuid])?;
    let mut replies = Vec::new();

    while let Some(row) = rows.next()? {
        replies.push(reply_from_row(row, resolve_authors)?);
    }

    Ok(replies)
}

fn load_tally(conn: &Connection, comment_uuid: &str) -> RepoResult<VoteTally> {
    let mut stmt = conn.prepare(
        "SELECT value, COUNT(*)
         FROM comment_votes
         WHERE comment_uuid = ?1
         GROUP BY value;",
    )?;
    let mut rows = stmt.query([comment_uuid])?;
    let mut tally = VoteTally::default();

    while let Some(row) = rows.next()? {
        let value_text: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        match parse_vote_value(&value_text) {
            Some(VoteValue::Positive) => tally.positive = count,
            Some(VoteValue::Negative) => tally.negative = count,
            None => {
                return Err(RepoError::InvalidData(format!(
                    "invalid vote value `{value_text}` in comment_votes.value"
                )));
            }
        }
    }

    Ok(tally)
}

fn load_flags(conn: &Connection, comment_uuid: &str) -> RepoResult<Vec<Flag>> {
    let mut stmt = conn.prepare(
        "SELECT citizen_id, category, created_at
         FROM comment_flags
         WHERE comment_uuid = ?1
         ORDER BY created_at ASC, citizen_id ASC;",
    )?;
    let mut rows = stmt.query([comment_uuid])?;
    let mut flags = Vec::new();

    while let Some(row) = rows.next()? {
        flags.push(Flag {
            citizen_id: row.get(0)?,
            category: row.get(1)?,
            created_at: row.get(2)?,
        });
    }

    Ok(flags)
}

fn vote_value_to_db(value: VoteValue) -> &'static str {
    match value {
        VoteValue::Positive => "positive",
        VoteValue::Negative => "negative",
    }
}

fn parse_vote_value(value: &str) -> Option<VoteValue> {
    match value {
        "positive" => Some(VoteValue::Positive),
        "negative" => Some(VoteValue::Negative),
        _ => None,
    }
}

fn require_citizen(citizen_id: &str) -> Result<(), CommentValidationError> {
    if citizen_id.trim().is_empty() {
        return Err(CommentValidationError::MissingField { field: "citizen" });
    }
    Ok(())
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in [
        "citizens",
        "comments",
        "replies",
        "comment_votes",
        "comment_flags",
    ] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    for column in [
        "uuid",
        "text",
        "author_id",
        "context",
        "reference",
        "created_at",
    ] {
        if !table_has_column(conn, "comments", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "comments",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
