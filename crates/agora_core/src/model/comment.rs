//! Comment domain model.
//!
//! # Responsibility
//! - Define the persisted comment record and its reply/vote/flag state.
//! - Validate caller input before it reaches the persistence boundary.
//!
//! # Invariants
//! - `id` is stable and never reused for another comment or reply.
//! - `author` is a weak reference: the citizen record is looked up on read,
//!   never owned or embedded by the comment.
//! - A citizen holds at most one active vote and one active flag per
//!   comment.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a comment.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type CommentId = Uuid;

/// Stable identifier for a reply within its parent comment.
pub type ReplyId = Uuid;

/// Opaque identity of a citizen, issued by the identity layer upstream.
pub type CitizenId = String;

/// Summary projection of a citizen, resolved from the directory on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: CitizenId,
    pub first_name: String,
    pub last_name: String,
    /// Derived from the name parts; never stored.
    pub full_name: String,
    pub avatar: Option<String>,
}

impl AuthorSummary {
    /// Builds a summary, deriving `full_name` from the name parts.
    pub fn new(
        id: impl Into<CitizenId>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        avatar: Option<String>,
    ) -> Self {
        let first_name = first_name.into();
        let last_name = last_name.into();
        let full_name = format!("{first_name} {last_name}");
        Self {
            id: id.into(),
            first_name,
            last_name,
            full_name,
            avatar,
        }
    }
}

/// Author of a comment or reply.
///
/// Serialized untagged: an unresolved reference is a bare citizen id string,
/// a resolved author is the summary object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Author {
    /// Resolved summary projection from the citizen directory.
    Resolved(AuthorSummary),
    /// Weak reference by citizen id, not yet resolved.
    Reference(CitizenId),
}

impl Author {
    /// Returns the citizen id behind either representation.
    pub fn citizen_id(&self) -> &str {
        match self {
            Self::Resolved(summary) => summary.id.as_str(),
            Self::Reference(id) => id.as_str(),
        }
    }

    /// Returns whether the directory lookup has been applied.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Polarity of a citizen's vote on a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Positive,
    Negative,
}

/// Aggregated vote counts for one comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub positive: i64,
    pub negative: i64,
}

/// One citizen's moderation mark on a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub citizen_id: CitizenId,
    /// Report category; this surface only produces `spam`.
    pub category: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Sub-record owned exclusively by its parent comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: ReplyId,
    pub text: String,
    pub author: Author,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Canonical persisted comment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub text: String,
    pub author: Author,
    /// Subject kind the comment belongs to, e.g. `proposal`.
    pub context: String,
    /// Subject id within `context`, e.g. a proposal id.
    pub reference: String,
    /// Unix epoch milliseconds, stamped by the store at insert.
    pub created_at: i64,
    /// Ordered oldest-first; appended to by the reply operation.
    pub replies: Vec<Reply>,
    pub tally: VoteTally,
    pub flags: Vec<Flag>,
}

impl Comment {
    /// Returns this citizen's active flag, if any.
    pub fn flag_by(&self, citizen_id: &str) -> Option<&Flag> {
        self.flags.iter().find(|flag| flag.citizen_id == citizen_id)
    }

    /// Returns whether any citizen has flagged this comment.
    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Input record for creating a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub text: String,
    /// Citizen id of the author; resolution happens on read.
    pub author: CitizenId,
    pub context: String,
    pub reference: String,
}

impl NewComment {
    /// Rejects blank required fields before any write is attempted.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        require_field("text", &self.text)?;
        require_field("author", &self.author)?;
        require_field("context", &self.context)?;
        require_field("reference", &self.reference)?;
        Ok(())
    }
}

/// Input record for replying to an existing comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReply {
    pub text: String,
    pub author: CitizenId,
}

impl NewReply {
    /// Rejects blank required fields before any write is attempted.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        require_field("text", &self.text)?;
        require_field("author", &self.author)?;
        Ok(())
    }
}

/// Directory row for one citizen, maintained by the identity-sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenProfile {
    pub id: CitizenId,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
}

impl CitizenProfile {
    /// Rejects blank identity fields before any write is attempted.
    pub fn validate(&self) -> Result<(), CommentValidationError> {
        require_field("id", &self.id)?;
        require_field("first_name", &self.first_name)?;
        require_field("last_name", &self.last_name)?;
        Ok(())
    }

    /// Projects this profile to the read-side summary shape.
    pub fn to_summary(&self) -> AuthorSummary {
        AuthorSummary::new(
            self.id.clone(),
            self.first_name.clone(),
            self.last_name.clone(),
            self.avatar.clone(),
        )
    }
}

/// Validation failure for caller-provided input records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentValidationError {
    /// A required field is missing or blank.
    MissingField { field: &'static str },
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "required field `{field}` is missing or blank")
            }
        }
    }
}

impl Error for CommentValidationError {}

fn require_field(field: &'static str, value: &str) -> Result<(), CommentValidationError> {
    if value.trim().is_empty() {
        return Err(CommentValidationError::MissingField { field });
    }
    Ok(())
}
