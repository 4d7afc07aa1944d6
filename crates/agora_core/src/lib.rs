//! Core comment-store logic for Agora.
//! This crate is the single source of truth for comment persistence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::comment::{
    Author, AuthorSummary, CitizenId, CitizenProfile, Comment, CommentId, CommentValidationError,
    Flag, NewComment, NewReply, Reply, ReplyId, VoteTally, VoteValue,
};
pub use repo::citizen_repo::{CitizenDirectory, SqliteCitizenDirectory};
pub use repo::comment_repo::{
    CommentRepository, RepoError, RepoResult, SqliteCommentRepository, SubjectQuery,
};
pub use service::comment_service::CommentService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
