//! Comment use-case service.
//!
//! # Responsibility
//! - Provide stable comment entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::comment::{Comment, CommentId, NewComment, NewReply, Reply};
use crate::repo::comment_repo::{CommentRepository, RepoResult, SubjectQuery};

/// Use-case service wrapper for comment operations.
pub struct CommentService<R: CommentRepository> {
    repo: R,
}

impl<R: CommentRepository> CommentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every stored comment, authors unresolved.
    pub fn list_all(&self) -> RepoResult<Vec<Comment>> {
        self.repo.list_all()
    }

    /// Creates a comment from pre-built input.
    pub fn create(&self, new_comment: &NewComment) -> RepoResult<Comment> {
        self.repo.create(new_comment)
    }

    /// Creates a comment from its field parts.
    ///
    /// # Contract
    /// - Delegates required-field validation to the repository.
    /// - Returns the persisted comment with its author resolved.
    pub fn post_comment(
        &self,
        text: impl Into<String>,
        author: impl Into<String>,
        context: impl Into<String>,
        reference: impl Into<String>,
    ) -> RepoResult<Comment> {
        let new_comment = NewComment {
            text: text.into(),
            author: author.into(),
            context: context.into(),
            reference: reference.into(),
        };
        self.repo.create(&new_comment)
    }

    /// Lists the comments for one subject, most recent first.
    pub fn get_for(&self, query: &SubjectQuery) -> RepoResult<Vec<Comment>> {
        self.repo.get_for(query)
    }

    /// Appends a reply to an existing comment.
    pub fn reply(&self, comment_id: CommentId, new_reply: &NewReply) -> RepoResult<Reply> {
        self.repo.reply(comment_id, new_reply)
    }

    /// Appends a reply built from its field parts.
    pub fn post_reply(
        &self,
        comment_id: CommentId,
        text: impl Into<String>,
        author: impl Into<String>,
    ) -> RepoResult<Reply> {
        let new_reply = NewReply {
            text: text.into(),
            author: author.into(),
        };
        self.repo.reply(comment_id, &new_reply)
    }

    /// Registers a positive vote by the citizen.
    pub fn upvote(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        self.repo.upvote(comment_id, citizen_id)
    }

    /// Registers a negative vote by the citizen.
    pub fn downvote(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        self.repo.downvote(comment_id, citizen_id)
    }

    /// Marks the comment as reported by the citizen.
    pub fn flag(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        self.repo.flag(comment_id, citizen_id)
    }

    /// Clears the citizen's report mark.
    pub fn unflag(&self, comment_id: CommentId, citizen_id: &str) -> RepoResult<Comment> {
        self.repo.unflag(comment_id, citizen_id)
    }
}
