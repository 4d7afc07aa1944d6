//! Domain model for deliberation comments.
//!
//! # Responsibility
//! - Define the canonical comment/reply records and their vote/flag state.
//! - Keep author and voter identity as weak references into the citizen
//!   directory.
//!
//! # Invariants
//! - Every comment and reply is identified by a stable UUID.
//! - A reply has no lifecycle of its own; it lives and dies with its parent
//!   comment.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod comment;
