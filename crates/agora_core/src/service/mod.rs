//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the request-handling layer decoupled from storage details.

pub mod comment_service;
