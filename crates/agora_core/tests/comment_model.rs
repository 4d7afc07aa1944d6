use agora_core::{
    Author, AuthorSummary, Comment, CommentValidationError, Flag, NewComment, NewReply, Reply,
    VoteTally,
};
use uuid::Uuid;

#[test]
fn author_summary_derives_full_name() {
    let summary = AuthorSummary::new("u1", "Ada", "Lovelace", Some("ada.png".to_string()));

    assert_eq!(summary.id, "u1");
    assert_eq!(summary.full_name, "Ada Lovelace");
    assert_eq!(summary.avatar.as_deref(), Some("ada.png"));
}

#[test]
fn new_comment_validate_rejects_blank_required_fields() {
    let valid = NewComment {
        text: "Good idea".to_string(),
        author: "u1".to_string(),
        context: "proposal".to_string(),
        reference: "p42".to_string(),
    };
    valid.validate().expect("complete input should validate");

    let mut missing_text = valid.clone();
    missing_text.text = "   ".to_string();
    assert_eq!(
        missing_text.validate().unwrap_err(),
        CommentValidationError::MissingField { field: "text" }
    );

    let mut missing_reference = valid.clone();
    missing_reference.reference = String::new();
    assert_eq!(
        missing_reference.validate().unwrap_err(),
        CommentValidationError::MissingField { field: "reference" }
    );
}

#[test]
fn new_reply_validate_rejects_blank_author() {
    let reply = NewReply {
        text: "agreed".to_string(),
        author: String::new(),
    };

    assert_eq!(
        reply.validate().unwrap_err(),
        CommentValidationError::MissingField { field: "author" }
    );
}

#[test]
fn comment_serialization_uses_expected_wire_fields() {
    let comment_id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let reply_id = Uuid::parse_str("66666666-7777-4888-9999-aaaaaaaaaaaa").unwrap();

    let comment = Comment {
        id: comment_id,
        text: "Good idea".to_string(),
        author: Author::Resolved(AuthorSummary::new("u1", "Ada", "Lovelace", None)),
        context: "proposal".to_string(),
        reference: "p42".to_string(),
        created_at: 1_700_000_000_000,
        replies: vec![Reply {
            id: reply_id,
            text: "agreed".to_string(),
            author: Author::Reference("u2".to_string()),
            created_at: 1_700_000_060_000,
        }],
        tally: VoteTally {
            positive: 2,
            negative: 1,
        },
        flags: vec![Flag {
            citizen_id: "u3".to_string(),
            category: "spam".to_string(),
            created_at: 1_700_000_120_000,
        }],
    };

    let json = serde_json::to_value(&comment).unwrap();
    assert_eq!(json["id"], comment_id.to_string());
    assert_eq!(json["text"], "Good idea");
    assert_eq!(json["author"]["id"], "u1");
    assert_eq!(json["author"]["full_name"], "Ada Lovelace");
    assert_eq!(json["context"], "proposal");
    assert_eq!(json["reference"], "p42");
    assert_eq!(json["created_at"], 1_700_000_000_000_i64);
    assert_eq!(json["replies"][0]["author"], "u2");
    assert_eq!(json["tally"]["positive"], 2);
    assert_eq!(json["tally"]["negative"], 1);
    assert_eq!(json["flags"][0]["category"], "spam");

    let decoded: Comment = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, comment);
}

#[test]
fn unresolved_author_serializes_as_bare_citizen_id() {
    let author = Author::Reference("u9".to_string());

    let json = serde_json::to_value(&author).unwrap();
    assert_eq!(json, serde_json::json!("u9"));

    let decoded: Author = serde_json::from_value(json).unwrap();
    assert!(!decoded.is_resolved());
    assert_eq!(decoded.citizen_id(), "u9");
}
