use agora_core::db::open_db_in_memory;
use agora_core::{
    CitizenDirectory, CitizenProfile, Comment, CommentRepository, CommentValidationError,
    NewComment, RepoError, SqliteCitizenDirectory, SqliteCommentRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn seeded_conn() -> Connection {
    let conn = open_db_in_memory().unwrap();
    let directory = SqliteCitizenDirectory::try_new(&conn).unwrap();
    for (id, first_name, last_name) in [
        ("u1", "Ada", "Lovelace"),
        ("u2", "Grace", "Hopper"),
        ("u3", "Edsger", "Dijkstra"),
    ] {
        directory
            .upsert_citizen(&CitizenProfile {
                id: id.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                avatar: None,
            })
            .unwrap();
    }
    conn
}

fn create_comment(repo: &SqliteCommentRepository<'_>) -> Comment {
    repo.create(&NewComment {
        text: "Good idea".to_string(),
        author: "u1".to_string(),
        context: "proposal".to_string(),
        reference: "p42".to_string(),
    })
    .unwrap()
}

#[test]
fn upvote_registers_positive_vote() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    let voted = repo.upvote(comment.id, "u2").unwrap();

    assert_eq!(voted.tally.positive, 1);
    assert_eq!(voted.tally.negative, 0);
}

#[test]
fn upvote_then_downvote_leaves_single_negative_vote() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    repo.upvote(comment.id, "u2").unwrap();
    let voted = repo.downvote(comment.id, "u2").unwrap();

    assert_eq!(voted.tally.positive, 0);
    assert_eq!(voted.tally.negative, 1);
}

#[test]
fn repeated_upvote_does_not_double_count() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    repo.upvote(comment.id, "u2").unwrap();
    let voted = repo.upvote(comment.id, "u2").unwrap();

    assert_eq!(voted.tally.positive, 1);
    assert_eq!(voted.tally.negative, 0);
}

#[test]
fn votes_from_different_citizens_accumulate() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    repo.upvote(comment.id, "u2").unwrap();
    let voted = repo.downvote(comment.id, "u3").unwrap();

    assert_eq!(voted.tally.positive, 1);
    assert_eq!(voted.tally.negative, 1);
}

#[test]
fn vote_on_missing_comment_returns_not_found_without_state_change() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    let missing = Uuid::new_v4();
    let err = repo.upvote(missing, "u2").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));

    let all = repo.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, comment.id);
    assert_eq!(all[0].tally.positive, 0);
    assert_eq!(all[0].tally.negative, 0);
}

#[test]
fn vote_requires_citizen_identity() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    let err = repo.upvote(comment.id, "  ").unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(CommentValidationError::MissingField { field: "citizen" })
    ));
}

#[test]
fn flag_marks_comment_as_spam_for_that_citizen() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    let flagged = repo.flag(comment.id, "u2").unwrap();

    assert!(flagged.is_flagged());
    let flag = flagged.flag_by("u2").expect("u2's flag should be present");
    assert_eq!(flag.category, "spam");
}

#[test]
fn flag_is_idempotent_per_citizen() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    repo.flag(comment.id, "u2").unwrap();
    let flagged = repo.flag(comment.id, "u2").unwrap();

    assert_eq!(flagged.flags.len(), 1);
}

#[test]
fn flag_then_unflag_restores_unflagged_state() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    repo.flag(comment.id, "u2").unwrap();
    let cleared = repo.unflag(comment.id, "u2").unwrap();

    assert!(cleared.flag_by("u2").is_none());
    assert!(!cleared.is_flagged());
}

#[test]
fn unflag_only_clears_that_citizens_mark() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    repo.flag(comment.id, "u2").unwrap();
    repo.flag(comment.id, "u3").unwrap();
    let cleared = repo.unflag(comment.id, "u2").unwrap();

    assert!(cleared.flag_by("u2").is_none());
    assert!(cleared.flag_by("u3").is_some());
    assert!(cleared.is_flagged());
}

#[test]
fn unflag_without_prior_flag_is_a_noop() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    let comment = create_comment(&repo);

    let cleared = repo.unflag(comment.id, "u2").unwrap();

    assert!(!cleared.is_flagged());
    assert_eq!(cleared.id, comment.id);
}

#[test]
fn flag_on_missing_comment_returns_not_found() {
    let conn = seeded_conn();
    let repo = SqliteCommentRepository::try_new(&conn).unwrap();
    create_comment(&repo);

    let missing = Uuid::new_v4();
    let err = repo.flag(missing, "u2").unwrap_err();

    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}
