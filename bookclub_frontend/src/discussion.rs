//! Pure core of the review thread: merges the two independent fetches
//! (reviews filtered by book, the global reply list) into display-ready
//! `Review` values and keeps author naming uniform across both shapes.

use std::collections::HashMap;

use crate::models::{Reply, ReplyPayload, Review, ReviewPayload};

/// Resolves a display name from the shapes the backend has been seen using:
/// nested `user.username` first, then the flat candidates in order, then
/// "Unknown". Empty strings count as absent.
pub fn resolve_author<'a, I>(nested: Option<&'a str>, flat: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    nested
        .into_iter()
        .chain(flat.into_iter().flatten())
        .find(|name| !name.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

fn normalize_reply(payload: ReplyPayload, review_id: i64) -> Reply {
    let author = resolve_author(
        payload.user.as_ref().and_then(|u| u.username.as_deref()),
        [payload.author_id.as_deref(), payload.user_id.as_deref()],
    );
    Reply {
        id: payload.id,
        review_id: payload.review_id.unwrap_or(review_id),
        content: payload.content,
        created_at: payload.created_at,
        author,
    }
}

/// Combines the per-book review fetch with the unfiltered reply fetch.
///
/// Replies embedded in a review win over global entries with the same id;
/// global entries whose `reviewId` points at the review fill in whatever the
/// embedding missed. Reviews keep their fetch order, so the projector alone
/// decides presentation order.
pub fn assemble(reviews: Vec<ReviewPayload>, replies: Vec<ReplyPayload>) -> Vec<Review> {
    let mut global: HashMap<i64, Vec<ReplyPayload>> = HashMap::new();
    for reply in replies {
        if let Some(review_id) = reply.review_id {
            global.entry(review_id).or_default().push(reply);
        }
    }

    reviews
        .into_iter()
        .map(|payload| {
            let author = resolve_author(
                payload.user.as_ref().and_then(|u| u.username.as_deref()),
                [payload.username.as_deref()],
            );

            let mut replies: Vec<Reply> = payload
                .replies
                .into_iter()
                .map(|reply| normalize_reply(reply, payload.id))
                .collect();
            if let Some(extra) = global.remove(&payload.id) {
                for reply in extra {
                    if !replies.iter().any(|known| known.id == reply.id) {
                        replies.push(normalize_reply(reply, payload.id));
                    }
                }
            }

            Review {
                id: payload.id,
                book_id: payload.book_id,
                content: payload.content,
                likes: payload.likes,
                created_at: payload.created_at,
                replies,
                author,
            }
        })
        .collect()
}

/// Idempotent like toggle: removes the actor if present, appends otherwise.
/// The full resulting list is what goes on the wire, not a delta.
pub fn toggle_like(likes: &[String], actor: &str) -> Vec<String> {
    if likes.iter().any(|id| id == actor) {
        likes.iter().filter(|id| *id != actor).cloned().collect()
    } else {
        let mut next = likes.to_vec();
        next.push(actor.to_string());
        next
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::UserRef;

    fn review(id: i64) -> ReviewPayload {
        ReviewPayload {
            id,
            book_id: "OL123W".into(),
            content: format!("review {id}"),
            ..ReviewPayload::default()
        }
    }

    fn reply(id: i64, review_id: i64) -> ReplyPayload {
        ReplyPayload {
            id,
            review_id: Some(review_id),
            content: format!("reply {id}"),
            ..ReplyPayload::default()
        }
    }

    #[test]
    fn author_priority_matches_the_three_server_shapes() {
        assert_eq!(resolve_author(Some("alice"), [None, None]), "alice");
        assert_eq!(resolve_author(None, [Some("bob"), None]), "bob");
        assert_eq!(resolve_author(None, [None, None]), "Unknown");
    }

    #[test]
    fn empty_names_fall_through_to_the_next_candidate() {
        assert_eq!(resolve_author(Some(""), [Some("bob")]), "bob");
        assert_eq!(resolve_author(Some(""), [Some("")]), "Unknown");
    }

    #[test]
    fn groups_global_replies_under_their_review() {
        let threads = assemble(
            vec![review(1), review(2)],
            vec![reply(10, 1), reply(11, 2), reply(12, 1), reply(13, 99)],
        );
        assert_eq!(
            threads[0].replies.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![10, 12]
        );
        assert_eq!(
            threads[1].replies.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![11]
        );
    }

    #[test]
    fn embedded_replies_win_over_global_duplicates() {
        let mut embedded = reply(10, 1);
        embedded.content = "embedded".into();
        let mut from_global = reply(10, 1);
        from_global.content = "global".into();

        let mut parent = review(1);
        parent.replies = vec![embedded];

        let threads = assemble(vec![parent], vec![from_global, reply(11, 1)]);
        assert_eq!(threads[0].replies.len(), 2);
        assert_eq!(threads[0].replies[0].content, "embedded");
        assert_eq!(threads[0].replies[1].id, 11);
    }

    #[test]
    fn reply_without_review_id_inherits_the_embedding_review() {
        let mut orphan = reply(10, 1);
        orphan.review_id = None;
        let mut parent = review(4);
        parent.replies = vec![orphan];

        let threads = assemble(vec![parent], Vec::new());
        assert_eq!(threads[0].replies[0].review_id, 4);
    }

    #[test]
    fn normalizes_reply_authors_with_all_fallbacks() {
        let mut named = reply(10, 1);
        named.user = Some(UserRef {
            username: Some("alice".into()),
        });
        let mut flat = reply(11, 1);
        flat.author_id = Some("bob".into());
        let mut legacy = reply(12, 1);
        legacy.user_id = Some("carol".into());
        let anonymous = reply(13, 1);

        let threads = assemble(vec![review(1)], vec![named, flat, legacy, anonymous]);
        let authors: Vec<&str> = threads[0]
            .replies
            .iter()
            .map(|r| r.author.as_str())
            .collect();
        assert_eq!(authors, vec!["alice", "bob", "carol", "Unknown"]);
    }

    #[test]
    fn freshly_created_review_assembles_with_its_author_and_empty_collections() {
        let payload: ReviewPayload = serde_json::from_str(
            r#"{"id": 7, "bookId": "OL123W", "content": "Great book",
                "createdAt": "2024-06-01T09:00:00", "user": {"username": "alice"}}"#,
        )
        .unwrap();
        let threads = assemble(vec![payload], Vec::new());
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].author, "alice");
        assert_eq!(threads[0].likes, Vec::<String>::new());
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn assemble_is_idempotent_for_unchanged_input() {
        let reviews = vec![review(1), review(2)];
        let replies = vec![reply(10, 1)];
        let first = assemble(reviews.clone(), replies.clone());
        let second = assemble(reviews, replies);
        assert_eq!(first, second);
    }

    #[test]
    fn toggle_like_adds_then_removes() {
        let start = vec!["alice".to_string()];
        let with_bob = toggle_like(&start, "bob");
        assert_eq!(with_bob, vec!["alice".to_string(), "bob".to_string()]);
        let without_bob = toggle_like(&with_bob, "bob");
        assert_eq!(without_bob, start);
    }

    #[test]
    fn toggle_like_from_empty_records_the_anonymous_actor() {
        let likes = toggle_like(&[], "6f9619ff-8b86-4d01-b42d-00cf4fc964ff");
        assert_eq!(likes, vec!["6f9619ff-8b86-4d01-b42d-00cf4fc964ff".to_string()]);
    }
}
