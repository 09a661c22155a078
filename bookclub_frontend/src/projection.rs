//! Pure view projection: sorting and paging of an assembled review thread.
//! Never mutates its input; the caller re-projects whenever the thread, the
//! sort key or the page changes.

use crate::models::{parse_timestamp, Review};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Latest,
    Likes,
    Replies,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Latest, SortKey::Likes, SortKey::Replies];

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Latest => "Latest",
            SortKey::Likes => "Likes",
            SortKey::Replies => "Replies",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadPage {
    pub reviews: Vec<Review>,
    /// Effective 1-based page: the requested page, or 1 when the request
    /// pointed past the end of the shrunken list.
    pub page: usize,
    pub total_pages: usize,
}

/// Sorts a copy of the thread by the chosen key (all descending, stable on
/// ties) and slices out one fixed-size page.
pub fn project(reviews: &[Review], sort: SortKey, page: usize, page_size: usize) -> ThreadPage {
    let mut sorted: Vec<Review> = reviews.to_vec();
    match sort {
        // Unparseable timestamps sort last rather than poisoning the order.
        SortKey::Latest => sorted.sort_by(|a, b| {
            parse_timestamp(&b.created_at).cmp(&parse_timestamp(&a.created_at))
        }),
        SortKey::Likes => sorted.sort_by(|a, b| b.likes.len().cmp(&a.likes.len())),
        SortKey::Replies => sorted.sort_by(|a, b| b.replies.len().cmp(&a.replies.len())),
    }

    let page_size = page_size.max(1);
    let total_pages = sorted.len().div_ceil(page_size);
    let page = if page == 0 || page > total_pages { 1 } else { page };

    let start = (page - 1) * page_size;
    let reviews = if start < sorted.len() {
        sorted[start..(start + page_size).min(sorted.len())].to_vec()
    } else {
        Vec::new()
    };

    ThreadPage {
        reviews,
        page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn review(id: i64, created_at: &str, likes: usize, replies: usize) -> Review {
        Review {
            id,
            book_id: "OL123W".into(),
            content: format!("review {id}"),
            likes: (0..likes).map(|i| format!("user{i}")).collect(),
            created_at: created_at.into(),
            replies: (0..replies)
                .map(|i| crate::models::Reply {
                    id: i as i64,
                    review_id: id,
                    ..crate::models::Reply::default()
                })
                .collect(),
            author: "alice".into(),
        }
    }

    fn sample() -> Vec<Review> {
        vec![
            review(1, "2024-01-01T10:00:00", 2, 0),
            review(2, "2024-03-01T10:00:00", 0, 3),
            review(3, "2024-02-01T10:00:00", 5, 1),
        ]
    }

    #[test]
    fn latest_sorts_by_created_at_descending() {
        let page = project(&sample(), SortKey::Latest, 1, 5);
        let ids: Vec<i64> = page.reviews.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn likes_and_replies_sort_descending_by_count() {
        let by_likes: Vec<i64> = project(&sample(), SortKey::Likes, 1, 5)
            .reviews
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_likes, vec![3, 1, 2]);

        let by_replies: Vec<i64> = project(&sample(), SortKey::Replies, 1, 5)
            .reviews
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_replies, vec![2, 3, 1]);
    }

    #[test]
    fn unparseable_timestamps_sort_last_under_latest() {
        let mut reviews = sample();
        reviews.push(review(4, "garbage", 0, 0));
        let ids: Vec<i64> = project(&reviews, SortKey::Latest, 1, 5)
            .reviews
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1, 4]);
    }

    #[test]
    fn paging_partitions_without_overlap_or_loss() {
        let reviews: Vec<Review> = (0..12i64)
            .map(|i| review(i, "2024-01-01T10:00:00", 0, 0))
            .collect();
        let mut seen = Vec::new();
        let total = project(&reviews, SortKey::Latest, 1, 5).total_pages;
        assert_eq!(total, 3);
        for page in 1..=total {
            let slice = project(&reviews, SortKey::Latest, page, 5);
            assert!(slice.reviews.len() <= 5);
            seen.extend(slice.reviews.iter().map(|r| r.id));
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..12i64).collect::<Vec<_>>());
    }

    #[test]
    fn page_past_the_end_resets_to_first_page() {
        let reviews: Vec<Review> = (0..6i64)
            .map(|i| review(i, "2024-01-01T10:00:00", 0, 0))
            .collect();
        // Page 2 exists with six reviews, then a deletion shrinks the list.
        assert_eq!(project(&reviews, SortKey::Latest, 2, 5).page, 2);
        let shrunk = &reviews[..5];
        let projected = project(shrunk, SortKey::Latest, 2, 5);
        assert_eq!(projected.page, 1);
        assert_eq!(projected.reviews.len(), 5);
    }

    #[test]
    fn empty_thread_projects_to_an_empty_first_page() {
        let projected = project(&[], SortKey::Latest, 3, 5);
        assert_eq!(projected.page, 1);
        assert_eq!(projected.total_pages, 0);
        assert!(projected.reviews.is_empty());
    }

    #[test]
    fn stable_sort_keeps_fetch_order_on_ties() {
        let reviews = vec![
            review(1, "2024-01-01T10:00:00", 1, 0),
            review(2, "2024-01-01T10:00:00", 1, 0),
        ];
        let ids: Vec<i64> = project(&reviews, SortKey::Likes, 1, 5)
            .reviews
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn does_not_mutate_the_input_order() {
        let reviews = sample();
        let before: Vec<i64> = reviews.iter().map(|r| r.id).collect();
        let _ = project(&reviews, SortKey::Likes, 1, 5);
        let after: Vec<i64> = reviews.iter().map(|r| r.id).collect();
        assert_eq!(before, after);
    }
}
