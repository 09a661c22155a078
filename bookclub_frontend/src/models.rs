use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Accepts a missing or malformed collection field and falls back to empty.
/// The backend omits `likes`/`replies` on some responses and has been seen
/// sending non-array values for them.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub docs: Vec<Book>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Book {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub publisher: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i64>,
    #[serde(default)]
    pub language: Vec<String>,
    #[serde(default)]
    pub cover_i: Option<i64>,
    #[serde(default)]
    pub number_of_pages: Option<i64>,
    #[serde(default)]
    pub subject: Vec<String>,
}

impl Book {
    /// Routable identifier: the last segment of the catalog key
    /// (`/works/OL123W` -> `OL123W`).
    pub fn work_id(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub username: Option<String>,
}

/// Review as the backend serializes it. Author identity may arrive as a
/// nested `user` object or a flat `username`; both are kept so the
/// normalization in `discussion` can pick in priority order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPayload {
    #[serde(default)]
    pub id: i64,
    #[serde(default, rename = "bookId")]
    pub book_id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub likes: Vec<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub replies: Vec<ReplyPayload>,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyPayload {
    #[serde(default)]
    pub id: i64,
    #[serde(default, rename = "reviewId")]
    pub review_id: Option<i64>,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
    #[serde(default)]
    pub user: Option<UserRef>,
    #[serde(default, rename = "authorId")]
    pub author_id: Option<String>,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

/// Review after assembly: replies grouped in, collections guaranteed
/// present, author resolved to a display name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Review {
    pub id: i64,
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub content: String,
    pub likes: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub replies: Vec<Reply>,
    #[serde(skip)]
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reply {
    pub id: i64,
    #[serde(rename = "reviewId")]
    pub review_id: i64,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "authorId")]
    pub author: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateReviewInput {
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub content: String,
    pub likes: Vec<String>,
}

/// Full payload for `PUT /reviews/{id}`: the backend replaces the row, so
/// everything except the edited content is carried over unchanged.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReviewInput {
    pub content: String,
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub likes: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplyInput {
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// The backend emits naive ISO-8601 local datetimes, the catalog RFC 3339.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn review_payload_defaults_missing_collections() {
        let review: ReviewPayload =
            serde_json::from_str(r#"{"id": 3, "bookId": "OL123W", "content": "fine"}"#).unwrap();
        assert_eq!(review.likes, Vec::<String>::new());
        assert!(review.replies.is_empty());
        assert_eq!(review.user.map(|u| u.username), None);
    }

    #[test]
    fn review_payload_coerces_non_array_collections() {
        let review: ReviewPayload = serde_json::from_str(
            r#"{"id": 3, "bookId": "OL123W", "content": "fine", "likes": "oops", "replies": 7}"#,
        )
        .unwrap();
        assert_eq!(review.likes, Vec::<String>::new());
        assert!(review.replies.is_empty());
    }

    #[test]
    fn reply_payload_reads_all_author_shapes() {
        let reply: ReplyPayload = serde_json::from_str(
            r#"{"id": 1, "reviewId": 3, "content": "hi", "user": {"username": "alice"}, "authorId": "bob"}"#,
        )
        .unwrap();
        assert_eq!(reply.user.unwrap().username.as_deref(), Some("alice"));
        assert_eq!(reply.author_id.as_deref(), Some("bob"));
    }

    #[test]
    fn work_id_strips_catalog_prefix() {
        let book = Book {
            key: "/works/OL45804W".to_string(),
            ..Book::default()
        };
        assert_eq!(book.work_id(), "OL45804W");
    }

    #[test]
    fn parses_both_timestamp_flavors() {
        assert!(parse_timestamp("2024-05-01T12:30:00Z").is_some());
        assert!(parse_timestamp("2024-05-01T12:30:00.125").is_some());
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
