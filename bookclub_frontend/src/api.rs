use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::models::{
    AuthRequest, Book, CreateReviewInput, RefreshRequest, ReplyInput, ReplyPayload, ReviewPayload,
    SearchResponse, TokenResponse, UpdateReviewInput,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-success status; `message` carries the server's error body when it
    /// sent one, so the UI can show it verbatim.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    #[error("worker thread terminated before returning a result")]
    WorkerLost,
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Status {
                status: StatusCode::UNAUTHORIZED,
                ..
            }
        )
    }
}

/// Pulls a usable message out of an error response. The backend answers
/// with either `{"error": "..."}` or a bare string body.
fn status_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::to_string)
        })
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("Server error ({status})"));
    ApiError::Status { status, message }
}

fn check(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    catalog_url: String,
    covers_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let base = sanitize_base_url(base_url.into())?;
        let catalog_url = std::env::var("BOOKCLUB_CATALOG_URL")
            .unwrap_or_else(|_| "https://openlibrary.org".to_string());
        let covers_url = std::env::var("BOOKCLUB_COVERS_URL")
            .unwrap_or_else(|_| "https://covers.openlibrary.org".to_string());
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            base_url: base,
            catalog_url: sanitize_base_url(catalog_url)?,
            covers_url: sanitize_base_url(covers_url)?,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) -> Result<(), ApiError> {
        self.base_url = sanitize_base_url(base_url.into())?;
        Ok(())
    }

    /// Explicit request decoration: every authenticated endpoint threads the
    /// bearer token through here, nothing attaches headers implicitly.
    fn authed(&self, builder: RequestBuilder, token: &str) -> RequestBuilder {
        builder.bearer_auth(token)
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let full = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&full).map_err(|_| ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: format!("invalid request URL: {full}"),
        })
    }

    // ── Catalog (external, read-only, no auth) ──

    pub fn search_books(&self, query: &str) -> Result<Vec<Book>, ApiError> {
        let response = self
            .client
            .get(format!("{}/search.json", self.catalog_url))
            .query(&[("q", query)])
            .send()?;
        let search: SearchResponse = check(response)?.json()?;
        Ok(search.docs)
    }

    /// Catalog lookup by work key. An empty doc list is "not found", not an
    /// error.
    pub fn find_book(&self, work_id: &str) -> Result<Option<Book>, ApiError> {
        let query = format!("key:/works/{work_id}");
        Ok(self.search_books(&query)?.into_iter().next())
    }

    pub fn cover_url(&self, cover_id: i64) -> String {
        format!("{}/b/id/{cover_id}-M.jpg", self.covers_url)
    }

    pub fn download_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.client.get(url).send()?;
        Ok(check(response)?.bytes()?.to_vec())
    }

    // ── Reviews ──

    pub fn list_reviews(&self, book_id: &str) -> Result<Vec<ReviewPayload>, ApiError> {
        let response = self
            .client
            .get(self.url("/reviews")?)
            .query(&[("bookId", book_id)])
            .send()?;
        Ok(check(response)?.json()?)
    }

    pub fn create_review(
        &self,
        token: &str,
        input: &CreateReviewInput,
    ) -> Result<ReviewPayload, ApiError> {
        let request = self.client.post(self.url("/reviews")?).json(input);
        let response = self.authed(request, token).send()?;
        Ok(check(response)?.json()?)
    }

    pub fn update_review(
        &self,
        token: &str,
        review_id: i64,
        input: &UpdateReviewInput,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/reviews/{review_id}"))?)
            .json(input);
        check(self.authed(request, token).send()?)?;
        Ok(())
    }

    pub fn delete_review(&self, token: &str, review_id: i64) -> Result<(), ApiError> {
        let request = self.client.delete(self.url(&format!("/reviews/{review_id}"))?);
        check(self.authed(request, token).send()?)?;
        Ok(())
    }

    /// Like updates are deliberately reachable without a session: no token
    /// parameter, no Authorization header. The body is the entire resulting
    /// like list, not a delta.
    pub fn update_likes(&self, review_id: i64, likes: &[String]) -> Result<(), ApiError> {
        let response = self
            .client
            .put(self.url(&format!("/reviews/{review_id}/like"))?)
            .json(&likes)
            .send()?;
        check(response)?;
        Ok(())
    }

    // ── Replies ──

    /// The backend exposes no per-book filter here; the full collection comes
    /// back and `discussion::assemble` does the grouping.
    pub fn list_replies(&self) -> Result<Vec<ReplyPayload>, ApiError> {
        let response = self.client.get(self.url("/replies")?).send()?;
        Ok(check(response)?.json()?)
    }

    pub fn create_reply(
        &self,
        token: &str,
        review_id: i64,
        input: &ReplyInput,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/replies/{review_id}"))?)
            .json(input);
        check(self.authed(request, token).send()?)?;
        Ok(())
    }

    pub fn update_reply(
        &self,
        token: &str,
        reply_id: i64,
        input: &ReplyInput,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/replies/{reply_id}"))?)
            .json(input);
        check(self.authed(request, token).send()?)?;
        Ok(())
    }

    pub fn delete_reply(&self, token: &str, review_id: i64, reply_id: i64) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/replies/{review_id}/{reply_id}"))?);
        check(self.authed(request, token).send()?)?;
        Ok(())
    }

    // ── Auth ──

    pub fn authenticate(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/authenticate")?)
            .json(&AuthRequest { username, password })
            .send()?;
        Ok(check(response)?.json()?)
    }

    /// One-shot token refresh, reusing the authenticate endpoint with a
    /// `refreshToken` body as the backend expects.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/authenticate")?)
            .json(&RefreshRequest { refresh_token })
            .send()?;
        Ok(check(response)?.json()?)
    }

    pub fn register(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("/register")?)
            .json(&AuthRequest { username, password })
            .send()?;
        check(response)?;
        Ok(())
    }
}

fn sanitize_base_url(mut base: String) -> Result<String, ApiError> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        base = format!("http://{base}");
    }
    while base.ends_with('/') {
        base.pop();
    }
    Url::parse(&base).map_err(|_| ApiError::Status {
        status: StatusCode::BAD_REQUEST,
        message: format!("invalid base URL: {base}"),
    })?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sanitize_adds_scheme_and_strips_trailing_slashes() {
        assert_eq!(
            sanitize_base_url("localhost:8080//".into()).unwrap(),
            "http://localhost:8080"
        );
        assert_eq!(
            sanitize_base_url("https://api.example.org/".into()).unwrap(),
            "https://api.example.org"
        );
    }

    #[test]
    fn sanitize_rejects_garbage() {
        assert!(sanitize_base_url("http://".into()).is_err());
    }

    #[test]
    fn unauthorized_detection_only_matches_401() {
        let unauthorized = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "expired".into(),
        };
        let forbidden = ApiError::Status {
            status: StatusCode::FORBIDDEN,
            message: "nope".into(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
        assert!(!ApiError::WorkerLost.is_unauthorized());
    }

    #[test]
    fn status_error_message_renders_itself() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: "Username already exists".into(),
        };
        assert_eq!(err.to_string(), "Username already exists");
    }
}
