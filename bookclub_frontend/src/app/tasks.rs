use std::sync::mpsc::Sender;
use std::thread;

use log::error;

use crate::api::{ApiClient, ApiError};
use crate::discussion;
use crate::models::{CreateReviewInput, ReplyInput, UpdateReviewInput};
use crate::session::Credentials;

use super::messages::AppMessage;
use super::state::LoadedImage;

fn send(tx: &Sender<AppMessage>, message: AppMessage) {
    if tx.send(message).is_err() {
        error!("app channel closed, dropping worker result");
    }
}

/// Runs an authenticated call with the one-shot 401 policy: attempt a token
/// refresh, retry the original request once with the new token, otherwise
/// tear the session down. Ordinary control flow, no interceptors.
fn run_authed<T>(
    api: &ApiClient,
    creds: &Credentials,
    tx: &Sender<AppMessage>,
    call: impl Fn(&str) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    match call(&creds.token) {
        Err(err) if err.is_unauthorized() => {
            let Some(refresh_token) = creds.refresh_token.as_deref() else {
                send(tx, AppMessage::SessionExpired);
                return Err(err);
            };
            match api.refresh(refresh_token) {
                Ok(tokens) => {
                    send(tx, AppMessage::TokenRefreshed(tokens.token.clone()));
                    call(&tokens.token)
                }
                Err(refresh_err) => {
                    error!("token refresh failed: {refresh_err}");
                    send(tx, AppMessage::SessionExpired);
                    Err(err)
                }
            }
        }
        other => other,
    }
}

pub fn load_books(api: ApiClient, tx: Sender<AppMessage>, query: String) {
    thread::spawn(move || {
        let result = api.search_books(&query);
        send(&tx, AppMessage::BooksLoaded(result));
    });
}

pub fn load_book(api: ApiClient, tx: Sender<AppMessage>, book_id: String) {
    thread::spawn(move || {
        let result = api.find_book(&book_id);
        send(&tx, AppMessage::BookLoaded { book_id, result });
    });
}

/// Thread Assembler entry point: the reviews fetch and the global reply
/// fetch run concurrently and are joined before assembly, so the view never
/// sees a half-built thread.
pub fn load_discussion(api: ApiClient, tx: Sender<AppMessage>, book_id: String) {
    thread::spawn(move || {
        let replies_api = api.clone();
        let replies_worker = thread::spawn(move || replies_api.list_replies());

        let reviews = api.list_reviews(&book_id);
        let replies = match replies_worker.join() {
            Ok(result) => result,
            Err(_) => Err(ApiError::WorkerLost),
        };

        let result = match (reviews, replies) {
            (Ok(reviews), Ok(replies)) => Ok(discussion::assemble(reviews, replies)),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };
        send(&tx, AppMessage::DiscussionLoaded { book_id, result });
    });
}

pub fn create_review(
    api: ApiClient,
    tx: Sender<AppMessage>,
    creds: Credentials,
    book_id: String,
    input: CreateReviewInput,
) {
    thread::spawn(move || {
        let result = run_authed(&api, &creds, &tx, |token| {
            api.create_review(token, &input).map(|_| ())
        });
        send(&tx, AppMessage::ReviewCreated { book_id, result });
    });
}

pub fn update_review(
    api: ApiClient,
    tx: Sender<AppMessage>,
    creds: Credentials,
    book_id: String,
    review_id: i64,
    input: UpdateReviewInput,
) {
    thread::spawn(move || {
        let result = run_authed(&api, &creds, &tx, |token| {
            api.update_review(token, review_id, &input)
        });
        send(&tx, AppMessage::ReviewUpdated { book_id, result });
    });
}

pub fn delete_review(
    api: ApiClient,
    tx: Sender<AppMessage>,
    creds: Credentials,
    book_id: String,
    review_id: i64,
) {
    thread::spawn(move || {
        let result = run_authed(&api, &creds, &tx, |token| api.delete_review(token, review_id));
        send(&tx, AppMessage::ReviewDeleted { book_id, result });
    });
}

pub fn create_reply(
    api: ApiClient,
    tx: Sender<AppMessage>,
    creds: Credentials,
    book_id: String,
    review_id: i64,
    input: ReplyInput,
) {
    thread::spawn(move || {
        let result = run_authed(&api, &creds, &tx, |token| {
            api.create_reply(token, review_id, &input)
        });
        send(&tx, AppMessage::ReplyCreated { book_id, result });
    });
}

pub fn update_reply(
    api: ApiClient,
    tx: Sender<AppMessage>,
    creds: Credentials,
    book_id: String,
    reply_id: i64,
    input: ReplyInput,
) {
    thread::spawn(move || {
        let result = run_authed(&api, &creds, &tx, |token| {
            api.update_reply(token, reply_id, &input)
        });
        send(&tx, AppMessage::ReplyUpdated { book_id, result });
    });
}

pub fn delete_reply(
    api: ApiClient,
    tx: Sender<AppMessage>,
    creds: Credentials,
    book_id: String,
    review_id: i64,
    reply_id: i64,
) {
    thread::spawn(move || {
        let result = run_authed(&api, &creds, &tx, |token| {
            api.delete_reply(token, review_id, reply_id)
        });
        send(&tx, AppMessage::ReplyDeleted { book_id, result });
    });
}

/// No credentials on purpose: anonymous actors may like.
pub fn update_likes(
    api: ApiClient,
    tx: Sender<AppMessage>,
    book_id: String,
    review_id: i64,
    likes: Vec<String>,
) {
    thread::spawn(move || {
        let result = api.update_likes(review_id, &likes);
        send(&tx, AppMessage::LikesUpdated { book_id, result });
    });
}

pub fn login(api: ApiClient, tx: Sender<AppMessage>, username: String, password: String) {
    thread::spawn(move || {
        let result = api.authenticate(&username, &password);
        send(&tx, AppMessage::LoggedIn { username, result });
    });
}

pub fn register(api: ApiClient, tx: Sender<AppMessage>, username: String, password: String) {
    thread::spawn(move || {
        let result = api.register(&username, &password);
        send(&tx, AppMessage::Registered { username, result });
    });
}

pub fn download_cover(api: ApiClient, tx: Sender<AppMessage>, cover_id: i64) {
    thread::spawn(move || {
        let url = api.cover_url(cover_id);
        let result = (|| {
            let bytes = api.download_bytes(&url).map_err(|e| e.to_string())?;
            let decoded = image::load_from_memory(&bytes).map_err(|e| e.to_string())?;
            let rgba = decoded.to_rgba8();
            let size = [decoded.width() as usize, decoded.height() as usize];
            Ok(LoadedImage {
                size,
                pixels: rgba.as_flat_samples().as_slice().to_vec(),
            })
        })();
        send(&tx, AppMessage::CoverLoaded { cover_id, result });
    });
}
