use log::error;

use crate::api::ApiError;
use crate::models::{Book, Review, TokenResponse};
use crate::projection::SortKey;

use super::state::{LoadedImage, LoginState, ViewState};
use super::{tasks, BookclubApp};

pub enum AppMessage {
    BooksLoaded(Result<Vec<Book>, ApiError>),
    BookLoaded {
        book_id: String,
        result: Result<Option<Book>, ApiError>,
    },
    DiscussionLoaded {
        book_id: String,
        result: Result<Vec<Review>, ApiError>,
    },
    ReviewCreated {
        book_id: String,
        result: Result<(), ApiError>,
    },
    ReviewUpdated {
        book_id: String,
        result: Result<(), ApiError>,
    },
    ReviewDeleted {
        book_id: String,
        result: Result<(), ApiError>,
    },
    ReplyCreated {
        book_id: String,
        result: Result<(), ApiError>,
    },
    ReplyUpdated {
        book_id: String,
        result: Result<(), ApiError>,
    },
    ReplyDeleted {
        book_id: String,
        result: Result<(), ApiError>,
    },
    LikesUpdated {
        book_id: String,
        result: Result<(), ApiError>,
    },
    LoggedIn {
        username: String,
        result: Result<TokenResponse, ApiError>,
    },
    Registered {
        username: String,
        result: Result<(), ApiError>,
    },
    TokenRefreshed(String),
    SessionExpired,
    CoverLoaded {
        cover_id: i64,
        result: Result<LoadedImage, String>,
    },
}

pub(super) fn process_messages(app: &mut BookclubApp) {
    while let Ok(message) = app.rx.try_recv() {
        handle(app, message);
    }
}

/// Every mutation result re-runs the Thread Assembler on success; results
/// addressed to a book we already navigated away from are dropped.
fn handle(app: &mut BookclubApp, message: AppMessage) {
    // Deferred so the `app.view` borrow is released before spawning.
    let mut refetch: Option<String> = None;
    let mut next_view: Option<ViewState> = None;

    match message {
        AppMessage::BooksLoaded(result) => {
            app.books_loading = false;
            match result {
                Ok(books) => {
                    app.books = books;
                    app.books_error = None;
                }
                Err(err) => {
                    error!("failed to load the book list: {err}");
                    app.books_error = Some(
                        "Book data could not be loaded from the catalog. Please try again!".into(),
                    );
                }
            }
        }
        AppMessage::BookLoaded { book_id, result } => {
            if let ViewState::Detail(state) = &mut app.view {
                if state.book_id == book_id {
                    state.book_loading = false;
                    match result {
                        Ok(Some(book)) => state.book = Some(book),
                        Ok(None) => state.book_missing = true,
                        Err(err) => {
                            error!("failed to load book {book_id}: {err}");
                            state.book_missing = true;
                        }
                    }
                }
            }
        }
        AppMessage::DiscussionLoaded { book_id, result } => {
            if let ViewState::Detail(state) = &mut app.view {
                if state.book_id == book_id {
                    state.thread_loaded = true;
                    match result {
                        Ok(reviews) => {
                            state.thread = reviews;
                            state.thread_error = None;
                        }
                        Err(err) => {
                            // Stale-but-present beats a blank panel: the
                            // previous thread stays on screen.
                            error!("failed to load reviews for {book_id}: {err}");
                            state.thread_error = Some(err.to_string());
                        }
                    }
                }
            }
        }
        AppMessage::ReviewCreated { book_id, result } => {
            if let ViewState::Detail(state) = &mut app.view {
                if state.book_id == book_id {
                    state.review_sending = false;
                    match result {
                        Ok(()) => {
                            state.review_draft.clear();
                            state.sort = SortKey::Latest;
                            state.page = 1;
                            app.info_banner = Some("Your review has been registered.".into());
                            refetch = Some(book_id);
                        }
                        Err(err) => {
                            app.info_banner = Some(format!("Failed to register review: {err}"));
                        }
                    }
                }
            }
        }
        AppMessage::ReviewUpdated { book_id, result } => {
            if let ViewState::Detail(state) = &mut app.view {
                if state.book_id == book_id {
                    match result {
                        Ok(()) => {
                            state.editing_review = None;
                            state.edit_draft.clear();
                            refetch = Some(book_id);
                        }
                        Err(err) => {
                            app.info_banner = Some(format!("Failed to update review: {err}"));
                        }
                    }
                }
            }
        }
        AppMessage::ReviewDeleted { book_id, result } => {
            if let ViewState::Detail(state) = &app.view {
                if state.book_id == book_id {
                    match result {
                        Ok(()) => refetch = Some(book_id),
                        Err(err) => {
                            app.info_banner = Some(format!("Failed to delete review: {err}"));
                        }
                    }
                }
            }
        }
        AppMessage::ReplyCreated { book_id, result } => {
            if let ViewState::Detail(state) = &mut app.view {
                if state.book_id == book_id {
                    state.reply_sending = false;
                    match result {
                        Ok(()) => {
                            state.replying_to = None;
                            state.reply_draft.clear();
                            refetch = Some(book_id);
                        }
                        Err(err) => {
                            app.info_banner = Some(format!("Failed to register reply: {err}"));
                        }
                    }
                }
            }
        }
        AppMessage::ReplyUpdated { book_id, result } => {
            if let ViewState::Detail(state) = &mut app.view {
                if state.book_id == book_id {
                    match result {
                        Ok(()) => {
                            state.editing_reply = None;
                            state.edit_reply_draft.clear();
                            refetch = Some(book_id);
                        }
                        Err(err) => {
                            app.info_banner = Some(format!("Failed to update reply: {err}"));
                        }
                    }
                }
            }
        }
        AppMessage::ReplyDeleted { book_id, result } => {
            if let ViewState::Detail(state) = &app.view {
                if state.book_id == book_id {
                    match result {
                        Ok(()) => refetch = Some(book_id),
                        Err(err) => {
                            app.info_banner = Some(format!("Failed to delete reply: {err}"));
                        }
                    }
                }
            }
        }
        AppMessage::LikesUpdated { book_id, result } => {
            if let ViewState::Detail(state) = &app.view {
                if state.book_id == book_id {
                    match result {
                        Ok(()) => refetch = Some(book_id),
                        Err(err) => {
                            app.info_banner = Some(format!("Failed to process like: {err}"));
                        }
                    }
                }
            }
        }
        AppMessage::LoggedIn { username, result } => {
            if let ViewState::Login(state) = &mut app.view {
                state.submitting = false;
                match result {
                    Ok(tokens) => {
                        app.session
                            .login(username.clone(), tokens.token, tokens.refresh_token);
                        app.info_banner = Some(format!("Signed in as {username}"));
                        next_view = Some(ViewState::Catalog);
                    }
                    Err(err) => {
                        error!("authentication failed for {username}: {err}");
                        state.error = Some("Authentication failed. Check your credentials!".into());
                    }
                }
            }
        }
        AppMessage::Registered { username, result } => {
            if let ViewState::Register(state) = &mut app.view {
                state.submitting = false;
                match result {
                    Ok(()) => {
                        next_view = Some(ViewState::Login(LoginState {
                            username,
                            notice: Some("Account created. Please sign in.".into()),
                            ..LoginState::default()
                        }));
                    }
                    Err(err) => {
                        state.error = Some(if err.to_string().contains("already exists") {
                            "The username already exists".into()
                        } else {
                            "Sign up failed. Please try again.".into()
                        });
                    }
                }
            }
        }
        AppMessage::TokenRefreshed(token) => {
            app.session.set_token(token);
        }
        AppMessage::SessionExpired => {
            app.session.logout();
            next_view = Some(ViewState::Login(LoginState {
                error: Some("Your session has expired. Please sign in again.".into()),
                ..LoginState::default()
            }));
        }
        AppMessage::CoverLoaded { cover_id, result } => {
            app.cover_loading.remove(&cover_id);
            match result {
                Ok(image) => {
                    app.cover_pending.insert(cover_id, image);
                }
                Err(err) => {
                    app.cover_errors.insert(cover_id, err);
                }
            }
            app.on_cover_download_complete();
        }
    }

    if let Some(view) = next_view {
        app.view = view;
    }
    if let Some(book_id) = refetch {
        tasks::load_discussion(app.api.clone(), app.tx.clone(), book_id);
    }
}
