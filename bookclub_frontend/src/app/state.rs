use crate::models::{Book, Review};
use crate::projection::SortKey;

pub enum ViewState {
    Catalog,
    Detail(DetailState),
    Login(LoginState),
    Register(RegisterState),
}

/// Which confirmation dialog is open, if any. Deletes never fire without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Review { review_id: i64 },
    Reply { review_id: i64, reply_id: i64 },
}

#[derive(Default)]
pub struct DetailState {
    pub book_id: String,
    pub book: Option<Book>,
    pub book_loading: bool,
    pub book_missing: bool,

    /// The assembled thread for this book; replaced wholesale after every
    /// successful fetch, left untouched when a fetch fails.
    pub thread: Vec<Review>,
    pub thread_loaded: bool,
    pub thread_error: Option<String>,

    pub sort: SortKey,
    pub page: usize,

    pub review_draft: String,
    pub review_sending: bool,

    /// Review id a reply is being composed under.
    pub replying_to: Option<i64>,
    pub reply_draft: String,
    pub reply_sending: bool,

    pub editing_review: Option<i64>,
    pub edit_draft: String,
    pub editing_reply: Option<i64>,
    pub edit_reply_draft: String,

    pub confirm_delete: Option<DeleteTarget>,
}

impl DetailState {
    pub fn open(book_id: String) -> Self {
        Self {
            book_id,
            book_loading: true,
            page: 1,
            ..Self::default()
        }
    }
}

#[derive(Default)]
pub struct LoginState {
    pub username: String,
    pub password: String,
    pub error: Option<String>,
    /// Set after registration so the form comes prefilled.
    pub notice: Option<String>,
    pub submitting: bool,
}

#[derive(Default)]
pub struct RegisterState {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub error: Option<String>,
    pub submitting: bool,
}

/// Decoded cover handed over by a download worker, ready to become a texture.
#[derive(Clone)]
pub struct LoadedImage {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}
