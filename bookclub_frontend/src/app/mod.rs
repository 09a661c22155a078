use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::mpsc::{self, Receiver, Sender};

use eframe::egui::{self, Context, TextureHandle};
use log::error;

use crate::api::ApiClient;
use crate::discussion;
use crate::models::{self, Book, CreateReviewInput, ReplyInput, Review, UpdateReviewInput};
use crate::session::{Credentials, Session};

mod messages;
mod state;
mod tasks;
mod ui;

use messages::AppMessage;
use state::{DeleteTarget, DetailState, LoadedImage, LoginState, RegisterState, ViewState};
use ui::auth::AuthAction;
use ui::detail::DetailAction;

// Cover downloads are throttled so a long catalog page cannot flood the
// covers host.
const MAX_CONCURRENT_COVER_DOWNLOADS: usize = 4;

// The catalog listing is seeded with a fixed subject query; the search box
// then filters client-side.
const CATALOG_QUERY: &str = "frontend";

pub struct BookclubApp {
    api: ApiClient,
    tx: Sender<AppMessage>,
    rx: Receiver<AppMessage>,
    session: Session,
    view: ViewState,

    // Catalog state survives navigation for the lifetime of the process,
    // the desktop analog of the original's browser session storage.
    books: Vec<Book>,
    books_loading: bool,
    books_error: Option<String>,
    search_term: String,
    catalog_page: usize,
    catalog_page_size: usize,

    base_url_input: String,
    info_banner: Option<String>,

    cover_textures: HashMap<i64, TextureHandle>,
    cover_pending: HashMap<i64, LoadedImage>,
    cover_loading: HashSet<i64>,
    cover_errors: HashMap<i64, String>,
    cover_queue: VecDeque<i64>,
    active_cover_downloads: usize,
}

impl BookclubApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let default_url = std::env::var("BOOKCLUB_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
        let api = ApiClient::new(default_url.clone()).unwrap_or_else(|err| {
            error!("failed to initialise API client: {err}");
            ApiClient::new("http://127.0.0.1:8080").expect("fallback API client")
        });
        let (tx, rx) = mpsc::channel();

        let mut app = Self {
            api,
            tx,
            rx,
            session: Session::new(),
            view: ViewState::Catalog,
            books: Vec::new(),
            books_loading: false,
            books_error: None,
            search_term: String::new(),
            catalog_page: 1,
            catalog_page_size: 5,
            base_url_input: default_url,
            info_banner: None,
            cover_textures: HashMap::new(),
            cover_pending: HashMap::new(),
            cover_loading: HashSet::new(),
            cover_errors: HashMap::new(),
            cover_queue: VecDeque::new(),
            active_cover_downloads: 0,
        };
        app.spawn_load_books();
        app
    }

    fn spawn_load_books(&mut self) {
        if self.books_loading {
            return;
        }
        self.books_loading = true;
        self.books_error = None;
        tasks::load_books(self.api.clone(), self.tx.clone(), CATALOG_QUERY.to_string());
    }

    fn spawn_load_discussion(&mut self, book_id: &str) {
        tasks::load_discussion(self.api.clone(), self.tx.clone(), book_id.to_string());
    }

    pub(crate) fn open_detail(&mut self, book: &Book) {
        let book_id = book.work_id().to_string();
        self.view = ViewState::Detail(DetailState::open(book_id.clone()));
        tasks::load_book(self.api.clone(), self.tx.clone(), book_id.clone());
        self.spawn_load_discussion(&book_id);
    }

    /// Auth gate shared by every mutation that requires authorship: aborts
    /// with a banner before any network call when no session exists.
    fn gate_auth(&mut self) -> Option<Credentials> {
        match self.session.require_auth() {
            Ok(creds) => Some(creds),
            Err(gate) => {
                self.info_banner = Some(gate.to_string());
                None
            }
        }
    }

    // ── Mutation coordinator: reviews ──

    pub(crate) fn submit_review(&mut self, state: &mut DetailState) {
        let content = state.review_draft.trim().to_string();
        if content.is_empty() {
            return;
        }
        let Some(creds) = self.gate_auth() else { return };
        state.review_sending = true;
        let input = CreateReviewInput {
            book_id: state.book_id.clone(),
            content,
            likes: Vec::new(),
        };
        tasks::create_review(
            self.api.clone(),
            self.tx.clone(),
            creds,
            state.book_id.clone(),
            input,
        );
    }

    pub(crate) fn start_edit_review(&mut self, state: &mut DetailState, review: &Review) {
        if self.gate_auth().is_none() {
            return;
        }
        state.editing_review = Some(review.id);
        state.edit_draft = review.content.clone();
    }

    pub(crate) fn submit_edit_review(&mut self, state: &mut DetailState) {
        let Some(review_id) = state.editing_review else {
            return;
        };
        let Some(review) = state.thread.iter().find(|r| r.id == review_id) else {
            return;
        };
        let Some(creds) = self.gate_auth() else { return };
        // Full payload: the backend replaces the row, so everything but the
        // content is carried over from the assembled review.
        let input = UpdateReviewInput {
            content: state.edit_draft.clone(),
            book_id: review.book_id.clone(),
            likes: review.likes.clone(),
            created_at: review.created_at.clone(),
            replies: review.replies.clone(),
        };
        tasks::update_review(
            self.api.clone(),
            self.tx.clone(),
            creds,
            state.book_id.clone(),
            review_id,
            input,
        );
    }

    pub(crate) fn request_delete(&mut self, state: &mut DetailState, target: DeleteTarget) {
        if self.gate_auth().is_none() {
            return;
        }
        state.confirm_delete = Some(target);
    }

    pub(crate) fn confirm_delete(&mut self, state: &mut DetailState) {
        let Some(target) = state.confirm_delete.take() else {
            return;
        };
        let Some(creds) = self.gate_auth() else { return };
        match target {
            DeleteTarget::Review { review_id } => tasks::delete_review(
                self.api.clone(),
                self.tx.clone(),
                creds,
                state.book_id.clone(),
                review_id,
            ),
            DeleteTarget::Reply {
                review_id,
                reply_id,
            } => tasks::delete_reply(
                self.api.clone(),
                self.tx.clone(),
                creds,
                state.book_id.clone(),
                review_id,
                reply_id,
            ),
        }
    }

    /// Like toggling works for anonymous actors: no gate, no auth header.
    /// The whole recomputed like list goes on the wire.
    pub(crate) fn toggle_like(&mut self, state: &DetailState, review_id: i64) {
        let Some(review) = state.thread.iter().find(|r| r.id == review_id) else {
            return;
        };
        let likes = discussion::toggle_like(&review.likes, self.session.actor_id());
        tasks::update_likes(
            self.api.clone(),
            self.tx.clone(),
            state.book_id.clone(),
            review_id,
            likes,
        );
    }

    // ── Mutation coordinator: replies ──

    pub(crate) fn start_reply(&mut self, state: &mut DetailState, review_id: i64) {
        if self.gate_auth().is_none() {
            return;
        }
        state.replying_to = Some(review_id);
        state.reply_draft.clear();
    }

    pub(crate) fn submit_reply(&mut self, state: &mut DetailState) {
        let Some(review_id) = state.replying_to else {
            return;
        };
        let content = state.reply_draft.trim().to_string();
        if content.is_empty() {
            return;
        }
        let Some(creds) = self.gate_auth() else { return };
        state.reply_sending = true;
        tasks::create_reply(
            self.api.clone(),
            self.tx.clone(),
            creds,
            state.book_id.clone(),
            review_id,
            ReplyInput { content },
        );
    }

    pub(crate) fn start_edit_reply(&mut self, state: &mut DetailState, reply_id: i64, content: &str) {
        if self.gate_auth().is_none() {
            return;
        }
        state.editing_reply = Some(reply_id);
        state.edit_reply_draft = content.to_string();
    }

    pub(crate) fn submit_edit_reply(&mut self, state: &mut DetailState) {
        let Some(reply_id) = state.editing_reply else {
            return;
        };
        let content = state.edit_reply_draft.trim().to_string();
        if content.is_empty() {
            return;
        }
        let Some(creds) = self.gate_auth() else { return };
        tasks::update_reply(
            self.api.clone(),
            self.tx.clone(),
            creds,
            state.book_id.clone(),
            reply_id,
            ReplyInput { content },
        );
    }

    // ── Auth actions ──

    pub(crate) fn submit_login(&mut self, state: &mut LoginState) {
        let username = state.username.trim().to_string();
        if username.is_empty() || state.password.is_empty() {
            state.error = Some("Enter a username and password.".into());
            return;
        }
        state.submitting = true;
        state.error = None;
        tasks::login(self.api.clone(), self.tx.clone(), username, state.password.clone());
    }

    pub(crate) fn submit_register(&mut self, state: &mut RegisterState) {
        if state.password != state.confirm_password {
            state.error = Some("Password doesn't match".into());
            return;
        }
        let username = state.username.trim().to_string();
        if username.is_empty() || state.password.is_empty() {
            state.error = Some("Enter a username and password.".into());
            return;
        }
        state.submitting = true;
        state.error = None;
        tasks::register(self.api.clone(), self.tx.clone(), username, state.password.clone());
    }

    fn sign_out(&mut self) {
        self.session.logout();
        self.info_banner = Some("Signed out.".into());
    }

    // ── Cover pipeline ──

    fn request_cover(&mut self, cover_id: i64) {
        if self.cover_textures.contains_key(&cover_id)
            || self.cover_pending.contains_key(&cover_id)
            || self.cover_loading.contains(&cover_id)
            || self.cover_errors.contains_key(&cover_id)
        {
            return;
        }
        self.cover_loading.insert(cover_id);
        self.cover_queue.push_back(cover_id);
        self.process_cover_queue();
    }

    fn process_cover_queue(&mut self) {
        while self.active_cover_downloads < MAX_CONCURRENT_COVER_DOWNLOADS {
            let Some(cover_id) = self.cover_queue.pop_front() else {
                break;
            };
            self.active_cover_downloads += 1;
            tasks::download_cover(self.api.clone(), self.tx.clone(), cover_id);
        }
    }

    fn on_cover_download_complete(&mut self) {
        if self.active_cover_downloads > 0 {
            self.active_cover_downloads -= 1;
        }
        self.process_cover_queue();
    }

    /// Renders a cover thumbnail, promoting decoded images to textures and
    /// kicking off a download the first time a cover id is seen.
    pub(crate) fn cover_image(&mut self, ui: &mut egui::Ui, cover_id: Option<i64>, max_width: f32) {
        let Some(cover_id) = cover_id else {
            ui.label("No image");
            return;
        };
        if let Some(pending) = self.cover_pending.remove(&cover_id) {
            let color = egui::ColorImage::from_rgba_unmultiplied(pending.size, &pending.pixels);
            let texture = ui.ctx().load_texture(
                format!("cover-{cover_id}"),
                color,
                egui::TextureOptions::default(),
            );
            self.cover_textures.insert(cover_id, texture);
        }
        if let Some(texture) = self.cover_textures.get(&cover_id) {
            let size = texture.size_vec2();
            let scale = if size.x > max_width { max_width / size.x } else { 1.0 };
            ui.add(egui::Image::from_texture(texture).fit_to_exact_size(size * scale));
        } else if self.cover_errors.contains_key(&cover_id) {
            ui.label("No image");
        } else {
            ui.spinner();
            self.request_cover(cover_id);
        }
    }

    fn process_messages(&mut self) {
        messages::process_messages(self);
    }

    fn render_top_bar(&mut self, ctx: &Context) {
        egui::TopBottomPanel::top("top_controls").show(ctx, |ui| {
            let mut go_catalog = false;
            let mut go_login = false;
            let mut go_register = false;
            let mut sign_out = false;

            ui.horizontal(|ui| {
                if ui.button(egui::RichText::new("Book List").strong()).clicked() {
                    go_catalog = true;
                }
                ui.separator();
                ui.label("API Base URL");
                ui.text_edit_singleline(&mut self.base_url_input);
                if ui.button("Apply").clicked() {
                    match self.api.set_base_url(self.base_url_input.clone()) {
                        Ok(()) => self.info_banner = Some("API URL updated".into()),
                        Err(err) => {
                            self.info_banner = Some(format!("Failed to update URL: {err}"));
                        }
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(username) = self.session.username().map(str::to_string) {
                        if ui.button("Sign out").clicked() {
                            sign_out = true;
                        }
                        ui.label(format!("Signed in as {username}"));
                    } else {
                        if ui.button("Sign up").clicked() {
                            go_register = true;
                        }
                        if ui.button("Sign in").clicked() {
                            go_login = true;
                        }
                    }
                });
            });

            if let Some(message) = self.info_banner.clone() {
                let mut dismiss = false;
                egui::Frame::group(ui.style())
                    .fill(ui.visuals().extreme_bg_color)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.label(message.as_str());
                            if ui.button("Dismiss").clicked() {
                                dismiss = true;
                            }
                        });
                    });
                if dismiss {
                    self.info_banner = None;
                }
            }

            if go_catalog {
                self.view = ViewState::Catalog;
            }
            if go_login {
                self.view = ViewState::Login(LoginState::default());
            }
            if go_register {
                self.view = ViewState::Register(RegisterState::default());
            }
            if sign_out {
                self.sign_out();
            }
        });
    }
}

impl eframe::App for BookclubApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.process_messages();
        // Worker results arrive over the channel, so keep polling even
        // without input events.
        ctx.request_repaint_after(std::time::Duration::from_millis(200));

        self.render_top_bar(ctx);

        enum Current {
            Catalog,
            Detail,
            Login,
            Register,
        }
        let current = match &self.view {
            ViewState::Catalog => Current::Catalog,
            ViewState::Detail(_) => Current::Detail,
            ViewState::Login(_) => Current::Login,
            ViewState::Register(_) => Current::Register,
        };

        match current {
            Current::Catalog => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    self.render_catalog(ui);
                });
            }
            Current::Detail => {
                // Detached so render methods can borrow the app and the view
                // state at the same time.
                let mut state = match &mut self.view {
                    ViewState::Detail(state) => std::mem::take(state),
                    _ => unreachable!(),
                };
                let mut action = DetailAction::None;
                egui::CentralPanel::default().show(ctx, |ui| {
                    action = self.render_detail(ui, &mut state);
                });
                self.render_delete_dialog(ctx, &mut state);
                if let ViewState::Detail(slot) = &mut self.view {
                    *slot = state;
                }
                if matches!(action, DetailAction::GoBack) {
                    self.view = ViewState::Catalog;
                }
            }
            Current::Login => {
                let mut state = match &mut self.view {
                    ViewState::Login(state) => std::mem::take(state),
                    _ => unreachable!(),
                };
                let mut action = AuthAction::None;
                egui::CentralPanel::default().show(ctx, |ui| {
                    action = self.render_login(ui, &mut state);
                });
                if let ViewState::Login(slot) = &mut self.view {
                    *slot = state;
                }
                if matches!(action, AuthAction::SwitchToRegister) {
                    self.view = ViewState::Register(RegisterState::default());
                }
            }
            Current::Register => {
                let mut state = match &mut self.view {
                    ViewState::Register(state) => std::mem::take(state),
                    _ => unreachable!(),
                };
                let mut action = AuthAction::None;
                egui::CentralPanel::default().show(ctx, |ui| {
                    action = self.render_register(ui, &mut state);
                });
                if let ViewState::Register(slot) = &mut self.view {
                    *slot = state;
                }
                if matches!(action, AuthAction::SwitchToLogin) {
                    self.view = ViewState::Login(LoginState::default());
                }
            }
        }
    }
}

fn format_timestamp(ts: &str) -> String {
    models::parse_timestamp(ts)
        .map(|dt| dt.format("%d/%m/%Y, %H:%M").to_string())
        .unwrap_or_else(|| "Date information unavailable".to_string())
}
